//! Canonical parameter serialization and MD5 request signing.
//!
//! The gateway recomputes the signature independently, so the canonical
//! string must match its construction byte for byte:
//!
//! 1. drop the `sign` field and every field whose value is empty,
//! 2. sort the remaining names in ascending byte order,
//! 3. join `name=value` pairs with `&`,
//! 4. append `&key=<shared key>`,
//! 5. take the MD5 digest as uppercase hex.
//!
//! MD5 is mandated by the counterparty for this API family.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use crate::config::SecretKey;

/// Name of the signature field, never part of its own input.
pub const SIGN_FIELD: &str = "sign";

/// A scalar parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamValue<'a> {
    /// A string value, emitted verbatim.
    Str(&'a str),
    /// A non-negative integer, emitted in base 10.
    Int(u64),
}

impl ParamValue<'_> {
    /// Returns `true` for the empty string. Integers are never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            Self::Int(_) => false,
        }
    }
}

impl fmt::Display for ParamValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl<'a> From<&'a str> for ParamValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

impl<'a> From<&'a String> for ParamValue<'a> {
    fn from(value: &'a String) -> Self {
        Self::Str(value.as_str())
    }
}

impl From<u64> for ParamValue<'_> {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue<'_> {
    fn from(value: u32) -> Self {
        Self::Int(u64::from(value))
    }
}

/// An unordered set of request parameters prior to signing.
///
/// Keys are case-sensitive ASCII wire names. Iteration order of the backing
/// map has no effect on [`CanonicalParams::canonical_string`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalParams<'a> {
    fields: HashMap<&'a str, ParamValue<'a>>,
}

impl<'a> CanonicalParams<'a> {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, name: &'a str, value: impl Into<ParamValue<'a>>) -> &mut Self {
        self.fields.insert(name, value.into());
        self
    }

    /// Inserts a field only when a value is present.
    pub fn insert_opt(&mut self, name: &'a str, value: Option<&'a str>) -> &mut Self {
        if let Some(value) = value {
            self.fields.insert(name, ParamValue::Str(value));
        }
        self
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue<'a>> {
        self.fields.get(name)
    }

    /// Number of fields, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Builds the canonical string and appends `suffix` verbatim.
    ///
    /// `suffix` carries its own leading separator, e.g. `&key=...`.
    #[must_use]
    pub fn canonical_string(&self, suffix: &str) -> String {
        let mut pairs: Vec<(&str, &ParamValue<'a>)> = self
            .fields
            .iter()
            .filter(|(name, value)| **name != SIGN_FIELD && !value.is_empty())
            .map(|(name, value)| (*name, value))
            .collect();
        pairs.sort_unstable_by_key(|(name, _)| *name);

        let mut out = String::new();
        for (name, value) in pairs {
            if !out.is_empty() {
                out.push('&');
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{name}={value}");
        }
        out.push_str(suffix);
        out
    }

    /// Signs the parameter set with the merchant's shared key.
    #[must_use]
    pub fn sign(&self, key: &SecretKey) -> Signed {
        let suffix = key_suffix(key);
        let mut canonical = self.canonical_string(&suffix);
        let sign = md5_hex(&canonical);
        canonical.truncate(canonical.len() - suffix.len());
        Signed {
            signed_params: canonical,
            sign,
        }
    }
}

impl<'a, V: Into<ParamValue<'a>>> FromIterator<(&'a str, V)> for CanonicalParams<'a> {
    fn from_iter<I: IntoIterator<Item = (&'a str, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name, value.into()))
                .collect(),
        }
    }
}

/// Output of [`CanonicalParams::sign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed {
    /// Canonical string without the key suffix.
    pub signed_params: String,
    /// Uppercase hex MD5 signature.
    pub sign: String,
}

/// Returns the `&key=<shared key>` suffix appended before hashing.
#[must_use]
pub fn key_suffix(key: &SecretKey) -> String {
    format!("&key={}", key.expose())
}

/// Uppercase hexadecimal MD5 digest of `canonical`.
#[must_use]
pub fn md5_hex(canonical: &str) -> String {
    format!("{:X}", md5::compute(canonical.as_bytes()))
}
