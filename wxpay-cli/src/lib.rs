//! Command-line tool for the WeChat Pay red-envelope API.
//!
//! Exposes configuration loading and argument parsing for the `wxpay` binary.

pub mod cli;
pub mod config;
