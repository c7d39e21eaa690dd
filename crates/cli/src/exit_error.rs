// SPDX-License-Identifier: MIT

//! An error that carries the process exit code it should produce, so
//! `main` can report and exit in one place instead of scattering
//! `std::process::exit` through startup.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn startup_failure(message: impl Into<String>) -> Self {
        Self::new(1, message)
    }

    /// An OS-level failure (bind, fork, fs) surfaces as the negated errno,
    /// matching the CLI's documented exit-code contract.
    pub fn from_io(context: &str, error: std::io::Error) -> Self {
        let code = error.raw_os_error().map(|errno| -errno).unwrap_or(1);
        Self::new(code, format!("{context}: {error}"))
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
