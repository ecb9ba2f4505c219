//! Secret value storage.
//!
//! Passwords, application keys and tokens parsed from a connection string are
//! held in [`SecureString`] so they never show up in `Debug` or `Display`
//! output or in log lines.

use std::fmt;
use zeroize::Zeroize;

/// Secure string that zeros memory on drop and never displays its contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureString {
    data: Vec<u8>,
}

impl SecureString {
    /// Wrap a secret value.
    pub fn new(s: impl Into<String>) -> Self {
        Self {
            data: s.into().into_bytes(),
        }
    }

    /// Borrow the secret (never log the result).
    pub fn expose(&self) -> &str {
        // Only ever constructed from a `String`
        std::str::from_utf8(&self.data).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Zeroize for SecureString {
    fn zeroize(&mut self) {
        self.data.zeroize();
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(<redacted>)")
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted>")
    }
}

/// Secret binary material such as a PKCS#12 certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct SecureBytes {
    data: Vec<u8>,
}

impl SecureBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn expose(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Zeroize for SecureBytes {
    fn zeroize(&mut self) {
        self.data.zeroize();
    }
}

impl Drop for SecureBytes {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBytes({} bytes, <redacted>)", self.data.len())
    }
}
