//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports types from the [`secrecy`] crate. Use these for values such as
//! the session token signing key, where a stray `{:?}` or tracing field must
//! never reveal the material.
//!
//! `SecretString` implements `Debug` with redaction, so any struct deriving
//! `Debug` that contains one is safe to log. Secrets are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct SigningSettings {
//!     issuer: String,
//!     key: SecretString,
//! }
//!
//! let settings = SigningSettings {
//!     issuer: "sessions".to_string(),
//!     key: SecretString::from("a-very-long-signing-key-material"),
//! };
//!
//! // Safe: the key is redacted
//! let rendered = format!("{:?}", settings);
//! assert!(!rendered.contains("signing-key-material"));
//!
//! // Access requires an explicit call
//! let key: &str = settings.key.expose_secret();
//! assert_eq!(key.len(), 32);
//! ```

pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_string_debug_is_redacted() {
        let secret = SecretString::from("super-secret-value");
        let debug_output = format!("{secret:?}");
        assert!(!debug_output.contains("super-secret-value"));
    }

    #[test]
    fn test_secret_string_expose() {
        let secret = SecretString::from("value");
        assert_eq!(secret.expose_secret(), "value");
    }
}
