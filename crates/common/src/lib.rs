//! Common utilities and types shared across the virtual session components.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;

/// Module for the time source abstraction
pub mod clock;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for signed session token utilities (claims, signing, verification)
pub mod jwt;
