//! Credential and identity models: client assertions, identity claims, and profiles.

pub mod assertion;
pub mod claims;
pub mod profile;
pub mod secret;

pub use assertion::*;
pub use claims::*;
pub use profile::*;
pub use secret::*;
