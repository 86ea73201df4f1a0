//! Provider-facing configuration (data) and error classification (behavior).
//!
//! `config` exposes the validated [`StrategyConfig`] covering Apple's HTTPS-only endpoints, the
//! team/key/client identifiers used to sign client assertions, and optional redirect + scope
//! settings. `classify` maps OAuth error codes returned by the token endpoint into
//! [`ProviderErrorKind`] so callers can branch without string matching.

pub mod classify;
pub mod config;

pub use classify::*;
pub use config::*;
