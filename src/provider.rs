//! Provider-facing configuration (data) and strategies (behavior).
//!
//! `configuration` exposes the validated token endpoint (`ProviderConfiguration`) plus the
//! [`ProviderConfigurationSource`] contract used to resolve it lazily, with a static and a cached
//! implementation. `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook used to
//! augment outgoing token requests and classify provider errors.

pub mod configuration;
pub mod strategy;

pub use configuration::*;
pub use strategy::*;
