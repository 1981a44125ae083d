//! Client authentication material and PKCE helpers.

pub mod credentials;
pub mod pkce;

pub use credentials::*;
pub use pkce::*;
