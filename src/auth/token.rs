//! Token secrets and the token set issued by the identity provider.

pub mod secret;
pub mod set;
