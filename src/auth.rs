//! Auth-domain parameters, scope sets, request parameters, claims, and token models.

pub mod claims;
pub mod params;
pub mod request;
pub mod scope;
pub mod token;
pub mod validate;

pub use claims::*;
pub use params::*;
pub use request::*;
pub use scope::*;
pub use token::{secret::*, set::*};
pub use validate::*;
