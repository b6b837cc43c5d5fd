//! Identity provider description: deployment environments, endpoint descriptors, and the
//! discovery metadata plus signing keys fetched at initialization.
//!
//! `environment` names the two deployments the connector can talk to. `descriptor` turns an
//! environment (plus optional overrides) into validated discovery and step-up endpoints.
//! `metadata` parses the discovery document and the JSON Web Key Set it points to.

pub mod descriptor;
pub mod environment;
pub mod metadata;

pub use descriptor::*;
pub use environment::*;
pub use metadata::*;
