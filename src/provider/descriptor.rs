//! Validated endpoint descriptors for a deployment environment.
//!
//! The descriptor holds the endpoints the connector needs before discovery has run: the
//! discovery document itself and the per-level step-up endpoints. Everything else comes
//! from the discovery document at initialization.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, auth::Qor, provider::Environment};

/// Immutable endpoint descriptor consumed by the connector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Environment the endpoints belong to.
	pub environment: Environment,
	/// OpenID discovery document location.
	pub discovery: Url,
	/// Step-up endpoints keyed by the QoR level they grant.
	pub step_up: BTreeMap<Qor, Url>,
}
impl ProviderDescriptor {
	/// Creates a new builder seeded with the environment's well-known endpoints.
	pub fn builder(environment: Environment) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(environment)
	}

	/// Builds the descriptor for an environment without overrides.
	pub fn for_environment(environment: Environment) -> Result<Self, ProviderDescriptorError> {
		Self::builder(environment).build()
	}

	/// Returns the step-up endpoint for `level`, if the environment offers one.
	pub fn step_up_endpoint(&self, level: Qor) -> Option<&Url> {
		self.step_up.get(&level)
	}
}
