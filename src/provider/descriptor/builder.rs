// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::Qor,
	provider::{Environment, ProviderDescriptor},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// A built-in endpoint failed to parse.
	#[error("The built-in {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they target a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Environment whose well-known endpoints seed the descriptor.
	pub environment: Environment,
	/// Optional discovery document override.
	pub discovery_endpoint: Option<Url>,
	/// Step-up endpoint overrides keyed by QoR level.
	pub step_up_endpoints: BTreeMap<Qor, Url>,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided environment.
	pub fn new(environment: Environment) -> Self {
		Self { environment, discovery_endpoint: None, step_up_endpoints: BTreeMap::new() }
	}

	/// Overrides the discovery document location.
	pub fn discovery_endpoint(mut self, url: Url) -> Self {
		self.discovery_endpoint = Some(url);

		self
	}

	/// Overrides (or adds) the step-up endpoint for a QoR level.
	pub fn step_up_endpoint(mut self, level: Qor, url: Url) -> Self {
		self.step_up_endpoints.insert(level, url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let discovery = match self.discovery_endpoint {
			Some(url) => url,
			None => parse_builtin("discovery", self.environment.discovery_url())?,
		};
		let mut step_up = BTreeMap::new();

		for (level, raw) in self.environment.step_up_urls() {
			step_up.insert(*level, parse_builtin("step_up", raw)?);
		}

		step_up.extend(self.step_up_endpoints);

		let descriptor = ProviderDescriptor { environment: self.environment, discovery, step_up };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		validate_endpoint("discovery", &self.discovery)?;

		for url in self.step_up.values() {
			validate_endpoint("step_up", url)?;
		}

		Ok(())
	}
}

/// Requires HTTPS, except for loopback hosts used in local development.
pub(crate) fn validate_endpoint(
	name: &'static str,
	url: &Url,
) -> Result<(), ProviderDescriptorError> {
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

fn parse_builtin(endpoint: &'static str, raw: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|source| ProviderDescriptorError::InvalidEndpoint { endpoint, source })
}
