//! Deployment environments and their well-known endpoints.

// self
use crate::{
	_prelude::*,
	auth::{Qor, params::def_param},
	error::ParameterError,
};

const PRE_DISCOVERY: &str =
	"https://login.sandbox.pre.swissid.ch/idp/oauth2/.well-known/openid-configuration";
const PRE_STEP_UP_QOR1: &str = "https://account.sandbox.pre.swissid.ch/idcheck/rp/stepup/lot1";
const PROD_DISCOVERY: &str = "https://login.swissid.ch/idp/oauth2/.well-known/openid-configuration";
const PROD_STEP_UP_QOR1: &str = "https://account.swissid.ch/idcheck/rp/stepup/lot1";

def_param! {
	/// Identity provider deployment the connector talks to.
	Environment, "environment" {
		/// Pre-production sandbox.
		Preproduction => "PRE",
		/// Production.
		Production => "PROD",
	}
}
impl Environment {
	/// Well-known discovery document location.
	pub const fn discovery_url(self) -> &'static str {
		match self {
			Self::Preproduction => PRE_DISCOVERY,
			Self::Production => PROD_DISCOVERY,
		}
	}

	/// Step-up endpoints keyed by the QoR level they raise the session to.
	pub const fn step_up_urls(self) -> &'static [(Qor, &'static str)] {
		match self {
			Self::Preproduction => &[(Qor::Qor1, PRE_STEP_UP_QOR1)],
			Self::Production => &[(Qor::Qor1, PROD_STEP_UP_QOR1)],
		}
	}
}
