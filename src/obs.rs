//! Optional observability helpers for connector flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `swissid_connector.flow` with the `flow`
//!   (operation) and `stage` (call site) fields, plus warning events for failures the
//!   connector deliberately does not surface.
//! - Enable `metrics` to increment the `swissid_connector_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Connector operations observed by the instrumentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Discovery and JWKS loading.
	Initialize,
	/// Authorization redirect construction.
	Authenticate,
	/// Callback handling and claim refresh.
	CompleteAuthentication,
	/// QoR step-up.
	StepUp,
	/// Refresh-token grant.
	Refresh,
	/// Userinfo fetch and verification.
	UserInfo,
	/// Session termination.
	EndSession,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Initialize => "initialize",
			FlowKind::Authenticate => "authenticate",
			FlowKind::CompleteAuthentication => "complete_authentication",
			FlowKind::StepUp => "step_up",
			FlowKind::Refresh => "refresh",
			FlowKind::UserInfo => "userinfo",
			FlowKind::EndSession => "end_session",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a connector operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
