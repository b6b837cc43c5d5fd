//! Quality-of-Registration step-up on top of an authenticated session.

// self
use crate::{
	_prelude::*,
	auth::{AuthenticationRequest, Qor},
	error::{ConfigError, StateError},
	flows::{Callback, Connector, Transition, authorize},
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	state::{AuthState, StepUpState},
};

impl<C, M> Connector<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Drives the step-up to the QoR level named by `target` (for example `qor1`).
	///
	/// The first call redirects to the environment's step-up endpoint for that level. The
	/// call made from the step-up callback exchanges the returned code and refreshes the
	/// claims. Once the level is reached, further calls only refresh the claims.
	pub async fn step_up_qor(
		&mut self,
		target: &str,
		request: &AuthenticationRequest,
		callback: &Callback,
	) -> Result<Transition> {
		const KIND: FlowKind = FlowKind::StepUp;

		let span = FlowSpan::new(KIND, "step_up_qor");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		self.state.last_error = None;

		let result = span.instrument(self.advance_step_up(target, request, callback)).await;

		self.finish(KIND, result).await
	}

	async fn advance_step_up(
		&mut self,
		target: &str,
		request: &AuthenticationRequest,
		callback: &Callback,
	) -> Result<Transition> {
		self.provider()?;

		let level = Qor::from_str(target)?;

		if self.state.authentication != AuthState::Authenticated {
			return Err(StateError::NotAuthenticated.into());
		}

		match self.state.step_up_state(level) {
			StepUpState::NotStarted => {
				if let Some(err) = callback.provider_error() {
					return Err(err);
				}
				if callback.code.is_some() {
					return Err(StateError::StepUpNotInitiated { level }.into());
				}

				self.start_step_up(level, request)
			},
			StepUpState::InProgress => {
				let code = self.accept_callback(callback)?;

				self.exchange_code(&code).await?;

				let transition = self.obtain_claims().await?;

				if let Transition::Continue(_) = transition {
					self.state.set_step_up_state(level, StepUpState::SteppedUp);
				}

				Ok(transition)
			},
			StepUpState::SteppedUp => self.obtain_claims().await,
		}
	}

	fn start_step_up(&mut self, level: Qor, request: &AuthenticationRequest) -> Result<Transition> {
		let endpoint = self
			.config
			.provider
			.step_up_endpoint(level)
			.cloned()
			.ok_or(ConfigError::UnsupportedStepUp { level })?;
		let overrides = request.validate()?;
		let params = authorize::effective_params(&self.state.params, &overrides);
		let url = authorize::build_request_url(
			&endpoint,
			&self.config.client_id,
			&self.config.redirect_uri,
			&params,
		);

		self.state.params = params;
		self.state.set_step_up_state(level, StepUpState::InProgress);

		Ok(Transition::Redirect(url))
	}
}
