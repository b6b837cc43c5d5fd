//! Session termination.

// self
use crate::{
	_prelude::*,
	flows::Connector,
	http::{self, ProviderHttpClient},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const END_SESSION_ENDPOINT: &str = "end_session";

impl<C, M> Connector<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Ends the end-user session.
	///
	/// The provider's end-session endpoint is notified on a best-effort basis (with
	/// `id_token_hint` when an ID token is held); a failed notification is logged and
	/// otherwise ignored. The session state is then cleared and the persisted record deleted.
	/// Ending a session on an uninitialized connector succeeds without doing anything.
	pub async fn end_session(&mut self) -> Result<()> {
		const KIND: FlowKind = FlowKind::EndSession;

		let span = FlowSpan::new(KIND, "end_session");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		if !self.is_initialized() {
			obs::record_flow_outcome(KIND, FlowOutcome::Success);

			return Ok(());
		}

		self.state.last_error = None;

		let result = span
			.instrument(async {
				if let Err(err) = self.notify_end_session().await {
					obs::warn(KIND, "end-session notification failed", &err);
				}

				self.state.reset_session();

				self.store.delete(&self.config.session_key).await.map_err(Error::from)
			})
			.await;

		obs::record_flow_outcome(
			KIND,
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		result.map_err(|err| self.record(err))
	}

	async fn notify_end_session(&self) -> Result<()> {
		let Some(tokens) = self.state.tokens.as_ref() else {
			return Ok(());
		};
		let Some(mut url) = self.provider()?.metadata.end_session_endpoint.clone() else {
			return Ok(());
		};

		url.query_pairs_mut().append_pair("id_token_hint", tokens.id_token.expose());

		let request = http::get_request(&url, None)?;

		http::execute(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			END_SESSION_ENDPOINT,
			request,
		)
		.await?;

		Ok(())
	}
}
