//! Walks through a SwissID login across two requests sharing one session record.
//!
//! Run without arguments to print the authorization redirect. After logging in, run again
//! with the full callback URL the provider redirected to, for example
//! `cargo run --example authorization_flow -- 'https://shop.example.com/callback?code=...'`.
//!
//! Credentials come from `SWISSID_CLIENT_ID`, `SWISSID_CLIENT_SECRET`, and
//! `SWISSID_REDIRECT_URI`; the environment defaults to `PRE`.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use swissid_connector::{
	auth::{AuthenticationRequest, Qor},
	config::ConnectorConfig,
	flows::{Callback, ReqwestConnector, Transition},
	store::{FileStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ConnectorConfig::new(
		env::var("SWISSID_CLIENT_ID").unwrap_or_else(|_| "demo-client".into()),
		env::var("SWISSID_CLIENT_SECRET").unwrap_or_else(|_| "demo-secret".into()),
		&env::var("SWISSID_REDIRECT_URI")
			.unwrap_or_else(|_| "https://shop.example.com/swissid/callback".into()),
		&env::var("SWISSID_ENVIRONMENT").unwrap_or_else(|_| "PRE".into()),
	)?;
	// Stands in for the web framework's per-user session storage.
	let store: Arc<dyn SessionStore> =
		Arc::new(FileStore::open(env::temp_dir().join("swissid_connector_demo.json"))?);
	let mut connector = ReqwestConnector::restore(config, store).await?;

	if !connector.is_initialized() {
		return Err(eyre!("Connector failed to initialize: {:?}.", connector.last_error()));
	}

	let transition = match env::args().nth(1) {
		Some(callback) => {
			let callback = Callback::from_url(&Url::parse(&callback)?);

			connector.complete_authentication(&callback).await?
		},
		None => {
			let request = AuthenticationRequest::new()
				.scope("openid profile email")
				.qoa("qoa1")
				.locale("en");

			connector.authenticate(&request).await?
		},
	};

	match transition {
		Transition::Redirect(url) => println!("Send your user to {url}."),
		Transition::Continue(claims) => {
			println!("Authenticated subject: {:?}.", claims.subject());
			println!("Age over 18: {}.", claims.is_age_over_18());

			if !connector.is_stepped_up(Qor::Qor1) {
				println!("A QoR1 step-up starts with `Connector::step_up_qor(\"qor1\", ..)`.");
			}
		},
	}

	Ok(())
}
