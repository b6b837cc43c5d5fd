//! Enumerated authorization request parameters (QoA, QoR, locale, prompt, token kind).

// self
use crate::{_prelude::*, error::ParameterError};

macro_rules! def_param {
	(
		$(#[$meta:meta])*
		$name:ident, $param:literal {
			$($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		pub enum $name {
			$($(#[$vmeta])* #[serde(rename = $value)] $variant,)+
		}
		impl $name {
			/// Every accepted value, in declaration order.
			pub const ALL: &'static [Self] = &[$(Self::$variant),+];
			/// Parameter name used in validation errors.
			pub const PARAMETER: &'static str = $param;

			/// Returns the wire value.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $value,)+
				}
			}

			/// Comma-separated list of the accepted wire values.
			pub fn allowed_values() -> String {
				[$($value),+].join(", ")
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
		impl FromStr for $name {
			type Err = ParameterError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($value => Ok(Self::$variant),)+
					_ => Err(ParameterError {
						parameter: $param,
						value: s.to_owned(),
						allowed: Self::allowed_values(),
					}),
				}
			}
		}
	};
}
pub(crate) use def_param;

def_param! {
	/// Quality of Authentication requested for the login event.
	Qoa, "qoa" {
		/// Single-factor authentication.
		Qoa1 => "qoa1",
		/// Two-factor authentication.
		Qoa2 => "qoa2",
	}
}

def_param! {
	/// Quality of Registration of the end-user's identity data.
	Qor, "qor" {
		/// Self-declared data.
		Qor0 => "qor0",
		/// Verified identity data (age and identity claims).
		Qor1 => "qor1",
		/// Verified identity data with the highest assurance.
		Qor2 => "qor2",
	}
}

def_param! {
	/// UI locale forwarded to the provider as `ui_locales`.
	Locale, "locale" {
		/// German.
		De => "de",
		/// French.
		Fr => "fr",
		/// Italian.
		It => "it",
		/// English.
		En => "en",
	}
}

def_param! {
	/// OpenID Connect `prompt` values accepted by the provider.
	Prompt, "prompt" {
		/// No interaction; fail if the user is not already logged in.
		None => "none",
		/// Force re-authentication.
		Login => "login",
		/// Force the consent screen.
		Consent => "consent",
	}
}

def_param! {
	/// Token kinds readable through the connector.
	TokenKind, "token_type" {
		/// Access token.
		Access => "ACCESS",
		/// Refresh token.
		Refresh => "REFRESH",
	}
}
