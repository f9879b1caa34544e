// SPDX-License-Identifier: GPL-3.0
//! Ledger endpoint description.

use std::fmt::{self, Debug, Display, Formatter};
use url::Url;

/// A JSON-RPC endpoint, optionally carrying a bearer token for authentication.
///
/// The token is attached to every request as an `Authorization: Bearer` header
/// and is never included in display or debug output.
#[derive(Clone)]
pub struct Endpoint {
	url: Url,
	auth_token: Option<String>,
}

impl Endpoint {
	/// Create an endpoint without authentication.
	pub fn new(url: Url) -> Self {
		Self { url, auth_token: None }
	}

	/// Attach a bearer token.
	pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
		self.auth_token = Some(token.into());
		self
	}

	/// The endpoint URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// The bearer token, if one is configured.
	pub fn auth_token(&self) -> Option<&str> {
		self.auth_token.as_deref()
	}
}

impl From<Url> for Endpoint {
	fn from(url: Url) -> Self {
		Self::new(url)
	}
}

impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.url)
	}
}

impl Debug for Endpoint {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Endpoint")
			.field("url", &self.url.as_str())
			.field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}
