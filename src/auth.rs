use crate::request::Request;
use base64ct::{Base64, Encoding};

/// A capability invoked exactly once per execution, before dispatch, to annotate the request.
///
/// An authenticator runs while the request is still mutable: it may add or replace headers or
/// query parameters, and whatever it changes is what the connect stage sees. An error here is
/// terminal; the pipeline reports it as an authentication failure without touching the network.
pub trait Authenticator {
	/// Mutates the request to carry whatever the authentication scheme requires.
	///
	/// # Errors
	/// Any error aborts the execution before any network activity.
	fn authenticate(
		&self,
		request: &mut Request,
	) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// An authenticator implementing the Basic scheme of RFC 7617.
///
/// Injects `Authorization: Basic <base64(username:password)>`, replacing any previous
/// `Authorization` header so repeated executions of the same request do not accumulate one entry
/// per run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Basic {
	username: String,
	password: String,
}

impl Basic {
	/// Constructs a Basic authenticator for the given credentials.
	#[must_use]
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}
}

impl Authenticator for Basic {
	fn authenticate(
		&self,
		request: &mut Request,
	) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		let pair = format!("{}:{}", self.username, self.password);
		let encoded = Base64::encode_string(pair.as_bytes());
		request.set_header("Authorization", format!("Basic {encoded}"));
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::{Authenticator, Basic};
	use crate::request::Request;

	/// Tests the RFC 7617 example credentials.
	#[test]
	fn test_basic_header() {
		let mut request = Request::new("http://example.com").unwrap();
		let auth = Basic::new("Aladdin", "open sesame");
		auth.authenticate(&mut request).unwrap();
		assert_eq!(
			request.headers().get("Authorization"),
			Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
		);
	}

	/// Tests that repeated authentication replaces rather than appends.
	#[test]
	fn test_basic_replaces() {
		let mut request = Request::new("http://example.com").unwrap();
		let auth = Basic::new("user", "pass");
		auth.authenticate(&mut request).unwrap();
		auth.authenticate(&mut request).unwrap();
		assert_eq!(request.headers().len(), 1);
	}
}
