pub mod h1;

use crate::request::{Credentials, Proxy, Request};
use futures_io::{AsyncRead, AsyncWrite};
use std::future::Future;
use std::time::Duration;

/// The headers routed to dedicated connection properties rather than the generic header list.
///
/// Each field corresponds to one name in
/// [`SPECIAL_HEADERS`](crate::SPECIAL_HEADERS). A transport backed by a
/// platform HTTP client maps these onto whatever dedicated properties that client exposes; the
/// built-in HTTP/1.1 transport serializes them like any other header but keeps the routing so
/// substituting a platform transport does not change behavior.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[allow(missing_docs)] // Field names mirror the header names they carry.
pub struct SpecialHeaders {
	pub accept: Option<String>,
	pub connection: Option<String>,
	pub content_length: Option<String>,
	pub content_type: Option<String>,
	pub expect: Option<String>,
	pub date: Option<String>,
	pub host: Option<String>,
	pub if_modified_since: Option<String>,
	pub range: Option<String>,
	pub referer: Option<String>,
	pub transfer_encoding: Option<String>,
	pub user_agent: Option<String>,
}

impl SpecialHeaders {
	/// Routes one header into the matching field.
	///
	/// Returns `true` if the name matched a special header (and the value was stored), `false`
	/// if the header is not special and belongs in the generic list.
	pub fn route(&mut self, name: &str, value: &str) -> bool {
		let slot = if name.eq_ignore_ascii_case("accept") {
			&mut self.accept
		} else if name.eq_ignore_ascii_case("connection") {
			&mut self.connection
		} else if name.eq_ignore_ascii_case("content-length") {
			&mut self.content_length
		} else if name.eq_ignore_ascii_case("content-type") {
			&mut self.content_type
		} else if name.eq_ignore_ascii_case("expect") {
			&mut self.expect
		} else if name.eq_ignore_ascii_case("date") {
			&mut self.date
		} else if name.eq_ignore_ascii_case("host") {
			&mut self.host
		} else if name.eq_ignore_ascii_case("if-modified-since") {
			&mut self.if_modified_since
		} else if name.eq_ignore_ascii_case("range") {
			&mut self.range
		} else if name.eq_ignore_ascii_case("referer") {
			&mut self.referer
		} else if name.eq_ignore_ascii_case("transfer-encoding") {
			&mut self.transfer_encoding
		} else if name.eq_ignore_ascii_case("user-agent") {
			&mut self.user_agent
		} else {
			return false;
		};
		*slot = Some(value.to_string());
		true
	}
}

/// Everything a transport needs to materialize a live connection.
///
/// Built by the connect stage from a frozen [`Request`], after the authenticator has run.
#[derive(Clone, Debug)]
pub struct ConnectParams {
	/// The fully-assembled URL: base URL, resource path, and query string.
	pub url: String,

	/// The HTTP method.
	pub method: String,

	/// The headers routed to dedicated properties.
	pub special: SpecialHeaders,

	/// The remaining headers, added generically, in insertion order.
	pub headers: Vec<(String, String)>,

	/// The cookies to attach to the connection.
	pub cookies: Vec<(String, String)>,

	/// The proxy to route through, if any.
	pub proxy: Option<Proxy>,

	/// The credentials to present, if any.
	pub credentials: Option<Credentials>,

	/// The timeout the transport should apply, if any.
	pub timeout: Option<Duration>,

	/// The request body length the transport should announce.
	///
	/// `Some` holds the body's total length when a body will be written, or zero for a bodiless
	/// request whose method is not `GET`. `None` means no length is announced at all.
	pub content_length: Option<u64>,
}

impl ConnectParams {
	/// Builds connection parameters from a request.
	#[must_use]
	pub fn from_request(request: &Request) -> Self {
		let mut special = SpecialHeaders::default();
		let mut headers = Vec::new();
		for (name, value) in request.headers().iter() {
			if !special.route(name, value) {
				headers.push((name.to_string(), value.to_string()));
			}
		}
		let body_len = request.body().len();
		let content_length = if body_len > 0 {
			Some(body_len)
		} else if request.get_method().eq_ignore_ascii_case("GET") {
			None
		} else {
			Some(0)
		};
		Self {
			url: request.url(),
			method: request.get_method().to_string(),
			special,
			headers,
			cookies: request.cookies().to_vec(),
			proxy: request.get_proxy().cloned(),
			credentials: request.get_credentials().cloned(),
			timeout: request.get_timeout(),
			content_length,
		}
	}
}

/// The outcome of completing an exchange on a connection.
#[derive(Debug)]
pub enum Exchange<R> {
	/// A response was obtained with no transport-level error.
	Response(R),

	/// The transport reported an error.
	Failed {
		/// The error response the transport carried alongside the failure, if the failure was
		/// protocol-level (the request reached the server and got an error status). `None` means
		/// the failure was connection-level and no response exists at all.
		response: Option<R>,

		/// The transport's error.
		error: std::io::Error,
	},
}

/// The boundary abstraction over a platform HTTP client or a raw protocol implementation.
///
/// A transport materializes one live connection per [`connect`](Transport::connect) call. The
/// pipeline drives the connection through the write-body / complete-exchange / read-body
/// sequence; the transport owns everything below that: socket management, TLS, name resolution,
/// and whatever timeout the [`ConnectParams`] requested.
pub trait Transport {
	/// The live connection type.
	type Connection: Connection;

	/// Opens a connection and sends the request line, headers, and cookies.
	fn connect(
		&mut self,
		params: &ConnectParams,
	) -> impl Future<Output = std::io::Result<Self::Connection>>;
}

/// A live connection in the request-writing phase.
///
/// The `AsyncWrite` implementation is the request body write channel. When the body (if any) has
/// been written, [`finish`](Connection::finish) completes the exchange and moves to the response
/// phase.
pub trait Connection: AsyncWrite + Unpin {
	/// The response handle type.
	type Response: TransportResponse;

	/// Completes the exchange: flushes anything buffered and obtains the response.
	fn finish(self) -> impl Future<Output = Exchange<Self::Response>>;
}

/// A response obtained from a transport.
///
/// The `AsyncRead` implementation is the response body read channel; it reports end-of-body as a
/// zero-byte read. The metadata accessors must be callable before any body byte is read.
pub trait TransportResponse: AsyncRead + Unpin {
	/// Returns the HTTP status code.
	fn status(&self) -> u16;

	/// Returns the reason phrase.
	fn reason(&self) -> &str;

	/// Returns the HTTP minor version number (0 for HTTP/1.0, 1 for HTTP/1.1).
	fn minor_version(&self) -> u8;

	/// Returns the response headers in wire order.
	fn headers(&self) -> &[(String, String)];

	/// Returns the body length announced by the response, if any.
	fn content_length(&self) -> Option<u64>;
}

#[cfg(test)]
mod test {
	use super::ConnectParams;
	use crate::request::Request;

	/// Tests that special headers route to dedicated fields and the rest stay generic.
	#[test]
	fn test_special_routing() {
		let request = Request::new("http://example.com")
			.unwrap()
			.header("Content-Type", "text/plain")
			.header("X-Custom", "1")
			.header("user-agent", "aare");
		let params = ConnectParams::from_request(&request);
		assert_eq!(params.special.content_type.as_deref(), Some("text/plain"));
		assert_eq!(params.special.user_agent.as_deref(), Some("aare"));
		assert_eq!(params.headers, [("X-Custom".to_string(), "1".to_string())]);
	}

	/// Tests the content length defaults: absent for GET, zero for bodiless non-GET, the body
	/// length otherwise.
	#[test]
	fn test_content_length_defaults() {
		let get = Request::new("http://example.com").unwrap();
		assert_eq!(ConnectParams::from_request(&get).content_length, None);

		let delete = Request::new("http://example.com").unwrap().method("DELETE");
		assert_eq!(ConnectParams::from_request(&delete).content_length, Some(0));

		let post = Request::new("http://example.com")
			.unwrap()
			.method("POST")
			.body_str("0123456789");
		assert_eq!(ConnectParams::from_request(&post).content_length, Some(10));
	}
}
