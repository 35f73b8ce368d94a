use crate::transport::TransportResponse;

/// A snapshot of everything known about a response when its headers arrived.
///
/// Built once per execution, at the headers-received stage, from the live transport response;
/// the body has not necessarily been read when a caller first sees this (the headers-received
/// hook runs before any body byte flows).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResponseInfo {
	/// The HTTP status code.
	pub status: u16,

	/// The reason phrase.
	pub reason: String,

	/// The HTTP minor version number (0 for HTTP/1.0, 1 for HTTP/1.1).
	pub minor_version: u8,

	/// The response headers in wire order.
	pub headers: Vec<(String, String)>,

	/// The body length announced by the response, if any.
	pub content_length: Option<u64>,

	/// The media type from the `Content-Type` header, without parameters.
	pub content_type: Option<String>,

	/// The `Content-Encoding` header value.
	pub content_encoding: Option<String>,

	/// The `charset` parameter of the `Content-Type` header.
	pub charset: Option<String>,

	/// The cookies from `Set-Cookie` headers, as name/value pairs with attributes stripped.
	pub cookies: Vec<(String, String)>,

	/// The `Server` header value.
	pub server: Option<String>,

	/// The `Last-Modified` header value, verbatim.
	pub last_modified: Option<String>,
}

impl ResponseInfo {
	/// Builds a snapshot from a live transport response.
	pub(crate) fn from_transport<R: TransportResponse + ?Sized>(response: &R) -> Self {
		let headers: Vec<(String, String)> = response.headers().to_vec();
		let (content_type, charset) = match header(&headers, "content-type") {
			Some(value) => split_content_type(value),
			None => (None, None),
		};
		let cookies = headers
			.iter()
			.filter(|(name, _)| name.eq_ignore_ascii_case("set-cookie"))
			.filter_map(|(_, value)| split_cookie(value))
			.collect();
		Self {
			status: response.status(),
			reason: response.reason().to_string(),
			minor_version: response.minor_version(),
			content_length: response.content_length(),
			content_type,
			content_encoding: header(&headers, "content-encoding").map(str::to_string),
			charset,
			cookies,
			server: header(&headers, "server").map(str::to_string),
			last_modified: header(&headers, "last-modified").map(str::to_string),
			headers,
		}
	}

	/// Returns the value of the first header with the given name, compared case-insensitively.
	#[must_use]
	pub fn header(&self, name: &str) -> Option<&str> {
		header(&self.headers, name)
	}
}

/// Finds the first header with the given name, compared case-insensitively.
fn header<'h>(headers: &'h [(String, String)], name: &str) -> Option<&'h str> {
	headers
		.iter()
		.find(|(existing, _)| existing.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}

/// Splits a `Content-Type` value into the media type and the `charset` parameter.
fn split_content_type(value: &str) -> (Option<String>, Option<String>) {
	let mut parts = value.split(';');
	let media_type = parts
		.next()
		.map(str::trim)
		.filter(|part| !part.is_empty())
		.map(str::to_string);
	let charset = parts
		.filter_map(|part| part.trim().split_once('='))
		.find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
		.map(|(_, charset)| charset.trim().trim_matches('"').to_string());
	(media_type, charset)
}

/// Extracts the name/value pair of a `Set-Cookie` value, dropping attributes.
fn split_cookie(value: &str) -> Option<(String, String)> {
	let pair = value.split(';').next()?;
	let (name, value) = pair.split_once('=')?;
	let name = name.trim();
	if name.is_empty() {
		None
	} else {
		Some((name.to_string(), value.trim().to_string()))
	}
}
