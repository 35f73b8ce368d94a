pub mod body;
pub mod headers;

use crate::auth::Authenticator;
use crate::error::{ConfigError, Error};
use body::Body;
use headers::Headers;
use std::time::Duration;

/// A proxy through which the transport should route the connection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proxy {
	/// The proxy URL.
	pub url: String,
}

/// Credentials the transport should present to the server or proxy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credentials {
	/// The user name.
	pub username: String,

	/// The password.
	pub password: String,
}

/// The default read/write buffer size, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// A description of one HTTP request, assembled through the fluent setters and handed to
/// [`execute`](crate::execute).
///
/// A request is conceptually frozen the moment an execution begins; mutating it while an
/// execution is in flight is not supported, and concurrent executions of the same request are not
/// supported either. Executing the same request again after the previous execution reached a
/// terminal state is fine.
///
/// Every fluent setter has a borrowing `set_` counterpart. The borrowing forms exist mainly for
/// [`Authenticator`](crate::Authenticator) implementations, which receive `&mut Request` and
/// typically inject a header or a query parameter before dispatch.
pub struct Request {
	base_url: String,
	resource_path: String,
	method: String,
	headers: Headers,
	query: Vec<(String, String)>,
	cookies: Vec<(String, String)>,
	body: Body,
	proxy: Option<Proxy>,
	credentials: Option<Credentials>,
	timeout: Option<Duration>,
	buffer_size: usize,
	authenticator: Option<Box<dyn Authenticator + Send>>,
}

impl Request {
	/// Constructs a request for the given base URL.
	///
	/// # Errors
	/// This function returns a configuration error if `base_url` is empty.
	pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
		let base_url = base_url.into();
		if base_url.is_empty() {
			return Err(ConfigError::EmptyBaseUrl.into());
		}
		Ok(Self {
			base_url,
			resource_path: String::new(),
			method: "GET".to_string(),
			headers: Headers::new(),
			query: Vec::new(),
			cookies: Vec::new(),
			body: Body::new(),
			proxy: None,
			credentials: None,
			timeout: None,
			buffer_size: DEFAULT_BUFFER_SIZE,
			authenticator: None,
		})
	}

	/// Sets the HTTP method.
	#[must_use]
	pub fn method(mut self, method: impl Into<String>) -> Self {
		self.set_method(method);
		self
	}

	/// Sets the HTTP method.
	pub fn set_method(&mut self, method: impl Into<String>) {
		self.method = method.into();
	}

	/// Sets the resource path.
	///
	/// The path is normalized: an empty path stays empty, and any other path is forced to start
	/// with `/`.
	#[must_use]
	pub fn resource_path(mut self, path: impl Into<String>) -> Self {
		self.set_resource_path(path);
		self
	}

	/// Sets the resource path, applying the same normalization as
	/// [`resource_path`](Self::resource_path).
	pub fn set_resource_path(&mut self, path: impl Into<String>) {
		let path = path.into();
		self.resource_path = if path.is_empty() || path.starts_with('/') {
			path
		} else {
			format!("/{path}")
		};
	}

	/// Adds a header, with the replacement semantics of [`Headers::add`].
	#[must_use]
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.add(name, value);
		self
	}

	/// Adds a header, with the replacement semantics of [`Headers::add`].
	pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.headers.add(name, value);
	}

	/// Sets a header, replacing any prior entry with the same name.
	pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.headers.set(name, value);
	}

	/// Adds a query string parameter.
	///
	/// Names and values are used verbatim; any percent-encoding must already have been applied.
	#[must_use]
	pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.add_query(name, value);
		self
	}

	/// Adds a query string parameter.
	pub fn add_query(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.query.push((name.into(), value.into()));
	}

	/// Adds a cookie.
	#[must_use]
	pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.cookies.push((name.into(), value.into()));
		self
	}

	/// Appends a body segment of UTF-8 text.
	#[must_use]
	pub fn body_str(mut self, text: impl AsRef<str>) -> Self {
		self.body.append_str(text);
		self
	}

	/// Appends a body segment of raw bytes.
	#[must_use]
	pub fn body_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
		self.body.append_bytes(bytes);
		self
	}

	/// Appends a body segment of form pairs rendered `name=value` and joined with `&`.
	#[must_use]
	pub fn body_pairs<K: AsRef<str>, V: AsRef<str>>(
		mut self,
		pairs: impl IntoIterator<Item = (K, V)>,
	) -> Self {
		self.body.append_pairs(pairs);
		self
	}

	/// Sets the proxy.
	#[must_use]
	pub fn proxy(mut self, proxy: Proxy) -> Self {
		self.proxy = Some(proxy);
		self
	}

	/// Sets the credentials.
	#[must_use]
	pub fn credentials(mut self, credentials: Credentials) -> Self {
		self.credentials = Some(credentials);
		self
	}

	/// Sets the timeout the transport should apply.
	#[must_use]
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);
		self
	}

	/// Sets the read/write buffer size.
	///
	/// # Panics
	/// This function panics in a debug build if `size` is zero; a zero size that survives into an
	/// execution is reported there as a configuration error.
	#[must_use]
	pub fn buffer_size(mut self, size: usize) -> Self {
		debug_assert!(size >= 1, "Buffer size must be at least one byte");
		self.buffer_size = size;
		self
	}

	/// Sets the authenticator invoked once before dispatch.
	#[must_use]
	pub fn authenticator(mut self, authenticator: impl Authenticator + Send + 'static) -> Self {
		self.authenticator = Some(Box::new(authenticator));
		self
	}

	/// Returns the base URL.
	#[must_use]
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Returns the normalized resource path.
	#[must_use]
	pub fn get_resource_path(&self) -> &str {
		&self.resource_path
	}

	/// Returns the HTTP method.
	#[must_use]
	pub fn get_method(&self) -> &str {
		&self.method
	}

	/// Returns the headers.
	#[must_use]
	pub fn headers(&self) -> &Headers {
		&self.headers
	}

	/// Returns the query parameters in insertion order.
	#[must_use]
	pub fn query_params(&self) -> &[(String, String)] {
		&self.query
	}

	/// Returns the cookies in insertion order.
	#[must_use]
	pub fn cookies(&self) -> &[(String, String)] {
		&self.cookies
	}

	/// Returns the body.
	#[must_use]
	pub fn body(&self) -> &Body {
		&self.body
	}

	/// Returns the proxy, if set.
	#[must_use]
	pub fn get_proxy(&self) -> Option<&Proxy> {
		self.proxy.as_ref()
	}

	/// Returns the credentials, if set.
	#[must_use]
	pub fn get_credentials(&self) -> Option<&Credentials> {
		self.credentials.as_ref()
	}

	/// Returns the timeout, if set.
	#[must_use]
	pub fn get_timeout(&self) -> Option<Duration> {
		self.timeout
	}

	/// Returns the buffer size.
	#[must_use]
	pub fn get_buffer_size(&self) -> usize {
		self.buffer_size
	}

	/// Assembles the full URL: base URL, resource path, and query string.
	///
	/// Query pairs are joined `name=value` with `&`; percent-encoding is assumed to have been
	/// applied by the caller.
	#[must_use]
	pub fn url(&self) -> String {
		let mut url = format!("{}{}", self.base_url, self.resource_path);
		for (i, (name, value)) in self.query.iter().enumerate() {
			url.push(if i == 0 { '?' } else { '&' });
			url.push_str(name);
			url.push('=');
			url.push_str(value);
		}
		url
	}

	/// Takes the authenticator out for the authenticate stage.
	pub(crate) fn take_authenticator(&mut self) -> Option<Box<dyn Authenticator + Send>> {
		self.authenticator.take()
	}

	/// Puts the authenticator back after the authenticate stage.
	pub(crate) fn restore_authenticator(&mut self, authenticator: Box<dyn Authenticator + Send>) {
		self.authenticator = Some(authenticator);
	}
}

impl std::fmt::Debug for Request {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Request")
			.field("method", &self.method)
			.field("url", &self.url())
			.field("headers", &self.headers)
			.field("cookies", &self.cookies)
			.field("body_len", &self.body.len())
			.field("proxy", &self.proxy)
			.field("timeout", &self.timeout)
			.field("buffer_size", &self.buffer_size)
			.field("authenticated", &self.authenticator.is_some())
			.finish()
	}
}
