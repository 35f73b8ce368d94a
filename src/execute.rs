//! The execution state machine.
//!
//! An execution drives a frozen [`Request`] through a fixed stage sequence: authenticate,
//! connect, write the request body (when one exists), complete the exchange, snapshot the
//! response headers, and drain the response body into the destination sink. The stages run
//! strictly in order; no two network stages of one execution are ever in flight concurrently.
//! Suspension happens only at the transport boundary, so the same pipeline serves both the
//! asynchronous entry points (await the returned future) and the blocking ones (the future is
//! driven by `futures_executor::block_on` behind the `blocking` feature).
//!
//! Failures after argument validation never propagate out of the entry points; they are
//! classified and delivered inside the [`Outcome`], and the completed hook fires exactly once on
//! every terminal path. Cancellation is cooperative and is reported as a status rather than an
//! error.

use crate::cancel::CancelHandle;
use crate::copy::{Copier, CopyEnd};
use crate::error::{ConfigError, Error};
use crate::outcome::{Outcome, Sink, Status};
use crate::request::Request;
use crate::response::ResponseInfo;
use crate::transport::{ConnectParams, Connection, Exchange, Transport, TransportResponse};
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::debug;

/// A snapshot of download progress, handed to the chunk hook after each chunk reaches the
/// destination.
#[derive(Clone, Copy, Debug)]
pub struct Progress {
	/// The number of body bytes written to the destination so far.
	pub bytes: u64,

	/// The total body length, when the response announced one.
	pub total: Option<u64>,

	/// How long the execution has been running.
	pub elapsed: Duration,
}

impl Progress {
	/// Returns the percentage of the body transferred, rounded to the nearest whole number.
	///
	/// Progress is indeterminate (`None`) when the response announced no length, or announced a
	/// length of zero.
	#[must_use]
	pub fn percent(&self) -> Option<u8> {
		match self.total {
			Some(total) if total > 0 => {
				Some((self.bytes as f64 * 100.0 / total as f64).round() as u8)
			}
			_ => None,
		}
	}

	/// Returns the transfer rate in bytes per second, or `None` if no measurable time has
	/// passed.
	#[must_use]
	pub fn bytes_per_second(&self) -> Option<u64> {
		let seconds = self.elapsed.as_secs_f64();
		if seconds > 0.0 {
			Some((self.bytes as f64 / seconds) as u64)
		} else {
			None
		}
	}
}

/// The per-execution notification hooks, cancellation handle, and destination sink.
///
/// All hooks are optional; [`Hooks::new`] is a valid, inert set. Hooks may be invoked from
/// whatever thread the caller's executor resumes the execution on, so they must be `Send`; no
/// hook is ever invoked twice for the stage it observes.
#[derive(Default)]
pub struct Hooks<'h> {
	cancel: CancelHandle,
	sink: Option<Sink>,
	before: Option<Box<dyn FnMut(&Request) + Send + 'h>>,
	on_headers: Option<Box<dyn FnMut(&ResponseInfo) -> Option<Sink> + Send + 'h>>,
	on_chunk: Option<Box<dyn FnMut(&Progress) -> bool + Send + 'h>>,
	on_complete: Option<Box<dyn FnOnce(&Outcome) + Send + 'h>>,
}

impl<'h> Hooks<'h> {
	/// Constructs an inert set of hooks.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Uses the given cancellation handle instead of a fresh one.
	#[must_use]
	pub fn cancel(mut self, handle: CancelHandle) -> Self {
		self.cancel = handle;
		self
	}

	/// Returns a clone of the cancellation handle that the execution will observe.
	#[must_use]
	pub fn cancel_handle(&self) -> CancelHandle {
		self.cancel.clone()
	}

	/// Supplies the destination sink up front.
	///
	/// The headers-received hook can still replace it before any body byte flows.
	#[must_use]
	pub fn sink(mut self, sink: Sink) -> Self {
		self.sink = Some(sink);
		self
	}

	/// Registers a hook invoked once before the authenticate stage.
	#[must_use]
	pub fn before(mut self, hook: impl FnMut(&Request) + Send + 'h) -> Self {
		self.before = Some(Box::new(hook));
		self
	}

	/// Registers a hook invoked once when response headers have been received, before any body
	/// byte flows. Returning `Some` replaces the destination sink.
	#[must_use]
	pub fn on_headers(
		mut self,
		hook: impl FnMut(&ResponseInfo) -> Option<Sink> + Send + 'h,
	) -> Self {
		self.on_headers = Some(Box::new(hook));
		self
	}

	/// Registers a hook invoked after each body chunk reaches the destination. Returning
	/// `false` cancels the execution at that chunk boundary.
	#[must_use]
	pub fn on_chunk(mut self, hook: impl FnMut(&Progress) -> bool + Send + 'h) -> Self {
		self.on_chunk = Some(Box::new(hook));
		self
	}

	/// Registers a hook invoked exactly once when the execution reaches a terminal state.
	#[must_use]
	pub fn on_complete(mut self, hook: impl FnOnce(&Outcome) + Send + 'h) -> Self {
		self.on_complete = Some(Box::new(hook));
		self
	}
}

impl std::fmt::Debug for Hooks<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Hooks")
			.field("cancel", &self.cancel)
			.field("sink", &self.sink)
			.field("before", &self.before.is_some())
			.field("on_headers", &self.on_headers.is_some())
			.field("on_chunk", &self.on_chunk.is_some())
			.field("on_complete", &self.on_complete.is_some())
			.finish()
	}
}

/// Executes a request with no hooks.
///
/// See [`execute_with`] for the full contract.
pub async fn execute<T: Transport>(transport: &mut T, request: &mut Request) -> Outcome {
	execute_with(transport, request, Hooks::new()).await
}

/// Executes a request, driving every stage through the transport's asynchronous operations.
///
/// The returned [`Outcome`] is never "null": every failure past argument validation is
/// classified and delivered inside it, so this function's future always resolves. The request is
/// conceptually frozen for the duration; it is borrowed mutably only so the authenticator can
/// annotate it before dispatch.
pub async fn execute_with<T: Transport>(
	transport: &mut T,
	request: &mut Request,
	mut hooks: Hooks<'_>,
) -> Outcome {
	let started = Instant::now();
	let mut outcome = drive(transport, request, &mut hooks, started).await;
	outcome.elapsed = started.elapsed();
	if let Some(hook) = hooks.on_complete.take() {
		hook(&outcome);
	}
	outcome
}

/// Executes a request with no hooks, blocking the calling thread until a terminal state.
#[cfg(feature = "blocking")]
pub fn execute_blocking<T: Transport>(transport: &mut T, request: &mut Request) -> Outcome {
	futures_executor::block_on(execute(transport, request))
}

/// Executes a request, blocking the calling thread until a terminal state.
#[cfg(feature = "blocking")]
pub fn execute_blocking_with<T: Transport>(
	transport: &mut T,
	request: &mut Request,
	hooks: Hooks<'_>,
) -> Outcome {
	futures_executor::block_on(execute_with(transport, request, hooks))
}

/// Builds a terminal outcome for a stage that ended before headers were received.
fn terminal(hooks: &mut Hooks<'_>, status: Status, error: Option<Error>) -> Outcome {
	Outcome {
		status,
		error,
		response: None,
		sink: hooks.sink.take().unwrap_or_default(),
		bytes_transferred: 0,
		elapsed: Duration::ZERO,
	}
}

/// Runs the stage sequence. The caller stamps the elapsed time and fires the completed hook.
async fn drive<T: Transport>(
	transport: &mut T,
	request: &mut Request,
	hooks: &mut Hooks<'_>,
	started: Instant,
) -> Outcome {
	if let Some(hook) = hooks.before.as_mut() {
		hook(request);
	}

	// Configuration problems that survived the builder's debug assertions surface here, before
	// any network activity.
	if request.get_buffer_size() == 0 {
		return terminal(
			hooks,
			Status::Completed,
			Some(ConfigError::ZeroBufferSize.into()),
		);
	}

	let cancel = hooks.cancel.clone();

	// AUTHENTICATE: exactly once, while the request is still mutable.
	if cancel.is_cancelled() {
		return terminal(hooks, Status::Cancelled, None);
	}
	if let Some(authenticator) = request.take_authenticator() {
		let result = authenticator.authenticate(request);
		request.restore_authenticator(authenticator);
		if let Err(e) = result {
			debug!(error = %e, "authentication failed");
			return terminal(hooks, Status::Completed, Some(Error::Auth(e)));
		}
	}

	// CONNECT: the URL and header routing freeze into the connection parameters here.
	if cancel.is_cancelled() {
		return terminal(hooks, Status::Cancelled, None);
	}
	let params = ConnectParams::from_request(request);
	debug!(method = %params.method, url = %params.url, "connecting");
	let mut connection = match transport.connect(&params).await {
		Ok(connection) => connection,
		Err(e) => return terminal(hooks, Status::Completed, Some(Error::Connect(e))),
	};

	// WRITE_BODY: a failed upload is held rather than returned, because the server may have
	// rejected the request with an error response that the exchange below can still capture.
	let mut write_error = None;
	if !request.body().is_empty() {
		let mut reader = request.body().reader();
		let result = Copier::new(
			Pin::new(&mut reader),
			Pin::new(&mut connection),
			request.get_buffer_size(),
		)
		.cancel(cancel.clone())
		.await;
		match result {
			Ok(CopyEnd::Complete(_)) => (),
			Ok(CopyEnd::Cancelled(_)) => return terminal(hooks, Status::Cancelled, None),
			Err(e) => write_error = Some(e.source),
		}
	}

	// AWAIT_RESPONSE.
	if cancel.is_cancelled() {
		return terminal(hooks, Status::Cancelled, None);
	}
	let (mut response, mut primary) = match connection.finish().await {
		Exchange::Response(response) => (response, None),
		Exchange::Failed {
			response: Some(response),
			error,
		} => {
			debug!(error = %error, status = response.status(), "exchange failed with error response");
			let primary = Error::Status {
				code: response.status(),
				reason: response.reason().to_string(),
			};
			(response, Some(primary))
		}
		Exchange::Failed {
			response: None,
			error,
		} => {
			let error = match write_error.take() {
				Some(source) => Error::Io {
					source,
					inner: None,
				},
				None => Error::Connect(error),
			};
			return terminal(hooks, Status::Completed, Some(error));
		}
	};

	// An error status is a protocol-level failure even when the transport did not treat it as
	// one. The body is still read below so the caller can inspect it.
	if primary.is_none() && response.status() >= 400 {
		primary = Some(Error::Status {
			code: response.status(),
			reason: response.reason().to_string(),
		});
	}
	if let Some(source) = write_error.take() {
		if primary.is_none() {
			primary = Some(Error::Io {
				source,
				inner: None,
			});
		} else {
			debug!(error = %source, "request body write failed; error response captured instead");
		}
	}

	// HEADERS_RECEIVED: the caller gets one chance to supply or replace the sink before body
	// bytes flow.
	let info = ResponseInfo::from_transport(&response);
	debug!(status = info.status, "response headers received");
	let mut sink = hooks.sink.take();
	if let Some(hook) = hooks.on_headers.as_mut() {
		if let Some(replacement) = hook(&info) {
			sink = Some(replacement);
		}
	}
	let mut sink = sink.unwrap_or_default();

	// READ_BODY.
	let total = info.content_length;
	let mut chunk_hook = hooks.on_chunk.take();
	let mut notify = |bytes: u64| -> bool {
		match chunk_hook.as_mut() {
			Some(hook) => hook(&Progress {
				bytes,
				total,
				elapsed: started.elapsed(),
			}),
			None => true,
		}
	};
	let result = Copier::new(
		Pin::new(&mut response),
		Pin::new(&mut sink),
		request.get_buffer_size(),
	)
	.cancel(cancel)
	.notify(&mut notify)
	.await;
	let (status, bytes_transferred) = match result {
		Ok(CopyEnd::Complete(n)) => (Status::Completed, n),
		Ok(CopyEnd::Cancelled(n)) => (Status::Cancelled, n),
		Err(e) => {
			primary = Some(Error::Io {
				source: e.source,
				inner: primary.take().map(Box::new),
			});
			(Status::Completed, e.copied)
		}
	};

	// DONE: the connection and response release by drop on the way out.
	Outcome {
		status,
		error: primary,
		response: Some(info),
		sink,
		bytes_transferred,
		elapsed: Duration::ZERO,
	}
}

#[cfg(test)]
mod test {
	use super::{execute, execute_with, Hooks};
	use crate::cancel::CancelHandle;
	use crate::error::Error;
	use crate::outcome::{Sink, Status};
	use crate::request::Request;
	use crate::transport::{ConnectParams, Connection, Exchange, Transport, TransportResponse};
	use futures_executor::block_on;
	use futures_io::{AsyncRead, AsyncWrite};
	use std::pin::Pin;
	use std::sync::{Arc, Mutex};
	use std::task::{Context, Poll};

	/// What the mock transport observed during an execution.
	#[derive(Default)]
	struct Seen {
		params: Option<ConnectParams>,
		written: Vec<u8>,
	}

	/// A scripted transport that replays a canned response.
	struct MockTransport {
		status: u16,
		reason: &'static str,
		headers: Vec<(String, String)>,
		body: &'static [u8],
		announce_length: bool,
		fail_connect: bool,
		fail_exchange: bool,
		seen: Arc<Mutex<Seen>>,
	}

	impl MockTransport {
		fn ok(status: u16, reason: &'static str, body: &'static [u8]) -> Self {
			Self {
				status,
				reason,
				headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
				body,
				announce_length: true,
				fail_connect: false,
				fail_exchange: false,
				seen: Arc::new(Mutex::new(Seen::default())),
			}
		}
	}

	impl Transport for MockTransport {
		type Connection = MockConnection;

		async fn connect(&mut self, params: &ConnectParams) -> std::io::Result<MockConnection> {
			if self.fail_connect {
				return Err(std::io::ErrorKind::ConnectionRefused.into());
			}
			self.seen.lock().unwrap().params = Some(params.clone());
			Ok(MockConnection {
				seen: self.seen.clone(),
				response: (!self.fail_exchange).then(|| MockResponse {
					status: self.status,
					reason: self.reason.to_string(),
					headers: self.headers.clone(),
					body: self.body,
					pos: 0,
					announce_length: self.announce_length,
				}),
			})
		}
	}

	struct MockConnection {
		seen: Arc<Mutex<Seen>>,
		response: Option<MockResponse>,
	}

	impl AsyncWrite for MockConnection {
		fn poll_write(
			self: Pin<&mut Self>,
			_cx: &mut Context<'_>,
			buf: &[u8],
		) -> Poll<std::io::Result<usize>> {
			self.seen.lock().unwrap().written.extend_from_slice(buf);
			Ok(buf.len()).into()
		}

		fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
			Ok(()).into()
		}

		fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
			Ok(()).into()
		}
	}

	impl Connection for MockConnection {
		type Response = MockResponse;

		async fn finish(self) -> Exchange<MockResponse> {
			match self.response {
				Some(response) => Exchange::Response(response),
				None => Exchange::Failed {
					response: None,
					error: std::io::ErrorKind::ConnectionReset.into(),
				},
			}
		}
	}

	struct MockResponse {
		status: u16,
		reason: String,
		headers: Vec<(String, String)>,
		body: &'static [u8],
		pos: usize,
		announce_length: bool,
	}

	impl AsyncRead for MockResponse {
		fn poll_read(
			self: Pin<&mut Self>,
			_cx: &mut Context<'_>,
			buf: &mut [u8],
		) -> Poll<std::io::Result<usize>> {
			let this = self.get_mut();
			let remaining = &this.body[this.pos..];
			let n = std::cmp::min(buf.len(), remaining.len());
			buf[..n].copy_from_slice(&remaining[..n]);
			this.pos += n;
			Ok(n).into()
		}
	}

	impl TransportResponse for MockResponse {
		fn status(&self) -> u16 {
			self.status
		}

		fn reason(&self) -> &str {
			&self.reason
		}

		fn minor_version(&self) -> u8 {
			1
		}

		fn headers(&self) -> &[(String, String)] {
			&self.headers
		}

		fn content_length(&self) -> Option<u64> {
			self.announce_length.then(|| self.body.len() as u64)
		}
	}

	/// Tests a plain GET that succeeds with a body.
	#[test]
	fn test_get_success() {
		let mut transport = MockTransport::ok(200, "OK", b"hello");
		let mut request = Request::new("http://example.com").unwrap();
		let outcome = block_on(execute(&mut transport, &mut request));
		assert_eq!(outcome.status, Status::Completed);
		assert!(outcome.error.is_none());
		assert!(outcome.is_success());
		assert_eq!(outcome.status_code(), Some(200));
		assert_eq!(outcome.body(), Some(&b"hello"[..]));
		assert_eq!(outcome.bytes_transferred, 5);
		let info = outcome.response.unwrap();
		assert_eq!(info.content_type.as_deref(), Some("text/plain"));
	}

	/// Tests that an error status is a protocol-level failure whose body is still read.
	#[test]
	fn test_error_status_body_still_read() {
		let mut transport = MockTransport::ok(404, "Not Found", b"not found");
		let mut request = Request::new("http://example.com").unwrap();
		let outcome = block_on(execute(&mut transport, &mut request));
		assert_eq!(outcome.status, Status::Completed);
		match outcome.error {
			Some(Error::Status { code, ref reason }) => {
				assert_eq!(code, 404);
				assert_eq!(reason, "Not Found");
			}
			ref other => panic!("Expected status error, got {other:?}"),
		}
		assert_eq!(outcome.status_code(), Some(404));
		assert_eq!(outcome.body(), Some(&b"not found"[..]));
	}

	/// Tests that a POST announces its body length and the transport observes every body byte.
	#[test]
	fn test_post_writes_body() {
		let mut transport = MockTransport::ok(200, "OK", b"");
		let seen = transport.seen.clone();
		let mut request = Request::new("http://example.com")
			.unwrap()
			.method("POST")
			.body_str("0123456789");
		let outcome = block_on(execute(&mut transport, &mut request));
		assert!(outcome.is_success());
		let seen = seen.lock().unwrap();
		assert_eq!(seen.params.as_ref().unwrap().content_length, Some(10));
		assert_eq!(seen.written, b"0123456789");
	}

	/// Tests cancellation before any stage runs: no response fields, sink untouched.
	#[test]
	fn test_cancel_before_headers() {
		let mut transport = MockTransport::ok(200, "OK", b"hello");
		let seen = transport.seen.clone();
		let mut request = Request::new("http://example.com").unwrap();
		let handle = CancelHandle::new();
		handle.cancel();
		let outcome = block_on(execute_with(
			&mut transport,
			&mut request,
			Hooks::new().cancel(handle),
		));
		assert_eq!(outcome.status, Status::Cancelled);
		assert!(outcome.error.is_none());
		assert!(outcome.response.is_none());
		assert_eq!(outcome.body(), Some(&b""[..]));
		assert!(seen.lock().unwrap().params.is_none());
	}

	/// Tests cancellation from the chunk hook: headers populated, exactly the notified bytes in
	/// the sink.
	#[test]
	fn test_cancel_during_read() {
		let mut transport = MockTransport::ok(200, "OK", b"abcdef");
		let mut request = Request::new("http://example.com").unwrap().buffer_size(2);
		let hooks = Hooks::new().on_chunk(|progress| progress.bytes < 2);
		let outcome = block_on(execute_with(&mut transport, &mut request, hooks));
		assert_eq!(outcome.status, Status::Cancelled);
		assert!(outcome.response.is_some());
		assert_eq!(outcome.bytes_transferred, 2);
		assert_eq!(outcome.body(), Some(&b"ab"[..]));
	}

	/// Tests a connection-level failure: classified, no response fields.
	#[test]
	fn test_connect_failure() {
		let mut transport = MockTransport::ok(200, "OK", b"");
		transport.fail_connect = true;
		let mut request = Request::new("http://example.com").unwrap();
		let outcome = block_on(execute(&mut transport, &mut request));
		assert_eq!(outcome.status, Status::Completed);
		match outcome.error {
			Some(Error::Connect(ref e)) => {
				assert_eq!(e.kind(), std::io::ErrorKind::ConnectionRefused);
			}
			ref other => panic!("Expected connect error, got {other:?}"),
		}
		assert!(outcome.response.is_none());
	}

	/// Tests an exchange that fails with no response at all.
	#[test]
	fn test_exchange_failure_without_response() {
		let mut transport = MockTransport::ok(200, "OK", b"");
		transport.fail_exchange = true;
		let mut request = Request::new("http://example.com").unwrap();
		let outcome = block_on(execute(&mut transport, &mut request));
		match outcome.error {
			Some(Error::Connect(_)) => (),
			ref other => panic!("Expected connect error, got {other:?}"),
		}
		assert!(outcome.response.is_none());
	}

	/// Tests that an authenticator failure is terminal and never reaches the transport.
	#[test]
	fn test_auth_failure() {
		struct Failing;
		impl crate::auth::Authenticator for Failing {
			fn authenticate(
				&self,
				_request: &mut Request,
			) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
				Err("bad credentials".into())
			}
		}
		let mut transport = MockTransport::ok(200, "OK", b"hello");
		let seen = transport.seen.clone();
		let mut request = Request::new("http://example.com")
			.unwrap()
			.authenticator(Failing);
		let outcome = block_on(execute(&mut transport, &mut request));
		assert_eq!(outcome.status, Status::Completed);
		match outcome.error {
			Some(Error::Auth(_)) => (),
			ref other => panic!("Expected auth error, got {other:?}"),
		}
		assert!(outcome.response.is_none());
		assert!(seen.lock().unwrap().params.is_none());
	}

	/// Tests that an authenticator's header injection reaches the connection parameters.
	#[test]
	fn test_auth_header_applied() {
		let mut transport = MockTransport::ok(200, "OK", b"");
		let seen = transport.seen.clone();
		let mut request = Request::new("http://example.com")
			.unwrap()
			.authenticator(crate::auth::Basic::new("user", "pass"));
		let outcome = block_on(execute(&mut transport, &mut request));
		assert!(outcome.is_success());
		let seen = seen.lock().unwrap();
		let headers = &seen.params.as_ref().unwrap().headers;
		assert!(headers
			.iter()
			.any(|(name, value)| name == "Authorization" && value.starts_with("Basic ")));
	}

	/// Tests that the before, headers-received, and completed hooks each fire once, and that the
	/// headers-received hook can replace the sink.
	#[test]
	fn test_hooks_fire() {
		let mut transport = MockTransport::ok(200, "OK", b"hello");
		let mut request = Request::new("http://example.com").unwrap();
		let mut before = 0_u32;
		let mut headers = 0_u32;
		let mut completed = 0_u32;
		let hooks = Hooks::new()
			.sink(Sink::Memory(b"stale".to_vec()))
			.before(|_| before += 1)
			.on_headers(|info| {
				headers += 1;
				assert_eq!(info.status, 200);
				Some(Sink::memory())
			})
			.on_complete(|outcome| {
				completed += 1;
				assert_eq!(outcome.status, Status::Completed);
			});
		let outcome = block_on(execute_with(&mut transport, &mut request, hooks));
		// The replacement sink received the body; the pre-supplied one was discarded.
		assert_eq!(outcome.body(), Some(&b"hello"[..]));
		assert_eq!(before, 1);
		assert_eq!(headers, 1);
		assert_eq!(completed, 1);
	}

	/// Tests the progress arithmetic against an announced length.
	#[test]
	fn test_progress_percent() {
		let mut transport = MockTransport::ok(200, "OK", b"hello");
		let mut request = Request::new("http://example.com").unwrap().buffer_size(2);
		let mut percents = Vec::new();
		let hooks = Hooks::new().on_chunk(|progress| {
			percents.push(progress.percent());
			true
		});
		let outcome = block_on(execute_with(&mut transport, &mut request, hooks));
		assert!(outcome.is_success());
		assert_eq!(percents, [Some(40), Some(80), Some(100)]);
	}

	/// Tests that progress is indeterminate without an announced length.
	#[test]
	fn test_progress_indeterminate() {
		let mut transport = MockTransport::ok(200, "OK", b"hello");
		transport.announce_length = false;
		let mut request = Request::new("http://example.com").unwrap();
		let mut saw_percent = None;
		let hooks = Hooks::new().on_chunk(|progress| {
			saw_percent = Some(progress.percent());
			true
		});
		let outcome = block_on(execute_with(&mut transport, &mut request, hooks));
		assert!(outcome.is_success());
		assert_eq!(saw_percent, Some(None));
	}
}
