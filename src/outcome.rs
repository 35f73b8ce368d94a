use crate::error::Error;
use crate::response::ResponseInfo;
use futures_io::AsyncWrite;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// The terminal status of an execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
	/// The execution has not run. An [`Outcome`] returned from an execution never carries this;
	/// it exists for outcomes observed before execution begins.
	NotStarted,

	/// The execution ran to a terminal state, successfully or not; check
	/// [`error`](Outcome::error) to tell which.
	Completed,

	/// The execution was cancelled. Cancellation is not an error; whatever partial bytes were
	/// copied before the cancellation remain in the destination.
	Cancelled,
}

/// The destination that receives response body bytes.
///
/// The default is a fresh in-memory buffer whose bytes the finished [`Outcome`] exposes. A
/// caller can instead supply any writeable, either up front or from the headers-received hook
/// once the response metadata is known.
pub enum Sink {
	/// An in-memory buffer.
	Memory(Vec<u8>),

	/// A caller-supplied writeable.
	Stream(Box<dyn AsyncWrite + Unpin + Send>),
}

impl Sink {
	/// Constructs a fresh in-memory sink.
	#[must_use]
	pub fn memory() -> Self {
		Self::Memory(Vec::new())
	}

	/// Constructs a sink around a caller-supplied writeable.
	pub fn stream(writer: impl AsyncWrite + Unpin + Send + 'static) -> Self {
		Self::Stream(Box::new(writer))
	}

	/// Returns the received bytes, if this is an in-memory sink.
	#[must_use]
	pub fn bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Memory(bytes) => Some(bytes),
			Self::Stream(_) => None,
		}
	}

	/// Consumes the sink and returns the received bytes, if it was in-memory.
	#[must_use]
	pub fn into_bytes(self) -> Option<Vec<u8>> {
		match self {
			Self::Memory(bytes) => Some(bytes),
			Self::Stream(_) => None,
		}
	}
}

impl Default for Sink {
	fn default() -> Self {
		Self::memory()
	}
}

impl AsyncWrite for Sink {
	fn poll_write(
		mut self: Pin<&mut Self>,
		cx: &mut Context<'_>,
		buf: &[u8],
	) -> Poll<std::io::Result<usize>> {
		match &mut *self {
			Self::Memory(bytes) => {
				bytes.extend_from_slice(buf);
				Ok(buf.len()).into()
			}
			Self::Stream(writer) => Pin::new(writer.as_mut()).poll_write(cx, buf),
		}
	}

	fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
		match &mut *self {
			Self::Memory(_) => Ok(()).into(),
			Self::Stream(writer) => Pin::new(writer.as_mut()).poll_flush(cx),
		}
	}

	fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
		match &mut *self {
			Self::Memory(_) => Ok(()).into(),
			Self::Stream(writer) => Pin::new(writer.as_mut()).poll_close(cx),
		}
	}
}

impl std::fmt::Debug for Sink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Memory(bytes) => f.debug_tuple("Memory").field(&bytes.len()).finish(),
			Self::Stream(_) => f.debug_tuple("Stream").finish(),
		}
	}
}

/// The result of one execution.
///
/// Created once per execution, populated incrementally as stages complete, and handed to the
/// caller only at a terminal state. Both the synchronous and asynchronous entry points deliver
/// failures here rather than throwing, so there is one place to check regardless of how the
/// execution was driven.
#[derive(Debug)]
pub struct Outcome {
	/// The terminal status.
	pub status: Status,

	/// The classified failure, if any.
	///
	/// A protocol-level failure leaves [`response`](Outcome::response) populated; check both
	/// fields to distinguish "the server answered with an error" from "the request never
	/// completed".
	pub error: Option<Error>,

	/// The response metadata, populated once headers were received.
	pub response: Option<ResponseInfo>,

	/// The destination that received the body bytes.
	pub sink: Sink,

	/// The number of body bytes written to the destination.
	pub bytes_transferred: u64,

	/// How long the execution ran.
	pub elapsed: Duration,
}

impl Outcome {
	/// Constructs an outcome for an execution that has not started.
	#[must_use]
	pub fn new() -> Self {
		Self {
			status: Status::NotStarted,
			error: None,
			response: None,
			sink: Sink::memory(),
			bytes_transferred: 0,
			elapsed: Duration::ZERO,
		}
	}

	/// Checks whether the execution completed with no failure.
	#[must_use]
	pub fn is_success(&self) -> bool {
		self.status == Status::Completed && self.error.is_none()
	}

	/// Returns the HTTP status code, if a response was obtained.
	#[must_use]
	pub fn status_code(&self) -> Option<u16> {
		self.response.as_ref().map(|response| response.status)
	}

	/// Returns the received body bytes, if the destination was an in-memory sink.
	#[must_use]
	pub fn body(&self) -> Option<&[u8]> {
		self.sink.bytes()
	}
}

impl Default for Outcome {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod test {
	use super::{Outcome, Sink, Status};

	/// Tests the initial state of a fresh outcome.
	#[test]
	fn test_initial_state() {
		let outcome = Outcome::new();
		assert_eq!(outcome.status, Status::NotStarted);
		assert!(outcome.error.is_none());
		assert!(outcome.response.is_none());
		assert_eq!(outcome.body(), Some(&b""[..]));
		assert!(!outcome.is_success());
	}

	/// Tests that a memory sink exposes its bytes and a stream sink does not.
	#[test]
	fn test_sink_bytes() {
		let sink = Sink::Memory(b"hello".to_vec());
		assert_eq!(sink.bytes(), Some(&b"hello"[..]));
		assert_eq!(sink.into_bytes(), Some(b"hello".to_vec()));
		let sink = Sink::stream(Vec::new());
		assert_eq!(sink.bytes(), None);
	}
}
