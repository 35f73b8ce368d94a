//! Errors that an execution can produce.
//!
//! The pipeline classifies every failure into one of five categories: configuration errors
//! detected before any network activity, authenticator failures, connection-level failures where
//! no response was obtained, protocol-level failures where the server answered with an error
//! status, and I/O failures while a body was being transferred. Asynchronous entry points never
//! propagate errors out of the issuing call; every failure is delivered inside the
//! [`Outcome`](crate::Outcome) so callers have one place to check regardless of how the execution
//! was driven. Cancellation is not an error and is reported as a distinct terminal
//! [`Status`](crate::Status).

use std::fmt::{Display, Formatter};

/// The ways in which a request can be misconfigured.
///
/// These are the only errors ever surfaced outside an [`Outcome`](crate::Outcome); they are
/// detected at build time or at execution start, before any network activity.
#[derive(Debug, Eq, PartialEq)]
pub enum ConfigError {
	/// The base URL is empty.
	EmptyBaseUrl,

	/// The buffer size is zero.
	ZeroBufferSize,
}

impl Display for ConfigError {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		match self {
			Self::EmptyBaseUrl => write!(f, "Base URL is empty"),
			Self::ZeroBufferSize => write!(f, "Buffer size must be at least one byte"),
		}
	}
}

impl std::error::Error for ConfigError {}

/// A classified execution failure.
#[derive(Debug)]
pub enum Error {
	/// The request was misconfigured. No network activity took place.
	Config(ConfigError),

	/// The authenticator refused or failed. No network activity took place.
	Auth(Box<dyn std::error::Error + Send + Sync>),

	/// The connection failed before any response was obtained, for example a refused connection,
	/// a timeout, or a name-resolution failure.
	Connect(std::io::Error),

	/// The request reached the server and the server answered with an error status. The response
	/// fields of the [`Outcome`](crate::Outcome) are populated, and the error body, if any, was
	/// still read into the destination.
	Status {
		/// The HTTP status code.
		code: u16,

		/// The reason phrase sent with the status code.
		reason: String,
	},

	/// I/O failed while a body was being transferred in either direction. Bytes already
	/// transferred remain in the destination.
	Io {
		/// The underlying I/O error.
		source: std::io::Error,

		/// A protocol-level error that was already in flight when the I/O error occurred, for
		/// example an error response whose body failed to fully read.
		inner: Option<Box<Error>>,
	},
}

impl Error {
	/// Reports whether the failure is protocol-level, that is, whether the request reached the
	/// server and got an error status.
	#[must_use]
	pub fn is_status(&self) -> bool {
		matches!(self, Self::Status { .. })
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		match self {
			Self::Config(inner) => write!(f, "Invalid request configuration: {inner}"),
			Self::Auth(inner) => write!(f, "Authentication failed: {inner}"),
			Self::Connect(inner) => write!(f, "Connection failed: {inner}"),
			Self::Status { code, reason } => write!(f, "Server answered {code} {reason}"),
			Self::Io { source, .. } => write!(f, "Body transfer failed: {source}"),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Config(inner) => Some(inner),
			Self::Auth(inner) => Some(inner.as_ref()),
			Self::Connect(inner) | Self::Io { source: inner, .. } => Some(inner),
			Self::Status { .. } => None,
		}
	}
}

impl From<ConfigError> for Error {
	fn from(inner: ConfigError) -> Self {
		Self::Config(inner)
	}
}
