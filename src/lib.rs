#![forbid(unsafe_code)]
#![warn(future_incompatible, nonstandard_style, rust_2018_idioms, unused)]
#![warn(
	missing_debug_implementations,
	missing_docs,
	trivial_casts,
	trivial_numeric_casts,
	unused_import_braces,
	unused_qualifications,
	unused_results
)]
#![warn(clippy::pedantic, clippy::cargo)]
// Disabled because we frequently mix u64 and usize, where the former is used for message body
// lengths and the latter for in-memory buffer sizes.
#![allow(clippy::cast_possible_truncation)]

//! Agnostic Asynchronous Request Executor
//!
//! This crate is an HTTP request-building and execution library: a fluent API for describing a
//! request (method, headers, query strings, cookies, body segments, proxy, credentials,
//! authentication) and a pipeline that executes it over a pluggable transport, either
//! asynchronously or, behind the default `blocking` feature, on the calling thread.
//!
//! The crate is not tied to any specific asynchronous executor and does not spawn threads. The
//! transport boundary is a small set of traits ([`Transport`], [`Connection`],
//! [`TransportResponse`]) expressed over the `futures-io` byte-channel traits; a reference
//! HTTP/1.1 implementation, [`H1Transport`], runs over any connected socket halves the
//! application provides, and anything backed by a platform HTTP client can be substituted
//! without the pipeline noticing.
//!
//! An execution drives a fixed stage sequence (authenticate, connect, write the request body,
//! complete the exchange, snapshot the response headers, drain the response body into a
//! destination [`Sink`]) with cooperative mid-flight cancellation ([`CancelHandle`]), optional
//! progress and lifecycle notifications ([`Hooks`]), and classified failures delivered inside
//! the [`Outcome`] rather than thrown.
//!
//! # Example
//! ```no_run
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!		.enable_io()
//!		.build()
//!		.unwrap();
//! runtime.block_on(async {
//!		use async_compat::CompatExt as _;
//!
//!		// Connect to the server and hand the socket halves to the built-in transport.
//!		let socket = tokio::net::TcpStream::connect("example.com:80").await.unwrap();
//!		let (read, write) = socket.into_split();
//!		let mut transport = aare::H1Transport::new(read.compat(), write.compat());
//!
//!		// Describe the request.
//!		let mut request = aare::Request::new("http://example.com")
//!			.unwrap()
//!			.resource_path("/")
//!			.header("user-agent", "aare");
//!
//!		// Execute it and inspect the outcome.
//!		let outcome = aare::execute(&mut transport, &mut request).await;
//!		assert!(outcome.is_success());
//!		println!("{} bytes received", outcome.bytes_transferred);
//! })
//! ```

mod auth;
mod cancel;
mod copy;
mod error;
mod execute;
mod outcome;
mod request;
mod response;
mod transport;
mod util;

pub use auth::{Authenticator, Basic};
pub use cancel::CancelHandle;
#[cfg(feature = "blocking")]
pub use copy::copy_blocking;
pub use copy::{Copier, CopyEnd, CopyError};
pub use error::{ConfigError, Error};
#[cfg(feature = "blocking")]
pub use execute::{execute_blocking, execute_blocking_with};
pub use execute::{execute, execute_with, Hooks, Progress};
pub use outcome::{Outcome, Sink, Status};
pub use request::body::{Body, BodyReader};
pub use request::headers::{is_special, Headers, SPECIAL_HEADERS};
pub use request::{Credentials, Proxy, Request, DEFAULT_BUFFER_SIZE};
pub use response::ResponseInfo;
pub use transport::h1::{H1Connection, H1Response, H1Transport};
pub use transport::{
	ConnectParams, Connection, Exchange, SpecialHeaders, Transport, TransportResponse,
};
