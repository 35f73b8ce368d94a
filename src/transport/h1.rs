//! A reference HTTP/1.1 transport over caller-supplied socket halves.
//!
//! This transport speaks plain HTTP/1.1 over any pair of [`AsyncRead`]/[`AsyncWrite`] halves the
//! application provides, which keeps it agnostic to the choice of executor and socket library.
//! One transport instance materializes exactly one connection; proxy, credentials, and timeout
//! parameters are ignored (they exist for transports backed by a platform HTTP client that
//! honors them natively).
//!
//! Protocol-level error statuses are returned as ordinary responses; the execution pipeline
//! classifies them. [`Exchange::Failed`] is produced only for connection-level failures, and
//! never carries a response.

use crate::transport::{ConnectParams, Connection, Exchange, Transport, TransportResponse};
use crate::util;
use crate::util::io::{AsyncReadExt as _, AsyncWriteExt as _};
use futures_core::ready;
use futures_io::{AsyncRead, AsyncWrite};
use std::io::{Error, ErrorKind, Result};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, trace};

/// The most bytes of status line plus headers a response may carry.
const MAX_HEAD: usize = 64 * 1024;

/// The most headers a response may carry.
const MAX_HEADERS: usize = 64;

/// Builds an error of kind [`InvalidData`](ErrorKind::InvalidData).
fn invalid_data(message: &'static str) -> Error {
	Error::new(ErrorKind::InvalidData, message)
}

/// A transport speaking HTTP/1.1 over one pair of socket halves.
///
/// The read half should generally provide buffering only if the underlying socket benefits from
/// it; the transport keeps its own read-ahead for response framing.
#[derive(Debug)]
pub struct H1Transport<R, W> {
	socket: Option<(R, W)>,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> H1Transport<R, W> {
	/// Constructs a transport around connected socket halves.
	pub fn new(read: R, write: W) -> Self {
		Self {
			socket: Some((read, write)),
		}
	}
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Transport for H1Transport<R, W> {
	type Connection = H1Connection<R, W>;

	async fn connect(&mut self, params: &ConnectParams) -> Result<H1Connection<R, W>> {
		let (read, mut write) = self.socket.take().ok_or_else(|| {
			Error::new(
				ErrorKind::NotConnected,
				"Transport already produced its connection",
			)
		})?;
		let head = serialize_head(params);
		trace!(bytes = head.len(), "sending request head");
		Pin::new(&mut write).write_all(&head).await?;
		Ok(H1Connection {
			read,
			write,
			remaining: params.content_length.unwrap_or(0),
			head_request: params.method.eq_ignore_ascii_case("HEAD"),
		})
	}
}

/// Serializes the request line, headers, and cookies.
///
/// The `Host` header always comes first, taken from the dedicated property when set and derived
/// from the URL otherwise. The computed content length wins over any explicitly-set
/// `Content-Length` header value. Cookies fold into a single `Cookie` header.
fn serialize_head(params: &ConnectParams) -> Vec<u8> {
	debug_assert!(
		util::is_token(&params.method),
		"Request method {} is not a token",
		params.method
	);
	let (derived_host, target) = util::split_url(&params.url);
	let mut head = Vec::new();
	head.extend_from_slice(params.method.as_bytes());
	head.push(b' ');
	head.extend_from_slice(target.as_bytes());
	head.extend_from_slice(b" HTTP/1.1\r\n");
	let host = params.special.host.as_deref().unwrap_or(derived_host);
	push_header(&mut head, "host", host);
	let specials = [
		("accept", params.special.accept.as_deref()),
		("connection", params.special.connection.as_deref()),
		("content-type", params.special.content_type.as_deref()),
		("expect", params.special.expect.as_deref()),
		("date", params.special.date.as_deref()),
		("if-modified-since", params.special.if_modified_since.as_deref()),
		("range", params.special.range.as_deref()),
		("referer", params.special.referer.as_deref()),
		("transfer-encoding", params.special.transfer_encoding.as_deref()),
		("user-agent", params.special.user_agent.as_deref()),
	];
	for (name, value) in specials {
		if let Some(value) = value {
			push_header(&mut head, name, value);
		}
	}
	if let Some(length) = params.content_length {
		push_header(&mut head, "content-length", &length.to_string());
	} else if let Some(value) = params.special.content_length.as_deref() {
		push_header(&mut head, "content-length", value);
	}
	for (name, value) in &params.headers {
		push_header(&mut head, name, value);
	}
	if !params.cookies.is_empty() {
		let cookie = params
			.cookies
			.iter()
			.map(|(name, value)| format!("{name}={value}"))
			.collect::<Vec<_>>()
			.join("; ");
		push_header(&mut head, "cookie", &cookie);
	}
	head.extend_from_slice(b"\r\n");
	head
}

/// Appends one serialized header line.
fn push_header(head: &mut Vec<u8>, name: &str, value: &str) {
	debug_assert!(util::is_token(name), "Request header {name} is not a token");
	debug_assert!(
		util::is_field_value(value),
		"Request header value {value:?} is not a valid field value"
	);
	head.extend_from_slice(name.as_bytes());
	head.extend_from_slice(b": ");
	head.extend_from_slice(value.as_bytes());
	head.extend_from_slice(b"\r\n");
}

/// A live HTTP/1.1 connection in the request-writing phase.
///
/// The `AsyncWrite` implementation writes request body bytes straight to the socket's write
/// half, tracking how much of the announced content length remains.
#[derive(Debug)]
pub struct H1Connection<R, W> {
	read: R,
	write: W,
	remaining: u64,
	head_request: bool,
}

impl<R: Unpin, W: AsyncWrite + Unpin> AsyncWrite for H1Connection<R, W> {
	fn poll_write(
		mut self: Pin<&mut Self>,
		cx: &mut Context<'_>,
		buf: &[u8],
	) -> Poll<Result<usize>> {
		// Sanity check that the body doesn't overflow.
		debug_assert!(
			buf.len() as u64 <= self.remaining,
			"Attempted to write {} bytes, but Content-Length indicates only {} should be left to send",
			buf.len(),
			self.remaining
		);
		let this = self.as_mut().get_mut();
		let bytes_written = ready!(Pin::new(&mut this.write).poll_write(cx, buf))?;
		this.remaining -= bytes_written as u64;
		Ok(bytes_written).into()
	}

	fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
		let this = self.as_mut().get_mut();
		Pin::new(&mut this.write).poll_flush(cx)
	}

	fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
		let this = self.as_mut().get_mut();
		Pin::new(&mut this.write).poll_close(cx)
	}
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Connection for H1Connection<R, W> {
	type Response = H1Response<R>;

	async fn finish(self) -> Exchange<H1Response<R>> {
		// Sanity check that the full request body has been sent.
		debug_assert!(
			self.remaining == 0,
			"Request body is {} bytes shorter than its Content-Length",
			self.remaining
		);
		let Self {
			read,
			mut write,
			head_request,
			..
		} = self;
		let result = async {
			// A failed flush is not immediately fatal: the server may already have sent an error
			// response that explains why the upload went wrong, and that response should win.
			let flushed = Pin::new(&mut write).flush().await;
			match receive_head(read, head_request).await {
				Ok(response) => Ok(response),
				Err(error) => Err(flushed.err().unwrap_or(error)),
			}
		}
		.await;
		match result {
			Ok(response) => {
				debug!(status = response.status, "response head received");
				Exchange::Response(response)
			}
			Err(error) => Exchange::Failed {
				response: None,
				error,
			},
		}
	}
}

/// What one parse attempt over the accumulated head bytes produced.
enum Parsed {
	/// More bytes are needed.
	Partial,

	/// A 1xx informational head spanning the given byte count; discard it and keep reading.
	Informational(usize),

	/// The real head is complete.
	Complete {
		consumed: usize,
		status: u16,
		reason: String,
		minor_version: u8,
		headers: Vec<(String, String)>,
	},
}

/// Attempts to parse a response head from the bytes accumulated so far.
fn try_parse(buffer: &[u8]) -> Result<Parsed> {
	let mut storage = [httparse::EMPTY_HEADER; MAX_HEADERS];
	let mut parsed = httparse::Response::new(&mut storage);
	match parsed.parse(buffer) {
		Ok(httparse::Status::Partial) => Ok(Parsed::Partial),
		Ok(httparse::Status::Complete(consumed)) => {
			let status = parsed.code.unwrap();
			if status == 101 {
				// The server decided to switch protocols. This is not supported.
				return Err(invalid_data("Unsupported 101 Switching Protocols received"));
			}
			if (100..=199).contains(&status) {
				return Ok(Parsed::Informational(consumed));
			}
			let headers = parsed
				.headers
				.iter()
				.map(|header| {
					(
						header.name.to_string(),
						String::from_utf8_lossy(header.value).into_owned(),
					)
				})
				.collect();
			Ok(Parsed::Complete {
				consumed,
				status,
				reason: parsed.reason.unwrap_or("").to_string(),
				minor_version: parsed.version.unwrap_or(1),
				headers,
			})
		}
		Err(_) => Err(invalid_data("Malformed response head")),
	}
}

/// Reads and parses the response head, skipping 1xx informational responses, and decides the
/// body framing.
///
/// Bytes read past the end of the head are retained in the returned response's read-ahead buffer
/// and served before the socket.
async fn receive_head<R: AsyncRead + Unpin>(
	mut socket: R,
	head_request: bool,
) -> Result<H1Response<R>> {
	let mut buffer: Vec<u8> = Vec::new();
	let mut chunk = [0_u8; 1024];
	loop {
		match try_parse(&buffer)? {
			Parsed::Partial => (),
			Parsed::Informational(consumed) => {
				let _ = buffer.drain(..consumed);
				continue;
			}
			Parsed::Complete {
				consumed,
				status,
				reason,
				minor_version,
				headers,
			} => {
				let leftover = buffer.split_off(consumed);
				let content_length = parse_content_length(&headers)?;
				let chunked = is_chunked(&headers);
				if content_length.is_some() && chunked {
					return Err(invalid_data(
						"Content-Length and Transfer-Encoding both received",
					));
				}
				let framing = if head_request || status == 204 || status == 304 {
					Framing::None
				} else if chunked {
					Framing::Chunked(ChunkPhase::Size(String::new()))
				} else if let Some(length) = content_length {
					Framing::Fixed(length)
				} else {
					Framing::Eof
				};
				return Ok(H1Response {
					socket,
					buffer: leftover,
					pos: 0,
					status,
					reason,
					minor_version,
					headers,
					content_length,
					framing,
				});
			}
		}
		if buffer.len() > MAX_HEAD {
			return Err(invalid_data("Response head too long"));
		}
		let n = Pin::new(&mut socket).read(&mut chunk).await?;
		if n == 0 {
			return Err(ErrorKind::UnexpectedEof.into());
		}
		buffer.extend_from_slice(&chunk[..n]);
	}
}

/// Extracts the `Content-Length` header, if any.
fn parse_content_length(headers: &[(String, String)]) -> Result<Option<u64>> {
	let mut content_length = None;
	for (name, value) in headers {
		if name.eq_ignore_ascii_case("content-length") {
			if content_length.is_some() {
				return Err(invalid_data("Multiple Content-Length headers received"));
			}
			content_length = Some(
				value
					.trim()
					.parse::<u64>()
					.map_err(|_| invalid_data("Invalid Content-Length header received"))?,
			);
		}
	}
	Ok(content_length)
}

/// Checks whether the `Transfer-Encoding` header names the chunked encoding.
fn is_chunked(headers: &[(String, String)]) -> bool {
	headers
		.iter()
		.filter(|(name, _)| name.eq_ignore_ascii_case("transfer-encoding"))
		.any(|(_, value)| {
			value
				.split(',')
				.any(|token| token.trim().eq_ignore_ascii_case("chunked"))
		})
}

/// How the response body is delimited.
#[derive(Debug)]
enum Framing {
	/// No body at all (HEAD request, or a 204/304 status).
	None,

	/// A fixed number of body bytes remain.
	Fixed(u64),

	/// Chunked transfer encoding, with the decoder in the given phase.
	Chunked(ChunkPhase),

	/// The body runs until the server closes its socket.
	Eof,
}

/// Where the chunked-transfer decoder resumes.
#[derive(Debug)]
enum ChunkPhase {
	/// Accumulating the chunk size line, without its trailing newline.
	Size(String),

	/// Serving the given number of remaining chunk data bytes.
	Data(u64),

	/// Consuming the newline that follows a chunk's data.
	DataEnd,

	/// Consuming trailer lines after the final zero-size chunk.
	Trailer(String),

	/// The final blank line has been consumed; the body is finished.
	Done,
}

/// A received HTTP/1.1 response: parsed head plus the body read channel.
#[derive(Debug)]
pub struct H1Response<R> {
	socket: R,
	buffer: Vec<u8>,
	pos: usize,
	status: u16,
	reason: String,
	minor_version: u8,
	headers: Vec<(String, String)>,
	content_length: Option<u64>,
	framing: Framing,
}

/// Refills the read-ahead buffer from the socket when it is empty.
///
/// Returns an error on end-of-file; callers use this only where the body framing promises more
/// bytes.
fn poll_fill<R: AsyncRead + Unpin>(
	socket: &mut R,
	buffer: &mut Vec<u8>,
	pos: &mut usize,
	cx: &mut Context<'_>,
) -> Poll<Result<()>> {
	if *pos >= buffer.len() {
		buffer.clear();
		*pos = 0;
		let mut chunk = [0_u8; 1024];
		let n = ready!(Pin::new(socket).poll_read(cx, &mut chunk))?;
		if n == 0 {
			return Err(ErrorKind::UnexpectedEof.into()).into();
		}
		buffer.extend_from_slice(&chunk[..n]);
	}
	Ok(()).into()
}

impl<R: AsyncRead + Unpin> AsyncRead for H1Response<R> {
	fn poll_read(
		self: Pin<&mut Self>,
		cx: &mut Context<'_>,
		buf: &mut [u8],
	) -> Poll<Result<usize>> {
		if buf.is_empty() {
			return Ok(0).into();
		}
		let this = self.get_mut();
		loop {
			match &mut this.framing {
				Framing::None => return Ok(0).into(),
				Framing::Fixed(remaining) => {
					if *remaining == 0 {
						return Ok(0).into();
					}
					let buffered = this.buffer.len() - this.pos;
					let n = if buffered > 0 {
						let n = std::cmp::min(
							std::cmp::min(buf.len() as u64, *remaining),
							buffered as u64,
						) as usize;
						buf[..n].copy_from_slice(&this.buffer[this.pos..this.pos + n]);
						this.pos += n;
						n
					} else {
						let limit = std::cmp::min(buf.len() as u64, *remaining) as usize;
						let n = ready!(
							Pin::new(&mut this.socket).poll_read(cx, &mut buf[..limit])
						)?;
						if n == 0 {
							return Err(ErrorKind::UnexpectedEof.into()).into();
						}
						n
					};
					*remaining -= n as u64;
					return Ok(n).into();
				}
				Framing::Eof => {
					let buffered = this.buffer.len() - this.pos;
					if buffered > 0 {
						let n = std::cmp::min(buf.len(), buffered);
						buf[..n].copy_from_slice(&this.buffer[this.pos..this.pos + n]);
						this.pos += n;
						return Ok(n).into();
					}
					return Pin::new(&mut this.socket).poll_read(cx, buf);
				}
				Framing::Chunked(phase) => match phase {
					ChunkPhase::Size(line) => loop {
						ready!(poll_fill(&mut this.socket, &mut this.buffer, &mut this.pos, cx))?;
						let b = this.buffer[this.pos];
						this.pos += 1;
						if b == b'\n' {
							let text = line.trim_end_matches('\r');
							let size_text = text.split(';').next().unwrap_or("").trim();
							let size = u64::from_str_radix(size_text, 16)
								.map_err(|_| invalid_data("Chunk size is not a hex number"))?;
							*phase = if size == 0 {
								ChunkPhase::Trailer(String::new())
							} else {
								ChunkPhase::Data(size)
							};
							break;
						}
						if !b.is_ascii() || line.len() > 1024 {
							return Err(invalid_data("Invalid chunk header received")).into();
						}
						line.push(char::from(b));
					},
					ChunkPhase::Data(remaining) => {
						let buffered = this.buffer.len() - this.pos;
						let n = if buffered > 0 {
							let n = std::cmp::min(
								std::cmp::min(buf.len() as u64, *remaining),
								buffered as u64,
							) as usize;
							buf[..n].copy_from_slice(&this.buffer[this.pos..this.pos + n]);
							this.pos += n;
							n
						} else {
							let limit = std::cmp::min(buf.len() as u64, *remaining) as usize;
							let n = ready!(
								Pin::new(&mut this.socket).poll_read(cx, &mut buf[..limit])
							)?;
							if n == 0 {
								return Err(ErrorKind::UnexpectedEof.into()).into();
							}
							n
						};
						*remaining -= n as u64;
						if *remaining == 0 {
							*phase = ChunkPhase::DataEnd;
						}
						return Ok(n).into();
					}
					ChunkPhase::DataEnd => loop {
						ready!(poll_fill(&mut this.socket, &mut this.buffer, &mut this.pos, cx))?;
						let b = this.buffer[this.pos];
						this.pos += 1;
						if b == b'\n' {
							*phase = ChunkPhase::Size(String::new());
							break;
						}
						if b != b'\r' {
							return Err(invalid_data(
								"Chunk framing contains incorrect newlines",
							))
							.into();
						}
					},
					ChunkPhase::Trailer(line) => loop {
						ready!(poll_fill(&mut this.socket, &mut this.buffer, &mut this.pos, cx))?;
						let b = this.buffer[this.pos];
						this.pos += 1;
						if b == b'\n' {
							if line.trim_end_matches('\r').is_empty() {
								*phase = ChunkPhase::Done;
								return Ok(0).into();
							}
							line.clear();
						} else {
							if !b.is_ascii() || line.len() > 8192 {
								return Err(invalid_data("Invalid chunk trailer received"))
									.into();
							}
							line.push(char::from(b));
						}
					},
					ChunkPhase::Done => return Ok(0).into(),
				},
			}
		}
	}
}

impl<R: AsyncRead + Unpin> TransportResponse for H1Response<R> {
	fn status(&self) -> u16 {
		self.status
	}

	fn reason(&self) -> &str {
		&self.reason
	}

	fn minor_version(&self) -> u8 {
		self.minor_version
	}

	fn headers(&self) -> &[(String, String)] {
		&self.headers
	}

	fn content_length(&self) -> Option<u64> {
		self.content_length
	}
}
