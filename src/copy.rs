//! The buffered chunked-copy engine shared by the upload and download phases.
//!
//! A [`Copier`] repeatedly reads up to a buffer's worth of bytes from a source and writes what
//! was read to a destination, until a zero-byte read signals the end of the source. The same
//! engine serves both directions of an execution: the request body draining into the connection,
//! and the response body draining into the destination sink. Only the endpoints and the hook
//! wiring differ between the two uses.
//!
//! Cancellation is observed at chunk boundaries, either through a shared [`CancelHandle`] or by
//! the per-chunk notification callback returning `false`. The callback fires after a chunk has
//! been fully written, so on cancellation the destination holds exactly the bytes the callback
//! was last told about.

use crate::cancel::CancelHandle;
use futures_core::ready;
use futures_io::{AsyncRead, AsyncWrite};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// How a copy reached its end.
#[derive(Debug, Eq, PartialEq)]
pub enum CopyEnd {
	/// The source was exhausted; the value is the number of bytes copied.
	Complete(u64),

	/// Cancellation was observed at a chunk boundary; the value is the number of bytes copied
	/// before the boundary. Those bytes remain in the destination.
	Cancelled(u64),
}

impl CopyEnd {
	/// Returns the number of bytes copied.
	#[must_use]
	pub fn bytes(&self) -> u64 {
		match self {
			Self::Complete(n) | Self::Cancelled(n) => *n,
		}
	}
}

/// A copy failure, carrying how far the copy got.
///
/// Bytes counted by `copied` were fully written to the destination before the failure and remain
/// there.
#[derive(Debug)]
pub struct CopyError {
	/// The underlying read/write/flush error.
	pub source: std::io::Error,

	/// The number of bytes copied before the failure.
	pub copied: u64,
}

impl Display for CopyError {
	fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
		write!(f, "Copy failed after {} bytes: {}", self.copied, self.source)
	}
}

impl std::error::Error for CopyError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.source)
	}
}

/// Where the copy loop resumes when polled again.
#[derive(Debug)]
enum Step {
	/// Check cancellation, then read the next chunk.
	Fill,

	/// Write the unwritten remainder of the buffered chunk.
	Drain,

	/// Flush the destination after a chunk, when per-chunk flushing is on.
	FlushChunk,

	/// Fire the per-chunk notification.
	Notify,

	/// Flush the destination after the source was exhausted.
	FlushEnd,
}

/// A future that copies a source into a destination in buffer-sized chunks.
///
/// Construct with [`new`](Copier::new), optionally wire in a cancellation handle, a per-chunk
/// notification, or per-chunk flushing, then await. The output is [`CopyEnd`] on success or
/// cancellation, or a [`CopyError`] carrying the byte count reached when an I/O error occurred.
pub struct Copier<'a, Source: ?Sized, Dest: ?Sized> {
	source: Pin<&'a mut Source>,
	dest: Pin<&'a mut Dest>,
	buffer: Box<[u8]>,
	filled: usize,
	written: usize,
	copied: u64,
	flush_chunks: bool,
	cancel: CancelHandle,
	notify: Option<&'a mut (dyn FnMut(u64) -> bool + Send)>,
	step: Step,
}

impl<'a, Source: ?Sized, Dest: ?Sized> Copier<'a, Source, Dest> {
	/// Constructs a copy of `source` into `dest` using a fresh buffer of `buffer_size` bytes.
	///
	/// # Panics
	/// This function panics in a debug build if `buffer_size` is zero.
	pub fn new(source: Pin<&'a mut Source>, dest: Pin<&'a mut Dest>, buffer_size: usize) -> Self {
		debug_assert!(buffer_size >= 1, "Buffer size must be at least one byte");
		Self {
			source,
			dest,
			buffer: vec![0_u8; buffer_size].into_boxed_slice(),
			filled: 0,
			written: 0,
			copied: 0,
			flush_chunks: false,
			cancel: CancelHandle::new(),
			notify: None,
			step: Step::Fill,
		}
	}

	/// Wires in a shared cancellation handle, observed before each read.
	#[must_use]
	pub fn cancel(mut self, handle: CancelHandle) -> Self {
		self.cancel = handle;
		self
	}

	/// Wires in a per-chunk notification.
	///
	/// The callback receives the total number of bytes copied so far, after each chunk has been
	/// fully written to the destination. Returning `false` cancels the copy at that boundary.
	#[must_use]
	pub fn notify(mut self, callback: &'a mut (dyn FnMut(u64) -> bool + Send)) -> Self {
		self.notify = Some(callback);
		self
	}

	/// Flushes the destination after every chunk rather than only at the end.
	#[must_use]
	pub fn flush_chunks(mut self) -> Self {
		self.flush_chunks = true;
		self
	}
}

impl<Source: AsyncRead + ?Sized, Dest: AsyncWrite + ?Sized> Future for Copier<'_, Source, Dest> {
	type Output = Result<CopyEnd, CopyError>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		loop {
			match this.step {
				Step::Fill => {
					if this.cancel.is_cancelled() {
						return Ok(CopyEnd::Cancelled(this.copied)).into();
					}
					let result = ready!(this.source.as_mut().poll_read(cx, &mut this.buffer));
					let n = match result {
						Ok(n) => n,
						Err(source) => {
							return Err(CopyError {
								source,
								copied: this.copied,
							})
							.into()
						}
					};
					if n == 0 {
						this.step = Step::FlushEnd;
					} else {
						this.filled = n;
						this.written = 0;
						this.step = Step::Drain;
					}
				}
				Step::Drain => {
					let chunk = &this.buffer[this.written..this.filled];
					let result = ready!(this.dest.as_mut().poll_write(cx, chunk));
					let n = match result {
						Ok(n) => n,
						Err(source) => {
							return Err(CopyError {
								source,
								copied: this.copied,
							})
							.into()
						}
					};
					if n == 0 {
						return Err(CopyError {
							source: std::io::ErrorKind::WriteZero.into(),
							copied: this.copied,
						})
						.into();
					}
					this.written += n;
					if this.written == this.filled {
						this.copied += this.filled as u64;
						this.step = if this.flush_chunks {
							Step::FlushChunk
						} else {
							Step::Notify
						};
					}
				}
				Step::FlushChunk => {
					if let Err(source) = ready!(this.dest.as_mut().poll_flush(cx)) {
						return Err(CopyError {
							source,
							copied: this.copied,
						})
						.into();
					}
					this.step = Step::Notify;
				}
				Step::Notify => {
					if let Some(callback) = this.notify.as_mut() {
						if !callback(this.copied) {
							return Ok(CopyEnd::Cancelled(this.copied)).into();
						}
					}
					this.step = Step::Fill;
				}
				Step::FlushEnd => {
					if let Err(source) = ready!(this.dest.as_mut().poll_flush(cx)) {
						return Err(CopyError {
							source,
							copied: this.copied,
						})
						.into();
					}
					return Ok(CopyEnd::Complete(this.copied)).into();
				}
			}
		}
	}
}

impl<Source: ?Sized, Dest: ?Sized> std::fmt::Debug for Copier<'_, Source, Dest> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Copier")
			.field("buffer_size", &self.buffer.len())
			.field("filled", &self.filled)
			.field("written", &self.written)
			.field("copied", &self.copied)
			.field("flush_chunks", &self.flush_chunks)
			.field("step", &self.step)
			.finish()
	}
}

/// Copies `source` into `dest`, blocking the calling thread until the source is exhausted.
///
/// This is the blocking counterpart of awaiting a [`Copier`] directly. Returns the number of
/// bytes copied.
///
/// # Errors
/// This function returns an error if any read, write, or flush fails; bytes copied before the
/// failure remain in the destination.
#[cfg(feature = "blocking")]
pub fn copy_blocking<Source, Dest>(
	source: Pin<&mut Source>,
	dest: Pin<&mut Dest>,
	buffer_size: usize,
) -> std::io::Result<u64>
where
	Source: AsyncRead + ?Sized,
	Dest: AsyncWrite + ?Sized,
{
	match futures_executor::block_on(Copier::new(source, dest, buffer_size)) {
		Ok(end) => Ok(end.bytes()),
		Err(e) => Err(e.source),
	}
}

#[cfg(test)]
mod test {
	use super::{Copier, CopyEnd};
	use crate::cancel::CancelHandle;
	use futures_executor::block_on;
	use futures_io::AsyncWrite;
	use std::pin::Pin;
	use std::task::{Context, Poll};

	/// Tests a basic copy with a buffer smaller than the source.
	#[test]
	fn test_basic() {
		let mut source: &[u8] = b"abcdefgh";
		let mut dest = Vec::new();
		let end = block_on(Copier::new(Pin::new(&mut source), Pin::new(&mut dest), 3)).unwrap();
		assert_eq!(end, CopyEnd::Complete(8));
		assert_eq!(dest, b"abcdefgh");
	}

	/// Tests that a zero-length source completes with zero bytes copied and does not fire the
	/// chunk notification.
	#[test]
	fn test_zero_length_source() {
		let mut source: &[u8] = b"";
		let mut dest = Vec::new();
		let mut chunks = 0_u32;
		let mut notify = |_: u64| {
			chunks += 1;
			true
		};
		let end = block_on(
			Copier::new(Pin::new(&mut source), Pin::new(&mut dest), 4).notify(&mut notify),
		)
		.unwrap();
		assert_eq!(end, CopyEnd::Complete(0));
		assert_eq!(chunks, 0);
		assert!(dest.is_empty());
	}

	/// Tests that the notification fires once per chunk with the cumulative count.
	#[test]
	fn test_notify_per_chunk() {
		let mut source: &[u8] = b"abcdef";
		let mut dest = Vec::new();
		let mut seen = Vec::new();
		let mut notify = |copied: u64| {
			seen.push(copied);
			true
		};
		let end = block_on(
			Copier::new(Pin::new(&mut source), Pin::new(&mut dest), 2).notify(&mut notify),
		)
		.unwrap();
		assert_eq!(end, CopyEnd::Complete(6));
		assert_eq!(seen, [2, 4, 6]);
	}

	/// Tests that the notification returning false cancels at the chunk boundary, leaving
	/// exactly the notified bytes in the destination.
	#[test]
	fn test_notify_cancels() {
		let mut source: &[u8] = b"abcdef";
		let mut dest = Vec::new();
		let mut notify = |copied: u64| copied < 2;
		let end = block_on(
			Copier::new(Pin::new(&mut source), Pin::new(&mut dest), 2).notify(&mut notify),
		)
		.unwrap();
		assert_eq!(end, CopyEnd::Cancelled(2));
		assert_eq!(dest, b"ab");
	}

	/// Tests that a pre-triggered cancellation handle stops the copy before any read.
	#[test]
	fn test_cancel_handle() {
		let mut source: &[u8] = b"abcdef";
		let mut dest = Vec::new();
		let handle = CancelHandle::new();
		handle.cancel();
		let end = block_on(
			Copier::new(Pin::new(&mut source), Pin::new(&mut dest), 2).cancel(handle),
		)
		.unwrap();
		assert_eq!(end, CopyEnd::Cancelled(0));
		assert!(dest.is_empty());
	}

	/// Tests that a destination accepting one byte at a time is driven to completion.
	#[test]
	fn test_slow_destination() {
		struct Slow {
			v: Vec<u8>,
		}
		impl AsyncWrite for Slow {
			fn poll_write(
				mut self: Pin<&mut Self>,
				_cx: &mut Context<'_>,
				data: &[u8],
			) -> Poll<std::io::Result<usize>> {
				match data.first() {
					None => Ok(0).into(),
					Some(&b) => {
						self.v.push(b);
						Ok(1).into()
					}
				}
			}

			fn poll_flush(
				self: Pin<&mut Self>,
				_cx: &mut Context<'_>,
			) -> Poll<std::io::Result<()>> {
				Ok(()).into()
			}

			fn poll_close(
				self: Pin<&mut Self>,
				_cx: &mut Context<'_>,
			) -> Poll<std::io::Result<()>> {
				panic!("Should not be called");
			}
		}
		let mut source: &[u8] = b"abcdef";
		let mut dest = Slow { v: vec![] };
		let end = block_on(Copier::new(Pin::new(&mut source), Pin::new(&mut dest), 4)).unwrap();
		assert_eq!(end, CopyEnd::Complete(6));
		assert_eq!(dest.v, b"abcdef");
	}

	/// Tests that a write error carries the byte count reached before the failure.
	#[test]
	fn test_write_error_carries_progress() {
		struct Failing {
			accepted: usize,
		}
		impl AsyncWrite for Failing {
			fn poll_write(
				mut self: Pin<&mut Self>,
				_cx: &mut Context<'_>,
				data: &[u8],
			) -> Poll<std::io::Result<usize>> {
				if self.accepted == 0 {
					self.accepted = data.len();
					Ok(data.len()).into()
				} else {
					Err(std::io::ErrorKind::BrokenPipe.into()).into()
				}
			}

			fn poll_flush(
				self: Pin<&mut Self>,
				_cx: &mut Context<'_>,
			) -> Poll<std::io::Result<()>> {
				Ok(()).into()
			}

			fn poll_close(
				self: Pin<&mut Self>,
				_cx: &mut Context<'_>,
			) -> Poll<std::io::Result<()>> {
				panic!("Should not be called");
			}
		}
		let mut source: &[u8] = b"abcdef";
		let mut dest = Failing { accepted: 0 };
		let e = block_on(Copier::new(Pin::new(&mut source), Pin::new(&mut dest), 2)).unwrap_err();
		assert_eq!(e.source.kind(), std::io::ErrorKind::BrokenPipe);
		assert_eq!(e.copied, 2);
	}

	/// Tests the blocking wrapper on a zero-byte source.
	#[cfg(feature = "blocking")]
	#[test]
	fn test_copy_blocking_zero() {
		let mut source: &[u8] = b"";
		let mut dest = Vec::new();
		let copied =
			super::copy_blocking(Pin::new(&mut source), Pin::new(&mut dest), 4).unwrap();
		assert_eq!(copied, 0);
		assert!(dest.is_empty());
	}
}
