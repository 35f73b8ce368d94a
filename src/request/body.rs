use futures_io::AsyncRead;
use std::io::Result;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A request body assembled from zero or more byte segments.
///
/// Segments are stored as appended and concatenated lazily: no combined buffer is ever built.
/// Each execution drains the body through a fresh [`reader`](Body::reader), so the same request
/// can be executed again without rebuilding the body.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Body {
	segments: Vec<Vec<u8>>,
}

impl Body {
	/// Constructs an empty body.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a segment of raw bytes.
	pub fn append_bytes(&mut self, bytes: impl Into<Vec<u8>>) {
		self.segments.push(bytes.into());
	}

	/// Appends a segment of UTF-8 text.
	pub fn append_str(&mut self, text: impl AsRef<str>) {
		self.segments.push(text.as_ref().as_bytes().to_vec());
	}

	/// Appends a segment of form pairs rendered `name=value` and joined with `&`.
	///
	/// Names and values are used verbatim; any percent-encoding must already have been applied by
	/// the caller.
	pub fn append_pairs<K: AsRef<str>, V: AsRef<str>>(
		&mut self,
		pairs: impl IntoIterator<Item = (K, V)>,
	) {
		let rendered = pairs
			.into_iter()
			.map(|(name, value)| format!("{}={}", name.as_ref(), value.as_ref()))
			.collect::<Vec<_>>()
			.join("&");
		self.segments.push(rendered.into_bytes());
	}

	/// Returns the total length in bytes across all segments.
	#[must_use]
	pub fn len(&self) -> u64 {
		self.segments.iter().map(|segment| segment.len() as u64).sum()
	}

	/// Checks whether the body has no bytes at all.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.segments.iter().all(Vec::is_empty)
	}

	/// Returns a fresh reader that serves the segments in append order.
	#[must_use]
	pub fn reader(&self) -> BodyReader<'_> {
		BodyReader {
			segments: &self.segments,
			index: 0,
			pos: 0,
		}
	}
}

/// A reader over the segments of a [`Body`].
///
/// Reads are always ready; the data is already in memory.
#[derive(Debug)]
pub struct BodyReader<'body> {
	/// The segments being served.
	segments: &'body [Vec<u8>],

	/// The segment currently being served.
	index: usize,

	/// The position within the current segment.
	pos: usize,
}

impl AsyncRead for BodyReader<'_> {
	fn poll_read(
		self: Pin<&mut Self>,
		_cx: &mut Context<'_>,
		buf: &mut [u8],
	) -> Poll<Result<usize>> {
		let this = self.get_mut();
		while let Some(segment) = this.segments.get(this.index) {
			let remaining = &segment[this.pos..];
			if remaining.is_empty() {
				this.index += 1;
				this.pos = 0;
				continue;
			}
			let n = std::cmp::min(buf.len(), remaining.len());
			buf[..n].copy_from_slice(&remaining[..n]);
			this.pos += n;
			return Ok(n).into();
		}
		Ok(0).into()
	}
}
