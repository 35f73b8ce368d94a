use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A handle that requests cancellation of an in-flight execution.
///
/// Cloning a handle yields another view of the same flag, so one clone can be kept by the caller
/// while another travels into the execution. Cancellation is cooperative: the pipeline observes
/// the flag at stage entry points and at chunk boundaries inside an active copy, so a single
/// in-flight read or write on the transport is never forcibly aborted. Bytes already delivered to
/// the destination stay in place.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
	flag: Arc<AtomicBool>,
}

impl CancelHandle {
	/// Constructs a new, un-triggered handle.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests cancellation.
	///
	/// This may be called from any thread, and more than once; calls after the first have no
	/// further effect.
	pub fn cancel(&self) {
		self.flag.store(true, Ordering::Relaxed);
	}

	/// Reports whether cancellation has been requested.
	#[must_use]
	pub fn is_cancelled(&self) -> bool {
		self.flag.load(Ordering::Relaxed)
	}
}
