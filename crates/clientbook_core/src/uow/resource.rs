//! Request-scoped releasable resources.
//!
//! # Responsibility
//! - Define the capability surface teardown uses to release external
//!   resources.
//! - Provide the default in-memory scratch resource.
//!
//! # Invariants
//! - Callers consult the capability flags before picking a release path.
//! - Release is one-shot; the owning unit of work drops the handle after
//!   releasing it.

use async_trait::async_trait;
use std::io;

/// Releasable resource whose lifetime is bounded by one unit of work.
///
/// Models external handles (spool files, sockets) that need explicit
/// teardown on both synchronous and asynchronous exit paths. The owner
/// checks the capability flags at teardown time and never calls an
/// unsupported path.
#[async_trait]
pub trait ScopedResource: Send {
    /// Short stable name used in teardown log events.
    fn name(&self) -> &'static str;

    /// Whether `release` may be called.
    fn supports_sync_release(&self) -> bool;

    /// Whether `release_async` may be called.
    fn supports_async_release(&self) -> bool;

    /// Releases the resource synchronously.
    fn release(&mut self) -> io::Result<()>;

    /// Releases the resource asynchronously.
    async fn release_async(&mut self) -> io::Result<()>;
}

/// In-memory scratch region, the default resource in both slots.
///
/// Supports both release paths; release drops the backing allocation.
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    data: Vec<u8>,
    released: bool,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            released: false,
        }
    }

    /// Appends bytes to the scratch region.
    ///
    /// # Errors
    /// Fails once the buffer was released.
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.released {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scratch buffer already released",
            ));
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

#[async_trait]
impl ScopedResource for ScratchBuffer {
    fn name(&self) -> &'static str {
        "scratch_buffer"
    }

    fn supports_sync_release(&self) -> bool {
        true
    }

    fn supports_async_release(&self) -> bool {
        true
    }

    fn release(&mut self) -> io::Result<()> {
        self.data = Vec::new();
        self.released = true;
        Ok(())
    }

    async fn release_async(&mut self) -> io::Result<()> {
        self.release()
    }
}
