//! Type aliases for commonly used complex types.
//!
//! Gives meaningful names to the nested lock and callback types shared
//! between the pipeline and the scheduler.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inkhatch_core::types::*;
//!
//! // Instead of: Arc<RwLock<BTreeMap<Channel, ChannelResult>>>
//! let published: ThreadSafeRw<BTreeMap<Channel, ChannelResult>> = thread_safe_rw(BTreeMap::new());
//! ```

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

// =============================================================================
// THREAD-SAFE SHARED TYPES (Arc<Mutex<T>> / Arc<RwLock<T>>)
// =============================================================================

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
///
/// Uses `parking_lot::Mutex` for better performance than `std::sync::Mutex`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// A thread-safe reader-writer lock wrapper for read-heavy workloads.
///
/// Multiple readers can access concurrently, but writes require exclusive
/// access. Published pipeline results live behind one of these.
pub type ThreadSafeRw<T> = Arc<RwLock<T>>;

// =============================================================================
// CALLBACK TYPES
// =============================================================================

/// A progress callback receiving (current, total) values.
///
/// Reported once per processed batch of scan sections.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

// =============================================================================
// CONSTRUCTOR HELPERS
// =============================================================================

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

/// Create a new `ThreadSafeRw<T>` from a value.
#[inline]
pub fn thread_safe_rw<T>(value: T) -> ThreadSafeRw<T> {
    Arc::new(RwLock::new(value))
}
