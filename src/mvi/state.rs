//! Base trait for store state in MVI architecture.

use std::fmt::Debug;

/// Marker trait for values a [`Store`](crate::store::Store) can own.
///
/// States should be:
/// - Immutable (Clone to create new states)
/// - Comparable (PartialEq for detecting changes)
/// - Printable (Debug for trace output)
pub trait StoreState: Clone + PartialEq + Debug + 'static {}
