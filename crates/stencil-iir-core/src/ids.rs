//! Identifier types and the shared identifier generator.
//!
//! Every compilation owns one [`IdGenerator`], usually through
//! [`IirContext`](crate::context::IirContext). It hands out access IDs,
//! Do-Method IDs and tree IDs from atomic counters, so identifiers stay
//! unique even when stencils are compiled on several threads that share the
//! same generator through an `Arc`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};

/// Handle of a named memory location (field, variable, temporary) or of a
/// single literal occurrence.
///
/// Literals always carry strictly negative IDs; everything else is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessId(pub i32);

impl AccessId {
    /// Returns true if this ID follows the literal sign convention.
    pub fn is_literal(self) -> bool {
        self.0 < 0
    }
}

impl std::fmt::Display for AccessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique identifier of a Do-Method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DoMethodId(pub u64);

impl std::fmt::Display for DoMethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one statement tree. Cursors remember the tree they were
/// created for so that primitives can reject foreign cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(pub u32);

impl std::fmt::Display for TreeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Monotonic source of access, Do-Method and tree identifiers.
#[derive(Debug)]
pub struct IdGenerator {
    next_access: AtomicI32,
    next_do_method: AtomicU64,
    next_tree: AtomicU32,
}

impl IdGenerator {
    pub fn new() -> Self {
        IdGenerator {
            next_access: AtomicI32::new(1),
            next_do_method: AtomicU64::new(0),
            next_tree: AtomicU32::new(0),
        }
    }

    /// Fresh positive access ID.
    pub fn next_access_id(&self) -> AccessId {
        AccessId(self.next_access.fetch_add(1, Ordering::Relaxed))
    }

    /// Fresh strictly negative access ID, used for literal occurrences.
    pub fn next_literal_id(&self) -> AccessId {
        AccessId(-self.next_access.fetch_add(1, Ordering::Relaxed))
    }

    pub fn next_do_method_id(&self) -> DoMethodId {
        DoMethodId(self.next_do_method.fetch_add(1, Ordering::Relaxed))
    }

    pub fn next_tree_id(&self) -> TreeId {
        TreeId(self.next_tree.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
