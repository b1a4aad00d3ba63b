//! Plates — named shared axes (batch dimensions) for factor-graph variables.
//!
//! Purpose
//! -------
//! Provide the lightweight axis handle that variables are indexed over. A
//! plate represents a batch dimension of a model (e.g. "per-galaxy") shared
//! by every variable that ranges over that axis.
//!
//! Key behaviors
//! -------------
//! - [`Plate`] values are compared by **identity**, not by value: two plates
//!   constructed with the same display name are distinct axes, while clones
//!   of one plate are the same axis.
//! - Identity is a process-unique integer id drawn from an atomic counter, so
//!   equality and hashing are cheap and ownership-cycle free.
//!
//! Invariants & assumptions
//! ------------------------
//! - Plates never carry a size. Extents are resolved per call from the data
//!   actually bound to the variables that use the plate (see
//!   [`crate::graph::core::broadcast::plate_sizes`]).
//! - A plate is immutable after creation; cloning shares the id and the
//!   interned display name.
//!
//! Conventions
//! -----------
//! - Display names are for diagnostics only and need not be unique.
//! - This module performs no I/O and no logging.
//!
//! Testing notes
//! -------------
//! - Unit tests cover identity semantics: clones compare equal, same-named
//!   fresh plates compare unequal.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_PLATE_ID: AtomicU64 = AtomicU64::new(0);

/// A named shared axis referenced by one or more variables.
///
/// Plates support no operations beyond identity comparison and naming; sizes
/// are determined per call from the values bound to the variables that use
/// the plate.
#[derive(Debug, Clone, Eq)]
pub struct Plate {
    /// Process-unique identity; equality and hashing operate on this alone.
    id: u64,
    /// Display name for diagnostics; not required to be unique.
    name: Arc<str>,
}

impl Plate {
    /// Create a fresh plate with a new identity.
    ///
    /// Two calls with the same `name` produce distinct plates; share a plate
    /// by cloning it instead.
    pub fn new(name: &str) -> Plate {
        Plate { id: NEXT_PLATE_ID.fetch_add(1, Ordering::Relaxed), name: Arc::from(name) }
    }

    /// The process-unique identity of this plate.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The display name of this plate.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Plate {
    fn eq(&self, other: &Plate) -> bool {
        self.id == other.id
    }
}

impl std::hash::Hash for Plate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Plate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
