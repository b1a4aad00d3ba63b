//! Variables — named, plate-indexed quantities exchanged between factors.
//!
//! Purpose
//! -------
//! Provide the immutable value object used as the unit of data exchange in a
//! factor graph. A variable pairs a name (the dictionary key that matches
//! factor inputs and outputs) with the ordered sequence of plates it ranges
//! over.
//!
//! Key behaviors
//! -------------
//! - Equality and hashing follow from name + plate sequence: two variables
//!   are "the same" iff their names match and they range over the same plates
//!   in the same order.
//! - [`Variable::ndim`] reports the plate count, i.e. how many trailing
//!   dimensions a bound value must carry for this variable.
//!
//! Invariants & assumptions
//! ------------------------
//! - Variables are immutable after creation and shared by reference (cheap
//!   clones) among every node that binds them.
//! - Plate order matters: the trailing dimensions of a bound value map onto
//!   `plates()` positionally.
//!
//! Testing notes
//! -------------
//! - Unit tests cover equality semantics and `ndim` for plated and scalar
//!   variables.
use crate::graph::core::plate::Plate;
use std::sync::Arc;

/// A named quantity bound to zero or more plates.
///
/// Used as a dictionary key for matching factor inputs and outputs; the
/// plate sequence describes the trailing dimensions a bound value carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    /// Name, unique within a graph's variable namespace.
    name: Arc<str>,
    /// Ordered plates this variable is indexed over.
    plates: Vec<Plate>,
}

impl Variable {
    /// Create a scalar variable (no plates).
    pub fn new(name: &str) -> Variable {
        Variable { name: Arc::from(name), plates: Vec::new() }
    }

    /// Create a variable indexed over the given plates, in order.
    pub fn with_plates(name: &str, plates: Vec<Plate>) -> Variable {
        Variable { name: Arc::from(name), plates }
    }

    /// The variable's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered plates this variable ranges over.
    pub fn plates(&self) -> &[Plate] {
        &self.plates
    }

    /// Number of plates, i.e. trailing dimensions a bound value must carry.
    pub fn ndim(&self) -> usize {
        self.plates.len()
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
