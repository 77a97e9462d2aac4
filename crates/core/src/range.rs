use std::fmt;

use crate::error::BisectError;

/// Half-open interval `[min, max)` over the row id space.
///
/// A `RowRange` is never empty: [`RowRange::new`] refuses `min >= max`, so any
/// value of this type is valid work for the bisection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowRange {
    min: u64,
    max: u64,
}

impl RowRange {
    /// Build a range, or `None` when it would be empty or inverted.
    pub fn new(min: u64, max: u64) -> Option<Self> {
        (min < max).then_some(Self { min, max })
    }

    /// Seed range covering the inclusive bounds `[min, max]` read from a table.
    pub fn from_inclusive_bounds(min: u64, max: u64) -> Result<Self, BisectError> {
        if max < min {
            return Err(BisectError::InvertedBounds { min, max });
        }
        let end = max.checked_add(1).ok_or_else(|| {
            BisectError::Config(format!("max row id {} leaves no room for an exclusive bound", max))
        })?;
        Ok(Self { min, max: end })
    }

    pub fn start(&self) -> u64 {
        self.min
    }

    pub fn end(&self) -> u64 {
        self.max
    }

    pub fn width(&self) -> u64 {
        self.max - self.min
    }

    /// A width-1 range names exactly one row.
    pub fn is_singleton(&self) -> bool {
        self.width() == 1
    }

    /// Split at `min + width / 2` into `[min, mid)` and `[mid, max)`.
    ///
    /// Singletons cannot be split and return `None`. With an odd width the
    /// upper half is the larger one; DESIGN.md (open question 2) records why.
    pub fn split(&self) -> Option<(RowRange, RowRange)> {
        if self.is_singleton() {
            return None;
        }
        let mid = self.min + self.width() / 2;
        Some((
            RowRange { min: self.min, max: mid },
            RowRange { min: mid, max: self.max },
        ))
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.min, self.max)
    }
}

/// Result of probing one range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The query ran and produced at least one row.
    Ok,
    /// The query failed or produced nothing.
    Fault,
}

impl ProbeOutcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, ProbeOutcome::Fault)
    }
}

impl<E> From<Result<(), E>> for ProbeOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => ProbeOutcome::Ok,
            Err(_) => ProbeOutcome::Fault,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Ok => write!(f, "ok"),
            ProbeOutcome::Fault => write!(f, "broken"),
        }
    }
}
