//! Screen geometry for drag targeting
//!
//! The engine never measures anything itself; a [`CellGeometry`] provider
//! supplies the on-screen rectangle of any rule cell on demand. Cells the
//! provider cannot measure (folded tables, unrendered rows) simply yield
//! `None` and produce no receiver.

use std::collections::HashMap;
use std::fmt;

use crate::core::model::CellField;

/// Axis-aligned screen rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Strict interior test: points exactly on an edge do not hit.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x < self.right && x > self.left && y < self.bottom && y > self.top
    }
}

/// Which row of a table a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowSlot {
    Row(usize),
    /// The trailing empty row that appends a new rule on drop
    Append,
}

impl fmt::Display for RowSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(index) => write!(f, "{index}"),
            Self::Append => write!(f, "empty"),
        }
    }
}

/// Returns the canonical cell id, `{chain}-{field}-{row}` with `empty` for
/// the append row.
pub fn cell_id(chain: &str, field: CellField, slot: RowSlot) -> String {
    format!("{chain}-{field}-{slot}")
}

/// Supplies cell rectangles to the drag engine.
///
/// Implemented by whatever rendering layer hosts the tables. After any
/// mutation that can move cells, the engine re-queries; a provider must
/// therefore answer from current layout, not a stale snapshot.
pub trait CellGeometry {
    fn cell_rect(&self, chain: &str, field: CellField, slot: RowSlot) -> Option<Rect>;
}

/// Plain map from canonical cell id to rectangle.
///
/// The simplest provider, used by headless hosts and tests.
impl CellGeometry for HashMap<String, Rect> {
    fn cell_rect(&self, chain: &str, field: CellField, slot: RowSlot) -> Option<Rect> {
        self.get(&cell_id(chain, field, slot)).copied()
    }
}
