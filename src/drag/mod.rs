//! Drag-targeting engine for rule tables.
//!
//! [`geometry`] defines the rectangle/provider seam, [`receivers`] turns
//! rule tables into droppable cell lists, and [`session`] drives the drag
//! state machine that mutates tables on detach and drop.

pub mod geometry;
pub mod receivers;
pub mod session;

pub use geometry::{CellGeometry, Rect, RowSlot};
pub use receivers::{collect_receivers, DragKind, DragTargets, Receiver};
pub use session::{DragSession, DropOutcome, GrabAnchor, MoveEffect, Origin, PanelHandle};
