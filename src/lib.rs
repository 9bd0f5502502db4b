//! nftgrid - table-driven nftables configuration editor, core engine
//!
//! The headless heart of a visual firewall editor: a configuration document
//! of named definitions and per-chain rule tables, a drag-targeting engine
//! that moves those names between table cells by pointer geometry, and a
//! fixed battery of consistency checks over the whole document.
//!
//! # Architecture
//!
//! - [`core`] - Document model, chain generation, resolution, and checks
//! - [`drag`] - Geometry-driven drag sessions over rule tables
//! - [`storage`] - Saved-configuration persistence (XDG data dir, JSON)
//! - [`validators`] - Input validation for definition panels
//! - [`utils`] - XDG directories and live interface detection
//!
//! # Invariants
//!
//! - Rules reference definitions by name; dangling names are reported by
//!   the check battery, never silently dropped
//! - Drag mutations are the only implicit rule edits: append on drop,
//!   detach on leaving the origin cell, auto-delete of blank rules
//! - Tombstoned tables keep their rules across chain regeneration and
//!   disappear only once emptied

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

pub mod core;
pub mod drag;
pub mod storage;
pub mod utils;
pub mod validators;

// Re-export commonly used types
pub use crate::core::checks::ValidationReport;
pub use crate::core::error::{Error, Result};
pub use crate::core::model::Document;
