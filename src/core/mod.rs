//! Core document and validation logic
//!
//! This module contains the configuration document model and everything
//! that reasons over it:
//!
//! - [`model`]: Definitions, chains, rules, and the rule-table collections
//! - [`chains`]: Chain generation from the interface list
//! - [`resolve`]: Address-name resolution to per-family literal lists
//! - [`checks`]: The nine-check validation battery
//! - [`icmp`]: ICMP type names accepted by filter service cells
//! - [`error`]: Error types for document operations

pub mod chains;
pub mod checks;
pub mod error;
pub mod icmp;
pub mod model;
pub mod resolve;
