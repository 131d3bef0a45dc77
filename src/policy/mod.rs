//! Policies for the selection and backup phases of the search
//!
//! This module contains the pluggable pieces of a simulation:
//! - Selection policies: Which move to follow from a node
//! - Backup policies: How a leaf value updates the edges above it

pub mod backup;
pub mod selection;

pub use backup::{BackupPolicy, DiscountedPolicy, MeanValuePolicy};
pub use selection::{PuctPolicy, SelectionPolicy};
