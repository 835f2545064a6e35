//! Analysis modules.
//!
//! Splitting of the compound activity field and the counting functions
//! every report is built from.

pub mod aggregator;
pub mod splitter;

pub use aggregator::*;
pub use splitter::*;
