//! Report assembly and output.

pub mod assembler;
pub mod writer;

pub use assembler::{assemble, ReportPlan, ReportSet};
pub use writer::{write_json_summary, write_report_set};
