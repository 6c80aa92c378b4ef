//! File formats (container conversion, CSV tables)
//!
//! Conversion turns any supported input container into the tab-delimited
//! text the scanner reads. The CSV module renders and parses the tables the
//! pipeline produces.

pub mod convert;
pub mod csv;

// Re-export the entry points
pub use convert::{convert_file, ContainerFormat};
pub use csv::{read_indicator, write_aligned, write_counts, write_indicator, TIME_HEADER};
