//! Probe endpoint contract: repeat-count coercion, region parsing, cold
//! start tracking and the sequential read loop.

pub mod cold_start;
pub mod endpoint;
pub mod region;
pub mod repeat;

pub use cold_start::{ColdStartTracker, ProcessStart};
pub use endpoint::{ProbeEndpoint, ProbeOutcome, ProbeRegistry};
pub use region::{parse_region, DEFAULT_REGION_HEADER};
pub use repeat::{to_number, CountFallback, RepeatPolicy};
