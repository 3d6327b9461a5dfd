//! Utility functions for timestamp handling.

pub mod timestamps;

pub use timestamps::{file_stamp, format_elapsed, format_iso8601, iso_timestamp, Timestamp};
