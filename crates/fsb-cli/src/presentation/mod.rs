//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: no queue logic.

pub mod tables;

pub use tables::{
    describe_event, print_queue, print_separator, status_label, truncate_string,
};
