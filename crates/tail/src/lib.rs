//! Tail-first file machinery: bounded-memory reverse line reading and
//! byte-offset window seeking.
//!
//! This crate carries no monitoring policy. It knows how to walk a text
//! file backward in fixed-size blocks and how to find the byte offset
//! where a time window begins; what to do with the lines is the caller's
//! business.

pub mod reverse;
pub mod seek;

pub use reverse::ReverseLineReader;
pub use seek::{LogWindowSeeker, WindowStart};
