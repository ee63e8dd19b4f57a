//! Compressed-container format detection.
//!
//! Detection is a pure function of the first few bytes of the input; see
//! [`detect`] for the matchers and the priority rules.

pub mod detect;

pub use detect::{detect, matching_methods};
