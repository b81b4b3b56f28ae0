//! Test utilities for sqlstress.
//!
//! This crate provides utilities to facilitate testing of sqlstress and its binary. See the
//! modules for all available utilities.

pub mod sequences;
pub mod tracing;
