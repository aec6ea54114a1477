//! Shared utilities for finsight
//!
//! Currently this is the tracing subscriber setup shared by the binary and
//! by anything embedding the pipeline.

pub mod logging;

pub use logging::{LogFormat, init_tracing};
