//! Test utilities and fixtures for stencil-iir
//!
//! Provides statement builders, a reference access computation driven by
//! the expressions of each statement, and a tracing initialiser.

pub mod access;
pub mod build;
pub mod logging;

pub use access::ExprAccessComputation;
pub use build::*;
pub use logging::init_tracing;
