//! # Calculations
//!
//! Each analysis follows the same shape:
//!
//! - an input type (JSON-serializable design)
//! - a result type (JSON-serializable, every intermediate kept)
//! - a pure `analyze(input, policy, collaborators) -> CalcResult<Result>` entry point
//!
//! ## Available Calculations
//!
//! - [`torsional`] - Multi-stage torsional spring damper

pub mod torsional;

pub use torsional::{analyze, SpringGroup, SystemDesign, TorsionalAnalysis};
