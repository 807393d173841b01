//! # spring_core - Torsional Spring System Engine
//!
//! `spring_core` analyses multi-stage torsional spring dampers: groups of
//! helical compression springs mounted at a radius that engage in stages as
//! the assembly rotates. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: one pure `analyze` call per design
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: fatal input problems are structured errors, everything
//!   else is a classified finding in the report
//! - **Policy-Driven**: every threshold lives in [`TorsionalPolicy`]
//!
//! ## Quick Start
//!
//! ```rust
//! use spring_core::{analyze, SpringMaterialDb, SystemDesign, TorsionalPolicy};
//!
//! let json = r#"{
//!     "label": "clutch disc",
//!     "groups": [{
//!         "id": "outer", "spring_count": 6, "rate_n_per_mm": 10.0,
//!         "radius_mm": 100.0, "engage_angle_deg": 0.0,
//!         "wire_diameter_mm": 3.0, "mean_diameter_mm": 18.0,
//!         "free_length_mm": 60.0, "solid_length_mm": 30.0,
//!         "material": "A401"
//!     }],
//!     "reference_angle_deg": 10.0
//! }"#;
//! let design: SystemDesign = serde_json::from_str(json).unwrap();
//! let analysis = analyze(&design, &TorsionalPolicy::default(), &SpringMaterialDb::standard()).unwrap();
//! println!("{}", analysis.report.status);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - The torsional analysis pipeline
//! - [`materials`] - Spring wire database and lookup trait
//! - [`policy`] - Tunable thresholds and constants
//! - [`units`] - Type-safe unit wrappers and angle/stroke conversion
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod errors;
pub mod materials;
pub mod policy;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::torsional::{
    analyze, AngleSource, DesignReport, Finding, FindingSeverity, ReportStatus, SpringGroup, SystemDesign,
    TorsionalAnalysis,
};
pub use errors::{CalcError, CalcResult};
pub use materials::{MaterialLookup, SpringMaterialDb, SpringWire};
pub use policy::TorsionalPolicy;
