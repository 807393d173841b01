//! # Torsional Spring System Analysis
//!
//! Multi-stage torsional damper analysis: helical compression springs mounted
//! tangentially at a radius, grouped into stages that engage at increasing
//! rotation angles and bottom out at their stop angles.
//!
//! ## Pipeline
//!
//! ```text
//! SystemDesign ─► DerivedSystem ─┬─► CollisionAudit
//!                                ├─► SystemCurve ──► TransitionAudit
//!                                ├─► ReferenceEvaluation
//!                                └─► DesignReport (folds all of the above)
//! ```
//!
//! Every torque, stiffness and engagement state comes from
//! [`DerivedSystem::evaluate`]. The curve samples it, the reference evaluator
//! calls it at one exact angle, and the transition auditor probes it at
//! θ ± ε.
//!
//! ## Example
//!
//! ```rust
//! use spring_core::calculations::torsional::{analyze, SpringGroup, SystemDesign};
//! use spring_core::materials::SpringMaterialDb;
//! use spring_core::policy::TorsionalPolicy;
//!
//! let group = SpringGroup {
//!     id: "outer".to_string(),
//!     enabled: true,
//!     stage: None,
//!     spring_count: 6,
//!     rate_n_per_mm: 10.0,
//!     radius_mm: 100.0,
//!     engage_angle_deg: 0.0,
//!     wire_diameter_mm: 3.0,
//!     mean_diameter_mm: 18.0,
//!     free_length_mm: 60.0,
//!     solid_length_mm: 30.0,
//!     clearance_mm: 0.0,
//!     material: "A401".to_string(),
//! };
//! let design = SystemDesign::new("demo", vec![group], 10.0);
//!
//! let analysis = analyze(&design, &TorsionalPolicy::default(), &SpringMaterialDb::standard()).unwrap();
//! assert!((analysis.reference.loaded_torque_nm - 104.72).abs() < 0.01);
//! ```

pub mod collision;
pub mod curve;
pub mod design;
pub mod findings;
pub mod group;
pub mod reference;
pub mod rules;
pub mod transition;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use collision::{audit_collisions, CollisionAudit, CollisionWarning, RadiusBucket};
pub use curve::{generate_curve, CurvePoint, SystemCurve};
pub use design::{AngleSource, SpringGroup, SystemDesign};
pub use findings::{AuditStatus, Finding, FindingCode, FindingSeverity, ReportStatus};
pub use group::{unloaded_torque, DerivedGroup, DerivedSystem, EngagementState, StageKey, SystemState};
pub use reference::{evaluate_reference, GroupReferenceResult, ReferenceEvaluation};
pub use rules::{assess_safety, audit_design, AuditInputs, DesignReport, SafetyAssessment};
pub use transition::{audit_transitions, TransitionAudit, TransitionChecks, TransitionFinding, TransitionMetrics};

use crate::errors::CalcResult;
use crate::materials::MaterialLookup;
use crate::policy::TorsionalPolicy;

/// Complete result of analysing one design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorsionalAnalysis {
    /// Label copied from the design
    pub design_label: String,
    /// Enabled groups with derived stiffness and stops
    pub system: DerivedSystem,
    /// Radius buckets and interference warnings
    pub collision: CollisionAudit,
    /// Swept torque characteristic
    pub curve: SystemCurve,
    /// Exact results at the reference angle
    pub reference: ReferenceEvaluation,
    /// Stage transition NVH grades
    pub transitions: TransitionAudit,
    /// Folded findings, safety margin and overall status
    pub report: DesignReport,
}

impl TorsionalAnalysis {
    /// Overall report status
    pub fn status(&self) -> ReportStatus {
        self.report.status
    }

    /// Pretty JSON for storage or downstream tools
    pub fn to_json(&self) -> CalcResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run the full analysis pipeline on a design.
///
/// # Errors
///
/// Fatal input problems only: invalid policy, no enabled group, duplicate
/// ids, non-positive geometry or zero usable travel. Everything else ends up
/// as a [`Finding`] in the report.
pub fn analyze(
    design: &SystemDesign,
    policy: &TorsionalPolicy,
    materials: &dyn MaterialLookup,
) -> CalcResult<TorsionalAnalysis> {
    policy.validate()?;
    info!(
        design = %design.label,
        groups = design.groups.len(),
        reference_angle_deg = design.reference_angle_deg,
        "Analysing torsional spring system"
    );

    let system = DerivedSystem::derive(design, policy)?;
    let collision = audit_collisions(&system, policy);
    let curve = generate_curve(&system, design.reference_angle_deg, policy);
    let reference = evaluate_reference(&system, design.reference_angle_deg, materials, policy);
    let transitions = audit_transitions(&system, &curve, policy);
    let report = audit_design(
        AuditInputs {
            design,
            system: &system,
            collision: &collision,
            reference: Some(&reference),
            transitions: &transitions,
        },
        policy,
    );

    info!(
        design = %design.label,
        status = %report.status,
        findings = report.findings.len(),
        system_stop_deg = system.system_stop_deg,
        "Analysis complete"
    );

    Ok(TorsionalAnalysis {
        design_label: design.label.clone(),
        system,
        collision,
        curve,
        reference,
        transitions,
        report,
    })
}
