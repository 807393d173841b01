//! # Design Rule Auditor
//!
//! Folds every audit into one report and adds the manufacturability and
//! operating-margin checks.
//!
//! | Check                         | Severity when tripped          |
//! |-------------------------------|--------------------------------|
//! | Spring index C outside range  | Warning                        |
//! | θ_stop ≤ θ_start              | Error                          |
//! | Utilization > 1.0             | Error                          |
//! | θ_start out of list order     | Warning                        |
//! | Material lookup fallback      | Warning                        |
//! | Collision risk                | Warning                        |
//! | Transition FAIL / WARN        | Warning / Info                 |
//! | Reference angle past stop     | Warning                        |
//! | Safety ratio FAIL / WARN      | Error / Warning                |
//!
//! Status is FAIL when any error exists, WARN when any warning exists, else OK.

use serde::{Deserialize, Serialize};

use super::collision::CollisionAudit;
use super::design::{AngleSource, SystemDesign};
use super::findings::{AuditStatus, Finding, FindingCode, FindingSeverity, ReportStatus};
use super::group::DerivedSystem;
use super::reference::ReferenceEvaluation;
use super::transition::TransitionAudit;
use crate::policy::TorsionalPolicy;

/// Operating angle against the angle the system can safely reach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SafetyAssessment {
    /// No operating angle with known provenance: the numbers describe what the
    /// design can do, without a pass/fail claim.
    CapabilityReference {
        /// System safe angle (deg)
        safe_angle_deg: f64,
    },
    /// Operating angle checked against the safe angle
    Checked {
        operating_angle_deg: f64,
        source: AngleSource,
        /// System safe angle (deg)
        safe_angle_deg: f64,
        /// operating / safe
        ratio: f64,
        status: AuditStatus,
    },
}

impl SafetyAssessment {
    /// Status of the check, `None` for a capability reference
    pub fn status(&self) -> Option<AuditStatus> {
        match self {
            SafetyAssessment::CapabilityReference { .. } => None,
            SafetyAssessment::Checked { status, .. } => Some(*status),
        }
    }
}

/// Classify the operating-angle safety margin.
///
/// PASS for ratio ≤ 0.8, WARN for 0.8 < ratio ≤ 1.0, FAIL above 1.0 (default policy).
pub fn assess_safety(design: &SystemDesign, safe_angle_deg: f64, policy: &TorsionalPolicy) -> SafetyAssessment {
    match design.known_operating_angle() {
        Some(operating_angle_deg) => {
            let ratio = operating_angle_deg / safe_angle_deg;
            // No working range at all: nothing is safe
            let status = if safe_angle_deg > 0.0 {
                AuditStatus::classify(ratio, &policy.safety_ratio)
            } else {
                AuditStatus::Fail
            };
            SafetyAssessment::Checked {
                operating_angle_deg,
                source: design.operating_angle_source,
                safe_angle_deg,
                ratio,
                status,
            }
        }
        None => SafetyAssessment::CapabilityReference { safe_angle_deg },
    }
}

/// Final design report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignReport {
    /// Overall status
    pub status: ReportStatus,
    /// Every finding, grouped by source in audit order
    pub findings: Vec<Finding>,
    /// Operating margin verdict
    pub safety: SafetyAssessment,
}

impl DesignReport {
    /// Findings at exactly `severity`
    pub fn findings_with(&self, severity: FindingSeverity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Number of error findings
    pub fn error_count(&self) -> usize {
        self.findings_with(FindingSeverity::Error).count()
    }

    /// Number of warning findings
    pub fn warning_count(&self) -> usize {
        self.findings_with(FindingSeverity::Warning).count()
    }

    /// Whether any finding carries `code`
    pub fn has(&self, code: FindingCode) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }
}

/// Everything the design rule auditor looks at.
#[derive(Debug, Clone, Copy)]
pub struct AuditInputs<'a> {
    pub design: &'a SystemDesign,
    pub system: &'a DerivedSystem,
    pub collision: &'a CollisionAudit,
    pub reference: Option<&'a ReferenceEvaluation>,
    pub transitions: &'a TransitionAudit,
}

/// Build the final report.
pub fn audit_design(inputs: AuditInputs<'_>, policy: &TorsionalPolicy) -> DesignReport {
    let AuditInputs {
        design,
        system,
        collision,
        reference,
        transitions,
    } = inputs;
    let mut findings = Vec::new();

    // Manufacturability
    for g in &system.groups {
        let c = g.group.spring_index();
        if c < policy.spring_index_min || c > policy.spring_index_max {
            findings.push(Finding::warning(
                FindingCode::SpringIndexRange,
                Some(g.id()),
                format!(
                    "Spring index C = {:.2} outside preferred {:.0}–{:.0}",
                    c, policy.spring_index_min, policy.spring_index_max
                ),
            ));
        }
        if g.stop_angle_deg <= g.engage_angle_deg() {
            findings.push(Finding::error(
                FindingCode::NonPositiveTravel,
                Some(g.id()),
                format!(
                    "Stop angle {:.2}° does not exceed engagement angle {:.2}°",
                    g.stop_angle_deg,
                    g.engage_angle_deg()
                ),
            ));
        }
    }

    // Strength at the reference angle
    if let Some(reference) = reference {
        findings.extend(reference.findings.iter().cloned());
        for r in reference.groups.iter().filter(|r| !r.passes()) {
            findings.push(Finding::error(
                FindingCode::Overstress,
                Some(&r.group_id),
                format!(
                    "Shear stress {:.0} MPa exceeds allowable {:.0} MPa (utilization {:.2}) at {:.2}°",
                    r.shear_stress_mpa, r.allowable_stress_mpa, r.utilization, reference.angle_deg
                ),
            ));
        }
        if reference.beyond_stop {
            findings.push(Finding::warning(
                FindingCode::ReferenceBeyondStop,
                None,
                format!(
                    "Reference angle {:.2}° is past the system stop at {:.2}°",
                    reference.angle_deg, system.system_stop_deg
                ),
            ));
        }
    }

    // Engagement order, in list order of enabled groups
    for pair in system.groups.windows(2) {
        if pair[1].engage_angle_deg() < pair[0].engage_angle_deg() {
            findings.push(Finding::warning(
                FindingCode::EngagementOrder,
                Some(pair[1].id()),
                format!(
                    "Engages at {:.2}°, before preceding group '{}' at {:.2}°",
                    pair[1].engage_angle_deg(),
                    pair[0].id(),
                    pair[0].engage_angle_deg()
                ),
            ));
        }
    }

    for w in &collision.warnings {
        findings.push(Finding::warning(FindingCode::CollisionRisk, None, w.message()));
    }

    for t in &transitions.transitions {
        let severity = match t.severity {
            AuditStatus::Pass => continue,
            AuditStatus::Warn => FindingSeverity::Info,
            AuditStatus::Fail => FindingSeverity::Warning,
        };
        findings.push(Finding::new(
            severity,
            FindingCode::TransitionNvh,
            None,
            format!("Transition at {:.2}° ({}): {}", t.angle_deg, t.engaging_groups.join(", "), t.explanation),
        ));
    }

    let safety = assess_safety(design, system.system_stop_deg, policy);
    findings.push(safety_finding(&safety));

    DesignReport {
        status: ReportStatus::from_findings(&findings),
        findings,
        safety,
    }
}

fn safety_finding(safety: &SafetyAssessment) -> Finding {
    match safety {
        SafetyAssessment::CapabilityReference { safe_angle_deg } => Finding::info(
            FindingCode::OperatingMargin,
            None,
            format!(
                "No operating angle supplied; system reaches its stop at {:.2}° (capability reference)",
                safe_angle_deg
            ),
        ),
        SafetyAssessment::Checked {
            operating_angle_deg,
            source,
            safe_angle_deg,
            ratio,
            status,
        } => {
            let severity = match status {
                AuditStatus::Pass => FindingSeverity::Info,
                AuditStatus::Warn => FindingSeverity::Warning,
                AuditStatus::Fail => FindingSeverity::Error,
            };
            Finding::new(
                severity,
                FindingCode::OperatingMargin,
                None,
                format!(
                    "{} operating angle {:.2}° ({}) is {:.0}% of safe angle {:.2}°",
                    status,
                    operating_angle_deg,
                    source.display_name(),
                    ratio * 100.0,
                    safe_angle_deg
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::collision::{audit_collisions, CollisionWarning};
    use super::super::curve::generate_curve;
    use super::super::design::fixtures::{group, two_stage};
    use super::super::reference::evaluate_reference;
    use super::super::transition::audit_transitions;
    use super::*;
    use crate::materials::{NoMaterials, SpringMaterialDb};

    fn report_with(design: &SystemDesign, materials: &dyn crate::materials::MaterialLookup) -> DesignReport {
        let policy = TorsionalPolicy::default();
        let system = DerivedSystem::derive(design, &policy).unwrap();
        let collision = audit_collisions(&system, &policy);
        let curve = generate_curve(&system, design.reference_angle_deg, &policy);
        let reference = evaluate_reference(&system, design.reference_angle_deg, materials, &policy);
        let transitions = audit_transitions(&system, &curve, &policy);
        audit_design(
            AuditInputs {
                design,
                system: &system,
                collision: &collision,
                reference: Some(&reference),
                transitions: &transitions,
            },
            &policy,
        )
    }

    fn single(reference_deg: f64) -> SystemDesign {
        SystemDesign::new("single", vec![group("g", 0.0, 10.0)], reference_deg)
    }

    #[test]
    fn test_clean_design_is_ok() {
        let report = report_with(&single(8.0), &SpringMaterialDb::standard());
        assert_eq!(report.status, ReportStatus::Ok);
        assert!(matches!(report.safety, SafetyAssessment::CapabilityReference { .. }));
        assert!(report.has(FindingCode::OperatingMargin));
        assert_eq!(report.error_count(), 0);
    }

    #[test]
    fn test_safety_ratio_boundaries() {
        let policy = TorsionalPolicy::default();
        let safe = 20.0;
        let cases = [
            (16.0, AuditStatus::Pass),
            (16.2, AuditStatus::Warn),
            (20.0, AuditStatus::Warn),
            (20.2, AuditStatus::Fail),
        ];
        for (angle, expected) in cases {
            let design = single(5.0).with_operating_angle(angle, AngleSource::Spec);
            assert_eq!(assess_safety(&design, safe, &policy).status(), Some(expected), "angle {angle}");
        }
    }

    #[test]
    fn test_non_positive_safe_angle_fails() {
        let policy = TorsionalPolicy::default();
        let design = single(5.0).with_operating_angle(10.0, AngleSource::Drawing);
        assert_eq!(assess_safety(&design, -2.81, &policy).status(), Some(AuditStatus::Fail));
        assert_eq!(assess_safety(&design, 0.0, &policy).status(), Some(AuditStatus::Fail));
    }

    #[test]
    fn test_operating_angle_without_provenance_is_informational() {
        let design = single(5.0).with_operating_angle(50.0, AngleSource::NotProvided);
        let report = report_with(&design, &SpringMaterialDb::standard());
        assert_eq!(report.safety.status(), None);
        assert_eq!(report.status, ReportStatus::Ok);
    }

    #[test]
    fn test_operating_past_stop_fails() {
        let design = single(5.0).with_operating_angle(19.0, AngleSource::Drawing);
        let report = report_with(&design, &SpringMaterialDb::standard());
        assert_eq!(report.safety.status(), Some(AuditStatus::Fail));
        assert_eq!(report.status, ReportStatus::Fail);
    }

    #[test]
    fn test_spring_index_warning() {
        let mut g = group("fat", 0.0, 10.0);
        g.wire_diameter_mm = 6.0; // C = 3
        let design = SystemDesign::new("fat", vec![g], 5.0);
        let report = report_with(&design, &SpringMaterialDb::standard());
        assert!(report.has(FindingCode::SpringIndexRange));
        assert_eq!(report.status, ReportStatus::Warn);
    }

    #[test]
    fn test_overstress_is_error() {
        let mut design = single(17.0);
        design.groups[0].wire_diameter_mm = 1.0; // C = 18, very thin wire
        let report = report_with(&design, &SpringMaterialDb::standard());
        assert!(report.has(FindingCode::Overstress));
        assert_eq!(report.status, ReportStatus::Fail);
    }

    #[test]
    fn test_engagement_order_warning() {
        let design = SystemDesign::new(
            "reversed",
            vec![group("late", 10.0, 1.0), group("early", 0.0, 10.0)],
            5.0,
        );
        let report = report_with(&design, &SpringMaterialDb::standard());
        let finding = report
            .findings
            .iter()
            .find(|f| f.code == FindingCode::EngagementOrder)
            .unwrap();
        assert_eq!(finding.group_id.as_deref(), Some("early"));
        assert_eq!(finding.severity, FindingSeverity::Warning);
    }

    #[test]
    fn test_transition_fail_is_warning() {
        let report = report_with(&two_stage(), &SpringMaterialDb::standard());
        let nvh = report.findings.iter().find(|f| f.code == FindingCode::TransitionNvh).unwrap();
        assert_eq!(nvh.severity, FindingSeverity::Warning);
        assert_eq!(report.status, ReportStatus::Warn);
    }

    #[test]
    fn test_material_fallback_is_warning() {
        let report = report_with(&single(5.0), &NoMaterials);
        assert!(report.has(FindingCode::MaterialFallback));
        assert_eq!(report.status, ReportStatus::Warn);
    }

    #[test]
    fn test_collision_is_warning() {
        let policy = TorsionalPolicy::default();
        let design = single(5.0);
        let system = DerivedSystem::derive(&design, &policy).unwrap();
        let collision = CollisionAudit {
            buckets: Vec::new(),
            warnings: vec![CollisionWarning {
                radius_mm: 100.0,
                group_a: "a".into(),
                group_b: "b".into(),
                angle_a_deg: 0.0,
                angle_b_deg: 5.0,
                actual_gap_deg: 5.0,
                required_gap_deg: 13.5,
            }],
        };
        let report = audit_design(
            AuditInputs {
                design: &design,
                system: &system,
                collision: &collision,
                reference: None,
                transitions: &TransitionAudit::default(),
            },
            &policy,
        );
        assert!(report.has(FindingCode::CollisionRisk));
        assert_eq!(report.status, ReportStatus::Warn);
    }

    #[test]
    fn test_reference_beyond_stop_flagged() {
        let report = report_with(&single(18.0), &SpringMaterialDb::standard());
        assert!(report.has(FindingCode::ReferenceBeyondStop));
        // The rigid stop drives the springs' share of torque far past allowable
        assert_eq!(report.status, ReportStatus::Fail);
    }
}
