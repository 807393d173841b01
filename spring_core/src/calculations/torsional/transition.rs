//! # Stage Transition Auditor
//!
//! Grades how smoothly stiffness is handed over at each engagement angle.
//! A hard step in stiffness (or in the torque slope seen on the curve) is felt
//! as a knock; a band with no active group is a dead zone with no restoring
//! torque. Both are NVH concerns.
//!
//! For each transition angle θ:
//!
//! ```text
//! k_before, k_after = active spring stiffness at θ ∓ ε        (exact)
//! jump_ratio        = (k_after − k_before) / max(k_before, 1e-6)
//! slope_before      = [T(θ) − T(θ − 2w)] / 2w                  (curve, centred at θ − w)
//! slope_after       = [T(θ + 2w) − T(θ)] / 2w                  (curve, centred at θ + w)
//! slope_jump        = |slope_after − slope_before|
//! gap               = θ − previous stop, when nothing is active just before θ
//! overlap           = 2w, when more than one stage is active just after θ
//! ```
//!
//! The overlap value is a fixed-magnitude flag, not the width of the
//! intersection of the stages' active ranges. Read it as an approximation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::curve::SystemCurve;
use super::findings::AuditStatus;
use super::group::DerivedSystem;
use crate::policy::TorsionalPolicy;

/// Floor for k_before in the jump ratio, so a start from zero stays finite.
const MIN_STIFFNESS_FOR_RATIO: f64 = 1e-6;

/// Raw measurements taken at one transition.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionMetrics {
    /// (k_after − k_before) / k_before
    pub jump_ratio: f64,
    /// |slope_after − slope_before| (N·m/deg per deg)
    pub slope_jump: f64,
    /// Dead-zone width before the transition (deg)
    pub gap_deg: f64,
    /// Stage overlap flag magnitude (deg)
    pub overlap_deg: f64,
}

/// Grades of the four independent checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionChecks {
    pub jump: AuditStatus,
    pub slope: AuditStatus,
    pub gap: AuditStatus,
    pub overlap: AuditStatus,
}

impl TransitionChecks {
    /// Grade metrics against policy. Slope thresholds scale with the total
    /// nominal stiffness of the system.
    pub fn grade(metrics: &TransitionMetrics, total_nominal_stiffness: f64, policy: &TorsionalPolicy) -> Self {
        let slope_limits = crate::policy::Thresholds::new(
            policy.slope_jump_fraction.warn * total_nominal_stiffness,
            policy.slope_jump_fraction.fail * total_nominal_stiffness,
        );
        Self {
            jump: AuditStatus::classify(metrics.jump_ratio.abs(), &policy.jump_ratio),
            slope: AuditStatus::classify(metrics.slope_jump, &slope_limits),
            gap: AuditStatus::classify(metrics.gap_deg, &policy.gap_deg),
            overlap: AuditStatus::classify(metrics.overlap_deg, &policy.overlap_deg),
        }
    }

    /// Worst of the four
    pub fn worst(&self) -> AuditStatus {
        self.jump.max(self.slope).max(self.gap).max(self.overlap)
    }
}

/// Audit result for one transition angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionFinding {
    /// Transition angle (deg)
    pub angle_deg: f64,
    /// Groups engaging at this angle
    pub engaging_groups: Vec<String>,
    /// Active spring stiffness just before (N·m/deg)
    pub stiffness_before: f64,
    /// Active spring stiffness just after (N·m/deg)
    pub stiffness_after: f64,
    /// Curve slope before (N·m/deg)
    pub slope_before: f64,
    /// Curve slope after (N·m/deg)
    pub slope_after: f64,
    /// Measurements fed to the checks
    pub metrics: TransitionMetrics,
    /// Per-check grades
    pub checks: TransitionChecks,
    /// Worst of the checks
    pub severity: AuditStatus,
    /// Human-readable explanation
    pub explanation: String,
}

/// All transitions of a system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionAudit {
    /// Transitions in ascending angle order
    pub transitions: Vec<TransitionFinding>,
    /// Worst severity across transitions (PASS when there are none)
    pub severity: AuditStatus,
}

/// Engagement angles, merged within tolerance, excluding the initial engagement at zero.
fn transition_angles(system: &DerivedSystem, policy: &TorsionalPolicy) -> Vec<(f64, Vec<String>)> {
    let mut starts: Vec<(f64, &str)> = system
        .groups
        .iter()
        .map(|g| (g.engage_angle_deg(), g.id()))
        .collect();
    starts.sort_by(|a, b| a.0.total_cmp(&b.0));

    let tol = policy.transition_merge_tolerance_deg;
    let mut merged: Vec<(f64, Vec<String>)> = Vec::new();
    for (angle, id) in starts {
        match merged.last_mut() {
            Some((last, ids)) if (angle - *last).abs() <= tol => ids.push(id.to_string()),
            _ => merged.push((angle, vec![id.to_string()])),
        }
    }
    merged.retain(|(angle, _)| *angle > tol);
    merged
}

/// Audit every stage transition against the generated curve.
pub fn audit_transitions(system: &DerivedSystem, curve: &SystemCurve, policy: &TorsionalPolicy) -> TransitionAudit {
    let eps = policy.transition_epsilon_deg;
    let w = policy.slope_window_deg;

    let transitions: Vec<TransitionFinding> = transition_angles(system, policy)
        .into_iter()
        .map(|(angle, engaging_groups)| {
            let before = angle - eps;
            let after = angle + eps;

            let stiffness_before = system.active_spring_stiffness(before);
            let stiffness_after = system.active_spring_stiffness(after);
            let jump_ratio = (stiffness_after - stiffness_before) / stiffness_before.max(MIN_STIFFNESS_FOR_RATIO);

            let slope_before = curve.slope_at(angle - w, w);
            let slope_after = curve.slope_at(angle + w, w);

            // None when nothing stopped earlier: the gap is free play from rest
            let previous_stop = system
                .groups
                .iter()
                .map(|g| g.stop_angle_deg)
                .filter(|&stop| stop < angle)
                .reduce(f64::max);
            let gap_deg = if system.active_indices(before).is_empty() {
                (angle - previous_stop.unwrap_or(0.0)).max(0.0)
            } else {
                0.0
            };

            let overlap_deg = if system.active_stages(after).len() > 1 { 2.0 * w } else { 0.0 };

            let metrics = TransitionMetrics {
                jump_ratio,
                slope_jump: (slope_after - slope_before).abs(),
                gap_deg,
                overlap_deg,
            };
            let checks = TransitionChecks::grade(&metrics, system.total_nominal_stiffness_nm_per_deg, policy);
            let severity = checks.worst();

            debug!(
                angle_deg = angle,
                jump_ratio,
                slope_jump = metrics.slope_jump,
                gap_deg,
                overlap_deg,
                severity = %severity,
                "Audited stage transition"
            );

            TransitionFinding {
                angle_deg: angle,
                explanation: explain(&metrics, &checks, stiffness_before, stiffness_after, previous_stop.is_none()),
                engaging_groups,
                stiffness_before,
                stiffness_after,
                slope_before,
                slope_after,
                metrics,
                checks,
                severity,
            }
        })
        .collect();

    let severity = transitions
        .iter()
        .map(|t| t.severity)
        .max()
        .unwrap_or(AuditStatus::Pass);

    TransitionAudit { transitions, severity }
}

fn explain(
    metrics: &TransitionMetrics,
    checks: &TransitionChecks,
    k_before: f64,
    k_after: f64,
    from_rest: bool,
) -> String {
    let mut parts = Vec::new();
    if checks.jump != AuditStatus::Pass {
        parts.push(format!(
            "{} stiffness jump {:+.0}% ({:.2} → {:.2} N·m/°)",
            checks.jump,
            metrics.jump_ratio * 100.0,
            k_before,
            k_after
        ));
    }
    if checks.slope != AuditStatus::Pass {
        parts.push(format!("{} torque slope changes by {:.2} N·m/°", checks.slope, metrics.slope_jump));
    }
    if checks.gap != AuditStatus::Pass {
        if from_rest {
            parts.push(format!(
                "{} {:.2}° free play from rest before the first engagement",
                checks.gap, metrics.gap_deg
            ));
        } else {
            parts.push(format!(
                "{} {:.2}° dead zone between stages with no restoring torque",
                checks.gap, metrics.gap_deg
            ));
        }
    }
    if checks.overlap != AuditStatus::Pass {
        parts.push(format!(
            "{} stages overlap (flagged at {:.2}°, approximate)",
            checks.overlap, metrics.overlap_deg
        ));
    }
    if parts.is_empty() {
        "Smooth handoff".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::super::curve::generate_curve;
    use super::super::design::fixtures::{group, two_stage};
    use super::super::design::SystemDesign;
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn audit(design: &SystemDesign, policy: &TorsionalPolicy) -> TransitionAudit {
        let system = DerivedSystem::derive(design, policy).unwrap();
        let curve = generate_curve(&system, design.reference_angle_deg, policy);
        audit_transitions(&system, &curve, policy)
    }

    #[test]
    fn test_zero_engagement_is_not_a_transition() {
        let design = SystemDesign::new("single", vec![group("g", 0.0, 10.0)], 5.0);
        let result = audit(&design, &TorsionalPolicy::default());
        assert!(result.transitions.is_empty());
        assert_eq!(result.severity, AuditStatus::Pass);
    }

    #[test]
    fn test_hard_stage_step_fails() {
        let result = audit(&two_stage(), &TorsionalPolicy::default());
        assert_eq!(result.transitions.len(), 1);
        let t = &result.transitions[0];
        assert_relative_eq!(t.angle_deg, 10.0);
        assert_eq!(t.engaging_groups, vec!["g2".to_string()]);
        assert_relative_eq!(t.metrics.jump_ratio, 2.0, max_relative = 1e-9);
        assert_eq!(t.checks.jump, AuditStatus::Fail);
        assert_eq!(t.checks.slope, AuditStatus::Fail);
        assert_eq!(t.checks.gap, AuditStatus::Pass);
        // Two distinct stages active → fixed 1.5° flag, below the 2° warn level
        assert_relative_eq!(t.metrics.overlap_deg, 1.5);
        assert_eq!(t.checks.overlap, AuditStatus::Pass);
        assert_eq!(t.severity, AuditStatus::Fail);
        assert_eq!(result.severity, AuditStatus::Fail);
        assert!(t.explanation.contains("stiffness jump +200%"));
    }

    #[test]
    fn test_soft_stage_step_passes() {
        // Second stage adds a tenth of the first stage's stiffness
        let design = SystemDesign::new("soft", vec![group("g1", 0.0, 10.0), group("g2", 10.0, 1.0)], 12.0);
        let result = audit(&design, &TorsionalPolicy::default());
        let t = &result.transitions[0];
        assert_relative_eq!(t.metrics.jump_ratio, 0.1, max_relative = 1e-9);
        assert_relative_eq!(t.slope_before, t.stiffness_before, max_relative = 0.01);
        assert_relative_eq!(t.slope_after, t.stiffness_after, max_relative = 0.01);
        assert_eq!(t.severity, AuditStatus::Pass);
        assert_eq!(t.explanation, "Smooth handoff");
    }

    #[test]
    fn test_free_play_is_a_gap() {
        let design = SystemDesign::new("lash", vec![group("g", 3.0, 10.0)], 8.0);
        let result = audit(&design, &TorsionalPolicy::default());
        let t = &result.transitions[0];
        assert_eq!(t.stiffness_before, 0.0);
        assert_relative_eq!(t.metrics.gap_deg, 3.0);
        assert_eq!(t.checks.gap, AuditStatus::Fail);
        // Lash before the first stage, not a dead zone between stages
        assert!(t.explanation.contains("free play from rest"));
        assert!(!t.explanation.contains("between stages"));
    }

    #[test]
    fn test_close_engagements_merge() {
        let design = SystemDesign::new(
            "merged",
            vec![group("g1", 0.0, 10.0), group("g2", 10.0, 1.0), group("g3", 10.02, 1.0)],
            12.0,
        );
        let result = audit(&design, &TorsionalPolicy::default());
        assert_eq!(result.transitions.len(), 1);
        assert_eq!(result.transitions[0].engaging_groups, vec!["g2".to_string(), "g3".to_string()]);
    }

    #[test]
    fn test_shared_stage_is_not_overlap() {
        let mut design = two_stage();
        design.groups[0].stage = Some(1);
        design.groups[1].stage = Some(1);
        let result = audit(&design, &TorsionalPolicy::default());
        assert_eq!(result.transitions[0].metrics.overlap_deg, 0.0);
    }

    #[test]
    fn test_wide_window_overlap_warns() {
        // 2 × 1.25° = 2.5° overlap flag → above the 2° warn level
        let policy = TorsionalPolicy::new().with_slope_window_deg(1.25);
        let result = audit(&two_stage(), &policy);
        assert_eq!(result.transitions[0].checks.overlap, AuditStatus::Warn);
    }

    fn pass_metrics() -> TransitionMetrics {
        TransitionMetrics::default()
    }

    proptest! {
        #[test]
        fn prop_any_single_failing_check_fails_transition(which in 0usize..4, excess in 1e-6f64..100.0) {
            let policy = TorsionalPolicy::default();
            let total = 30.0;
            let mut m = pass_metrics();
            match which {
                0 => m.jump_ratio = policy.jump_ratio.fail + excess,
                1 => m.slope_jump = policy.slope_jump_fraction.fail * total + excess,
                2 => m.gap_deg = policy.gap_deg.fail + excess,
                _ => m.overlap_deg = policy.overlap_deg.fail + excess,
            }
            let checks = TransitionChecks::grade(&m, total, &policy);
            prop_assert_eq!(checks.worst(), AuditStatus::Fail);
        }

        #[test]
        fn prop_negative_jump_graded_by_magnitude(excess in 1e-6f64..10.0) {
            let policy = TorsionalPolicy::default();
            let m = TransitionMetrics { jump_ratio: -(policy.jump_ratio.fail + excess), ..pass_metrics() };
            prop_assert_eq!(TransitionChecks::grade(&m, 30.0, &policy).jump, AuditStatus::Fail);
        }

        #[test]
        fn prop_pass_level_metrics_pass(
            jump in 0.0f64..0.30,
            slope_frac in 0.0f64..0.10,
            gap in 0.0f64..0.5,
            overlap in 0.0f64..2.0,
        ) {
            let policy = TorsionalPolicy::default();
            let total = 30.0;
            let m = TransitionMetrics {
                jump_ratio: jump,
                slope_jump: slope_frac * total,
                gap_deg: gap,
                overlap_deg: overlap,
            };
            prop_assert_eq!(TransitionChecks::grade(&m, total, &policy).worst(), AuditStatus::Pass);
        }
    }
}
