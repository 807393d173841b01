//! # Reference Evaluator
//!
//! Exact per-group results at the design's reference angle. Nothing here is
//! read from the sampled curve.
//!
//! ## Load Sharing and Stress
//!
//! Active groups share one rotational degree of freedom, so torque divides in
//! proportion to stiffness:
//!
//! ```text
//! T_g   = Kθ_g / Σ Kθ_active · T_loaded
//! F     = T_g · 1000 / (n · R)                   [N]
//! C     = Dm / d
//! Kw    = (4C − 1)/(4C − 4) + 0.615/C            (Wahl)
//! τ     = Kw · 8 · F · Dm / (π · d³)             [MPa]
//! τ_all = clamp(0.65 · Sut, min, max)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::findings::{Finding, FindingCode};
use super::group::{DerivedGroup, DerivedSystem, EngagementState};
use crate::materials::MaterialLookup;
use crate::policy::TorsionalPolicy;
use crate::units::{force_at_radius, stroke_from_angle, Degrees, MegaPascals, Millimeters, NewtonMeters, Newtons};

/// Wahl stress-correction factor for spring index `c`.
pub fn wahl_factor(c: f64) -> f64 {
    (4.0 * c - 1.0) / (4.0 * c - 4.0) + 0.615 / c
}

/// Corrected torsional shear stress in a helical spring.
pub fn shear_stress(force: Newtons, mean_diameter: Millimeters, wire_diameter: Millimeters) -> MegaPascals {
    let c = mean_diameter.0 / wire_diameter.0;
    MegaPascals(wahl_factor(c) * 8.0 * force.0 * mean_diameter.0 / (std::f64::consts::PI * wire_diameter.0.powi(3)))
}

/// Exact results for one active group at the reference angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReferenceResult {
    /// Group id
    pub group_id: String,
    /// Engagement state at the reference angle
    pub state: EngagementState,
    /// Spring deflection beyond engagement (deg)
    pub deflection_deg: f64,
    /// Arc compression of each spring (mm)
    pub stroke_mm: f64,
    /// Travel left before solid + clearance (mm)
    pub remaining_travel_mm: f64,
    /// Torque carried by the group (N·m)
    pub torque_share_nm: f64,
    /// Force on each spring (N)
    pub force_per_spring_n: f64,
    /// Spring index C = Dm / d
    pub spring_index: f64,
    /// Wahl factor Kw
    pub wahl_factor: f64,
    /// Corrected shear stress (MPa)
    pub shear_stress_mpa: f64,
    /// Tensile strength used (MPa), from lookup or policy fallback
    pub tensile_strength_mpa: f64,
    /// Allowable shear stress (MPa)
    pub allowable_stress_mpa: f64,
    /// Stress / allowable
    pub utilization: f64,
    /// False when the tensile strength is the policy fallback
    pub material_found: bool,
}

impl GroupReferenceResult {
    /// True when stress is within the allowable
    pub fn passes(&self) -> bool {
        self.utilization <= 1.0
    }
}

/// Exact system and per-group results at the reference angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEvaluation {
    /// Reference angle (deg)
    pub angle_deg: f64,
    /// Loading-branch torque (N·m)
    pub loaded_torque_nm: f64,
    /// Unloading-branch torque (N·m)
    pub unloaded_torque_nm: f64,
    /// Stiffness at the reference angle (N·m/deg)
    pub stiffness_nm_per_deg: f64,
    /// Whether the reference angle lies past the system stop
    pub beyond_stop: bool,
    /// One entry per active group, in design order
    pub groups: Vec<GroupReferenceResult>,
    /// Non-fatal problems met during evaluation (material fallback)
    pub findings: Vec<Finding>,
}

impl ReferenceEvaluation {
    /// Highest group utilization, 0 when nothing is engaged
    pub fn max_utilization(&self) -> f64 {
        self.groups.iter().map(|g| g.utilization).fold(0.0, f64::max)
    }

    /// Result for one group, if it is active at the reference angle
    pub fn group(&self, id: &str) -> Option<&GroupReferenceResult> {
        self.groups.iter().find(|g| g.group_id == id)
    }
}

/// Evaluate the system exactly at `reference_angle_deg`.
pub fn evaluate_reference(
    system: &DerivedSystem,
    reference_angle_deg: f64,
    materials: &dyn MaterialLookup,
    policy: &TorsionalPolicy,
) -> ReferenceEvaluation {
    let state = system.evaluate(reference_angle_deg);
    let active_stiffness: f64 = state
        .active
        .iter()
        .map(|&i| system.groups[i].angular_stiffness_nm_per_deg)
        .sum();

    let mut findings = Vec::new();
    let groups = state
        .active
        .iter()
        .map(|&i| {
            let g = &system.groups[i];
            let share = if active_stiffness > 0.0 {
                NewtonMeters(state.loaded_torque_nm) * (g.angular_stiffness_nm_per_deg / active_stiffness)
            } else {
                NewtonMeters(0.0)
            };
            evaluate_group(system, g, reference_angle_deg, share, materials, policy, &mut findings)
        })
        .collect();

    debug!(
        angle_deg = reference_angle_deg,
        loaded_torque_nm = state.loaded_torque_nm,
        active = state.active.len(),
        "Evaluated reference angle"
    );

    ReferenceEvaluation {
        angle_deg: reference_angle_deg,
        loaded_torque_nm: state.loaded_torque_nm,
        unloaded_torque_nm: state.unloaded_torque_nm,
        stiffness_nm_per_deg: state.stiffness_nm_per_deg,
        beyond_stop: state.beyond_stop,
        groups,
        findings,
    }
}

fn evaluate_group(
    system: &DerivedSystem,
    derived: &DerivedGroup,
    angle_deg: f64,
    torque_share: NewtonMeters,
    materials: &dyn MaterialLookup,
    policy: &TorsionalPolicy,
    findings: &mut Vec<Finding>,
) -> GroupReferenceResult {
    let g = &derived.group;
    let deflection_deg = derived.deflection_deg(angle_deg, system.system_stop_deg);
    let stroke_mm = stroke_from_angle(Degrees(deflection_deg), Millimeters(g.radius_mm)).0;

    let force_per_spring = force_at_radius(torque_share, Millimeters(g.radius_mm)) / g.spring_count as f64;
    let spring_index = g.spring_index();
    let shear = shear_stress(
        force_per_spring,
        Millimeters(g.mean_diameter_mm),
        Millimeters(g.wire_diameter_mm),
    );

    let (tensile_strength_mpa, material_found) = match materials.tensile_strength_mpa(&g.material) {
        Ok(sut) => (sut, true),
        Err(err) => {
            warn!(group = %g.id, material = %g.material, error = %err, "Material lookup failed, using fallback");
            findings.push(Finding::warning(
                FindingCode::MaterialFallback,
                Some(&g.id),
                format!(
                    "{}; assuming Sut = {:.0} MPa",
                    err, policy.fallback_tensile_strength_mpa
                ),
            ));
            (policy.fallback_tensile_strength_mpa, false)
        }
    };
    let allowable = MegaPascals(policy.allowable_stress_mpa(tensile_strength_mpa));

    GroupReferenceResult {
        group_id: g.id.clone(),
        state: derived.state_at(angle_deg, system.system_stop_deg),
        deflection_deg,
        stroke_mm,
        remaining_travel_mm: g.usable_travel_mm() - stroke_mm,
        torque_share_nm: torque_share.value(),
        force_per_spring_n: force_per_spring.value(),
        spring_index,
        wahl_factor: wahl_factor(spring_index),
        shear_stress_mpa: shear.value(),
        tensile_strength_mpa,
        allowable_stress_mpa: allowable.value(),
        utilization: shear.value() / allowable.value(),
        material_found,
    }
}
