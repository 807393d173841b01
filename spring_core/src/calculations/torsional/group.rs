//! # Group Model
//!
//! Derives each group's angular stiffness and stop angle once, and evaluates
//! the whole system at any rotation angle. Every other component works from the
//! [`DerivedSystem`] built here, so the formulas live in exactly one place.
//!
//! ## Formulas
//!
//! ```text
//! Kθ     = n · k · R² · (π/180) / 1000            [N·m/deg]
//! θ_stop = θ_start + (L_free − L_solid − c) / R · (180/π)
//! ```
//!
//! ## Engagement
//!
//! Each group is a three-state machine driven only by the current angle:
//!
//! ```text
//!   NotEngaged ──θ ≥ θ_start──▶ Engaged ──θ ≥ min(θ_stop, system stop)──▶ AtStop
//! ```
//!
//! A group whose θ_start lies beyond the system stop can never engage: the
//! rigid end-stop is reached first.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::design::{SpringGroup, SystemDesign};
use crate::errors::{CalcError, CalcResult};
use crate::policy::TorsionalPolicy;
use crate::units::{angle_from_stroke, Millimeters};

/// Engagement state of one group at one angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngagementState {
    /// Rotation has not reached θ_start
    NotEngaged,
    /// Springs are compressing
    Engaged,
    /// Springs are solid, or the system end-stop has been reached
    AtStop,
}

impl EngagementState {
    /// Whether the group carries load in this state
    pub fn is_active(&self) -> bool {
        !matches!(self, EngagementState::NotEngaged)
    }
}

/// Identifies a stage for the overlap check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    /// Explicit stage number from the design
    Explicit(u32),
    /// Group without a stage number is its own stage
    Group(String),
}

/// A spring group with its derived quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedGroup {
    /// The input group
    pub group: SpringGroup,

    /// Group angular stiffness Kθ (N·m/deg), all n springs together
    pub angular_stiffness_nm_per_deg: f64,

    /// Angle at which the group's springs reach solid + clearance (deg)
    pub stop_angle_deg: f64,
}

impl DerivedGroup {
    /// Derive Kθ and θ_stop for one group.
    ///
    /// Fails on invalid input or when the stop angle does not exceed the
    /// engagement angle.
    pub fn derive(group: &SpringGroup) -> CalcResult<Self> {
        group.validate()?;

        let r = group.radius_mm;
        let angular_stiffness_nm_per_deg =
            group.spring_count as f64 * group.rate_n_per_mm * r * r * (std::f64::consts::PI / 180.0) / 1000.0;

        let travel = angle_from_stroke(Millimeters(group.usable_travel_mm()), Millimeters(r));
        let stop_angle_deg = group.engage_angle_deg + travel.0;

        if !(stop_angle_deg > group.engage_angle_deg) {
            return Err(CalcError::degenerate_geometry(
                &group.id,
                format!(
                    "stop angle {:.4}° does not exceed engagement angle {:.4}°",
                    stop_angle_deg, group.engage_angle_deg
                ),
            ));
        }

        Ok(Self {
            group: group.clone(),
            angular_stiffness_nm_per_deg,
            stop_angle_deg,
        })
    }

    /// Group id
    pub fn id(&self) -> &str {
        &self.group.id
    }

    /// θ_start (deg)
    pub fn engage_angle_deg(&self) -> f64 {
        self.group.engage_angle_deg
    }

    /// Angular travel from engagement to stop (deg)
    pub fn travel_deg(&self) -> f64 {
        self.stop_angle_deg - self.group.engage_angle_deg
    }

    /// Stage identity for overlap detection
    pub fn stage_key(&self) -> StageKey {
        match self.group.stage {
            Some(stage) => StageKey::Explicit(stage),
            None => StageKey::Group(self.group.id.clone()),
        }
    }

    /// Angle at which this group stops compressing in a system that hits its
    /// rigid stop at `system_stop_deg`
    fn limit_deg(&self, system_stop_deg: f64) -> f64 {
        self.stop_angle_deg.min(system_stop_deg)
    }

    /// Engagement state at `angle_deg`.
    pub fn state_at(&self, angle_deg: f64, system_stop_deg: f64) -> EngagementState {
        let start = self.group.engage_angle_deg;
        let limit = self.limit_deg(system_stop_deg);
        if angle_deg < start || start > limit {
            EngagementState::NotEngaged
        } else if angle_deg >= limit {
            EngagementState::AtStop
        } else {
            EngagementState::Engaged
        }
    }

    /// min(θ, system stop, θ_stop)
    pub fn effective_angle_deg(&self, angle_deg: f64, system_stop_deg: f64) -> f64 {
        angle_deg.min(self.limit_deg(system_stop_deg))
    }

    /// Spring deflection beyond engagement (deg); zero when not engaged
    pub fn deflection_deg(&self, angle_deg: f64, system_stop_deg: f64) -> f64 {
        if self.state_at(angle_deg, system_stop_deg).is_active() {
            self.effective_angle_deg(angle_deg, system_stop_deg) - self.group.engage_angle_deg
        } else {
            0.0
        }
    }
}

/// Unloading torque for a given loading torque under friction `friction_nm`.
///
/// The unloading branch sits 2·Tf below loading. Below Tf the system sticks
/// and no restoring torque is returned.
pub fn unloaded_torque(loaded_nm: f64, friction_nm: f64) -> f64 {
    if loaded_nm <= friction_nm {
        0.0
    } else {
        loaded_nm - 2.0 * friction_nm
    }
}

/// Exact system state at one angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    /// Rotation (deg)
    pub angle_deg: f64,
    /// Torque on the loading branch (N·m)
    pub loaded_torque_nm: f64,
    /// Torque on the unloading branch (N·m)
    pub unloaded_torque_nm: f64,
    /// Instantaneous stiffness (N·m/deg), rigid past the stop
    pub stiffness_nm_per_deg: f64,
    /// Indices into [`DerivedSystem::groups`] of the active groups
    pub active: Vec<usize>,
    /// Whether the angle is past the system stop
    pub beyond_stop: bool,
}

/// Derived view of a whole design, built once per analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSystem {
    /// Enabled groups, in design order
    pub groups: Vec<DerivedGroup>,
    /// min θ_stop over enabled groups (deg)
    pub system_stop_deg: f64,
    /// Σ Kθ over enabled groups (N·m/deg)
    pub total_nominal_stiffness_nm_per_deg: f64,
    /// Stiffness of the rigid end-stop (N·m/deg)
    pub rigid_stiffness_nm_per_deg: f64,
    /// Friction torque Tf (N·m)
    pub friction_torque_nm: f64,
}

impl DerivedSystem {
    /// Validate the design and derive every enabled group.
    pub fn derive(design: &SystemDesign, policy: &TorsionalPolicy) -> CalcResult<Self> {
        design.validate()?;

        let groups = design
            .enabled_groups()
            .map(DerivedGroup::derive)
            .collect::<CalcResult<Vec<_>>>()?;

        let system_stop_deg = groups
            .iter()
            .map(|g| g.stop_angle_deg)
            .fold(f64::INFINITY, f64::min);
        if let Some(g) = groups.iter().find(|g| g.stop_angle_deg <= 0.0) {
            return Err(CalcError::degenerate_geometry(
                g.id(),
                format!(
                    "stop angle {:.4}° is not past rest, the system has no positive working range",
                    g.stop_angle_deg
                ),
            ));
        }
        let total_nominal_stiffness_nm_per_deg: f64 = groups.iter().map(|g| g.angular_stiffness_nm_per_deg).sum();

        for g in &groups {
            debug!(
                group = g.id(),
                k_theta = g.angular_stiffness_nm_per_deg,
                engage_deg = g.engage_angle_deg(),
                stop_deg = g.stop_angle_deg,
                "Derived spring group"
            );
        }
        debug!(system_stop_deg, total_nominal_stiffness_nm_per_deg, "Derived system");

        Ok(Self {
            groups,
            system_stop_deg,
            total_nominal_stiffness_nm_per_deg,
            rigid_stiffness_nm_per_deg: total_nominal_stiffness_nm_per_deg * policy.rigid_stop_multiplier,
            friction_torque_nm: design.friction_torque_nm,
        })
    }

    /// Indices of the groups active at `angle_deg`
    pub fn active_indices(&self, angle_deg: f64) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.state_at(angle_deg, self.system_stop_deg).is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// Σ Kθ of the active groups, excluding the rigid stop (N·m/deg)
    pub fn active_spring_stiffness(&self, angle_deg: f64) -> f64 {
        self.active_indices(angle_deg)
            .into_iter()
            .map(|i| self.groups[i].angular_stiffness_nm_per_deg)
            .sum()
    }

    /// Distinct stages active at `angle_deg`
    pub fn active_stages(&self, angle_deg: f64) -> BTreeSet<StageKey> {
        self.active_indices(angle_deg)
            .into_iter()
            .map(|i| self.groups[i].stage_key())
            .collect()
    }

    /// Evaluate loaded/unloaded torque and stiffness exactly at `angle_deg`.
    pub fn evaluate(&self, angle_deg: f64) -> SystemState {
        let active = self.active_indices(angle_deg);

        let mut stiffness = 0.0;
        let mut loaded = 0.0;
        for &i in &active {
            let g = &self.groups[i];
            stiffness += g.angular_stiffness_nm_per_deg;
            loaded += g.angular_stiffness_nm_per_deg * g.deflection_deg(angle_deg, self.system_stop_deg);
        }

        let beyond_stop = angle_deg > self.system_stop_deg;
        if beyond_stop {
            stiffness = self.rigid_stiffness_nm_per_deg;
            loaded += self.rigid_stiffness_nm_per_deg * (angle_deg - self.system_stop_deg);
        }

        SystemState {
            angle_deg,
            loaded_torque_nm: loaded,
            unloaded_torque_nm: unloaded_torque(loaded, self.friction_torque_nm),
            stiffness_nm_per_deg: stiffness,
            active,
            beyond_stop,
        }
    }
}
