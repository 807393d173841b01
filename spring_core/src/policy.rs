//! # Torsional Design Policy
//!
//! Every tunable constant used by the torsional engine, gathered in one
//! immutable value that is passed into each component.
//!
//! ## Policy Summary
//!
//! | Setting                        | Default        | Used by                 |
//! |--------------------------------|----------------|-------------------------|
//! | Spring index range C = Dm/d    | 4 – 20         | Design rules            |
//! | Rigid stop multiplier          | 1000×          | Curve generator         |
//! | Collision clearance angle      | 1.5°           | Collision auditor       |
//! | Radius bucket resolution       | 0.1 mm         | Collision auditor       |
//! | Sweep margin / sample count    | 1.2 / 150      | Curve generator         |
//! | Allowable stress               | 0.65·Sut       | Reference evaluator     |
//! | Jump ratio warn / fail         | 0.30 / 0.60    | Transition auditor      |
//! | Slope jump warn / fail         | 0.10 / 0.25 ×K | Transition auditor      |
//! | Gap warn / fail                | 0.5° / 2.0°    | Transition auditor      |
//! | Overlap warn / fail            | 2.0° / 6.0°    | Transition auditor      |
//! | Safety ratio pass / warn       | 0.8 / 1.0      | Design rules            |
//!
//! The rigid multiplier and the collision clearance angle are policy choices
//! rather than physical constants; override them per project if needed.
//!
//! ## Example
//!
//! ```rust
//! use spring_core::policy::TorsionalPolicy;
//!
//! let policy = TorsionalPolicy::new()
//!     .with_sample_count(300)
//!     .with_collision_clearance_deg(2.0);
//! assert!(policy.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Warn/fail threshold pair.
///
/// A value *warns* when strictly above `warn` and *fails* when strictly above `fail`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub warn: f64,
    pub fail: f64,
}

impl Thresholds {
    pub const fn new(warn: f64, fail: f64) -> Self {
        Self { warn, fail }
    }

    fn validate(&self, field: &str) -> CalcResult<()> {
        if !(self.warn.is_finite() && self.fail.is_finite()) || self.warn < 0.0 || self.fail < self.warn {
            return Err(CalcError::invalid_input(
                field,
                format!("warn={}, fail={}", self.warn, self.fail),
                "Thresholds must be finite, non-negative and warn <= fail",
            ));
        }
        Ok(())
    }
}

/// Immutable policy configuration for the torsional engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorsionalPolicy {
    // === Manufacturability ===
    /// Lowest preferred spring index C = Dm/d
    pub spring_index_min: f64,
    /// Highest preferred spring index C = Dm/d
    pub spring_index_max: f64,

    // === Curve generation ===
    /// Stiffness multiplier applied past the system stop (metal-to-metal contact)
    pub rigid_stop_multiplier: f64,
    /// Sweep extends to `margin · max(system stop, reference angle)`
    pub sweep_margin: f64,
    /// Number of curve samples, endpoints inclusive
    pub sample_count: usize,

    // === Collision ===
    /// Extra angular clearance required between neighbouring springs (deg)
    pub collision_clearance_deg: f64,
    /// Groups whose radii round to the same multiple of this share a bucket (mm)
    pub radius_bucket_mm: f64,

    // === Stress ===
    /// Allowable shear stress as a fraction of tensile strength
    pub allowable_stress_fraction: f64,
    /// Floor applied to the allowable stress (MPa)
    pub allowable_stress_min_mpa: f64,
    /// Ceiling applied to the allowable stress (MPa)
    pub allowable_stress_max_mpa: f64,
    /// Tensile strength assumed when the material lookup fails (MPa)
    pub fallback_tensile_strength_mpa: f64,

    // === Stage transitions ===
    /// Half-width of the stiffness probe around a transition (deg)
    pub transition_epsilon_deg: f64,
    /// Half-width of the slope estimation window (deg)
    pub slope_window_deg: f64,
    /// Engagement angles closer than this are one transition (deg)
    pub transition_merge_tolerance_deg: f64,
    /// |jump ratio| thresholds
    pub jump_ratio: Thresholds,
    /// Slope jump thresholds as fractions of total nominal stiffness
    pub slope_jump_fraction: Thresholds,
    /// Dead-zone gap thresholds (deg)
    pub gap_deg: Thresholds,
    /// Stage overlap thresholds (deg)
    pub overlap_deg: Thresholds,

    // === Safety margin ===
    /// operating/safe angle ratio thresholds: PASS <= warn < WARN <= fail < FAIL
    pub safety_ratio: Thresholds,
}

impl Default for TorsionalPolicy {
    fn default() -> Self {
        Self {
            spring_index_min: 4.0,
            spring_index_max: 20.0,
            rigid_stop_multiplier: 1000.0,
            sweep_margin: 1.2,
            sample_count: 150,
            collision_clearance_deg: 1.5,
            radius_bucket_mm: 0.1,
            allowable_stress_fraction: 0.65,
            allowable_stress_min_mpa: 300.0,
            allowable_stress_max_mpa: 1200.0,
            fallback_tensile_strength_mpa: 1400.0,
            transition_epsilon_deg: 0.01,
            slope_window_deg: 0.75,
            transition_merge_tolerance_deg: 0.05,
            jump_ratio: Thresholds::new(0.30, 0.60),
            slope_jump_fraction: Thresholds::new(0.10, 0.25),
            gap_deg: Thresholds::new(0.5, 2.0),
            overlap_deg: Thresholds::new(2.0, 6.0),
            safety_ratio: Thresholds::new(0.8, 1.0),
        }
    }
}

impl TorsionalPolicy {
    /// Create the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rigid end-stop stiffness multiplier
    pub fn with_rigid_stop_multiplier(mut self, multiplier: f64) -> Self {
        self.rigid_stop_multiplier = multiplier;
        self
    }

    /// Set the number of curve samples
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the sweep margin
    pub fn with_sweep_margin(mut self, margin: f64) -> Self {
        self.sweep_margin = margin;
        self
    }

    /// Set the collision clearance angle (deg)
    pub fn with_collision_clearance_deg(mut self, clearance_deg: f64) -> Self {
        self.collision_clearance_deg = clearance_deg;
        self
    }

    /// Set the preferred spring index range
    pub fn with_spring_index_range(mut self, min: f64, max: f64) -> Self {
        self.spring_index_min = min;
        self.spring_index_max = max;
        self
    }

    /// Set the slope estimation window (deg)
    pub fn with_slope_window_deg(mut self, window_deg: f64) -> Self {
        self.slope_window_deg = window_deg;
        self
    }

    /// Allowable shear stress for a material of the given tensile strength
    pub fn allowable_stress_mpa(&self, tensile_strength_mpa: f64) -> f64 {
        (self.allowable_stress_fraction * tensile_strength_mpa)
            .clamp(self.allowable_stress_min_mpa, self.allowable_stress_max_mpa)
    }

    /// Reject policies that would make the engine divide by zero or loop forever.
    pub fn validate(&self) -> CalcResult<()> {
        let positive = [
            ("policy.rigid_stop_multiplier", self.rigid_stop_multiplier),
            ("policy.sweep_margin", self.sweep_margin),
            ("policy.radius_bucket_mm", self.radius_bucket_mm),
            ("policy.allowable_stress_fraction", self.allowable_stress_fraction),
            ("policy.allowable_stress_min_mpa", self.allowable_stress_min_mpa),
            ("policy.fallback_tensile_strength_mpa", self.fallback_tensile_strength_mpa),
            ("policy.transition_epsilon_deg", self.transition_epsilon_deg),
            ("policy.slope_window_deg", self.slope_window_deg),
            ("policy.transition_merge_tolerance_deg", self.transition_merge_tolerance_deg),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Must be positive and finite"));
            }
        }

        if self.sample_count < 2 {
            return Err(CalcError::invalid_input(
                "policy.sample_count",
                self.sample_count.to_string(),
                "At least two samples are needed to span the sweep",
            ));
        }
        if !(self.collision_clearance_deg.is_finite() && self.collision_clearance_deg >= 0.0) {
            return Err(CalcError::invalid_input(
                "policy.collision_clearance_deg",
                self.collision_clearance_deg.to_string(),
                "Clearance angle cannot be negative",
            ));
        }
        if !(self.spring_index_min.is_finite() && self.spring_index_max.is_finite())
            || self.spring_index_min > self.spring_index_max
        {
            return Err(CalcError::invalid_input(
                "policy.spring_index_min",
                format!("{}..{}", self.spring_index_min, self.spring_index_max),
                "Spring index range must be finite with min <= max",
            ));
        }
        if !(self.allowable_stress_max_mpa.is_finite()) || self.allowable_stress_max_mpa < self.allowable_stress_min_mpa {
            return Err(CalcError::invalid_input(
                "policy.allowable_stress_max_mpa",
                self.allowable_stress_max_mpa.to_string(),
                "Allowable stress ceiling must be finite and >= floor",
            ));
        }

        self.jump_ratio.validate("policy.jump_ratio")?;
        self.slope_jump_fraction.validate("policy.slope_jump_fraction")?;
        self.gap_deg.validate("policy.gap_deg")?;
        self.overlap_deg.validate("policy.overlap_deg")?;
        self.safety_ratio.validate("policy.safety_ratio")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = TorsionalPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.sample_count, 150);
        assert_eq!(policy.rigid_stop_multiplier, 1000.0);
        assert_eq!(policy.collision_clearance_deg, 1.5);
    }

    #[test]
    fn test_allowable_stress_clamped() {
        let policy = TorsionalPolicy::default();
        // 0.65 * 1500 = 975, inside the band
        assert!((policy.allowable_stress_mpa(1500.0) - 975.0).abs() < 1e-9);
        // 0.65 * 2500 = 1625, clamped down
        assert_eq!(policy.allowable_stress_mpa(2500.0), 1200.0);
        // 0.65 * 200 = 130, clamped up
        assert_eq!(policy.allowable_stress_mpa(200.0), 300.0);
    }

    #[test]
    fn test_rejects_single_sample() {
        let policy = TorsionalPolicy::new().with_sample_count(1);
        let err = policy.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut policy = TorsionalPolicy::new();
        policy.gap_deg = Thresholds::new(3.0, 1.0);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_multiplier() {
        let policy = TorsionalPolicy::new().with_rigid_stop_multiplier(0.0);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let policy: TorsionalPolicy = serde_json::from_str(r#"{ "sample_count": 40 }"#).unwrap();
        assert_eq!(policy.sample_count, 40);
        assert_eq!(policy.jump_ratio, Thresholds::new(0.30, 0.60));
    }
}
