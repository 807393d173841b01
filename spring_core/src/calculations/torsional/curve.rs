//! # System Curve Generator
//!
//! Sweeps the rotation angle from zero to a little past the system stop (or
//! the reference angle, whichever is larger) and records loaded torque,
//! unloaded torque and instantaneous stiffness at each sample.
//!
//! ```text
//! θ_max = margin · max(system stop, reference angle)
//! θ_i   = θ_max · i / (samples − 1),   i = 0 ..= samples − 1
//! ```
//!
//! Every sample comes from [`DerivedSystem::evaluate`], so the curve, the
//! reference evaluation and the transition probes all share one rule.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::group::DerivedSystem;
use crate::policy::TorsionalPolicy;
use crate::units::{Degrees, Radians};

/// One sample of the torque/angle characteristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Rotation (deg)
    pub angle_deg: f64,
    /// Loading-branch torque (N·m)
    pub loaded_torque_nm: f64,
    /// Unloading-branch torque (N·m)
    pub unloaded_torque_nm: f64,
    /// Instantaneous stiffness (N·m/deg)
    pub stiffness_nm_per_deg: f64,
    /// Ids of the groups carrying load
    pub active_groups: Vec<String>,
}

/// The swept torque characteristic of a system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemCurve {
    /// Samples in ascending angle order
    pub points: Vec<CurvePoint>,
    /// min θ_stop over enabled groups (deg)
    pub system_stop_deg: f64,
    /// Last sampled angle (deg)
    pub max_angle_deg: f64,
    /// Whether the reference angle lies past the system stop
    pub reference_beyond_stop: bool,
}

impl SystemCurve {
    /// Loaded torque at `angle_deg`, linearly interpolated between samples.
    ///
    /// Angles outside the sweep are clamped to the first/last sample.
    pub fn torque_at(&self, angle_deg: f64) -> f64 {
        let points = &self.points;
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if angle_deg <= first.angle_deg {
            return first.loaded_torque_nm;
        }
        if angle_deg >= last.angle_deg {
            return last.loaded_torque_nm;
        }

        // First sample strictly above the angle; guaranteed in 1..len by the clamps
        let hi = points.partition_point(|p| p.angle_deg <= angle_deg);
        let (a, b) = (&points[hi - 1], &points[hi]);
        let span = b.angle_deg - a.angle_deg;
        if span <= 0.0 {
            return a.loaded_torque_nm;
        }
        let t = (angle_deg - a.angle_deg) / span;
        a.loaded_torque_nm + t * (b.loaded_torque_nm - a.loaded_torque_nm)
    }

    /// Torque slope around `center_deg`: central difference over ±`half_window_deg`.
    pub fn slope_at(&self, center_deg: f64, half_window_deg: f64) -> f64 {
        let delta = self.torque_at(center_deg + half_window_deg) - self.torque_at(center_deg - half_window_deg);
        delta / (2.0 * half_window_deg)
    }

    /// Highest loaded torque in the sweep (N·m)
    pub fn peak_torque_nm(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.loaded_torque_nm)
            .fold(0.0, f64::max)
    }

    /// Energy dissipated per load/unload cycle over the sweep (J).
    ///
    /// Trapezoidal area between the loading and unloading branches.
    pub fn hysteresis_energy_j(&self) -> f64 {
        let area_nm_deg: f64 = self
            .points
            .windows(2)
            .map(|w| {
                let band_a = w[0].loaded_torque_nm - w[0].unloaded_torque_nm;
                let band_b = w[1].loaded_torque_nm - w[1].unloaded_torque_nm;
                0.5 * (band_a + band_b) * (w[1].angle_deg - w[0].angle_deg)
            })
            .sum();
        let rad: Radians = Degrees(area_nm_deg).into();
        rad.0
    }
}

/// Sweep the system and build its torque curve.
pub fn generate_curve(system: &DerivedSystem, reference_angle_deg: f64, policy: &TorsionalPolicy) -> SystemCurve {
    let max_angle_deg = policy.sweep_margin * system.system_stop_deg.max(reference_angle_deg);
    let last = policy.sample_count.saturating_sub(1).max(1);

    let points: Vec<CurvePoint> = (0..=last)
        .map(|i| {
            let angle = max_angle_deg * i as f64 / last as f64;
            let state = system.evaluate(angle);
            CurvePoint {
                angle_deg: angle,
                loaded_torque_nm: state.loaded_torque_nm,
                unloaded_torque_nm: state.unloaded_torque_nm,
                stiffness_nm_per_deg: state.stiffness_nm_per_deg,
                active_groups: state
                    .active
                    .iter()
                    .map(|&g| system.groups[g].id().to_string())
                    .collect(),
            }
        })
        .collect();

    debug!(
        samples = points.len(),
        max_angle_deg,
        system_stop_deg = system.system_stop_deg,
        "Generated system curve"
    );

    SystemCurve {
        points,
        system_stop_deg: system.system_stop_deg,
        max_angle_deg,
        reference_beyond_stop: reference_angle_deg > system.system_stop_deg,
    }
}

#[cfg(test)]
mod tests {
    use super::super::design::fixtures::{group, two_stage};
    use super::super::design::SystemDesign;
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn curve_for(design: &SystemDesign, policy: &TorsionalPolicy) -> (DerivedSystem, SystemCurve) {
        let system = DerivedSystem::derive(design, policy).unwrap();
        let curve = generate_curve(&system, design.reference_angle_deg, policy);
        (system, curve)
    }

    #[test]
    fn test_sample_count_and_domain() {
        let policy = TorsionalPolicy::default();
        let (system, curve) = curve_for(&two_stage(), &policy);
        assert_eq!(curve.points.len(), 150);
        assert_eq!(curve.points[0].angle_deg, 0.0);
        assert_relative_eq!(curve.max_angle_deg, 1.2 * system.system_stop_deg);
        assert_relative_eq!(curve.points.last().unwrap().angle_deg, curve.max_angle_deg);
        assert!(!curve.reference_beyond_stop);
    }

    #[test]
    fn test_reference_extends_domain() {
        let policy = TorsionalPolicy::default();
        let mut design = two_stage();
        design.reference_angle_deg = 30.0;
        let (_, curve) = curve_for(&design, &policy);
        assert_relative_eq!(curve.max_angle_deg, 36.0);
        assert!(curve.reference_beyond_stop);
    }

    #[test]
    fn test_active_groups_recorded() {
        let (_, curve) = curve_for(&two_stage(), &TorsionalPolicy::default());
        let early = curve.points.iter().find(|p| p.angle_deg > 1.0 && p.angle_deg < 9.0).unwrap();
        assert_eq!(early.active_groups, vec!["g1".to_string()]);
        let late = curve.points.iter().find(|p| p.angle_deg > 11.0 && p.angle_deg < 17.0).unwrap();
        assert_eq!(late.active_groups, vec!["g1".to_string(), "g2".to_string()]);
    }

    #[test]
    fn test_rigid_stiffness_past_stop() {
        let policy = TorsionalPolicy::default();
        let (system, curve) = curve_for(&two_stage(), &policy);
        for p in curve.points.iter().filter(|p| p.angle_deg > system.system_stop_deg) {
            assert_relative_eq!(
                p.stiffness_nm_per_deg,
                system.total_nominal_stiffness_nm_per_deg * policy.rigid_stop_multiplier
            );
        }
    }

    #[test]
    fn test_torque_interpolation_is_exact_on_linear_segment() {
        let design = SystemDesign::new("single", vec![group("g", 0.0, 10.0)], 5.0);
        let (system, curve) = curve_for(&design, &TorsionalPolicy::default());
        let k = system.groups[0].angular_stiffness_nm_per_deg;
        assert_relative_eq!(curve.torque_at(3.3), k * 3.3, max_relative = 1e-9);
        assert_relative_eq!(curve.slope_at(6.0, 0.75), k, max_relative = 1e-9);
        // Clamped below the domain
        assert_eq!(curve.torque_at(-5.0), 0.0);
    }

    #[test]
    fn test_hysteresis_energy() {
        // Constant band of 2·Tf once loaded torque exceeds Tf
        let design = SystemDesign::new("single", vec![group("g", 0.0, 10.0)], 5.0).with_friction(1.0);
        let (_, curve) = curve_for(&design, &TorsionalPolicy::default());
        assert!(curve.hysteresis_energy_j() > 0.0);

        let frictionless = SystemDesign::new("single", vec![group("g", 0.0, 10.0)], 5.0);
        let (_, curve) = curve_for(&frictionless, &TorsionalPolicy::default());
        assert_relative_eq!(curve.hysteresis_energy_j(), 0.0);
    }

    #[test]
    fn test_peak_torque() {
        let (_, curve) = curve_for(&two_stage(), &TorsionalPolicy::default());
        let last = curve.points.last().unwrap().loaded_torque_nm;
        assert_relative_eq!(curve.peak_torque_nm(), last);
    }

    proptest! {
        #[test]
        fn prop_curve_hysteresis_bounds(friction in 0.0f64..300.0, samples in 2usize..400) {
            let policy = TorsionalPolicy::new().with_sample_count(samples);
            let (_, curve) = curve_for(&two_stage().with_friction(friction), &policy);
            prop_assert_eq!(curve.points.len(), samples);
            for p in &curve.points {
                prop_assert!(p.unloaded_torque_nm <= p.loaded_torque_nm);
                if p.loaded_torque_nm <= friction {
                    prop_assert_eq!(p.unloaded_torque_nm, 0.0);
                }
            }
        }

        #[test]
        fn prop_loaded_torque_monotonic(samples in 2usize..300) {
            let policy = TorsionalPolicy::new().with_sample_count(samples);
            let (_, curve) = curve_for(&two_stage(), &policy);
            for w in curve.points.windows(2) {
                prop_assert!(w[1].loaded_torque_nm >= w[0].loaded_torque_nm);
            }
        }
    }
}
