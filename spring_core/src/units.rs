//! # Unit Types
//!
//! Type-safe wrappers for engineering units. These provide compile-time
//! safety against unit confusion while remaining lightweight (just f64 wrappers).
//!
//! ## SI Units (Primary)
//!
//! Spring design is done in metric units throughout:
//! - Length: millimeters (mm)
//! - Angle: degrees (deg), radians (rad)
//! - Force: newtons (N)
//! - Torque: newton-meters (N·m), newton-millimeters (N·mm)
//! - Stress: megapascals (MPa = N/mm²)
//!
//! ## Angle / Stroke Convention
//!
//! A circumferential spring at mounting radius `R` is compressed along the arc
//! it sits on, so rotation and stroke are related by the arc length:
//!
//! ```text
//! stroke_mm = θ_deg · (π/180) · R_mm
//! θ_deg     = (stroke_mm / R_mm) · (180/π)
//! ```
//!
//! [`stroke_from_angle`] and [`angle_from_stroke`] are the only place it is
//! written down.
//!
//! ## Torque / Force Convention
//!
//! A torque carried by springs at radius `R` appears as a tangential force:
//!
//! ```text
//! F_N = T_Nm · 1000 / R_mm
//! ```
//!
//! ## Example
//!
//! ```rust
//! use spring_core::units::{angle_from_stroke, stroke_from_angle, Degrees, Millimeters, Radians};
//!
//! let turn = Degrees(180.0);
//! let rad: Radians = turn.into();
//! assert!((rad.0 - std::f64::consts::PI).abs() < 1e-12);
//!
//! let stroke = stroke_from_angle(Degrees(10.0), Millimeters(100.0));
//! let back = angle_from_stroke(stroke, Millimeters(100.0));
//! assert!((back.0 - 10.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length Units
// ============================================================================

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

// ============================================================================
// Angle Units
// ============================================================================

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0.to_radians())
    }
}

impl From<Radians> for Degrees {
    fn from(rad: Radians) -> Self {
        Degrees(rad.0.to_degrees())
    }
}

// ============================================================================
// Force Units
// ============================================================================

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

// ============================================================================
// Torque Units
// ============================================================================

/// Torque in newton-meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMeters(pub f64);

/// Torque in newton-millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewtonMillimeters(pub f64);

impl From<NewtonMeters> for NewtonMillimeters {
    fn from(nm: NewtonMeters) -> Self {
        NewtonMillimeters(nm.0 * 1000.0)
    }
}

impl From<NewtonMillimeters> for NewtonMeters {
    fn from(nmm: NewtonMillimeters) -> Self {
        NewtonMeters(nmm.0 / 1000.0)
    }
}

// ============================================================================
// Stress Units
// ============================================================================

/// Stress in megapascals (N/mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MegaPascals(pub f64);

// ============================================================================
// Angle <-> Stroke
// ============================================================================

/// Arc-length stroke of a spring at `radius` when the system rotates by `angle`.
pub fn stroke_from_angle(angle: Degrees, radius: Millimeters) -> Millimeters {
    let rad: Radians = angle.into();
    Millimeters(rad.0 * radius.0)
}

/// Rotation that compresses a spring at `radius` by `stroke`.
///
/// Callers must ensure `radius` is positive; a zero radius yields a non-finite angle.
pub fn angle_from_stroke(stroke: Millimeters, radius: Millimeters) -> Degrees {
    Radians(stroke.0 / radius.0).into()
}

// ============================================================================
// Torque <-> Force
// ============================================================================

/// Tangential force that carries `torque` at `radius`.
pub fn force_at_radius(torque: NewtonMeters, radius: Millimeters) -> Newtons {
    let nmm: NewtonMillimeters = torque.into();
    Newtons(nmm.0 / radius.0)
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Millimeters);
impl_arithmetic!(Degrees);
impl_arithmetic!(Radians);
impl_arithmetic!(Newtons);
impl_arithmetic!(NewtonMeters);
impl_arithmetic!(NewtonMillimeters);
impl_arithmetic!(MegaPascals);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_degrees_to_radians() {
        let rad: Radians = Degrees(90.0).into();
        assert_relative_eq!(rad.0, std::f64::consts::FRAC_PI_2);
        let deg: Degrees = rad.into();
        assert_relative_eq!(deg.0, 90.0);
    }

    #[test]
    fn test_torque_conversion() {
        let nmm: NewtonMillimeters = NewtonMeters(2.5).into();
        assert_eq!(nmm.0, 2500.0);
        let nm: NewtonMeters = nmm.into();
        assert_eq!(nm.0, 2.5);
    }

    #[test]
    fn test_force_at_radius() {
        // 60 N·m at R = 100 mm is 600 N of tangential force
        let f = force_at_radius(NewtonMeters(60.0), Millimeters(100.0));
        assert_relative_eq!(f.0, 600.0);
        // Split over 6 springs
        assert_relative_eq!((f / 6.0).0, 100.0);
    }

    #[test]
    fn test_stroke_from_angle() {
        // One radian of rotation at R = 100 mm is 100 mm of arc
        let stroke = stroke_from_angle(Radians(1.0).into(), Millimeters(100.0));
        assert_relative_eq!(stroke.0, 100.0, epsilon = 1e-9);

        // 10° at R = 100 mm
        let stroke = stroke_from_angle(Degrees(10.0), Millimeters(100.0));
        assert_relative_eq!(stroke.0, 10.0 * std::f64::consts::PI / 180.0 * 100.0);
    }

    #[test]
    fn test_angle_from_stroke_inverse() {
        for &(deg, r) in &[(0.5, 40.0), (12.0, 85.0), (37.5, 120.0)] {
            let stroke = stroke_from_angle(Degrees(deg), Millimeters(r));
            let back = angle_from_stroke(stroke, Millimeters(r));
            assert_relative_eq!(back.0, deg, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Degrees(10.0);
        let b = Degrees(4.0);
        assert_eq!((a + b).0, 14.0);
        assert_eq!((a - b).0, 6.0);
        assert_eq!((a * 2.0).0, 20.0);
        assert_eq!((a / 2.0).0, 5.0);
    }

    #[test]
    fn test_serialization() {
        let stress = MegaPascals(812.5);
        let json = serde_json::to_string(&stress).unwrap();
        assert_eq!(json, "812.5");

        let roundtrip: MegaPascals = serde_json::from_str(&json).unwrap();
        assert_eq!(stress, roundtrip);
    }
}
