//! Design input: spring groups and the system they form.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

fn default_enabled() -> bool {
    true
}

/// A set of identical circumferential springs acting in parallel at one radius.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "stage-1",
///   "spring_count": 6,
///   "rate_n_per_mm": 10.0,
///   "radius_mm": 100.0,
///   "engage_angle_deg": 0.0,
///   "wire_diameter_mm": 3.5,
///   "mean_diameter_mm": 18.0,
///   "free_length_mm": 60.0,
///   "solid_length_mm": 30.0,
///   "clearance_mm": 1.0,
///   "material": "A401"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringGroup {
    /// Group identity, unique within a design
    pub id: String,

    /// Disabled groups are ignored by every component
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Stage this group belongs to. Groups without one form their own stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<u32>,

    /// Number of springs n in the group
    pub spring_count: u32,

    /// Axial rate k of one spring (N/mm)
    pub rate_n_per_mm: f64,

    /// Mounting radius R (mm)
    pub radius_mm: f64,

    /// Rotation at which the group starts resisting torque (deg)
    pub engage_angle_deg: f64,

    /// Wire diameter d (mm)
    pub wire_diameter_mm: f64,

    /// Mean coil diameter Dm (mm)
    pub mean_diameter_mm: f64,

    /// Free length (mm)
    pub free_length_mm: f64,

    /// Solid length (mm)
    pub solid_length_mm: f64,

    /// Mechanical clearance kept short of solid (mm)
    #[serde(default)]
    pub clearance_mm: f64,

    /// Material id handed to the material lookup
    pub material: String,
}

impl SpringGroup {
    /// Fatal input checks. Disabled groups are still checked when this is called
    /// directly; [`SystemDesign::validate`] only calls it for enabled groups.
    pub fn validate(&self) -> CalcResult<()> {
        if self.spring_count == 0 {
            return Err(CalcError::invalid_input(
                self.field("spring_count"),
                "0",
                "A group needs at least one spring",
            ));
        }

        let positive = [
            ("rate_n_per_mm", self.rate_n_per_mm, "Spring rate must be positive"),
            ("radius_mm", self.radius_mm, "Mounting radius must be positive"),
            ("wire_diameter_mm", self.wire_diameter_mm, "Wire diameter must be positive"),
            ("mean_diameter_mm", self.mean_diameter_mm, "Mean coil diameter must be positive"),
        ];
        for (name, value, reason) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(self.field(name), value.to_string(), reason));
            }
        }

        let finite = [
            ("engage_angle_deg", self.engage_angle_deg),
            ("free_length_mm", self.free_length_mm),
            ("solid_length_mm", self.solid_length_mm),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(CalcError::invalid_input(self.field(name), value.to_string(), "Must be finite"));
            }
        }

        if !(self.clearance_mm.is_finite() && self.clearance_mm >= 0.0) {
            return Err(CalcError::invalid_input(
                self.field("clearance_mm"),
                self.clearance_mm.to_string(),
                "Clearance cannot be negative",
            ));
        }

        if self.usable_travel_mm() <= 0.0 {
            return Err(CalcError::degenerate_geometry(
                &self.id,
                format!(
                    "free length {} mm leaves no travel above solid {} mm + clearance {} mm",
                    self.free_length_mm, self.solid_length_mm, self.clearance_mm
                ),
            ));
        }
        Ok(())
    }

    /// Compression available before the springs go solid: L_free − L_solid − clearance
    pub fn usable_travel_mm(&self) -> f64 {
        self.free_length_mm - self.solid_length_mm - self.clearance_mm
    }

    /// Outer coil diameter Dm + d
    pub fn outer_diameter_mm(&self) -> f64 {
        self.mean_diameter_mm + self.wire_diameter_mm
    }

    /// Spring index C = Dm / d
    pub fn spring_index(&self) -> f64 {
        self.mean_diameter_mm / self.wire_diameter_mm
    }

    fn field(&self, name: &str) -> String {
        format!("groups[{}].{}", self.id, name)
    }
}

/// Where a customer operating angle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleSource {
    /// Taken from a customer drawing
    Drawing,
    /// Taken from a customer specification
    Spec,
    /// Assumed by the designer
    Assumed,
    /// No operating angle supplied
    #[default]
    NotProvided,
}

impl AngleSource {
    /// Display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            AngleSource::Drawing => "customer drawing",
            AngleSource::Spec => "customer spec",
            AngleSource::Assumed => "assumed",
            AngleSource::NotProvided => "not provided",
        }
    }
}

/// A complete torsional spring system.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Clutch damper",
///   "groups": [ { "id": "stage-1", "...": "..." } ],
///   "friction_torque_nm": 2.0,
///   "reference_angle_deg": 12.0,
///   "operating_angle_deg": 10.0,
///   "operating_angle_source": "drawing"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDesign {
    /// User label for the system
    #[serde(default)]
    pub label: String,

    /// Spring groups, in engagement order by convention
    pub groups: Vec<SpringGroup>,

    /// System friction torque Tf (N·m)
    #[serde(default)]
    pub friction_torque_nm: f64,

    /// Angle at which exact per-group results are reported (deg)
    pub reference_angle_deg: f64,

    /// Customer operating angle (deg), if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_angle_deg: Option<f64>,

    /// Provenance of `operating_angle_deg`
    #[serde(default)]
    pub operating_angle_source: AngleSource,
}

impl SystemDesign {
    /// Create a design with no friction and no operating angle
    pub fn new(label: impl Into<String>, groups: Vec<SpringGroup>, reference_angle_deg: f64) -> Self {
        Self {
            label: label.into(),
            groups,
            friction_torque_nm: 0.0,
            reference_angle_deg,
            operating_angle_deg: None,
            operating_angle_source: AngleSource::NotProvided,
        }
    }

    /// Set the friction torque (N·m)
    pub fn with_friction(mut self, friction_torque_nm: f64) -> Self {
        self.friction_torque_nm = friction_torque_nm;
        self
    }

    /// Set the customer operating angle and where it came from
    pub fn with_operating_angle(mut self, angle_deg: f64, source: AngleSource) -> Self {
        self.operating_angle_deg = Some(angle_deg);
        self.operating_angle_source = source;
        self
    }

    /// Enabled groups in list order
    pub fn enabled_groups(&self) -> impl Iterator<Item = &SpringGroup> {
        self.groups.iter().filter(|g| g.enabled)
    }

    /// Operating angle, only when its provenance is known
    pub fn known_operating_angle(&self) -> Option<f64> {
        match self.operating_angle_source {
            AngleSource::NotProvided => None,
            _ => self.operating_angle_deg,
        }
    }

    /// Fatal input checks for the whole system.
    pub fn validate(&self) -> CalcResult<()> {
        if self.enabled_groups().next().is_none() {
            return Err(CalcError::missing_field("groups (no enabled spring group)"));
        }

        let mut seen = std::collections::HashSet::new();
        for group in self.enabled_groups() {
            if !seen.insert(group.id.as_str()) {
                return Err(CalcError::invalid_input(
                    "groups.id",
                    group.id.clone(),
                    "Group ids must be unique",
                ));
            }
            group.validate()?;
        }

        if !(self.friction_torque_nm.is_finite() && self.friction_torque_nm >= 0.0) {
            return Err(CalcError::invalid_input(
                "friction_torque_nm",
                self.friction_torque_nm.to_string(),
                "Friction torque cannot be negative",
            ));
        }
        if !(self.reference_angle_deg.is_finite() && self.reference_angle_deg >= 0.0) {
            return Err(CalcError::invalid_input(
                "reference_angle_deg",
                self.reference_angle_deg.to_string(),
                "Reference angle must be finite and non-negative",
            ));
        }
        if let Some(angle) = self.operating_angle_deg {
            if !angle.is_finite() {
                return Err(CalcError::invalid_input(
                    "operating_angle_deg",
                    angle.to_string(),
                    "Operating angle must be finite",
                ));
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_valid_group() {
        assert!(group("g", 0.0, 10.0).validate().is_ok());
    }

    #[test]
    fn test_zero_springs_rejected() {
        let mut g = group("g", 0.0, 10.0);
        g.spring_count = 0;
        assert_eq!(g.validate().unwrap_err().error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_non_finite_radius_rejected() {
        let mut g = group("g", 0.0, 10.0);
        g.radius_mm = f64::NAN;
        assert!(g.validate().is_err());
        g.radius_mm = -5.0;
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_no_travel_rejected() {
        let mut g = group("g", 0.0, 10.0);
        g.free_length_mm = 31.0;
        g.clearance_mm = 1.0;
        let err = g.validate().unwrap_err();
        assert_eq!(err.error_code(), "DEGENERATE_GEOMETRY");
    }

    #[test]
    fn test_disabled_invalid_group_ignored() {
        let mut design = two_stage();
        let mut broken = group("off", 0.0, 10.0);
        broken.enabled = false;
        broken.radius_mm = 0.0;
        design.groups.push(broken);
        assert!(design.validate().is_ok());
    }

    #[test]
    fn test_no_enabled_groups() {
        let mut design = two_stage();
        for g in &mut design.groups {
            g.enabled = false;
        }
        assert_eq!(design.validate().unwrap_err().error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let design = SystemDesign::new("dup", vec![group("a", 0.0, 10.0), group("a", 5.0, 10.0)], 5.0);
        assert!(design.validate().is_err());
    }

    #[test]
    fn test_negative_friction_rejected() {
        let design = two_stage().with_friction(-1.0);
        assert!(design.validate().is_err());
    }

    #[test]
    fn test_known_operating_angle() {
        let design = two_stage().with_operating_angle(12.0, AngleSource::Drawing);
        assert_eq!(design.known_operating_angle(), Some(12.0));

        let design = two_stage().with_operating_angle(12.0, AngleSource::NotProvided);
        assert_eq!(design.known_operating_angle(), None);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "groups": [{
                "id": "g1", "spring_count": 4, "rate_n_per_mm": 25.0, "radius_mm": 80.0,
                "engage_angle_deg": 0.0, "wire_diameter_mm": 4.0, "mean_diameter_mm": 20.0,
                "free_length_mm": 50.0, "solid_length_mm": 28.0, "material": "A228"
            }],
            "reference_angle_deg": 8.0
        }"#;
        let design: SystemDesign = serde_json::from_str(json).unwrap();
        assert!(design.groups[0].enabled);
        assert_eq!(design.groups[0].clearance_mm, 0.0);
        assert_eq!(design.friction_torque_nm, 0.0);
        assert_eq!(design.operating_angle_source, AngleSource::NotProvided);
        assert!(design.validate().is_ok());
    }
}
