//! Spring Wire Materials
//!
//! Nominal properties for the common round spring wires. Tensile strength of
//! drawn wire rises as diameter falls; the values here are representative of
//! 3–6 mm wire, the range used in clutch damper springs.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Standard spring wire grades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpringWire {
    /// Music wire (ASTM A228)
    #[serde(rename = "A228")]
    MusicWire,
    /// Oil-tempered carbon steel (ASTM A229)
    #[serde(rename = "A229")]
    OilTempered,
    /// Chrome-vanadium (ASTM A231)
    #[serde(rename = "A231")]
    ChromeVanadium,
    /// Chrome-silicon (ASTM A401)
    #[serde(rename = "A401")]
    ChromeSilicon,
    /// Stainless 302 (ASTM A313)
    #[serde(rename = "A313-302")]
    Stainless302,
    /// Precipitation-hardened stainless 17-7 PH (ASTM A313 type 631)
    #[serde(rename = "A313-631")]
    Stainless17_7Ph,
}

/// Alias table for flexible parsing, keyed by normalized spelling.
static WIRE_ALIASES: Lazy<HashMap<&'static str, SpringWire>> = Lazy::new(|| {
    let mut aliases = HashMap::new();
    for wire in SpringWire::ALL {
        for alias in wire.aliases() {
            aliases.insert(*alias, wire);
        }
    }
    aliases
});

impl SpringWire {
    /// All wire grades for UI selection
    pub const ALL: [SpringWire; 6] = [
        SpringWire::MusicWire,
        SpringWire::OilTempered,
        SpringWire::ChromeVanadium,
        SpringWire::ChromeSilicon,
        SpringWire::Stainless302,
        SpringWire::Stainless17_7Ph,
    ];

    /// ASTM designation
    pub fn code(&self) -> &'static str {
        match self {
            SpringWire::MusicWire => "A228",
            SpringWire::OilTempered => "A229",
            SpringWire::ChromeVanadium => "A231",
            SpringWire::ChromeSilicon => "A401",
            SpringWire::Stainless302 => "A313-302",
            SpringWire::Stainless17_7Ph => "A313-631",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            SpringWire::MusicWire => &["A228", "MUSIC-WIRE", "MUSIC", "SWP-A", "SWP-B"],
            SpringWire::OilTempered => &["A229", "OIL-TEMPERED", "OT", "SWO-A"],
            SpringWire::ChromeVanadium => &["A231", "CHROME-VANADIUM", "CRV", "CR-V", "50CRV4", "SWOCV-V"],
            SpringWire::ChromeSilicon => &["A401", "CHROME-SILICON", "CRSI", "CR-SI", "55CRSI", "SWOSC-V"],
            SpringWire::Stainless302 => &["A313-302", "A313", "302", "SS302", "SUS302", "STAINLESS-302"],
            SpringWire::Stainless17_7Ph => &["A313-631", "17-7PH", "17-7-PH", "631", "SUS631"],
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        WIRE_ALIASES
            .get(normalize_material_id(s).as_str())
            .copied()
            .ok_or_else(|| CalcError::material_not_found(s))
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SpringWire::MusicWire => "Music Wire (A228)",
            SpringWire::OilTempered => "Oil-Tempered (A229)",
            SpringWire::ChromeVanadium => "Chrome-Vanadium (A231)",
            SpringWire::ChromeSilicon => "Chrome-Silicon (A401)",
            SpringWire::Stainless302 => "Stainless 302 (A313)",
            SpringWire::Stainless17_7Ph => "Stainless 17-7 PH (A313)",
        }
    }

    /// Nominal properties for this grade
    pub fn properties(&self) -> SpringWireProperties {
        // (Sut MPa, G MPa, E MPa)
        let (sut, g, e) = match self {
            SpringWire::MusicWire => (1900.0, 81_700.0, 207_000.0),
            SpringWire::OilTempered => (1550.0, 77_200.0, 196_500.0),
            SpringWire::ChromeVanadium => (1650.0, 77_200.0, 203_400.0),
            SpringWire::ChromeSilicon => (1900.0, 77_200.0, 203_400.0),
            SpringWire::Stainless302 => (1550.0, 69_000.0, 193_000.0),
            SpringWire::Stainless17_7Ph => (1650.0, 75_800.0, 203_400.0),
        };
        SpringWireProperties {
            wire: *self,
            tensile_strength_mpa: sut,
            shear_modulus_mpa: g,
            elastic_modulus_mpa: e,
        }
    }
}

impl std::fmt::Display for SpringWire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Nominal mechanical properties of a spring wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringWireProperties {
    /// Grade
    pub wire: SpringWire,
    /// Minimum tensile strength Sut (MPa)
    pub tensile_strength_mpa: f64,
    /// Shear modulus G (MPa)
    pub shear_modulus_mpa: f64,
    /// Young's modulus E (MPa)
    pub elastic_modulus_mpa: f64,
}

/// Upper-case and unify separators so "chrome silicon" == "CHROME-SILICON".
pub(crate) fn normalize_material_id(s: &str) -> String {
    s.trim().to_uppercase().replace([' ', '_'], "-")
}
