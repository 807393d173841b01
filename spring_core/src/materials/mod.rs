//! # Materials
//!
//! The torsional engine never embeds material data. It asks a
//! [`MaterialLookup`] collaborator for a tensile strength and falls back to a
//! policy value (with a warning) when the lookup fails.
//!
//! [`SpringMaterialDb`] is the stock collaborator: the standard spring wire
//! grades plus any project-specific entries the caller registers.
//!
//! ## Example
//!
//! ```rust
//! use spring_core::materials::{MaterialLookup, SpringMaterialDb};
//!
//! let db = SpringMaterialDb::standard().with_material("VENDOR-X-CRSI", 2050.0);
//!
//! assert_eq!(db.tensile_strength_mpa("chrome silicon").unwrap(), 1900.0);
//! assert_eq!(db.tensile_strength_mpa("vendor-x-crsi").unwrap(), 2050.0);
//! assert!(db.tensile_strength_mpa("unobtainium").is_err());
//! ```

pub mod spring_wire;

pub use spring_wire::{SpringWire, SpringWireProperties};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use spring_wire::normalize_material_id;

/// Material property lookup used by the reference evaluator.
pub trait MaterialLookup {
    /// Tensile strength Sut in MPa, or `MaterialNotFound`.
    fn tensile_strength_mpa(&self, material: &str) -> CalcResult<f64>;
}

/// Standard spring wires plus caller-registered materials.
///
/// Custom entries shadow standard grades with the same normalized id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpringMaterialDb {
    custom: HashMap<String, f64>,
}

impl SpringMaterialDb {
    /// Database with only the standard wire grades
    pub fn standard() -> Self {
        Self::default()
    }

    /// Register a custom material by id and tensile strength (MPa)
    pub fn with_material(mut self, id: impl AsRef<str>, tensile_strength_mpa: f64) -> Self {
        self.custom
            .insert(normalize_material_id(id.as_ref()), tensile_strength_mpa);
        self
    }

    /// Number of custom entries
    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }
}

impl MaterialLookup for SpringMaterialDb {
    fn tensile_strength_mpa(&self, material: &str) -> CalcResult<f64> {
        if let Some(&sut) = self.custom.get(&normalize_material_id(material)) {
            return Ok(sut);
        }
        SpringWire::from_str_flexible(material).map(|wire| wire.properties().tensile_strength_mpa)
    }
}

/// A lookup that knows nothing; every query falls back to policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMaterials;

impl MaterialLookup for NoMaterials {
    fn tensile_strength_mpa(&self, material: &str) -> CalcResult<f64> {
        Err(CalcError::material_not_found(material))
    }
}

impl<T: MaterialLookup + ?Sized> MaterialLookup for &T {
    fn tensile_strength_mpa(&self, material: &str) -> CalcResult<f64> {
        (**self).tensile_strength_mpa(material)
    }
}
