//! # Collision Auditor
//!
//! Springs from different groups can only touch when they share a mounting
//! radius. Groups are bucketed by radius, every spring instance in a bucket is
//! placed on the circle, and each circular neighbour pair is checked for
//! enough angular room:
//!
//! ```text
//! instance angle = (θ_start + i · 360/n) mod 360
//! required gap   = mean(D_outer) / R · (180/π) + clearance angle
//! ```
//!
//! Springs of the same group are evenly pitched by construction and are never
//! reported against each other.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::group::{DerivedGroup, DerivedSystem};
use crate::policy::TorsionalPolicy;
use crate::units::{angle_from_stroke, Millimeters};

/// Gaps at or above this are a full-circle wrap of coincident springs.
const FULL_TURN_SNAP_DEG: f64 = 359.9;

/// One spring placed on its mounting circle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SpringInstance {
    group: usize,
    angle_deg: f64,
}

/// Groups sharing one mounting radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusBucket {
    /// Bucket radius, rounded to the policy resolution (mm)
    pub radius_mm: f64,
    /// Group ids in the bucket
    pub group_ids: Vec<String>,
    /// Spring instances placed on this circle
    pub instance_count: usize,
}

/// Two groups whose springs come too close on a shared radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionWarning {
    /// Bucket radius (mm)
    pub radius_mm: f64,
    /// First group (lower instance angle)
    pub group_a: String,
    /// Second group
    pub group_b: String,
    /// Angle of the group A spring in the tightest pair (deg)
    pub angle_a_deg: f64,
    /// Angle of the group B spring in the tightest pair (deg)
    pub angle_b_deg: f64,
    /// Tightest gap found between the two groups (deg)
    pub actual_gap_deg: f64,
    /// Gap needed for the coils plus clearance (deg)
    pub required_gap_deg: f64,
}

impl CollisionWarning {
    /// Human-readable description
    pub fn message(&self) -> String {
        format!(
            "Groups '{}' and '{}' at R = {:.1} mm: gap {:.2}° < required {:.2}°",
            self.group_a, self.group_b, self.radius_mm, self.actual_gap_deg, self.required_gap_deg
        )
    }
}

/// Result of the collision audit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionAudit {
    /// Every radius bucket, ascending
    pub buckets: Vec<RadiusBucket>,
    /// One warning per interfering group pair per bucket
    pub warnings: Vec<CollisionWarning>,
}

impl CollisionAudit {
    /// True when no interference was found
    pub fn passes(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Check every shared-radius bucket for inter-group interference.
pub fn audit_collisions(system: &DerivedSystem, policy: &TorsionalPolicy) -> CollisionAudit {
    let mut buckets: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, g) in system.groups.iter().enumerate() {
        let key = (g.group.radius_mm / policy.radius_bucket_mm).round() as i64;
        buckets.entry(key).or_default().push(i);
    }

    let mut audit = CollisionAudit::default();
    for (key, members) in buckets {
        let radius_mm = key as f64 * policy.radius_bucket_mm;
        let instances = place_instances(&system.groups, &members);

        audit.buckets.push(RadiusBucket {
            radius_mm,
            group_ids: members.iter().map(|&i| system.groups[i].id().to_string()).collect(),
            instance_count: instances.len(),
        });

        if members.len() < 2 {
            continue;
        }
        audit
            .warnings
            .extend(check_bucket(&system.groups, radius_mm, &instances, policy));
    }

    for w in &audit.warnings {
        warn!(
            radius_mm = w.radius_mm,
            group_a = %w.group_a,
            group_b = %w.group_b,
            gap_deg = w.actual_gap_deg,
            required_deg = w.required_gap_deg,
            "Spring collision risk"
        );
    }
    debug!(buckets = audit.buckets.len(), warnings = audit.warnings.len(), "Collision audit complete");
    audit
}

fn place_instances(groups: &[DerivedGroup], members: &[usize]) -> Vec<SpringInstance> {
    let mut instances: Vec<SpringInstance> = members
        .iter()
        .flat_map(|&gi| {
            let g = &groups[gi].group;
            let pitch = 360.0 / g.spring_count as f64;
            (0..g.spring_count).map(move |i| SpringInstance {
                group: gi,
                angle_deg: (g.engage_angle_deg + i as f64 * pitch).rem_euclid(360.0),
            })
        })
        .collect();
    instances.sort_by(|a, b| a.angle_deg.total_cmp(&b.angle_deg));
    instances
}

fn check_bucket(
    groups: &[DerivedGroup],
    radius_mm: f64,
    instances: &[SpringInstance],
    policy: &TorsionalPolicy,
) -> Vec<CollisionWarning> {
    // Tightest offending pair per (group, group), keyed in index order
    let mut worst: BTreeMap<(usize, usize), CollisionWarning> = BTreeMap::new();

    let len = instances.len();
    for i in 0..len {
        let a = instances[i];
        let b = instances[(i + 1) % len];
        if a.group == b.group {
            continue;
        }

        let mut gap = (b.angle_deg - a.angle_deg).rem_euclid(360.0);
        if gap >= FULL_TURN_SNAP_DEG {
            gap = 0.0;
        }

        let ga = &groups[a.group].group;
        let gb = &groups[b.group].group;
        let mean_outer = 0.5 * (ga.outer_diameter_mm() + gb.outer_diameter_mm());
        let mean_radius = 0.5 * (ga.radius_mm + gb.radius_mm);
        let required = angle_from_stroke(Millimeters(mean_outer), Millimeters(mean_radius)).0
            + policy.collision_clearance_deg;

        if gap >= required {
            continue;
        }

        let pair = (a.group.min(b.group), a.group.max(b.group));
        let candidate = CollisionWarning {
            radius_mm,
            group_a: ga.id.clone(),
            group_b: gb.id.clone(),
            angle_a_deg: a.angle_deg,
            angle_b_deg: b.angle_deg,
            actual_gap_deg: gap,
            required_gap_deg: required,
        };
        match worst.get(&pair) {
            Some(existing) if existing.actual_gap_deg <= gap => {}
            _ => {
                worst.insert(pair, candidate);
            }
        }
    }

    worst.into_values().collect()
}
