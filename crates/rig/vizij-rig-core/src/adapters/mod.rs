//! Body-region adapters.
//!
//! An adapter turns static bone/marker tables into [`RoleMapping`]s. Wiring is
//! shared: match the mappings against live markers, then apply the resulting
//! relations once.

pub mod face;
pub mod pose;

use serde::Serialize;

use crate::apply::apply_relations;
use crate::error::Diagnostic;
use crate::host::{MarkerObject, RigHost};
use crate::ids::ObjectId;
use crate::relation::{MappingRelation, RelationRegistry, RoleMapping};

pub use face::FaceRig;
pub use pose::PoseRig;

pub trait RigAdapter {
    /// Short name used in logs and diagnostics.
    fn region(&self) -> &'static str;

    fn role_mappings(&self) -> Vec<RoleMapping>;

    /// Problems found while reading the armature (missing bones).
    fn diagnostics(&self) -> &[Diagnostic] {
        &[]
    }
}

/// Result of wiring one region.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RegionReport {
    pub region: String,
    pub relations: usize,
    pub drivers: usize,
    pub constraints: usize,
    pub skipped: Vec<Diagnostic>,
}

/// Register and apply the adapter's relations. Returns the relations that
/// were registered along with the report.
pub fn wire<H: RigHost, A: RigAdapter + ?Sized>(
    host: &mut H,
    armature: ObjectId,
    markers: &[MarkerObject],
    adapter: &A,
) -> (Vec<MappingRelation>, RegionReport) {
    let region = adapter.region();
    let registry = RelationRegistry::build(region, &adapter.role_mappings(), markers);
    let applied = apply_relations(host, region, armature, registry.relations());
    let (relations, skipped) = registry.into_parts();

    let mut report = RegionReport {
        region: region.to_string(),
        relations: relations.len(),
        drivers: applied.drivers,
        constraints: applied.constraints,
        skipped: adapter.diagnostics().to_vec(),
    };
    report.skipped.extend(skipped);
    report.skipped.extend(applied.skipped);
    (relations, report)
}
