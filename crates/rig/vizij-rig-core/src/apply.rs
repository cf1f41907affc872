//! Applies a relation list to a host, once per rig build.
//!
//! Name lookups go through indices built at the start of the pass. Anything
//! that does not resolve is skipped and reported; re-applying onto a rig that
//! already carries these drivers duplicates them.

use hashbrown::HashMap;
use log::{debug, warn};

use crate::error::Diagnostic;
use crate::expression::DriverAttribute;
use crate::host::{BoundVariable, MarkerObject, RigHost};
use crate::ids::{BoneId, ObjectId};
use crate::relation::{ConstraintSpec, MappingRelation, Relation};

/// Outcome of one apply pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ApplyReport {
    /// Per-axis drivers installed.
    pub drivers: usize,
    pub constraints: usize,
    pub skipped: Vec<Diagnostic>,
}

struct ApplyPass<'a, H: RigHost> {
    host: &'a mut H,
    region: &'a str,
    armature: ObjectId,
    objects: HashMap<String, ObjectId>,
    bones: HashMap<String, BoneId>,
    report: ApplyReport,
}

/// Install every relation on `host`.
pub fn apply_relations<H: RigHost>(
    host: &mut H,
    region: &str,
    armature: ObjectId,
    relations: &[MappingRelation],
) -> ApplyReport {
    let mut objects = HashMap::new();
    for MarkerObject { id, name } in host.objects() {
        objects.entry(name).or_insert(id);
    }
    let bones = host
        .pose_bones(armature)
        .into_iter()
        .map(|b| (b.name, b.id))
        .collect();

    let mut pass = ApplyPass {
        host,
        region,
        armature,
        objects,
        bones,
        report: ApplyReport::default(),
    };
    for relation in relations {
        pass.apply(relation);
    }
    pass.report
}

impl<H: RigHost> ApplyPass<'_, H> {
    fn apply(&mut self, relation: &MappingRelation) {
        // the source handle may be stale; only its name is trusted
        let Some(source) = self.resolve(&relation.source.name) else {
            return;
        };
        match &relation.relation {
            Relation::LimbDriver(attr) | Relation::FaceDriver(attr) => {
                debug!(
                    "{}: {:?} {} -> {}",
                    self.region,
                    relation.driver_type(),
                    relation.source.name,
                    attr.target
                );
                self.add_driver_batch(attr);
            }
            Relation::Constraint(spec) => {
                debug!(
                    "{}: constraint {} -> {} ({})",
                    self.region, relation.source.name, spec.bone, spec.kind
                );
                self.add_constraint(source, spec);
            }
        }
    }

    fn resolve(&mut self, name: &str) -> Option<ObjectId> {
        let id = self.objects.get(name).copied();
        if id.is_none() {
            warn!("{}: no object '{}', relation skipped", self.region, name);
            self.report
                .skipped
                .push(Diagnostic::missing_marker(self.region, name));
        }
        id
    }

    fn add_driver_batch(&mut self, attr: &DriverAttribute) {
        let Some(target) = self.resolve(&attr.target) else {
            return;
        };

        // bind every axis up front so a missing variable leaves no partial driver
        let mut bound = Vec::new();
        for (axis, driver) in attr.active_axes() {
            let mut vars = Vec::with_capacity(driver.variables.len());
            for var in &driver.variables {
                let Some(object) = self.resolve(&var.object) else {
                    return;
                };
                vars.push(BoundVariable {
                    name: var.name.clone(),
                    object,
                    path: var.path,
                });
            }
            bound.push((axis, driver.render(), vars));
        }

        for (axis, expression, vars) in bound {
            let driver = self.host.add_driver(target, attr.channel, axis);
            self.host.set_expression(driver, &expression, &vars);
            self.report.drivers += 1;
        }
    }

    fn add_constraint(&mut self, source: ObjectId, spec: &ConstraintSpec) {
        let Some(bone) = self.bones.get(&spec.bone).copied() else {
            warn!("{}: no pose bone '{}', constraint skipped", self.region, spec.bone);
            self.report
                .skipped
                .push(Diagnostic::missing_bone(self.region, &spec.bone));
            return;
        };
        self.host
            .add_constraint(self.armature, bone, source, spec.kind);
        self.report.constraints += 1;
    }
}
