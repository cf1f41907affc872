//! Mapping relations: which marker drives what, and how.
//!
//! Adapters describe their roles as [`RoleMapping`]s. The registry matches them
//! against the live markers of a scene and produces one [`MappingRelation`] per
//! consumer. Roles without a marker are skipped, never fatal.

use hashbrown::HashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::expression::DriverAttribute;
use crate::host::{ConstraintKind, MarkerObject};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverType {
    LimbDriver,
    FaceDriver,
    Constraint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub bone: String,
    pub kind: ConstraintKind,
}

impl ConstraintSpec {
    pub fn new(bone: &str, kind: ConstraintKind) -> Self {
        Self {
            bone: bone.to_string(),
            kind,
        }
    }
}

/// Which driver relation a multi-user role produces.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverFamily {
    Limb,
    Face,
}

impl DriverFamily {
    pub fn driver_type(self) -> DriverType {
        match self {
            DriverFamily::Limb => DriverType::LimbDriver,
            DriverFamily::Face => DriverType::FaceDriver,
        }
    }

    fn wrap(self, attr: DriverAttribute) -> Relation {
        match self {
            DriverFamily::Limb => Relation::LimbDriver(attr),
            DriverFamily::Face => Relation::FaceDriver(attr),
        }
    }
}

/// Payload of a relation; the variant decides which host operation runs.
#[derive(Clone, Debug, PartialEq)]
pub enum Relation {
    LimbDriver(DriverAttribute),
    FaceDriver(DriverAttribute),
    Constraint(ConstraintSpec),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MappingRelation {
    pub source: MarkerObject,
    pub relation: Relation,
}

impl MappingRelation {
    pub fn driver_type(&self) -> DriverType {
        match self.relation {
            Relation::LimbDriver(_) => DriverType::LimbDriver,
            Relation::FaceDriver(_) => DriverType::FaceDriver,
            Relation::Constraint(_) => DriverType::Constraint,
        }
    }
}

/// A configured role, keyed by the marker name that feeds it.
#[derive(Clone, Debug, PartialEq)]
pub enum RoleMapping {
    /// One marker feeding several driver attributes.
    MultiUser {
        role: String,
        family: DriverFamily,
        consumers: Vec<DriverAttribute>,
    },
    /// One marker constraining one pose bone.
    Single {
        role: String,
        constraint: ConstraintSpec,
    },
}

impl RoleMapping {
    pub fn role(&self) -> &str {
        match self {
            RoleMapping::MultiUser { role, .. } | RoleMapping::Single { role, .. } => role,
        }
    }

    fn relations(&self, source: &MarkerObject) -> Vec<MappingRelation> {
        match self {
            RoleMapping::MultiUser {
                family, consumers, ..
            } => consumers
                .iter()
                .map(|attr| MappingRelation {
                    source: source.clone(),
                    relation: family.wrap(attr.clone()),
                })
                .collect(),
            RoleMapping::Single { constraint, .. } => vec![MappingRelation {
                source: source.clone(),
                relation: Relation::Constraint(constraint.clone()),
            }],
        }
    }
}

/// Relations for one rig build, owned by the caller.
#[derive(Clone, Debug, Default)]
pub struct RelationRegistry {
    relations: Vec<MappingRelation>,
    skipped: Vec<Diagnostic>,
}

impl RelationRegistry {
    /// Match `mappings` against `markers` by name. The first marker of a
    /// duplicated name wins.
    pub fn build(region: &str, mappings: &[RoleMapping], markers: &[MarkerObject]) -> Self {
        let mut by_name: HashMap<&str, &MarkerObject> = HashMap::with_capacity(markers.len());
        for marker in markers {
            by_name.entry(marker.name.as_str()).or_insert(marker);
        }

        let mut registry = RelationRegistry::default();
        for mapping in mappings {
            match by_name.get(mapping.role()) {
                Some(source) => {
                    let relations = mapping.relations(source);
                    debug!(
                        "{region}: {} relation(s) for '{}'",
                        relations.len(),
                        mapping.role()
                    );
                    registry.relations.extend(relations);
                }
                None => {
                    warn!("{region}: mapping failed for '{}', no marker", mapping.role());
                    registry
                        .skipped
                        .push(Diagnostic::missing_marker(region, mapping.role()));
                }
            }
        }
        registry
    }

    pub fn relations(&self) -> &[MappingRelation] {
        &self.relations
    }

    pub fn skipped(&self) -> &[Diagnostic] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn into_parts(self) -> (Vec<MappingRelation>, Vec<Diagnostic>) {
        (self.relations, self.skipped)
    }
}
