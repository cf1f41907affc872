//! Opaque handles for host scene entities.
//!
//! Real hosts mint these from their own object tables. [`IdAllocator`] serves
//! hosts that do not, such as [`crate::scene::InMemoryScene`], which never
//! frees anything: one sequence feeds every handle kind, so a raw value names
//! exactly one entity across objects, bones and drivers.

use serde::{Deserialize, Serialize};

/// Scene object (empty, marker, armature).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Pose bone within an armature.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BoneId(pub u32);

/// A single per-axis driver installed on an object property.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DriverId(pub u32);

/// Handle types mintable from a raw sequence value.
pub trait Handle: Copy {
    fn from_raw(raw: u32) -> Self;
}

impl Handle for ObjectId {
    fn from_raw(raw: u32) -> Self {
        ObjectId(raw)
    }
}

impl Handle for BoneId {
    fn from_raw(raw: u32) -> Self {
        BoneId(raw)
    }
}

impl Handle for DriverId {
    fn from_raw(raw: u32) -> Self {
        DriverId(raw)
    }
}

#[derive(Default, Debug)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next handle of kind `T`.
    pub fn alloc<T: Handle>(&mut self) -> T {
        let id = T::from_raw(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_one_sequence() {
        let mut alloc = IdAllocator::new();
        let object: ObjectId = alloc.alloc();
        let bone: BoneId = alloc.alloc();
        let driver: DriverId = alloc.alloc();
        assert_eq!(object, ObjectId(0));
        assert_eq!(bone, BoneId(1));
        assert_eq!(driver, DriverId(2));
        assert_eq!(alloc.alloc::<ObjectId>(), ObjectId(3));
    }
}
