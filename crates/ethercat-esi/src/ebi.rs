// crates/ethercat-esi/src/ebi.rs

//! EBI (EtherCAT bus image) instruction generation.
//!
//! A [`Session`] accumulates the wire-image changes planned by one unit of
//! work: PDOs activated, sync manager exclusions to set or clear, and
//! objects dynamically added to PDOs. The index itself is never mutated.

use crate::error::EsiError;
use crate::indexer::EsiIndex;
use crate::log::{LogContext, esi_debug};
use crate::types::{ObjectAddress, ObjectMetadata, PdoMetadata};
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;
use serde::Serialize;

/// A dynamic mapping of one object into one PDO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectAddition {
    pub pdo_index: u32,
    pub object_index: u32,
    pub object_sub_index: u32,
    pub data_type: String,
    pub bit_size: u32,
    pub name: String,
}

impl ObjectAddition {
    pub fn address(&self) -> ObjectAddress {
        ObjectAddress::new(self.object_index, self.object_sub_index)
    }
}

/// The instructions emitted for a device configuration response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EbiInstructions {
    pub object_additions: Vec<ObjectAddition>,
    /// PDOs whose exclusion bit must be set.
    pub exclusions_to_add: Vec<u32>,
    /// PDOs whose exclusion bit must be cleared.
    pub exclusions_to_remove: Vec<u32>,
}

/// Mutable planning state of one EBI-generation unit of work.
///
/// Every list is free of duplicates, so planning the same variable twice
/// yields the same instructions as planning it once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    active_pdos: BTreeSet<u32>,
    exclusions_to_add: Vec<u32>,
    exclusions_to_remove: Vec<u32>,
    objects_to_add: Vec<ObjectAddition>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a PDO as already active, e.g. from an existing bus image.
    pub fn mark_active(&mut self, pdo_index: u32) -> bool {
        self.active_pdos.insert(pdo_index)
    }

    pub fn is_active(&self, pdo_index: u32) -> bool {
        self.active_pdos.contains(&pdo_index)
    }

    /// Active PDO indices in ascending order.
    pub fn active_pdos(&self) -> impl Iterator<Item = u32> + '_ {
        self.active_pdos.iter().copied()
    }

    pub fn exclusions_to_add(&self) -> &[u32] {
        &self.exclusions_to_add
    }

    pub fn exclusions_to_remove(&self) -> &[u32] {
        &self.exclusions_to_remove
    }

    pub fn objects_to_add(&self) -> &[ObjectAddition] {
        &self.objects_to_add
    }

    pub fn is_empty(&self) -> bool {
        self.active_pdos.is_empty()
            && self.exclusions_to_add.is_empty()
            && self.exclusions_to_remove.is_empty()
            && self.objects_to_add.is_empty()
    }

    /// Whether `pdo` carries `addr`, either by default or through an
    /// addition planned in this session.
    pub fn carries(&self, pdo: &PdoMetadata, addr: ObjectAddress) -> bool {
        pdo.has_default_entry(addr) || self.has_pending_addition(pdo.index, addr)
    }

    /// Whether this session schedules `pdo_index` for exclusion.
    pub fn is_excluded(&self, pdo_index: u32) -> bool {
        self.exclusions_to_add.contains(&pdo_index)
    }

    /// The active PDO that `pdo` cannot coexist with, if any.
    ///
    /// A PDO scheduled for exclusion conflicts with the active PDO that
    /// excluded it. A PDO not yet active conflicts with every active PDO
    /// it excludes or is excluded by.
    pub fn conflicting_pdo(&self, index: &EsiIndex, pdo: &PdoMetadata) -> Option<u32> {
        let excluded = self.is_excluded(pdo.index);
        if !excluded && self.is_active(pdo.index) {
            return None;
        }
        self.active_pdos
            .iter()
            .copied()
            .filter(|&active| active != pdo.index)
            .find(|&active| {
                pdo.excludes.contains(&active)
                    || index
                        .pdo(active)
                        .is_some_and(|other| other.excludes.contains(&pdo.index))
            })
            .or(excluded.then_some(pdo.index))
    }

    fn has_pending_addition(&self, pdo_index: u32, addr: ObjectAddress) -> bool {
        self.objects_to_add
            .iter()
            .any(|a| a.pdo_index == pdo_index && a.address() == addr)
    }

    /// Records the wire-image changes needed for `pdo` to carry `addr`.
    ///
    /// A PDO not yet active is activated. If it is outside the default
    /// image its exclusion is cleared and every default-active PDO it
    /// excludes gets excluded. If `addr` is not already carried, an
    /// [`ObjectAddition`] is recorded.
    ///
    /// Nothing is recorded when an error is returned.
    ///
    /// # Errors
    /// - `ExclusionConflict` if the PDO cannot coexist with an active PDO.
    /// - `FixedPdo` if an addition is needed but the PDO is fixed.
    /// - `DirectionMismatch` if the object is not mappable into the PDO's direction.
    pub fn generate_instructions(
        &mut self,
        index: &EsiIndex,
        pdo: &PdoMetadata,
        addr: ObjectAddress,
        obj: &ObjectMetadata,
    ) -> Result<(), EsiError> {
        let ctx = LogContext::new("ebi", index.identity());
        if let Some(active) = self.conflicting_pdo(index, pdo) {
            return Err(EsiError::ExclusionConflict {
                pdo: pdo.index,
                active,
            });
        }
        let needs_addition = !self.carries(pdo, addr);

        if needs_addition {
            if pdo.fixed {
                return Err(EsiError::FixedPdo {
                    pdo: pdo.index,
                    address: addr,
                });
            }
            if !obj.pdo_mapping.allows(pdo.direction) {
                return Err(EsiError::DirectionMismatch {
                    pdo: pdo.index,
                    address: addr,
                    direction: pdo.direction,
                });
            }
        }

        if self.active_pdos.insert(pdo.index) && !pdo.is_default_active() {
            esi_debug!(ctx, "Activating PDO {:#06X}", pdo.index);
            push_unique(&mut self.exclusions_to_remove, pdo.index);
            for &excluded in &pdo.excludes {
                if index.pdo(excluded).is_some_and(PdoMetadata::is_default_active) {
                    esi_debug!(ctx, "Excluding PDO {:#06X} in favor of {:#06X}", excluded, pdo.index);
                    push_unique(&mut self.exclusions_to_add, excluded);
                }
            }
        }

        if needs_addition {
            esi_debug!(ctx, "Adding object {} '{}' to PDO {:#06X}", addr, obj.name, pdo.index);
            self.objects_to_add.push(ObjectAddition {
                pdo_index: pdo.index,
                object_index: addr.index,
                object_sub_index: addr.sub_index,
                data_type: obj.data_type.clone(),
                bit_size: obj.bit_size,
                name: obj.name.clone(),
            });
        }
        Ok(())
    }

    /// Folds `other` into this session, keeping every list duplicate-free.
    pub fn merge(&mut self, other: Session) {
        self.active_pdos.extend(other.active_pdos);
        for pdo in other.exclusions_to_add {
            push_unique(&mut self.exclusions_to_add, pdo);
        }
        for pdo in other.exclusions_to_remove {
            push_unique(&mut self.exclusions_to_remove, pdo);
        }
        for addition in other.objects_to_add {
            if !self.has_pending_addition(addition.pdo_index, addition.address()) {
                self.objects_to_add.push(addition);
            }
        }
    }

    pub fn instructions(&self) -> EbiInstructions {
        EbiInstructions {
            object_additions: self.objects_to_add.clone(),
            exclusions_to_add: self.exclusions_to_add.clone(),
            exclusions_to_remove: self.exclusions_to_remove.clone(),
        }
    }

    pub fn into_instructions(self) -> EbiInstructions {
        EbiInstructions {
            object_additions: self.objects_to_add,
            exclusions_to_add: self.exclusions_to_add,
            exclusions_to_remove: self.exclusions_to_remove,
        }
    }
}

fn push_unique(list: &mut Vec<u32>, value: u32) {
    if !list.contains(&value) {
        list.push(value);
    }
}

// --- Shared Mapping ---

#[cfg(feature = "std")]
pub use shared::SharedMapping;

#[cfg(feature = "std")]
mod shared {
    use super::{EbiInstructions, Session};
    use crate::device::{EsiDevice, VariablePlacement};
    use crate::error::EsiError;
    use crate::types::PdoDirection;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// The "current mapping" of a device accumulated across requests.
    ///
    /// Guarded by its own mutex; each `plan` call runs resolution, placement
    /// and instruction generation as one step under the lock.
    #[derive(Debug, Default)]
    pub struct SharedMapping {
        session: Mutex<Session>,
    }

    impl SharedMapping {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn plan(
            &self,
            device: &EsiDevice,
            object: &str,
            pdo_hint: &str,
            preferred: PdoDirection,
        ) -> Result<VariablePlacement, EsiError> {
            device.plan_variable(&mut self.lock(), object, pdo_hint, preferred)
        }

        pub fn snapshot(&self) -> EbiInstructions {
            self.lock().instructions()
        }

        fn lock(&self) -> MutexGuard<'_, Session> {
            // Every mutation leaves the session consistent, so a poisoned
            // lock still holds a usable value.
            self.session.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{DeviceIdentity, PdoDirection, PdoMapping};
    use alloc::vec;

    fn pdo(index: u32, direction: PdoDirection, default_sm: u32, fixed: bool) -> PdoMetadata {
        PdoMetadata {
            index,
            direction,
            default_sm,
            fixed,
            ..PdoMetadata::default()
        }
    }

    fn input(sub_index: u32) -> ObjectMetadata {
        ObjectMetadata {
            index: 0x6000,
            sub_index,
            name: alloc::format!("Input {}", sub_index),
            data_type: String::from("BOOL"),
            bit_size: 1,
            pdo_mapping: PdoMapping::TX,
            ..ObjectMetadata::default()
        }
    }

    fn index_with(pdos: Vec<PdoMetadata>) -> EsiIndex {
        let mut index = EsiIndex::new(DeviceIdentity::default());
        for pdo in pdos {
            index.insert_pdo(pdo);
        }
        index
    }

    #[test]
    fn test_default_entry_needs_no_addition() {
        let mut default_pdo = pdo(0x1A00, PdoDirection::Tx, 3, true);
        default_pdo.default_entries = vec![ObjectAddress::new(0x6000, 1)];
        let index = index_with(vec![default_pdo.clone()]);

        let mut session = Session::new();
        session
            .generate_instructions(&index, &default_pdo, ObjectAddress::new(0x6000, 1), &input(1))
            .unwrap();

        assert!(session.objects_to_add().is_empty());
        assert!(session.exclusions_to_remove().is_empty());
        assert!(session.is_active(0x1A00));
    }

    #[test]
    fn test_fixed_pdo_rejects_addition() {
        let fixed = pdo(0x1A00, PdoDirection::Tx, 3, true);
        let index = index_with(vec![fixed.clone()]);
        let mut session = Session::new();

        let err = session
            .generate_instructions(&index, &fixed, ObjectAddress::new(0x6000, 2), &input(2))
            .unwrap_err();
        assert_eq!(err, ErrorKind::FixedPdo);
        // Failed requests leave no trace.
        assert!(session.is_empty());
    }

    #[test]
    fn test_direction_mismatch() {
        let rx = pdo(0x1600, PdoDirection::Rx, 0, false);
        let index = index_with(vec![rx.clone()]);
        let mut session = Session::new();

        let err = session
            .generate_instructions(&index, &rx, ObjectAddress::new(0x6000, 1), &input(1))
            .unwrap_err();
        assert_eq!(err, ErrorKind::DirectionMismatch);
    }

    #[test]
    fn test_activation_handles_exclusions() {
        let mut alternative = pdo(0x1A01, PdoDirection::Tx, 0, false);
        alternative.excludes = vec![0x1A00, 0x1A02];
        let default_pdo = pdo(0x1A00, PdoDirection::Tx, 3, false);
        let inactive = pdo(0x1A02, PdoDirection::Tx, 0, false);
        let index = index_with(vec![alternative.clone(), default_pdo, inactive]);

        let mut session = Session::new();
        for _ in 0..2 {
            session
                .generate_instructions(&index, &alternative, ObjectAddress::new(0x6000, 1), &input(1))
                .unwrap();
        }

        let instructions = session.into_instructions();
        assert_eq!(instructions.exclusions_to_remove, [0x1A01]);
        // Only the default-active PDO needs excluding.
        assert_eq!(instructions.exclusions_to_add, [0x1A00]);
        assert_eq!(instructions.object_additions.len(), 1);
        assert_eq!(
            instructions.object_additions[0],
            ObjectAddition {
                pdo_index: 0x1A01,
                object_index: 0x6000,
                object_sub_index: 1,
                data_type: String::from("BOOL"),
                bit_size: 1,
                name: String::from("Input 1"),
            }
        );
    }

    #[test]
    fn test_default_active_pdo_excludes_nothing() {
        let mut first = pdo(0x1A00, PdoDirection::Tx, 3, false);
        first.excludes = vec![0x1A01];
        let second = pdo(0x1A01, PdoDirection::Tx, 3, false);
        let index = index_with(vec![first.clone(), second]);

        let mut session = Session::new();
        session
            .generate_instructions(&index, &first, ObjectAddress::new(0x6000, 1), &input(1))
            .unwrap();
        assert!(session.exclusions_to_add().is_empty());
        assert!(session.exclusions_to_remove().is_empty());
    }

    fn exclusive_pair() -> (EsiIndex, PdoMetadata, PdoMetadata) {
        let mut standard = pdo(0x1A00, PdoDirection::Tx, 3, true);
        standard.excludes = vec![0x1A01];
        standard.default_entries = vec![ObjectAddress::new(0x6000, 1)];
        let mut compact = pdo(0x1A01, PdoDirection::Tx, 0, false);
        compact.excludes = vec![0x1A00];
        let index = index_with(vec![standard.clone(), compact.clone()]);
        (index, standard, compact)
    }

    #[test]
    fn test_activation_conflicts_with_active_pdo() {
        let (index, standard, compact) = exclusive_pair();
        let mut session = Session::new();
        session
            .generate_instructions(&index, &standard, ObjectAddress::new(0x6000, 1), &input(1))
            .unwrap();
        let before = session.clone();

        let err = session
            .generate_instructions(&index, &compact, ObjectAddress::new(0x6000, 2), &input(2))
            .unwrap_err();
        assert!(matches!(
            err,
            EsiError::ExclusionConflict { pdo: 0x1A01, active: 0x1A00 }
        ));
        assert_eq!(session, before);
    }

    #[test]
    fn test_excluded_pdo_cannot_be_used() {
        let (index, standard, compact) = exclusive_pair();
        let mut session = Session::new();
        session
            .generate_instructions(&index, &compact, ObjectAddress::new(0x6000, 2), &input(2))
            .unwrap();
        assert!(session.is_excluded(0x1A00));
        assert_eq!(session.conflicting_pdo(&index, &standard), Some(0x1A01));
        assert_eq!(session.conflicting_pdo(&index, &compact), None);

        let err = session
            .generate_instructions(&index, &standard, ObjectAddress::new(0x6000, 1), &input(1))
            .unwrap_err();
        assert_eq!(err, ErrorKind::ExclusionConflict);
        assert!(!session.is_active(0x1A00));
    }

    #[test]
    fn test_merge_is_duplicate_free() {
        let alternative = pdo(0x1A01, PdoDirection::Tx, 0, false);
        let index = index_with(vec![alternative.clone()]);

        let mut a = Session::new();
        a.generate_instructions(&index, &alternative, ObjectAddress::new(0x6000, 1), &input(1))
            .unwrap();
        let mut b = Session::new();
        b.generate_instructions(&index, &alternative, ObjectAddress::new(0x6000, 1), &input(1))
            .unwrap();
        b.generate_instructions(&index, &alternative, ObjectAddress::new(0x6000, 2), &input(2))
            .unwrap();

        a.merge(b);
        assert_eq!(a.exclusions_to_remove(), [0x1A01]);
        assert_eq!(a.objects_to_add().len(), 2);
        assert_eq!(a.active_pdos().collect::<Vec<_>>(), [0x1A01]);
    }

    #[test]
    fn test_instructions_serialize() {
        let instructions = EbiInstructions {
            object_additions: vec![],
            exclusions_to_add: vec![0x1A00],
            exclusions_to_remove: vec![0x1A01],
        };
        let json = serde_json::to_string(&instructions).unwrap();
        assert_eq!(
            json,
            r#"{"object_additions":[],"exclusions_to_add":[6656],"exclusions_to_remove":[6657]}"#
        );
    }
}
