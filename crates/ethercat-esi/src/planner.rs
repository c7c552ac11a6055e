// crates/ethercat-esi/src/planner.rs

//! PDO placement: picks the PDO that should carry a resolved object.
//!
//! Without an explicit hint, the passes run in strict priority order and
//! each one scans PDOs in ascending index order, skipping PDOs that would
//! conflict with the session's exclusions:
//! 1. an active PDO already carrying the object,
//! 2. a default-active fixed PDO already carrying it,
//! 3. a non-fixed PDO of the preferred direction that may carry it,
//! 4. any non-fixed PDO that may carry it.

use crate::ebi::Session;
use crate::error::EsiError;
use crate::indexer::EsiIndex;
use crate::log::{LogContext, esi_debug, esi_trace};
use crate::parser::parse_u32;
use crate::types::{ObjectAddress, ObjectMetadata, PdoDirection, PdoMetadata};
use alloc::string::ToString;
use alloc::vec::Vec;

impl EsiIndex {
    /// Selects the PDO for `addr`.
    ///
    /// A non-empty `pdo_hint` (a PDO index or name) is resolved directly;
    /// whether that PDO can carry the object is checked when instructions
    /// are generated.
    ///
    /// # Errors
    /// - `PdoNotFound` / `AmbiguousPdo` for a hint matching no or several PDOs.
    /// - `NotMappable` if the object cannot live in any PDO.
    /// - `NoPdoAvailable` if no PDO can carry the object.
    pub fn find_pdo(
        &self,
        session: &Session,
        pdo_hint: &str,
        addr: ObjectAddress,
        obj_meta: &ObjectMetadata,
        preferred: PdoDirection,
    ) -> Result<&PdoMetadata, EsiError> {
        let ctx = LogContext::new("planner", self.identity());
        let pdo_hint = pdo_hint.trim();
        if !pdo_hint.is_empty() {
            return self.find_pdo_by_hint(pdo_hint);
        }

        if let Some(pdo) = self
            .pdos()
            .filter(|pdo| session.conflicting_pdo(self, pdo).is_none())
            .find(|pdo| session.is_active(pdo.index) && session.carries(pdo, addr))
        {
            esi_debug!(ctx, "{} is carried by active PDO {:#06X}", addr, pdo.index);
            return Ok(pdo);
        }

        if let Some(pdo) = self
            .pdos()
            .filter(|pdo| session.conflicting_pdo(self, pdo).is_none())
            .find(|pdo| pdo.is_default_active() && pdo.fixed && pdo.has_default_entry(addr))
        {
            esi_debug!(ctx, "{} is carried by default-active fixed PDO {:#06X}", addr, pdo.index);
            return Ok(pdo);
        }

        let mapping = obj_meta.pdo_mapping;
        if mapping.is_empty() {
            return Err(EsiError::NotMappable { address: addr });
        }

        if preferred != PdoDirection::Unknown {
            if let Some(pdo) = self
                .pdos()
                .filter(|pdo| session.conflicting_pdo(self, pdo).is_none())
                .find(|pdo| !pdo.fixed && pdo.direction == preferred && mapping.allows(pdo.direction))
            {
                esi_debug!(ctx, "{} placed into {:?} PDO {:#06X}", addr, preferred, pdo.index);
                return Ok(pdo);
            }
            esi_trace!(ctx, "No {:?} PDO can carry {}, widening the search", preferred, addr);
        }

        if let Some(pdo) = self
            .pdos()
            .filter(|pdo| session.conflicting_pdo(self, pdo).is_none())
            .find(|pdo| !pdo.fixed && mapping.allows(pdo.direction))
        {
            esi_debug!(ctx, "{} placed into PDO {:#06X} (mapping {})", addr, pdo.index, mapping);
            return Ok(pdo);
        }

        Err(EsiError::NoPdoAvailable { address: addr })
    }

    /// Resolves a PDO hint: a PDO index first, then a PDO name.
    pub(crate) fn find_pdo_by_hint(&self, hint: &str) -> Result<&PdoMetadata, EsiError> {
        if let Some(pdo) = parse_u32(hint).ok().and_then(|index| self.pdo(index)) {
            return Ok(pdo);
        }

        let named: Vec<&PdoMetadata> = self.pdos().filter(|pdo| pdo.name == hint).collect();
        match named.as_slice() {
            [] => Err(EsiError::PdoNotFound {
                hint: hint.to_string(),
            }),
            [pdo] => Ok(*pdo),
            _ => Err(EsiError::AmbiguousPdo {
                hint: hint.to_string(),
                candidates: named.iter().map(|pdo| pdo.index).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{DeviceIdentity, PdoMapping};
    use alloc::string::String;
    use alloc::vec;

    const STATUS: ObjectAddress = ObjectAddress::new(0x6000, 1);

    fn status(mapping: PdoMapping) -> ObjectMetadata {
        ObjectMetadata {
            index: STATUS.index,
            sub_index: STATUS.sub_index,
            name: String::from("Status"),
            pdo_mapping: mapping,
            ..ObjectMetadata::default()
        }
    }

    fn pdo(index: u32, name: &str, direction: PdoDirection, default_sm: u32, fixed: bool) -> PdoMetadata {
        PdoMetadata {
            index,
            name: String::from(name),
            direction,
            default_sm,
            fixed,
            ..PdoMetadata::default()
        }
    }

    fn planner_index() -> EsiIndex {
        let mut index = EsiIndex::new(DeviceIdentity::default());
        index.insert_object(status(PdoMapping::BOTH));

        let mut fixed = pdo(0x1A00, "Fixed inputs", PdoDirection::Tx, 3, true);
        fixed.default_entries = vec![STATUS];
        let mut optional = pdo(0x1A10, "Optional inputs", PdoDirection::Tx, 0, false);
        optional.default_entries = vec![STATUS];
        index.insert_pdo(fixed);
        index.insert_pdo(optional);
        index.insert_pdo(pdo(0x1600, "Outputs", PdoDirection::Rx, 2, false));
        index.insert_pdo(pdo(0x1A20, "Free", PdoDirection::Tx, 0, false));
        index.insert_pdo(pdo(0x1A21, "Free", PdoDirection::Tx, 0, false));
        index
    }

    #[test]
    fn test_active_pdo_beats_default_fixed_pdo() {
        let index = planner_index();
        let mut session = Session::new();
        session.mark_active(0x1A10);

        let chosen = index
            .find_pdo(&session, "", STATUS, &status(PdoMapping::BOTH), PdoDirection::Unknown)
            .unwrap();
        assert_eq!(chosen.index, 0x1A10);
    }

    #[test]
    fn test_default_fixed_pdo_without_session() {
        let index = planner_index();
        let chosen = index
            .find_pdo(&Session::new(), "", STATUS, &status(PdoMapping::BOTH), PdoDirection::Rx)
            .unwrap();
        assert_eq!(chosen.index, 0x1A00);
    }

    #[test]
    fn test_excluded_default_pdo_is_skipped() {
        let mut index = planner_index();
        let mut alternative = pdo(0x1A30, "Alternative inputs", PdoDirection::Tx, 0, false);
        alternative.excludes = vec![0x1A00];
        index.insert_pdo(alternative.clone());

        let mut session = Session::new();
        let other = ObjectAddress::new(0x7000, 1);
        session
            .generate_instructions(&index, &alternative, other, &status(PdoMapping::TX))
            .unwrap();
        assert!(session.is_excluded(0x1A00));

        let chosen = index
            .find_pdo(&session, "", STATUS, &status(PdoMapping::BOTH), PdoDirection::Tx)
            .unwrap();
        assert_eq!(chosen.index, 0x1A10);
    }

    #[test]
    fn test_preferred_direction_then_fallback() {
        let index = planner_index();
        let other = ObjectAddress::new(0x7000, 1);

        let chosen = index
            .find_pdo(&Session::new(), "", other, &status(PdoMapping::BOTH), PdoDirection::Rx)
            .unwrap();
        assert_eq!(chosen.index, 0x1600);

        // Tx-only object preferring Rx falls back to the lowest non-fixed Tx PDO.
        let chosen = index
            .find_pdo(&Session::new(), "", other, &status(PdoMapping::TX), PdoDirection::Rx)
            .unwrap();
        assert_eq!(chosen.index, 0x1A10);
    }

    #[test]
    fn test_not_mappable() {
        let index = planner_index();
        let err = index
            .find_pdo(
                &Session::new(),
                "",
                ObjectAddress::new(0x8000, 1),
                &status(PdoMapping::NONE),
                PdoDirection::Unknown,
            )
            .unwrap_err();
        assert_eq!(err, ErrorKind::NotMappable);
    }

    #[test]
    fn test_no_pdo_available() {
        let mut index = EsiIndex::new(DeviceIdentity::default());
        index.insert_pdo(pdo(0x1A00, "Fixed", PdoDirection::Tx, 3, true));
        let err = index
            .find_pdo(&Session::new(), "", STATUS, &status(PdoMapping::TX), PdoDirection::Tx)
            .unwrap_err();
        assert_eq!(err, ErrorKind::NoPdoAvailable);
    }

    #[test]
    fn test_hint_by_index_and_name() {
        let index = planner_index();
        let session = Session::new();
        let meta = status(PdoMapping::BOTH);

        let by_index = index.find_pdo(&session, "#x1600", STATUS, &meta, PdoDirection::Unknown).unwrap();
        assert_eq!(by_index.index, 0x1600);

        let by_name = index.find_pdo(&session, "Optional inputs", STATUS, &meta, PdoDirection::Unknown).unwrap();
        assert_eq!(by_name.index, 0x1A10);

        let err = index.find_pdo(&session, "Free", STATUS, &meta, PdoDirection::Unknown).unwrap_err();
        match err {
            EsiError::AmbiguousPdo { candidates, .. } => assert_eq!(candidates, [0x1A20, 0x1A21]),
            other => panic!("expected AmbiguousPdo, got {:?}", other),
        }

        let err = index.find_pdo(&session, "Missing", STATUS, &meta, PdoDirection::Unknown).unwrap_err();
        assert_eq!(err, ErrorKind::PdoNotFound);
    }
}
