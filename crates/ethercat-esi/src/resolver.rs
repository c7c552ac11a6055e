// crates/ethercat-esi/src/resolver.rs

//! Resolves a variable request (a name or an `INDEX.SUBINDEX` address) to
//! one indexed object.
//!
//! Name lookups are contextual first: a name declared inside the PDO the
//! caller is asking about always wins over the global name index, which may
//! hold several same-named objects (e.g. one "Status" per direction).

use crate::error::EsiError;
use crate::indexer::EsiIndex;
use crate::parser::parse_u32;
use crate::types::{ObjectAddress, ObjectMetadata, PdoDirection, PdoMetadata};
use alloc::string::ToString;
use alloc::vec::Vec;

/// Prefix forcing a request to be resolved by name only.
pub const NAME_PREFIX: &str = "name:";

impl EsiIndex {
    /// Resolves `object` to an indexed object.
    ///
    /// `name:<name>` is resolved by name only. Anything else is first tried
    /// as `INDEX` or `INDEX.SUBINDEX` (sub-index defaults to 0); if that does
    /// not parse or names no indexed object, it is resolved as a name.
    pub fn find_object(
        &self,
        object: &str,
        pdo_context: Option<&PdoMetadata>,
        preferred: PdoDirection,
    ) -> Result<(ObjectAddress, &ObjectMetadata), EsiError> {
        let object = object.trim();
        if let Some(name) = object.strip_prefix(NAME_PREFIX) {
            return self.resolve_object_by_name(name.trim(), pdo_context, preferred);
        }

        if let Some(addr) = parse_address(object) {
            if let Some(meta) = self.object(addr) {
                return Ok((addr, meta));
            }
        }
        self.resolve_object_by_name(object, pdo_context, preferred)
    }

    /// Resolves an object by name.
    ///
    /// 1. A name declared by `pdo_context` resolves to that PDO's entry.
    /// 2. Otherwise the global name index is consulted. Several matches are
    ///    narrowed first to those mappable into the context PDO's direction,
    ///    then to those mappable into `preferred`.
    ///
    /// # Errors
    /// - `ObjectNotFound` if no object carries the name.
    /// - `ObjectNotFoundAfterFiltering` if a filter eliminates every candidate.
    /// - `AmbiguousObject` if several candidates survive both filters.
    pub fn resolve_object_by_name(
        &self,
        name: &str,
        pdo_context: Option<&PdoMetadata>,
        preferred: PdoDirection,
    ) -> Result<(ObjectAddress, &ObjectMetadata), EsiError> {
        if let Some(&addr) = pdo_context.and_then(|pdo| pdo.name_to_addr.get(name)) {
            if let Some(meta) = self.object(addr) {
                return Ok((addr, meta));
            }
        }

        let mut candidates: Vec<(ObjectAddress, &ObjectMetadata)> = self
            .addresses_named(name)
            .iter()
            .filter_map(|&addr| self.object(addr).map(|meta| (addr, meta)))
            .collect();

        if candidates.len() > 1 {
            let filters = pdo_context
                .map(|pdo| pdo.direction)
                .into_iter()
                .chain((preferred != PdoDirection::Unknown).then_some(preferred));

            for direction in filters {
                candidates.retain(|(_, meta)| meta.pdo_mapping.allows(direction));
                if candidates.is_empty() {
                    return Err(EsiError::ObjectNotFoundAfterFiltering {
                        name: name.to_string(),
                        direction,
                    });
                }
                if candidates.len() == 1 {
                    break;
                }
            }
        }

        match candidates.as_slice() {
            [] => Err(EsiError::ObjectNotFound {
                name: name.to_string(),
            }),
            [single] => Ok(*single),
            _ => Err(EsiError::AmbiguousObject {
                name: name.to_string(),
                candidates: candidates.iter().map(|(addr, _)| *addr).collect(),
            }),
        }
    }
}

/// Parses `INDEX` or `INDEX.SUBINDEX`.
fn parse_address(s: &str) -> Option<ObjectAddress> {
    let (index, sub_index) = s.split_once('.').unwrap_or((s, "0"));
    if index.trim().is_empty() {
        return None;
    }
    Some(ObjectAddress::new(parse_u32(index).ok()?, parse_u32(sub_index).ok()?))
}
