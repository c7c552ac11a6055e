// crates/ethercat-esi/src/indexer/mod.rs

//! Builds the lookup indices for one device out of an ESI bundle.
//!
//! This module contains the main `load_and_index_esi` orchestrator and
//! sub-modules for the individual passes:
//! - `objects`: the CoE dictionary (inline and external), including sub-items.
//! - `pdos`: default PDOs and the objects declared directly by their entries.
//! - `references`: modules reached through one level of `InfoReference`.

use crate::bundle::EsiBundle;
use crate::config::NumericPolicy;
use crate::error::EsiError;
use crate::log::{LogContext, esi_debug, esi_info, esi_warn};
use crate::model::{Device, EtherCatInfo};
use crate::naming::pick_name;
use crate::parser::{EsiDocument, parse_document, parse_u32};
use crate::types::{DeviceIdentity, ObjectAddress, ObjectMetadata, PdoDirection, PdoMapping, PdoMetadata};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

// --- Sub-modules ---

mod objects;
mod pdos;
mod references;

/// The immutable indices built for one device.
///
/// All maps are ordered, so every scan over them is deterministic.
#[derive(Debug, Clone, Default)]
pub struct EsiIndex {
    identity: DeviceIdentity,
    objects: BTreeMap<ObjectAddress, ObjectMetadata>,
    names: BTreeMap<String, Vec<ObjectAddress>>,
    pdos: BTreeMap<u32, PdoMetadata>,
}

impl EsiIndex {
    pub(crate) fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            ..Self::default()
        }
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    pub fn object(&self, addr: ObjectAddress) -> Option<&ObjectMetadata> {
        self.objects.get(&addr)
    }

    /// All objects in ascending address order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectMetadata> {
        self.objects.values()
    }

    /// Addresses of every object carrying `name`. More than one entry means
    /// the name is ambiguous across the dictionary.
    pub fn addresses_named(&self, name: &str) -> &[ObjectAddress] {
        self.names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pdo(&self, index: u32) -> Option<&PdoMetadata> {
        self.pdos.get(&index)
    }

    /// All PDOs in ascending index order.
    pub fn pdos(&self) -> impl Iterator<Item = &PdoMetadata> {
        self.pdos.values()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn pdo_count(&self) -> usize {
        self.pdos.len()
    }

    /// Adds an object, or merges its mapping flag into the object already
    /// registered at the same address.
    pub(crate) fn insert_object(&mut self, meta: ObjectMetadata) {
        let addr = meta.address();
        if let Some(existing) = self.objects.get_mut(&addr) {
            existing.pdo_mapping = existing.pdo_mapping.union(meta.pdo_mapping);
            return;
        }
        let addresses = self.names.entry(meta.name.clone()).or_default();
        if !addresses.contains(&addr) {
            addresses.push(addr);
        }
        self.objects.insert(addr, meta);
    }

    /// Merges `mapping` into an already indexed object. Returns `false` if
    /// no object lives at `addr`.
    pub(crate) fn merge_mapping(&mut self, addr: ObjectAddress, mapping: PdoMapping) -> bool {
        match self.objects.get_mut(&addr) {
            Some(existing) => {
                existing.pdo_mapping = existing.pdo_mapping.union(mapping);
                true
            }
            None => false,
        }
    }

    /// Registers a PDO. The first registration of an index wins; returns
    /// `false` if the index was already taken.
    pub(crate) fn insert_pdo(&mut self, meta: PdoMetadata) -> bool {
        if self.pdos.contains_key(&meta.index) {
            return false;
        }
        self.pdos.insert(meta.index, meta);
        true
    }

    pub(crate) fn pdo_mut(&mut self, index: u32) -> Option<&mut PdoMetadata> {
        self.pdos.get_mut(&index)
    }
}

/// Parses every file of `bundle`, locates the device matching `identity`,
/// and indexes its dictionary, its PDOs and the modules it references.
///
/// # Errors
/// - `EsiError::DeviceNotFound` if no device matches.
/// - `EsiError::DuplicateDevice` if more than one device matches.
/// - `EsiError::DeepNesting` if a referenced file references further files.
/// - `EsiError::ReferenceNotFound` if a referenced file is missing.
/// - `EsiError::InvalidNumber` / `EsiError::HexParsing` under
///   `NumericPolicy::Strict`.
pub fn load_and_index_esi(
    bundle: &EsiBundle,
    identity: DeviceIdentity,
    policy: NumericPolicy,
) -> Result<EsiIndex, EsiError> {
    let mut builder = IndexBuilder::new(bundle, identity, policy);
    let (file, info, position) = builder.find_device()?;
    let device = &info.descriptions.devices.device[position];

    esi_info!(
        builder.ctx,
        "Found device '{}' ({}) in '{}'",
        pick_name(&device.name),
        device.device_type.value.trim(),
        file
    );

    builder.index_device(file, device)?;
    builder.index_references(file, &info.info_reference)?;

    let index = builder.finish();
    esi_info!(
        LogContext::new("indexer", identity),
        "Indexed {} objects and {} PDOs",
        index.object_count(),
        index.pdo_count()
    );
    Ok(index)
}

/// Mutable state of one indexing run.
pub(crate) struct IndexBuilder<'a> {
    bundle: &'a EsiBundle,
    policy: NumericPolicy,
    ctx: LogContext,
    index: EsiIndex,
}

impl<'a> IndexBuilder<'a> {
    fn new(bundle: &'a EsiBundle, identity: DeviceIdentity, policy: NumericPolicy) -> Self {
        Self {
            bundle,
            policy,
            ctx: LogContext::new("indexer", identity),
            index: EsiIndex::new(identity),
        }
    }

    fn finish(self) -> EsiIndex {
        self.index
    }

    /// Scans every info document of the bundle for the target device.
    ///
    /// Files that are not info documents, or fail to deserialize as one, are
    /// skipped. Every file is scanned so that duplicate matches are detected.
    fn find_device(&self) -> Result<(&'a str, EtherCatInfo, usize), EsiError> {
        let bundle = self.bundle;
        let target = self.index.identity;
        let mut found: Option<(&'a str, EtherCatInfo, usize)> = None;
        let mut matched_files: Vec<String> = Vec::new();

        for (file, contents) in bundle.files() {
            let info = match parse_document(file, contents) {
                Ok(EsiDocument::Info(info)) => info,
                Ok(_) => {
                    esi_debug!(self.ctx, "Skipping '{}': not an EtherCATInfo document", file);
                    continue;
                }
                Err(e) => {
                    esi_debug!(self.ctx, "Skipping '{}': {}", file, e);
                    continue;
                }
            };

            let vendor_id = self.number("Vendor/Id", info.vendor.id.as_deref().unwrap_or(""))?;
            let mut positions = Vec::new();
            for (position, device) in info.descriptions.devices.device.iter().enumerate() {
                if self.device_identity(vendor_id, device)? == target {
                    positions.push(position);
                    matched_files.push(file.to_string());
                }
            }

            if found.is_none() {
                if let Some(&first) = positions.first() {
                    found = Some((file, info, first));
                }
            }
        }

        if matched_files.len() > 1 {
            return Err(EsiError::DuplicateDevice {
                identity: target,
                files: matched_files,
            });
        }
        found.ok_or(EsiError::DeviceNotFound { identity: target })
    }

    fn device_identity(&self, vendor_id: u32, device: &Device) -> Result<DeviceIdentity, EsiError> {
        let device_type = &device.device_type;
        Ok(DeviceIdentity::new(
            vendor_id,
            self.optional_number("Type/@ProductCode", device_type.product_code.as_deref())?,
            self.optional_number("Type/@RevisionNo", device_type.revision_no.as_deref())?,
        ))
    }

    /// Indexes the dictionary and PDOs of the matched device.
    fn index_device(&mut self, file: &str, device: &Device) -> Result<(), EsiError> {
        for profile in &device.profile {
            self.index_objects(file, profile)?;
        }
        self.index_pdo_set(&device.rx_pdo, PdoDirection::Rx)?;
        self.index_pdo_set(&device.tx_pdo, PdoDirection::Tx)?;
        Ok(())
    }

    // --- Numeric Field Helpers ---

    /// Parses a numeric field according to the numeric policy.
    fn number(&self, field: &'static str, raw: &str) -> Result<u32, EsiError> {
        match parse_u32(raw) {
            Ok(value) => Ok(value),
            Err(_) => match self.policy {
                NumericPolicy::Lenient => {
                    esi_warn!(self.ctx, "Invalid {} '{}', reading it as 0", field, raw);
                    Ok(0)
                }
                NumericPolicy::Strict => Err(EsiError::InvalidNumber {
                    field,
                    value: raw.to_string(),
                }),
            },
        }
    }

    fn optional_number(&self, field: &'static str, raw: Option<&str>) -> Result<u32, EsiError> {
        raw.map_or(Ok(0), |raw| self.number(field, raw))
    }
}
