// crates/ethercat-esi/src/device.rs

use crate::bundle::{DataAssetClient, EsiBundle};
use crate::config::DeviceConfig;
use crate::ebi::Session;
use crate::error::EsiError;
use crate::indexer::{EsiIndex, load_and_index_esi};
use crate::log::{LogContext, esi_info};
use crate::types::{DeviceIdentity, ObjectAddress, ObjectMetadata, PdoDirection, PdoMetadata};
use alloc::string::{String, ToString};
use serde::Serialize;

/// Where a planned variable lives on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariablePlacement {
    pub address: ObjectAddress,
    pub pdo_index: u32,
    pub name: String,
    pub data_type: String,
    pub bit_size: u32,
}

/// One SubDevice with its ESI indexed, ready to resolve variables.
///
/// The index is immutable after construction; resolution and planning only
/// borrow it, so one `EsiDevice` can serve concurrent requests. Planning
/// state lives in the caller's [`Session`].
#[derive(Debug, Clone)]
pub struct EsiDevice {
    index: EsiIndex,
    config: DeviceConfig,
}

impl EsiDevice {
    /// Indexes `bundle` for the device named by `config`.
    ///
    /// # Errors
    /// `MissingConfig` / `MissingIdentity` before any file is read, then any
    /// error of [`load_and_index_esi`].
    pub fn new(config: Option<&DeviceConfig>, bundle: &EsiBundle) -> Result<Self, EsiError> {
        let config = config.ok_or(EsiError::MissingConfig)?;
        let identity = config.require_identity()?;
        let index = load_and_index_esi(bundle, identity, config.numeric_policy)?;

        esi_info!(
            LogContext::new("device", identity),
            "ESI device ready ({} bundle files)",
            bundle.len()
        );
        Ok(Self {
            index,
            config: config.clone(),
        })
    }

    /// Fetches the bundle through `client`, then indexes it.
    ///
    /// The dependency reference is `config.bundle_ref`, or the device
    /// identity when none is configured.
    pub fn from_client(
        config: Option<&DeviceConfig>,
        client: &impl DataAssetClient,
    ) -> Result<Self, EsiError> {
        let config = config.ok_or(EsiError::MissingConfig)?;
        let identity = config.require_identity()?;
        let dependency = match config.bundle_ref.as_deref() {
            Some(reference) => reference.to_string(),
            None => identity.to_string(),
        };
        let bundle = EsiBundle::fetch(client, &dependency)?;
        Self::new(Some(config), &bundle)
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.index.identity()
    }

    pub fn index(&self) -> &EsiIndex {
        &self.index
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Resolves a variable request. A non-empty `pdo_hint` names the PDO
    /// whose own entry names are searched first.
    pub fn resolve_variable(
        &self,
        object: &str,
        pdo_hint: &str,
        preferred: PdoDirection,
    ) -> Result<(ObjectAddress, &ObjectMetadata), EsiError> {
        let context = self.pdo_context(pdo_hint)?;
        self.index.find_object(object, context, preferred)
    }

    /// Resolves a variable, places it into a PDO and records the resulting
    /// wire-image changes in `session`.
    ///
    /// On error `session` is left unchanged.
    pub fn plan_variable(
        &self,
        session: &mut Session,
        object: &str,
        pdo_hint: &str,
        preferred: PdoDirection,
    ) -> Result<VariablePlacement, EsiError> {
        let (address, meta) = self.resolve_variable(object, pdo_hint, preferred)?;
        let pdo = self.index.find_pdo(session, pdo_hint, address, meta, preferred)?;
        session.generate_instructions(&self.index, pdo, address, meta)?;

        Ok(VariablePlacement {
            address,
            pdo_index: pdo.index,
            name: meta.name.clone(),
            data_type: meta.data_type.clone(),
            bit_size: meta.bit_size,
        })
    }

    fn pdo_context(&self, pdo_hint: &str) -> Result<Option<&PdoMetadata>, EsiError> {
        let pdo_hint = pdo_hint.trim();
        if pdo_hint.is_empty() {
            return Ok(None);
        }
        self.index.find_pdo_by_hint(pdo_hint).map(Some)
    }
}
