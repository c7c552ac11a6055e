// crates/ethercat-esi/src/indexer/references.rs

use super::IndexBuilder;
use crate::error::EsiError;
use crate::log::{esi_debug, esi_info, esi_warn};
use crate::model::Module;
use crate::naming::pick_name;
use crate::parser::{EsiDocument, parse_document};
use crate::types::PdoDirection;
use alloc::string::{String, ToString};

impl IndexBuilder<'_> {
    /// Follows the `InfoReference`s of the matched device's document exactly
    /// one level deep and indexes every module found there.
    ///
    /// A referenced file is classified by its root element: `<EtherCATModule>`
    /// lists modules directly, `<EtherCATInfo>` holds them under
    /// `Descriptions/Modules`. Other files are skipped with a warning.
    pub(super) fn index_references(&mut self, file: &str, references: &[String]) -> Result<(), EsiError> {
        let bundle = self.bundle;

        for reference in references.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            let (path, contents) =
                bundle
                    .resolve_reference(file, reference)
                    .ok_or_else(|| EsiError::ReferenceNotFound {
                        from: file.to_string(),
                        reference: reference.to_string(),
                    })?;

            let (modules, nested) = match parse_document(path, contents)? {
                EsiDocument::Module(doc) => (doc.modules.module, doc.info_reference),
                EsiDocument::Info(doc) => (doc.descriptions.modules.module, doc.info_reference),
                _ => {
                    esi_warn!(self.ctx, "Referenced file '{}' holds no modules, ignoring it", path);
                    continue;
                }
            };

            if nested.iter().any(|r| !r.trim().is_empty()) {
                return Err(EsiError::DeepNesting {
                    file: path.to_string(),
                });
            }

            esi_info!(self.ctx, "Indexing {} modules from '{}'", modules.len(), path);
            for module in &modules {
                self.index_module(path, module)?;
            }
        }
        Ok(())
    }

    /// Indexes a module exactly like the main device.
    fn index_module(&mut self, file: &str, module: &Module) -> Result<(), EsiError> {
        esi_debug!(
            self.ctx,
            "Indexing module '{}' ({})",
            pick_name(&module.name),
            module.module_type.value.trim()
        );
        for profile in &module.profile {
            self.index_objects(file, profile)?;
        }
        self.index_pdo_set(&module.rx_pdo, PdoDirection::Rx)?;
        self.index_pdo_set(&module.tx_pdo, PdoDirection::Tx)
    }
}
