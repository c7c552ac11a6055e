// src/lib.rs

#![cfg_attr(not(feature = "std"), no_std)]
#![doc = "Indexes EtherCAT ESI (ETG.2000) device descriptions and resolves process variables."]
#![doc = ""]
#![doc = "This `no_std + alloc` library builds immutable lookup indices over a device's"]
#![doc = "CoE dictionary and PDOs, then turns variable requests into EBI instructions."]
#![doc = ""]
#![doc = "It supports:"]
#![doc = "- `load_and_index_esi`: Locating a device in an ESI bundle and indexing it."]
#![doc = "- `EsiIndex::find_object`: Resolving a name or `INDEX.SUBINDEX` to an object."]
#![doc = "- `EsiIndex::find_pdo`: Choosing the PDO that should carry an object."]
#![doc = "- `Session::generate_instructions`: Recording the resulting wire-image changes."]

extern crate alloc;

// --- Crate Modules ---

mod bundle;
mod config;
mod device;
mod ebi;
mod error;
mod indexer;
mod log;
mod model;
mod naming;
mod parser;
mod planner;
mod resolver;
mod types;

// --- Public API Re-exports ---

pub use bundle::{DataAssetClient, ESI_BUNDLE_INTERFACE, EsiBundle, normalize_path};
pub use config::{DeviceConfig, NumericPolicy};
pub use device::{EsiDevice, VariablePlacement};
#[cfg(feature = "std")]
pub use ebi::SharedMapping;
pub use ebi::{EbiInstructions, ObjectAddition, Session};
pub use error::{ErrorKind, EsiError};
pub use indexer::{EsiIndex, load_and_index_esi};
pub use naming::make_fallback_variable_name;
pub use parser::{DocumentKind, classify_document, parse_bool, parse_u32};
pub use resolver::NAME_PREFIX;
pub use types::{
    DeviceIdentity, ObjectAddress, ObjectMetadata, PdoDirection, PdoMapping, PdoMetadata,
};
