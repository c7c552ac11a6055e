// crates/ethercat-esi/src/model/device.rs

//! Contains model structs for `<Device>` and `<Module>` descriptions.

use super::common::{LocalizedName, TextElement};
use super::dictionary::Profile;
use super::pdo::Pdo;
use alloc::string::String;
use alloc::vec::Vec;
use serde::Deserialize;

/// Represents a `<Device>` inside `<Descriptions><Devices>`.
#[derive(Debug, Deserialize, Default)]
pub struct Device {
    #[serde(rename = "@Physics", default)]
    pub physics: Option<String>,

    #[serde(rename = "Type")]
    pub device_type: DeviceType,

    #[serde(rename = "Name", default)]
    pub name: Vec<LocalizedName>,

    #[serde(rename = "Profile", default)]
    pub profile: Vec<Profile>,

    #[serde(rename = "Sm", default)]
    pub sm: Vec<SyncManager>,

    #[serde(rename = "RxPdo", default)]
    pub rx_pdo: Vec<Pdo>,

    #[serde(rename = "TxPdo", default)]
    pub tx_pdo: Vec<Pdo>,
}

/// Represents `<Type ProductCode="#x..." RevisionNo="#x...">EL1008</Type>`
#[derive(Debug, Deserialize, Default)]
pub struct DeviceType {
    #[serde(rename = "@ProductCode", default)]
    pub product_code: Option<String>,

    #[serde(rename = "@RevisionNo", default)]
    pub revision_no: Option<String>,

    #[serde(rename = "$text", default)]
    pub value: String,
}

/// Represents a device `<Sm>` (sync manager) declaration.
#[derive(Debug, Deserialize, Default)]
pub struct SyncManager {
    #[serde(rename = "@StartAddress", default)]
    pub start_address: Option<String>,

    #[serde(rename = "@DefaultSize", default)]
    pub default_size: Option<String>,

    #[serde(rename = "$text", default)]
    pub value: String,
}

/// Represents a `<Module>` from a module list.
#[derive(Debug, Deserialize, Default)]
pub struct Module {
    #[serde(rename = "Type", default)]
    pub module_type: ModuleType,

    #[serde(rename = "Name", default)]
    pub name: Vec<LocalizedName>,

    #[serde(rename = "RxPdo", default)]
    pub rx_pdo: Vec<Pdo>,

    #[serde(rename = "TxPdo", default)]
    pub tx_pdo: Vec<Pdo>,

    #[serde(rename = "Profile", default)]
    pub profile: Vec<Profile>,
}

/// Represents `<Type ModuleIdent="#x...">AX5-Drive</Type>` of a module.
#[derive(Debug, Deserialize, Default)]
pub struct ModuleType {
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// Represents a `<Modules>` list.
#[derive(Debug, Deserialize, Default)]
pub struct Modules {
    #[serde(rename = "Module", default)]
    pub module: Vec<Module>,
}

/// Represents a `<Group>` in `<Descriptions><Groups>`.
#[derive(Debug, Deserialize, Default)]
pub struct Group {
    #[serde(rename = "Type", default)]
    pub group_type: TextElement,

    #[serde(rename = "Name", default)]
    pub name: Vec<LocalizedName>,
}
