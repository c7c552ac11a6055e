//! Internal `serde` data structures that map directly to the ESI XML schema.
//!
//! This module defines the raw structure of an ESI file as defined by the
//! ETG.2000 XSD schemas. These structs are annotated with `serde` attributes to
//! facilitate parsing via `quick-xml`. They are transient: the indexer reads
//! them once and discards them.

#![allow(clippy::pedantic)] // XML schema naming conventions differ from Rust
#![allow(dead_code)] // Decoded for completeness; the indexer reads a subset

use alloc::string::String;
use alloc::vec::Vec;
use serde::Deserialize;

pub mod common;
pub mod device;
pub mod dictionary;
pub mod pdo;

// Re-export key components for internal use
pub use device::{Device, Module, Modules};
pub use dictionary::{Dictionary, Profile};
pub use pdo::{Entry, Pdo};

/// The root element of a device description file.
///
/// Represents the `<EtherCATInfo>` element defined in `EtherCATInfo.xsd`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename = "EtherCATInfo")]
pub struct EtherCatInfo {
    #[serde(rename = "Vendor", default)]
    pub vendor: Vendor,

    #[serde(rename = "Descriptions", default)]
    pub descriptions: Descriptions,

    /// Other files of the bundle holding modules for this description.
    #[serde(rename = "InfoReference", default)]
    pub info_reference: Vec<String>,
}

/// The root element of a module description file.
///
/// Represents the `<EtherCATModule>` element defined in `EtherCATModule.xsd`.
#[derive(Debug, Deserialize, Default)]
#[serde(rename = "EtherCATModule")]
pub struct EtherCatModule {
    #[serde(rename = "Modules", default)]
    pub modules: Modules,

    #[serde(rename = "InfoReference", default)]
    pub info_reference: Vec<String>,
}

/// Represents `<Vendor>`.
#[derive(Debug, Deserialize, Default)]
pub struct Vendor {
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
}

/// Represents `<Descriptions>`.
#[derive(Debug, Deserialize, Default)]
pub struct Descriptions {
    #[serde(rename = "Groups", default)]
    pub groups: Groups,

    #[serde(rename = "Devices", default)]
    pub devices: Devices,

    #[serde(rename = "Modules", default)]
    pub modules: Modules,
}

#[derive(Debug, Deserialize, Default)]
pub struct Groups {
    #[serde(rename = "Group", default)]
    pub group: Vec<device::Group>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Devices {
    #[serde(rename = "Device", default)]
    pub device: Vec<Device>,
}
