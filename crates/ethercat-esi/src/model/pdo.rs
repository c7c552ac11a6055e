// crates/ethercat-esi/src/model/pdo.rs

//! Contains model structs for `<RxPdo>` / `<TxPdo>` and their `<Entry>` children.

use super::common::{LocalizedName, TextElement};
use alloc::string::String;
use alloc::vec::Vec;
use serde::Deserialize;

/// Represents an `<RxPdo>` or `<TxPdo>` element.
#[derive(Debug, Deserialize, Default)]
pub struct Pdo {
    #[serde(rename = "@Fixed", default)]
    pub fixed: Option<String>,

    #[serde(rename = "@Mandatory", default)]
    pub mandatory: Option<String>,

    /// Sync manager the PDO is assigned to by default.
    #[serde(rename = "@Sm", default)]
    pub sm: Option<String>,

    #[serde(rename = "Index")]
    pub index: TextElement,

    #[serde(rename = "Name", default)]
    pub name: Vec<LocalizedName>,

    #[serde(rename = "Exclude", default)]
    pub exclude: Vec<TextElement>,

    #[serde(rename = "Entry", default)]
    pub entry: Vec<Entry>,
}

/// Represents an `<Entry>` of a PDO.
#[derive(Debug, Deserialize, Default)]
pub struct Entry {
    #[serde(rename = "Index")]
    pub index: TextElement,

    /// Absent for padding entries (`Index` 0).
    #[serde(rename = "SubIndex", default)]
    pub sub_index: Option<String>,

    #[serde(rename = "BitLen", default)]
    pub bit_len: Option<String>,

    #[serde(rename = "Name", default)]
    pub name: Vec<LocalizedName>,

    #[serde(rename = "DataType", default)]
    pub data_type: Option<TextElement>,
}
