// crates/ethercat-esi/src/model/common.rs

//! Contains common helper structs shared across the ESI schema.

use crate::naming::ENGLISH_LC_ID;
use crate::parser::parse_u32;
use alloc::string::String;
use serde::Deserialize;

/// Represents `<Name LcId="1033">Value</Name>`
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct LocalizedName {
    #[serde(rename = "@LcId", default)]
    pub lc_id: Option<String>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl LocalizedName {
    pub fn is_english(&self) -> bool {
        self.lc_id
            .as_deref()
            .and_then(|id| parse_u32(id).ok())
            .is_some_and(|id| id == ENGLISH_LC_ID)
    }
}

/// An element whose text is the only content we read, while tolerating
/// vendor attributes (e.g. `<Index DependOnSlot="1">#x1A00</Index>`).
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct TextElement {
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl TextElement {
    pub fn as_str(&self) -> &str {
        self.value.trim()
    }
}

/// Represents `<Flags>` on dictionary objects and data type sub-items.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Flags {
    #[serde(rename = "Access", default)]
    pub access: Option<TextElement>,
    #[serde(rename = "PdoMapping", default)]
    pub pdo_mapping: Option<String>,
}
