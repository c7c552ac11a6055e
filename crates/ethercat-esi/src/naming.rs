// crates/ethercat-esi/src/naming.rs

//! Locale-aware name selection and fallback name synthesis.

use crate::model::common::LocalizedName;
use alloc::format;
use alloc::string::String;

/// `LcId` of US English, the preferred display locale.
pub const ENGLISH_LC_ID: u32 = 1033;

/// Picks the display name from a list of localized `<Name>` elements.
///
/// Preference order: English (`LcId` 1033) > first name without an `LcId` >
/// first name in the list > empty string.
pub fn pick_name(names: &[LocalizedName]) -> String {
    names
        .iter()
        .find(|n| n.is_english())
        .or_else(|| names.iter().find(|n| n.lc_id.is_none()))
        .or_else(|| names.first())
        .map(|n| n.value.trim().into())
        .unwrap_or_default()
}

/// Synthesizes a name for an object without any localized name.
///
/// The result cannot collide with another address, e.g. `Var_#x6000_1`.
pub fn make_fallback_variable_name(index: u32, sub_index: u32) -> String {
    format!("Var_#x{:04X}_{}", index, sub_index)
}
