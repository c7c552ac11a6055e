// crates/ethercat-esi/src/model/dictionary.rs

//! Contains model structs related to `<Profile>` and the CoE `<Dictionary>`.
//! (Schema: `EtherCATInfo.xsd`, `EtherCATDict.xsd`)

use super::common::{Flags, LocalizedName};
use alloc::string::String;
use alloc::vec::Vec;
use serde::Deserialize;

/// Represents a `<Profile>` element. Also the shape of a profile-wrapped
/// external dictionary file.
#[derive(Debug, Deserialize, Default)]
pub struct Profile {
    /// Path of an external dictionary file within the bundle.
    #[serde(rename = "DictionaryFile", default)]
    pub dictionary_file: Option<String>,

    #[serde(rename = "Dictionary", default)]
    pub dictionary: Option<Dictionary>,
}

/// Represents a `<Dictionary>` (the CoE object dictionary).
#[derive(Debug, Deserialize, Default)]
pub struct Dictionary {
    #[serde(rename = "DataTypes", default)]
    pub data_types: DataTypes,

    #[serde(rename = "Objects", default)]
    pub objects: Objects,
}

#[derive(Debug, Deserialize, Default)]
pub struct DataTypes {
    #[serde(rename = "DataType", default)]
    pub data_type: Vec<DataType>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Objects {
    #[serde(rename = "Object", default)]
    pub object: Vec<Object>,
}

/// Represents a `<DataType>`: a record, an array or a base type alias.
#[derive(Debug, Deserialize, Default)]
pub struct DataType {
    #[serde(rename = "Name", default)]
    pub name: String,

    /// Element type of an array data type.
    #[serde(rename = "BaseType", default)]
    pub base_type: Option<String>,

    #[serde(rename = "BitSize", default)]
    pub bit_size: Option<String>,

    #[serde(rename = "ArrayInfo", default)]
    pub array_info: Vec<ArrayInfo>,

    #[serde(rename = "SubItem", default)]
    pub sub_item: Vec<SubItem>,
}

/// Represents `<ArrayInfo><LBound>1</LBound><Elements>8</Elements></ArrayInfo>`
#[derive(Debug, Deserialize, Default)]
pub struct ArrayInfo {
    #[serde(rename = "LBound", default)]
    pub l_bound: Option<String>,
    #[serde(rename = "Elements", default)]
    pub elements: Option<String>,
}

/// Represents a `<SubItem>` of a `<DataType>`.
#[derive(Debug, Deserialize, Default)]
pub struct SubItem {
    /// Absent for sub-items that stand for a whole array.
    #[serde(rename = "SubIdx", default)]
    pub sub_idx: Option<String>,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Type", default)]
    pub data_type: String,

    #[serde(rename = "BitSize", default)]
    pub bit_size: Option<String>,

    #[serde(rename = "Flags", default)]
    pub flags: Option<Flags>,
}

/// Represents an `<Object>` in the `<Objects>` list.
#[derive(Debug, Deserialize, Default)]
pub struct Object {
    #[serde(rename = "Index")]
    pub index: String,

    #[serde(rename = "Name", default)]
    pub name: Vec<LocalizedName>,

    #[serde(rename = "Type", default)]
    pub data_type: String,

    #[serde(rename = "BitSize", default)]
    pub bit_size: Option<String>,

    #[serde(rename = "Info", default)]
    pub info: Option<ObjectInfo>,

    #[serde(rename = "Flags", default)]
    pub flags: Option<Flags>,
}

/// Represents the `<Info>` block of an `<Object>`.
#[derive(Debug, Deserialize, Default)]
pub struct ObjectInfo {
    #[serde(rename = "DefaultData", default)]
    pub default_data: Option<String>,

    /// Per-sub-index values, listed in sub-index order.
    #[serde(rename = "SubItem", default)]
    pub sub_item: Vec<SubItemInfo>,
}

/// Represents a `<SubItem>` inside an object's `<Info>`.
#[derive(Debug, Deserialize, Default)]
pub struct SubItemInfo {
    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Info", default)]
    pub info: Option<ObjectInfo>,
}
