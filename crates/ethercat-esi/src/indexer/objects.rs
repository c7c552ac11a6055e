// crates/ethercat-esi/src/indexer/objects.rs

use super::IndexBuilder;
use crate::config::NumericPolicy;
use crate::error::EsiError;
use crate::log::{esi_trace, esi_warn};
use crate::model::Profile;
use crate::model::common::Flags;
use crate::model::dictionary::{DataType, Dictionary, Object, ObjectInfo, SubItem};
use crate::naming::{make_fallback_variable_name, pick_name};
use crate::parser::{EsiDocument, parse_document};
use crate::types::{ObjectMetadata, PdoMapping};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// CoE sub-indices are 8 bits wide.
const MAX_SUB_INDEX: u32 = 0xFF;

/// Data types of a profile, by name.
type TypeMap<'t> = BTreeMap<&'t str, &'t DataType>;

/// Attributes a sub-item inherits from its parent object.
struct Parent<'p> {
    index: u32,
    mapping: PdoMapping,
    access: Option<String>,
    info: Option<&'p ObjectInfo>,
}

impl IndexBuilder<'_> {
    /// Indexes the inline dictionary of `profile` merged with the external
    /// dictionary file it references, if any.
    pub(super) fn index_objects(&mut self, file: &str, profile: &Profile) -> Result<(), EsiError> {
        let external = match profile.dictionary_file.as_deref().map(str::trim) {
            Some(reference) if !reference.is_empty() => {
                self.load_dictionary_file(file, reference)?
            }
            _ => None,
        };

        let dictionaries: Vec<&Dictionary> =
            profile.dictionary.iter().chain(external.iter()).collect();

        let types: TypeMap<'_> = dictionaries
            .iter()
            .copied()
            .flat_map(|d| d.data_types.data_type.iter())
            .map(|dt| (dt.name.trim(), dt))
            .collect();

        for object in dictionaries
            .iter()
            .copied()
            .flat_map(|d| d.objects.object.iter())
        {
            self.index_object(object, &types)?;
        }
        Ok(())
    }

    /// Loads an external dictionary file, either bare or profile-wrapped.
    fn load_dictionary_file(
        &self,
        file: &str,
        reference: &str,
    ) -> Result<Option<Dictionary>, EsiError> {
        let bundle = self.bundle;
        let (path, contents) =
            bundle
                .resolve_reference(file, reference)
                .ok_or_else(|| EsiError::ReferenceNotFound {
                    from: file.to_string(),
                    reference: reference.to_string(),
                })?;

        match parse_document(path, contents)? {
            EsiDocument::Dictionary(dictionary) => Ok(Some(dictionary)),
            EsiDocument::Profile(Profile {
                dictionary: Some(dictionary),
                ..
            }) => Ok(Some(dictionary)),
            _ => {
                esi_warn!(self.ctx, "Dictionary file '{}' holds no dictionary, ignoring it", path);
                Ok(None)
            }
        }
    }

    /// Indexes sub-index 0 of `object` and every sub-item its data type declares.
    fn index_object(&mut self, object: &Object, types: &TypeMap<'_>) -> Result<(), EsiError> {
        let index = self.number("Object/Index", &object.index)?;
        let type_name = object.data_type.trim();
        let flags = object.flags.as_ref();
        let info = object.info.as_ref();

        let mut root = ObjectMetadata {
            index,
            sub_index: 0,
            name: name_or_fallback(&pick_name(&object.name), index, 0),
            data_type: type_name.to_string(),
            bit_size: self.optional_number("Object/BitSize", object.bit_size.as_deref())?,
            pdo_mapping: mapping_flag(flags).unwrap_or_default(),
            access: access_flag(flags),
            default_data: self.default_data(info.and_then(|i| i.default_data.as_deref()))?,
        };

        if let Some(data_type) = types.get(type_name) {
            let parent = Parent {
                index,
                mapping: root.pdo_mapping,
                access: root.access.clone(),
                info,
            };
            let mut next_sub_index = 1;

            for item in &data_type.sub_item {
                match item.sub_idx.as_deref() {
                    Some(raw) => {
                        let sub_index = self.number("SubItem/SubIdx", raw)?;
                        if sub_index == 0 {
                            // The data type redefines sub-index 0 (e.g. the entry count).
                            root.data_type = item.data_type.trim().to_string();
                            root.bit_size =
                                self.optional_number("SubItem/BitSize", item.bit_size.as_deref())?;
                            if let Some(mapping) = mapping_flag(item.flags.as_ref()) {
                                root.pdo_mapping = mapping;
                            }
                            continue;
                        }
                        self.index_sub_item(&parent, sub_index, item)?;
                        next_sub_index = sub_index + 1;
                    }
                    None => match types.get(item.data_type.trim()).filter(|t| is_array(t)) {
                        Some(array) => {
                            next_sub_index =
                                self.index_array_elements(&parent, next_sub_index, item, array)?;
                        }
                        None => {
                            self.index_sub_item(&parent, next_sub_index, item)?;
                            next_sub_index += 1;
                        }
                    },
                }
            }
        }

        esi_trace!(self.ctx, "Indexed object {} '{}'", root.address(), root.name);
        self.index.insert_object(root);
        Ok(())
    }

    fn index_sub_item(
        &mut self,
        parent: &Parent<'_>,
        sub_index: u32,
        item: &SubItem,
    ) -> Result<(), EsiError> {
        let name = item.name.trim();
        let default_data = parent
            .info
            .and_then(|info| info.sub_item.iter().find(|s| s.name.trim() == name))
            .and_then(|s| s.info.as_ref())
            .and_then(|i| i.default_data.as_deref());

        let flags = item.flags.as_ref();
        let meta = ObjectMetadata {
            index: parent.index,
            sub_index,
            name: name_or_fallback(name, parent.index, sub_index),
            data_type: item.data_type.trim().to_string(),
            bit_size: self.optional_number("SubItem/BitSize", item.bit_size.as_deref())?,
            pdo_mapping: mapping_flag(flags).unwrap_or(parent.mapping),
            access: access_flag(flags).or_else(|| parent.access.clone()),
            default_data: self.default_data(default_data)?,
        };
        self.index.insert_object(meta);
        Ok(())
    }

    /// Expands a sub-item of array type into one sub-index per element.
    /// Returns the next free sub-index.
    fn index_array_elements(
        &mut self,
        parent: &Parent<'_>,
        first_free: u32,
        item: &SubItem,
        array: &DataType,
    ) -> Result<u32, EsiError> {
        let bounds = &array.array_info[0];
        let l_bound = self.optional_number("ArrayInfo/LBound", bounds.l_bound.as_deref())?;
        let elements = self.optional_number("ArrayInfo/Elements", bounds.elements.as_deref())?;
        let total_bits = self.optional_number("DataType/BitSize", array.bit_size.as_deref())?;

        let start = if l_bound == 0 { first_free } else { l_bound };
        let end = start.saturating_add(elements);
        if end > MAX_SUB_INDEX + 1 {
            esi_warn!(
                self.ctx,
                "Array '{}' of object #x{:04X} exceeds sub-index {}, truncating",
                item.name.trim(),
                parent.index,
                MAX_SUB_INDEX
            );
        }
        let end = end.min(MAX_SUB_INDEX + 1);

        let element_type = array.base_type.as_deref().unwrap_or_default().trim();
        let element_bits = total_bits.checked_div(elements).unwrap_or(0);
        let flags = item.flags.as_ref();

        for sub_index in start..end {
            // Info sub-items are listed by position, starting at sub-index 0.
            let element_info = parent.info.and_then(|i| i.sub_item.get(sub_index as usize));
            let name = element_info.map(|s| s.name.trim()).unwrap_or_default();
            let default_data = element_info
                .and_then(|s| s.info.as_ref())
                .and_then(|i| i.default_data.as_deref());

            self.index.insert_object(ObjectMetadata {
                index: parent.index,
                sub_index,
                name: name_or_fallback(name, parent.index, sub_index),
                data_type: element_type.to_string(),
                bit_size: element_bits,
                pdo_mapping: mapping_flag(flags).unwrap_or(parent.mapping),
                access: access_flag(flags).or_else(|| parent.access.clone()),
                default_data: self.default_data(default_data)?,
            });
        }
        Ok(end)
    }

    /// Decodes a `<DefaultData>` hex blob according to the numeric policy.
    fn default_data(&self, raw: Option<&str>) -> Result<Option<Vec<u8>>, EsiError> {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(None);
        };
        match hex::decode(raw) {
            Ok(data) => Ok(Some(data)),
            Err(e) => match self.policy {
                NumericPolicy::Lenient => {
                    esi_warn!(self.ctx, "Invalid DefaultData '{}' ({}), ignoring it", raw, e);
                    Ok(None)
                }
                NumericPolicy::Strict => Err(e.into()),
            },
        }
    }
}

fn is_array(data_type: &DataType) -> bool {
    !data_type.array_info.is_empty()
}

fn mapping_flag(flags: Option<&Flags>) -> Option<PdoMapping> {
    flags?.pdo_mapping.as_deref().map(PdoMapping::parse)
}

fn access_flag(flags: Option<&Flags>) -> Option<String> {
    flags?
        .access
        .as_ref()
        .map(|a| a.as_str())
        .filter(|a| !a.is_empty())
        .map(ToString::to_string)
}

fn name_or_fallback(name: &str, index: u32, sub_index: u32) -> String {
    let name = name.trim();
    if name.is_empty() {
        make_fallback_variable_name(index, sub_index)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::bundle::EsiBundle;
    use crate::config::NumericPolicy;
    use crate::error::ErrorKind;
    use crate::indexer::load_and_index_esi;
    use crate::types::{DeviceIdentity, ObjectAddress, PdoMapping};
    use alloc::format;
    use alloc::string::String;
    use alloc::vec;

    const IDENTITY: DeviceIdentity = DeviceIdentity::new(2, 0x10, 1);

    fn device_with_profile(profile: &str) -> String {
        format!(
            r##"<EtherCATInfo>
                <Vendor><Id>2</Id></Vendor>
                <Descriptions><Devices>
                  <Device><Type ProductCode="#x10" RevisionNo="1">T</Type>{}</Device>
                </Devices></Descriptions>
            </EtherCATInfo>"##,
            profile
        )
    }

    const RECORD_DICTIONARY: &str = r##"<Dictionary>
        <DataTypes>
          <DataType>
            <Name>DT6000</Name><BitSize>48</BitSize>
            <SubItem><SubIdx>0</SubIdx><Name>SubIndex 000</Name><Type>USINT</Type><BitSize>8</BitSize><Flags><Access>ro</Access></Flags></SubItem>
            <SubItem><SubIdx>1</SubIdx><Name>Underrange</Name><Type>BOOL</Type><BitSize>1</BitSize><Flags><Access>ro</Access><PdoMapping>T</PdoMapping></Flags></SubItem>
            <SubItem><SubIdx>17</SubIdx><Name>Value</Name><Type>INT</Type><BitSize>16</BitSize></SubItem>
          </DataType>
          <DataType>
            <Name>DT8000ARR</Name><BaseType>UINT</BaseType><BitSize>32</BitSize>
            <ArrayInfo><LBound>1</LBound><Elements>2</Elements></ArrayInfo>
          </DataType>
          <DataType>
            <Name>DT8000</Name><BitSize>48</BitSize>
            <SubItem><SubIdx>0</SubIdx><Name>SubIndex 000</Name><Type>USINT</Type><BitSize>8</BitSize></SubItem>
            <SubItem><Name>Elements</Name><Type>DT8000ARR</Type><BitSize>32</BitSize></SubItem>
          </DataType>
        </DataTypes>
        <Objects>
          <Object>
            <Index>#x6000</Index><Name>AI Inputs</Name><Type>DT6000</Type><BitSize>48</BitSize>
            <Info>
              <SubItem><Name>Value</Name><Info><DefaultData>3412</DefaultData></Info></SubItem>
            </Info>
            <Flags><Access>ro</Access><PdoMapping>T</PdoMapping></Flags>
          </Object>
          <Object>
            <Index>#x8000</Index><Name>Limits</Name><Type>DT8000</Type><BitSize>48</BitSize>
            <Info>
              <SubItem><Name>SubIndex 000</Name></SubItem>
              <SubItem><Name>Limit 1</Name><Info><DefaultData>0100</DefaultData></Info></SubItem>
            </Info>
          </Object>
          <Object>
            <Index>#x1000</Index><Name LcId="1033">Device type</Name><Type>UDINT</Type><BitSize>32</BitSize>
            <Info><DefaultData>89130000</DefaultData></Info>
            <Flags><Access>ro</Access></Flags>
          </Object>
        </Objects>
    </Dictionary>"##;

    #[test]
    fn test_index_record_sub_items() {
        let profile = format!("<Profile>{}</Profile>", RECORD_DICTIONARY);
        let bundle = EsiBundle::new(vec![("dev.xml", device_with_profile(&profile))]).unwrap();
        let index = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Lenient).unwrap();

        // Type and size of sub-index 0 come from the data type; the mapping
        // stays the object's since the sub-item carries no PdoMapping flag.
        let root = index.object(ObjectAddress::new(0x6000, 0)).unwrap();
        assert_eq!(root.name, "AI Inputs");
        assert_eq!(root.data_type, "USINT");
        assert_eq!(root.bit_size, 8);
        assert_eq!(root.pdo_mapping, PdoMapping::TX);

        let underrange = index.object(ObjectAddress::new(0x6000, 1)).unwrap();
        assert_eq!(underrange.name, "Underrange");
        assert_eq!(underrange.pdo_mapping, PdoMapping::TX);

        // No own flags: inherits the parent's mapping and access.
        let value = index.object(ObjectAddress::new(0x6000, 17)).unwrap();
        assert_eq!(value.pdo_mapping, PdoMapping::TX);
        assert_eq!(value.access.as_deref(), Some("ro"));
        assert_eq!(value.default_data.as_deref(), Some(&[0x34, 0x12][..]));

        let device_type = index.object(ObjectAddress::new(0x1000, 0)).unwrap();
        assert_eq!(device_type.name, "Device type");
        assert!(device_type.pdo_mapping.is_empty());
        assert_eq!(device_type.default_data.as_deref(), Some(&[0x89, 0x13, 0, 0][..]));
    }

    #[test]
    fn test_index_array_elements() {
        let profile = format!("<Profile>{}</Profile>", RECORD_DICTIONARY);
        let bundle = EsiBundle::new(vec![("dev.xml", device_with_profile(&profile))]).unwrap();
        let index = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Lenient).unwrap();

        let first = index.object(ObjectAddress::new(0x8000, 1)).unwrap();
        assert_eq!(first.name, "Limit 1");
        assert_eq!(first.data_type, "UINT");
        assert_eq!(first.bit_size, 16);
        assert_eq!(first.default_data.as_deref(), Some(&[0x01, 0x00][..]));

        let second = index.object(ObjectAddress::new(0x8000, 2)).unwrap();
        assert_eq!(second.name, "Var_#x8000_2");
        assert!(index.object(ObjectAddress::new(0x8000, 3)).is_none());
    }

    #[test]
    fn test_external_dictionary_file_forms() {
        let device = device_with_profile("<Profile><DictionaryFile>dict/Dict.xml</DictionaryFile></Profile>");
        for dictionary_file in [
            String::from(RECORD_DICTIONARY),
            format!("<Profile>{}</Profile>", RECORD_DICTIONARY),
        ] {
            let bundle = EsiBundle::new(vec![
                ("dev.xml", device.clone()),
                ("dict/Dict.xml", dictionary_file),
            ])
            .unwrap();
            let index = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Lenient).unwrap();
            assert!(index.object(ObjectAddress::new(0x6000, 17)).is_some());
        }
    }

    #[test]
    fn test_missing_dictionary_file() {
        let device = device_with_profile("<Profile><DictionaryFile>Missing.xml</DictionaryFile></Profile>");
        let bundle = EsiBundle::new(vec![("dev.xml", device)]).unwrap();
        let err = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Lenient).unwrap_err();
        assert_eq!(err, ErrorKind::ReferenceNotFound);
    }

    #[test]
    fn test_invalid_default_data_policy() {
        let profile = r##"<Profile><Dictionary><Objects>
            <Object><Index>#x2000</Index><Name>Gain</Name><Type>UINT</Type><BitSize>16</BitSize>
              <Info><DefaultData>XYZ</DefaultData></Info></Object>
        </Objects></Dictionary></Profile>"##;
        let bundle = EsiBundle::new(vec![("dev.xml", device_with_profile(profile))]).unwrap();

        let index = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Lenient).unwrap();
        assert_eq!(index.object(ObjectAddress::new(0x2000, 0)).unwrap().default_data, None);

        let err = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Strict).unwrap_err();
        assert_eq!(err, ErrorKind::HexParsing);
    }
}
