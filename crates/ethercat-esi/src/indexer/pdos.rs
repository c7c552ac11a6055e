// crates/ethercat-esi/src/indexer/pdos.rs

use super::IndexBuilder;
use crate::error::EsiError;
use crate::log::{esi_debug, esi_warn};
use crate::model::{Entry, Pdo};
use crate::naming::{make_fallback_variable_name, pick_name};
use crate::parser::parse_bool;
use crate::types::{ObjectAddress, ObjectMetadata, PdoDirection, PdoMapping, PdoMetadata};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A PDO after [`IndexBuilder::index_pdos`]: its registered index, if it
/// won the registration, and its non-padding entries.
pub(super) struct IndexedPdo<'p> {
    owner: Option<u32>,
    entries: Vec<(ObjectAddress, &'p Entry)>,
}

impl IndexBuilder<'_> {
    /// Indexes one `<RxPdo>` or `<TxPdo>` list, then the objects its entries declare.
    pub(super) fn index_pdo_set(&mut self, pdos: &[Pdo], direction: PdoDirection) -> Result<(), EsiError> {
        let indexed = self.index_pdos(pdos, direction)?;
        self.index_pdo_entries(&indexed, PdoMapping::for_direction(direction))
    }

    /// Records the metadata of each PDO and pre-populates its contextual
    /// name map from the names its entries declare.
    pub(super) fn index_pdos<'p>(
        &mut self,
        pdos: &'p [Pdo],
        direction: PdoDirection,
    ) -> Result<Vec<IndexedPdo<'p>>, EsiError> {
        let mut indexed = Vec::with_capacity(pdos.len());

        for pdo in pdos {
            let index = self.number("Pdo/Index", pdo.index.as_str())?;
            let mut meta = PdoMetadata {
                index,
                name: pick_name(&pdo.name),
                direction,
                fixed: pdo.fixed.as_deref().and_then(parse_bool).unwrap_or(false),
                mandatory: pdo.mandatory.as_deref().and_then(parse_bool).unwrap_or(false),
                default_sm: self.optional_number("Pdo/@Sm", pdo.sm.as_deref())?,
                ..PdoMetadata::default()
            };

            for exclude in &pdo.exclude {
                meta.excludes.push(self.number("Pdo/Exclude", exclude.as_str())?);
            }

            let mut entries = Vec::with_capacity(pdo.entry.len());
            for entry in &pdo.entry {
                let entry_index = self.number("Entry/Index", entry.index.as_str())?;
                if entry_index == 0 {
                    // Padding.
                    continue;
                }
                let sub_index = self.optional_number("Entry/SubIndex", entry.sub_index.as_deref())?;
                let addr = ObjectAddress::new(entry_index, sub_index);

                meta.default_entries.push(addr);
                let name = pick_name(&entry.name);
                if !name.is_empty() {
                    meta.name_to_addr.entry(name).or_insert(addr);
                }
                entries.push((addr, entry));
            }

            esi_debug!(
                self.ctx,
                "Indexed {:?} PDO {:#06X} '{}' ({} entries, sm {})",
                direction,
                index,
                meta.name,
                meta.default_entries.len(),
                meta.default_sm
            );

            let owner = if self.index.insert_pdo(meta) {
                Some(index)
            } else {
                esi_warn!(self.ctx, "PDO {:#06X} is declared more than once, keeping the first", index);
                None
            };
            indexed.push(IndexedPdo { owner, entries });
        }
        Ok(indexed)
    }

    /// Supplements the dictionary with the objects PDO entries declare and
    /// completes each PDO's contextual name map.
    ///
    /// Objects already indexed have `mapping` merged into their flag, so an
    /// object found in both a Tx and an Rx PDO ends up mappable both ways.
    pub(super) fn index_pdo_entries(
        &mut self,
        pdos: &[IndexedPdo<'_>],
        mapping: PdoMapping,
    ) -> Result<(), EsiError> {
        for pdo in pdos {
            for &(addr, entry) in &pdo.entries {
                let name = self.entry_name(addr, entry);

                if let Some(meta) = pdo.owner.and_then(|owner| self.index.pdo_mut(owner)) {
                    meta.name_to_addr.entry(name.clone()).or_insert(addr);
                }

                if self.index.merge_mapping(addr, mapping) {
                    continue;
                }
                let bit_size = self.optional_number("Entry/BitLen", entry.bit_len.as_deref())?;
                self.index.insert_object(ObjectMetadata {
                    index: addr.index,
                    sub_index: addr.sub_index,
                    name,
                    data_type: entry
                        .data_type
                        .as_ref()
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_default(),
                    bit_size,
                    pdo_mapping: mapping,
                    access: None,
                    default_data: None,
                });
            }
        }
        Ok(())
    }

    /// Entry's own name, else the dictionary name, else a synthesized one.
    fn entry_name(&self, addr: ObjectAddress, entry: &Entry) -> String {
        let own = pick_name(&entry.name);
        if !own.is_empty() {
            return own;
        }
        match self.index.object(addr) {
            Some(meta) => meta.name.clone(),
            None => make_fallback_variable_name(addr.index, addr.sub_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::bundle::EsiBundle;
    use crate::config::NumericPolicy;
    use crate::indexer::load_and_index_esi;
    use crate::types::{DeviceIdentity, ObjectAddress, PdoDirection, PdoMapping};
    use alloc::format;
    use alloc::vec;

    const IDENTITY: DeviceIdentity = DeviceIdentity::new(2, 0x10, 1);

    fn bundle(device_body: &str) -> EsiBundle {
        let xml = format!(
            r##"<EtherCATInfo>
                <Vendor><Id>2</Id></Vendor>
                <Descriptions><Devices>
                  <Device><Type ProductCode="#x10" RevisionNo="1">T</Type>{}</Device>
                </Devices></Descriptions>
            </EtherCATInfo>"##,
            device_body
        );
        EsiBundle::new(vec![("dev.xml", xml)]).unwrap()
    }

    #[test]
    fn test_pdo_metadata() {
        let bundle = bundle(
            r##"<TxPdo Fixed="1" Mandatory="true" Sm="3">
                  <Index>#x1A00</Index><Name>Channel 1</Name>
                  <Exclude>#x1A01</Exclude>
                  <Entry><Index>#x6000</Index><SubIndex>1</SubIndex><BitLen>1</BitLen><Name>Input</Name><DataType>BOOL</DataType></Entry>
                  <Entry><Index>0</Index><BitLen>7</BitLen></Entry>
                </TxPdo>
                <TxPdo>
                  <Index>#x1A01</Index><Name>Channel 1 (alt)</Name>
                  <Exclude>#x1A00</Exclude>
                </TxPdo>"##,
        );
        let index = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Lenient).unwrap();

        let pdo = index.pdo(0x1A00).unwrap();
        assert_eq!(pdo.name, "Channel 1");
        assert_eq!(pdo.direction, PdoDirection::Tx);
        assert!(pdo.fixed);
        assert!(pdo.mandatory);
        assert!(pdo.is_default_active());
        assert_eq!(pdo.excludes, [0x1A01]);
        // Padding is not an entry.
        assert_eq!(pdo.default_entries, [ObjectAddress::new(0x6000, 1)]);
        assert_eq!(pdo.name_to_addr.get("Input"), Some(&ObjectAddress::new(0x6000, 1)));

        let alt = index.pdo(0x1A01).unwrap();
        assert!(!alt.fixed);
        assert_eq!(alt.default_sm, 0);

        let input = index.object(ObjectAddress::new(0x6000, 1)).unwrap();
        assert_eq!(input.data_type, "BOOL");
        assert_eq!(input.bit_size, 1);
        assert_eq!(input.pdo_mapping, PdoMapping::TX);
        assert!(index.object(ObjectAddress::new(0, 0)).is_none());
    }

    #[test]
    fn test_entry_in_both_directions_is_flagged_rt() {
        let bundle = bundle(
            r##"<RxPdo><Index>#x1600</Index><Name>Out</Name>
                  <Entry><Index>#x7000</Index><SubIndex>1</SubIndex><BitLen>16</BitLen><Name>Value</Name><DataType>UINT</DataType></Entry>
                </RxPdo>
                <TxPdo><Index>#x1A00</Index><Name>In</Name>
                  <Entry><Index>#x7000</Index><SubIndex>1</SubIndex><BitLen>16</BitLen><Name>Value</Name><DataType>UINT</DataType></Entry>
                </TxPdo>"##,
        );
        let index = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Lenient).unwrap();
        let value = index.object(ObjectAddress::new(0x7000, 1)).unwrap();
        assert_eq!(value.pdo_mapping, PdoMapping::BOTH);
        assert_eq!(index.addresses_named("Value"), [ObjectAddress::new(0x7000, 1)]);
    }

    #[test]
    fn test_entry_name_falls_back_to_dictionary_then_synthesized() {
        let bundle = bundle(
            r##"<Profile><Dictionary><Objects>
                  <Object><Index>#x6000</Index><Name>Status word</Name><Type>UINT</Type><BitSize>16</BitSize></Object>
                </Objects></Dictionary></Profile>
                <TxPdo Sm="3"><Index>#x1A00</Index><Name>In</Name>
                  <Entry><Index>#x6000</Index><SubIndex>0</SubIndex><BitLen>16</BitLen></Entry>
                  <Entry><Index>#x6001</Index><SubIndex>2</SubIndex><BitLen>8</BitLen><DataType>USINT</DataType></Entry>
                </TxPdo>"##,
        );
        let index = load_and_index_esi(&bundle, IDENTITY, NumericPolicy::Lenient).unwrap();
        let pdo = index.pdo(0x1A00).unwrap();
        assert_eq!(
            pdo.name_to_addr.get("Status word"),
            Some(&ObjectAddress::new(0x6000, 0))
        );
        assert_eq!(
            pdo.name_to_addr.get("Var_#x6001_2"),
            Some(&ObjectAddress::new(0x6001, 2))
        );
        // The dictionary object existed already and gains the Tx flag.
        assert_eq!(
            index.object(ObjectAddress::new(0x6000, 0)).unwrap().pdo_mapping,
            PdoMapping::TX
        );
    }
}
