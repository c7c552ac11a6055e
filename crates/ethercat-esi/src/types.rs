// crates/ethercat-esi/src/types.rs

//! Public, ergonomic data structures produced by the indexer.
//!
//! These are the records the resolver, planner and EBI generator work with.
//! Once built they are never mutated, so an [`crate::EsiIndex`] can be shared
//! freely between concurrent readers.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use serde::{Deserialize, Serialize};

// --- Device Identity ---

/// The (VendorID, ProductCode, Revision) triple that selects exactly one
/// `<Device>` from an ESI bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// `<Vendor><Id>` of the document declaring the device.
    pub vendor_id: u32,
    /// `<Type @ProductCode>`
    pub product_code: u32,
    /// `<Type @RevisionNo>`
    pub revision: u32,
}

impl DeviceIdentity {
    pub const fn new(vendor_id: u32, product_code: u32, revision: u32) -> Self {
        Self {
            vendor_id,
            product_code,
            revision,
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vendor={:#010X} product={:#010X} revision={:#010X}",
            self.vendor_id, self.product_code, self.revision
        )
    }
}

// --- Object Addressing ---

/// Canonical key of a CoE dictionary object or PDO entry.
///
/// Two records sharing an address describe the same object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ObjectAddress {
    pub index: u32,
    pub sub_index: u32,
}

impl ObjectAddress {
    pub const fn new(index: u32, sub_index: u32) -> Self {
        Self { index, sub_index }
    }
}

/// Formats as `#xINDEX.SUBINDEX`, which `find_object` accepts back.
impl fmt::Display for ObjectAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#x{:04X}.{}", self.index, self.sub_index)
    }
}

// --- PDO Direction & Mapping Flags ---

/// Direction of a PDO as seen from the MainDevice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PdoDirection {
    /// No direction known, or no preference expressed by a caller.
    #[default]
    Unknown,
    /// `<TxPdo>`: SubDevice inputs.
    Tx,
    /// `<RxPdo>`: SubDevice outputs.
    Rx,
}

/// The set of PDO directions an object may be mapped into.
///
/// Parsed from the ESI `<PdoMapping>` flag (`"T"`, `"R"`, `"RT"`, or empty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PdoMapping {
    tx: bool,
    rx: bool,
}

impl PdoMapping {
    pub const NONE: Self = Self { tx: false, rx: false };
    pub const TX: Self = Self { tx: true, rx: false };
    pub const RX: Self = Self { tx: false, rx: true };
    pub const BOTH: Self = Self { tx: true, rx: true };

    /// Parses an ESI mapping flag. Characters other than `T`/`R` are ignored.
    pub fn parse(flag: &str) -> Self {
        flag.chars().fold(Self::NONE, |acc, c| match c {
            'T' | 't' => acc.union(Self::TX),
            'R' | 'r' => acc.union(Self::RX),
            _ => acc,
        })
    }

    /// The flag a PDO of the given direction grants to the entries it declares.
    pub fn for_direction(direction: PdoDirection) -> Self {
        match direction {
            PdoDirection::Tx => Self::TX,
            PdoDirection::Rx => Self::RX,
            PdoDirection::Unknown => Self::NONE,
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            tx: self.tx || other.tx,
            rx: self.rx || other.rx,
        }
    }

    /// `true` when the object is not mappable to any PDO.
    pub fn is_empty(self) -> bool {
        !self.tx && !self.rx
    }

    /// Whether an object carrying this flag may live in a PDO of `direction`.
    /// `Unknown` accepts any mappable object.
    pub fn allows(self, direction: PdoDirection) -> bool {
        match direction {
            PdoDirection::Tx => self.tx,
            PdoDirection::Rx => self.rx,
            PdoDirection::Unknown => !self.is_empty(),
        }
    }
}

impl fmt::Display for PdoMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rx {
            f.write_str("R")?;
        }
        if self.tx {
            f.write_str("T")?;
        }
        Ok(())
    }
}

// --- Indexed Records ---

/// Everything known about one addressable dictionary object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectMetadata {
    pub index: u32,
    pub sub_index: u32,
    /// Localized name, or a synthesized `Var_#x...` name when none exists.
    pub name: String,
    /// ESI data type name (e.g., `UINT`, `DT6000`).
    pub data_type: String,
    pub bit_size: u32,
    pub pdo_mapping: PdoMapping,
    /// `<Flags><Access>` (e.g., `ro`, `rw`).
    pub access: Option<String>,
    /// Decoded `<Info><DefaultData>`.
    pub default_data: Option<Vec<u8>>,
}

impl ObjectMetadata {
    pub fn address(&self) -> ObjectAddress {
        ObjectAddress::new(self.index, self.sub_index)
    }
}

/// One `<RxPdo>` or `<TxPdo>` as shipped by the ESI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PdoMetadata {
    pub index: u32,
    pub name: String,
    pub direction: PdoDirection,
    /// `@Fixed`: the PDO's entries cannot be modified.
    pub fixed: bool,
    /// `@Mandatory`
    pub mandatory: bool,
    /// `@Sm`: sync manager the PDO is assigned to by default; 0 means the PDO
    /// is not part of the default-active image.
    pub default_sm: u32,
    /// `<Exclude>`: PDO indices that cannot be active together with this one.
    pub excludes: Vec<u32>,
    /// Entry addresses as shipped by the ESI, padding excluded.
    pub default_entries: Vec<ObjectAddress>,
    /// Entry names scoped to this PDO, for contextual lookup.
    pub name_to_addr: BTreeMap<String, ObjectAddress>,
}

impl PdoMetadata {
    pub fn is_default_active(&self) -> bool {
        self.default_sm != 0
    }

    pub fn has_default_entry(&self, addr: ObjectAddress) -> bool {
        self.default_entries.contains(&addr)
    }
}
