// crates/ethercat-esi/src/error.rs

use crate::types::{DeviceIdentity, ObjectAddress, PdoDirection};
use alloc::fmt;
use alloc::string::String;
use alloc::vec::Vec;
use hex::FromHexError;
use quick_xml::errors::serialize::DeError;

/// Errors that can occur while indexing an ESI bundle or resolving variables.
///
/// Construction errors (config, bundle, XML, device discovery) are fatal to
/// building an [`crate::EsiDevice`]. Resolution errors are returned per request
/// and leave the index untouched.
#[derive(Debug)]
pub enum EsiError {
    // --- Construction ---
    /// No configuration was supplied.
    MissingConfig,

    /// The configuration carries no device identity.
    MissingIdentity,

    /// The data client returned no bundle for the dependency.
    BundleNotFound { dependency: String },

    /// The bundle payload could not be decoded.
    BundleDecode(serde_json::Error),

    /// A bundle file path is absolute or escapes the bundle root.
    InvalidPath { path: String, reason: &'static str },

    /// An error from the underlying `quick-xml` deserializer.
    XmlParsing { file: String, source: DeError },

    /// No device in the bundle matches the requested identity.
    DeviceNotFound { identity: DeviceIdentity },

    /// More than one device in the bundle matches the requested identity.
    DuplicateDevice {
        identity: DeviceIdentity,
        files: Vec<String>,
    },

    /// A file reached through an `InfoReference` declares further references.
    DeepNesting { file: String },

    /// An `InfoReference` or `DictionaryFile` names a file missing from the bundle.
    ReferenceNotFound { from: String, reference: String },

    /// A numeric field failed to parse under the strict numeric policy.
    InvalidNumber { field: &'static str, value: String },

    /// A `DefaultData` blob contained invalid hex under the strict numeric policy.
    HexParsing(FromHexError),

    // --- Resolution ---
    /// No object matches the requested name or address.
    ObjectNotFound { name: String },

    /// Name matches existed but none survived direction filtering.
    ObjectNotFoundAfterFiltering {
        name: String,
        direction: PdoDirection,
    },

    /// More than one object survived disambiguation.
    AmbiguousObject {
        name: String,
        candidates: Vec<ObjectAddress>,
    },

    /// No PDO matches the given hint.
    PdoNotFound { hint: String },

    /// Several PDOs share the hinted name.
    AmbiguousPdo { hint: String, candidates: Vec<u32> },

    /// The object cannot be mapped into any PDO.
    NotMappable { address: ObjectAddress },

    /// No PDO can carry the object.
    NoPdoAvailable { address: ObjectAddress },

    /// The target PDO is fixed and does not already carry the object.
    FixedPdo { pdo: u32, address: ObjectAddress },

    /// The object's mapping flag does not allow the PDO's direction.
    DirectionMismatch {
        pdo: u32,
        address: ObjectAddress,
        direction: PdoDirection,
    },

    /// The target PDO and an active PDO of this session exclude each other.
    ExclusionConflict { pdo: u32, active: u32 },
}

/// Context-free classification of an [`EsiError`], for equality matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingConfig,
    MissingIdentity,
    BundleNotFound,
    BundleDecode,
    InvalidPath,
    XmlParsing,
    DeviceNotFound,
    DuplicateDevice,
    DeepNesting,
    ReferenceNotFound,
    InvalidNumber,
    HexParsing,
    ObjectNotFound,
    ObjectNotFoundAfterFiltering,
    AmbiguousObject,
    PdoNotFound,
    AmbiguousPdo,
    NotMappable,
    NoPdoAvailable,
    FixedPdo,
    DirectionMismatch,
    ExclusionConflict,
}

impl EsiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EsiError::MissingConfig => ErrorKind::MissingConfig,
            EsiError::MissingIdentity => ErrorKind::MissingIdentity,
            EsiError::BundleNotFound { .. } => ErrorKind::BundleNotFound,
            EsiError::BundleDecode(_) => ErrorKind::BundleDecode,
            EsiError::InvalidPath { .. } => ErrorKind::InvalidPath,
            EsiError::XmlParsing { .. } => ErrorKind::XmlParsing,
            EsiError::DeviceNotFound { .. } => ErrorKind::DeviceNotFound,
            EsiError::DuplicateDevice { .. } => ErrorKind::DuplicateDevice,
            EsiError::DeepNesting { .. } => ErrorKind::DeepNesting,
            EsiError::ReferenceNotFound { .. } => ErrorKind::ReferenceNotFound,
            EsiError::InvalidNumber { .. } => ErrorKind::InvalidNumber,
            EsiError::HexParsing(_) => ErrorKind::HexParsing,
            EsiError::ObjectNotFound { .. } => ErrorKind::ObjectNotFound,
            EsiError::ObjectNotFoundAfterFiltering { .. } => {
                ErrorKind::ObjectNotFoundAfterFiltering
            }
            EsiError::AmbiguousObject { .. } => ErrorKind::AmbiguousObject,
            EsiError::PdoNotFound { .. } => ErrorKind::PdoNotFound,
            EsiError::AmbiguousPdo { .. } => ErrorKind::AmbiguousPdo,
            EsiError::NotMappable { .. } => ErrorKind::NotMappable,
            EsiError::NoPdoAvailable { .. } => ErrorKind::NoPdoAvailable,
            EsiError::FixedPdo { .. } => ErrorKind::FixedPdo,
            EsiError::DirectionMismatch { .. } => ErrorKind::DirectionMismatch,
            EsiError::ExclusionConflict { .. } => ErrorKind::ExclusionConflict,
        }
    }

    /// `true` for errors that only affect a single resolution request.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ObjectNotFound
                | ErrorKind::ObjectNotFoundAfterFiltering
                | ErrorKind::AmbiguousObject
                | ErrorKind::PdoNotFound
                | ErrorKind::AmbiguousPdo
                | ErrorKind::NotMappable
                | ErrorKind::NoPdoAvailable
                | ErrorKind::FixedPdo
                | ErrorKind::DirectionMismatch
                | ErrorKind::ExclusionConflict
        )
    }
}

impl PartialEq<ErrorKind> for EsiError {
    fn eq(&self, other: &ErrorKind) -> bool {
        self.kind() == *other
    }
}

impl From<serde_json::Error> for EsiError {
    fn from(e: serde_json::Error) -> Self {
        EsiError::BundleDecode(e)
    }
}

impl From<FromHexError> for EsiError {
    fn from(e: FromHexError) -> Self {
        EsiError::HexParsing(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EsiError {}

impl fmt::Display for EsiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EsiError::MissingConfig => write!(f, "No device configuration supplied"),
            EsiError::MissingIdentity => {
                write!(f, "Device configuration is missing the device identity")
            }
            EsiError::BundleNotFound { dependency } => {
                write!(f, "ESI bundle not found for dependency '{}'", dependency)
            }
            EsiError::BundleDecode(e) => write!(f, "ESI bundle decoding error: {}", e),
            EsiError::InvalidPath { path, reason } => {
                write!(f, "Invalid bundle path '{}': {}", path, reason)
            }
            EsiError::XmlParsing { file, source } => {
                write!(f, "XML parsing error in '{}': {}", file, source)
            }
            EsiError::DeviceNotFound { identity } => {
                write!(f, "Device not found in ESI bundle ({})", identity)
            }
            EsiError::DuplicateDevice { identity, files } => write!(
                f,
                "Device ({}) matched more than once in ESI bundle: {:?}",
                identity, files
            ),
            EsiError::DeepNesting { file } => write!(
                f,
                "Referenced file '{}' declares further InfoReferences; only one level is supported",
                file
            ),
            EsiError::ReferenceNotFound { from, reference } => write!(
                f,
                "File '{}' references '{}', which is not in the bundle",
                from, reference
            ),
            EsiError::InvalidNumber { field, value } => {
                write!(f, "Invalid numeric value '{}' for {}", value, field)
            }
            EsiError::HexParsing(e) => write!(f, "Hex parsing error: {}", e),
            EsiError::ObjectNotFound { name } => write!(f, "Object '{}' not found", name),
            EsiError::ObjectNotFoundAfterFiltering { name, direction } => write!(
                f,
                "Object '{}' not found after filtering for direction {:?}",
                name, direction
            ),
            EsiError::AmbiguousObject { name, candidates } => write!(
                f,
                "Object name '{}' is ambiguous: {} candidates",
                name,
                candidates.len()
            ),
            EsiError::PdoNotFound { hint } => write!(f, "PDO '{}' not found", hint),
            EsiError::AmbiguousPdo { hint, candidates } => write!(
                f,
                "PDO name '{}' is ambiguous: matches {:04X?}",
                hint, candidates
            ),
            EsiError::NotMappable { address } => {
                write!(f, "Object {} is not mappable to any PDO", address)
            }
            EsiError::NoPdoAvailable { address } => {
                write!(f, "No PDO available to carry object {}", address)
            }
            EsiError::FixedPdo { pdo, address } => write!(
                f,
                "PDO {:#06X} is fixed and cannot be extended with object {}",
                pdo, address
            ),
            EsiError::DirectionMismatch {
                pdo,
                address,
                direction,
            } => write!(
                f,
                "Object {} cannot be mapped into {:?} PDO {:#06X}",
                address, direction, pdo
            ),
            EsiError::ExclusionConflict { pdo, active } => write!(
                f,
                "PDO {:#06X} is mutually exclusive with active PDO {:#06X}",
                pdo, active
            ),
        }
    }
}
