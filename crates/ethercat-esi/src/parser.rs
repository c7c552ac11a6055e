// crates/ethercat-esi/src/parser.rs

use crate::error::EsiError;
use crate::model::{Dictionary, EtherCatInfo, EtherCatModule, Profile};
use alloc::string::ToString;
use core::num::ParseIntError;
use quick_xml::Reader;
use quick_xml::events::Event;

/// The schema a bundle file follows, decided from its root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `<EtherCATInfo>`: devices, and optionally modules.
    Info,
    /// `<EtherCATModule>`: a file directly listing modules.
    Module,
    /// A bare `<Dictionary>`.
    Dictionary,
    /// `<Profile>` or `<EtherCATDict>` wrapping a `<Dictionary>`.
    Profile,
    /// Anything else, including files that are not well-formed XML.
    Unrecognized,
}

/// A bundle file deserialized according to its [`DocumentKind`].
#[derive(Debug)]
pub enum EsiDocument {
    Info(EtherCatInfo),
    Module(EtherCatModule),
    Dictionary(Dictionary),
    Profile(Profile),
    Unrecognized,
}

/// Classifies an XML document by the local name of its root element.
///
/// Only the prolog and the root start tag are read.
pub fn classify_document(xml_content: &str) -> DocumentKind {
    let mut reader = Reader::from_str(xml_content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"EtherCATInfo" => DocumentKind::Info,
                    b"EtherCATModule" => DocumentKind::Module,
                    b"Dictionary" => DocumentKind::Dictionary,
                    b"Profile" | b"EtherCATDict" => DocumentKind::Profile,
                    _ => DocumentKind::Unrecognized,
                };
            }
            Ok(Event::Eof) | Err(_) => return DocumentKind::Unrecognized,
            Ok(_) => {}
        }
    }
}

/// Classifies `xml_content` and deserializes it into the matching model.
///
/// # Errors
/// Returns `EsiError::XmlParsing` if the document is recognized but does not
/// deserialize into its schema.
pub fn parse_document(file: &str, xml_content: &str) -> Result<EsiDocument, EsiError> {
    let map_err = |source| EsiError::XmlParsing {
        file: file.to_string(),
        source,
    };

    Ok(match classify_document(xml_content) {
        DocumentKind::Info => {
            EsiDocument::Info(quick_xml::de::from_str(xml_content).map_err(map_err)?)
        }
        DocumentKind::Module => {
            EsiDocument::Module(quick_xml::de::from_str(xml_content).map_err(map_err)?)
        }
        DocumentKind::Dictionary => {
            EsiDocument::Dictionary(quick_xml::de::from_str(xml_content).map_err(map_err)?)
        }
        DocumentKind::Profile => {
            EsiDocument::Profile(quick_xml::de::from_str(xml_content).map_err(map_err)?)
        }
        DocumentKind::Unrecognized => EsiDocument::Unrecognized,
    })
}

// --- Helper Functions ---

/// Parses a decimal, `0x...` or `#x...` string into a u32.
///
/// An empty string parses to 0.
pub fn parse_u32(s: &str) -> Result<u32, ParseIntError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let hex = ["0x", "0X", "#x", "#X"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix));
    match hex {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => trimmed.parse(),
    }
}

/// Parses an ESI boolean attribute (`1`/`0`/`true`/`false`).
pub fn parse_bool(s: &str) -> Option<bool> {
    let trimmed = s.trim();
    if trimmed == "1" || trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed == "0" || trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
