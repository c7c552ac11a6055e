// crates/ethercat-esi/src/bundle.rs

//! The ESI bundle: every file a vendor ships for a device, keyed by its
//! bundle-relative path.
//!
//! Paths are validated and normalized when the bundle is built, before any
//! file is parsed. Files are kept in a `BTreeMap` so that every scan over the
//! bundle visits them in the same order.

use crate::error::EsiError;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use serde::Deserialize;

/// Interface URI under which ESI bundles are published as data assets.
pub const ESI_BUNDLE_INTERFACE: &str = "ethercat.esi.v1.EsiBundle";

/// Source of raw ESI bundle payloads (e.g. a remote data-asset service).
///
/// Transport, retries and cancellation are the implementor's concern.
pub trait DataAssetClient {
    /// Returns the raw payload published for `dependency_ref` under `interface_uri`.
    fn fetch(&self, dependency_ref: &str, interface_uri: &str) -> Result<Vec<u8>, EsiError>;
}

/// Wire shape of a bundle payload: `{"files": {"path": "<xml>"}}`.
#[derive(Debug, Deserialize)]
struct RawBundle {
    #[serde(default)]
    files: BTreeMap<String, String>,
}

/// A validated set of bundle files.
#[derive(Debug, Clone, Default)]
pub struct EsiBundle {
    files: BTreeMap<String, String>,
}

impl EsiBundle {
    /// Builds a bundle from `(path, contents)` pairs.
    ///
    /// # Errors
    /// Returns `EsiError::InvalidPath` for absolute paths, paths escaping the
    /// bundle root, and paths that collide after normalization.
    pub fn new<I, P, C>(files: I) -> Result<Self, EsiError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: Into<String>,
    {
        let mut validated = BTreeMap::new();
        for (path, contents) in files {
            let path = path.as_ref();
            let normalized = normalize_path(path)?;
            if validated.insert(normalized, contents.into()).is_some() {
                return Err(EsiError::InvalidPath {
                    path: path.to_string(),
                    reason: "duplicate path after normalization",
                });
            }
        }
        Ok(Self { files: validated })
    }

    /// Decodes a data-asset payload into a bundle.
    pub fn from_json(payload: &[u8]) -> Result<Self, EsiError> {
        let raw: RawBundle = serde_json::from_slice(payload)?;
        Self::new(raw.files)
    }

    /// Fetches and decodes the bundle published for `dependency_ref`.
    pub fn fetch(client: &impl DataAssetClient, dependency_ref: &str) -> Result<Self, EsiError> {
        let payload = client.fetch(dependency_ref, ESI_BUNDLE_INTERFACE)?;
        if payload.is_empty() {
            return Err(EsiError::BundleNotFound {
                dependency: dependency_ref.to_string(),
            });
        }
        Self::from_json(&payload)
    }

    pub(crate) fn len(&self) -> usize {
        self.files.len()
    }

    /// Iterates `(path, contents)` in ascending path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Resolves a file reference made from within `from_file`.
    ///
    /// The reference is tried relative to the directory of `from_file`
    /// first, then relative to the bundle root. Returns the normalized path
    /// together with the file contents.
    pub fn resolve_reference(&self, from_file: &str, reference: &str) -> Option<(&str, &str)> {
        let reference = reference.trim();
        let relative = from_file
            .rsplit_once('/')
            .map(|(dir, _)| format!("{}/{}", dir, reference));

        relative
            .iter()
            .map(String::as_str)
            .chain(core::iter::once(reference))
            .filter_map(|candidate| normalize_path(candidate).ok())
            .find_map(|candidate| self.files.get_key_value(&candidate))
            .map(|(p, c)| (p.as_str(), c.as_str()))
    }
}

/// Validates a bundle path and returns its normalized, `/`-separated form.
///
/// # Errors
/// Returns `EsiError::InvalidPath` if the path is empty, absolute, or walks
/// above the bundle root.
pub fn normalize_path(path: &str) -> Result<String, EsiError> {
    let invalid = |reason| EsiError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    let unified = path.trim().replace('\\', "/");
    if unified.starts_with('/') {
        return Err(invalid("absolute path"));
    }
    let mut chars = unified.chars();
    if let (Some(drive), Some(':')) = (chars.next(), chars.next()) {
        if drive.is_ascii_alphabetic() {
            return Err(invalid("absolute path"));
        }
    }

    let mut components: Vec<&str> = Vec::new();
    for component in unified.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(invalid("path escapes the bundle root"));
                }
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        return Err(invalid("empty path"));
    }
    Ok(components.join("/"))
}
