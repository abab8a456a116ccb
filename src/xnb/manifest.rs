//! Stream manifest parsing and type reader resolution.
//!
//! Every XNB object stream opens with a manifest: the ordered list of type
//! readers the rest of the stream depends on. The registry resolves each
//! manifest entry to a concrete reader; the resulting table is what type
//! indices in the payload point into (1-based, index 0 reserved for null).

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use super::codec::XnbRead;
use crate::readers::{self, TypeReader};
use crate::util::{Error, Result};

/// One (reader identifier, version) pair from the stream header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub version: i32,
}

/// Manifest entries for one stream. Real files rarely carry more than a
/// handful of readers.
pub type ManifestEntries = SmallVec<[ManifestEntry; 8]>;

/// Read the manifest section: a varint count, then per entry a
/// length-prefixed identifier string and a fixed-width i32 version.
pub fn read_manifest(stream: &mut impl Read) -> Result<ManifestEntries> {
    let count = stream.read_7bit_encoded_int()?;
    let mut entries = ManifestEntries::new();
    for _ in 0..count {
        let name = stream.read_xnb_string()?;
        let version = stream.read_int32()?;
        entries.push(ManifestEntry { name, version });
    }
    Ok(entries)
}

/// Strip assembly qualification from a .NET type name.
///
/// The producer may write either plain type names or assembly-qualified ones
/// (`Ns.Reader, Assembly, Version=..., Culture=..., PublicKeyToken=...`),
/// including inside generic argument brackets. Both forms must resolve to the
/// same reader, so assembly suffixes are dropped everywhere:
///
/// `Ns.ListReader`1[[System.Int32, mscorlib, Version=4.0.0.0]], Ns.Assembly`
/// becomes `Ns.ListReader`1[[System.Int32]]`.
pub fn normalize_reader_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0i32;
    let mut skipping = false;
    for c in name.chars() {
        match c {
            '[' => {
                depth += 1;
                skipping = false;
                out.push(c);
            }
            ']' => {
                depth -= 1;
                skipping = false;
                out.push(c);
            }
            // A comma outside all brackets starts the reader's own assembly
            ',' if depth == 0 => break,
            // A comma between argument brackets separates generic arguments
            ',' if depth == 1 => out.push(c),
            // A comma inside an argument starts that argument's assembly
            ',' => skipping = true,
            _ if skipping => {}
            _ => out.push(c),
        }
    }
    out
}

/// Extract the single generic argument of a normalized generic type name,
/// e.g. `System.Int32` out of `Ns.ListReader`1[[System.Int32]]`.
pub fn generic_argument(name: &str) -> Option<&str> {
    let start = name.find("[[")? + 2;
    let end = name.rfind("]]")?;
    (start <= end).then(|| &name[start..end])
}

/// Factory for one reader family. Receives the normalized manifest name (so
/// generic readers can recover their arguments) and the format version stamp.
pub type ReaderFactory = fn(&str, i32) -> Result<Arc<dyn TypeReader>>;

/// Registry of known type readers, keyed by the identifier the producer
/// writes into the manifest (generic readers are keyed by their open name,
/// e.g. `Ns.ListReader`1`).
///
/// Versions are recorded for diagnostics but not validated; the producer
/// stamps them without the runtime ever enforcing a match.
pub struct TypeReaderRegistry {
    factories: HashMap<String, ReaderFactory>,
}

impl TypeReaderRegistry {
    /// Registry with every built-in reader.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        readers::register_builtins(&mut registry);
        registry
    }

    /// Registry with no readers at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a custom reader family under a manifest identifier.
    pub fn register(&mut self, key: impl Into<String>, factory: ReaderFactory) {
        self.factories.insert(key.into(), factory);
    }

    /// Resolve one manifest entry to a concrete reader.
    ///
    /// An unknown identifier is fatal: every subsequent type index in the
    /// stream is meaningless without the complete table.
    pub fn resolve(&self, entry: &ManifestEntry) -> Result<Arc<dyn TypeReader>> {
        let normalized = normalize_reader_name(&entry.name);
        let key = normalized.split('[').next().unwrap_or(&normalized);
        let factory = self
            .factories
            .get(key)
            .ok_or_else(|| Error::UnknownTypeReader(entry.name.clone()))?;
        let reader = factory(&normalized, entry.version)?;
        trace!(reader = key, version = entry.version, "resolved type reader");
        Ok(reader)
    }

    /// Build the ordered reader table for one stream.
    /// Insertion order is manifest order; index 0 stays reserved for null.
    pub fn load_table(&self, entries: &[ManifestEntry]) -> Result<Vec<Arc<dyn TypeReader>>> {
        entries.iter().map(|e| self.resolve(e)).collect()
    }
}

impl Default for TypeReaderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
