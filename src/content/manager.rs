//! The long-lived asset management collaborator.
//!
//! A [`ContentManager`] owns a content root directory, a type reader
//! registry, a cache of decoded assets, and the list of disposables recorded
//! during loads. Individual decodes own all of their transient state; the
//! manager is the only object shared across loads, so its two collections sit
//! behind mutexes.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::content::{expect_value, ContentType, ContentValue, Disposable};
use crate::util::{Error, Result};
use crate::xnb::{ContentReader, TypeReaderRegistry, XnbHeader};

/// Resolve `reference` against the directory of `asset_name`.
///
/// Asset names are content paths, not OS paths: forward or backward slashes,
/// always relative to the content root. `.` and `..` segments are folded;
/// `..` past the root is dropped.
pub fn resolve_relative_path(asset_name: &str, reference: &str) -> String {
    let base = match asset_name.rfind(['/', '\\']) {
        Some(i) => &asset_name[..i],
        None => "",
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in base.split(['/', '\\']).chain(reference.split(['/', '\\'])) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            p => parts.push(p),
        }
    }
    parts.join("/")
}

/// Loads, caches, and owns decoded assets.
pub struct ContentManager {
    root_directory: PathBuf,
    registry: TypeReaderRegistry,
    loaded: Mutex<HashMap<String, ContentValue>>,
    disposables: Mutex<Vec<Arc<dyn Disposable>>>,
}

impl ContentManager {
    /// Manager over a content root, with the built-in reader registry.
    pub fn new(root_directory: impl Into<PathBuf>) -> Self {
        Self::with_registry(root_directory, TypeReaderRegistry::builtin())
    }

    /// Manager with a caller-assembled registry (custom readers).
    pub fn with_registry(root_directory: impl Into<PathBuf>, registry: TypeReaderRegistry) -> Self {
        Self {
            root_directory: root_directory.into(),
            registry,
            loaded: Mutex::new(HashMap::new()),
            disposables: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    #[inline]
    pub fn registry(&self) -> &TypeReaderRegistry {
        &self.registry
    }

    /// Load an asset by name, decoding `<root>/<name>.xnb` on first use and
    /// returning the cached instance afterwards.
    pub fn load<T: ContentType>(&self, asset_name: &str) -> Result<T> {
        let key = asset_name.replace('\\', "/");
        if let Some(value) = self.loaded.lock().get(&key) {
            return expect_value(value.clone());
        }

        let value = self.read_asset_value(&key)?;
        self.loaded.lock().insert(key, value.clone());
        expect_value(value)
    }

    /// Whether an asset is already cached.
    pub fn is_loaded(&self, asset_name: &str) -> bool {
        self.loaded
            .lock()
            .contains_key(&asset_name.replace('\\', "/"))
    }

    fn read_asset_value(&self, asset_name: &str) -> Result<ContentValue> {
        let path = self.root_directory.join(format!("{asset_name}.xnb"));
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.clone())
            } else {
                Error::Io(e)
            }
        })?;
        let mut stream = BufReader::new(file);

        let header = XnbHeader::parse(&mut stream)?;
        if header.compressed {
            return Err(Error::CompressedContent);
        }
        debug!(
            asset = asset_name,
            platform = ?header.platform,
            version = header.version,
            hidef = header.hidef,
            "loading asset"
        );

        let mut reader = ContentReader::new(
            stream,
            asset_name,
            header.version as i32,
            &self.registry,
            Some(self),
            None,
        );
        reader.read_asset_value()
    }

    /// Take ownership of a disposable constructed during a decode. Called at
    /// most once per object.
    pub(crate) fn record_disposable(&self, disposable: Arc<dyn Disposable>) {
        self.disposables.lock().push(disposable);
    }

    /// Dispose every recorded disposable and drop all cached assets.
    pub fn unload(&self) {
        for disposable in self.disposables.lock().drain(..) {
            disposable.dispose();
        }
        self.loaded.lock().clear();
    }
}

impl Drop for ContentManager {
    fn drop(&mut self) {
        self.unload();
    }
}
