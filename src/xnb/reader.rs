//! The content reader: object graph decoding and shared resource fixups.
//!
//! Decoding one asset is a single depth-first walk over one stream. The
//! manifest is read exactly once up front, then the primary object, then the
//! shared resource section. Forward references inside the graph are deferred:
//! a reader registers a fixup against a slot index, the whole slot array is
//! decoded after the primary object, and every fixup is applied once, in
//! registration order, against fully constructed objects.

use std::io::{self, Read};
use std::sync::Arc;

use tracing::{debug, trace};

use super::codec::XnbRead;
use super::manifest::{read_manifest, TypeReaderRegistry};
use crate::content::manager::{resolve_relative_path, ContentManager};
use crate::content::{expect_value, ContentType, ContentValue, Disposable};
use crate::readers::TypeReader;
use crate::util::{Error, Result};

/// Deferred shared-resource callback: slot index paired with the type-checked
/// application closure.
type Fixup<'a> = Box<dyn FnOnce(&ContentValue) -> Result<()> + 'a>;

/// Recorder invoked once per constructed disposable object.
pub type DisposableRecorder<'a> = &'a mut dyn FnMut(Arc<dyn Disposable>);

/// A bound reader over one asset's object stream.
///
/// All decode state (reader table, shared slots, fixups) is scoped to this
/// value; nothing persists across asset loads.
pub struct ContentReader<'a> {
    stream: Box<dyn Read + 'a>,
    asset_name: String,
    version: i32,
    registry: &'a TypeReaderRegistry,
    manager: Option<&'a ContentManager>,
    recorder: Option<DisposableRecorder<'a>>,
    type_readers: Vec<Arc<dyn TypeReader>>,
    shared_resource_count: u32,
    fixups: Vec<(u32, Fixup<'a>)>,
}

impl<'a> ContentReader<'a> {
    /// Construct a bound reader over a stream for a named asset at a given
    /// declared format version.
    ///
    /// `manager` enables external references and is the fallback owner for
    /// disposables; `recorder`, when given, receives them instead.
    pub fn new(
        stream: impl Read + 'a,
        asset_name: impl Into<String>,
        version: i32,
        registry: &'a TypeReaderRegistry,
        manager: Option<&'a ContentManager>,
        recorder: Option<DisposableRecorder<'a>>,
    ) -> Self {
        Self {
            stream: Box::new(stream),
            asset_name: asset_name.into(),
            version,
            registry,
            manager,
            recorder,
            type_readers: Vec::new(),
            shared_resource_count: 0,
            fixups: Vec::new(),
        }
    }

    /// Name of the asset this reader is bound to; external references resolve
    /// relative to it.
    #[inline]
    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    /// Declared container format version.
    #[inline]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// The resolved reader table (empty until the header is parsed).
    #[inline]
    pub fn type_readers(&self) -> &[Arc<dyn TypeReader>] {
        &self.type_readers
    }

    // ------------------------------------------------------------------
    // Whole-asset decode
    // ------------------------------------------------------------------

    /// Run the full decode: header parse, primary object, shared resource
    /// fixup pass. Returns the untyped primary object.
    pub fn read_asset_value(&mut self) -> Result<ContentValue> {
        self.initialize_type_readers()?;
        let primary = self.read_value(ContentValue::Null)?;
        self.read_shared_resources()?;
        Ok(primary)
    }

    /// Run the full decode and convert the primary object to `T`.
    pub fn read_asset<T: ContentType>(&mut self) -> Result<T> {
        let value = self.read_asset_value()?;
        expect_value(value)
    }

    /// Run the full decode, filling a caller-supplied instance in place where
    /// the stream says "reuse existing".
    pub fn read_asset_into<T: ContentType + Clone>(&mut self, existing: &mut T) -> Result<()> {
        self.initialize_type_readers()?;
        let value = self.read_value(existing.clone().into_value())?;
        self.read_shared_resources()?;
        *existing = expect_value(value)?;
        Ok(())
    }

    /// Read the manifest, resolve the reader table, and reserve shared
    /// resource slots. Called exactly once per stream, before any payload.
    fn initialize_type_readers(&mut self) -> Result<()> {
        let entries = read_manifest(&mut self.stream)?;
        self.type_readers = self.registry.load_table(&entries)?;
        self.shared_resource_count = self.stream.read_7bit_encoded_int()?;
        debug!(
            asset = %self.asset_name,
            readers = self.type_readers.len(),
            shared = self.shared_resource_count,
            "initialized type readers"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Object graph reading
    // ------------------------------------------------------------------

    /// Decode one type-index-prefixed object.
    ///
    /// Index 0 returns `existing` unchanged; that is both "null" and "reuse
    /// in place", depending on what the caller supplied. Any index past the
    /// table is fatal.
    pub fn read_value(&mut self, existing: ContentValue) -> Result<ContentValue> {
        let index = self.read_7bit_encoded_int()? as usize;
        if index == 0 {
            return Ok(existing);
        }
        if index > self.type_readers.len() {
            return Err(Error::InvalidTypeReaderIndex {
                index,
                count: self.type_readers.len(),
            });
        }
        let reader = self.type_readers[index - 1].clone();
        let value = reader.read(self, existing)?;
        self.record_disposable(&value);
        Ok(value)
    }

    /// Decode one object and convert it to `T`. Use `Option<T>` when the
    /// stream may legally hold null here.
    pub fn read_object<T: ContentType>(&mut self) -> Result<T> {
        let value = self.read_value(ContentValue::Null)?;
        expect_value(value)
    }

    /// Decode into a caller-supplied instance: on index 0 the instance is
    /// left untouched, otherwise it is handed to the reader for in-place
    /// reuse and replaced with the result.
    pub fn read_object_into<T: ContentType + Clone>(&mut self, existing: &mut T) -> Result<()> {
        let value = self.read_value(existing.clone().into_value())?;
        *existing = expect_value(value)?;
        Ok(())
    }

    /// Decode with a specific reader. Value types are stored raw; reference
    /// types still carry their polymorphic index prefix.
    pub fn read_value_with(
        &mut self,
        reader: &dyn TypeReader,
        existing: ContentValue,
    ) -> Result<ContentValue> {
        if !reader.is_value_type() {
            return self.read_value(existing);
        }
        let value = reader.read(self, existing)?;
        self.record_disposable(&value);
        Ok(value)
    }

    /// Raw read: no type index prefix, the concrete type is already known.
    /// The reader is found by target type; a stream whose table lacks one is
    /// a "not supported" error.
    pub fn read_raw_object<T: ContentType>(&mut self) -> Result<T> {
        let target = T::type_name();
        let reader = self.find_reader(&target).ok_or_else(|| {
            Error::NotSupported(format!("no type reader in the stream table for {target}"))
        })?;
        let value = reader.read(self, ContentValue::Null)?;
        self.record_disposable(&value);
        expect_value(value)
    }

    /// Find a resolved reader by the type it produces.
    pub fn find_reader(&self, target_type: &str) -> Option<Arc<dyn TypeReader>> {
        self.type_readers
            .iter()
            .find(|r| r.target_type() == target_type)
            .cloned()
    }

    fn record_disposable(&mut self, value: &ContentValue) {
        let Some(disposable) = value.as_disposable() else {
            return;
        };
        if let Some(recorder) = self.recorder.as_mut() {
            recorder(disposable);
        } else if let Some(manager) = self.manager {
            manager.record_disposable(disposable);
        }
    }

    // ------------------------------------------------------------------
    // Shared resources
    // ------------------------------------------------------------------

    /// Read a shared-resource reference and register a deferred fixup for it.
    ///
    /// The stream stores slot indices 1-based; 0 means "no reference" and
    /// registers nothing. The fixup runs after the whole graph is decoded and
    /// may assume the resolved object is complete.
    pub fn read_shared_resource<T, F>(&mut self, fixup: F) -> Result<()>
    where
        T: ContentType,
        F: FnOnce(T) + 'a,
    {
        let index = self.read_7bit_encoded_int()?;
        if index == 0 {
            return Ok(());
        }
        self.fixups.push((
            index - 1,
            Box::new(move |value: &ContentValue| {
                let actual = value.type_name().to_string();
                match T::from_value(value.clone()) {
                    Some(v) => {
                        fixup(v);
                        Ok(())
                    }
                    None => Err(Error::SharedResourceTypeMismatch {
                        expected: T::type_name(),
                        actual,
                    }),
                }
            }),
        ));
        Ok(())
    }

    /// Decode the shared resource section and apply every registered fixup,
    /// in registration order (not slot order).
    fn read_shared_resources(&mut self) -> Result<()> {
        if self.shared_resource_count == 0 {
            return Ok(());
        }

        let mut shared = Vec::with_capacity(self.shared_resource_count as usize);
        for _ in 0..self.shared_resource_count {
            shared.push(self.read_value(ContentValue::Null)?);
        }

        let fixups = std::mem::take(&mut self.fixups);
        trace!(
            slots = shared.len(),
            fixups = fixups.len(),
            "applying shared resource fixups"
        );
        for (slot, fixup) in fixups {
            let value = shared.get(slot as usize).ok_or_else(|| {
                Error::invalid(format!("shared resource slot {slot} out of range"))
            })?;
            fixup(value)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // External references
    // ------------------------------------------------------------------

    /// Read a named reference to a sibling asset file.
    ///
    /// An empty string means "no reference" and yields the type's default
    /// with no load attempted. Otherwise the name resolves relative to the
    /// current asset's directory and loading is delegated to the manager.
    pub fn read_external_reference<T: ContentType + Default>(&mut self) -> Result<T> {
        let reference = self.read_xnb_string()?;
        if reference.is_empty() {
            return Ok(T::default());
        }
        let manager = self.manager.ok_or_else(|| {
            Error::NotSupported("external references require a content manager".to_string())
        })?;
        let path = resolve_relative_path(&self.asset_name, &reference);
        trace!(asset = %self.asset_name, reference = %reference, resolved = %path, "external reference");
        manager.load(&path)
    }
}

/// The reader exposes its raw byte source, so every [`XnbRead`] primitive is
/// available on it directly.
impl io::Read for ContentReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec3;
    use crate::xnb::codec::XnbWrite;
    use parking_lot::Mutex;
    use std::io::Cursor;

    const VECTOR3_READER: &str = "Microsoft.Xna.Framework.Content.Vector3Reader";
    const STRING_READER: &str = "Microsoft.Xna.Framework.Content.StringReader";

    /// Header for a stream using the given readers.
    fn write_header(buf: &mut Vec<u8>, readers: &[&str], shared_count: u32) {
        buf.write_7bit_encoded_int(readers.len() as u32).unwrap();
        for name in readers {
            buf.write_xnb_string(name).unwrap();
            buf.write_int32(0).unwrap();
        }
        buf.write_7bit_encoded_int(shared_count).unwrap();
    }

    #[test]
    fn test_read_primary_vector3() {
        let mut buf = Vec::new();
        write_header(&mut buf, &[VECTOR3_READER], 0);
        buf.write_7bit_encoded_int(1).unwrap();
        buf.write_vector3(Vec3::new(1.0, 2.0, 3.0)).unwrap();

        let registry = TypeReaderRegistry::builtin();
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        let v: Vec3 = reader.read_asset().unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_index_zero_returns_existing() {
        let mut buf = Vec::new();
        write_header(&mut buf, &[VECTOR3_READER], 0);
        buf.write_7bit_encoded_int(0).unwrap();

        let registry = TypeReaderRegistry::builtin();
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        let mut existing = Vec3::new(9.0, 9.0, 9.0);
        reader.read_asset_into(&mut existing).unwrap();
        assert_eq!(existing, Vec3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn test_index_zero_is_null_for_options() {
        let mut buf = Vec::new();
        write_header(&mut buf, &[STRING_READER], 0);
        buf.write_7bit_encoded_int(0).unwrap();

        let registry = TypeReaderRegistry::builtin();
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        let v: Option<String> = reader.read_asset().unwrap();
        assert_eq!(v, None);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut buf = Vec::new();
        write_header(&mut buf, &[VECTOR3_READER], 0);
        buf.write_7bit_encoded_int(2).unwrap();

        let registry = TypeReaderRegistry::builtin();
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        let err = reader.read_asset::<Vec3>().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTypeReaderIndex { index: 2, count: 1 }
        ));
    }

    #[test]
    fn test_unknown_reader_aborts_before_payload() {
        let mut buf = Vec::new();
        write_header(&mut buf, &["No.Such.Reader"], 0);
        // Garbage payload that must never be touched
        buf.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        let registry = TypeReaderRegistry::builtin();
        let mut cursor = Cursor::new(buf);
        let mut reader =
            ContentReader::new(&mut cursor, "test", 5, &registry, None, None);
        let err = reader.read_asset::<Vec3>().unwrap_err();
        assert!(matches!(err, Error::UnknownTypeReader(_)));
        drop(reader);
        // The shared count and payload were never consumed
        let remaining = cursor.get_ref().len() as u64 - cursor.position();
        assert_eq!(remaining, 5);
    }

    #[test]
    fn test_empty_manifest_fails_lazily() {
        let mut buf = Vec::new();
        write_header(&mut buf, &[], 0);
        buf.write_7bit_encoded_int(1).unwrap();

        let registry = TypeReaderRegistry::builtin();
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        let err = reader.read_asset::<Vec3>().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTypeReaderIndex { index: 1, count: 0 }
        ));
    }

    #[test]
    fn test_raw_object_skips_index() {
        let mut buf = Vec::new();
        write_header(&mut buf, &[VECTOR3_READER], 0);
        // No index byte, straight payload
        buf.write_vector3(Vec3::new(4.0, 5.0, 6.0)).unwrap();

        let registry = TypeReaderRegistry::builtin();
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        reader.initialize_type_readers().unwrap();
        let v: Vec3 = reader.read_raw_object().unwrap();
        assert_eq!(v, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_raw_object_without_reader_is_not_supported() {
        let mut buf = Vec::new();
        write_header(&mut buf, &[STRING_READER], 0);

        let registry = TypeReaderRegistry::builtin();
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        reader.initialize_type_readers().unwrap();
        let err = reader.read_raw_object::<Vec3>().unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    // A reader that consumes two shared-resource references and reports what
    // the fixup pass eventually delivers.
    struct PairReader {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl TypeReader for PairReader {
        fn target_type(&self) -> &str {
            "Test.Pair"
        }

        fn read(
            &self,
            input: &mut ContentReader<'_>,
            _existing: ContentValue,
        ) -> Result<ContentValue> {
            for _ in 0..2 {
                let seen = self.seen.clone();
                input.read_shared_resource::<String, _>(move |s| seen.lock().push(s))?;
            }
            Ok(ContentValue::Bool(true))
        }
    }

    fn pair_registry(seen: Arc<Mutex<Vec<String>>>) -> TypeReaderRegistry {
        let mut registry = TypeReaderRegistry::builtin();
        // fn-pointer factories cannot capture, so smuggle the probe through a
        // thread local
        thread_local! {
            static PROBE: std::cell::RefCell<Option<Arc<Mutex<Vec<String>>>>> =
                const { std::cell::RefCell::new(None) };
        }
        PROBE.with(|p| *p.borrow_mut() = Some(seen));
        registry.register("Test.PairReader", |_, _| {
            let seen = PROBE
                .with(|p| p.borrow().clone())
                .expect("probe installed");
            Ok(Arc::new(PairReader { seen }))
        });
        registry
    }

    #[test]
    fn test_fixup_slot_zero_means_no_reference() {
        // Primary object registers fixups for stream slots [2, 0]; three
        // shared strings follow. Only the slot-2 fixup may run, receiving the
        // second decoded shared object.
        let mut buf = Vec::new();
        write_header(&mut buf, &["Test.PairReader", STRING_READER], 3);
        buf.write_7bit_encoded_int(1).unwrap(); // primary: PairReader
        buf.write_7bit_encoded_int(2).unwrap(); // first reference -> slot 2
        buf.write_7bit_encoded_int(0).unwrap(); // second reference -> none
        for s in ["alpha", "beta", "gamma"] {
            buf.write_7bit_encoded_int(2).unwrap(); // StringReader index
            buf.write_xnb_string(s).unwrap();
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = pair_registry(seen.clone());
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        reader.read_asset_value().unwrap();
        assert_eq!(*seen.lock(), vec!["beta".to_string()]);
    }

    #[test]
    fn test_fixups_apply_in_registration_order() {
        // References arrive as slots [3, 1]; registration order must win over
        // slot order.
        let mut buf = Vec::new();
        write_header(&mut buf, &["Test.PairReader", STRING_READER], 3);
        buf.write_7bit_encoded_int(1).unwrap();
        buf.write_7bit_encoded_int(3).unwrap();
        buf.write_7bit_encoded_int(1).unwrap();
        for s in ["alpha", "beta", "gamma"] {
            buf.write_7bit_encoded_int(2).unwrap();
            buf.write_xnb_string(s).unwrap();
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = pair_registry(seen.clone());
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        reader.read_asset_value().unwrap();
        assert_eq!(*seen.lock(), vec!["gamma".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn test_fixup_slot_past_shared_section_is_invalid() {
        // One shared object, but the primary references stream slot 5.
        let mut buf = Vec::new();
        write_header(&mut buf, &["Test.PairReader", STRING_READER], 1);
        buf.write_7bit_encoded_int(1).unwrap();
        buf.write_7bit_encoded_int(5).unwrap();
        buf.write_7bit_encoded_int(0).unwrap();
        buf.write_7bit_encoded_int(2).unwrap();
        buf.write_xnb_string("alpha").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = pair_registry(seen.clone());
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        let err = reader.read_asset_value().unwrap_err();
        assert!(matches!(err, Error::InvalidStructure(_)));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_fixup_type_mismatch_names_both_types() {
        let mut buf = Vec::new();
        write_header(&mut buf, &["Test.PairReader", VECTOR3_READER], 1);
        buf.write_7bit_encoded_int(1).unwrap();
        buf.write_7bit_encoded_int(1).unwrap(); // slot 1
        buf.write_7bit_encoded_int(0).unwrap(); // none
        buf.write_7bit_encoded_int(2).unwrap(); // shared object: a Vector3
        buf.write_vector3(Vec3::ONE).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let registry = pair_registry(seen);
        let mut reader =
            ContentReader::new(Cursor::new(buf), "test", 5, &registry, None, None);
        let err = reader.read_asset_value().unwrap_err();
        match err {
            Error::SharedResourceTypeMismatch { expected, actual } => {
                assert_eq!(expected, "System.String");
                assert_eq!(actual, "Microsoft.Xna.Framework.Vector3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_external_reference_empty_is_default() {
        let mut buf = Vec::new();
        write_header(&mut buf, &[], 0);
        buf.write_xnb_string("").unwrap();

        let registry = TypeReaderRegistry::builtin();
        let mut reader =
            ContentReader::new(Cursor::new(buf), "models/hero", 5, &registry, None, None);
        reader.initialize_type_readers().unwrap();
        // No manager attached: an attempted load would error, so getting the
        // default back proves no load happened.
        let v: Option<String> = reader.read_external_reference().unwrap();
        assert_eq!(v, None);
    }
}
