//! Polymorphic type readers.
//!
//! A type reader decodes exactly one value type. The stream manifest names
//! the readers a file depends on; [`crate::xnb::TypeReaderRegistry`] resolves
//! those names to the implementations here (plus any registered custom ones),
//! and object payloads dispatch through the resulting table by index.

pub mod collections;
pub mod graphics;
pub mod model;
pub mod primitives;

use std::sync::Arc;

use crate::content::ContentValue;
use crate::util::Result;
use crate::xnb::manifest::TypeReaderRegistry;
use crate::xnb::ContentReader;

/// A polymorphic decoder for exactly one target type.
///
/// `existing` is a previously constructed instance to fill in place, or
/// `Null`. Readers for reference types ignore it and construct fresh;
/// value-type readers overwrite it wholesale.
pub trait TypeReader: Send + Sync {
    /// .NET name of the type this reader produces. Raw-object reads match
    /// against this.
    fn target_type(&self) -> &str;

    /// Value types are stored raw inside collections, with no type index
    /// prefix per element.
    fn is_value_type(&self) -> bool {
        false
    }

    /// Decode one value. May recurse into the content reader for nested
    /// objects, shared-resource references, and external references.
    fn read(&self, input: &mut ContentReader<'_>, existing: ContentValue)
        -> Result<ContentValue>;
}

const NS: &str = "Microsoft.Xna.Framework.Content";

/// Install every built-in reader into a registry.
pub(crate) fn register_builtins(registry: &mut TypeReaderRegistry) {
    use collections::ListReader;
    use graphics::{EffectReader, Texture2DReader};
    use model::{ModelBoneReader, ModelReader};
    use primitives::*;

    macro_rules! builtin {
        ($short:literal, $reader:expr) => {
            registry.register(format!("{NS}.{}", $short), |_, _| Ok(Arc::new($reader)));
        };
    }

    builtin!("BooleanReader", BooleanReader);
    builtin!("Int32Reader", Int32Reader);
    builtin!("SingleReader", SingleReader);
    builtin!("StringReader", StringReader);
    builtin!("Vector2Reader", Vector2Reader);
    builtin!("Vector3Reader", Vector3Reader);
    builtin!("Vector4Reader", Vector4Reader);
    builtin!("QuaternionReader", QuaternionReader);
    builtin!("MatrixReader", MatrixReader);
    builtin!("ColorReader", ColorReader);
    builtin!("BoundingSphereReader", BoundingSphereReader);
    builtin!("Texture2DReader", Texture2DReader);
    builtin!("EffectReader", EffectReader);
    builtin!("ModelReader", ModelReader);
    builtin!("ModelBoneReader", ModelBoneReader);

    registry.register(format!("{NS}.ListReader`1"), |name, _| {
        Ok(Arc::new(ListReader::from_manifest_name(name)?))
    });
}
