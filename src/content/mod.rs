//! Decoded content values and conversion traits.
//!
//! The object stream is polymorphic: any payload position can hold any type
//! the manifest declares. Decoded objects therefore travel through the loader
//! as a closed tagged variant, [`ContentValue`], and callers convert to
//! concrete types at the edges via [`ContentType`].

pub mod manager;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::assets::{Effect, Model, ModelBone, Texture2d};
use crate::util::{BoundingSphere, Color, Error, Mat4, Quat, Result, Vec2, Vec3, Vec4};

/// Shared handle to a model bone. Bone graphs contain back-references, so
/// fixups mutate bones through the lock after construction.
pub type BoneRef = Arc<RwLock<ModelBone>>;

/// Shared handle to a model.
pub type ModelRef = Arc<RwLock<Model>>;

/// A value decoded from an XNB object stream.
///
/// Reference-typed assets are held behind `Arc` so shared-resource slots and
/// every reference to them observe the same instance.
#[derive(Clone, Debug)]
pub enum ContentValue {
    Null,
    Bool(bool),
    Int32(i32),
    Single(f32),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Mat4(Mat4),
    Color(Color),
    BoundingSphere(BoundingSphere),
    List(Vec<ContentValue>),
    Texture2d(Arc<Texture2d>),
    Effect(Arc<Effect>),
    Bone(BoneRef),
    Model(ModelRef),
}

impl ContentValue {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "System.Boolean",
            Self::Int32(_) => "System.Int32",
            Self::Single(_) => "System.Single",
            Self::String(_) => "System.String",
            Self::Vec2(_) => "Microsoft.Xna.Framework.Vector2",
            Self::Vec3(_) => "Microsoft.Xna.Framework.Vector3",
            Self::Vec4(_) => "Microsoft.Xna.Framework.Vector4",
            Self::Quat(_) => "Microsoft.Xna.Framework.Quaternion",
            Self::Mat4(_) => "Microsoft.Xna.Framework.Matrix",
            Self::Color(_) => "Microsoft.Xna.Framework.Color",
            Self::BoundingSphere(_) => "Microsoft.Xna.Framework.BoundingSphere",
            Self::List(_) => "System.Collections.Generic.List`1",
            Self::Texture2d(_) => "Microsoft.Xna.Framework.Graphics.Texture2D",
            Self::Effect(_) => "Microsoft.Xna.Framework.Graphics.Effect",
            Self::Bone(_) => "Microsoft.Xna.Framework.Graphics.ModelBone",
            Self::Model(_) => "Microsoft.Xna.Framework.Graphics.Model",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Downcast to the disposal contract, if this value carries one.
    pub fn as_disposable(&self) -> Option<Arc<dyn Disposable>> {
        match self {
            Self::Texture2d(t) => Some(t.clone() as Arc<dyn Disposable>),
            Self::Effect(e) => Some(e.clone() as Arc<dyn Disposable>),
            _ => None,
        }
    }
}

/// Disposal contract for resources that own something beyond memory
/// (GPU surfaces, shader bytecode handles).
///
/// Implementations must tolerate `dispose` being called from whatever thread
/// owns the recording collaborator; the loader itself calls the recorder at
/// most once per constructed object, synchronously.
pub trait Disposable: Send + Sync {
    /// Release the resource. Must be idempotent.
    fn dispose(&self);

    /// Whether the resource has been disposed.
    fn is_disposed(&self) -> bool;
}

/// Conversion between concrete Rust types and [`ContentValue`] variants.
///
/// `type_name` returns the .NET type name the producer uses, which is what
/// raw-object reads match against the reader table.
pub trait ContentType: Sized {
    /// .NET name of the target type, for table lookups and error messages.
    fn type_name() -> String;

    /// Unwrap a decoded value, or `None` on a variant mismatch.
    fn from_value(value: ContentValue) -> Option<Self>;

    /// Wrap a typed value back into the variant.
    fn into_value(self) -> ContentValue;
}

/// Convert a decoded value into `T`, failing with a type mismatch error that
/// names both sides.
pub fn expect_value<T: ContentType>(value: ContentValue) -> Result<T> {
    let actual = value.type_name();
    T::from_value(value).ok_or_else(|| Error::TypeMismatch {
        expected: T::type_name(),
        actual: actual.to_string(),
    })
}

macro_rules! content_type {
    ($ty:ty, $name:literal, $variant:ident) => {
        impl ContentType for $ty {
            fn type_name() -> String {
                $name.to_string()
            }

            fn from_value(value: ContentValue) -> Option<Self> {
                match value {
                    ContentValue::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_value(self) -> ContentValue {
                ContentValue::$variant(self)
            }
        }
    };
}

content_type!(bool, "System.Boolean", Bool);
content_type!(i32, "System.Int32", Int32);
content_type!(f32, "System.Single", Single);
content_type!(String, "System.String", String);
content_type!(Vec2, "Microsoft.Xna.Framework.Vector2", Vec2);
content_type!(Vec3, "Microsoft.Xna.Framework.Vector3", Vec3);
content_type!(Vec4, "Microsoft.Xna.Framework.Vector4", Vec4);
content_type!(Quat, "Microsoft.Xna.Framework.Quaternion", Quat);
content_type!(Mat4, "Microsoft.Xna.Framework.Matrix", Mat4);
content_type!(Color, "Microsoft.Xna.Framework.Color", Color);
content_type!(
    BoundingSphere,
    "Microsoft.Xna.Framework.BoundingSphere",
    BoundingSphere
);
content_type!(Arc<Texture2d>, "Microsoft.Xna.Framework.Graphics.Texture2D", Texture2d);
content_type!(Arc<Effect>, "Microsoft.Xna.Framework.Graphics.Effect", Effect);
content_type!(BoneRef, "Microsoft.Xna.Framework.Graphics.ModelBone", Bone);
content_type!(ModelRef, "Microsoft.Xna.Framework.Graphics.Model", Model);

/// `ContentValue` itself passes through unchanged, for callers that want to
/// stay untyped.
impl ContentType for ContentValue {
    fn type_name() -> String {
        "object".to_string()
    }

    fn from_value(value: ContentValue) -> Option<Self> {
        Some(value)
    }

    fn into_value(self) -> ContentValue {
        self
    }
}

/// `Option` absorbs the null sentinel; every other variant converts as `T`.
impl<T: ContentType> ContentType for Option<T> {
    fn type_name() -> String {
        T::type_name()
    }

    fn from_value(value: ContentValue) -> Option<Self> {
        match value {
            ContentValue::Null => Some(None),
            v => T::from_value(v).map(Some),
        }
    }

    fn into_value(self) -> ContentValue {
        match self {
            Some(v) => v.into_value(),
            None => ContentValue::Null,
        }
    }
}

impl<T: ContentType> ContentType for Vec<T> {
    fn type_name() -> String {
        format!("System.Collections.Generic.List`1[[{}]]", T::type_name())
    }

    fn from_value(value: ContentValue) -> Option<Self> {
        match value {
            ContentValue::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn into_value(self) -> ContentValue {
        ContentValue::List(self.into_iter().map(T::into_value).collect())
    }
}
