//! Readers for primitive and math value types.
//!
//! These map one-to-one onto the primitive codec; `existing` never matters
//! because each decode fully overwrites the value.

use crate::content::ContentValue;
use crate::util::Result;
use crate::xnb::codec::XnbRead;
use crate::xnb::ContentReader;

use super::TypeReader;

use byteorder::ReadBytesExt;

macro_rules! value_reader {
    ($(#[$doc:meta])* $reader:ident, $target:literal, $variant:ident, $read:expr) => {
        $(#[$doc])*
        pub struct $reader;

        impl TypeReader for $reader {
            fn target_type(&self) -> &str {
                $target
            }

            fn is_value_type(&self) -> bool {
                true
            }

            fn read(
                &self,
                input: &mut ContentReader<'_>,
                _existing: ContentValue,
            ) -> Result<ContentValue> {
                Ok(ContentValue::$variant($read(input)?))
            }
        }
    };
}

value_reader!(
    /// One byte, zero = false.
    BooleanReader,
    "System.Boolean",
    Bool,
    |r: &mut ContentReader<'_>| Result::Ok(r.read_u8()? != 0)
);
value_reader!(Int32Reader, "System.Int32", Int32, |r: &mut ContentReader<'_>| r
    .read_int32());
value_reader!(SingleReader, "System.Single", Single, |r: &mut ContentReader<'_>| r
    .read_single());
value_reader!(Vector2Reader, "Microsoft.Xna.Framework.Vector2", Vec2, |r: &mut ContentReader<'_>| r
    .read_vector2());
value_reader!(Vector3Reader, "Microsoft.Xna.Framework.Vector3", Vec3, |r: &mut ContentReader<'_>| r
    .read_vector3());
value_reader!(Vector4Reader, "Microsoft.Xna.Framework.Vector4", Vec4, |r: &mut ContentReader<'_>| r
    .read_vector4());
value_reader!(QuaternionReader, "Microsoft.Xna.Framework.Quaternion", Quat, |r: &mut ContentReader<'_>| r
    .read_quaternion());
value_reader!(MatrixReader, "Microsoft.Xna.Framework.Matrix", Mat4, |r: &mut ContentReader<'_>| r
    .read_matrix());
value_reader!(ColorReader, "Microsoft.Xna.Framework.Color", Color, |r: &mut ContentReader<'_>| r
    .read_color());
value_reader!(
    BoundingSphereReader,
    "Microsoft.Xna.Framework.BoundingSphere",
    BoundingSphere,
    |r: &mut ContentReader<'_>| r.read_bounding_sphere()
);

/// Strings are reference-typed in the source format: nullable and index-
/// prefixed wherever they appear.
pub struct StringReader;

impl TypeReader for StringReader {
    fn target_type(&self) -> &str {
        "System.String"
    }

    fn read(
        &self,
        input: &mut ContentReader<'_>,
        _existing: ContentValue,
    ) -> Result<ContentValue> {
        Ok(ContentValue::String(input.read_xnb_string()?))
    }
}
