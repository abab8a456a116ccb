//! Collection readers.

use crate::content::ContentValue;
use crate::util::Result;
use crate::xnb::codec::XnbRead;
use crate::xnb::manifest::generic_argument;
use crate::xnb::ContentReader;

use super::TypeReader;

/// Reader for `List<T>`, where the element type comes from the manifest's
/// generic argument.
///
/// Layout: a fixed u32 count, then `count` elements. Value-typed elements are
/// stored raw; reference-typed elements each carry their own type index (and
/// may therefore be null or a subtype).
pub struct ListReader {
    target: String,
    element_type: String,
}

impl ListReader {
    /// Build from the normalized manifest name, e.g.
    /// `Microsoft.Xna.Framework.Content.ListReader`1[[System.Int32]]`.
    pub fn from_manifest_name(name: &str) -> Result<Self> {
        let element = generic_argument(name).ok_or_else(|| {
            crate::util::Error::invalid(format!("ListReader without element type: {name}"))
        })?;
        Ok(Self {
            target: format!("System.Collections.Generic.List`1[[{element}]]"),
            element_type: element.to_string(),
        })
    }
}

impl TypeReader for ListReader {
    fn target_type(&self) -> &str {
        &self.target
    }

    fn read(
        &self,
        input: &mut ContentReader<'_>,
        _existing: ContentValue,
    ) -> Result<ContentValue> {
        let count = input.read_uint32()?;
        let element_reader = input.find_reader(&self.element_type);
        let mut items = Vec::new();
        for _ in 0..count {
            let value = match &element_reader {
                Some(reader) if reader.is_value_type() => {
                    input.read_value_with(reader.as_ref(), ContentValue::Null)?
                }
                _ => input.read_value(ContentValue::Null)?,
            };
            items.push(value);
        }
        Ok(ContentValue::List(items))
    }
}
