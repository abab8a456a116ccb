//! Readers for GPU-backed assets: textures and effects.

use std::sync::Arc;

use crate::assets::{Effect, SurfaceFormat, Texture2d};
use crate::content::ContentValue;
use crate::util::Result;
use crate::xnb::codec::XnbRead;
use crate::xnb::ContentReader;

use super::TypeReader;

/// Reader for 2D textures.
///
/// Layout: surface format (i32), width (u32), height (u32), mip count (u32),
/// then per mip a u32 byte length and the pixel data.
pub struct Texture2DReader;

impl TypeReader for Texture2DReader {
    fn target_type(&self) -> &str {
        "Microsoft.Xna.Framework.Graphics.Texture2D"
    }

    fn read(
        &self,
        input: &mut ContentReader<'_>,
        _existing: ContentValue,
    ) -> Result<ContentValue> {
        let format = SurfaceFormat::from_i32(input.read_int32()?)?;
        let width = input.read_uint32()?;
        let height = input.read_uint32()?;
        let mip_count = input.read_uint32()?;
        let mut mips = Vec::with_capacity(mip_count as usize);
        for _ in 0..mip_count {
            let len = input.read_uint32()? as usize;
            mips.push(input.read_byte_block(len)?);
        }
        Ok(ContentValue::Texture2d(Arc::new(Texture2d::new(
            format, width, height, mips,
        ))))
    }
}

/// Reader for compiled effects: a u32 byte length and the shader bytecode.
pub struct EffectReader;

impl TypeReader for EffectReader {
    fn target_type(&self) -> &str {
        "Microsoft.Xna.Framework.Graphics.Effect"
    }

    fn read(
        &self,
        input: &mut ContentReader<'_>,
        _existing: ContentValue,
    ) -> Result<ContentValue> {
        let len = input.read_uint32()? as usize;
        let bytecode = input.read_byte_block(len)?;
        Ok(ContentValue::Effect(Arc::new(Effect::new(bytecode))))
    }
}
