//! Runtime asset types produced by the built-in type readers.
//!
//! These are plain data holders; rendering is out of scope, so "GPU"
//! resources keep their pixel and bytecode payloads in memory and track only
//! a disposed flag.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::content::{BoneRef, Disposable};
use crate::util::{BoundingSphere, Mat4, Result, Error};

/// Pixel format of a texture surface, numbered as the producer writes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceFormat {
    Color = 0,
    Bgr565 = 1,
    Bgra5551 = 2,
    Bgra4444 = 3,
    Dxt1 = 4,
    Dxt3 = 5,
    Dxt5 = 6,
}

impl SurfaceFormat {
    pub fn from_i32(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Self::Color,
            1 => Self::Bgr565,
            2 => Self::Bgra5551,
            3 => Self::Bgra4444,
            4 => Self::Dxt1,
            5 => Self::Dxt3,
            6 => Self::Dxt5,
            v => return Err(Error::invalid(format!("Unknown surface format: {v}"))),
        })
    }
}

/// A 2D texture with one byte buffer per mip level.
pub struct Texture2d {
    format: SurfaceFormat,
    width: u32,
    height: u32,
    mips: Vec<Vec<u8>>,
    disposed: AtomicBool,
}

impl Texture2d {
    pub fn new(format: SurfaceFormat, width: u32, height: u32, mips: Vec<Vec<u8>>) -> Self {
        Self {
            format,
            width,
            height,
            mips,
            disposed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn format(&self) -> SurfaceFormat {
        self.format
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn mip_count(&self) -> usize {
        self.mips.len()
    }

    /// Pixel data for one mip level.
    pub fn mip(&self, level: usize) -> Option<&[u8]> {
        self.mips.get(level).map(Vec::as_slice)
    }
}

impl Disposable for Texture2d {
    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Texture2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Texture2d({:?}, {}x{}, {} mips)",
            self.format,
            self.width,
            self.height,
            self.mips.len()
        )
    }
}

/// Compiled effect (shader) bytecode.
pub struct Effect {
    bytecode: Vec<u8>,
    disposed: AtomicBool,
}

impl Effect {
    pub fn new(bytecode: Vec<u8>) -> Self {
        Self {
            bytecode,
            disposed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }
}

impl Disposable for Effect {
    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Effect({} bytes)", self.bytecode.len())
    }
}

/// One bone in a model skeleton.
///
/// Parent and child links are wired by shared-resource fixups after the whole
/// graph is decoded, so a freshly constructed bone has no connections yet.
#[derive(Debug, Default)]
pub struct ModelBone {
    pub name: String,
    pub transform: Mat4,
    pub parent: Option<BoneRef>,
    pub children: Vec<BoneRef>,
}

impl ModelBone {
    pub fn new(name: String, transform: Mat4) -> Self {
        Self {
            name,
            transform,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// One drawable chunk of a mesh, pointing at its material.
#[derive(Debug, Default)]
pub struct ModelMeshPart {
    pub vertex_count: u32,
    pub primitive_count: u32,
    /// Shared-resource material, filled by fixup.
    pub effect: Option<Arc<Effect>>,
    /// Externally referenced diffuse texture, if any.
    pub texture: Option<Arc<Texture2d>>,
}

/// A mesh: a named group of parts attached to one bone.
#[derive(Debug, Default)]
pub struct ModelMesh {
    pub name: String,
    pub parent_bone: Option<BoneRef>,
    pub bounding_sphere: BoundingSphere,
    pub parts: Vec<ModelMeshPart>,
}

/// A complete model: skeleton plus meshes.
#[derive(Debug, Default)]
pub struct Model {
    pub bones: Vec<BoneRef>,
    pub root: Option<BoneRef>,
    pub meshes: Vec<ModelMesh>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_format() {
        assert_eq!(SurfaceFormat::from_i32(0).unwrap(), SurfaceFormat::Color);
        assert_eq!(SurfaceFormat::from_i32(6).unwrap(), SurfaceFormat::Dxt5);
        assert!(SurfaceFormat::from_i32(99).is_err());
    }

    #[test]
    fn test_texture_dispose_idempotent() {
        let t = Texture2d::new(SurfaceFormat::Color, 2, 2, vec![vec![0u8; 16]]);
        assert!(!t.is_disposed());
        t.dispose();
        t.dispose();
        assert!(t.is_disposed());
        assert_eq!(t.mip(0).unwrap().len(), 16);
        assert!(t.mip(1).is_none());
    }

    #[test]
    fn test_effect_dispose() {
        let e = Effect::new(vec![1, 2, 3]);
        assert_eq!(e.bytecode(), &[1, 2, 3]);
        e.dispose();
        assert!(e.is_disposed());
    }
}
