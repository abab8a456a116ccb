//! # xnb
//!
//! Rust implementation of the XNB compiled content format runtime loader.
//!
//! The XNB format was designed by Microsoft for XNA Game Studio and is still
//! produced by the MonoGame content pipeline. All rights to the original
//! belong to the authors. This is an independent Rust implementation aiming
//! to match the original runtime loader as closely as possible for binary
//! compatibility.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (math, errors)
//! - [`xnb`] - Low-level binary format (codec, manifest, content reader)
//! - [`content`] - Decoded values, conversion traits, the content manager
//! - [`assets`] - Runtime asset types (textures, effects, models, bones)
//! - [`readers`] - Built-in polymorphic type readers
//!
//! ## Example
//!
//! ```ignore
//! use xnb::ContentManager;
//!
//! let content = ContentManager::new("Content");
//! let model: xnb::content::ModelRef = content.load("models/hero")?;
//! ```

pub mod util;
pub mod xnb;
pub mod content;
pub mod assets;
pub mod readers;

// Re-export commonly used types
pub use content::manager::ContentManager;
pub use content::{ContentType, ContentValue, Disposable};
pub use util::{Error, Result};
pub use xnb::{ContentReader, TypeReaderRegistry, XnbHeader};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assets::{Effect, Model, ModelBone, SurfaceFormat, Texture2d};
    pub use crate::content::manager::ContentManager;
    pub use crate::content::{BoneRef, ContentType, ContentValue, Disposable, ModelRef};
    pub use crate::readers::TypeReader;
    pub use crate::util::{Error, Result};
    pub use crate::xnb::codec::{XnbRead, XnbWrite};
    pub use crate::xnb::{ContentReader, TypeReaderRegistry, XnbHeader};
}
