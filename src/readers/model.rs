//! Readers for models and their bone hierarchies.
//!
//! Bone graphs are cyclic: parents hold children and children point back at
//! parents (and meshes at bones, parts at shared materials). The producer
//! breaks the cycles by emitting every bone, and every material, as a shared
//! resource slot; the payload here only carries slot indices. Each reader
//! constructs its object immediately and registers fixups that wire the
//! references once the whole slot array exists, so decoding never recurses
//! through a cycle.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::assets::{Effect, Model, ModelBone, ModelMesh, ModelMeshPart, Texture2d};
use crate::content::{BoneRef, ContentValue, ModelRef};
use crate::util::Result;
use crate::xnb::codec::XnbRead;
use crate::xnb::ContentReader;

use super::TypeReader;

/// Reader for one skeleton bone.
///
/// Layout: name (string), transform (matrix), child count (u32), one shared
/// slot per child, then a shared slot for the parent.
pub struct ModelBoneReader;

impl TypeReader for ModelBoneReader {
    fn target_type(&self) -> &str {
        "Microsoft.Xna.Framework.Graphics.ModelBone"
    }

    fn read(
        &self,
        input: &mut ContentReader<'_>,
        _existing: ContentValue,
    ) -> Result<ContentValue> {
        let name = input.read_xnb_string()?;
        let transform = input.read_matrix()?;
        let bone: BoneRef = Arc::new(RwLock::new(ModelBone::new(name, transform)));

        let child_count = input.read_uint32()?;
        for _ in 0..child_count {
            let bone = bone.clone();
            // Fixups run in registration order, so children keep stream order
            input.read_shared_resource::<BoneRef, _>(move |child| {
                bone.write().children.push(child);
            })?;
        }

        let parent_bone = bone.clone();
        input.read_shared_resource::<BoneRef, _>(move |parent| {
            parent_bone.write().parent = Some(parent);
        })?;

        Ok(ContentValue::Bone(bone))
    }
}

/// Reader for a whole model.
///
/// Layout: bone count (u32), one shared slot per bone, a shared slot for the
/// root bone, mesh count (u32), then per mesh: name (string), parent bone
/// slot, bounding sphere, part count (u32), and per part: vertex count (u32),
/// primitive count (u32), effect slot, external texture reference.
pub struct ModelReader;

impl TypeReader for ModelReader {
    fn target_type(&self) -> &str {
        "Microsoft.Xna.Framework.Graphics.Model"
    }

    fn read(
        &self,
        input: &mut ContentReader<'_>,
        _existing: ContentValue,
    ) -> Result<ContentValue> {
        let model: ModelRef = Arc::new(RwLock::new(Model::default()));

        let bone_count = input.read_uint32()?;
        for _ in 0..bone_count {
            let model = model.clone();
            input.read_shared_resource::<BoneRef, _>(move |bone| {
                model.write().bones.push(bone);
            })?;
        }

        let root_model = model.clone();
        input.read_shared_resource::<BoneRef, _>(move |root| {
            root_model.write().root = Some(root);
        })?;

        let mesh_count = input.read_uint32()?;
        for mesh_index in 0..mesh_count as usize {
            let name = input.read_xnb_string()?;

            let mesh_model = model.clone();
            input.read_shared_resource::<BoneRef, _>(move |bone| {
                mesh_model.write().meshes[mesh_index].parent_bone = Some(bone);
            })?;

            let bounding_sphere = input.read_bounding_sphere()?;

            let part_count = input.read_uint32()?;
            let mut parts = Vec::with_capacity(part_count as usize);
            for part_index in 0..part_count as usize {
                let vertex_count = input.read_uint32()?;
                let primitive_count = input.read_uint32()?;

                let part_model = model.clone();
                input.read_shared_resource::<Arc<Effect>, _>(move |effect| {
                    part_model.write().meshes[mesh_index].parts[part_index].effect = Some(effect);
                })?;

                let texture: Option<Arc<Texture2d>> = input.read_external_reference()?;

                parts.push(ModelMeshPart {
                    vertex_count,
                    primitive_count,
                    effect: None,
                    texture,
                });
            }

            model.write().meshes.push(ModelMesh {
                name,
                parent_bone: None,
                bounding_sphere,
                parts,
            });
        }

        Ok(ContentValue::Model(model))
    }
}
