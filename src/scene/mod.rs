//! Scene store
//!
//! Holds every loaded primitive group and texture for the lifetime of the
//! rasterizer. Groups are read-only once added; the store also fixes the
//! order in which groups are assembled into the global primitive array.

mod camera;
mod light;
mod transform;

pub use camera::*;
pub use light::*;
pub use transform::*;

use crate::error::RasterResult;
use crate::pipeline::vertex::pretransform;
use crate::resources::{PrimitiveGroup, Texture};

/// Index of a group within a [`SceneStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

/// Denormalized texture reference carried through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef {
    /// Index into [`SceneStore::textures`]
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

/// A validated, world-baked primitive group and its slot in the global
/// primitive array.
#[derive(Debug)]
pub struct StoredGroup {
    pub mesh: PrimitiveGroup,
    pub texture: Option<TextureRef>,
    /// First primitive of this group in the global primitive array: the sum
    /// of primitive counts of all groups added before it.
    pub primitive_offset: usize,
}

impl StoredGroup {
    pub fn primitive_count(&self) -> usize {
        self.mesh.primitive_count()
    }

    pub fn primitive_range(&self) -> std::ops::Range<usize> {
        self.primitive_offset..self.primitive_offset + self.primitive_count()
    }
}

/// All primitive groups and textures of the loaded scene
#[derive(Debug, Default)]
pub struct SceneStore {
    groups: Vec<StoredGroup>,
    textures: Vec<Texture>,
    total_primitives: usize,
    total_vertices: usize,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a group, bake its node transform into the stored attributes
    /// and append it. The group's texture, if any, moves into the store.
    pub fn add_group(
        &mut self,
        mut mesh: PrimitiveGroup,
        node: &NodeTransform,
    ) -> RasterResult<GroupId> {
        mesh.validate()?;

        if !node.is_identity() {
            pretransform(&mut mesh.positions, &mut mesh.normals, node);
        }
        if mesh.positions.iter().any(|p| !p.is_finite()) {
            log::warn!(
                "Group '{}' has non-finite positions; affected primitives will be skipped",
                mesh.label
            );
        }

        let texture = mesh.texture.take().map(|texture| {
            let texture_ref = TextureRef {
                id: self.textures.len() as u32,
                width: texture.width,
                height: texture.height,
            };
            self.textures.push(texture);
            texture_ref
        });

        let id = GroupId(self.groups.len());
        let primitive_offset = self.total_primitives;
        self.total_primitives += mesh.primitive_count();
        self.total_vertices += mesh.vertex_count();

        log::info!(
            "Loaded group '{}' ({:?}): {} vertices, {} primitives at offset {}{}",
            mesh.label,
            mesh.topology,
            mesh.vertex_count(),
            mesh.primitive_count(),
            primitive_offset,
            if texture.is_some() { ", textured" } else { "" }
        );

        self.groups.push(StoredGroup {
            mesh,
            texture,
            primitive_offset,
        });

        Ok(id)
    }

    pub fn groups(&self) -> &[StoredGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&StoredGroup> {
        self.groups.get(id.0)
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn texture(&self, texture: TextureRef) -> Option<&Texture> {
        self.textures.get(texture.id as usize)
    }

    /// Primitive count across all groups; the size of the global primitive
    /// array.
    pub fn total_primitives(&self) -> usize {
        self.total_primitives
    }

    pub fn total_vertices(&self) -> usize {
        self.total_vertices
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Release every group and texture. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.groups = Vec::new();
        self.textures = Vec::new();
        self.total_primitives = 0;
        self.total_vertices = 0;
    }
}
