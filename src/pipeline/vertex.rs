//! Vertex processing
//!
//! Transforms every vertex of a primitive group from object space to screen
//! space and eye space. One logical task per vertex; the output array is
//! overwritten in place every frame.

use super::Viewport;
use crate::scene::{NodeTransform, StoredGroup, TextureRef};
use glam::{Mat3, Mat4, Vec2, Vec3, Vec3Swizzles, Vec4Swizzles};
use rayon::prelude::*;

/// Camera matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransforms {
    /// Model-view-projection
    pub mvp: Mat4,
    /// Model-view
    pub mv: Mat4,
    /// Inverse transpose of the upper 3x3 of `mv`
    pub mv_normal: Mat3,
}

impl Default for FrameTransforms {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FrameTransforms {
    pub const IDENTITY: Self = Self {
        mvp: Mat4::IDENTITY,
        mv: Mat4::IDENTITY,
        mv_normal: Mat3::IDENTITY,
    };

    pub fn new(mvp: Mat4, mv: Mat4, mv_normal: Mat3) -> Self {
        Self { mvp, mv, mv_normal }
    }

    /// Build from separate projection and model-view matrices.
    pub fn from_projection(projection: Mat4, mv: Mat4) -> Self {
        Self {
            mvp: projection * mv,
            mv,
            mv_normal: crate::scene::normal_matrix(mv),
        }
    }
}

/// A transformed vertex, consumed by primitive assembly in the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexOut {
    /// Pixel-space x/y after the flipped viewport transform; z is the
    /// perspective-divided depth.
    pub screen_pos: Vec3,
    /// Clip-space w before the divide. Non-positive at or behind the eye.
    pub clip_w: f32,
    pub eye_pos: Vec3,
    pub eye_nor: Vec3,
    pub texcoord0: Vec2,
    pub texture: Option<TextureRef>,
}

/// Map NDC x/y to pixel coordinates. Both axes are flipped: NDC `(1, 1)`
/// lands on pixel `(0, 0)`.
pub fn viewport_map(ndc: Vec2, viewport: Viewport) -> Vec2 {
    let half = Vec2::new(viewport.width as f32, viewport.height as f32) * 0.5;
    half * -ndc + half
}

/// Transform a single vertex.
pub fn transform_vertex(
    position: Vec3,
    normal: Vec3,
    texcoord0: Vec2,
    texture: Option<TextureRef>,
    transforms: &FrameTransforms,
    viewport: Viewport,
) -> VertexOut {
    let clip = transforms.mvp * position.extend(1.0);
    let ndc = clip.xyz() / clip.w;
    let screen = viewport_map(ndc.xy(), viewport);

    let eye = transforms.mv * position.extend(1.0);

    VertexOut {
        screen_pos: screen.extend(ndc.z),
        clip_w: clip.w,
        eye_pos: eye.xyz() / eye.w,
        eye_nor: (transforms.mv_normal * normal).normalize_or_zero(),
        texcoord0,
        texture,
    }
}

/// Run the vertex stage for one group, writing one output per vertex.
///
/// `out` must hold exactly `group.vertex_count()` entries.
pub fn process_group(
    group: &StoredGroup,
    transforms: &FrameTransforms,
    viewport: Viewport,
    out: &mut [VertexOut],
) {
    debug_assert_eq!(out.len(), group.mesh.vertex_count());
    let mesh = &group.mesh;
    let texture = group.texture;

    out.par_iter_mut().enumerate().for_each(|(i, vertex)| {
        *vertex = transform_vertex(
            mesh.positions[i],
            mesh.normals[i],
            mesh.texcoords[i],
            texture,
            transforms,
            viewport,
        );
    });
}

/// Bake a node transform into object-space positions and normals. Runs once
/// at load time with the same per-vertex shape as [`process_group`].
pub fn pretransform(positions: &mut [Vec3], normals: &mut [Vec3], node: &NodeTransform) {
    positions.par_iter_mut().for_each(|p| {
        let world = node.matrix * p.extend(1.0);
        *p = world.xyz() / world.w;
    });
    normals.par_iter_mut().for_each(|n| {
        *n = (node.normal_matrix * *n).normalize_or_zero();
    });
}
