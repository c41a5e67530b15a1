//! Fragment shading
//!
//! Turns the resolved fragment buffer into final colors. Every pixel is
//! independent; the only shared inputs are the read-only scene textures and
//! the shading parameters.

use super::depth::DepthBuffer;
use super::fragment::{Fragment, FragmentBuffer};
use super::framebuffer::Framebuffer;
use crate::resources::{Texture, TextureFilter};
use crate::scene::{DirectionalLight, SceneStore};
use glam::Vec3;
use rayon::prelude::*;

/// Display gamma used when gamma correction is enabled.
pub const GAMMA: f32 = 2.2;

/// Lighting model applied to textured fragments. One model per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadingModel {
    /// Lambertian term only
    #[default]
    Diffuse,
    /// Ambient, Lambertian and half-vector specular
    BlinnPhong,
    /// Lambertian term quantized into four brightness bands
    Toon,
}

/// Inputs of the shading stage that stay fixed over a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingParams {
    pub model: ShadingModel,
    pub filter: TextureFilter,
    pub light: DirectionalLight,
    pub gamma_correct: bool,
    /// Written to pixels no primitive covered.
    pub clear_color: Vec3,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            model: ShadingModel::default(),
            filter: TextureFilter::default(),
            light: DirectionalLight::default(),
            gamma_correct: false,
            clear_color: Vec3::ZERO,
        }
    }
}

/// Brightness multiplier of the toon band `cos_theta` falls in.
pub fn toon_band(cos_theta: f32) -> f32 {
    if cos_theta > 0.75 {
        1.0
    } else if cos_theta > 0.5 {
        0.7
    } else if cos_theta > 0.05 {
        0.35
    } else {
        0.1
    }
}

/// Shade one covered fragment.
///
/// Untextured fragments pass their flat color through unlit.
pub fn shade_fragment(
    fragment: &Fragment,
    texture: Option<&Texture>,
    params: &ShadingParams,
) -> Vec3 {
    let Some(texture) = texture else {
        return fragment.color;
    };

    let mut diffuse = texture.sample(fragment.texcoord0, params.filter);
    if params.gamma_correct {
        diffuse = diffuse.powf(GAMMA);
    }

    let light = &params.light;
    let normal = fragment.eye_nor.normalize_or_zero();
    let cos_theta = normal.dot(light.direction).max(0.0);

    let color = match params.model {
        ShadingModel::Diffuse => diffuse * cos_theta * light.color,
        ShadingModel::BlinnPhong => {
            let view = (-fragment.eye_pos).normalize_or_zero();
            let half = (light.direction + view).normalize_or_zero();
            let specular = if cos_theta > 0.0 {
                normal.dot(half).max(0.0).powf(light.shininess) * light.specular
            } else {
                0.0
            };
            (diffuse * (light.ambient + cos_theta) + Vec3::splat(specular)) * light.color
        }
        ShadingModel::Toon => diffuse * cos_theta * toon_band(cos_theta) * light.color,
    };

    if params.gamma_correct {
        color.max(Vec3::ZERO).powf(1.0 / GAMMA)
    } else {
        color
    }
}

/// Shade every pixel into `framebuffer`.
///
/// Pixels the depth buffer reports as uncovered receive the clear color.
pub fn shade_all(
    fragments: &mut FragmentBuffer,
    depth: &DepthBuffer,
    scene: &SceneStore,
    params: &ShadingParams,
    framebuffer: &mut Framebuffer,
) {
    fragments
        .cells_mut()
        .par_iter_mut()
        .zip(framebuffer.pixels_mut().par_iter_mut())
        .enumerate()
        .for_each(|(index, (cell, pixel))| {
            if depth.winner_at(index).is_none() {
                *pixel = params.clear_color;
                return;
            }
            let fragment = cell.get_mut();
            let texture = fragment.texture.and_then(|t| scene.texture(t));
            *pixel = shade_fragment(fragment, texture, params);
        });
}
