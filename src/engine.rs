//! Rasterizer orchestrator
//!
//! Owns the scene store and every per-frame buffer, and runs the pipeline
//! stages in order for each rendered frame.

use crate::error::{try_alloc, RasterError, RasterResult};
use crate::pipeline::assembly::{assemble_all, Primitive};
use crate::pipeline::raster::{rasterize_all, RasterTarget};
use crate::pipeline::shading::shade_all;
use crate::pipeline::vertex::process_group;
use crate::pipeline::{
    DepthBuffer, FragmentBuffer, FrameTransforms, Framebuffer, VertexOut, Viewport,
};
use crate::resources::PrimitiveGroup;
use crate::scene::{Camera, GroupId, NodeTransform, SceneStore};
use crate::RasterConfig;
use glam::Mat4;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frame number, starting at 1
    pub frame: u64,
    pub vertices: usize,
    /// Size of the global primitive array
    pub primitives: usize,
    pub rasterized: usize,
    pub degenerate: usize,
    pub behind_camera: usize,
    /// Covered samples submitted to the depth test
    pub samples: usize,
    /// Pixels holding a fragment after depth resolution
    pub covered_pixels: usize,
    pub elapsed: Duration,
}

/// The software rasterizer
pub struct Rasterizer {
    config: RasterConfig,
    viewport: Viewport,
    scene: SceneStore,
    /// Vertex stage output, one buffer per group
    vertex_outs: Vec<Vec<VertexOut>>,
    /// Global primitive array, partitioned by group offsets
    primitives: Vec<Primitive>,
    depth: DepthBuffer,
    fragments: FragmentBuffer,
    framebuffer: Framebuffer,
    frame: u64,
    released: bool,
}

impl Rasterizer {
    /// Allocate the depth, fragment and frame buffers for `config`'s
    /// fixed target size.
    pub fn new(config: RasterConfig) -> RasterResult<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(RasterError::InvalidViewport {
                width: config.width,
                height: config.height,
            });
        }

        let viewport = config.viewport();
        let pixel_count = viewport.pixel_count();
        let depth = DepthBuffer::new(pixel_count)?;
        let fragments = FragmentBuffer::new(pixel_count)?;
        let framebuffer = Framebuffer::new(config.width, config.height)?;

        log::info!(
            "Rasterizer initialized: {}x{}, {:?} shading, {:?} filtering, {:?} interpolation",
            config.width,
            config.height,
            config.shading,
            config.texture_filter,
            config.interpolation
        );

        Ok(Self {
            config,
            viewport,
            scene: SceneStore::new(),
            vertex_outs: Vec::new(),
            primitives: Vec::new(),
            depth,
            fragments,
            framebuffer,
            frame: 0,
            released: false,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Get reference to the scene store
    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    /// Load a primitive group, baking `node` into its attributes.
    ///
    /// Sizes the group's vertex buffer and grows the global primitive array
    /// before the group is committed, so a failed load leaves the
    /// rasterizer unchanged.
    pub fn load_group(
        &mut self,
        mesh: PrimitiveGroup,
        node: &NodeTransform,
    ) -> RasterResult<GroupId> {
        if self.released {
            return Err(RasterError::Released);
        }
        mesh.validate()?;

        let total = self.scene.total_primitives() + mesh.primitive_count();
        if total > u32::MAX as usize {
            return Err(RasterError::TooManyPrimitives(total));
        }

        let vertex_out = try_alloc("vertex output", mesh.vertex_count(), VertexOut::default())?;
        self.primitives
            .try_reserve_exact(mesh.primitive_count())
            .map_err(|_| RasterError::OutOfMemory {
                what: "primitive array",
                bytes: mesh.primitive_count() * std::mem::size_of::<Primitive>(),
            })?;
        self.vertex_outs.try_reserve(1).map_err(|_| RasterError::OutOfMemory {
            what: "vertex output table",
            bytes: std::mem::size_of::<Vec<VertexOut>>(),
        })?;

        let id = self.scene.add_group(mesh, node)?;
        self.vertex_outs.push(vertex_out);
        self.primitives.resize(total, Primitive::default());
        Ok(id)
    }

    /// Render one frame with explicit camera matrices.
    pub fn render(&mut self, transforms: &FrameTransforms) -> RasterResult<RenderStats> {
        if self.released {
            return Err(RasterError::Released);
        }
        let started = Instant::now();
        self.frame += 1;

        self.depth.clear();
        self.fragments.clear();

        let viewport = self.viewport;
        let groups = self.scene.groups();
        groups
            .par_iter()
            .zip(self.vertex_outs.par_iter_mut())
            .for_each(|(group, out)| process_group(group, transforms, viewport, out));

        assemble_all(groups, &self.vertex_outs, &mut self.primitives);

        let raster = {
            let target = RasterTarget {
                viewport,
                depth: &self.depth,
                fragments: &self.fragments,
                interpolation: self.config.interpolation,
                flat_color: self.config.flat_color,
                cull_behind_camera: self.config.cull_behind_camera,
            };
            rasterize_all(&self.primitives, &target)
        };

        shade_all(
            &mut self.fragments,
            &self.depth,
            &self.scene,
            &self.config.shading_params(),
            &mut self.framebuffer,
        );

        let stats = RenderStats {
            frame: self.frame,
            vertices: self.scene.total_vertices(),
            primitives: self.primitives.len(),
            rasterized: raster.rasterized,
            degenerate: raster.degenerate,
            behind_camera: raster.behind_camera,
            samples: raster.samples,
            covered_pixels: self.depth.covered(),
            elapsed: started.elapsed(),
        };

        log::debug!(
            "Frame {}: {} vertices, {}/{} primitives rasterized ({} degenerate, {} behind camera), {} samples, {} pixels covered in {:?}",
            stats.frame,
            stats.vertices,
            stats.rasterized,
            stats.primitives,
            stats.degenerate,
            stats.behind_camera,
            stats.samples,
            stats.covered_pixels,
            stats.elapsed
        );

        Ok(stats)
    }

    /// Render one frame as seen by `camera`, with `model` applied on top of
    /// the baked node transforms.
    pub fn render_camera(&mut self, camera: &Camera, model: Mat4) -> RasterResult<RenderStats> {
        self.render(&camera.frame_transforms(model))
    }

    /// Get the most recent frame
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn fragment_buffer(&self) -> &FragmentBuffer {
        &self.fragments
    }

    /// Copy the most recent frame into an RGBA8 surface.
    pub fn present_into(&self, surface: &mut [u8]) -> RasterResult<()> {
        if self.released {
            return Err(RasterError::Released);
        }
        self.framebuffer.write_rgba8(surface)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release the scene and every frame buffer. Calling it again is a
    /// no-op.
    pub fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.scene.clear();
        self.vertex_outs = Vec::new();
        self.primitives = Vec::new();
        self.depth.release();
        self.fragments.release();
        self.framebuffer.release();
        self.released = true;
        log::info!("Rasterizer released after {} frames", self.frame);
    }
}

impl Drop for Rasterizer {
    fn drop(&mut self) {
        self.teardown();
    }
}
