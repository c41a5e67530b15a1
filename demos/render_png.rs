//! Offline demo: renders a textured cube over a floor plane to a PNG
//!
//! Run with:
//!   cargo run --release --example render_png
//!   cargo run --release --example render_png -- --shading toon --filter nearest -o toon.png
//!   RUST_LOG=debug cargo run --example render_png -- --frames 10

use clap::{Parser, ValueEnum};
use glam::{Mat4, Quat, Vec3};
use raster_engine::scene::Projection;
use raster_engine::{
    Camera, DirectionalLight, Interpolation, NodeTransform, PrimitiveGroup, RasterConfig,
    Rasterizer, ShadingModel, Texture, TextureFilter, Transform,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum CliShading {
    #[default]
    Diffuse,
    BlinnPhong,
    Toon,
}

impl From<CliShading> for ShadingModel {
    fn from(value: CliShading) -> Self {
        match value {
            CliShading::Diffuse => ShadingModel::Diffuse,
            CliShading::BlinnPhong => ShadingModel::BlinnPhong,
            CliShading::Toon => ShadingModel::Toon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum CliFilter {
    Nearest,
    #[default]
    Bilinear,
}

impl From<CliFilter> for TextureFilter {
    fn from(value: CliFilter) -> Self {
        match value {
            CliFilter::Nearest => TextureFilter::Nearest,
            CliFilter::Bilinear => TextureFilter::Bilinear,
        }
    }
}

/// Software rasterizer demo.
#[derive(Parser, Debug)]
#[command(name = "render_png", about = "Render a test scene with the software rasterizer")]
struct Args {
    /// Output PNG path.
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Image width in pixels.
    #[arg(long, default_value = "800")]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value = "600")]
    height: u32,

    /// Lighting model.
    #[arg(long, default_value = "diffuse", value_enum)]
    shading: CliShading,

    /// Texture filter.
    #[arg(long, default_value = "bilinear", value_enum)]
    filter: CliFilter,

    /// Interpolate texture coordinates linearly in screen space.
    #[arg(long)]
    linear: bool,

    /// Decode textures and encode output with gamma 2.2.
    #[arg(long)]
    gamma: bool,

    /// Optional diffuse texture for the cube (defaults to a checkerboard).
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Number of frames to render, orbiting the camera between them.
    #[arg(long, default_value = "1")]
    frames: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let interpolation = if args.linear {
        Interpolation::Linear
    } else {
        Interpolation::PerspectiveCorrect
    };
    let light = DirectionalLight::new(Vec3::new(0.4, 0.8, 0.6), Vec3::ONE)
        .with_blinn_phong(0.15, 0.4, 32.0);
    let config = RasterConfig::new(args.width, args.height)
        .with_shading(args.shading.into())
        .with_texture_filter(args.filter.into())
        .with_interpolation(interpolation)
        .with_gamma_correct(args.gamma)
        .with_clear_color(Vec3::new(0.1, 0.12, 0.18))
        .with_light(light);
    let mut rasterizer = Rasterizer::new(config)?;

    let cube_texture = match &args.texture {
        Some(path) => Texture::from_file(path)?,
        None => Texture::checkerboard(256, 32, [230, 80, 60], [240, 230, 210]),
    };
    let cube_node = Transform::from_position_rotation(
        Vec3::new(0.0, 0.5, 0.0),
        Quat::from_rotation_y(0.6),
    );
    rasterizer.load_group(
        PrimitiveGroup::cube().with_texture(cube_texture),
        &cube_node.node(&NodeTransform::IDENTITY),
    )?;

    let floor = PrimitiveGroup::plane(6.0, 6.0, 8)
        .with_texture(Texture::checkerboard(64, 8, [90, 90, 90], [160, 160, 160]));
    rasterizer.load_group(floor, &NodeTransform::IDENTITY)?;

    let frames = args.frames.max(1);
    for frame in 0..frames {
        let yaw = 0.6 + frame as f32 * std::f32::consts::TAU / frames as f32;
        let mut camera = Camera::orbit(Vec3::new(0.0, 0.4, 0.0), 4.5, yaw, 0.45)
            .with_projection(Projection::perspective(45.0, 1.0, 0.1));
        camera.set_aspect(args.width as f32, args.height as f32);
        let stats = rasterizer.render_camera(&camera, Mat4::IDENTITY)?;
        log::info!(
            "Frame {}: {} pixels covered by {} primitives in {:?}",
            stats.frame,
            stats.covered_pixels,
            stats.rasterized,
            stats.elapsed
        );
    }

    rasterizer.framebuffer().save_png(&args.output)?;
    rasterizer.teardown();
    Ok(())
}
