//! Scan conversion and depth resolution
//!
//! One logical task per primitive. Each covered sample is depth-tested with
//! an atomic minimum; a task that owns the pixel afterwards locks the
//! pixel's fragment, re-reads the depth buffer and writes its interpolated
//! attributes only if it still owns it. The fragment left in a pixel is
//! therefore always the one whose depth the buffer holds.

use super::assembly::Primitive;
use super::depth::{encode_depth, DepthBuffer};
use super::fragment::{Fragment, FragmentBuffer};
use super::vertex::VertexOut;
use super::Viewport;
use glam::{Vec2, Vec3, Vec3Swizzles};
use rayon::prelude::*;
use std::ops::RangeInclusive;

/// Clip-space w at or below which a vertex counts as behind the eye.
pub const W_EPSILON: f32 = 1e-6;

/// Eye-space depth below which perspective correction falls back to
/// linear weights.
pub const EYE_DEPTH_EPSILON: f32 = 1e-6;

/// Texture coordinate interpolation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    /// Weights divided by each vertex's eye-space depth.
    #[default]
    PerspectiveCorrect,
    /// Plain screen-space barycentric weights.
    Linear,
}

/// Shared per-frame state every rasterization task writes into.
pub struct RasterTarget<'a> {
    pub viewport: Viewport,
    pub depth: &'a DepthBuffer,
    pub fragments: &'a FragmentBuffer,
    pub interpolation: Interpolation,
    pub flat_color: Vec3,
    pub cull_behind_camera: bool,
}

/// Rasterizer counters for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Primitives that reached scan conversion.
    pub rasterized: usize,
    /// Zero-area or non-finite primitives that were skipped.
    pub degenerate: usize,
    /// Primitives skipped because a vertex was at or behind the eye.
    pub behind_camera: usize,
    /// Covered samples submitted to the depth test.
    pub samples: usize,
}

impl RasterStats {
    fn merge(self, other: Self) -> Self {
        Self {
            rasterized: self.rasterized + other.rasterized,
            degenerate: self.degenerate + other.degenerate,
            behind_camera: self.behind_camera + other.behind_camera,
            samples: self.samples + other.samples,
        }
    }
}

/// What happened to a single primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rasterized { samples: usize },
    Degenerate,
    BehindCamera,
}

impl From<Outcome> for RasterStats {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Rasterized { samples } => Self {
                rasterized: 1,
                samples,
                ..Default::default()
            },
            Outcome::Degenerate => Self {
                degenerate: 1,
                ..Default::default()
            },
            Outcome::BehindCamera => Self {
                behind_camera: 1,
                ..Default::default()
            },
        }
    }
}

/// Rasterize the whole global primitive array.
pub fn rasterize_all(primitives: &[Primitive], target: &RasterTarget) -> RasterStats {
    primitives
        .par_iter()
        .enumerate()
        .map(|(id, primitive)| RasterStats::from(rasterize_primitive(id as u32, primitive, target)))
        .reduce(RasterStats::default, RasterStats::merge)
}

/// Rasterize one primitive with index `id` in the global array.
pub fn rasterize_primitive(id: u32, primitive: &Primitive, target: &RasterTarget) -> Outcome {
    let vertices = primitive.vertices();
    if target.cull_behind_camera && vertices.iter().any(|v| v.clip_w <= W_EPSILON) {
        return Outcome::BehindCamera;
    }
    if !vertices.iter().all(|v| v.screen_pos.is_finite()) {
        return Outcome::Degenerate;
    }

    match primitive {
        Primitive::Triangle(v) => rasterize_triangle(id, v, target),
        Primitive::Line(v) => rasterize_line(id, v, target),
        Primitive::Point(v) => rasterize_point(id, v, target),
    }
}

/// Screen-space axis-aligned bounds of a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoundingBox {
    pub fn of(points: &[Vec2]) -> Self {
        let init = Self {
            min: Vec2::splat(f32::INFINITY),
            max: Vec2::splat(f32::NEG_INFINITY),
        };
        points.iter().fold(init, |b, &p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        })
    }

    pub fn is_degenerate(&self) -> bool {
        self.min.x == self.max.x || self.min.y == self.max.y
    }

    /// Integer pixel coordinates inside the box, clamped to the viewport.
    /// Both bounds are inclusive so edges shared by neighbouring triangles
    /// leave no gap. `None` when the box misses the viewport.
    pub fn pixel_range(
        &self,
        viewport: Viewport,
    ) -> Option<(RangeInclusive<u32>, RangeInclusive<u32>)> {
        let max_x = viewport.width as f32 - 1.0;
        let max_y = viewport.height as f32 - 1.0;
        let x0 = self.min.x.ceil().max(0.0);
        let y0 = self.min.y.ceil().max(0.0);
        let x1 = self.max.x.floor().min(max_x);
        let y1 = self.max.y.floor().min(max_y);
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some((x0 as u32..=x1 as u32, y0 as u32..=y1 as u32))
    }
}

/// Twice the signed area of triangle `abc`.
fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (b.x - a.x) * (c.y - a.y)
}

/// A screen-space triangle prepared for barycentric evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ScreenTriangle {
    points: [Vec2; 3],
    area: f32,
}

impl ScreenTriangle {
    /// `None` for collinear or coincident vertices.
    pub fn new(points: [Vec2; 3]) -> Option<Self> {
        let area = edge(points[0], points[1], points[2]);
        if area.abs() <= f32::EPSILON || !area.is_finite() {
            return None;
        }
        Some(Self { points, area })
    }

    /// Barycentric weights of `p`, summing to 1.
    pub fn barycentric(&self, p: Vec2) -> Vec3 {
        let [a, b, c] = self.points;
        let beta = edge(a, p, c) / self.area;
        let gamma = edge(a, b, p) / self.area;
        Vec3::new(1.0 - beta - gamma, beta, gamma)
    }
}

/// Barycentric weights of `p` against `points`, or `None` if degenerate.
pub fn barycentric(points: [Vec2; 3], p: Vec2) -> Option<Vec3> {
    ScreenTriangle::new(points).map(|t| t.barycentric(p))
}

/// Inside-or-on-edge test. No fill rule: samples on a shared edge are
/// covered by both triangles.
pub fn is_covered(weights: Vec3) -> bool {
    weights.cmpge(Vec3::ZERO).all() && weights.cmple(Vec3::ONE).all()
}

/// Interpolate `texcoord0` across `vertices` with screen-space `weights`.
pub fn interpolate_texcoord(
    vertices: &[VertexOut],
    weights: &[f32],
    interpolation: Interpolation,
) -> Vec2 {
    let linear = || {
        vertices
            .iter()
            .zip(weights)
            .fold(Vec2::ZERO, |acc, (v, &w)| acc + v.texcoord0 * w)
    };

    if interpolation == Interpolation::Linear {
        return linear();
    }

    let mut weight_sum = 0.0;
    let mut texcoord = Vec2::ZERO;
    for (v, &w) in vertices.iter().zip(weights) {
        let eye_depth = v.eye_pos.z;
        if eye_depth.abs() < EYE_DEPTH_EPSILON {
            return linear();
        }
        let adjusted = w / eye_depth;
        weight_sum += adjusted;
        texcoord += v.texcoord0 * adjusted;
    }

    if weight_sum.abs() < f32::EPSILON {
        return linear();
    }
    texcoord / weight_sum
}

fn interpolate_fragment(
    vertices: &[VertexOut],
    weights: &[f32],
    target: &RasterTarget,
) -> Fragment {
    let mut eye_pos = Vec3::ZERO;
    let mut eye_nor = Vec3::ZERO;
    for (v, &w) in vertices.iter().zip(weights) {
        eye_pos += v.eye_pos * w;
        eye_nor += v.eye_nor * w;
    }

    Fragment {
        color: target.flat_color,
        eye_pos,
        eye_nor,
        texcoord0: interpolate_texcoord(vertices, weights, target.interpolation),
        texture: vertices[0].texture,
    }
}

/// Depth-test one sample and, if it wins, write its fragment.
fn resolve(
    target: &RasterTarget,
    index: usize,
    z: f32,
    id: u32,
    vertices: &[VertexOut],
    weights: &[f32],
) {
    let depth = encode_depth(z);
    if !target.depth.test_and_set(index, depth, id) {
        return;
    }

    let fragment = interpolate_fragment(vertices, weights, target);
    let mut slot = target.fragments.lock(index);
    if target.depth.holds(index, depth, id) {
        *slot = fragment;
    }
}

fn rasterize_triangle(id: u32, v: &[VertexOut; 3], target: &RasterTarget) -> Outcome {
    let points = [v[0].screen_pos.xy(), v[1].screen_pos.xy(), v[2].screen_pos.xy()];
    let bounds = BoundingBox::of(&points);
    if bounds.is_degenerate() {
        return Outcome::Degenerate;
    }
    let Some(triangle) = ScreenTriangle::new(points) else {
        return Outcome::Degenerate;
    };
    let Some((xs, ys)) = bounds.pixel_range(target.viewport) else {
        return Outcome::Rasterized { samples: 0 };
    };

    let depths = Vec3::new(v[0].screen_pos.z, v[1].screen_pos.z, v[2].screen_pos.z);
    let mut samples = 0;
    for y in ys {
        for x in xs.clone() {
            let weights = triangle.barycentric(Vec2::new(x as f32, y as f32));
            if !is_covered(weights) {
                continue;
            }
            samples += 1;
            // Relative to vertex 0 so a constant depth interpolates exactly
            let z = depths.x
                + weights.y * (depths.y - depths.x)
                + weights.z * (depths.z - depths.x);
            let index = target.viewport.index(x, y);
            resolve(target, index, z, id, v, &weights.to_array());
        }
    }

    Outcome::Rasterized { samples }
}

/// Parametric range of segment `p0 + t * delta`, `t` in `[0, 1]`, that lies
/// inside `[min, max]` (Liang-Barsky).
fn clip_segment(p0: Vec2, delta: Vec2, min: Vec2, max: Vec2) -> Option<(f32, f32)> {
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    let bounds = [
        (-delta.x, p0.x - min.x),
        (delta.x, max.x - p0.x),
        (-delta.y, p0.y - min.y),
        (delta.y, max.y - p0.y),
    ];
    for (p, q) in bounds {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    (t0 <= t1).then_some((t0, t1))
}

fn rasterize_line(id: u32, v: &[VertexOut; 2], target: &RasterTarget) -> Outcome {
    let p0 = v[0].screen_pos.xy();
    let delta = v[1].screen_pos.xy() - p0;
    if delta == Vec2::ZERO {
        return Outcome::Degenerate;
    }

    let viewport = target.viewport;
    let max = Vec2::new(viewport.width as f32, viewport.height as f32) - 1.0;
    let Some((t0, t1)) = clip_segment(p0, delta, Vec2::ZERO, max) else {
        return Outcome::Rasterized { samples: 0 };
    };

    // DDA along the major axis of the visible part
    let steps = (delta * (t1 - t0)).abs().max_element().ceil().max(1.0) as u32;
    let mut samples = 0;
    for step in 0..=steps {
        let t = t0 + (t1 - t0) * step as f32 / steps as f32;
        let pixel = (p0 + delta * t).round();
        if !viewport.contains(pixel.x as i64, pixel.y as i64) {
            continue;
        }
        samples += 1;
        let weights = [1.0 - t, t];
        let z = v[0].screen_pos.z + t * (v[1].screen_pos.z - v[0].screen_pos.z);
        let index = viewport.index(pixel.x as u32, pixel.y as u32);
        resolve(target, index, z, id, v, &weights);
    }

    Outcome::Rasterized { samples }
}

fn rasterize_point(id: u32, v: &VertexOut, target: &RasterTarget) -> Outcome {
    let pixel = v.screen_pos.xy().round();
    if !target.viewport.contains(pixel.x as i64, pixel.y as i64) {
        return Outcome::Rasterized { samples: 0 };
    }
    let index = target.viewport.index(pixel.x as u32, pixel.y as u32);
    resolve(target, index, v.screen_pos.z, id, std::slice::from_ref(v), &[1.0]);
    Outcome::Rasterized { samples: 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vertex(x: f32, y: f32, z: f32) -> VertexOut {
        VertexOut {
            screen_pos: Vec3::new(x, y, z),
            clip_w: 1.0,
            eye_pos: Vec3::new(0.0, 0.0, -1.0),
            eye_nor: Vec3::Z,
            ..Default::default()
        }
    }

    struct Buffers {
        viewport: Viewport,
        depth: DepthBuffer,
        fragments: FragmentBuffer,
    }

    impl Buffers {
        fn new(width: u32, height: u32) -> Self {
            let viewport = Viewport::new(width, height);
            Self {
                viewport,
                depth: DepthBuffer::new(viewport.pixel_count()).unwrap(),
                fragments: FragmentBuffer::new(viewport.pixel_count()).unwrap(),
            }
        }

        fn target(&self) -> RasterTarget<'_> {
            RasterTarget {
                viewport: self.viewport,
                depth: &self.depth,
                fragments: &self.fragments,
                interpolation: Interpolation::PerspectiveCorrect,
                flat_color: Vec3::ONE,
                cull_behind_camera: true,
            }
        }

        fn covered(&self) -> usize {
            self.depth.covered()
        }
    }

    #[test]
    fn test_bounding_box_clamps_to_viewport() {
        let bounds = BoundingBox::of(&[
            Vec2::new(-3.5, 1.2),
            Vec2::new(10.0, 2.0),
            Vec2::new(2.0, 8.0),
        ]);
        let (xs, ys) = bounds.pixel_range(Viewport::new(4, 4)).unwrap();
        assert_eq!(xs, 0..=3);
        assert_eq!(ys, 2..=3);
    }

    #[test]
    fn test_bounding_box_off_screen() {
        let bounds = BoundingBox::of(&[Vec2::new(10.0, 10.0), Vec2::new(12.0, 11.0)]);
        assert!(bounds.pixel_range(Viewport::new(4, 4)).is_none());
    }

    #[test]
    fn test_barycentric_partition() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(8.0, 0.0), Vec2::new(0.0, 8.0)];
        for p in [Vec2::new(1.0, 1.0), Vec2::new(2.5, 4.0), Vec2::new(0.0, 0.0)] {
            let w = barycentric(points, p).unwrap();
            assert_relative_eq!(w.x + w.y + w.z, 1.0, epsilon = 1e-6);
            assert!(is_covered(w));
        }
        let outside = barycentric(points, Vec2::new(9.0, 9.0)).unwrap();
        assert!(!is_covered(outside));
    }

    #[test]
    fn test_barycentric_vertices() {
        let points = [Vec2::new(1.0, 1.0), Vec2::new(5.0, 1.0), Vec2::new(3.0, 4.0)];
        assert_eq!(barycentric(points, points[0]).unwrap(), Vec3::X);
        assert_eq!(barycentric(points, points[1]).unwrap(), Vec3::Y);
        assert_eq!(barycentric(points, points[2]).unwrap(), Vec3::Z);
    }

    #[test]
    fn test_collinear_triangle_is_skipped() {
        let buffers = Buffers::new(8, 8);
        let collinear = Primitive::Triangle([
            vertex(0.0, 0.0, 0.5),
            vertex(2.0, 2.0, 0.5),
            vertex(5.0, 5.0, 0.5),
        ]);
        let coincident = Primitive::Triangle([vertex(3.0, 3.0, 0.5); 3]);
        let flat = Primitive::Triangle([
            vertex(0.0, 4.0, 0.5),
            vertex(3.0, 4.0, 0.5),
            vertex(6.0, 4.0, 0.5),
        ]);
        for primitive in [collinear, coincident, flat] {
            assert_eq!(rasterize_primitive(0, &primitive, &buffers.target()), Outcome::Degenerate);
        }
        assert_eq!(buffers.covered(), 0);
    }

    #[test]
    fn test_behind_camera_is_skipped() {
        let buffers = Buffers::new(8, 8);
        let mut behind = vertex(6.0, 0.0, 0.5);
        behind.clip_w = -1.0;
        let primitive = Primitive::Triangle([vertex(0.0, 0.0, 0.5), behind, vertex(0.0, 6.0, 0.5)]);
        assert_eq!(rasterize_primitive(0, &primitive, &buffers.target()), Outcome::BehindCamera);
        assert_eq!(buffers.covered(), 0);
    }

    #[test]
    fn test_nearer_triangle_wins_both_orders() {
        let near = Primitive::Triangle([
            vertex(0.0, 0.0, 0.8),
            vertex(7.0, 0.0, 0.8),
            vertex(0.0, 7.0, 0.8),
        ]);
        let mut far_vertices = [
            vertex(0.0, 0.0, 0.2),
            vertex(7.0, 0.0, 0.2),
            vertex(0.0, 7.0, 0.2),
        ];
        for v in &mut far_vertices {
            v.eye_nor = -Vec3::Z;
        }
        let far = Primitive::Triangle(far_vertices);

        for order in [[(0, near), (1, far)], [(1, far), (0, near)]] {
            let buffers = Buffers::new(8, 8);
            for (id, primitive) in order {
                rasterize_primitive(id, &primitive, &buffers.target());
            }
            let index = buffers.viewport.index(1, 1);
            assert_eq!(buffers.depth.depth_at(index), encode_depth(0.8));
            assert_eq!(buffers.depth.winner_at(index), Some(0));
            assert!(buffers.fragments.get(index).eye_nor.z > 0.0);
        }
    }

    #[test]
    fn test_perspective_matches_linear_at_constant_depth() {
        let mut vertices = [vertex(0.0, 0.0, 0.5), vertex(8.0, 0.0, 0.5), vertex(0.0, 8.0, 0.5)];
        vertices[0].texcoord0 = Vec2::new(0.0, 0.0);
        vertices[1].texcoord0 = Vec2::new(1.0, 0.0);
        vertices[2].texcoord0 = Vec2::new(0.0, 1.0);
        for v in &mut vertices {
            v.eye_pos.z = -3.0;
        }
        let weights = [0.2, 0.3, 0.5];
        let perspective =
            interpolate_texcoord(&vertices, &weights, Interpolation::PerspectiveCorrect);
        let linear = interpolate_texcoord(&vertices, &weights, Interpolation::Linear);
        assert_relative_eq!(perspective.x, linear.x, epsilon = 1e-6);
        assert_relative_eq!(perspective.y, linear.y, epsilon = 1e-6);
    }

    #[test]
    fn test_perspective_favors_near_vertex() {
        let mut vertices = [vertex(0.0, 0.0, 0.5), vertex(8.0, 0.0, 0.5)];
        vertices[0].texcoord0 = Vec2::ZERO;
        vertices[1].texcoord0 = Vec2::ONE;
        vertices[0].eye_pos.z = -1.0;
        vertices[1].eye_pos.z = -4.0;
        let uv = interpolate_texcoord(&vertices, &[0.5, 0.5], Interpolation::PerspectiveCorrect);
        // 0.5/1 and 0.5/4 => weight of far vertex is 0.2
        assert_relative_eq!(uv.x, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_eye_depth_falls_back_to_linear() {
        let mut vertices = [vertex(0.0, 0.0, 0.5), vertex(8.0, 0.0, 0.5)];
        vertices[1].texcoord0 = Vec2::ONE;
        vertices[0].eye_pos.z = 0.0;
        let uv = interpolate_texcoord(&vertices, &[0.25, 0.75], Interpolation::PerspectiveCorrect);
        assert!(uv.is_finite());
        assert_relative_eq!(uv.x, 0.75);
    }

    #[test]
    fn test_line_covers_every_column() {
        let buffers = Buffers::new(8, 4);
        let line = Primitive::Line([vertex(0.0, 1.0, 0.5), vertex(7.0, 1.0, 0.5)]);
        assert_eq!(
            rasterize_primitive(0, &line, &buffers.target()),
            Outcome::Rasterized { samples: 8 }
        );
        for x in 0..8 {
            assert_eq!(buffers.depth.winner_at(buffers.viewport.index(x, 1)), Some(0));
        }
        assert_eq!(buffers.covered(), 8);
    }

    #[test]
    fn test_line_clipped_to_viewport() {
        let buffers = Buffers::new(4, 4);
        let line = Primitive::Line([vertex(-100.0, 2.0, 0.5), vertex(100.0, 2.0, 0.5)]);
        rasterize_primitive(0, &line, &buffers.target());
        assert_eq!(buffers.covered(), 4);
    }

    #[test]
    fn test_point_writes_single_pixel() {
        let buffers = Buffers::new(4, 4);
        let point = Primitive::Point(vertex(2.2, 0.9, 0.5));
        rasterize_primitive(3, &point, &buffers.target());
        assert_eq!(buffers.covered(), 1);
        assert_eq!(buffers.depth.winner_at(buffers.viewport.index(2, 1)), Some(3));
    }

    #[test]
    fn test_rasterize_all_counts() {
        let buffers = Buffers::new(8, 8);
        let primitives = vec![
            Primitive::Triangle([
                vertex(0.0, 0.0, 0.5),
                vertex(7.0, 0.0, 0.5),
                vertex(0.0, 7.0, 0.5),
            ]),
            Primitive::Triangle([vertex(1.0, 1.0, 0.5); 3]),
        ];
        let stats = rasterize_all(&primitives, &buffers.target());
        assert_eq!(stats.rasterized, 1);
        assert_eq!(stats.degenerate, 1);
        assert_eq!(stats.samples, buffers.covered());
    }
}
