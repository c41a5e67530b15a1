//! Primitive groups: structure-of-arrays mesh data
//!
//! A [`PrimitiveGroup`] is one mesh sub-primitive. Its vertex attributes are
//! parallel arrays keyed by vertex id; the invariants that tie them together
//! are checked once in [`PrimitiveGroup::validate`] rather than assumed.

use crate::error::{RasterError, RasterResult};
use crate::resources::Texture;
use glam::{Vec2, Vec3};

/// Primitive topology describing how indices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each index is a separate point.
    PointList,
    /// Every two indices form a line.
    LineList,
    /// Indices form a connected strip of lines.
    LineStrip,
    /// Like [`LineStrip`](Self::LineStrip), closed back to the first index.
    LineLoop,
    /// Every three indices form a triangle.
    #[default]
    TriangleList,
    /// Indices form a connected strip of triangles.
    TriangleStrip,
    /// Every index after the second forms a triangle with the first index.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Number of vertices in one primitive of this topology.
    pub fn arity(&self) -> usize {
        match self {
            Self::PointList => 1,
            Self::LineList | Self::LineStrip | Self::LineLoop => 2,
            Self::TriangleList | Self::TriangleStrip | Self::TriangleFan => 3,
        }
    }

    /// Number of primitives produced by `index_count` indices.
    ///
    /// Returns 0 when there are too few indices for even one primitive.
    pub fn primitive_count(&self, index_count: usize) -> usize {
        match self {
            Self::PointList => index_count,
            Self::LineList => index_count / 2,
            Self::LineStrip => index_count.saturating_sub(1),
            Self::LineLoop => {
                if index_count >= 2 {
                    index_count
                } else {
                    0
                }
            }
            Self::TriangleList => index_count / 3,
            Self::TriangleStrip | Self::TriangleFan => index_count.saturating_sub(2),
        }
    }

    /// Whether `index_count` indices form a whole, non-empty set of primitives.
    pub fn accepts_index_count(&self, index_count: usize) -> bool {
        match self {
            Self::PointList | Self::LineList | Self::TriangleList => {
                index_count > 0 && index_count % self.arity() == 0
            }
            Self::LineStrip | Self::LineLoop | Self::TriangleStrip | Self::TriangleFan => {
                index_count >= self.arity()
            }
        }
    }
}

/// One mesh sub-primitive with parallel vertex attribute arrays.
#[derive(Debug, Clone)]
pub struct PrimitiveGroup {
    pub label: String,
    pub topology: PrimitiveTopology,
    pub indices: Vec<u32>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub texture: Option<Texture>,
}

impl PrimitiveGroup {
    pub fn new(label: &str, topology: PrimitiveTopology) -> Self {
        Self {
            label: label.to_string(),
            topology,
            indices: Vec::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            texture: None,
        }
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_positions(mut self, positions: Vec<Vec3>) -> Self {
        self.positions = positions;
        self
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_texcoords(mut self, texcoords: Vec<Vec2>) -> Self {
        self.texcoords = texcoords;
        self
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.topology.primitive_count(self.indices.len())
    }

    /// Check the structure-of-arrays invariants: every attribute array has
    /// one entry per vertex, every index names a vertex, and the index count
    /// forms whole primitives. An attached texture must also be well formed.
    pub fn validate(&self) -> RasterResult<()> {
        if self.indices.is_empty() {
            return Err(RasterError::EmptyIndices(self.label.clone()));
        }
        if !self.topology.accepts_index_count(self.indices.len()) {
            return Err(RasterError::IndexCountMismatch {
                label: self.label.clone(),
                topology: self.topology,
                count: self.indices.len(),
            });
        }

        let expected = self.positions.len();
        for (attribute, actual) in [
            ("normal", self.normals.len()),
            ("texcoord0", self.texcoords.len()),
        ] {
            if actual != expected {
                return Err(RasterError::AttributeLengthMismatch {
                    label: self.label.clone(),
                    attribute,
                    expected,
                    actual,
                });
            }
        }

        if let Some((slot, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, &i)| i as usize >= expected)
        {
            return Err(RasterError::IndexOutOfRange {
                label: self.label.clone(),
                slot,
                index,
                vertex_count: expected,
            });
        }

        if let Some(texture) = &self.texture {
            texture.validate()?;
        }

        Ok(())
    }

    /// A single triangle facing +Z.
    pub fn triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self::new("triangle", PrimitiveTopology::TriangleList)
            .with_indices(vec![0, 1, 2])
            .with_positions(vec![a, b, c])
            .with_normals(vec![Vec3::Z; 3])
            .with_texcoords(vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.5, 0.0),
            ])
    }

    /// Create a plane on the XZ axis
    pub fn plane(width: f32, depth: f32, subdivisions: u32) -> Self {
        let subdivisions = subdivisions.max(1);
        let mut group = Self::new("plane", PrimitiveTopology::TriangleList);

        let half_width = width / 2.0;
        let half_depth = depth / 2.0;
        let step_x = width / subdivisions as f32;
        let step_z = depth / subdivisions as f32;

        for z in 0..=subdivisions {
            for x in 0..=subdivisions {
                group.positions.push(Vec3::new(
                    -half_width + x as f32 * step_x,
                    0.0,
                    -half_depth + z as f32 * step_z,
                ));
                group.normals.push(Vec3::Y);
                group.texcoords.push(Vec2::new(
                    x as f32 / subdivisions as f32,
                    z as f32 / subdivisions as f32,
                ));
            }
        }

        for z in 0..subdivisions {
            for x in 0..subdivisions {
                let current = z * (subdivisions + 1) + x;
                let next = current + subdivisions + 1;
                group.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        group
    }

    /// Create a unit cube centered at origin
    pub fn cube() -> Self {
        let mut group = Self::new("cube", PrimitiveTopology::TriangleList);

        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
        ];

        for (normal, right, up) in faces {
            let base = group.positions.len() as u32;
            let center = normal * 0.5;
            let corners = [
                (-0.5, -0.5, Vec2::new(0.0, 1.0)),
                (0.5, -0.5, Vec2::new(1.0, 1.0)),
                (0.5, 0.5, Vec2::new(1.0, 0.0)),
                (-0.5, 0.5, Vec2::new(0.0, 0.0)),
            ];
            for (u, v, uv) in corners {
                group.positions.push(center + right * u + up * v);
                group.normals.push(normal);
                group.texcoords.push(uv);
            }
            group.indices.extend_from_slice(&[
                base,
                base + 1,
                base + 2,
                base,
                base + 2,
                base + 3,
            ]);
        }

        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_arity() {
        assert_eq!(PrimitiveTopology::PointList.arity(), 1);
        assert_eq!(PrimitiveTopology::LineLoop.arity(), 2);
        assert_eq!(PrimitiveTopology::TriangleFan.arity(), 3);
    }

    #[test]
    fn test_topology_primitive_count() {
        assert_eq!(PrimitiveTopology::TriangleList.primitive_count(9), 3);
        assert_eq!(PrimitiveTopology::TriangleStrip.primitive_count(5), 3);
        assert_eq!(PrimitiveTopology::TriangleFan.primitive_count(6), 4);
        assert_eq!(PrimitiveTopology::LineList.primitive_count(6), 3);
        assert_eq!(PrimitiveTopology::LineStrip.primitive_count(4), 3);
        assert_eq!(PrimitiveTopology::LineLoop.primitive_count(4), 4);
        assert_eq!(PrimitiveTopology::LineLoop.primitive_count(1), 0);
        assert_eq!(PrimitiveTopology::PointList.primitive_count(7), 7);
        assert_eq!(PrimitiveTopology::TriangleStrip.primitive_count(1), 0);
    }

    #[test]
    fn test_topology_accepts_index_count() {
        assert!(PrimitiveTopology::TriangleList.accepts_index_count(6));
        assert!(!PrimitiveTopology::TriangleList.accepts_index_count(7));
        assert!(!PrimitiveTopology::TriangleList.accepts_index_count(0));
        assert!(PrimitiveTopology::TriangleStrip.accepts_index_count(3));
        assert!(!PrimitiveTopology::TriangleStrip.accepts_index_count(2));
        assert!(PrimitiveTopology::LineLoop.accepts_index_count(2));
    }

    #[test]
    fn test_generators_are_valid() {
        for group in [
            PrimitiveGroup::cube(),
            PrimitiveGroup::plane(2.0, 2.0, 4),
            PrimitiveGroup::triangle(Vec3::ZERO, Vec3::X, Vec3::Y),
        ] {
            group.validate().unwrap();
        }
        assert_eq!(PrimitiveGroup::cube().primitive_count(), 12);
        assert_eq!(PrimitiveGroup::plane(1.0, 1.0, 2).primitive_count(), 8);
    }

    #[test]
    fn test_validate_empty_indices() {
        let group = PrimitiveGroup::new("empty", PrimitiveTopology::TriangleList);
        assert!(matches!(group.validate(), Err(RasterError::EmptyIndices(_))));
    }

    #[test]
    fn test_validate_attribute_mismatch() {
        let mut group = PrimitiveGroup::triangle(Vec3::ZERO, Vec3::X, Vec3::Y);
        group.normals.pop();
        assert!(matches!(
            group.validate(),
            Err(RasterError::AttributeLengthMismatch { attribute: "normal", .. })
        ));
    }

    #[test]
    fn test_validate_index_out_of_range() {
        let group = PrimitiveGroup::triangle(Vec3::ZERO, Vec3::X, Vec3::Y)
            .with_indices(vec![0, 1, 3]);
        assert!(matches!(
            group.validate(),
            Err(RasterError::IndexOutOfRange { slot: 2, index: 3, .. })
        ));
    }

    #[test]
    fn test_validate_partial_primitive() {
        let group = PrimitiveGroup::triangle(Vec3::ZERO, Vec3::X, Vec3::Y)
            .with_indices(vec![0, 1, 2, 0]);
        assert!(matches!(
            group.validate(),
            Err(RasterError::IndexCountMismatch { count: 4, .. })
        ));
    }

    #[test]
    fn test_validate_malformed_texture() {
        let mut texture = Texture::checkerboard(4, 1, [255, 0, 0], [0, 0, 255]);
        texture.data.truncate(3);
        let group = PrimitiveGroup::triangle(Vec3::ZERO, Vec3::X, Vec3::Y).with_texture(texture);
        assert!(matches!(group.validate(), Err(RasterError::InvalidTexture(_))));
    }
}
