//! Primitive assembly
//!
//! Gathers transformed vertices through each group's index array into the
//! global primitive array. Every group owns the disjoint range starting at
//! its `primitive_offset`, so groups assemble concurrently without aliasing.
//! Each topology has its own gather rule.

use super::vertex::VertexOut;
use crate::resources::PrimitiveTopology;
use crate::scene::{StoredGroup, TextureRef};
use rayon::prelude::*;

/// One assembled primitive in the global array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Triangle([VertexOut; 3]),
    Line([VertexOut; 2]),
    Point(VertexOut),
}

impl Default for Primitive {
    fn default() -> Self {
        Primitive::Point(VertexOut::default())
    }
}

impl Primitive {
    pub fn vertices(&self) -> &[VertexOut] {
        match self {
            Primitive::Triangle(v) => &v[..],
            Primitive::Line(v) => &v[..],
            Primitive::Point(v) => std::slice::from_ref(v),
        }
    }

    /// All vertices of one primitive share a texture; vertex 0 carries it.
    pub fn texture(&self) -> Option<TextureRef> {
        self.vertices()[0].texture
    }
}

/// Index triple of triangle `i` for a triangle topology.
fn triangle_indices(topology: PrimitiveTopology, indices: &[u32], i: usize) -> [u32; 3] {
    match topology {
        PrimitiveTopology::TriangleStrip => {
            // Keep a consistent winding across the strip
            if i % 2 == 0 {
                [indices[i], indices[i + 1], indices[i + 2]]
            } else {
                [indices[i + 1], indices[i], indices[i + 2]]
            }
        }
        PrimitiveTopology::TriangleFan => [indices[0], indices[i + 1], indices[i + 2]],
        _ => [indices[3 * i], indices[3 * i + 1], indices[3 * i + 2]],
    }
}

/// Index pair of line `i` for a line topology.
fn line_indices(topology: PrimitiveTopology, indices: &[u32], i: usize) -> [u32; 2] {
    match topology {
        PrimitiveTopology::LineStrip => [indices[i], indices[i + 1]],
        PrimitiveTopology::LineLoop => [indices[i], indices[(i + 1) % indices.len()]],
        _ => [indices[2 * i], indices[2 * i + 1]],
    }
}

/// Assemble one group into its slice of the global primitive array.
///
/// `out` must hold exactly `group.primitive_count()` entries.
pub fn assemble_group(group: &StoredGroup, vertices: &[VertexOut], out: &mut [Primitive]) {
    debug_assert_eq!(out.len(), group.primitive_count());
    let topology = group.mesh.topology;
    let indices = group.mesh.indices.as_slice();
    let fetch = |index: u32| vertices[index as usize];

    match topology {
        PrimitiveTopology::TriangleList
        | PrimitiveTopology::TriangleStrip
        | PrimitiveTopology::TriangleFan => {
            out.par_iter_mut().enumerate().for_each(|(i, primitive)| {
                let [a, b, c] = triangle_indices(topology, indices, i);
                *primitive = Primitive::Triangle([fetch(a), fetch(b), fetch(c)]);
            });
        }
        PrimitiveTopology::LineList
        | PrimitiveTopology::LineStrip
        | PrimitiveTopology::LineLoop => {
            out.par_iter_mut().enumerate().for_each(|(i, primitive)| {
                let [a, b] = line_indices(topology, indices, i);
                *primitive = Primitive::Line([fetch(a), fetch(b)]);
            });
        }
        PrimitiveTopology::PointList => {
            out.par_iter_mut().enumerate().for_each(|(i, primitive)| {
                *primitive = Primitive::Point(fetch(indices[i]));
            });
        }
    }
}

/// Assemble every group into the global primitive array.
///
/// `vertex_outs[k]` holds the vertex stage output of `groups[k]`. Returns
/// only once every group has been assembled.
pub fn assemble_all(
    groups: &[StoredGroup],
    vertex_outs: &[Vec<VertexOut>],
    primitives: &mut [Primitive],
) {
    let mut rest = primitives;
    let mut jobs = Vec::with_capacity(groups.len());
    for (group, vertices) in groups.iter().zip(vertex_outs) {
        let (slice, tail) = std::mem::take(&mut rest).split_at_mut(group.primitive_count());
        rest = tail;
        jobs.push((group, vertices.as_slice(), slice));
    }

    jobs.into_par_iter().for_each(|(group, vertices, slice)| {
        log::trace!(
            "Assembling group '{}' into primitives {:?}",
            group.mesh.label,
            group.primitive_range()
        );
        assemble_group(group, vertices, slice);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::PrimitiveGroup;
    use glam::{Vec2, Vec3};

    fn tagged_vertices(count: usize) -> Vec<VertexOut> {
        (0..count)
            .map(|i| VertexOut {
                screen_pos: Vec3::new(i as f32, 0.0, 0.0),
                ..Default::default()
            })
            .collect()
    }

    fn ids(primitive: &Primitive) -> Vec<u32> {
        primitive
            .vertices()
            .iter()
            .map(|v| v.screen_pos.x as u32)
            .collect()
    }

    fn stored(topology: PrimitiveTopology, indices: Vec<u32>, vertex_count: usize) -> StoredGroup {
        let mesh = PrimitiveGroup::new("test", topology)
            .with_indices(indices)
            .with_positions(vec![Vec3::ZERO; vertex_count])
            .with_normals(vec![Vec3::Z; vertex_count])
            .with_texcoords(vec![Vec2::ZERO; vertex_count]);
        mesh.validate().unwrap();
        StoredGroup {
            mesh,
            texture: None,
            primitive_offset: 0,
        }
    }

    fn assemble(group: &StoredGroup) -> Vec<Vec<u32>> {
        let vertices = tagged_vertices(group.mesh.vertex_count());
        let mut out = vec![Primitive::default(); group.primitive_count()];
        assemble_group(group, &vertices, &mut out);
        out.iter().map(ids).collect()
    }

    #[test]
    fn test_triangle_list_gather() {
        let group = stored(PrimitiveTopology::TriangleList, vec![2, 1, 0, 0, 3, 2], 4);
        assert_eq!(assemble(&group), vec![vec![2, 1, 0], vec![0, 3, 2]]);
    }

    #[test]
    fn test_triangle_strip_alternates_winding() {
        let group = stored(PrimitiveTopology::TriangleStrip, vec![0, 1, 2, 3], 4);
        assert_eq!(assemble(&group), vec![vec![0, 1, 2], vec![2, 1, 3]]);
    }

    #[test]
    fn test_triangle_fan_pivots_on_first() {
        let group = stored(PrimitiveTopology::TriangleFan, vec![0, 1, 2, 3, 4], 5);
        assert_eq!(
            assemble(&group),
            vec![vec![0, 1, 2], vec![0, 2, 3], vec![0, 3, 4]]
        );
    }

    #[test]
    fn test_line_topologies() {
        let list = stored(PrimitiveTopology::LineList, vec![0, 1, 2, 3], 4);
        assert_eq!(assemble(&list), vec![vec![0, 1], vec![2, 3]]);

        let strip = stored(PrimitiveTopology::LineStrip, vec![0, 1, 2], 3);
        assert_eq!(assemble(&strip), vec![vec![0, 1], vec![1, 2]]);

        let looped = stored(PrimitiveTopology::LineLoop, vec![0, 1, 2], 3);
        assert_eq!(assemble(&looped), vec![vec![0, 1], vec![1, 2], vec![2, 0]]);
    }

    #[test]
    fn test_point_list() {
        let group = stored(PrimitiveTopology::PointList, vec![2, 0], 3);
        assert_eq!(assemble(&group), vec![vec![2], vec![0]]);
    }

    #[test]
    fn test_assemble_all_respects_offsets() {
        let mut first = stored(PrimitiveTopology::TriangleList, vec![0, 1, 2], 3);
        first.primitive_offset = 0;
        let mut second = stored(PrimitiveTopology::LineList, vec![0, 1, 1, 0], 2);
        second.primitive_offset = 1;
        let groups = vec![first, second];
        let vertex_outs = vec![tagged_vertices(3), tagged_vertices(2)];

        let mut primitives = vec![Primitive::default(); 3];
        assemble_all(&groups, &vertex_outs, &mut primitives);

        assert!(matches!(primitives[0], Primitive::Triangle(_)));
        assert_eq!(ids(&primitives[1]), vec![0, 1]);
        assert_eq!(ids(&primitives[2]), vec![1, 0]);
    }
}
