//! Node transforms baked into primitive groups at load time

use glam::{Mat3, Mat4, Quat, Vec3};

/// Position, rotation and scale of a scene node
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            scale,
            ..Default::default()
        }
    }

    /// Get the model matrix for this transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Compose with a parent transform into an accumulated node transform
    pub fn node(&self, parent: &NodeTransform) -> NodeTransform {
        NodeTransform::from_matrix(parent.matrix * self.matrix())
    }
}

/// Accumulated hierarchy transform for one primitive group, plus the
/// matching normal transform (inverse transpose of the upper 3x3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub matrix: Mat4,
    pub normal_matrix: Mat3,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl NodeTransform {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
        normal_matrix: Mat3::IDENTITY,
    };

    pub fn from_matrix(matrix: Mat4) -> Self {
        Self {
            matrix,
            normal_matrix: normal_matrix(matrix),
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl From<Transform> for NodeTransform {
    fn from(transform: Transform) -> Self {
        Self::from_matrix(transform.matrix())
    }
}

/// Inverse transpose of the upper 3x3 of `matrix`.
pub fn normal_matrix(matrix: Mat4) -> Mat3 {
    Mat3::from_mat4(matrix).inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normal_matrix_non_uniform_scale() {
        let transform =
            Transform::from_position_scale(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 1.0, 1.0));
        let node = NodeTransform::from(transform);
        // A normal on a surface sheared by non-uniform scale stays perpendicular
        let tangent = node.matrix.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        let normal = node.normal_matrix * Vec3::new(1.0, 1.0, 0.0);
        assert_relative_eq!(tangent.dot(normal), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_node_composition() {
        let parent = NodeTransform::from(Transform::from_position(Vec3::X));
        let child = Transform::from_position(Vec3::Y).node(&parent);
        let origin = child.matrix.transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.x, 1.0);
        assert_relative_eq!(origin.y, 1.0);
        assert!(NodeTransform::default().is_identity());
    }
}
