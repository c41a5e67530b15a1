//! Lighting parameters for fragment shading

use glam::Vec3;

/// Directional light, fixed in eye space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Unit vector from the surface toward the light, in eye space
    pub direction: Vec3,
    pub color: Vec3,
    /// Ambient contribution for Blinn-Phong shading
    pub ambient: f32,
    /// Specular contribution for Blinn-Phong shading
    pub specular: f32,
    /// Blinn-Phong exponent
    pub shininess: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(1.0, 1.0, 1.0).normalize(),
            color: Vec3::ONE,
            ambient: 0.1,
            specular: 0.5,
            shininess: 64.0,
        }
    }
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            ..Default::default()
        }
    }

    pub fn with_blinn_phong(mut self, ambient: f32, specular: f32, shininess: f32) -> Self {
        self.ambient = ambient;
        self.specular = specular;
        self.shininess = shininess;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_direction() {
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, 4.0), Vec3::ONE);
        assert_eq!(light.direction, Vec3::Z);
        assert_eq!(light.shininess, DirectionalLight::default().shininess);
    }

    #[test]
    fn test_with_blinn_phong() {
        let light = DirectionalLight::default().with_blinn_phong(0.2, 0.8, 16.0);
        assert_eq!((light.ambient, light.specular, light.shininess), (0.2, 0.8, 16.0));
        assert_eq!(light.direction, DirectionalLight::default().direction);
    }
}
