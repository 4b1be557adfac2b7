//! Object-to-world transforms from manifest entries

use glam::{Mat4, Quat, Vec3};
use serde::Deserialize;

/// Translation, rotation and scale of an object in world space.
///
/// Rotation is XYZ Euler angles in degrees, applied X first, then Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectTransform {
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: default_scale(),
        }
    }
}

impl ObjectTransform {
    pub fn to_mat4(&self) -> Mat4 {
        let [rx, ry, rz] = self.rotation.map(f32::to_radians);
        let rotation =
            Quat::from_rotation_z(rz) * Quat::from_rotation_y(ry) * Quat::from_rotation_x(rx);
        Mat4::from_scale_rotation_translation(
            Vec3::from_array(self.scale),
            rotation,
            Vec3::from_array(self.translation),
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}
