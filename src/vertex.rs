//! Vertex layout shared by loaded and generated meshes

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};

/// A vertex with position, normal, UV, tangent, and color data
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 3D position
    pub position: [f32; 3],
    /// Normal vector
    pub normal: [f32; 3],
    /// Texture coordinates
    pub uv: [f32; 2],
    /// Tangent vector (xyz + w handedness)
    pub tangent: [f32; 4],
    /// Vertex color (RGBA)
    pub color: [f32; 4],
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2])
    }
}

impl Vertex {
    /// Create a new vertex with default tangent and white color
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: [1.0, 0.0, 0.0, 1.0],
            color: [1.0; 4],
        }
    }

    /// Set the tangent vector
    pub fn with_tangent(mut self, tangent: [f32; 4]) -> Self {
        self.tangent = tangent;
        self
    }

    /// Set the vertex color
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Size of a vertex in bytes
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// This vertex moved into the space described by `matrix`
    ///
    /// Normals use the inverse-transpose so non-uniform scale stays correct.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let normal_matrix = Mat3::from_mat4(*matrix).inverse().transpose();
        let normal = (normal_matrix * Vec3::from(self.normal)).normalize_or_zero();
        let tangent = Vec4::from(self.tangent);
        let tangent_xyz = Mat3::from_mat4(*matrix) * tangent.truncate();

        Self {
            position: matrix.transform_point3(Vec3::from(self.position)).into(),
            normal: normal.into(),
            uv: self.uv,
            tangent: tangent_xyz.normalize_or_zero().extend(tangent.w).into(),
            color: self.color,
        }
    }
}

/// View a vertex slice as raw bytes for upload
pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_vertex_default() {
        let v = Vertex::default();
        assert_eq!(v.position, [0.0, 0.0, 0.0]);
        assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        assert_eq!(v.tangent, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_vertex_size() {
        assert_eq!(Vertex::size(), 64);
        assert_eq!(as_bytes(&[Vertex::default(); 3]).len(), 192);
    }

    #[test]
    fn test_transformed_translates_position_only() {
        let v = Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.25, 0.75]);
        let moved = v.transformed(&Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));

        assert_eq!(moved.position, [1.0, 2.0, 0.0]);
        assert_eq!(moved.normal, [0.0, 1.0, 0.0]);
        assert_eq!(moved.uv, [0.25, 0.75]);
    }

    #[test]
    fn test_transformed_rotates_normal() {
        let v = Vertex::new([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2]);
        let rotation = Mat4::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let turned = v.transformed(&rotation);

        assert!((Vec3::from(turned.normal) - Vec3::X).length() < 1e-5);
    }
}
