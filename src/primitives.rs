//! Generated primitive shapes with flat-colored materials

use crate::model::{Material, Mesh, ModelComponent, ModelEntity, PrimitiveType};
use crate::Vertex;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

const SPHERE_SEGMENTS: u32 = 32;
const SPHERE_RINGS: u32 = 16;

/// Radius used by callers that do not pick one
pub const DEFAULT_SPHERE_RADIUS: f32 = 0.05;

/// Color and finish of a generated shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveStyle {
    pub color: [f32; 4],
    pub is_metallic: bool,
}

impl Default for PrimitiveStyle {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 1.0, 1.0],
            is_metallic: true,
        }
    }
}

/// Geometry options for boxes and planes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeOptions {
    /// Accepted for compatibility; edges are always generated sharp
    pub corner_radius: f32,
    /// Emit one mesh per box face so each can take its own material
    pub split_faces: bool,
}

impl ShapeOptions {
    fn warn_unsupported(&self, shape: &str) {
        if self.corner_radius > 0.0 {
            log::debug!(
                "Ignoring corner radius {} for generated {shape}",
                self.corner_radius
            );
        }
    }
}

fn entity(name: &str, meshes: Vec<Mesh>, style: PrimitiveStyle) -> ModelEntity {
    ModelEntity::new(
        Some(name.to_string()),
        ModelComponent {
            meshes,
            materials: vec![Material::simple(style.color, style.is_metallic)],
        },
    )
}

fn triangles(name: String, vertices: Vec<Vertex>, indices: Vec<u32>) -> Mesh {
    Mesh {
        name: Some(name),
        primitive_type: PrimitiveType::Triangles,
        vertices,
        indices,
        material_index: Some(0),
    }
}

/// UV sphere centred on the origin
pub fn make_sphere(radius: f32, style: PrimitiveStyle) -> ModelEntity {
    let mut vertices = Vec::with_capacity(((SPHERE_RINGS + 1) * (SPHERE_SEGMENTS + 1)) as usize);
    for ring in 0..=SPHERE_RINGS {
        let v = ring as f32 / SPHERE_RINGS as f32;
        let theta = v * PI;
        for segment in 0..=SPHERE_SEGMENTS {
            let u = segment as f32 / SPHERE_SEGMENTS as f32;
            let phi = u * TAU;
            let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            vertices.push(Vertex::new((normal * radius).into(), normal.into(), [u, v]));
        }
    }

    let stride = SPHERE_SEGMENTS + 1;
    let mut indices = Vec::with_capacity((SPHERE_RINGS * SPHERE_SEGMENTS * 6) as usize);
    for ring in 0..SPHERE_RINGS {
        for segment in 0..SPHERE_SEGMENTS {
            let a = ring * stride + segment;
            let b = a + stride;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    entity("sphere", vec![triangles("sphere".into(), vertices, indices)], style)
}

/// Axis-aligned box centred on the origin, one quad per face
pub fn make_box(size: Vec3, style: PrimitiveStyle) -> ModelEntity {
    make_box_with(size, style, ShapeOptions::default())
}

/// [`make_box`] with explicit geometry options
pub fn make_box_with(size: Vec3, style: PrimitiveStyle, options: ShapeOptions) -> ModelEntity {
    options.warn_unsupported("box");
    let half = size * 0.5;
    let faces = [
        ("+x", Vec3::X, Vec3::Z),
        ("-x", Vec3::NEG_X, Vec3::NEG_Z),
        ("+y", Vec3::Y, Vec3::X),
        ("-y", Vec3::NEG_Y, Vec3::X),
        ("+z", Vec3::Z, Vec3::NEG_X),
        ("-z", Vec3::NEG_Z, Vec3::X),
    ];

    let mut meshes = Vec::new();
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (label, normal, tangent) in faces {
        let bitangent = normal.cross(tangent);
        let base = vertices.len() as u32;
        for (s, t) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = (normal + tangent * s + bitangent * t) * half;
            vertices.push(
                Vertex::new(corner.into(), normal.into(), [(s + 1.0) * 0.5, (t + 1.0) * 0.5])
                    .with_tangent(tangent.extend(1.0).into()),
            );
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);

        if options.split_faces {
            let face = triangles(
                format!("box{label}"),
                std::mem::take(&mut vertices),
                std::mem::take(&mut indices),
            );
            meshes.push(face);
        }
    }

    if !options.split_faces {
        meshes.push(triangles("box".into(), vertices, indices));
    }
    entity("box", meshes, style)
}

/// Plane in the XY plane facing +Z
pub fn make_plane(width: f32, height: f32, style: PrimitiveStyle) -> ModelEntity {
    make_plane_with(width, height, style, ShapeOptions::default())
}

/// [`make_plane`] with explicit geometry options; a plane has one face to split
pub fn make_plane_with(
    width: f32,
    height: f32,
    style: PrimitiveStyle,
    options: ShapeOptions,
) -> ModelEntity {
    options.warn_unsupported("plane");
    let (w, h) = (width * 0.5, height * 0.5);
    let normal = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex::new([-w, -h, 0.0], normal, [0.0, 1.0]),
        Vertex::new([w, -h, 0.0], normal, [1.0, 1.0]),
        Vertex::new([w, h, 0.0], normal, [1.0, 0.0]),
        Vertex::new([-w, h, 0.0], normal, [0.0, 0.0]),
    ];

    let mesh = triangles("plane".into(), vertices, vec![0, 1, 2, 0, 2, 3]);
    entity("plane", vec![mesh], style)
}
