use glam::*;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// local position. the marker's model matrix takes this to camera relative world space
    pub position: Vec3,
    pub texture_coordinates: Vec2,
    pub color: [u8; 4],
}

/// unit square with its south-west corner at the local origin.
/// point markers scale this to the size of a tile at the zoom the mesh was built for.
pub const UNIT_QUAD: [Vec3; 4] = [
    // bottom left
    vec3(0.0, 0.0, 0.0),
    // top left
    vec3(0.0, 1.0, 0.0),
    // top right
    vec3(1.0, 1.0, 0.0),
    // bottom right
    vec3(1.0, 0.0, 0.0),
];

/// Tessellated geometry, ready to be uploaded to the gpu.
/// Which style and zoom it was built for is tracked by the owner of the mesh.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StyledMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl StyledMesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }
    /// two triangles covering [UNIT_QUAD]
    pub fn unit_quad(color: [u8; 4]) -> Self {
        let texture_coordinates = [vec2(0.0, 1.0), vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(1.0, 1.0)];
        let vertices = UNIT_QUAD
            .into_iter()
            .zip(texture_coordinates)
            .map(|(position, texture_coordinates)| MeshVertex {
                position,
                texture_coordinates,
                color,
            })
            .collect();
        Self {
            vertices,
            indices: vec![1, 0, 3, 3, 2, 1],
        }
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
