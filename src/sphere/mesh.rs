//! Icosphere mesh: subdivided icosahedron with recomputable normals.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Vertex data for the sphere mesh (position + normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Subdivided icosahedron.
///
/// `base_dirs` holds the fixed unit direction of every vertex; `vertices`
/// holds the current displaced positions and normals. The vertex set is
/// mutated in place every tick and never resized.
pub struct IcosphereMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    base_dirs: Vec<Vec3>,
    face_normals: Vec<Vec3>,
}

impl IcosphereMesh {
    /// Build an icosphere with the given subdivision detail and radius.
    pub fn new(detail: u32, radius: f32) -> Self {
        let (mut dirs, mut faces) = icosahedron();

        for _ in 0..detail {
            faces = subdivide(&mut dirs, &faces);
        }

        let vertices = dirs
            .iter()
            .map(|d| Vertex {
                position: (*d * radius).to_array(),
                normal: d.to_array(),
            })
            .collect();

        let indices = faces
            .iter()
            .flat_map(|f| [f[0], f[1], f[2]])
            .collect::<Vec<u32>>();

        let face_count = faces.len();
        let mut mesh = Self {
            vertices,
            indices,
            base_dirs: dirs,
            face_normals: vec![Vec3::ZERO; face_count],
        };
        mesh.recompute_normals();
        mesh
    }

    /// Fixed unit direction of each vertex from the mesh center.
    pub fn base_dirs(&self) -> &[Vec3] {
        &self.base_dirs
    }

    /// Move one vertex to `distance` along its base direction.
    pub fn displace(&mut self, index: usize, distance: f32) {
        let dir = self.base_dirs[index];
        self.vertices[index].position = (dir * distance).to_array();
    }

    /// Recompute per-face and per-vertex normals from current positions.
    ///
    /// Must run after a full displacement pass; shading reads the vertex
    /// normals.
    pub fn recompute_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for (face, tri) in self.indices.chunks_exact(3).enumerate() {
            let a = Vec3::from_array(self.vertices[tri[0] as usize].position);
            let b = Vec3::from_array(self.vertices[tri[1] as usize].position);
            let c = Vec3::from_array(self.vertices[tri[2] as usize].position);

            let normal = (b - a).cross(c - a).normalize_or_zero();
            self.face_normals[face] = normal;

            for &i in tri {
                accumulated[i as usize] += normal;
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(accumulated) {
            vertex.normal = sum.normalize_or_zero().to_array();
        }
    }

    /// Per-face normals from the last `recompute_normals` pass.
    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }
}

/// Unit icosahedron: 12 vertices, 20 faces.
fn icosahedron() -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;

    let dirs = vec![
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|v| v.normalize())
    .collect();

    let faces = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    (dirs, faces)
}

/// Split every face into four, deduplicating edge midpoints.
fn subdivide(dirs: &mut Vec<Vec3>, faces: &[[u32; 3]]) -> Vec<[u32; 3]> {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut out = Vec::with_capacity(faces.len() * 4);

    let mut midpoint = |a: u32, b: u32, dirs: &mut Vec<Vec3>| -> u32 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            let mid = ((dirs[a as usize] + dirs[b as usize]) / 2.0).normalize();
            dirs.push(mid);
            (dirs.len() - 1) as u32
        })
    };

    for &[a, b, c] in faces {
        let ab = midpoint(a, b, dirs);
        let bc = midpoint(b, c, dirs);
        let ca = midpoint(c, a, dirs);

        out.push([a, ab, ca]);
        out.push([b, bc, ab]);
        out.push([c, ca, bc]);
        out.push([ab, bc, ca]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_zero_is_icosahedron() {
        let mesh = IcosphereMesh::new(0, 20.0);
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.indices.len(), 20 * 3);
    }

    #[test]
    fn test_detail_one_counts() {
        // 12 original vertices + 30 edge midpoints, 20 faces split into 80.
        let mesh = IcosphereMesh::new(1, 20.0);
        assert_eq!(mesh.vertices.len(), 42);
        assert_eq!(mesh.indices.len(), 80 * 3);
        assert_eq!(mesh.face_normals().len(), 80);
    }

    #[test]
    fn test_base_dirs_are_unit_length() {
        let mesh = IcosphereMesh::new(1, 20.0);
        for dir in mesh.base_dirs() {
            assert!((dir.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_initial_positions_at_radius() {
        let mesh = IcosphereMesh::new(1, 20.0);
        for vertex in &mesh.vertices {
            let len = Vec3::from_array(vertex.position).length();
            assert!((len - 20.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_normals_unit_and_outward_on_sphere() {
        let mesh = IcosphereMesh::new(1, 20.0);
        for vertex in &mesh.vertices {
            let normal = Vec3::from_array(vertex.normal);
            assert!((normal.length() - 1.0).abs() < 1e-4);
            // On an undeformed sphere the normal points along the direction.
            let dir = Vec3::from_array(vertex.position).normalize();
            assert!(normal.dot(dir) > 0.9);
        }
    }

    #[test]
    fn test_displace_moves_along_base_dir() {
        let mut mesh = IcosphereMesh::new(0, 20.0);
        let dir = mesh.base_dirs()[3];
        mesh.displace(3, 32.0);
        let pos = Vec3::from_array(mesh.vertices[3].position);
        assert!((pos - dir * 32.0).length() < 1e-4);
    }
}
