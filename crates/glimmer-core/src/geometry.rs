//! CPU-side triangle geometry shared by scene objects.

use std::collections::HashSet;

use glam::Vec3;

slotmap::new_key_type! {
    /// Stable handle to a geometry in the scene's geometry library.
    pub struct GeometryId;
}

/// An indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Vertex positions in object space.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals (unit length).
    pub normals: Vec<Vec3>,
    /// Triangle vertex indices.
    pub triangles: Vec<[u32; 3]>,
}

impl Geometry {
    /// Creates a geometry from raw parts. Normals are computed from the
    /// triangles when `normals` is empty.
    #[must_use]
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>, normals: Vec<Vec3>) -> Self {
        let normals = if normals.is_empty() {
            compute_vertex_normals(&positions, &triangles)
        } else {
            normals
        };
        Self {
            positions,
            normals,
            triangles,
        }
    }

    /// Geodesic sphere built by subdividing each icosahedron edge into
    /// `detail + 1` segments.
    #[must_use]
    pub fn icosphere(radius: f32, detail: u32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let base = [
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
        ];
        let faces: [[usize; 3]; 20] = [
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

        let cols = detail as usize + 1;
        let mut positions = Vec::with_capacity(faces.len() * cols * cols * 3);

        for face in faces {
            let (a, b, c) = (base[face[0]], base[face[1]], base[face[2]]);

            // Row i holds cols - i + 1 vertices between edges a-c and b-c.
            let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);
            for i in 0..=cols {
                let f = i as f32 / cols as f32;
                let aj = a.lerp(c, f);
                let bj = b.lerp(c, f);
                let rows = cols - i;
                let row = (0..=rows)
                    .map(|j| {
                        if j == 0 && i == cols {
                            aj
                        } else {
                            aj.lerp(bj, j as f32 / rows as f32)
                        }
                    })
                    .collect();
                grid.push(row);
            }

            for i in 0..cols {
                for j in 0..(2 * (cols - i) - 1) {
                    let k = j / 2;
                    if j % 2 == 0 {
                        positions.push(grid[i][k + 1]);
                        positions.push(grid[i + 1][k]);
                        positions.push(grid[i][k]);
                    } else {
                        positions.push(grid[i][k + 1]);
                        positions.push(grid[i + 1][k + 1]);
                        positions.push(grid[i + 1][k]);
                    }
                }
            }
        }

        let normals: Vec<Vec3> = positions.iter().map(|p| p.normalize()).collect();
        let positions = normals.iter().map(|n| *n * radius).collect::<Vec<_>>();
        let triangles = (0..positions.len() as u32 / 3)
            .map(|t| [t * 3, t * 3 + 1, t * 3 + 2])
            .collect();

        Self {
            positions,
            normals,
            triangles,
        }
    }

    /// A rectangle in the XY plane facing +Z, centered at the origin.
    #[must_use]
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                Vec3::new(-hw, -hh, 0.0),
                Vec3::new(hw, -hh, 0.0),
                Vec3::new(hw, hh, 0.0),
                Vec3::new(-hw, hh, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    /// An axis-aligned cube with the given edge length, centered at the origin.
    #[must_use]
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let sides = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::NEG_Z, Vec3::X),
            (Vec3::Z, Vec3::Y, Vec3::NEG_X),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut triangles = Vec::with_capacity(12);

        for (normal, up, right) in sides {
            let base = positions.len() as u32;
            let center = normal * h;
            for (su, sr) in [(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)] {
                positions.push(center + up * (su * h) + right * (sr * h));
                normals.push(normal);
            }
            triangles.push([base, base + 1, base + 2]);
            triangles.push([base, base + 2, base + 3]);
        }

        Self {
            positions,
            normals,
            triangles,
        }
    }

    /// Unique undirected edges, in first-seen order.
    #[must_use]
    pub fn edges(&self) -> Vec<[u32; 2]> {
        let mut seen = HashSet::with_capacity(self.triangles.len() * 3);
        let mut edges = Vec::with_capacity(self.triangles.len() * 3);
        for tri in &self.triangles {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    edges.push([a, b]);
                }
            }
        }
        edges
    }

    /// Axis-aligned bounds, or `None` for an empty geometry.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }

    /// Number of triangles.
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }
}

fn compute_vertex_normals(positions: &[Vec3], triangles: &[[u32; 3]]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in triangles {
        let [a, b, c] = tri.map(|i| i as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}
