//! Mesh fixtures shared by unit tests.

use std::path::Path;

use stl_io::{Normal, Triangle, Vertex};

type Corner = [f64; 3];

/// Triangles of an axis-aligned box, outward-facing.
///
/// Every face is split along the diagonal through its minimum corner, so two
/// boxes touching on a face triangulate it identically.
pub fn box_triangles(min: Corner, max: Corner) -> Vec<[Corner; 3]> {
    let c = |ix: usize, iy: usize, iz: usize| {
        [
            if ix == 0 { min[0] } else { max[0] },
            if iy == 0 { min[1] } else { max[1] },
            if iz == 0 { min[2] } else { max[2] },
        ]
    };
    let quads = [
        [c(0, 0, 0), c(0, 0, 1), c(0, 1, 1), c(0, 1, 0)],
        [c(1, 0, 0), c(1, 1, 0), c(1, 1, 1), c(1, 0, 1)],
        [c(0, 0, 0), c(1, 0, 0), c(1, 0, 1), c(0, 0, 1)],
        [c(0, 1, 0), c(0, 1, 1), c(1, 1, 1), c(1, 1, 0)],
        [c(0, 0, 0), c(0, 1, 0), c(1, 1, 0), c(1, 0, 0)],
        [c(0, 0, 1), c(1, 0, 1), c(1, 1, 1), c(0, 1, 1)],
    ];
    quads
        .iter()
        .flat_map(|[q0, q1, q2, q3]| [[*q0, *q1, *q2], [*q0, *q2, *q3]])
        .collect()
}

/// Unit cube with its minimum corner at `origin`.
pub fn unit_box(origin: Corner) -> Vec<[Corner; 3]> {
    let [x, y, z] = origin;
    box_triangles(origin, [x + 1.0, y + 1.0, z + 1.0])
}

/// Writes triangles as a binary STL file.
///
/// # Panics
///
/// Panics if the file cannot be written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_stl(path: &Path, triangles: &[[Corner; 3]]) {
    let to_vertex = |p: &Corner| Vertex::new([p[0] as f32, p[1] as f32, p[2] as f32]);
    let mesh: Vec<Triangle> = triangles
        .iter()
        .map(|[a, b, c]| Triangle {
            normal: Normal::new([0.0, 0.0, 0.0]),
            vertices: [to_vertex(a), to_vertex(b), to_vertex(c)],
        })
        .collect();
    let mut file = std::fs::File::create(path).unwrap_or_else(|e| panic!("{e}"));
    stl_io::write_stl(&mut file, mesh.iter()).unwrap_or_else(|e| panic!("{e}"));
}

/// Creates a database whose `vols/` directory holds one STL file per band.
///
/// # Panics
///
/// Panics if the directory or a file cannot be written.
pub fn database(bands: &[Vec<[Corner; 3]>]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
    let vols = dir.path().join("vols");
    std::fs::create_dir(&vols).unwrap_or_else(|e| panic!("{e}"));
    for (i, tris) in bands.iter().enumerate() {
        write_stl(&vols.join(format!("vol-{i}.stl")), tris);
    }
    dir
}
