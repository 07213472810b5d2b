use super::vertex::{v, Vertex};

/// The fixed cube mesh: 24 vertices (4 per face, own normal, own unit UV
/// square) and 36 u16 indices.
///
/// Corners sit at ±1. Each face lists its corners as left-bottom, left-top,
/// right-bottom, right-top when viewed from outside; triangles wind clockwise.
pub fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = |x, y, z| [x, y, z];

    // Corner order per face: LB, LT, RB, RT.
    const FACE_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]];

    #[rustfmt::skip]
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        // Front (-Z)
        ([0.0, 0.0, -1.0], [p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0)]),
        // Back (+Z)
        ([0.0, 0.0, 1.0], [p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0)]),
        // Left (-X)
        ([-1.0, 0.0, 0.0], [p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0), p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0)]),
        // Right (+X)
        ([1.0, 0.0, 0.0], [p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0)]),
        // Bottom (-Y)
        ([0.0, -1.0, 0.0], [p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0)]),
        // Top (+Y)
        ([0.0, 1.0, 0.0], [p(-1.0, 1.0, -1.0), p(-1.0, 1.0, 1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0)]),
    ];

    let verts = faces
        .iter()
        .flat_map(|(normal, corners)| {
            corners
                .iter()
                .zip(FACE_UVS)
                .map(move |(pos, uv)| v(*pos, *normal, uv))
        })
        .collect::<Vec<_>>();

    let idx = (0..6u16)
        .flat_map(|f| {
            let o = f * 4;
            [o, o + 1, o + 3, o + 3, o + 2, o]
        })
        .collect::<Vec<_>>();

    (verts, idx)
}
