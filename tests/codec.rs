use mg2::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::io::Cursor;

fn compress_to_vec(mesh: &Mesh, vertex_precision: f32) -> Vec<u8> {
    let mut buffer = Vec::new();
    compress_mg2(mesh, vertex_precision, &mut buffer).unwrap();
    buffer
}

fn roundtrip(mesh: &Mesh, vertex_precision: f32) -> Mesh {
    let buffer = compress_to_vec(mesh, vertex_precision);
    decompress_mg2(&mut Cursor::new(buffer), &mesh.layout()).unwrap()
}

/// For each decoded vertex, the index of the input vertex it reconstructs
/// (componentwise within `tolerance`). Panics if any vertex has no match.
fn match_vertices(input: &Mesh, decoded: &Mesh, tolerance: f32) -> Vec<usize> {
    decoded
        .vertices
        .iter()
        .map(|decoded_vertex| {
            input
                .vertices
                .iter()
                .position(|input_vertex| {
                    (0..3).all(|axis| (decoded_vertex[axis] - input_vertex[axis]).abs() <= tolerance)
                })
                .expect("decoded vertex does not match any input vertex")
        })
        .collect()
}

/// Rotate a triangle so its smallest entry comes first, keeping the cyclic
/// order, so triangles compare equal under rotation.
fn rotated(triangle: [usize; 3]) -> [usize; 3] {
    let [a, b, c] = triangle;
    if b < a && b < c {
        [b, c, a]
    } else if c < a && c < b {
        [c, a, b]
    } else {
        [a, b, c]
    }
}

fn triangle_set(indices: &[u32], vertex_map: impl Fn(usize) -> usize) -> HashSet<[usize; 3]> {
    indices
        .chunks_exact(3)
        .map(|triangle| {
            rotated([
                vertex_map(triangle[0] as usize),
                vertex_map(triangle[1] as usize),
                vertex_map(triangle[2] as usize),
            ])
        })
        .collect()
}

fn assert_same_topology(input: &Mesh, decoded: &Mesh, tolerance: f32) -> Vec<usize> {
    let map = match_vertices(input, decoded, tolerance);
    let input_triangles = triangle_set(&input.indices, |index| index);
    let decoded_triangles = triangle_set(&decoded.indices, |index| map[index]);
    assert_eq!(input_triangles, decoded_triangles);
    map
}

fn single_triangle() -> Mesh {
    Mesh {
        vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        indices: vec![0, 1, 2],
        ..Default::default()
    }
}

fn octahedron() -> Mesh {
    Mesh {
        vertices: vec![
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ],
        indices: vec![
            0, 2, 4, 2, 1, 4, 1, 3, 4, 3, 0, 4, 2, 0, 5, 1, 2, 5, 3, 1, 5, 0, 3, 5,
        ],
        ..Default::default()
    }
}

#[test]
fn roundtrip_single_triangle() {
    let mesh = single_triangle();
    let decoded = roundtrip(&mesh, 0.001);

    assert_eq!(decoded.vertex_count(), 3);
    assert_eq!(decoded.triangle_count(), 1);
    assert_same_topology(&mesh, &decoded, 0.002);
}

#[test]
fn roundtrip_flat_mesh() {
    // All four vertices are coplanar in z = 0, so the grid's z axis is
    // degenerate and every vertex lands in the z = 0 cell layer.
    let mesh = Mesh {
        vertices: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
        ..Default::default()
    };
    let decoded = roundtrip(&mesh, 0.01);

    assert_eq!(decoded.vertex_count(), 4);
    assert_eq!(decoded.triangle_count(), 2);
    assert_same_topology(&mesh, &decoded, 0.02);
    for vertex in &decoded.vertices {
        assert_eq!(vertex[2], 0.0);
    }
}

#[test]
fn roundtrip_shared_vertices() {
    let mesh = octahedron();
    let decoded = roundtrip(&mesh, 0.001);

    assert_eq!(decoded.vertex_count(), mesh.vertex_count());
    assert_eq!(decoded.triangle_count(), mesh.triangle_count());
    assert_same_topology(&mesh, &decoded, 0.002);
}

#[test]
fn attributes_stay_aligned_with_their_vertices() {
    let mut mesh = octahedron();
    let vertex_count = mesh.vertex_count();
    mesh.tex_coords = Some(
        (0..vertex_count)
            .map(|i| [i as f32 * 0.125, 1.0 - i as f32 * 0.125])
            .collect(),
    );
    mesh.normals = Some(mesh.vertices.clone());

    let decoded = roundtrip(&mesh, 0.001);
    let map = assert_same_topology(&mesh, &decoded, 0.002);

    // Attributes pass through the packer losslessly, so after matching each
    // decoded vertex back to its input vertex they must compare exactly.
    let tex_coords = decoded.tex_coords.as_ref().unwrap();
    let normals = decoded.normals.as_ref().unwrap();
    let input_tex_coords = mesh.tex_coords.as_ref().unwrap();
    let input_normals = mesh.normals.as_ref().unwrap();
    for (decoded_index, &input_index) in map.iter().enumerate() {
        assert_eq!(tex_coords[decoded_index], input_tex_coords[input_index]);
        assert_eq!(normals[decoded_index], input_normals[input_index]);
    }
}

#[test]
fn precision_bound_on_random_cloud() {
    let mut rng = StdRng::seed_from_u64(0x4d47_3221);
    let vertex_count = 1000;
    let vertex_precision = 1e-4f32;

    let vertices: Vec<[f32; 3]> = (0..vertex_count)
        .map(|_| {
            [
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(-1.0f32..1.0),
            ]
        })
        .collect();
    let indices: Vec<u32> = (0..vertex_count as u32 - 2)
        .flat_map(|i| [i, i + 1, i + 2])
        .collect();
    let mesh = Mesh {
        vertices,
        indices,
        ..Default::default()
    };

    let decoded = roundtrip(&mesh, vertex_precision);
    assert_eq!(decoded.vertex_count(), vertex_count);

    let mut worst = 0.0f32;
    for decoded_vertex in &decoded.vertices {
        let error = mesh
            .vertices
            .iter()
            .map(|input_vertex| {
                (0..3)
                    .map(|axis| (decoded_vertex[axis] - input_vertex[axis]).abs())
                    .fold(0.0f32, f32::max)
            })
            .fold(f32::INFINITY, f32::min);
        worst = worst.max(error);
    }
    assert!(
        worst <= vertex_precision,
        "worst componentwise error {worst} exceeds {vertex_precision}"
    );
}

#[test]
fn stream_carries_the_expected_chunk_sequence() {
    fn tag_position(buffer: &[u8], tag: &[u8; 4]) -> Option<usize> {
        buffer.windows(4).position(|window| window == tag)
    }

    let bare = compress_to_vec(&single_triangle(), 0.001);
    assert_eq!(&bare[0..4], b"HEAD");
    assert_eq!(&bare[48..52], b"VERT");
    let gidx = tag_position(&bare, b"GIDX").unwrap();
    let indx = tag_position(&bare, b"INDX").unwrap();
    assert!(52 < gidx && gidx < indx);
    assert_eq!(tag_position(&bare, b"TEXC"), None);
    assert_eq!(tag_position(&bare, b"NORM"), None);

    let mut mesh = single_triangle();
    mesh.tex_coords = Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
    let full = compress_to_vec(&mesh, 0.001);
    let texc = tag_position(&full, b"TEXC").unwrap();
    let norm = tag_position(&full, b"NORM").unwrap();
    assert!(tag_position(&full, b"INDX").unwrap() < texc);
    assert!(texc < norm);
}

#[test]
fn unsupported_version_is_rejected() {
    let mesh = single_triangle();
    let mut buffer = compress_to_vec(&mesh, 0.001);
    buffer[4..8].copy_from_slice(&2u32.to_le_bytes());

    let result = decompress_mg2(&mut Cursor::new(buffer), &mesh.layout());
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn misplaced_chunk_tag_is_rejected() {
    let mesh = single_triangle();
    let mut buffer = compress_to_vec(&mesh, 0.001);
    buffer[48..52].copy_from_slice(b"GIDX");

    let result = decompress_mg2(&mut Cursor::new(buffer), &mesh.layout());
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn truncated_stream_is_rejected() {
    let mesh = single_triangle();
    let buffer = compress_to_vec(&mesh, 0.001);

    for len in [10, 48, buffer.len() - 1] {
        let result = decompress_mg2(&mut Cursor::new(&buffer[..len]), &mesh.layout());
        assert!(
            matches!(result, Err(Error::Format(_))),
            "truncation at {len} was not rejected"
        );
    }
}

#[test]
fn invalid_inputs_are_rejected_before_writing() {
    let mut buffer = Vec::new();

    let empty = Mesh::default();
    let result = compress_mg2(&empty, 0.001, &mut buffer);
    assert!(matches!(result, Err(Error::InvalidMesh(_))));

    let result = compress_mg2(&single_triangle(), 0.0, &mut buffer);
    assert!(matches!(result, Err(Error::InvalidMesh(_))));

    assert!(buffer.is_empty());
}

#[test]
fn layout_mismatch_is_rejected() {
    let mesh = single_triangle();
    let buffer = compress_to_vec(&mesh, 0.001);

    let mut layout = mesh.layout();
    layout.vertex_count = 5;
    let result = decompress_mg2(&mut Cursor::new(buffer), &layout);
    assert!(matches!(result, Err(Error::Format(_))));
}
