use crate::grid::Grid;
use crate::mesh::{Mesh, MeshLayout};
use crate::stream::{self, ChunkTag};
use crate::{alloc_scratch, delta, pack, sort, triangle};
use crate::{Error, Result};
use log::debug;
use std::io::{Read, Write};

/// MG2 header format version understood by this codec.
const FORMAT_VERSION: u32 = 1;

const TAG_HEAD: ChunkTag = *b"HEAD";
const TAG_VERT: ChunkTag = *b"VERT";
const TAG_GIDX: ChunkTag = *b"GIDX";
const TAG_INDX: ChunkTag = *b"INDX";
const TAG_TEXC: ChunkTag = *b"TEXC";
const TAG_NORM: ChunkTag = *b"NORM";

/// Compress a mesh with the MG2 method and write the chunk sequence to
/// `writer`.
///
/// Vertices are clustered by a 64x64x64 spatial grid, sorted, quantized to
/// `vertex_precision` and delta-coded; triangle indices are rewritten
/// against the sorted order, canonicalized and delta-coded. Texture
/// coordinates and normals ride along uncompressed beyond the packer's
/// entropy coding, reordered to stay aligned with their vertices.
///
/// On failure the stream may hold a partial chunk sequence; the caller
/// discards it.
///
/// # Errors
/// `Error::InvalidMesh` if the mesh violates its invariants or
/// `vertex_precision` is not positive; `Error::Memory` if pipeline scratch
/// cannot be allocated; `Error::Io` if the stream fails.
pub fn compress_mg2<W: Write>(mesh: &Mesh, vertex_precision: f32, writer: &mut W) -> Result<()> {
    mesh.validate()?;
    if !(vertex_precision > 0.0) {
        return Err(Error::invalid_mesh(format!(
            "vertex precision must be positive, got {vertex_precision}"
        )));
    }

    let vertex_count = mesh.vertex_count();
    let triangle_count = mesh.triangle_count();
    debug!("mg2 encode: {vertex_count} vertices, {triangle_count} triangles");

    let grid = Grid::from_vertices(&mesh.vertices);

    stream::write_tag(writer, TAG_HEAD)?;
    stream::write_u32(writer, FORMAT_VERSION)?;
    stream::write_f32(writer, vertex_precision)?;
    for value in grid.min() {
        stream::write_f32(writer, value)?;
    }
    for value in grid.max() {
        stream::write_f32(writer, value)?;
    }
    for value in grid.divisions() {
        stream::write_u32(writer, value)?;
    }

    let (table, sorted_vertices) = sort::sort_vertices(&mesh.vertices, &grid)?;

    {
        let quantized =
            delta::make_vertex_deltas(&sorted_vertices, &table, &grid, vertex_precision)?;
        debug!("writing VERT chunk ({vertex_count} vertices)");
        stream::write_tag(writer, TAG_VERT)?;
        pack::pack_signed_ints(writer, &quantized, vertex_count, 3)?;
    }
    drop(sorted_vertices);

    {
        let cell_deltas = delta::cell_id_deltas(&table)?;
        debug!("writing GIDX chunk ({vertex_count} cell ids)");
        stream::write_tag(writer, TAG_GIDX)?;
        pack::pack_signed_ints(writer, &cell_deltas, vertex_count, 1)?;
    }

    {
        let mut triangles = {
            let lut = sort::inverse_permutation(&table)?;
            sort::remap_indices(&mesh.indices, &lut)?
        };
        triangle::canonicalize_triangles(&mut triangles);

        let mut index_deltas = alloc_scratch::<i32>(triangles.len() * 3, "index delta array")?;
        index_deltas.extend(triangles.iter().flatten().map(|&index| index as i32));
        drop(triangles);
        delta::make_index_deltas(&mut index_deltas);

        debug!("writing INDX chunk ({triangle_count} triangles)");
        stream::write_tag(writer, TAG_INDX)?;
        pack::pack_signed_ints(writer, &index_deltas, triangle_count, 3)?;
    }

    if let Some(tex_coords) = &mesh.tex_coords {
        let sorted = sort::permute(tex_coords, &table)?;
        let mut flat = alloc_scratch::<f32>(vertex_count * 2, "texture coordinate array")?;
        flat.extend(sorted.iter().flatten());
        debug!("writing TEXC chunk ({vertex_count} texture coordinates)");
        stream::write_tag(writer, TAG_TEXC)?;
        pack::pack_floats(writer, &flat, vertex_count * 2, 1)?;
    }

    if let Some(normals) = &mesh.normals {
        let sorted = sort::permute(normals, &table)?;
        let mut flat = alloc_scratch::<f32>(vertex_count * 3, "normal array")?;
        flat.extend(sorted.iter().flatten());
        debug!("writing NORM chunk ({vertex_count} normals)");
        stream::write_tag(writer, TAG_NORM)?;
        pack::pack_floats(writer, &flat, vertex_count, 3)?;
    }

    Ok(())
}

/// Read an MG2 chunk sequence from `reader` and reconstruct the mesh.
///
/// `layout` carries the shape metadata the surrounding container stores
/// outside the MG2 payload. The returned mesh holds vertices in the codec's
/// sort order (the canonical MG2 output order) with indices rewritten to
/// match.
///
/// # Errors
/// `Error::Format` on a tag mismatch, an unsupported version, inconsistent
/// header fields, a corrupt payload or a truncated stream; `Error::Io` if
/// the stream fails.
pub fn decompress_mg2<R: Read>(reader: &mut R, layout: &MeshLayout) -> Result<Mesh> {
    if layout.vertex_count == 0 || layout.triangle_count == 0 {
        return Err(Error::invalid_mesh(
            "layout must describe at least one vertex and one triangle",
        ));
    }

    stream::expect_tag(reader, TAG_HEAD)?;
    if stream::read_u32(reader)? != FORMAT_VERSION {
        return Err(Error::format("unsupported MG2 header version"));
    }
    let vertex_precision = stream::read_f32(reader)?;
    if !(vertex_precision > 0.0) {
        return Err(Error::format("vertex precision must be positive"));
    }
    let mut min = [0.0f32; 3];
    for value in &mut min {
        *value = stream::read_f32(reader)?;
    }
    let mut max = [0.0f32; 3];
    for value in &mut max {
        *value = stream::read_f32(reader)?;
    }
    if (0..3).any(|axis| max[axis] < min[axis]) {
        return Err(Error::format("grid bounds are inverted"));
    }
    let mut divisions = [0u32; 3];
    for value in &mut divisions {
        *value = stream::read_u32(reader)?;
    }
    if divisions.iter().any(|&division| division < 1) {
        return Err(Error::format("grid divisions must be at least 1"));
    }
    let grid = Grid::with_bounds(min, max, divisions);
    debug!(
        "mg2 decode: {} vertices, {} triangles, grid {:?}",
        layout.vertex_count, layout.triangle_count, divisions
    );

    stream::expect_tag(reader, TAG_VERT)?;
    let quantized = pack::unpack_signed_ints(reader, layout.vertex_count, 3)?;

    let vertices = {
        stream::expect_tag(reader, TAG_GIDX)?;
        let cell_ids = {
            let cell_deltas = pack::unpack_signed_ints(reader, layout.vertex_count, 1)?;
            delta::restore_cell_ids(&cell_deltas)?
        };
        delta::restore_vertices(&quantized, &cell_ids, &grid, vertex_precision)?
    };
    drop(quantized);

    let indices = {
        stream::expect_tag(reader, TAG_INDX)?;
        let mut index_deltas = pack::unpack_signed_ints(reader, layout.triangle_count, 3)?;
        delta::restore_index_deltas(&mut index_deltas);

        let mut indices = alloc_scratch::<u32>(index_deltas.len(), "index array")?;
        indices.extend(index_deltas.iter().map(|&index| index as u32));
        indices
    };

    let tex_coords = if layout.has_tex_coords() {
        stream::expect_tag(reader, TAG_TEXC)?;
        let flat = pack::unpack_floats(reader, layout.vertex_count * 2, 1)?;
        let mut tex_coords =
            alloc_scratch::<[f32; 2]>(layout.vertex_count, "texture coordinate array")?;
        tex_coords.extend(flat.chunks_exact(2).map(|uv| [uv[0], uv[1]]));
        Some(tex_coords)
    } else {
        None
    };

    let normals = if layout.has_normals() {
        stream::expect_tag(reader, TAG_NORM)?;
        let flat = pack::unpack_floats(reader, layout.vertex_count, 3)?;
        let mut normals = alloc_scratch::<[f32; 3]>(layout.vertex_count, "normal array")?;
        normals.extend(flat.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
        Some(normals)
    } else {
        None
    };

    Ok(Mesh {
        vertices,
        indices,
        tex_coords,
        normals,
    })
}
