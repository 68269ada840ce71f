use crate::alloc_scratch;
use crate::grid::Grid;
use crate::Result;

/// Per-vertex bookkeeping for the spatial sort.
///
/// Lives from the start of an encode until the INDX chunk has been emitted.
#[derive(Debug, Copy, Clone)]
pub(crate) struct SortedVertex {
    /// X coordinate, the secondary sort key.
    pub x: f32,
    /// Linear id of the grid cell holding the vertex, the primary sort key.
    pub cell_id: u32,
    /// Position of the vertex in the caller's array.
    pub original_index: u32,
}

/// Assign every vertex to a grid cell and sort by `(cell_id, x)`.
///
/// Returns the sort table and the vertex array permuted into sort order.
/// Remaining ties after the x key are left to the unstable sort; they
/// produce identical compressed output either way.
pub(crate) fn sort_vertices(
    vertices: &[[f32; 3]],
    grid: &Grid,
) -> Result<(Vec<SortedVertex>, Vec<[f32; 3]>)> {
    let mut table = alloc_scratch::<SortedVertex>(vertices.len(), "vertex sort table")?;
    for (original_index, vertex) in vertices.iter().enumerate() {
        table.push(SortedVertex {
            x: vertex[0],
            cell_id: grid.point_to_cell(vertex),
            original_index: original_index as u32,
        });
    }
    table.sort_unstable_by(|a, b| {
        a.cell_id
            .cmp(&b.cell_id)
            .then_with(|| a.x.total_cmp(&b.x))
    });

    let sorted_vertices = permute(vertices, &table)?;
    Ok((table, sorted_vertices))
}

/// Reorder a per-vertex array into sort order.
pub(crate) fn permute<T: Copy>(values: &[T], table: &[SortedVertex]) -> Result<Vec<T>> {
    let mut sorted = alloc_scratch::<T>(values.len(), "permuted attribute array")?;
    sorted.extend(
        table
            .iter()
            .map(|entry| values[entry.original_index as usize]),
    );
    Ok(sorted)
}

/// Build the inverse permutation: `lut[original_index] = new_index`.
pub(crate) fn inverse_permutation(table: &[SortedVertex]) -> Result<Vec<u32>> {
    let mut lut = alloc_scratch::<u32>(table.len(), "index lookup table")?;
    lut.resize(table.len(), 0);
    for (new_index, entry) in table.iter().enumerate() {
        lut[entry.original_index as usize] = new_index as u32;
    }
    Ok(lut)
}

/// Rewrite the triangle list against the sorted vertex order.
pub(crate) fn remap_indices(indices: &[u32], lut: &[u32]) -> Result<Vec<[u32; 3]>> {
    let mut triangles = alloc_scratch::<[u32; 3]>(indices.len() / 3, "remapped index array")?;
    triangles.extend(indices.chunks_exact(3).map(|triangle| {
        [
            lut[triangle[0] as usize],
            lut[triangle[1] as usize],
            lut[triangle[2] as usize],
        ]
    }));
    Ok(triangles)
}
