use crate::alloc_scratch;
use crate::grid::Grid;
use crate::sort::SortedVertex;
use crate::Result;

/// Sentinel cell id that never matches a real cell.
const NO_CELL: u32 = 0x7fff_ffff;

/// First differences of the (non-decreasing) cell-id sequence.
pub(crate) fn cell_id_deltas(table: &[SortedVertex]) -> Result<Vec<i32>> {
    let mut deltas = alloc_scratch::<i32>(table.len(), "cell id delta array")?;
    deltas.push(table[0].cell_id as i32);
    for pair in table.windows(2) {
        deltas.push((pair[1].cell_id - pair[0].cell_id) as i32);
    }
    Ok(deltas)
}

/// Prefix-sum cell-id deltas back into absolute ids.
pub(crate) fn restore_cell_ids(deltas: &[i32]) -> Result<Vec<u32>> {
    let mut cell_ids = alloc_scratch::<u32>(deltas.len(), "cell id array")?;
    let mut cell_id = 0u32;
    for &delta in deltas {
        cell_id = cell_id.wrapping_add(delta as u32);
        cell_ids.push(cell_id);
    }
    Ok(cell_ids)
}

/// Replace canonicalized triangle indices by predictive deltas.
///
/// Traverses in reverse so every delta reads values that have not been
/// rewritten yet. Per triangle, the second index becomes a delta to the
/// previous second index when the first index repeats (to the own first
/// index otherwise), the third index becomes a delta to the first index,
/// and the first index becomes a derivative over the triangle sequence.
pub(crate) fn make_index_deltas(indices: &mut [i32]) {
    let triangle_count = indices.len() / 3;
    for i in (0..triangle_count).rev() {
        if i >= 1 && indices[i * 3] == indices[(i - 1) * 3] {
            indices[i * 3 + 1] -= indices[(i - 1) * 3 + 1];
        } else {
            indices[i * 3 + 1] -= indices[i * 3];
        }

        indices[i * 3 + 2] -= indices[i * 3];

        if i >= 1 {
            indices[i * 3] -= indices[(i - 1) * 3];
        }
    }
}

/// Inverse of `make_index_deltas`.
///
/// Runs forward and mirrors the three steps in reverse order: first index,
/// then third, then second. The ordering matters because the second-index
/// rule inspects the already-restored first indices.
pub(crate) fn restore_index_deltas(indices: &mut [i32]) {
    let triangle_count = indices.len() / 3;
    for i in 0..triangle_count {
        if i >= 1 {
            indices[i * 3] += indices[(i - 1) * 3];
        }

        indices[i * 3 + 2] += indices[i * 3];

        if i >= 1 && indices[i * 3] == indices[(i - 1) * 3] {
            indices[i * 3 + 1] += indices[(i - 1) * 3 + 1];
        } else {
            indices[i * 3 + 1] += indices[i * 3];
        }
    }
}

/// Quantize sorted vertices against their cell origins.
///
/// Each component becomes `round(scale * (v - origin))` with
/// `scale = 1 / vertex_precision`. The x channel additionally deltas against
/// the previous vertex while the cell id repeats, which the `(cell, x)` sort
/// keeps small.
pub(crate) fn make_vertex_deltas(
    sorted_vertices: &[[f32; 3]],
    table: &[SortedVertex],
    grid: &Grid,
    vertex_precision: f32,
) -> Result<Vec<i32>> {
    let scale = 1.0 / vertex_precision;
    let mut deltas = alloc_scratch::<i32>(sorted_vertices.len() * 3, "quantized vertex array")?;
    let mut prev_cell_id = NO_CELL;
    let mut prev_delta_x = 0i32;
    for (vertex, entry) in sorted_vertices.iter().zip(table) {
        let origin = grid.cell_origin(entry.cell_id);

        let delta_x = (scale * (vertex[0] - origin[0])).round() as i32;
        if entry.cell_id == prev_cell_id {
            deltas.push(delta_x - prev_delta_x);
        } else {
            deltas.push(delta_x);
        }
        deltas.push((scale * (vertex[1] - origin[1])).round() as i32);
        deltas.push((scale * (vertex[2] - origin[2])).round() as i32);

        prev_cell_id = entry.cell_id;
        prev_delta_x = delta_x;
    }
    Ok(deltas)
}

/// Inverse of `make_vertex_deltas`: quantized integers back to coordinates.
pub(crate) fn restore_vertices(
    deltas: &[i32],
    cell_ids: &[u32],
    grid: &Grid,
    vertex_precision: f32,
) -> Result<Vec<[f32; 3]>> {
    let mut vertices = alloc_scratch::<[f32; 3]>(cell_ids.len(), "restored vertex array")?;
    let mut prev_cell_id = NO_CELL;
    let mut prev_delta_x = 0i32;
    for (quantized, &cell_id) in deltas.chunks_exact(3).zip(cell_ids) {
        let origin = grid.cell_origin(cell_id);

        let delta_x = if cell_id == prev_cell_id {
            quantized[0] + prev_delta_x
        } else {
            quantized[0]
        };
        vertices.push([
            delta_x as f32 * vertex_precision + origin[0],
            quantized[1] as f32 * vertex_precision + origin[1],
            quantized[2] as f32 * vertex_precision + origin[2],
        ]);

        prev_cell_id = cell_id;
        prev_delta_x = delta_x;
    }
    Ok(vertices)
}
