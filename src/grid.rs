/// Lattice divisions per axis used by the encoder.
///
/// The header still carries the division counts so a decoder honors whatever
/// the stream says; only the encoder is fixed at 64.
pub const GRID_DIVISIONS: u32 = 64;

/// 3D space subdivision grid.
///
/// The axis-aligned bounding box of the vertex cloud, divided into a regular
/// lattice. Cells are addressed by a linear id `kx + dx * (ky + dy * kz)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    min: [f32; 3],
    max: [f32; 3],
    divisions: [u32; 3],
    cell_size: [f32; 3],
}

impl Grid {
    /// Grid over the bounding box of `vertices`, at the encoder's fixed
    /// resolution. `vertices` must not be empty.
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Grid {
        let mut min = vertices[0];
        let mut max = vertices[0];
        for vertex in &vertices[1..] {
            for axis in 0..3 {
                if vertex[axis] < min[axis] {
                    min[axis] = vertex[axis];
                } else if vertex[axis] > max[axis] {
                    max[axis] = vertex[axis];
                }
            }
        }
        Grid::with_bounds(min, max, [GRID_DIVISIONS; 3])
    }

    /// Grid with explicit bounds and divisions, as read from a stream header.
    /// Every division count must be at least 1.
    pub fn with_bounds(min: [f32; 3], max: [f32; 3], divisions: [u32; 3]) -> Grid {
        let mut cell_size = [0.0f32; 3];
        for axis in 0..3 {
            cell_size[axis] = (max[axis] - min[axis]) / divisions[axis] as f32;
        }
        Grid {
            min,
            max,
            divisions,
            cell_size,
        }
    }

    #[inline]
    pub fn min(&self) -> [f32; 3] {
        self.min
    }

    #[inline]
    pub fn max(&self) -> [f32; 3] {
        self.max
    }

    #[inline]
    pub fn divisions(&self) -> [u32; 3] {
        self.divisions
    }

    #[inline]
    pub fn cell_size(&self) -> [f32; 3] {
        self.cell_size
    }

    /// Linear id of the cell containing `point`.
    ///
    /// Out-of-range points clamp to the nearest boundary cell; a degenerate
    /// axis (cell size 0) collapses to cell 0 on that axis.
    pub fn point_to_cell(&self, point: &[f32; 3]) -> u32 {
        let mut cell = [0u32; 3];
        for axis in 0..3 {
            if self.cell_size[axis] > 0.0 {
                let slot = ((point[axis] - self.min[axis]) / self.cell_size[axis]).floor();
                cell[axis] = (slot as u32).min(self.divisions[axis] - 1);
            }
        }
        cell[0] + self.divisions[0] * (cell[1] + self.divisions[1] * cell[2])
    }

    /// Minimum corner of the cell with the given linear id.
    pub fn cell_origin(&self, cell_id: u32) -> [f32; 3] {
        let zdiv = self.divisions[0] * self.divisions[1];
        let kz = cell_id / zdiv;
        let rest = cell_id - kz * zdiv;
        let ky = rest / self.divisions[0];
        let kx = rest - ky * self.divisions[0];
        [
            kx as f32 * self.cell_size[0] + self.min[0],
            ky as f32 * self.cell_size[1] + self.min[1],
            kz as f32 * self.cell_size[2] + self.min[2],
        ]
    }

    /// Total number of cells in the lattice.
    pub fn cell_count(&self) -> u32 {
        self.divisions[0] * self.divisions[1] * self.divisions[2]
    }
}
