//! Local partition buffer with halo rows and guard columns.

use crate::error::GridError;

/// A dead cell.
pub const DEAD: u8 = 0;

/// A live cell.
pub const ALIVE: u8 = 1;

/// Default grid width in cells.
pub const DEFAULT_WIDTH: usize = 1024;

/// One worker's slice of the automaton.
///
/// Stores `rows + 2` rows of `width + 2` cells each, contiguously:
///
/// ```text
///  row 0          [g | halo copy of the up neighbour's bottom row | g]
///  rows 1..=rows  [g | authoritative cells                         | g]
///  row rows+1     [g | halo copy of the down neighbour's top row  | g]
/// ```
///
/// Guard column 0 mirrors column `width` and guard column `width + 1`
/// mirrors column 1 once [`LocalGrid::sync_columns`] has run, so the
/// transition reads a full 3x3 neighbourhood at every interior cell
/// without edge cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalGrid {
    width: usize,
    rows: usize,
    cells: Vec<u8>,
}

impl LocalGrid {
    /// Allocates a dead partition of `rows` authoritative rows.
    pub fn new(width: usize, rows: usize) -> Result<Self, GridError> {
        let too_large = GridError::Allocation {
            what: "local partition",
            bytes: usize::MAX,
        };
        let len = rows
            .checked_add(2)
            .zip(width.checked_add(2))
            .and_then(|(r, w)| r.checked_mul(w))
            .ok_or(too_large)?;
        Ok(Self {
            width,
            rows,
            cells: allocate_cells(len, "local partition")?,
        })
    }

    /// Cells per row, guards excluded.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Authoritative rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Bytes per row, guards included. This is the unit of a halo transfer.
    pub fn stride(&self) -> usize {
        self.width + 2
    }

    /// Row `y` in buffer coordinates (0 and `rows + 1` are halos).
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.cells[y * stride..(y + 1) * stride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let stride = self.stride();
        &mut self.cells[y * stride..(y + 1) * stride]
    }

    /// Cell at buffer coordinates.
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.stride() + x]
    }

    /// Sets an authoritative cell; `x` in `1..=width`, `y` in `1..=rows`.
    pub fn set(&mut self, x: usize, y: usize, state: u8) -> Result<(), GridError> {
        if x == 0 || x > self.width || y == 0 || y > self.rows {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: self.width,
                rows: self.rows,
            });
        }
        let stride = self.stride();
        self.cells[y * stride + x] = state;
        Ok(())
    }

    /// Copies the wrap-around columns into the guard columns of every row,
    /// halos included.
    pub fn sync_columns(&mut self) {
        let width = self.width;
        for row in self.cells.chunks_exact_mut(width + 2) {
            row[0] = row[width];
            row[width + 1] = row[1];
        }
    }

    /// The authoritative rows as one contiguous block, guards included.
    pub fn authoritative(&self) -> &[u8] {
        let stride = self.stride();
        &self.cells[stride..(self.rows + 1) * stride]
    }

    /// Overwrites the authoritative rows from a block of `rows * stride` bytes.
    pub fn load_authoritative(&mut self, block: &[u8]) -> Result<(), GridError> {
        let stride = self.stride();
        let expected = self.rows * stride;
        if block.len() != expected {
            return Err(GridError::PayloadSize {
                expected,
                got: block.len(),
            });
        }
        check_cells(block)?;
        self.cells[stride..(self.rows + 1) * stride].copy_from_slice(block);
        Ok(())
    }

    /// Overwrites one full row (guards included), typically a halo.
    pub fn load_row(&mut self, y: usize, row: &[u8]) -> Result<(), GridError> {
        let expected = self.stride();
        if row.len() != expected {
            return Err(GridError::PayloadSize {
                expected,
                got: row.len(),
            });
        }
        check_cells(row)?;
        self.row_mut(y).copy_from_slice(row);
        Ok(())
    }

    /// Number of live authoritative cells.
    pub fn alive_count(&self) -> usize {
        (1..=self.rows)
            .map(|y| self.row(y)[1..=self.width].iter().filter(|&&c| c == ALIVE).count())
            .sum()
    }
}

/// Rejects any byte that is neither [`DEAD`] nor [`ALIVE`].
pub(crate) fn check_cells(bytes: &[u8]) -> Result<(), GridError> {
    match bytes.iter().position(|&c| c > ALIVE) {
        Some(offset) => Err(GridError::InvalidCell {
            offset,
            value: bytes[offset],
        }),
        None => Ok(()),
    }
}

/// Reserves a zeroed cell buffer without aborting the process on failure.
pub(crate) fn allocate_cells(len: usize, what: &'static str) -> Result<Vec<u8>, GridError> {
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|_| GridError::Allocation { what, bytes: len })?;
    cells.resize(len, DEAD);
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(width: usize, rows: usize) -> LocalGrid {
        let mut grid = LocalGrid::new(width, rows).unwrap();
        for y in 0..rows + 2 {
            for (x, cell) in grid.row_mut(y).iter_mut().enumerate() {
                *cell = ((x + y) % 2) as u8;
            }
        }
        grid
    }

    #[test]
    fn test_layout_sizes() {
        let grid = LocalGrid::new(8, 3).unwrap();
        assert_eq!(grid.stride(), 10);
        assert_eq!(grid.row(4).len(), 10);
        assert_eq!(grid.authoritative().len(), 30);
        assert_eq!(grid.alive_count(), 0);
    }

    #[test]
    fn test_sync_columns_wraps_every_row() {
        let mut grid = striped(5, 4);
        grid.row_mut(2)[5] = ALIVE;
        grid.row_mut(2)[1] = DEAD;

        grid.sync_columns();

        for y in 0..grid.rows() + 2 {
            let row = grid.row(y);
            assert_eq!(row[0], row[5], "row {}", y);
            assert_eq!(row[6], row[1], "row {}", y);
        }
        assert_eq!(grid.get(0, 2), ALIVE);
        assert_eq!(grid.get(6, 2), DEAD);
    }

    #[test]
    fn test_single_column_wraps_onto_itself() {
        let mut grid = LocalGrid::new(1, 2).unwrap();
        grid.set(1, 1, ALIVE).unwrap();
        grid.sync_columns();
        assert_eq!(grid.row(1), &[ALIVE, ALIVE, ALIVE]);
    }

    #[test]
    fn test_load_authoritative_leaves_halos() {
        let mut grid = LocalGrid::new(2, 2).unwrap();
        grid.load_authoritative(&[0, 1, 1, 0, 0, 0, 1, 0]).unwrap();

        assert_eq!(grid.row(0), &[0, 0, 0, 0]);
        assert_eq!(grid.row(1), &[0, 1, 1, 0]);
        assert_eq!(grid.row(2), &[0, 0, 1, 0]);
        assert_eq!(grid.row(3), &[0, 0, 0, 0]);
        assert_eq!(grid.alive_count(), 3);
    }

    #[test]
    fn test_wire_size_enforced() {
        let mut grid = LocalGrid::new(4, 2).unwrap();
        assert_eq!(
            grid.load_row(0, &[0; 5]),
            Err(GridError::PayloadSize { expected: 6, got: 5 })
        );
        assert_eq!(
            grid.load_authoritative(&[0; 6]),
            Err(GridError::PayloadSize { expected: 12, got: 6 })
        );
    }

    #[test]
    fn test_non_cell_bytes_rejected() {
        let mut grid = LocalGrid::new(3, 2).unwrap();
        assert_eq!(
            grid.load_row(0, &[0, 1, 7, 0, 0]),
            Err(GridError::InvalidCell { offset: 2, value: 7 })
        );
        assert_eq!(
            grid.load_authoritative(&[0, 0, 0, 0, 0, 1, 1, 1, 1, 255]),
            Err(GridError::InvalidCell { offset: 9, value: 255 })
        );
        assert_eq!(grid.row(0), &[DEAD; 5]);
        assert_eq!(grid.alive_count(), 0);
    }

    #[test]
    fn test_unaddressable_size_is_an_error() {
        assert!(matches!(
            LocalGrid::new(usize::MAX, 1),
            Err(GridError::Allocation { .. })
        ));
        assert!(matches!(
            LocalGrid::new(1, usize::MAX - 1),
            Err(GridError::Allocation { .. })
        ));
    }

    #[test]
    fn test_set_rejects_guards_and_halos() {
        let mut grid = LocalGrid::new(4, 2).unwrap();
        assert!(grid.set(0, 1, ALIVE).is_err());
        assert!(grid.set(5, 1, ALIVE).is_err());
        assert!(grid.set(1, 0, ALIVE).is_err());
        assert!(grid.set(1, 3, ALIVE).is_err());
        assert!(grid.set(4, 2, ALIVE).is_ok());
    }
}
