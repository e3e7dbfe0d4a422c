use crate::error::{Error, Result};

/// Reference 8x8 map, `w` is a wall and `0` is open floor.
pub const REFERENCE_MAP: [&str; 8] = [
    "wwwwwwww",
    "w000000w",
    "w0w0w00w",
    "w0000w0w",
    "w0w0w00w",
    "w00w000w",
    "w000000w",
    "wwwwwwww",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Open,
    Wall,
}

impl Cell {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'w' | 'W' | '#' => Some(Cell::Wall),
            '0' | '.' | ' ' => Some(Cell::Open),
            _ => None,
        }
    }
}

/// Immutable rectangular occupancy grid, stored row-major.
///
/// Cell `(x, y)` covers the unit square `[x, x + 1) × [y, y + 1)` in grid units.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid from rows of cells. Every row must have the same, non-zero length.
    pub fn new(rows: Vec<Vec<Cell>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(Error::EmptyGrid);
        }

        let mut cells = Vec::with_capacity(width * height);
        for (row, line) in rows.into_iter().enumerate() {
            if line.len() != width {
                return Err(Error::RaggedRow {
                    row,
                    expected: width,
                    found: line.len(),
                });
            }
            cells.extend(line);
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Parse a text map, one string per row.
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        let parsed = rows
            .iter()
            .enumerate()
            .map(|(row, line)| {
                line.chars()
                    .enumerate()
                    .map(|(col, symbol)| {
                        Cell::from_symbol(symbol).ok_or(Error::UnknownCell { row, col, symbol })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(parsed)
    }

    pub fn reference() -> Result<Self> {
        Self::from_rows(&REFERENCE_MAP)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell at integer coordinates, `None` outside the grid.
    #[inline]
    pub fn cell_at(&self, x: usize, y: usize) -> Option<Cell> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// True when the continuous point lies in `[0, W) × [0, H)`.
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && x < self.width as f32 && y >= 0.0 && y < self.height as f32
    }

    /// Cell under a continuous point, `None` outside the grid.
    #[inline]
    pub fn cell_under(&self, x: f32, y: f32) -> Option<Cell> {
        if !self.contains(x, y) {
            return None;
        }
        self.cell_at(x.floor() as usize, y.floor() as usize)
    }

    #[inline]
    pub fn is_walkable(&self, x: f32, y: f32) -> bool {
        self.cell_under(x, y) == Some(Cell::Open)
    }

    /// Iterate `(x, y, cell)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &cell)| (i % self.width, i / self.width, cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_map_shape() {
        let grid = Grid::reference().unwrap();
        assert_eq!(grid.width(), 8);
        assert_eq!(grid.height(), 8);
        for i in 0..8 {
            assert_eq!(grid.cell_at(i, 0), Some(Cell::Wall));
            assert_eq!(grid.cell_at(i, 7), Some(Cell::Wall));
            assert_eq!(grid.cell_at(0, i), Some(Cell::Wall));
            assert_eq!(grid.cell_at(7, i), Some(Cell::Wall));
        }
        for (x, y) in [(2, 2), (4, 2), (5, 3), (2, 4), (4, 4), (3, 5)] {
            assert_eq!(grid.cell_at(x, y), Some(Cell::Wall), "({x}, {y})");
        }
        assert_eq!(grid.cell_at(1, 1), Some(Cell::Open));
        assert_eq!(grid.cell_at(8, 1), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Grid::from_rows(&["www", "w0", "www"]).unwrap_err();
        assert_eq!(
            err,
            Error::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert_eq!(Grid::from_rows(&[]).unwrap_err(), Error::EmptyGrid);
        assert_eq!(Grid::from_rows(&["", ""]).unwrap_err(), Error::EmptyGrid);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let err = Grid::from_rows(&["ww", "wx"]).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownCell {
                row: 1,
                col: 1,
                symbol: 'x'
            }
        );
    }

    #[test]
    fn test_contains_edges() {
        let grid = Grid::reference().unwrap();
        assert!(grid.contains(0.0, 0.0));
        assert!(grid.contains(7.999, 7.999));
        assert!(!grid.contains(8.0, 3.0));
        assert!(!grid.contains(3.0, 8.0));
        assert!(!grid.contains(-0.001, 3.0));
        assert!(!grid.contains(3.0, -0.001));
    }

    #[test]
    fn test_walkable_floors_position() {
        let grid = Grid::reference().unwrap();
        assert!(grid.is_walkable(1.5, 1.5));
        assert!(!grid.is_walkable(2.1, 2.9));
        assert!(!grid.is_walkable(0.5, 3.0));
        assert!(!grid.is_walkable(-0.5, 3.0));
    }

    #[test]
    fn test_cells_iteration_is_row_major() {
        let grid = Grid::from_rows(&["w0", "0w"]).unwrap();
        let cells: Vec<_> = grid.cells().collect();
        assert_eq!(
            cells,
            vec![
                (0, 0, Cell::Wall),
                (1, 0, Cell::Open),
                (0, 1, Cell::Open),
                (1, 1, Cell::Wall),
            ]
        );
    }
}
