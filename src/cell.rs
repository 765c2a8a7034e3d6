//! Cell identifiers and board geometry.
//!
//! A [`Cell`] is the disjoint union the spec calls for: interior board
//! points, the four edge sentinels, and the SWAP/RESIGN/INVALID tokens. The
//! six hex neighbor directions generalize the teacher's 8-direction `DELTA`
//! table (itself built for a square Go board) down to the hexagonal
//! adjacency used here.

use std::fmt;

/// One of the four board-edge sentinels, or a real interior point.
///
/// Interior points are identified by a dense `u16` index assigned row-major
/// at board construction time; sentinels and special tokens get the lowest
/// few indices so that `Cell` stays a cheap `Copy` newtype usable directly as
/// an array/bitset index.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell(pub(crate) u16);

/// Fixed indices for the non-interior cells. Interior cells start at
/// [`FIRST_INTERIOR`].
pub const EDGE_NORTH: Cell = Cell(0);
pub const EDGE_SOUTH: Cell = Cell(1);
pub const EDGE_EAST: Cell = Cell(2);
pub const EDGE_WEST: Cell = Cell(3);
pub const SWAP: Cell = Cell(4);
pub const RESIGN: Cell = Cell(5);
pub const INVALID: Cell = Cell(6);
pub const FIRST_INTERIOR: u16 = 7;

impl Cell {
    #[inline]
    pub fn is_edge(self) -> bool {
        matches!(self, EDGE_NORTH | EDGE_SOUTH | EDGE_EAST | EDGE_WEST)
    }

    #[inline]
    pub fn is_interior(self) -> bool {
        self.0 >= FIRST_INTERIOR
    }

    /// The color that owns this edge, or `None` for interior/special cells.
    #[inline]
    pub fn edge_color(self) -> Option<Color> {
        match self {
            EDGE_NORTH | EDGE_SOUTH => Some(Color::Black),
            EDGE_EAST | EDGE_WEST => Some(Color::White),
            _ => None,
        }
    }

    /// Dense index usable to index a `Vec`/bitset sized by `board.num_cells()`.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(i: usize) -> Cell {
        Cell(i as u16)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            EDGE_NORTH => write!(f, "N"),
            EDGE_SOUTH => write!(f, "S"),
            EDGE_EAST => write!(f, "E"),
            EDGE_WEST => write!(f, "W"),
            SWAP => write!(f, "swap-pieces"),
            RESIGN => write!(f, "resign"),
            INVALID => write!(f, "invalid"),
            Cell(i) => write!(f, "#{i}"),
        }
    }
}

/// Stone/cell color. `Dead` marks a cell the ICE engine has proven
/// irrelevant to the outcome; it is never a color a player can own a stone
/// of, only a fill-in marker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
    Empty,
    Dead,
}

impl Color {
    #[inline]
    pub fn other(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
            other => other,
        }
    }

    /// The two edges a color must connect to win.
    #[inline]
    pub fn edges(self) -> (Cell, Cell) {
        match self {
            Color::Black => (EDGE_NORTH, EDGE_SOUTH),
            Color::White => (EDGE_EAST, EDGE_WEST),
            _ => (INVALID, INVALID),
        }
    }
}

/// The six hex neighbor directions, in a fixed enumeration order used
/// everywhere a per-slice array (ring godels, pattern masks) is indexed.
pub const NUM_DIRECTIONS: usize = 6;

/// Axial (col, row) deltas for the six neighbor directions: E, NE, N, W, SW, S.
///
/// This is the "rhombus" offset-coordinate adjacency used by essentially
/// every Hex engine: each row is conceptually shifted right of the row
/// above it, so "straight down" and "straight up" are not neighbor
/// directions — the diagonal pair NE/SW takes their place.
pub const DIRECTION_DELTAS: [(i32, i32); NUM_DIRECTIONS] = [
    (1, 0),   // E
    (1, -1),  // NE
    (0, -1),  // N
    (-1, 0),  // W
    (-1, 1),  // SW
    (0, 1),   // S
];

/// Board geometry: maps (col, row) <-> dense interior `Cell` index, and
/// resolves off-board neighbor lookups to the owning edge sentinel.
#[derive(Clone)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
}

impl Geometry {
    pub fn new(width: usize, height: usize) -> Geometry {
        Geometry { width, height }
    }

    #[inline]
    pub fn num_interior(&self) -> usize {
        self.width * self.height
    }

    /// Total number of distinct `Cell` identities: special tokens, edges,
    /// and interior cells.
    #[inline]
    pub fn num_cells(&self) -> usize {
        FIRST_INTERIOR as usize + self.num_interior()
    }

    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> Cell {
        debug_assert!(col < self.width && row < self.height);
        Cell::from_index(FIRST_INTERIOR as usize + row * self.width + col)
    }

    #[inline]
    pub fn coords(&self, cell: Cell) -> (usize, usize) {
        debug_assert!(cell.is_interior());
        let i = cell.index() - FIRST_INTERIOR as usize;
        (i % self.width, i / self.width)
    }

    /// All cells the side to move could ever occupy: the interior points.
    pub fn all_interior(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.num_interior()).map(|i| Cell::from_index(FIRST_INTERIOR as usize + i))
    }

    /// Resolve the cell (interior or edge) in direction `dir` from `cell`,
    /// or `None` if `cell` is not an interior cell to begin with.
    pub fn neighbor(&self, cell: Cell, dir: usize) -> Option<Cell> {
        if !cell.is_interior() {
            return None;
        }
        let (col, row) = self.coords(cell);
        let (dc, dr) = DIRECTION_DELTAS[dir];
        let nc = col as i32 + dc;
        let nr = row as i32 + dr;

        if nr < 0 {
            return Some(EDGE_NORTH);
        }
        if nr >= self.height as i32 {
            return Some(EDGE_SOUTH);
        }
        if nc < 0 {
            return Some(EDGE_WEST);
        }
        if nc >= self.width as i32 {
            return Some(EDGE_EAST);
        }
        Some(self.cell(nc as usize, nr as usize))
    }

    /// All (up to 6) neighbors of an interior cell, edges included.
    pub fn neighbors(&self, cell: Cell) -> [Option<Cell>; NUM_DIRECTIONS] {
        std::array::from_fn(|d| self.neighbor(cell, d))
    }

    /// Parse `a3`-style notation (column letter(s), 1-based row) into a
    /// `Cell`, or the `SWAP`/`RESIGN` tokens for those literal strings.
    pub fn parse_coord(&self, s: &str) -> Option<Cell> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("swap-pieces") || s.eq_ignore_ascii_case("swap") {
            return Some(SWAP);
        }
        if s.eq_ignore_ascii_case("resign") {
            return Some(RESIGN);
        }
        let mut chars = s.chars();
        let col_ch = chars.next()?.to_ascii_lowercase();
        if !col_ch.is_ascii_lowercase() {
            return None;
        }
        let col = (col_ch as u8 - b'a') as usize;
        let row_str: String = chars.collect();
        let row: usize = row_str.parse().ok()?;
        if row == 0 || col >= self.width || row > self.height {
            return None;
        }
        Some(self.cell(col, row - 1))
    }

    /// Format a `Cell` back into `a3`-style notation.
    pub fn format_coord(&self, cell: Cell) -> String {
        match cell {
            SWAP => "swap-pieces".to_string(),
            RESIGN => "resign".to_string(),
            EDGE_NORTH => "edge-N".to_string(),
            EDGE_SOUTH => "edge-S".to_string(),
            EDGE_EAST => "edge-E".to_string(),
            EDGE_WEST => "edge-W".to_string(),
            INVALID => "invalid".to_string(),
            _ => {
                let (col, row) = self.coords(cell);
                format!("{}{}", (b'a' + col as u8) as char, row + 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_coords() {
        let g = Geometry::new(11, 11);
        for row in 0..11 {
            for col in 0..11 {
                let c = g.cell(col, row);
                assert_eq!(g.coords(c), (col, row));
            }
        }
    }

    #[test]
    fn parse_and_format_round_trip() {
        let g = Geometry::new(11, 11);
        for s in ["a1", "k11", "f6"] {
            let c = g.parse_coord(s).unwrap();
            assert_eq!(g.format_coord(c), s);
        }
    }

    #[test]
    fn corner_neighbors_hit_edges() {
        let g = Geometry::new(5, 5);
        let a1 = g.cell(0, 0);
        let neighbors = g.neighbors(a1);
        assert!(neighbors.contains(&Some(EDGE_NORTH)) || neighbors.contains(&Some(EDGE_WEST)));
    }

    #[test]
    fn edges_own_correct_colors() {
        assert_eq!(EDGE_NORTH.edge_color(), Some(Color::Black));
        assert_eq!(EDGE_SOUTH.edge_color(), Some(Color::Black));
        assert_eq!(EDGE_EAST.edge_color(), Some(Color::White));
        assert_eq!(EDGE_WEST.edge_color(), Some(Color::White));
    }
}
