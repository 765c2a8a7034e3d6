//! Stone board, group board (union-find), and ring godels.
//!
//! Generalizes the teacher's incremental `env4`/`env4d` neighbor-color
//! encoding (`position.rs`) from 8 Go neighbors to 6 hex neighbors, and adds
//! a persistent union-find `GroupBoard` the teacher has no need for (Go
//! recomputes groups on demand via flood fill; VCs here must reference
//! groups by a stable identity across moves, so we keep one).

use std::collections::HashMap;

use crate::bitset::CellSet;
use crate::cell::{Cell, Color, Geometry, EDGE_EAST, EDGE_NORTH, EDGE_SOUTH, EDGE_WEST, NUM_DIRECTIONS};
use crate::constants::{PLAYOUT_UPDATE_RADIUS, TREE_UPDATE_RADIUS};

/// A ring godel: two bits per neighbor slice (Black/White/Empty/Dead),
/// packed into the low 12 bits of a `u16`.
pub type RingGodel = u16;

#[inline]
fn slice_code(c: Color) -> u16 {
    match c {
        Color::White => 0,
        Color::Black => 1,
        Color::Empty => 2,
        Color::Dead => 3,
    }
}

#[inline]
pub fn code_to_color(code: u16) -> Color {
    match code {
        0 => Color::White,
        1 => Color::Black,
        2 => Color::Empty,
        _ => Color::Dead,
    }
}

/// The stone board, group board, and ring godel index for one board size.
#[derive(Clone)]
pub struct Board {
    pub geom: Geometry,
    color: Vec<Color>,
    played: CellSet,
    godel: Vec<RingGodel>,
    group: GroupBoard,
    /// The radius `play`/`add_color`/`set_color`/`undo` update at:
    /// `TREE_UPDATE_RADIUS` outside a playout, `PLAYOUT_UPDATE_RADIUS`
    /// between `enter_playout_phase` and `exit_playout_phase` (spec 4.1).
    phase_radius: usize,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Board {
        let geom = Geometry::new(width, height);
        let n = geom.num_cells();
        let mut color = vec![Color::Empty; n];
        color[EDGE_NORTH.index()] = Color::Black;
        color[EDGE_SOUTH.index()] = Color::Black;
        color[EDGE_EAST.index()] = Color::White;
        color[EDGE_WEST.index()] = Color::White;

        let mut b = Board {
            group: GroupBoard::new(n),
            godel: vec![0; n],
            played: CellSet::new(n),
            color,
            geom,
            phase_radius: TREE_UPDATE_RADIUS,
        };
        b.recompute_all_godels();
        b.absorb();
        b
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.geom.num_cells()
    }

    #[inline]
    pub fn color(&self, cell: Cell) -> Color {
        self.color[cell.index()]
    }

    #[inline]
    pub fn is_played(&self, cell: Cell) -> bool {
        self.played.contains(cell)
    }

    pub fn played(&self) -> &CellSet {
        &self.played
    }

    /// All empty interior cells.
    pub fn empty(&self) -> CellSet {
        let mut out = CellSet::new(self.num_cells());
        for c in self.geom.all_interior() {
            if self.color(c) == Color::Empty {
                out.insert(c);
            }
        }
        out
    }

    pub fn group_board(&self) -> &GroupBoard {
        &self.group
    }

    /// Full color array indexed by `Cell::index()`, edges and specials
    /// included; used by callers that need to hand `GroupBoard` a raw
    /// color slice (e.g. `empty_neighbors`).
    pub fn colors(&self) -> &[Color] {
        &self.color
    }

    /// Place a stone of `color` at `cell`, marking it as played by an actual
    /// move (as opposed to ICE fill-in). Recomputes groups and ring godels.
    pub fn play(&mut self, color: Color, cell: Cell) {
        debug_assert!(cell.is_interior());
        debug_assert_eq!(self.color(cell), Color::Empty);
        self.color[cell.index()] = color;
        self.played.insert(cell);
        self.update(cell, self.phase_radius);
        self.absorb();
    }

    /// Fill `cell` with `color` as ICE fill-in, without marking it played.
    pub fn add_color(&mut self, color: Color, cell: Cell) {
        debug_assert!(cell.is_interior());
        self.color[cell.index()] = color;
        self.update(cell, self.phase_radius);
        self.absorb();
    }

    /// Directly overwrite `cell`'s color (used to undo fill-in, e.g. when
    /// removing a winning side's captured cells per spec 4.3).
    pub fn set_color(&mut self, color: Color, cell: Cell) {
        debug_assert!(cell.is_interior());
        self.color[cell.index()] = color;
        self.played.remove(cell);
        self.update(cell, self.phase_radius);
        self.absorb();
    }

    /// Restore `cell` to empty (undoes `play`/`add_color`).
    pub fn undo(&mut self, cell: Cell) {
        debug_assert!(cell.is_interior());
        self.color[cell.index()] = Color::Empty;
        self.played.remove(cell);
        self.update(cell, self.phase_radius);
        self.absorb();
    }

    pub fn neighbors(&self, cell: Cell) -> [Option<Cell>; NUM_DIRECTIONS] {
        self.geom.neighbors(cell)
    }

    /// Every cell adjacent to `cell`, interior or edge alike. Interior
    /// cells delegate to `Geometry::neighbors`; edge sentinels (which
    /// `Geometry` has no direction table for) return every interior cell
    /// along the bordering row/column.
    pub fn adjacent_cells(&self, cell: Cell) -> Vec<Cell> {
        if cell.is_interior() {
            return self.geom.neighbors(cell).into_iter().flatten().collect();
        }
        self.geom
            .all_interior()
            .filter(|&c| self.geom.neighbors(c).into_iter().flatten().any(|n| n == cell))
            .collect()
    }

    /// Neighbors of `cell` matching a color predicate.
    pub fn neighbors_colored(&self, cell: Cell, want: Color) -> Vec<Cell> {
        self.neighbors(cell)
            .into_iter()
            .flatten()
            .filter(|&n| self.color(n) == want)
            .collect()
    }

    pub fn captain(&self, cell: Cell) -> Cell {
        self.group.find(cell)
    }

    pub fn adjacent(&self, a: Cell, b: Cell) -> bool {
        self.neighbors(a).into_iter().flatten().any(|n| n == b)
    }

    pub fn ring_godel(&self, cell: Cell) -> RingGodel {
        self.godel[cell.index()]
    }

    fn compute_godel(&self, cell: Cell) -> RingGodel {
        let mut g: RingGodel = 0;
        for (dir, n) in self.geom.neighbors(cell).into_iter().enumerate() {
            let code = match n {
                Some(n) => slice_code(self.color(n)),
                None => slice_code(Color::Empty),
            };
            g |= code << (dir * 2);
        }
        g
    }

    fn recompute_all_godels(&mut self) {
        for c in self.geom.all_interior() {
            self.godel[c.index()] = self.compute_godel(c);
        }
    }

    /// Recompute ring godels for every cell whose neighborhood lies within
    /// `radius` hex-steps of `cell` (i.e. every cell that could see `cell`
    /// as one of its own neighbor slices, transitively).
    pub fn update(&mut self, cell: Cell, radius: usize) {
        let mut frontier = vec![cell];
        let mut seen = CellSet::new(self.num_cells());
        seen.insert(cell);
        for _ in 0..=radius {
            let mut next = Vec::new();
            for &c in &frontier {
                if c.is_interior() {
                    let new_g = self.compute_godel(c);
                    self.godel[c.index()] = new_g;
                }
                for n in self.geom.neighbors(c).into_iter().flatten() {
                    if n.is_interior() && !seen.contains(n) {
                        seen.insert(n);
                        next.push(n);
                    }
                }
            }
            frontier = next;
        }
    }

    /// Shrink `play`/`add_color`/`set_color`/`undo`'s update radius to
    /// `PLAYOUT_UPDATE_RADIUS` for the duration of a rollout (spec 4.1:
    /// "only 1-ring patterns are consulted during random rollouts").
    pub fn enter_playout_phase(&mut self) {
        self.phase_radius = PLAYOUT_UPDATE_RADIUS;
    }

    /// Restore `TREE_UPDATE_RADIUS` on leaving a rollout, and re-run a full
    /// update pass so every godel reflects the playout's moves at the wider
    /// radius again, per spec 4.1's radius-restore guarantee.
    pub fn exit_playout_phase(&mut self) {
        self.phase_radius = TREE_UPDATE_RADIUS;
        self.recompute_all_godels();
    }

    /// Recompute the union-find group partition from the current stone
    /// colors: merges every same-color stone with all same-color neighbors
    /// (including edge sentinels), per spec 4.1.
    pub fn absorb(&mut self) {
        self.group.recompute(&self.geom, &self.color);
    }

    /// True iff `color` has a solid edge-to-edge chain of its own stones.
    pub fn has_solid_connection(&self, color: Color) -> bool {
        let (e1, e2) = color.edges();
        self.group.find(e1) == self.group.find(e2)
    }
}

/// Union-find over every `Cell` (edges included), merging same-color
/// neighbors into groups. Captains are deterministic (the lowest-index
/// member of each class), so two `Board`s reaching the same stone
/// configuration produce identical captain assignments.
#[derive(Clone)]
pub struct GroupBoard {
    parent: Vec<u16>,
    rank: Vec<u8>,
    members: HashMap<Cell, Vec<Cell>>,
}

impl GroupBoard {
    fn new(n: usize) -> GroupBoard {
        GroupBoard {
            parent: (0..n as u16).collect(),
            rank: vec![0; n],
            members: HashMap::new(),
        }
    }

    fn find_raw(&mut self, i: u16) -> u16 {
        if self.parent[i as usize] != i {
            let root = self.find_raw(self.parent[i as usize]);
            self.parent[i as usize] = root;
        }
        self.parent[i as usize]
    }

    fn union_raw(&mut self, a: u16, b: u16) {
        let (ra, rb) = (self.find_raw(a), self.find_raw(b));
        if ra == rb {
            return;
        }
        match self.rank[ra as usize].cmp(&self.rank[rb as usize]) {
            std::cmp::Ordering::Less => self.parent[ra as usize] = rb,
            std::cmp::Ordering::Greater => self.parent[rb as usize] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb as usize] = ra;
                self.rank[ra as usize] += 1;
            }
        }
    }

    pub fn find(&self, cell: Cell) -> Cell {
        // Path-compressed find requires `&mut self`; expose a read-only
        // version that walks to the root without mutating, used by callers
        // holding only `&Board`.
        let mut i = cell.0;
        while self.parent[i as usize] != i {
            i = self.parent[i as usize];
        }
        Cell(i)
    }

    /// The deterministic canonical captain of `cell`'s class: the
    /// lowest-index member, recomputed after every `recompute`.
    pub fn captain(&self, cell: Cell) -> Cell {
        self.find(cell)
    }

    pub fn members(&self, captain: Cell) -> &[Cell] {
        self.members.get(&captain).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Union of the empty neighbors of every member of `captain`'s class.
    pub fn empty_neighbors(&self, captain: Cell, board_geom: &Geometry, color: &[Color]) -> CellSet {
        let universe = color.len();
        let mut out = CellSet::new(universe);
        for &m in self.members(captain) {
            if !m.is_interior() {
                continue;
            }
            for n in board_geom.neighbors(m).into_iter().flatten() {
                if color[n.index()] == Color::Empty {
                    out.insert(n);
                }
            }
        }
        out
    }

    fn recompute(&mut self, geom: &Geometry, color: &[Color]) {
        let n = color.len();
        self.parent = (0..n as u16).collect();
        self.rank = vec![0; n];

        for cell in geom.all_interior() {
            let c = color[cell.index()];
            if c == Color::Empty || c == Color::Dead {
                continue;
            }
            for n in geom.neighbors(cell).into_iter().flatten() {
                if color[n.index()] == c {
                    self.union_raw(cell.0, n.0);
                }
            }
        }
        // Canonicalize: within each class, make the captain the minimal
        // index by re-rooting via a second pass (path splitting above
        // already guarantees `find` converges to a single representative
        // per class; pick the minimal index explicitly for determinism
        // independent of union-by-rank tie-breaking).
        let mut canonical: HashMap<u16, u16> = HashMap::new();
        for i in 0..n as u16 {
            let r = self.find_raw(i);
            let slot = canonical.entry(r).or_insert(i);
            if i < *slot {
                *slot = i;
            }
        }
        for i in 0..n as u16 {
            let r = self.find_raw(i);
            self.parent[i as usize] = canonical[&r];
        }

        self.members.clear();
        for i in 0..n as u16 {
            let cap = Cell(self.parent[i as usize]);
            self.members.entry(cap).or_default().push(Cell(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_board_has_no_solid_connection() {
        let b = Board::new(5, 5);
        assert!(!b.has_solid_connection(Color::Black));
        assert!(!b.has_solid_connection(Color::White));
    }

    #[test]
    fn edges_are_preplaced() {
        let b = Board::new(5, 5);
        assert_eq!(b.color(EDGE_NORTH), Color::Black);
        assert_eq!(b.color(EDGE_EAST), Color::White);
    }

    #[test]
    fn full_column_of_black_solidly_connects() {
        let mut b = Board::new(3, 3);
        for row in 0..3 {
            let c = b.geom.cell(0, row);
            b.play(Color::Black, c);
        }
        assert!(b.has_solid_connection(Color::Black));
        assert!(!b.has_solid_connection(Color::White));
    }

    #[test]
    fn undo_restores_empty_and_group_state() {
        let mut b = Board::new(4, 4);
        let before = b.group_board().clone();
        let cell = b.geom.cell(1, 1);
        b.play(Color::Black, cell);
        b.undo(cell);
        assert_eq!(b.color(cell), Color::Empty);
        assert_eq!(b.captain(EDGE_NORTH), before.captain(EDGE_NORTH));
    }

    #[test]
    fn ring_godel_reflects_neighbor_colors() {
        let mut b = Board::new(5, 5);
        let center = b.geom.cell(2, 2);
        let before = b.ring_godel(center);
        let n = b.geom.neighbor(center, 0).unwrap();
        b.play(Color::Black, n);
        let after = b.ring_godel(center);
        assert_ne!(before, after);
    }
}
