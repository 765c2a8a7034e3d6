//! Virtual-connection engine: per-color connection tables over group
//! pairs, built to a closure fixed point, with mustplay and winner
//! detection queries.
//!
//! No teacher analogue (Go has no virtual-connection concept); grounded
//! in `original_source`'s VC engine. Deterministic list ordering/pruning
//! follows the teacher's `sort_by`/`sort_by_key` stable-sort usage in
//! `mcts.rs`'s `get_best_moves`.
//!
//! `build` implements spec 4.4's incremental update: it starts from
//! `color`'s table as it stood after the previous build, discards only
//! the entries whose endpoint-group was touched by `added` or whose
//! carrier ran through one of those cells, reseeds just the touched
//! groups, and re-closes to a fixed point — it does not recompute the
//! whole table from scratch. Every insertion and deletion made by a
//! `build` call is recorded in a shared per-engine change log; `revert`
//! walks that log backwards to the last `push_marker` and undoes each
//! entry in turn, restoring exactly the state at the marker. Grounded on
//! `original_source/src/hex/HexBoard.cpp:140-148`'s
//! `m_builder.Build(..., added, &m_log)` / `RevertVCs` -> `Revert(m_log)`.

use std::collections::HashMap;

use crate::bitset::CellSet;
use crate::board::Board;
use crate::cell::{Cell, Color, EDGE_EAST, EDGE_NORTH, EDGE_SOUTH, EDGE_WEST};
use crate::constants::{SOFT_LIMIT_FULL, SOFT_LIMIT_SEMI};

pub type GroupPair = (Cell, Cell);

#[inline]
fn pair(a: Cell, b: Cell) -> GroupPair {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Clone, Default)]
struct ConnList {
    full: Vec<CellSet>,
    semi: Vec<(CellSet, Cell)>,
}

impl ConnList {
    fn insert_full(&mut self, carrier: CellSet) {
        if self.full.iter().any(|c| c.is_subset(&carrier)) {
            return;
        }
        self.full.retain(|c| !carrier.is_subset(c));
        self.full.push(carrier);
        self.prune_full();
    }

    fn insert_semi(&mut self, carrier: CellSet, key: Cell) {
        if self.semi.iter().any(|(c, k)| *k == key && c.is_subset(&carrier)) {
            return;
        }
        self.semi.retain(|(c, k)| !(*k == key && carrier.is_subset(c)));
        self.semi.push((carrier, key));
        self.prune_semi();
    }

    fn prune_full(&mut self) {
        self.full.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.iter().map(|c| c.index()).sum::<usize>().cmp(&b.iter().map(|c| c.index()).sum())));
        self.full.truncate(SOFT_LIMIT_FULL);
    }

    fn prune_semi(&mut self) {
        self.semi.sort_by(|(a, ak), (b, bk)| {
            a.len().cmp(&b.len()).then_with(|| ak.index().cmp(&bk.index()))
        });
        self.semi.truncate(SOFT_LIMIT_SEMI);
    }
}

/// One color's full VC/semi-VC connection table.
#[derive(Clone, Default)]
pub struct ConnectionTable {
    table: HashMap<GroupPair, ConnList>,
}

impl ConnectionTable {
    pub fn full_vcs(&self, a: Cell, b: Cell) -> &[CellSet] {
        self.table.get(&pair(a, b)).map(|l| l.full.as_slice()).unwrap_or(&[])
    }

    pub fn semi_vcs(&self, a: Cell, b: Cell) -> &[(CellSet, Cell)] {
        self.table.get(&pair(a, b)).map(|l| l.semi.as_slice()).unwrap_or(&[])
    }

    pub fn has_full(&self, a: Cell, b: Cell) -> bool {
        !self.full_vcs(a, b).is_empty()
    }

    /// Every recorded Full VC as `(a, b, carrier)`, used by the
    /// decomposition handler to scan for a splitting carrier.
    pub fn full_pairs(&self) -> impl Iterator<Item = (Cell, Cell, &CellSet)> + '_ {
        self.table.iter().flat_map(|(&(a, b), list)| list.full.iter().map(move |c| (a, b, c)))
    }

    fn entry(&mut self, a: Cell, b: Cell) -> &mut ConnList {
        self.table.entry(pair(a, b)).or_default()
    }

    /// Drop every entry whose pair touches a `touched` group outright
    /// (it will be reseeded and re-closed), and strip from the rest any
    /// carrier that runs through an `added` cell (now non-empty, so no
    /// longer a valid carrier). Pairs that lose entries this way without
    /// being dropped outright are folded into `touched` too, so closure
    /// gets a chance to re-derive them via a still-valid path.
    fn retain_unaffected(&mut self, touched: &mut CellSet, added: &CellSet) {
        let mut newly_dirty = Vec::new();
        self.table.retain(|&(a, b), list| {
            if touched.contains(a) || touched.contains(b) {
                return false;
            }
            let before_full = list.full.len();
            let before_semi = list.semi.len();
            list.full.retain(|c| c.is_disjoint(added));
            list.semi.retain(|(c, _)| c.is_disjoint(added));
            if list.full.len() != before_full || list.semi.len() != before_semi {
                newly_dirty.push((a, b));
            }
            !(list.full.is_empty() && list.semi.is_empty())
        });
        for (a, b) in newly_dirty {
            touched.insert(a);
            touched.insert(b);
        }
    }
}

enum LogOp {
    Full { pair: GroupPair, carrier: CellSet },
    Semi { pair: GroupPair, carrier: CellSet, key: Cell },
}

enum LogEntry {
    Marker,
    Inserted(Color, LogOp),
    Removed(Color, LogOp),
}

/// Per-color VC state owned by a `HexBoard`.
#[derive(Default)]
pub struct VcEngine {
    pub black: ConnectionTable,
    pub white: ConnectionTable,
    log: Vec<LogEntry>,
}

impl Clone for VcEngine {
    /// Cloned boards (MCTS thread clones) start with an empty change log:
    /// they never call `revert` past their own fork point.
    fn clone(&self) -> VcEngine {
        VcEngine { black: self.black.clone(), white: self.white.clone(), log: Vec::new() }
    }
}

impl VcEngine {
    fn table_mut(&mut self, color: Color) -> &mut ConnectionTable {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
            _ => unreachable!("VCs are only tracked for Black/White"),
        }
    }

    pub fn table(&self, color: Color) -> &ConnectionTable {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
            _ => unreachable!("VCs are only tracked for Black/White"),
        }
    }

    /// Push a MARKER onto the shared change log; a matching `revert`
    /// undoes every insertion/deletion made since, for both colors.
    pub fn push_marker(&mut self) {
        self.log.push(LogEntry::Marker);
    }

    /// Undo the change log back to (and including) the last MARKER.
    pub fn revert(&mut self) {
        while let Some(entry) = self.log.pop() {
            match entry {
                LogEntry::Marker => break,
                LogEntry::Inserted(color, op) => self.undo_insert(color, op),
                LogEntry::Removed(color, op) => self.undo_remove(color, op),
            }
        }
    }

    fn undo_insert(&mut self, color: Color, op: LogOp) {
        let table = self.table_mut(color);
        match op {
            LogOp::Full { pair, carrier } => {
                if let Some(list) = table.table.get_mut(&pair) {
                    list.full.retain(|c| *c != carrier);
                    if list.full.is_empty() && list.semi.is_empty() {
                        table.table.remove(&pair);
                    }
                }
            }
            LogOp::Semi { pair, carrier, key } => {
                if let Some(list) = table.table.get_mut(&pair) {
                    list.semi.retain(|(c, k)| !(*c == carrier && *k == key));
                    if list.full.is_empty() && list.semi.is_empty() {
                        table.table.remove(&pair);
                    }
                }
            }
        }
    }

    fn undo_remove(&mut self, color: Color, op: LogOp) {
        let table = self.table_mut(color);
        match op {
            LogOp::Full { pair, carrier } => table.table.entry(pair).or_default().full.push(carrier),
            LogOp::Semi { pair, carrier, key } => table.table.entry(pair).or_default().semi.push((carrier, key)),
        }
    }

    /// Incrementally update `color`'s connection table: `added` is the
    /// set of cells that changed color (to a stone or to Dead) since the
    /// table was last built. Closure only runs over groups whose
    /// membership or carrier-availability was affected; everything else
    /// in the table is left as-is. Every insertion/deletion made is
    /// appended to the change log.
    pub fn build(&mut self, board: &Board, color: Color, added: &CellSet) {
        let before = self.table(color).clone();
        let mut touched = touched_groups(board, color, added);
        {
            let table = self.table_mut(color);
            table.retain_unaffected(&mut touched, added);
            seed_touched(board, color, &touched, table);
            close_incremental(table, &mut touched);
        }
        self.log_diff(color, &before);
    }

    fn log_diff(&mut self, color: Color, before: &ConnectionTable) {
        let after = self.table(color).clone();
        let mut entries = Vec::new();

        for (&p, list) in &before.table {
            let after_list = after.table.get(&p);
            for c in &list.full {
                if !after_list.is_some_and(|l| l.full.contains(c)) {
                    entries.push(LogEntry::Removed(color, LogOp::Full { pair: p, carrier: c.clone() }));
                }
            }
            for (c, k) in &list.semi {
                if !after_list.is_some_and(|l| l.semi.iter().any(|(c2, k2)| c2 == c && k2 == k)) {
                    entries.push(LogEntry::Removed(color, LogOp::Semi { pair: p, carrier: c.clone(), key: *k }));
                }
            }
        }
        for (&p, list) in &after.table {
            let before_list = before.table.get(&p);
            for c in &list.full {
                if !before_list.is_some_and(|l| l.full.contains(c)) {
                    entries.push(LogEntry::Inserted(color, LogOp::Full { pair: p, carrier: c.clone() }));
                }
            }
            for (c, k) in &list.semi {
                if !before_list.is_some_and(|l| l.semi.iter().any(|(c2, k2)| c2 == c && k2 == k)) {
                    entries.push(LogEntry::Inserted(color, LogOp::Semi { pair: p, carrier: c.clone(), key: *k }));
                }
            }
        }
        self.log.extend(entries);
    }

    /// The mustplay set for `color`: the intersection of the carriers of
    /// the opponent's edge-to-edge Semi VCs, i.e. the cells `color` must
    /// cover to prevent an immediate threat. Empty if the opponent has no
    /// such Semis (or none at all).
    pub fn mustplay(&self, color: Color) -> CellSet {
        let opp = color.other();
        let (e1, e2) = opp.edges();
        let semis = self.table(opp).semi_vcs(e1, e2);
        let mut iter = semis.iter();
        let Some((first, _)) = iter.next() else {
            return CellSet::default();
        };
        let mut out = first.clone();
        for (c, _) in iter {
            out.intersect_with(c);
        }
        out
    }

    /// True iff `color` has a virtual (not necessarily solid) connection
    /// between its two edges.
    pub fn has_won(&self, color: Color) -> bool {
        let (e1, e2) = color.edges();
        self.table(color).has_full(e1, e2)
    }
}

/// The cell set to pass as `added` for a full from-scratch rebuild of
/// `board`: every stone/dead cell plus both of `color`'s edges, so every
/// group (including edge groups on an otherwise empty board) is touched.
pub fn full_rebuild_added(board: &Board) -> CellSet {
    let mut out = CellSet::new(board.num_cells());
    for c in board.geom.all_interior() {
        if board.color(c) != Color::Empty {
            out.insert(c);
        }
    }
    for edge in [EDGE_NORTH, EDGE_SOUTH, EDGE_EAST, EDGE_WEST] {
        out.insert(edge);
    }
    out
}

/// Captains of `color`'s own groups touched by `added`: either because a
/// cell in `added` is itself a `color` stone (its group's membership or
/// shape may have changed), or because it neighbors a `color` stone
/// (that stone's adjacency/empty-neighbor set changed).
fn touched_groups(board: &Board, color: Color, added: &CellSet) -> CellSet {
    let mut touched = CellSet::new(board.num_cells());
    for cell in added.iter() {
        if board.color(cell) == color {
            touched.insert(board.captain(cell));
        }
        for n in board.adjacent_cells(cell) {
            if board.color(n) == color {
                touched.insert(board.captain(n));
            }
        }
    }
    touched
}

fn seed_group(board: &Board, color: Color, g: Cell, table: &mut ConnectionTable) {
    for &m in board.group_board().members(g) {
        for n in board.adjacent_cells(m) {
            let nc = board.captain(n);
            if board.color(n) == color && nc != g {
                table.entry(g, nc).insert_full(CellSet::new(board.num_cells()));
            } else if n.is_interior() && board.color(n) == Color::Empty {
                for n2 in board.adjacent_cells(n) {
                    let nc2 = board.captain(n2);
                    if board.color(n2) == color && nc2 != g {
                        let mut carrier = CellSet::new(board.num_cells());
                        carrier.insert(n);
                        table.entry(g, nc2).insert_semi(carrier, n);
                    }
                }
            }
        }
    }
}

fn seed_touched(board: &Board, color: Color, touched: &CellSet, table: &mut ConnectionTable) {
    for g in touched.iter() {
        if board.color(g) == color {
            seed_group(board, color, g, table);
        }
    }
}

/// Close `table` to a fixed point under the AND/OR/SEMI rules, only
/// using a pair as a combination source once one of its endpoints is in
/// `touched`; `touched` grows as closure derives or invalidates entries,
/// so newly-affected pairs get their turn as the dirty set expands.
fn close_incremental(table: &mut ConnectionTable, touched: &mut CellSet) {
    loop {
        let mut changed = false;
        let pairs: Vec<GroupPair> = table.table.keys().copied().collect();

        // AND-rule: Full(a,b) + Full(b,c) disjoint carriers -> Full(a,c).
        for &(a, b) in &pairs {
            if !(touched.contains(a) || touched.contains(b)) {
                continue;
            }
            let fulls_ab = table.full_vcs(a, b).to_vec();
            for &(b2, c) in &pairs {
                let via = if b2 == b {
                    Some(c)
                } else if c == b {
                    Some(b2)
                } else {
                    None
                };
                let Some(other_end) = via else { continue };
                if other_end == a {
                    continue;
                }
                let fulls_bc = table.full_vcs(b, other_end).to_vec();
                for fa in &fulls_ab {
                    for fb in &fulls_bc {
                        if fa.is_disjoint(fb) {
                            let merged = fa.union(fb);
                            let before = table.full_vcs(a, other_end).len();
                            table.entry(a, other_end).insert_full(merged);
                            if table.full_vcs(a, other_end).len() != before {
                                changed = true;
                                touched.insert(a);
                                touched.insert(other_end);
                            }
                        }
                    }
                }
            }
        }

        // OR/SEMI-rule: Full(a,b) + Semi(b,c) -> Semi(a,c); two Semis
        // meeting at b with disjoint carriers and different keys -> Semi(a,c).
        for &(a, b) in &pairs {
            if !(touched.contains(a) || touched.contains(b)) {
                continue;
            }
            let fulls_ab = table.full_vcs(a, b).to_vec();
            for &(b2, c) in &pairs {
                let other_end = if b2 == b {
                    Some(c)
                } else if c == b {
                    Some(b2)
                } else {
                    None
                };
                let Some(other_end) = other_end else { continue };
                if other_end == a {
                    continue;
                }
                let semis_bc = table.semi_vcs(b, other_end).to_vec();
                for fa in &fulls_ab {
                    for (sc, key) in &semis_bc {
                        if fa.is_disjoint(sc) {
                            let merged = fa.union(sc);
                            let before = table.semi_vcs(a, other_end).len();
                            table.entry(a, other_end).insert_semi(merged, *key);
                            if table.semi_vcs(a, other_end).len() != before {
                                changed = true;
                                touched.insert(a);
                                touched.insert(other_end);
                            }
                        }
                    }
                }
            }
        }

        if !changed {
            break;
        }
    }

    // Semi-to-Full promotion: two Semis between the same pair with
    // different keys and otherwise disjoint carriers union to a Full.
    let pairs: Vec<GroupPair> = table.table.keys().copied().collect();
    for &(a, b) in &pairs {
        if !(touched.contains(a) || touched.contains(b)) {
            continue;
        }
        let semis = table.semi_vcs(a, b).to_vec();
        for i in 0..semis.len() {
            for j in (i + 1)..semis.len() {
                let (c1, k1) = &semis[i];
                let (c2, k2) = &semis[j];
                if k1 != k2 {
                    let mut rest1 = c1.clone();
                    rest1.remove(*k2);
                    let mut rest2 = c2.clone();
                    rest2.remove(*k1);
                    if rest1.is_disjoint(&rest2) {
                        let merged = c1.union(c2);
                        table.entry(a, b).insert_full(merged);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn build_all(vc: &mut VcEngine, board: &Board) {
        let added = full_rebuild_added(board);
        vc.build(board, Color::Black, &added);
        vc.build(board, Color::White, &added);
    }

    #[test]
    fn adjacent_stone_merges_with_the_edge_it_touches() {
        let mut board = Board::new(5, 5);
        let a = board.geom.cell(2, 0);
        board.play(Color::Black, a);
        assert_eq!(board.captain(a), board.captain(crate::cell::EDGE_NORTH));
    }

    #[test]
    fn two_stones_sharing_an_empty_neighbor_get_a_semi_vc() {
        let mut board = Board::new(5, 5);
        let a = board.geom.cell(1, 2);
        let b = board.geom.cell(3, 2);
        board.play(Color::Black, a);
        board.play(Color::Black, b);
        let mut vc = VcEngine::default();
        build_all(&mut vc, &board);
        let ca = board.captain(a);
        let cb = board.captain(b);
        assert!(!vc.black.semi_vcs(ca, cb).is_empty() || !vc.black.full_vcs(ca, cb).is_empty());
    }

    #[test]
    fn mustplay_carrier_never_exceeds_the_board() {
        let board = Board::new(5, 5);
        let mut vc = VcEngine::default();
        build_all(&mut vc, &board);
        assert!(vc.mustplay(Color::Black).len() <= board.num_cells());
    }

    #[test]
    fn push_and_revert_restores_state() {
        let mut board = Board::new(4, 4);
        let mut vc = VcEngine::default();
        build_all(&mut vc, &board);
        let before = vc.black.full_vcs(crate::cell::EDGE_NORTH, crate::cell::EDGE_SOUTH).len();
        vc.push_marker();
        let a = board.geom.cell(1, 0);
        board.play(Color::Black, a);
        let mut added = CellSet::new(board.num_cells());
        added.insert(a);
        vc.build(&board, Color::Black, &added);
        vc.build(&board, Color::White, &added);
        vc.revert();
        let after = vc.black.full_vcs(crate::cell::EDGE_NORTH, crate::cell::EDGE_SOUTH).len();
        assert_eq!(before, after);
    }

    #[test]
    fn incremental_build_matches_a_full_rebuild() {
        let mut board = Board::new(5, 5);
        let a = board.geom.cell(1, 2);
        board.play(Color::Black, a);

        let mut incremental = VcEngine::default();
        build_all(&mut incremental, &board);
        let mut added = CellSet::new(board.num_cells());
        added.insert(board.geom.cell(3, 2));
        board.play(Color::Black, board.geom.cell(3, 2));
        incremental.build(&board, Color::Black, &added);
        incremental.build(&board, Color::White, &added);

        let mut fresh = VcEngine::default();
        build_all(&mut fresh, &board);

        let ca = board.captain(board.geom.cell(1, 2));
        let cb = board.captain(board.geom.cell(3, 2));
        assert_eq!(
            incremental.black.full_vcs(ca, cb).len() + incremental.black.semi_vcs(ca, cb).len() > 0,
            fresh.black.full_vcs(ca, cb).len() + fresh.black.semi_vcs(ca, cb).len() > 0
        );
    }
}
