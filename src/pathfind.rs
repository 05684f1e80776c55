//! A* search over the block grid.
//!
//! Costs are small integers for determinism: 10 per lateral step, 14 when
//! two axes change, 17 when all three do. The open and closed containers
//! belong to the [`Pathfinder`] value and are cleared per call, so many
//! agents can search every tick without allocation churn.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use cgmath::Vector3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::world::BlockGrid;

pub const LATERAL_COST: u32 = 10;
pub const DIAGONAL_COST: u32 = 14;
pub const DIAGONAL3_COST: u32 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn from_world(p: Vector3<f32>) -> Self {
        Self {
            x: p.x.floor() as i32,
            y: p.y.floor() as i32,
            z: p.z.floor() as i32,
        }
    }

    /// World-space point an agent standing in this cell occupies: the
    /// horizontal centre, feet at the cell floor.
    pub fn center(self) -> Vector3<f32> {
        Vector3::new(self.x as f32 + 0.5, self.y as f32, self.z as f32 + 0.5)
    }
}

/// Policy answering "may an agent occupy this cell?".
pub trait Accessibility {
    fn can_stand(&self, grid: &dyn BlockGrid, cell: GridPos) -> bool;
}

/// Standard walking agent: solid footing below, the cell itself and the
/// headroom cell clear.
pub struct WalkableSurface;

impl Accessibility for WalkableSurface {
    fn can_stand(&self, grid: &dyn BlockGrid, cell: GridPos) -> bool {
        grid.is_solid(cell.x, cell.y - 1, cell.z)
            && !grid.is_solid(cell.x, cell.y, cell.z)
            && !grid.is_solid(cell.x, cell.y + 1, cell.z)
    }
}

/// Cost-to-go estimate. Admissibility is the caller's concern; an
/// inadmissible estimate degrades path quality, nothing more.
pub trait Heuristic {
    fn estimate(&self, from: GridPos, to: GridPos) -> u32;
}

/// Manhattan distance scaled by the lateral step cost. The default.
pub struct ManhattanHeuristic;

impl Heuristic for ManhattanHeuristic {
    fn estimate(&self, from: GridPos, to: GridPos) -> u32 {
        let dx = (from.x - to.x).unsigned_abs();
        let dy = (from.y - to.y).unsigned_abs();
        let dz = (from.z - to.z).unsigned_abs();
        (dx + dy + dz) * LATERAL_COST
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Cells in source-to-target order; the origin cell is not included.
    pub cells: Vec<GridPos>,
    /// Total weighted length.
    pub cost: u32,
}

struct NodeRecord {
    g: u32,
    h: u32,
    parent: Option<GridPos>,
    closed: bool,
}

type HeapKey = (i32, i32, i32);

pub struct Pathfinder {
    open: BinaryHeap<Reverse<(u32, HeapKey)>>,
    nodes: HashMap<GridPos, NodeRecord>,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Pathfinder {
    pub fn new() -> Self {
        Self {
            open: BinaryHeap::new(),
            nodes: HashMap::new(),
        }
    }

    /// Searches for a route. Returns `None` without searching when the
    /// target cell itself is inaccessible, and `None` when the open set
    /// drains or the expansion cap is hit before the target is reached.
    pub fn route(
        &mut self,
        grid: &dyn BlockGrid,
        from: GridPos,
        to: GridPos,
        access: &dyn Accessibility,
        heuristic: &dyn Heuristic,
        max_expansions: usize,
    ) -> Option<Route> {
        if !access.can_stand(grid, to) {
            return None;
        }
        if from == to {
            return Some(Route {
                cells: Vec::new(),
                cost: 0,
            });
        }

        self.open.clear();
        self.nodes.clear();

        let h0 = heuristic.estimate(from, to);
        self.nodes.insert(
            from,
            NodeRecord {
                g: 0,
                h: h0,
                parent: None,
                closed: false,
            },
        );
        self.open.push(Reverse((h0, key(from))));

        let mut expansions = 0usize;
        while let Some(Reverse((f, k))) = self.open.pop() {
            let pos = unkey(k);
            let (g_here, stale) = {
                let record = self.nodes.get_mut(&pos).expect("heap entry has a record");
                let stale = record.closed || f != record.g + record.h;
                if !stale {
                    record.closed = true;
                }
                (record.g, stale)
            };
            if stale {
                continue;
            }
            if pos == to {
                return Some(self.reconstruct(from, to));
            }
            expansions += 1;
            if expansions >= max_expansions {
                debug!("pathfind: expansion cap {max_expansions} hit, {from:?} -> {to:?}");
                return None;
            }

            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        if dx == 0 && dy == 0 && dz == 0 {
                            continue;
                        }
                        let next = GridPos::new(pos.x + dx, pos.y + dy, pos.z + dz);
                        if !access.can_stand(grid, next) {
                            continue;
                        }
                        // Stepping up needs headroom above the source cell.
                        if dy == 1 && grid.is_solid(pos.x, pos.y + 2, pos.z) {
                            continue;
                        }
                        let axes = dx.abs() + dy.abs() + dz.abs();
                        let step = match axes {
                            1 => LATERAL_COST,
                            2 => DIAGONAL_COST,
                            _ => DIAGONAL3_COST,
                        };
                        let g = g_here + step;
                        match self.nodes.get_mut(&next) {
                            Some(record) if g >= record.g => {}
                            Some(record) => {
                                // Cheaper path: relax, re-open if closed.
                                record.g = g;
                                record.parent = Some(pos);
                                record.closed = false;
                                self.open.push(Reverse((g + record.h, key(next))));
                            }
                            None => {
                                let h = heuristic.estimate(next, to);
                                self.nodes.insert(
                                    next,
                                    NodeRecord {
                                        g,
                                        h,
                                        parent: Some(pos),
                                        closed: false,
                                    },
                                );
                                self.open.push(Reverse((g + h, key(next))));
                            }
                        }
                    }
                }
            }
        }
        None
    }

    fn reconstruct(&self, from: GridPos, to: GridPos) -> Route {
        let cost = self.nodes[&to].g;
        let mut cells = Vec::new();
        let mut cursor = to;
        while cursor != from {
            cells.push(cursor);
            cursor = self.nodes[&cursor]
                .parent
                .expect("reached node has a parent chain to the source");
        }
        cells.reverse();
        Route { cells, cost }
    }
}

fn key(pos: GridPos) -> HeapKey {
    (pos.x, pos.y, pos.z)
}

fn unkey(k: HeapKey) -> GridPos {
    GridPos::new(k.0, k.1, k.2)
}
