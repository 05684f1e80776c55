//! The closed set of action kinds and their behaviour.
//!
//! Composition is the whole game here: Think plans, Roam picks a spot,
//! DeterminePath searches, MoveByWaypoints peels cells, MoveTo walks one
//! leg. Each stage only ever inserts its successor relative to itself.

use std::collections::VecDeque;

use anyhow::Result;
use cgmath::{InnerSpace, Vector3};
use log::debug;
use rand::Rng;

use crate::components::wrap_angle;
use crate::pathfind::{Accessibility, GridPos, ManhattanHeuristic, WalkableSurface};
use crate::registry::{EntityId, EntityRegistry};
use crate::sim::TickCtx;

use super::{ActionApi, ActionSpec, EntryView, Lanes};

#[derive(Debug, Clone)]
pub enum ActionKind {
    /// Top-level planner. Runs only while first in the list and never
    /// finishes; weighted-random choice of what to do next.
    Think,
    /// Picks a random standable destination nearby and hands over to
    /// `DeterminePath`.
    Roam { radius: i32 },
    /// Runs the pathfinder. On success inserts `MoveByWaypoints`; on
    /// failure falls through to the continuation, when one is supplied.
    DeterminePath {
        target: GridPos,
        fallback: Option<Box<ActionSpec>>,
    },
    /// Peels waypoints one at a time into `MoveTo` legs.
    MoveByWaypoints { waypoints: VecDeque<GridPos> },
    /// Walks one leg: turn toward the target heading first, then move.
    MoveTo { target: Vector3<f32> },
    /// Barrier: finishes only once it is first in the list.
    Sync,
    /// Pure time gate.
    Delay { duration_ms: f64 },
}

impl ActionSpec {
    pub fn think() -> Self {
        Self::new(ActionKind::Think, Lanes::MOVEMENT, true)
    }

    pub fn roam(radius: i32) -> Self {
        Self::new(ActionKind::Roam { radius }, Lanes::MOVEMENT, true)
    }

    pub fn determine_path(target: GridPos, fallback: Option<ActionSpec>) -> Self {
        Self::new(
            ActionKind::DeterminePath {
                target,
                fallback: fallback.map(Box::new),
            },
            Lanes::MOVEMENT,
            true,
        )
    }

    pub fn move_by_waypoints(cells: impl IntoIterator<Item = GridPos>) -> Self {
        Self::new(
            ActionKind::MoveByWaypoints {
                waypoints: cells.into_iter().collect(),
            },
            Lanes::MOVEMENT,
            true,
        )
    }

    pub fn move_to(target: Vector3<f32>) -> Self {
        Self::new(ActionKind::MoveTo { target }, Lanes::MOVEMENT, true)
    }

    pub fn sync(lanes: Lanes) -> Self {
        Self::new(ActionKind::Sync, lanes, true)
    }

    pub fn delay(duration_ms: f64, lanes: Lanes) -> Self {
        Self::new(ActionKind::Delay { duration_ms }, lanes, true)
    }
}

pub(super) fn on_start(
    kind: &mut ActionKind,
    _ctx: &mut TickCtx,
    _registry: &mut EntityRegistry,
    id: EntityId,
) -> Result<()> {
    if let ActionKind::MoveTo { target } = kind {
        debug!("entity {id:?}: walking toward {target:?}");
    }
    Ok(())
}

pub(super) fn update(
    kind: &mut ActionKind,
    view: EntryView,
    api: &mut ActionApi,
    ctx: &mut TickCtx,
    registry: &mut EntityRegistry,
    id: EntityId,
) -> Result<()> {
    match kind {
        ActionKind::Think => think(view, api, ctx),
        ActionKind::Roam { radius } => roam(*radius, api, ctx, registry, id),
        ActionKind::DeterminePath { target, fallback } => {
            determine_path(*target, fallback, api, ctx, registry, id)
        }
        ActionKind::MoveByWaypoints { waypoints } => {
            match waypoints.pop_front() {
                Some(cell) => api.insert_in_front_of_me(ActionSpec::move_to(cell.center())),
                None => api.finish(),
            }
            Ok(())
        }
        ActionKind::MoveTo { target } => move_to(*target, api, ctx, registry, id),
        ActionKind::Sync => {
            if view.is_first {
                api.finish();
            }
            Ok(())
        }
        ActionKind::Delay { duration_ms } => {
            if view.elapsed_ms >= *duration_ms {
                api.finish();
            }
            Ok(())
        }
    }
}

pub(super) fn on_finish(
    kind: &mut ActionKind,
    _ctx: &mut TickCtx,
    registry: &mut EntityRegistry,
    id: EntityId,
) -> Result<()> {
    if let ActionKind::MoveTo { .. } = kind {
        if let Some(physics) = registry.physics_mut(id) {
            physics.velocity.x = 0.0;
            physics.velocity.z = 0.0;
        }
    }
    Ok(())
}

fn think(view: EntryView, api: &mut ActionApi, ctx: &mut TickCtx) -> Result<()> {
    if !view.is_first {
        return Ok(());
    }
    let ai = ctx.config.ai;
    let total = ai.roam_weight + ai.idle_weight;
    if total == 0 {
        return Ok(());
    }
    let roll = ctx.rng.stream("think").gen_range(0..total);
    if roll < ai.roam_weight {
        api.insert_in_front_of_me(ActionSpec::roam(ai.roam_radius));
    } else {
        api.insert_in_front_of_me(ActionSpec::delay(ai.idle_ms, Lanes::MOVEMENT));
    }
    Ok(())
}

fn roam(
    radius: i32,
    api: &mut ActionApi,
    ctx: &mut TickCtx,
    registry: &mut EntityRegistry,
    id: EntityId,
) -> Result<()> {
    let Some(position) = registry.position(id) else {
        api.finish();
        return Ok(());
    };
    let origin = GridPos::from_world(position.pos);

    let (dx, dz) = {
        let rng = ctx.rng.stream("roam");
        (rng.gen_range(-radius..=radius), rng.gen_range(-radius..=radius))
    };

    // Snap the sampled column to a standable cell, trying small vertical
    // offsets so slopes and single steps still produce destinations.
    let world = ctx.world.clone();
    let grid = world.grid();
    let target = [0, 1, -1, 2, -2].into_iter().find_map(|dy| {
        let cell = GridPos::new(origin.x + dx, origin.y + dy, origin.z + dz);
        WalkableSurface.can_stand(&*grid, cell).then_some(cell)
    });
    drop(grid);

    match target {
        Some(cell) if cell != origin => {
            api.insert_in_front_of_me(ActionSpec::determine_path(cell, None));
        }
        _ => debug!("entity {id:?}: no roam destination near {origin:?}"),
    }
    api.finish();
    Ok(())
}

fn determine_path(
    target: GridPos,
    fallback: &mut Option<Box<ActionSpec>>,
    api: &mut ActionApi,
    ctx: &mut TickCtx,
    registry: &mut EntityRegistry,
    id: EntityId,
) -> Result<()> {
    let Some(position) = registry.position(id) else {
        api.remove_self();
        return Ok(());
    };
    let origin = GridPos::from_world(position.pos);

    let world = ctx.world.clone();
    let grid = world.grid();
    let route = ctx.pathfinder.route(
        &*grid,
        origin,
        target,
        &WalkableSurface,
        &ManhattanHeuristic,
        ctx.config.pathfinder.max_expansions,
    );
    drop(grid);

    match route {
        Some(route) => {
            api.insert_in_front_of_me(ActionSpec::move_by_waypoints(route.cells));
            api.finish();
        }
        None => {
            debug!("entity {id:?}: no route {origin:?} -> {target:?}");
            if let Some(next) = fallback.take() {
                api.insert_in_front_of_me(*next);
            }
            api.remove_self();
        }
    }
    Ok(())
}

fn move_to(
    target: Vector3<f32>,
    api: &mut ActionApi,
    ctx: &mut TickCtx,
    registry: &mut EntityRegistry,
    id: EntityId,
) -> Result<()> {
    let movement = ctx.config.movement;
    let Some(position) = registry.position(id).copied() else {
        api.remove_self();
        return Ok(());
    };

    let to_target = target - position.pos;
    // Squared distance against the fixed threshold; no square root on
    // the per-tick path.
    if to_target.magnitude2() < movement.arrival_threshold * movement.arrival_threshold {
        api.finish();
        return Ok(());
    }

    let dt_s = (ctx.dt_ms / 1000.0) as f32;
    let planar = Vector3::new(to_target.x, 0.0, to_target.z);
    let mut new_yaw = position.yaw;
    let mut new_pos = position.pos;
    let mut velocity = Vector3::new(0.0, 0.0, 0.0);

    let aligned = if planar.magnitude2() > 1e-6 {
        let desired = planar.z.atan2(planar.x);
        let delta = wrap_angle(desired - position.yaw);
        if delta.abs() > movement.angle_tolerance {
            let step = movement.turn_rate * dt_s;
            new_yaw = wrap_angle(position.yaw + delta.clamp(-step, step));
            false
        } else {
            new_yaw = desired;
            true
        }
    } else {
        true
    };

    if aligned {
        let dist = to_target.magnitude();
        if dist > 1e-6 {
            let step = (movement.speed * dt_s).min(dist);
            let dir = to_target / dist;
            new_pos += dir * step;
            velocity = dir * movement.speed;
        }
    }

    if let Some(position) = registry.position_mut(id) {
        position.pos = new_pos;
        position.yaw = new_yaw;
    }
    if let Some(physics) = registry.physics_mut(id) {
        physics.velocity.x = velocity.x;
        physics.velocity.z = velocity.z;
    }
    Ok(())
}
