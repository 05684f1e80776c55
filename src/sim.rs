//! The simulation driver.
//!
//! One `Simulation` is one authoritative tick loop: it owns the registry,
//! the behaviour tables, the RNG, and the pathfinder, and threads them
//! through every behaviour as an explicit context. No global state, so
//! independent simulations (tests included) coexist in one process.

use anyhow::Result;
use log::trace;

use crate::behaviours::{BehaviourManager, Behaviours};
use crate::config::SimConfig;
use crate::pathfind::Pathfinder;
use crate::registry::{EntityId, EntityRegistry};
use crate::render::Renderer;
use crate::rng::RngManager;
use crate::world::WorldHandle;

/// Everything a behaviour or action may touch during one tick, besides
/// the registry itself.
pub struct TickCtx<'a> {
    pub tick: u64,
    pub dt_ms: f64,
    pub config: &'a SimConfig,
    pub rng: &'a mut RngManager,
    pub pathfinder: &'a mut Pathfinder,
    pub world: WorldHandle,
}

#[derive(Debug, Clone, Copy)]
pub struct TickSummary {
    pub tick: u64,
    pub entities: usize,
    pub slow_fired: bool,
}

pub struct Simulation {
    config: SimConfig,
    registry: EntityRegistry,
    manager: BehaviourManager,
    behaviours: Behaviours,
    rng: RngManager,
    pathfinder: Pathfinder,
    world: WorldHandle,
    tick: u64,
    since_slow_ms: f64,
}

impl Simulation {
    pub fn new(config: SimConfig, world: WorldHandle) -> Self {
        let mut registry = EntityRegistry::new();
        // The world is the canonical constant component.
        registry.set_constant(world.clone());
        let rng = RngManager::new(config.seed);
        Self {
            registry,
            manager: BehaviourManager::new(),
            behaviours: Behaviours::new(),
            rng,
            pathfinder: Pathfinder::new(),
            world,
            tick: 0,
            since_slow_ms: 0.0,
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn world(&self) -> &WorldHandle {
        &self.world
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn manager(&self) -> &BehaviourManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut BehaviourManager {
        &mut self.manager
    }

    pub fn behaviours_mut(&mut self) -> &mut Behaviours {
        &mut self.behaviours
    }

    /// Advances one tick using the configured tick length.
    pub fn step(&mut self) -> Result<TickSummary> {
        self.tick(self.config.tick.dt_ms)
    }

    /// Advances one tick of `dt_ms`. Runs every updateable behaviour for
    /// every live entity in id order, then, when the slow interval has
    /// elapsed, the `update50` pass with the measured elapsed time.
    pub fn tick(&mut self, dt_ms: f64) -> Result<TickSummary> {
        self.tick += 1;
        self.since_slow_ms += dt_ms;
        let slow_dt = if self.since_slow_ms >= self.config.tick.slow_interval_ms {
            let elapsed = self.since_slow_ms;
            self.since_slow_ms = 0.0;
            Some(elapsed)
        } else {
            None
        };

        let ids = self.registry.entity_ids();
        for &id in &ids {
            for kind in self.manager.updateable(id).to_vec() {
                let mut ctx = TickCtx {
                    tick: self.tick,
                    dt_ms,
                    config: &self.config,
                    rng: &mut self.rng,
                    pathfinder: &mut self.pathfinder,
                    world: self.world.clone(),
                };
                self.behaviours
                    .run_update(kind, &mut ctx, &mut self.registry, id)?;
            }
        }

        if let Some(elapsed) = slow_dt {
            for &id in &ids {
                for kind in self.manager.updateable(id).to_vec() {
                    let mut ctx = TickCtx {
                        tick: self.tick,
                        dt_ms,
                        config: &self.config,
                        rng: &mut self.rng,
                        pathfinder: &mut self.pathfinder,
                        world: self.world.clone(),
                    };
                    self.behaviours
                        .run_update50(kind, &mut ctx, &mut self.registry, id, elapsed)?;
                }
            }
        }

        trace!(
            "tick {} done, {} entities, slow={}",
            self.tick,
            ids.len(),
            slow_dt.is_some()
        );
        Ok(TickSummary {
            tick: self.tick,
            entities: ids.len(),
            slow_fired: slow_dt.is_some(),
        })
    }

    /// Runs every drawable behaviour for every live entity.
    pub fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        for id in self.registry.entity_ids() {
            for kind in self.manager.drawable(id).to_vec() {
                self.behaviours
                    .run_draw(kind, &self.registry, id, renderer)?;
            }
        }
        Ok(())
    }

    /// Removes the entity, its components, and its behaviour
    /// associations.
    pub fn destroy_entity(&mut self, id: EntityId) {
        self.manager.remove_all(id);
        self.registry.destroy(id);
    }
}
