//! Behaviour kinds, dispatch, and the per-entity association manager.
//!
//! Behaviours are process-wide singletons: one instance of each kind is
//! constructed eagerly and shared by every entity it is associated with.
//! Any per-entity state a behaviour needs lives in a component. The set
//! of kinds is closed, so dispatch is a single `match` rather than a
//! virtual hierarchy.

mod animation;
mod item_spin;
mod model_draw;
mod npc_brain;
mod physics;

pub use animation::AnimationBehaviour;
pub use item_spin::ItemSpinBehaviour;
pub use model_draw::ModelDrawBehaviour;
pub use npc_brain::NpcBrainBehaviour;
pub use physics::PhysicsBehaviour;

use std::collections::HashMap;

use anyhow::Result;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::registry::{EntityId, EntityRegistry};
use crate::render::Renderer;
use crate::sim::TickCtx;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Passes: u8 {
        const UPDATE = 1;
        const DRAW = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviourKind {
    Physics,
    NpcBrain,
    Animation,
    ItemSpin,
    ModelDraw,
}

impl BehaviourKind {
    /// Which passes this kind participates in.
    pub fn passes(self) -> Passes {
        match self {
            BehaviourKind::Physics => Passes::UPDATE,
            BehaviourKind::NpcBrain => Passes::UPDATE,
            BehaviourKind::Animation => Passes::UPDATE,
            BehaviourKind::ItemSpin => Passes::UPDATE | Passes::DRAW,
            BehaviourKind::ModelDraw => Passes::DRAW,
        }
    }
}

/// The one-instance-per-kind table, built eagerly at startup.
#[derive(Default)]
pub struct Behaviours {
    pub physics: PhysicsBehaviour,
    pub npc_brain: NpcBrainBehaviour,
    pub animation: AnimationBehaviour,
    pub item_spin: ItemSpinBehaviour,
    pub model_draw: ModelDrawBehaviour,
}

impl Behaviours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_update(
        &mut self,
        kind: BehaviourKind,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
    ) -> Result<()> {
        match kind {
            BehaviourKind::Physics => self.physics.update(ctx, registry, id),
            BehaviourKind::NpcBrain => self.npc_brain.update(ctx, registry, id),
            BehaviourKind::Animation => self.animation.update(ctx, registry, id),
            BehaviourKind::ItemSpin => self.item_spin.update(ctx, registry, id),
            BehaviourKind::ModelDraw => Ok(()),
        }
    }

    /// Coarse-cadence hook. The driver passes the measured time since the
    /// previous slow tick; kinds without slow work ignore the call.
    pub fn run_update50(
        &mut self,
        kind: BehaviourKind,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
        slow_dt_ms: f64,
    ) -> Result<()> {
        match kind {
            BehaviourKind::NpcBrain => self.npc_brain.update50(ctx, registry, id, slow_dt_ms),
            _ => Ok(()),
        }
    }

    pub fn run_draw(
        &mut self,
        kind: BehaviourKind,
        registry: &EntityRegistry,
        id: EntityId,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        match kind {
            BehaviourKind::ItemSpin => self.item_spin.draw(registry, id, renderer),
            BehaviourKind::ModelDraw => self.model_draw.draw(registry, id, renderer),
            _ => Ok(()),
        }
    }
}

/// Per-entity behaviour associations, split into update and draw indices
/// so neither pass scans kinds that do not participate in it.
#[derive(Default)]
pub struct BehaviourManager {
    by_entity: HashMap<EntityId, Vec<BehaviourKind>>,
    updateable: HashMap<EntityId, Vec<BehaviourKind>>,
    drawable: HashMap<EntityId, Vec<BehaviourKind>>,
}

impl BehaviourManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a behaviour kind with the entity. Re-adding an existing
    /// association is a no-op; instances are never duplicated.
    pub fn add(&mut self, id: EntityId, kind: BehaviourKind) {
        let kinds = self.by_entity.entry(id).or_default();
        if kinds.contains(&kind) {
            return;
        }
        kinds.push(kind);
        let passes = kind.passes();
        if passes.contains(Passes::UPDATE) {
            self.updateable.entry(id).or_default().push(kind);
        }
        if passes.contains(Passes::DRAW) {
            self.drawable.entry(id).or_default().push(kind);
        }
    }

    pub fn remove(&mut self, id: EntityId, kind: BehaviourKind) {
        for index in [&mut self.by_entity, &mut self.updateable, &mut self.drawable] {
            if let Some(kinds) = index.get_mut(&id) {
                kinds.retain(|&k| k != kind);
                if kinds.is_empty() {
                    index.remove(&id);
                }
            }
        }
    }

    pub fn remove_all(&mut self, id: EntityId) {
        self.by_entity.remove(&id);
        self.updateable.remove(&id);
        self.drawable.remove(&id);
    }

    pub fn has(&self, id: EntityId, kind: BehaviourKind) -> bool {
        self.by_entity
            .get(&id)
            .is_some_and(|kinds| kinds.contains(&kind))
    }

    /// All associations for the entity, in insertion order. Empty when
    /// the entity has none; that is the common case, not an error.
    pub fn kinds(&self, id: EntityId) -> &[BehaviourKind] {
        self.by_entity.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn updateable(&self, id: EntityId) -> &[BehaviourKind] {
        self.updateable.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn drawable(&self, id: EntityId) -> &[BehaviourKind] {
        self.drawable.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Reverse lookup: every entity associated with `kind`, ascending.
    pub fn entities_with(&self, kind: BehaviourKind) -> Vec<EntityId> {
        let mut ids: Vec<_> = self
            .by_entity
            .iter()
            .filter(|(_, kinds)| kinds.contains(&kind))
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        ids
    }
}
