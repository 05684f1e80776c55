//! AI driver: runs the entity's action plan every tick.

use anyhow::Result;
use log::warn;

use crate::actions::ActionSpec;
use crate::registry::{EntityId, EntityRegistry};
use crate::sim::TickCtx;

#[derive(Default)]
pub struct NpcBrainBehaviour;

impl NpcBrainBehaviour {
    /// One scheduler pass over the entity's plan. The plan is taken out
    /// of the registry for the duration so its actions can freely read
    /// and write the entity's other components.
    pub fn update(
        &mut self,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
    ) -> Result<()> {
        let Some(mut plan) = registry.take_plan(id) else {
            return Ok(());
        };
        if plan.is_empty() {
            plan.push_back(ActionSpec::think());
        }
        let result = plan.update(ctx, registry, id);
        registry.put_plan(id, plan);
        result
    }

    /// Slow-cadence sanity pass: sweep actions that have been running far
    /// longer than anything in the library legitimately takes, so one
    /// wedged action cannot stall its lane forever.
    pub fn update50(
        &mut self,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
        _slow_dt_ms: f64,
    ) -> Result<()> {
        let timeout = ctx.config.ai.stall_timeout_ms;
        if timeout <= 0.0 {
            return Ok(());
        }
        if let Some(plan) = registry.plan_mut(id) {
            let dropped = plan.clear_stalled(timeout);
            if dropped > 0 {
                warn!("entity {id:?}: swept {dropped} stalled action(s)");
            }
        }
        Ok(())
    }
}
