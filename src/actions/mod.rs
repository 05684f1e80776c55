//! Cooperative per-entity action scheduling.
//!
//! An [`ActionList`] is a component: one ordered task queue per entity.
//! Actions never touch the list directly; during an update they queue
//! structural edits relative to themselves through [`ActionApi`], and the
//! list applies the edits once the action returns. That keeps actions
//! composable without back-references into their owner.
//!
//! "Blocking" never blocks the tick thread. A blocking action claims its
//! lanes for the rest of the pass, so later actions sharing a lane simply
//! report no progress until it finishes.

mod library;

pub use library::ActionKind;

use anyhow::Result;
use bitflags::bitflags;

use crate::registry::{EntityId, EntityRegistry};
use crate::sim::TickCtx;

bitflags! {
    /// Concurrency partitions within one entity's list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Lanes: u8 {
        const MOVEMENT = 1;
        const HANDS = 1 << 1;
        const AUX = 1 << 2;
    }
}

/// A detached action: what to run, where, and whether it serializes its
/// lanes. Insert it into a list to start its lifecycle.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub lanes: Lanes,
    pub blocking: bool,
}

impl ActionSpec {
    pub fn new(kind: ActionKind, lanes: Lanes, blocking: bool) -> Self {
        Self {
            kind,
            lanes,
            blocking,
        }
    }

    pub fn non_blocking(mut self) -> Self {
        self.blocking = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ActionEntry {
    pub kind: ActionKind,
    pub lanes: Lanes,
    pub blocking: bool,
    pub started: bool,
    pub finished: bool,
    pub elapsed_ms: f64,
}

impl From<ActionSpec> for ActionEntry {
    fn from(spec: ActionSpec) -> Self {
        Self {
            kind: spec.kind,
            lanes: spec.lanes,
            blocking: spec.blocking,
            started: false,
            finished: false,
            elapsed_ms: 0.0,
        }
    }
}

/// Read-only view of the running entry handed to its update.
#[derive(Debug, Clone, Copy)]
pub struct EntryView {
    pub elapsed_ms: f64,
    pub is_first: bool,
}

/// Edit buffer an action fills during its update; applied by the list
/// afterwards.
#[derive(Debug, Default)]
pub struct ActionApi {
    at_start: Vec<ActionSpec>,
    before: Vec<ActionSpec>,
    after: Vec<ActionSpec>,
    finish: bool,
    remove_self: bool,
}

impl ActionApi {
    pub fn insert_at_start(&mut self, spec: ActionSpec) {
        self.at_start.push(spec);
    }

    pub fn insert_in_front_of_me(&mut self, spec: ActionSpec) {
        self.before.push(spec);
    }

    pub fn insert_after_me(&mut self, spec: ActionSpec) {
        self.after.push(spec);
    }

    /// Marks the action terminal; the list removes it on the next pass
    /// and runs its `on_finish`.
    pub fn finish(&mut self) {
        self.finish = true;
    }

    /// Leaves the list immediately, skipping `on_finish`. Used to hand
    /// over to a successor without announcing completion.
    pub fn remove_self(&mut self) {
        self.remove_self = true;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionList {
    entries: Vec<ActionEntry>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ActionEntry] {
        &self.entries
    }

    /// External insertion point for factories and brains: appends at the
    /// back of the list.
    pub fn push_back(&mut self, spec: ActionSpec) {
        self.entries.push(spec.into());
    }

    /// Drops started non-Think entries older than `timeout_ms` without
    /// running `on_finish`. Returns how many were dropped. The slow-tick
    /// sanity pass uses this to unwedge a stalled lane.
    pub fn clear_stalled(&mut self, timeout_ms: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| {
            matches!(entry.kind, ActionKind::Think)
                || !entry.started
                || entry.elapsed_ms < timeout_ms
        });
        before - self.entries.len()
    }

    /// One scheduler pass: finished entries from the previous pass are
    /// retired, then every runnable entry advances. An entry is runnable
    /// when no earlier blocking entry has claimed one of its lanes.
    pub fn update(
        &mut self,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
    ) -> Result<()> {
        self.retire_finished(ctx, registry, id)?;

        let mut claimed = Lanes::empty();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].finished {
                i += 1;
                continue;
            }
            if self.entries[i].lanes.intersects(claimed) {
                // Still in line. A waiting blocking entry extends the
                // claim so entries behind it keep their order too.
                if self.entries[i].blocking {
                    claimed |= self.entries[i].lanes;
                }
                i += 1;
                continue;
            }

            let mut api = ActionApi::default();
            {
                let is_first = i == 0;
                let entry = &mut self.entries[i];
                if !entry.started {
                    entry.started = true;
                    library::on_start(&mut entry.kind, ctx, registry, id)?;
                }
                entry.elapsed_ms += ctx.dt_ms;
                let view = EntryView {
                    elapsed_ms: entry.elapsed_ms,
                    is_first,
                };
                library::update(&mut entry.kind, view, &mut api, ctx, registry, id)?;
            }

            if api.finish {
                self.entries[i].finished = true;
            }
            if self.entries[i].blocking && !self.entries[i].finished && !api.remove_self {
                claimed |= self.entries[i].lanes;
            }

            i = self.apply_edits(i, api);
        }
        Ok(())
    }

    /// Applies one action's queued edits and returns the next cursor
    /// position. Freshly inserted entries first run on a later pass.
    fn apply_edits(&mut self, index: usize, api: ActionApi) -> usize {
        let ActionApi {
            at_start,
            before,
            after,
            finish: _,
            remove_self,
        } = api;

        let start_count = at_start.len();
        for (offset, spec) in at_start.into_iter().enumerate() {
            self.entries.insert(offset, spec.into());
        }
        let before_count = before.len();
        let mut slot = index + start_count;
        for (offset, spec) in before.into_iter().enumerate() {
            self.entries.insert(slot + offset, spec.into());
        }
        slot += before_count;

        let after_count = after.len();
        if remove_self {
            self.entries.remove(slot);
            for (offset, spec) in after.into_iter().enumerate() {
                self.entries.insert(slot + offset, spec.into());
            }
            slot + after_count
        } else {
            for (offset, spec) in after.into_iter().enumerate() {
                self.entries.insert(slot + 1 + offset, spec.into());
            }
            slot + 1 + after_count
        }
    }

    fn retire_finished(
        &mut self,
        ctx: &mut TickCtx,
        registry: &mut EntityRegistry,
        id: EntityId,
    ) -> Result<()> {
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].finished {
                let mut entry = self.entries.remove(i);
                library::on_finish(&mut entry.kind, ctx, registry, id)?;
            } else {
                i += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::pathfind::Pathfinder;
    use crate::rng::RngManager;
    use crate::world::{MapWorld, WorldHandle};

    struct Fixture {
        config: SimConfig,
        rng: RngManager,
        pathfinder: Pathfinder,
        world: WorldHandle,
        registry: EntityRegistry,
        id: EntityId,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SimConfig::sandbox();
            let mut registry = EntityRegistry::new();
            let id = registry.create_entity();
            Self {
                rng: RngManager::new(config.seed),
                pathfinder: Pathfinder::new(),
                world: WorldHandle::new(MapWorld::flat(-1)),
                config,
                registry,
                id,
            }
        }

        fn tick(&mut self, list: &mut ActionList, dt_ms: f64) {
            let mut ctx = TickCtx {
                tick: 0,
                dt_ms,
                config: &self.config,
                rng: &mut self.rng,
                pathfinder: &mut self.pathfinder,
                world: self.world.clone(),
            };
            list.update(&mut ctx, &mut self.registry, self.id).unwrap();
        }
    }

    fn delay(ms: f64, lanes: Lanes) -> ActionSpec {
        ActionSpec::new(ActionKind::Delay { duration_ms: ms }, lanes, true)
    }

    #[test]
    fn delay_finishes_after_duration() {
        let mut fx = Fixture::new();
        let mut list = ActionList::new();
        list.push_back(delay(30.0, Lanes::MOVEMENT));

        fx.tick(&mut list, 16.0);
        assert!(!list.entries()[0].finished);
        fx.tick(&mut list, 16.0);
        assert!(list.entries()[0].finished);
        fx.tick(&mut list, 16.0); // retired on the next pass
        assert!(list.is_empty());
    }

    #[test]
    fn blocking_actions_serialize_within_a_lane() {
        let mut fx = Fixture::new();
        let mut list = ActionList::new();
        list.push_back(delay(30.0, Lanes::MOVEMENT));
        list.push_back(delay(30.0, Lanes::MOVEMENT));

        fx.tick(&mut list, 16.0);
        assert!(list.entries()[0].elapsed_ms > 0.0);
        assert_eq!(list.entries()[1].elapsed_ms, 0.0);

        fx.tick(&mut list, 16.0); // first finishes
        fx.tick(&mut list, 16.0); // first retired, second starts
        assert_eq!(list.len(), 1);
        assert!(list.entries()[0].elapsed_ms > 0.0);
    }

    #[test]
    fn non_blocking_actions_on_distinct_lanes_share_a_tick() {
        let mut fx = Fixture::new();
        let mut list = ActionList::new();
        list.push_back(delay(100.0, Lanes::MOVEMENT).non_blocking());
        list.push_back(delay(100.0, Lanes::HANDS).non_blocking());

        fx.tick(&mut list, 16.0);
        assert!(list.entries()[0].elapsed_ms > 0.0);
        assert!(list.entries()[1].elapsed_ms > 0.0);
    }

    #[test]
    fn non_blocking_actions_may_share_a_lane() {
        let mut fx = Fixture::new();
        let mut list = ActionList::new();
        list.push_back(delay(100.0, Lanes::MOVEMENT).non_blocking());
        list.push_back(delay(100.0, Lanes::MOVEMENT).non_blocking());

        fx.tick(&mut list, 16.0);
        assert!(list.entries()[0].elapsed_ms > 0.0);
        assert!(list.entries()[1].elapsed_ms > 0.0);
    }

    #[test]
    fn blocked_blocking_entry_extends_the_claim() {
        let mut fx = Fixture::new();
        let mut list = ActionList::new();
        list.push_back(delay(100.0, Lanes::MOVEMENT));
        list.push_back(delay(100.0, Lanes::MOVEMENT | Lanes::HANDS));
        list.push_back(delay(100.0, Lanes::HANDS));

        fx.tick(&mut list, 16.0);
        assert!(list.entries()[0].elapsed_ms > 0.0);
        assert_eq!(list.entries()[1].elapsed_ms, 0.0);
        // Third shares only HANDS with the waiting second, but order
        // within a lane still holds.
        assert_eq!(list.entries()[2].elapsed_ms, 0.0);
    }

    #[test]
    fn sync_waits_until_first() {
        let mut fx = Fixture::new();
        let mut list = ActionList::new();
        list.push_back(delay(30.0, Lanes::MOVEMENT).non_blocking());
        list.push_back(ActionSpec::sync(Lanes::MOVEMENT));

        fx.tick(&mut list, 16.0);
        assert!(!list.entries()[1].finished);

        fx.tick(&mut list, 16.0); // delay finishes
        fx.tick(&mut list, 16.0); // delay retired; sync becomes first
        assert!(list.entries()[0].finished);
        fx.tick(&mut list, 16.0);
        assert!(list.is_empty());
    }

    #[test]
    fn edits_at_list_head_shift_the_cursor_past_the_running_entry() {
        let mut list = ActionList::new();
        list.push_back(delay(10.0, Lanes::MOVEMENT));
        list.push_back(delay(20.0, Lanes::HANDS));

        // The entry at index 1 prepends a new list head mid-update.
        let mut api = ActionApi::default();
        api.insert_at_start(delay(5.0, Lanes::AUX));
        let cursor = list.apply_edits(1, api);

        assert_eq!(list.len(), 3);
        assert!(matches!(
            list.entries()[0].kind,
            ActionKind::Delay { duration_ms } if duration_ms == 5.0
        ));
        assert!(matches!(
            list.entries()[2].kind,
            ActionKind::Delay { duration_ms } if duration_ms == 20.0
        ));
        // The running entry slid to index 2; the cursor lands after it.
        assert_eq!(cursor, 3);
    }

    #[test]
    fn combined_edits_keep_relative_order() {
        let mut list = ActionList::new();
        list.push_back(delay(10.0, Lanes::MOVEMENT));

        let mut api = ActionApi::default();
        api.insert_in_front_of_me(delay(1.0, Lanes::AUX));
        api.insert_in_front_of_me(delay(2.0, Lanes::AUX));
        api.insert_after_me(delay(3.0, Lanes::AUX));
        let cursor = list.apply_edits(0, api);

        let durations: Vec<f64> = list
            .entries()
            .iter()
            .map(|entry| match entry.kind {
                ActionKind::Delay { duration_ms } => duration_ms,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(durations, vec![1.0, 2.0, 10.0, 3.0]);
        assert_eq!(cursor, 4);
    }

    #[test]
    fn remove_self_splices_successors_in_place() {
        let mut list = ActionList::new();
        list.push_back(delay(10.0, Lanes::MOVEMENT));
        list.push_back(delay(20.0, Lanes::HANDS));

        let mut api = ActionApi::default();
        api.insert_after_me(delay(3.0, Lanes::AUX));
        api.remove_self();
        let cursor = list.apply_edits(0, api);

        let durations: Vec<f64> = list
            .entries()
            .iter()
            .map(|entry| match entry.kind {
                ActionKind::Delay { duration_ms } => duration_ms,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(durations, vec![3.0, 20.0]);
        assert_eq!(cursor, 1);
    }

    #[test]
    fn clear_stalled_spares_think_and_unstarted() {
        let mut fx = Fixture::new();
        let mut list = ActionList::new();
        list.push_back(delay(60_000.0, Lanes::MOVEMENT));
        list.push_back(delay(60_000.0, Lanes::MOVEMENT)); // never starts
        list.push_back(ActionSpec::new(ActionKind::Think, Lanes::MOVEMENT, true));

        for _ in 0..10 {
            fx.tick(&mut list, 16.0);
        }

        let dropped = list.clear_stalled(100.0);
        assert_eq!(dropped, 1);
        assert_eq!(list.len(), 2);
        assert!(!list.entries()[0].started);
        assert!(matches!(list.entries()[1].kind, ActionKind::Think));
    }
}
