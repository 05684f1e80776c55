//! Entity/component registry.
//!
//! The component model is closed: every component type the simulation
//! knows is a variant of [`Component`], and storage is one typed table per
//! kind. Unknown component types are therefore unrepresentable, and the
//! hot-path lookup is a single map probe with no type-key hashing.
//!
//! Constant components (process-wide singletons such as the world handle)
//! live off the hot path in a type-keyed side table; asking for a missing
//! one is a wiring mistake and panics.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::ActionList;
use crate::components::{Animation, Physics, Position, Scale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

/// Which factory produced an entity; carried through save/reload so the
/// loader can rebuild archetype-specific wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateKind {
    Player,
    Npc,
    Item,
    Tool,
}

#[derive(Debug, Clone)]
pub enum Component {
    Position(Position),
    Scale(Scale),
    Physics(Physics),
    Animation(Animation),
    Plan(ActionList),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Position,
    Scale,
    Physics,
    Animation,
    Plan,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Position,
        ComponentKind::Scale,
        ComponentKind::Physics,
        ComponentKind::Animation,
        ComponentKind::Plan,
    ];
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Position(_) => ComponentKind::Position,
            Component::Scale(_) => ComponentKind::Scale,
            Component::Physics(_) => ComponentKind::Physics,
            Component::Animation(_) => ComponentKind::Animation,
            Component::Plan(_) => ComponentKind::Plan,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("entity {0:?} is not alive")]
    DeadEntity(EntityId),
    #[error("entity {entity:?} already has a {kind:?} component")]
    DuplicateComponent {
        entity: EntityId,
        kind: ComponentKind,
    },
}

#[derive(Debug, Default)]
struct EntityRecord {
    template: Option<TemplateKind>,
}

#[derive(Default)]
pub struct EntityRegistry {
    next_entity: u64,
    entities: HashMap<EntityId, EntityRecord>,
    positions: HashMap<EntityId, Position>,
    scales: HashMap<EntityId, Scale>,
    physics: HashMap<EntityId, Physics>,
    animations: HashMap<EntityId, Animation>,
    plans: HashMap<EntityId, ActionList>,
    constants: HashMap<TypeId, Box<dyn Any>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(id, EntityRecord::default());
        id
    }

    pub fn create_entity_with_template(&mut self, template: TemplateKind) -> EntityId {
        let id = self.create_entity();
        self.entities
            .get_mut(&id)
            .expect("entity record just inserted")
            .template = Some(template);
        id
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entity ids in ascending order, for deterministic iteration.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn template(&self, id: EntityId) -> Option<TemplateKind> {
        self.entities.get(&id).and_then(|record| record.template)
    }

    /// Attaches a component. At most one component of each kind may exist
    /// per entity; a second add without an intervening remove is a factory
    /// bug and is reported as an error.
    pub fn add_component(&mut self, id: EntityId, component: Component) -> Result<(), RegistryError> {
        if !self.is_alive(id) {
            return Err(RegistryError::DeadEntity(id));
        }
        let kind = component.kind();
        if self.has_component(id, kind) {
            return Err(RegistryError::DuplicateComponent { entity: id, kind });
        }
        match component {
            Component::Position(c) => {
                self.positions.insert(id, c);
            }
            Component::Scale(c) => {
                self.scales.insert(id, c);
            }
            Component::Physics(c) => {
                self.physics.insert(id, c);
            }
            Component::Animation(c) => {
                self.animations.insert(id, c);
            }
            Component::Plan(c) => {
                self.plans.insert(id, c);
            }
        }
        Ok(())
    }

    pub fn has_component(&self, id: EntityId, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Position => self.positions.contains_key(&id),
            ComponentKind::Scale => self.scales.contains_key(&id),
            ComponentKind::Physics => self.physics.contains_key(&id),
            ComponentKind::Animation => self.animations.contains_key(&id),
            ComponentKind::Plan => self.plans.contains_key(&id),
        }
    }

    /// Detaches one component; returns whether anything was removed.
    /// Absence is an expected condition, not an error.
    pub fn remove_component(&mut self, id: EntityId, kind: ComponentKind) -> bool {
        match kind {
            ComponentKind::Position => self.positions.remove(&id).is_some(),
            ComponentKind::Scale => self.scales.remove(&id).is_some(),
            ComponentKind::Physics => self.physics.remove(&id).is_some(),
            ComponentKind::Animation => self.animations.remove(&id).is_some(),
            ComponentKind::Plan => self.plans.remove(&id).is_some(),
        }
    }

    pub fn remove_all_components(&mut self, id: EntityId) {
        for kind in ComponentKind::ALL {
            self.remove_component(id, kind);
        }
    }

    /// Every component attached to the entity, in kind order. Used for
    /// bulk operations such as serialization.
    pub fn all_components(&self, id: EntityId) -> Vec<Component> {
        let mut out = Vec::new();
        if let Some(c) = self.positions.get(&id) {
            out.push(Component::Position(*c));
        }
        if let Some(c) = self.scales.get(&id) {
            out.push(Component::Scale(*c));
        }
        if let Some(c) = self.physics.get(&id) {
            out.push(Component::Physics(*c));
        }
        if let Some(c) = self.animations.get(&id) {
            out.push(Component::Animation(*c));
        }
        if let Some(c) = self.plans.get(&id) {
            out.push(Component::Plan(c.clone()));
        }
        out
    }

    /// Removes the entity record along with all of its components.
    /// Behaviour associations are the manager's to clean up.
    pub fn destroy(&mut self, id: EntityId) {
        self.remove_all_components(id);
        self.entities.remove(&id);
    }

    pub fn position(&self, id: EntityId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn position_mut(&mut self, id: EntityId) -> Option<&mut Position> {
        self.positions.get_mut(&id)
    }

    pub fn scale(&self, id: EntityId) -> Option<&Scale> {
        self.scales.get(&id)
    }

    pub fn scale_mut(&mut self, id: EntityId) -> Option<&mut Scale> {
        self.scales.get_mut(&id)
    }

    pub fn physics(&self, id: EntityId) -> Option<&Physics> {
        self.physics.get(&id)
    }

    pub fn physics_mut(&mut self, id: EntityId) -> Option<&mut Physics> {
        self.physics.get_mut(&id)
    }

    pub fn animation(&self, id: EntityId) -> Option<&Animation> {
        self.animations.get(&id)
    }

    pub fn animation_mut(&mut self, id: EntityId) -> Option<&mut Animation> {
        self.animations.get_mut(&id)
    }

    pub fn plan(&self, id: EntityId) -> Option<&ActionList> {
        self.plans.get(&id)
    }

    pub fn plan_mut(&mut self, id: EntityId) -> Option<&mut ActionList> {
        self.plans.get_mut(&id)
    }

    /// Detaches the action plan so it can run against the rest of the
    /// registry without aliasing itself. Pair with [`put_plan`].
    ///
    /// [`put_plan`]: EntityRegistry::put_plan
    pub fn take_plan(&mut self, id: EntityId) -> Option<ActionList> {
        self.plans.remove(&id)
    }

    pub fn put_plan(&mut self, id: EntityId, plan: ActionList) {
        self.plans.insert(id, plan);
    }

    pub fn set_constant<T: 'static>(&mut self, value: T) {
        self.constants.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn has_constant<T: 'static>(&self) -> bool {
        self.constants.contains_key(&TypeId::of::<T>())
    }

    /// Looks up a singleton component shared by all entities. A missing
    /// constant is a wiring error, so this fails loudly.
    pub fn constant<T: 'static>(&self) -> &T {
        self.constants
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .unwrap_or_else(|| {
                panic!(
                    "constant component {} was never registered",
                    type_name::<T>()
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_returns_component() {
        let mut registry = EntityRegistry::new();
        let id = registry.create_entity();

        registry
            .add_component(id, Component::Position(Position::new(1.0, 2.0, 3.0)))
            .unwrap();

        let position = registry.position(id).unwrap();
        assert_eq!(position.pos.x, 1.0);
        assert_eq!(position.pos.z, 3.0);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut registry = EntityRegistry::new();
        let id = registry.create_entity();

        registry
            .add_component(id, Component::Physics(Physics::default()))
            .unwrap();
        let err = registry
            .add_component(id, Component::Physics(Physics::default()))
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::DuplicateComponent {
                kind: ComponentKind::Physics,
                ..
            }
        ));
    }

    #[test]
    fn add_to_dead_entity_is_rejected() {
        let mut registry = EntityRegistry::new();
        let id = registry.create_entity();
        registry.destroy(id);

        let err = registry
            .add_component(id, Component::Scale(Scale::default()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DeadEntity(_)));
    }

    #[test]
    fn remove_all_does_not_leak_across_entities() {
        let mut registry = EntityRegistry::new();
        let a = registry.create_entity();
        let b = registry.create_entity();
        for id in [a, b] {
            registry
                .add_component(id, Component::Position(Position::new(0.0, 0.0, 0.0)))
                .unwrap();
            registry
                .add_component(id, Component::Physics(Physics::default()))
                .unwrap();
        }

        registry.remove_all_components(a);

        assert!(registry.all_components(a).is_empty());
        assert_eq!(registry.all_components(b).len(), 2);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut registry = EntityRegistry::new();
        let a = registry.create_entity();
        registry.destroy(a);
        let b = registry.create_entity();

        assert_ne!(a, b);
        assert!(!registry.is_alive(a));
        assert!(registry.is_alive(b));
    }

    #[test]
    fn template_tag_round_trips() {
        let mut registry = EntityRegistry::new();
        let npc = registry.create_entity_with_template(TemplateKind::Npc);
        let anon = registry.create_entity();

        assert_eq!(registry.template(npc), Some(TemplateKind::Npc));
        assert_eq!(registry.template(anon), None);
    }

    #[test]
    fn constants_are_typed_singletons() {
        struct Gravity(f32);

        let mut registry = EntityRegistry::new();
        assert!(!registry.has_constant::<Gravity>());

        registry.set_constant(Gravity(-24.0));
        assert!(registry.has_constant::<Gravity>());
        assert_eq!(registry.constant::<Gravity>().0, -24.0);
    }

    #[test]
    #[should_panic(expected = "never registered")]
    fn missing_constant_panics() {
        struct Missing;
        let registry = EntityRegistry::new();
        registry.constant::<Missing>();
    }
}
