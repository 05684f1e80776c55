//! Entity save/reload.
//!
//! An entity serializes to a self-contained JSON form: its template tag,
//! its savable components, and its behaviour associations. Action plans
//! are transient scheduling state and are not saved beyond a marker; a
//! reloaded entity restarts its plan from `Think`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::actions::ActionList;
use crate::behaviours::{BehaviourKind, BehaviourManager};
use crate::components::{Animation, Physics, Position, Scale};
use crate::registry::{Component, EntityId, EntityRegistry, TemplateKind};

#[derive(Debug, Serialize, Deserialize)]
pub struct EntityForm {
    pub template: Option<TemplateKind>,
    pub position: Option<Position>,
    pub scale: Option<Scale>,
    pub physics: Option<Physics>,
    pub animation: Option<Animation>,
    pub has_plan: bool,
    pub behaviours: Vec<BehaviourKind>,
}

/// Captures one entity as JSON. The entity stays in the registry; this is
/// a snapshot, not a move.
pub fn serialized_form(
    registry: &EntityRegistry,
    manager: &BehaviourManager,
    id: EntityId,
) -> Result<String> {
    let mut form = EntityForm {
        template: registry.template(id),
        position: None,
        scale: None,
        physics: None,
        animation: None,
        has_plan: false,
        behaviours: manager.kinds(id).to_vec(),
    };
    for component in registry.all_components(id) {
        match component {
            Component::Position(c) => form.position = Some(c),
            Component::Scale(c) => form.scale = Some(c),
            Component::Physics(c) => form.physics = Some(c),
            Component::Animation(c) => form.animation = Some(c),
            Component::Plan(_) => form.has_plan = true,
        }
    }
    serde_json::to_string(&form).with_context(|| format!("serializing entity {id:?}"))
}

/// Rebuilds an entity from its serialized form under a fresh id.
pub fn load_from_serialized(
    registry: &mut EntityRegistry,
    manager: &mut BehaviourManager,
    form: &str,
) -> Result<EntityId> {
    let form: EntityForm = serde_json::from_str(form).context("parsing entity form")?;
    let id = match form.template {
        Some(template) => registry.create_entity_with_template(template),
        None => registry.create_entity(),
    };
    if let Some(c) = form.position {
        registry.add_component(id, Component::Position(c))?;
    }
    if let Some(c) = form.scale {
        registry.add_component(id, Component::Scale(c))?;
    }
    if let Some(c) = form.physics {
        registry.add_component(id, Component::Physics(c))?;
    }
    if let Some(c) = form.animation {
        registry.add_component(id, Component::Animation(c))?;
    }
    if form.has_plan {
        registry.add_component(id, Component::Plan(ActionList::new()))?;
    }
    for kind in form.behaviours {
        manager.add(id, kind);
    }
    Ok(id)
}
