use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use voxelsim::actions::ActionList;
use voxelsim::behaviours::BehaviourKind;
use voxelsim::components::{Animation, Physics, Position};
use voxelsim::registry::TemplateKind;
use voxelsim::render::RecordingRenderer;
use voxelsim::{Component, EntityId, MapWorld, SimConfig, Simulation, WorldHandle};

#[derive(Debug, Parser)]
#[command(author, version, about = "voxelsim sandbox runner")]
struct Cli {
    /// Path to a scenario YAML file (built-in sandbox when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of NPCs to spawn
    #[arg(long, default_value_t = 4)]
    npcs: u32,
}

fn spawn_npc(sim: &mut Simulation, x: f32, z: f32) -> Result<EntityId> {
    let id = sim
        .registry_mut()
        .create_entity_with_template(TemplateKind::Npc);
    let registry = sim.registry_mut();
    registry.add_component(id, Component::Position(Position::new(x, 0.0, z)))?;
    registry.add_component(id, Component::Physics(Physics::default()))?;
    registry.add_component(id, Component::Animation(Animation::looping(8, 120.0)))?;
    registry.add_component(id, Component::Plan(ActionList::new()))?;
    for kind in [
        BehaviourKind::NpcBrain,
        BehaviourKind::Physics,
        BehaviourKind::Animation,
        BehaviourKind::ModelDraw,
    ] {
        sim.manager_mut().add(id, kind);
    }
    Ok(id)
}

fn spawn_item(sim: &mut Simulation, x: f32, z: f32) -> Result<EntityId> {
    let id = sim
        .registry_mut()
        .create_entity_with_template(TemplateKind::Item);
    let registry = sim.registry_mut();
    registry.add_component(id, Component::Position(Position::new(x, 0.0, z)))?;
    for kind in [BehaviourKind::ItemSpin, BehaviourKind::ModelDraw] {
        sim.manager_mut().add(id, kind);
    }
    Ok(id)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.scenario {
        Some(path) => SimConfig::from_yaml(path)?,
        None => SimConfig::sandbox(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let world = WorldHandle::new(MapWorld::flat(-1));
    let mut sim = Simulation::new(config, world);

    for n in 0..cli.npcs {
        let offset = n as f32 * 2.0;
        spawn_npc(&mut sim, 0.5 + offset, 0.5)?;
    }
    spawn_item(&mut sim, -3.5, -3.5)?;

    let mut summary = None;
    for _ in 0..cli.ticks {
        summary = Some(sim.step()?);
    }

    let mut renderer = RecordingRenderer::default();
    sim.draw(&mut renderer)?;

    println!(
        "Scenario '{}' completed for {} ticks. {} entities, {} draw calls.",
        sim.config().name,
        summary.map_or(0, |s| s.tick),
        sim.registry().entity_count(),
        renderer.calls.len()
    );
    Ok(())
}
