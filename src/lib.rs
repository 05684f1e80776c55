//! Voxel sandbox simulation core.
//!
//! The crate is the runtime heart of a voxel sandbox: an entity/component
//! registry with a closed component model, singleton behaviours dispatched
//! per entity per tick, a cooperative per-entity action scheduler for AI,
//! and a grid pathfinder. Terrain generation, rendering backends, and
//! networking live outside; this crate only consumes a [`world::BlockGrid`]
//! and produces [`render::DrawCall`]s.

pub mod actions;
pub mod behaviours;
pub mod components;
pub mod config;
pub mod pathfind;
pub mod persist;
pub mod registry;
pub mod render;
pub mod rng;
pub mod sim;
pub mod world;

pub use config::SimConfig;
pub use registry::{Component, EntityId, EntityRegistry};
pub use sim::{Simulation, TickCtx, TickSummary};
pub use world::{BlockGrid, MapWorld, WorldHandle};
