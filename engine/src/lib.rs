//! A single-threaded entity-component-system runtime.
//!
//! A [`World`](world::World) owns a fixed set of component pools, allocated once from a
//! [`WorldBuilder`](world::WorldBuilder) at construction. Entities are cheap integer
//! identifiers; components are added, read, and removed through an
//! [`Entity`](entity::Entity) / [`EntityMut`](entity::EntityMut) handle pair. Logic is
//! expressed as [`System`](system::System)s bound to [`Filter`](filter::Filter)s and
//! driven in declaration order by a [`Group`](system::Group).
//!
//! This crate does not provide a way to discover component types from host-language
//! reflection, a CLI, or a benchmark harness — those are treated as external
//! collaborators that embed the world/systems boundary described here.

// Lets the `Component` derive macro refer to `::ecs_core::component::Component` whether
// it is used from inside this crate's own tests or from a downstream crate.
extern crate self as ecs_core;

pub mod component;
pub mod entity;
pub mod error;
pub mod filter;
pub mod pool;
pub mod system;
pub mod world;

pub use ecs_core_macros::Component;
pub use entity::{Entity, EntityId, EntityMut};
pub use error::Error;
pub use filter::Filter;
pub use system::{Group, RemoveSingleFrame, System};
pub use world::{World, WorldBuilder};
