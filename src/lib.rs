//! Chaos Office - office-life multi-agent simulation core
//!
//! A fixed office floor, seven archetypes of workers, and a stack of
//! disturbances that knock them out of their routines. The crate is
//! headless: hosts call [`World::update`] once per frame, read a
//! [`WorldSnapshot`] and drain [`SimEvent`]s.

pub mod behavior;
pub mod core;
pub mod detectors;
pub mod entity;
pub mod spatial;
pub mod world;

pub use crate::core::config::{Population, SimulationConfig, Span};
pub use crate::core::error::{OfficeError, Result};
pub use crate::core::types::{AgentId, DeskId, Rect, Vec2};
pub use crate::entity::agent::{AgentState, Archetype};
pub use crate::world::{
    Command, FileUnlockStore, FixedClock, LogKind, MemoryUnlockStore, SimEvent, SystemClock, UnlockStore,
    WallClock, World, WorldBuilder, WorldSnapshot,
};
