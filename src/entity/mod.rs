//! Agents and their storage

pub mod agent;
pub mod names;
pub mod store;

pub use agent::{
    Agent, AgentState, Archetype, CatResponse, ChaosMode, GossipColor, MotionHistory, MotionSample, Role,
};
pub use store::{AgentStore, Others};
