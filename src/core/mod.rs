pub mod config;
pub mod error;
pub mod types;

pub use config::{Population, SimulationConfig, Span};
pub use error::{OfficeError, Result};
