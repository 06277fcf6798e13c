pub mod chain;
pub mod chat;
pub mod error;
pub mod events;
pub mod models;
pub mod presets;
pub mod records;
pub mod runs;

pub use error::{DesignError, DesignResult};
