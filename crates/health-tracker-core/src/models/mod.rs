//! Domain models for the health tracker.

mod chat;
mod health_record;
mod stock;

pub use chat::*;
pub use health_record::*;
pub use stock::*;
