//! IPC handler implementations.

pub mod health;
pub mod quantum;
