// src/core/mod.rs
//! Configuration, personas and CSV plumbing shared by the CLI and the API

pub mod config_manager;
pub mod csv_io;
pub mod persona;

pub use config_manager::{ConfigManager, ModelProvider, Settings};
pub use persona::Persona;
