pub mod cli;
pub mod config;
pub mod crew;
pub mod knowledge;
pub mod llm;
pub mod memory;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use crew::{CrewContext, launch};
