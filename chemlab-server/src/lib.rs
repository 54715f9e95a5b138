//! `chemlab-server` serves the virtual chemistry lab: a static bench page plus
//! a small JSON API over the strict and creative assistants.

pub mod config;
pub mod reactants;
pub mod server;

pub use config::{EmbedderKind, ServerConfig};
pub use reactants::{REACTANTS, Reactant};
pub use server::{AppState, app_router, build_state, run_server, source_files};
