pub mod config;
pub mod logging;

pub mod artifact;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod page;
pub mod path_resolver;
pub mod readiness;
pub mod session;
pub mod settings;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;
