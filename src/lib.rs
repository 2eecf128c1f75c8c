pub mod config;
pub mod launch;
