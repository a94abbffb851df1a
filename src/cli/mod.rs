//! Command-line interface module.

mod args;
pub mod common;
pub mod flush;
pub mod render;
pub mod resolve;
pub mod rules;

pub use args::{Cli, Commands};
