// server/src/cli/mod.rs

// Command-line interface of the knowledge-graph server: argument parsing
// and the serve/view entry points.

pub mod cli;

pub use cli::{start_cli, CliArgs, Commands};
