//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Permaroute rewrite rule compiler CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: permaroute.toml)
    #[arg(short = 'C', long, global = true, default_value = "permaroute.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the compiled rewrite rule table
    #[command(visible_alias = "r")]
    Rules {
        /// Emit the table as a JSON object instead of aligned text
        #[arg(short, long)]
        json: bool,
    },

    /// Render Apache mod_rewrite directives for .htaccess
    #[command(visible_alias = "h")]
    Htaccess,

    /// Render IIS url-rewrite XML for web.config
    #[command(visible_alias = "w")]
    Webconfig {
        /// Wrap the rules in a full <configuration> document
        #[arg(short, long)]
        full: bool,
    },

    /// Resolve a pretty URL back to its query variables
    Resolve {
        /// Absolute URL or path to resolve
        #[arg(value_hint = clap::ValueHint::Url)]
        url: String,
    },

    /// Rebuild the cached rule table
    Flush {
        /// Also clear derived permalink state before rebuilding
        #[arg(long)]
        hard: bool,
    },
}
