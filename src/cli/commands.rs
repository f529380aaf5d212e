//! Command definitions and structures for the CLI
//!
//! This module contains all the clap-based command line argument definitions,
//! including the main CLI structure and all subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "cli-forge")]
#[command(about = "Generate multi-language CLI applications from one declarative description")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project path for project-level configuration
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Explicit configuration file (overrides project and global lookup)
    #[arg(long, global = true, env = "CLI_FORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate CLI code for one or more targets
    Generate {
        /// CLI description (YAML, TOML or JSON)
        #[arg(value_name = "CONFIG")]
        input: PathBuf,

        /// Target to generate; repeatable. Defaults to generation.targets
        #[arg(short = 't', long = "target", value_name = "TARGET")]
        targets: Vec<String>,

        /// Output directory; each target is written to a subdirectory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would be written without touching the disk
        #[arg(long)]
        dry_run: bool,

        /// Render targets one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Check a CLI description and summarise its command tree
    Validate {
        /// CLI description (YAML, TOML or JSON)
        #[arg(value_name = "CONFIG")]
        input: PathBuf,
    },

    /// Show the hook names each command looks up
    Hooks {
        /// CLI description (YAML, TOML or JSON)
        #[arg(value_name = "CONFIG")]
        input: PathBuf,

        /// Target whose naming convention is used
        #[arg(short, long)]
        target: Option<String>,
    },

    /// List available targets
    Targets,

    /// Initialize configuration
    Init {
        /// Initialize global configuration (default is project-level)
        #[arg(short, long)]
        global: bool,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key (e.g., generation.max_depth)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },
}
