//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Kiln static site build runner CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: kiln.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "kiln.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print debug output
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands (default: html)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build plain-markup pages, serve `dist` and rebuild on change
    #[command(visible_alias = "default")]
    Html {
        #[command(flatten)]
        serve_args: ServeArgs,
    },

    /// Build template pages, serve `dist` and rebuild on change
    #[command(visible_alias = "t")]
    Template {
        #[command(flatten)]
        serve_args: ServeArgs,
    },

    /// Run the initial build once and exit
    #[command(visible_alias = "b")]
    Build {
        /// Build template pages instead of plain-markup pages
        #[arg(short, long)]
        template: bool,
    },
}

/// Arguments shared by the serving pipelines
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// HTTP port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    /// The subcommand to run, `html` when none is given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Html {
            serve_args: ServeArgs::default(),
        })
    }

    /// Serve overrides of the selected command, if it serves.
    pub fn serve_args(&self) -> Option<ServeArgs> {
        match self.command() {
            Commands::Html { serve_args } | Commands::Template { serve_args } => Some(serve_args),
            Commands::Build { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_html() {
        let cli = Cli::parse_from(["kiln"]);
        assert!(matches!(cli.command(), Commands::Html { .. }));
        assert_eq!(cli.config, PathBuf::from("kiln.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_template_with_port() {
        let cli = Cli::parse_from(["kiln", "template", "-p", "8080"]);
        assert!(matches!(cli.command(), Commands::Template { .. }));
        assert_eq!(cli.serve_args().and_then(|a| a.port), Some(8080));
    }

    #[test]
    fn test_build_template_flag() {
        let cli = Cli::parse_from(["kiln", "-V", "build", "--template"]);
        assert!(matches!(cli.command(), Commands::Build { template: true }));
        assert!(cli.verbose);
        assert!(cli.serve_args().is_none());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from(["kiln", "html", "-C", "site/kiln.toml"]);
        assert_eq!(cli.config, PathBuf::from("site/kiln.toml"));
    }
}
