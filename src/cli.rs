// src/cli.rs

//! Command-line interface for `sitepipe`.

use clap::{Parser, Subcommand, ValueEnum};

/// Asset pipeline and live-reload development server for static sites.
#[derive(Parser, Debug, Clone)]
#[command(name = "sitepipe", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    ///
    /// If the default path does not exist, built-in defaults are used.
    /// An explicitly passed path that does not exist is an error.
    #[arg(long, value_name = "PATH", default_value = "Sitepipe.toml")]
    pub config: String,

    /// Log level override (otherwise `SITEPIPE_LOG`, default `info`).
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the step plan for the chosen command without executing it.
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Remove vendor artifacts (relocated vendor styles and the package
    /// directory).
    Clean,

    /// Clean, fetch front-end packages, relocate vendor stylesheets and
    /// normalize the normalization stylesheet for import.
    #[command(alias = "setup")]
    InstallDependencies,

    /// One-shot asset build followed by one-shot site generation.
    ///
    /// The exit code mirrors the site generator's exit code.
    Build {
        /// Skip CSS minification for this build.
        #[arg(long)]
        no_minify: bool,
    },

    /// Build assets, then run watch-mode site generation, the development
    /// HTTP server and the file watcher until interrupted.
    Serve {
        /// Port override for the development server.
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,

        /// Do not open the browser once the first site build completes.
        #[arg(long)]
        no_open: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }

    #[test]
    fn serve_accepts_port_and_no_open() {
        let args = CliArgs::parse_from(["sitepipe", "serve", "--port", "4000", "--no-open"]);
        match args.command {
            Command::Serve { port, no_open } => {
                assert_eq!(port, Some(4000));
                assert!(no_open);
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn setup_is_an_alias_for_install_dependencies() {
        let args = CliArgs::parse_from(["sitepipe", "setup"]);
        assert!(matches!(args.command, Command::InstallDependencies));
    }
}
