use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::config::Backend;

#[derive(Parser)]
#[command(name = "slidemap")]
#[command(author, version, about)]
#[command(long_about = "A slide viewer with an embedded route map.\n\n\
    Slides are HTML: either one page of class=\"slide\" elements, or\n\
    fragments named slides/slide1.html, slides/slide2.html, ... in a directory\n\
    or under a web address. Links carrying data-location=\"Name\" jump to the\n\
    map slide and reveal that place.\n\n\
    Examples:\n  \
    slidemap talk/index.html          Present a pre-rendered page (fullscreen)\n  \
    slidemap talk --windowed          Present fragments from talk/slides/\n  \
    slidemap https://example.org/talk Fetch fragments over HTTP\n  \
    slidemap locate \"Paphos\"          Resolve a place without opening a window")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Slide page, fragment directory, or base URL (defaults.source when omitted)
    pub source: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Launch in a window instead of fullscreen
    #[arg(long, global = false)]
    pub windowed: bool,

    /// Start on a specific slide (1-indexed)
    #[arg(long, global = false)]
    pub slide: Option<usize>,

    /// Slide that holds the map (1-indexed); detected from id="map" when omitted
    #[arg(long, global = false)]
    pub map_slide: Option<usize>,

    /// Number of fragments to load
    #[arg(long, global = false)]
    pub count: Option<usize>,

    /// How location names are resolved
    #[arg(long, value_enum, global = false)]
    pub backend: Option<Backend>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a location name the way a location link would
    Locate {
        /// Place name, e.g. "Antioch, Syria"
        name: String,

        /// How the name is resolved
        #[arg(long, value_enum)]
        backend: Option<Backend>,
    },

    /// Print the pre-registered route
    Route,

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Display current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g. defaults.theme, defaults.backend, map.tile_url)
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        match self.command {
            Some(Commands::Locate { name, backend }) => crate::commands::locate::run(&name, backend),
            Some(Commands::Route) => {
                crate::commands::route::run();
                Ok(())
            }
            Some(Commands::Config { command }) => crate::commands::config::run(command),
            Some(Commands::Completion { shell }) => {
                crate::commands::completion::run(shell);
                Ok(())
            }
            Some(Commands::Version) => {
                crate::commands::version::run();
                Ok(())
            }
            None => {
                let config = crate::config::Config::load_or_default();
                let Some(source) = self.source.or_else(|| config.source().map(str::to_string)) else {
                    use clap::CommandFactory;
                    let mut cmd = Self::command();
                    cmd.print_help()?;
                    println!();
                    return Ok(());
                };
                if self.slide == Some(0) || self.map_slide == Some(0) {
                    anyhow::bail!("Slide numbers start at 1");
                }
                let launch = crate::app::Launch {
                    source: crate::deck::source::SlideSource::from_arg(&source),
                    windowed: self.windowed,
                    start_slide: self.slide.map(|s| s - 1),
                    map_slide: self.map_slide.or(config.map_slide()).map(|s| s.saturating_sub(1)),
                    count: self.count.unwrap_or(config.slide_count()),
                    backend: self.backend.unwrap_or(config.backend()),
                };
                crate::app::run(launch, &config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewer_flags() {
        let cli = Cli::try_parse_from([
            "slidemap",
            "talk",
            "--windowed",
            "--map-slide",
            "7",
            "--backend",
            "geocoding",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.source.as_deref(), Some("talk"));
        assert!(cli.windowed);
        assert_eq!(cli.map_slide, Some(7));
        assert_eq!(cli.backend, Some(Backend::Geocoding));
        assert_eq!(cli.verbose, 2);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_locate() {
        let cli = Cli::try_parse_from(["slidemap", "locate", "Antioch, Syria", "-q"]).unwrap();
        match cli.command {
            Some(Commands::Locate { name, backend }) => {
                assert_eq!(name, "Antioch, Syria");
                assert!(backend.is_none());
            }
            _ => panic!("expected locate"),
        }
        assert!(cli.quiet);
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["slidemap", "talk", "--backend", "google"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
