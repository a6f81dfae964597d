use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use scoreboard_stats::commands::config::{
    get_config_path, init_config_manager, load_config, load_or_init_config, save_config,
};
use scoreboard_stats::{
    init_tracing, AppConfig, CompileRequest, GameTitle, HttpOcrClient, ImageInput, InMemoryRoster,
    MatchContext, StatsCompiler,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Compile per-player statistics from post-match scoreboard screenshots
#[derive(Parser, Debug)]
#[command(name = "scoreboard-stats", version, about)]
struct Cli {
    /// Config file; defaults to the platform config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the records of one scoreboard and print them as JSON
    Compile(CompileArgs),
    /// Print the config location and effective settings
    Config {
        /// Overwrite the config file with the defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Game the screenshots come from
    #[arg(value_enum)]
    title: TitleArg,

    /// Scoreboard screenshot(s): one for shooter, equipment then data for moba
    #[arg(required = true, num_args = 1..=2)]
    images: Vec<PathBuf>,

    /// Roster JSON file (teams, players, characters)
    #[arg(long)]
    roster: PathBuf,

    /// Home team id of the match
    #[arg(long, requires = "away")]
    home: Option<String>,

    /// Away team id of the match
    #[arg(long, requires = "home")]
    away: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TitleArg {
    Shooter,
    Moba,
}

impl From<TitleArg> for GameTitle {
    fn from(title: TitleArg) -> Self {
        match title {
            TitleArg::Shooter => GameTitle::TacticalShooter,
            TitleArg::Moba => GameTitle::Moba,
        }
    }
}

impl CompileArgs {
    fn title(&self) -> GameTitle {
        self.title.into()
    }

    fn match_context(&self) -> Option<MatchContext> {
        match (&self.home, &self.away) {
            (Some(home), Some(away)) => Some(MatchContext {
                home_team_id: home.clone(),
                away_team_id: away.clone(),
            }),
            _ => None,
        }
    }

    fn check_image_count(&self) -> Result<(), String> {
        let title = self.title();
        if self.images.len() != title.image_count() {
            return Err(format!(
                "{} needs {} image(s), got {}",
                title,
                title.image_count(),
                self.images.len()
            ));
        }
        Ok(())
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config_state = init_config_manager(cli.config.as_deref())?;

    let args = match cli.command {
        Command::Config { reset } => {
            let config = if reset {
                let config = AppConfig::default();
                save_config(&config_state, &config)?;
                config
            } else {
                load_or_init_config(&config_state)?
            };
            println!("{}", get_config_path(&config_state));
            let json = serde_json::to_string_pretty(&config)
                .map_err(|e| format!("Failed to serialize config: {}", e))?;
            println!("{}", json);
            return Ok(());
        }
        Command::Compile(args) => args,
    };

    let config = load_config(&config_state)?;
    let roster = InMemoryRoster::load(&args.roster).map_err(|e| {
        tracing::error!(details = ?e, "Roster could not be loaded");
        e.to_string()
    })?;
    let engine = HttpOcrClient::new(&config.recognition)?;
    if let Err(e) = engine.health_check().await {
        tracing::warn!(url = %config.recognition.server_url, error = %e, "OCR server is not responding");
    }

    let images = args
        .images
        .iter()
        .map(|path| {
            std::fs::read(path)
                .map(ImageInput::Bytes)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let compiler = StatsCompiler::new(config, engine, roster);
    let progress = |percent: u8| tracing::debug!(percent, "Progress");
    let outcome = compiler
        .submit(
            CompileRequest {
                title: args.title(),
                match_context: args.match_context(),
                images,
            },
            &progress,
        )
        .await?;

    let json = serde_json::to_string_pretty(&outcome)
        .map_err(|e| format!("Failed to serialize result: {}", e))?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Command::Compile(args) = &cli.command {
        if let Err(e) = args.check_image_count() {
            Cli::command().error(ErrorKind::WrongNumberOfValues, e).exit();
        }
    }

    init_tracing(cli.json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "scoreboard-stats failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("scoreboard-stats").chain(line.split_whitespace()))
    }

    fn compile_args(line: &str) -> CompileArgs {
        match parse(line).unwrap().command {
            Command::Compile(args) => args,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_shooter() {
        let cli = parse("compile shooter board.png --roster r.json --json").unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, None);

        let Command::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.title(), GameTitle::TacticalShooter);
        assert_eq!(args.images, vec![PathBuf::from("board.png")]);
        assert_eq!(args.roster, PathBuf::from("r.json"));
        assert_eq!(args.match_context(), None);
        assert!(args.check_image_count().is_ok());
    }

    #[test]
    fn test_parse_moba_with_match() {
        let cli = parse("--config c.json compile moba eq.png data.png --roster r.json --home h --away a").unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));

        let Command::Compile(args) = cli.command else {
            panic!("expected compile");
        };
        assert_eq!(args.title(), GameTitle::Moba);
        assert!(args.check_image_count().is_ok());
        assert_eq!(args.match_context().map(|m| m.away_team_id), Some("a".to_string()));
    }

    #[test]
    fn test_parse_config_command() {
        let cli = parse("config --reset --config x.json").unwrap();
        assert!(matches!(cli.command, Command::Config { reset: true }));
        assert_eq!(cli.config, Some(PathBuf::from("x.json")));
    }

    #[test]
    fn test_image_count_must_match_title() {
        assert!(compile_args("compile moba only-one.png --roster r.json")
            .check_image_count()
            .is_err());
        assert!(compile_args("compile shooter a.png b.png --roster r.json")
            .check_image_count()
            .is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("").is_err());
        assert!(parse("compile shooter a.png").is_err());
        assert!(parse("compile shooter a.png --roster r.json --home h").is_err());
        assert!(parse("compile shooter a.png --roster r.json --away a").is_err());
        assert!(parse("compile shooter a.png --roster").is_err());
        assert!(parse("compile shooter a.png --roster r.json --bogus").is_err());
        assert!(parse("compile chess a.png --roster r.json").is_err());
        assert!(parse("compile moba a.png b.png c.png --roster r.json").is_err());
    }
}
