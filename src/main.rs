use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use spotexp::{
    cli::{self, AuthArgs, TopKind},
    config, error,
    spotify::MAX_PAGE_LIMIT,
    types::{SearchType, TimeRange},
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write a .env template to the current directory
    Setup(SetupOptions),

    /// Authorize with Spotify and show the logged in user
    Auth(AuthArgs),

    /// Show your top tracks or artists
    Top(TopOptions),

    /// Search the Spotify catalog
    Search(SearchOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct SetupOptions {
    /// Overwrite an existing .env file
    #[clap(long)]
    force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TopOptions {
    kind: TopKind,

    /// Number of items to show (1-50)
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_LIMIT as i64))]
    limit: u32,

    #[clap(long, value_enum, default_value_t = TimeRange::MediumTerm)]
    time_range: TimeRange,

    #[command(flatten)]
    auth: AuthArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    query: String,

    #[clap(long = "type", value_enum, default_value_t = SearchType::Track)]
    kind: SearchType,

    /// Number of results to show (1-50)
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_LIMIT as i64))]
    limit: u32,

    #[command(flatten)]
    auth: AuthArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = config::load_env() {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Setup(opt) => cli::setup(opt.force).await,
        Command::Auth(opt) => cli::auth(&opt).await,
        Command::Top(opt) => cli::top(opt.kind, opt.limit, opt.time_range, &opt.auth).await,
        Command::Search(opt) => cli::search(&opt.query, opt.kind, opt.limit, &opt.auth).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
