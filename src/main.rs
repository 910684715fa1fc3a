use std::path::PathBuf;

use clap::{
    Args, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sunoplayer::{
    cli::{self, Selection},
    config::{self, Settings},
    player::DEFAULT_VOLUME,
    utils, warning,
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
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in to Suno (reuses the cached token while it is valid)
    Auth,

    /// Forget the cached token
    Logout,

    /// Show who the current token belongs to
    Whoami,

    /// List workspaces
    Workspaces,

    /// List the tracks of a workspace
    Tracks(TracksOptions),

    /// Play a track from the listing
    Play(PlayOptions),

    /// Download a track from the listing
    Download(DownloadOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Args, Debug, Clone)]
pub struct SelectionOptions {
    /// Workspace id (defaults to the first workspace)
    #[clap(long, short)]
    pub workspace: Option<String>,

    /// Fetch every page of the workspace instead of the first 100 tracks
    #[clap(long)]
    pub all: bool,
}

impl From<SelectionOptions> for Selection {
    fn from(opt: SelectionOptions) -> Self {
        Selection {
            workspace: opt.workspace,
            all_pages: opt.all,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    #[command(flatten)]
    pub selection: SelectionOptions,

    /// Sort column: index, title, status, created or duration
    #[clap(long, default_value = "index", value_parser = utils::parse_clip_sort)]
    pub sort: utils::ClipSort,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    /// Row number shown by `tracks`
    pub index: usize,

    #[command(flatten)]
    pub selection: SelectionOptions,

    /// Volume between 0 and 100
    #[clap(long, default_value_t = DEFAULT_VOLUME, value_parser = utils::parse_volume)]
    pub volume: u8,
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadOptions {
    /// Row number shown by `tracks`
    pub index: usize,

    #[command(flatten)]
    pub selection: SelectionOptions,

    /// Directory to save the track in
    #[clap(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Command::Auth => cli::auth(&settings).await,
        Command::Logout => cli::logout(&settings).await,
        Command::Whoami => cli::whoami(&settings).await,
        Command::Workspaces => cli::list_workspaces(&settings).await,
        Command::Tracks(opt) => cli::list_tracks(&settings, &opt.selection.into(), opt.sort).await,
        Command::Play(opt) => {
            cli::play(&settings, &opt.selection.into(), opt.index, opt.volume).await
        }
        Command::Download(opt) => {
            cli::download(&settings, &opt.selection.into(), opt.index, &opt.dir).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
