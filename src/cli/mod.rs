//! # CLI Module
//!
//! The terminal front-end of Suno Player. Each public function here is one
//! `sunoplayer` subcommand: it signs in (reusing the cached token when it still
//! works), talks to the Suno API and prints the result.
//!
//! ## Command Categories
//!
//! ### Authentication
//!
//! - [`auth`] - Runs the sign-in flow and greets the user
//! - [`logout`] - Forgets the cached token
//! - [`whoami`] - Prints the identity behind the current token
//!
//! ### Browsing
//!
//! - [`list_workspaces`] - Table of workspaces with their track counts
//! - [`list_tracks`] - Sortable track table of one workspace
//!
//! ### Tracks
//!
//! - [`play`] - Stages a finished track on disk and plays it
//! - [`download`] - Saves a finished track into a directory
//!
//! ## Usage Patterns
//!
//! ```bash
//! sunoplayer auth
//! sunoplayer workspaces
//! sunoplayer tracks --sort created
//! sunoplayer play 3 --volume 50
//! sunoplayer download 3 --dir ~/Music
//! ```
//!
//! Fatal conditions (no usable token) go through the `error!` macro, which
//! exits the process. Everything else is reported as a warning.

mod auth;
mod download;
mod play;
mod tracks;
mod workspaces;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use auth::auth;
pub use auth::connect;
pub use auth::logout;
pub use auth::whoami;
pub use download::download;
pub use play::play;
pub use tracks::list_tracks;
pub use workspaces::list_workspaces;

/// Which workspace and how many pages of it a track command works on.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub workspace: Option<String>,
    pub all_pages: bool,
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

fn percent_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_message(message.to_string());
    pb.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}
