use tabled::Table;

use crate::{
    config::Settings,
    info,
    suno::{SunoClient, client::CLIP_PAGE_LIMIT},
    types::{Clip, Workspace},
    utils::{self, ClipSort},
    warning,
};

use super::{Selection, connect, spinner, workspaces::resolve_workspace};

pub async fn list_tracks(settings: &Settings, selection: &Selection, sort: ClipSort) {
    let client = connect(settings).await;

    let Some((workspace, clips)) = load_tracks(&client, selection).await else {
        return;
    };

    info!(
        "{} ({} clips)",
        workspace.name,
        workspace.clip_count.max(clips.len() as u64)
    );

    if clips.is_empty() {
        warning!("No tracks in this workspace");
        return;
    }

    let rows = utils::clip_table_rows(&clips, sort);
    println!("{}", Table::new(rows));
}

/// Resolves the selected workspace and fetches its tracks in listing order.
pub(super) async fn load_tracks(
    client: &SunoClient,
    selection: &Selection,
) -> Option<(Workspace, Vec<Clip>)> {
    let workspace = resolve_workspace(client, selection.workspace.as_deref()).await?;

    let pb = spinner(&format!("Fetching tracks of {}...", workspace.name));
    let clips = if selection.all_pages {
        client.all_clips(&workspace.id).await
    } else {
        client.clips(&workspace.id, 1, CLIP_PAGE_LIMIT).await
    };
    pb.finish_and_clear();

    Some((workspace, clips))
}
