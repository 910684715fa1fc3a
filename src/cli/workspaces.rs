use tabled::Table;

use crate::{
    config::Settings,
    suno::{SunoClient, client::WORKSPACE_PAGE_LIMIT},
    types::{Workspace, WorkspaceTableRow},
    warning,
};

use super::{connect, spinner};

pub async fn list_workspaces(settings: &Settings) {
    let client = connect(settings).await;

    let pb = spinner("Fetching workspaces...");
    let workspaces = client.workspaces(1, WORKSPACE_PAGE_LIMIT).await;
    pb.finish_and_clear();

    if workspaces.is_empty() {
        warning!("No workspaces found");
        return;
    }

    let rows: Vec<WorkspaceTableRow> = workspaces
        .into_iter()
        .enumerate()
        .map(|(i, ws)| WorkspaceTableRow {
            index: i + 1,
            id: ws.id,
            name: ws.name,
            clips: ws.clip_count,
        })
        .collect();

    println!("{}", Table::new(rows));
}

/// The workspace named by `id`, or the first one when no id is given.
///
/// An id that is not on the first page is used as is.
pub(super) async fn resolve_workspace(client: &SunoClient, id: Option<&str>) -> Option<Workspace> {
    let workspaces = client.workspaces(1, WORKSPACE_PAGE_LIMIT).await;

    match id {
        Some(id) => Some(
            workspaces
                .into_iter()
                .find(|ws| ws.id == id)
                .unwrap_or_else(|| Workspace {
                    id: id.to_string(),
                    name: id.to_string(),
                    clip_count: 0,
                }),
        ),
        None => {
            let first = workspaces.into_iter().next();
            if first.is_none() {
                warning!("No workspaces found");
            }
            first
        }
    }
}
