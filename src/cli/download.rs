use std::path::Path;

use crate::{config::Settings, player, success, utils, warning};

use super::{Selection, connect, percent_bar, tracks::load_tracks};

pub async fn download(settings: &Settings, selection: &Selection, index: usize, dir: &Path) {
    let client = connect(settings).await;

    let Some((_, clips)) = load_tracks(&client, selection).await else {
        return;
    };
    let clip = match utils::select_clip(&clips, index) {
        Ok(clip) => clip,
        Err(e) => {
            warning!("{}", e);
            return;
        }
    };

    let target = utils::download_path(dir, clip);
    let pb = percent_bar("Downloading");
    let result = player::prepare_track(&client, clip, target, |p| pb.set_position(p as u64)).await;
    pb.finish_and_clear();

    match result {
        Ok(path) => success!("Downloaded to {}", path.display()),
        Err(e) => warning!("{}", e),
    }
}
