use crate::{config::Settings, info, player, success, utils, warning};

use super::{Selection, connect, percent_bar, tracks::load_tracks};

pub async fn play(settings: &Settings, selection: &Selection, index: usize, volume: u8) {
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

    if let Err(e) = player::ensure_ready(clip) {
        warning!("{}", e);
        return;
    }

    let pb = percent_bar("Loading");
    let prepared =
        player::prepare_track(&client, clip, settings.playback_file(), |p| pb.set_position(p as u64))
            .await;
    pb.finish_and_clear();

    let path = match prepared {
        Ok(path) => path,
        Err(e) => {
            warning!("{}", e);
            return;
        }
    };

    info!("Now playing: {} ({})", clip.title, utils::format_duration(clip.duration));
    match player::play_file(&path, volume).await {
        Ok(()) => success!("Finished {}", clip.title),
        Err(e) => warning!("{}", e),
    }
}
