use std::{env, fs};

use sunoplayer::config::{self, Settings};

#[tokio::test]
async fn test_load_env_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("sunoplayer");

    config::load_env_from(&home).await.unwrap();
    assert!(home.is_dir());
}

#[tokio::test]
async fn test_load_env_from_reads_values() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "SUNOPLAYER_CONFIG_TEST_MARKER=from-dotenv\n",
    )
    .unwrap();

    config::load_env_from(dir.path()).await.unwrap();
    assert_eq!(
        env::var("SUNOPLAYER_CONFIG_TEST_MARKER").as_deref(),
        Ok("from-dotenv")
    );
}

#[test]
fn test_settings_with_home_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::with_home(dir.path().to_path_buf());

    assert_eq!(settings.api_url, config::DEFAULT_API_URL);
    assert_eq!(settings.device_id, config::DEFAULT_DEVICE_ID);
    assert_eq!(settings.playback_file(), dir.path().join("temp_play.mp3"));
}
