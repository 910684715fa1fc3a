//! Build script for the Suno Player CLI.
//!
//! Places the configuration template next to where the application looks for
//! its `.env` file, so a fresh install has a documented starting point:
//!
//! - Linux: `~/.local/share/sunoplayer/.env.example`
//! - macOS: `~/Library/Application Support/sunoplayer/.env.example`
//! - Windows: `%LOCALAPPDATA%/sunoplayer/.env.example`
//!
//! Nothing here fails the build: a missing template or an unwritable data
//! directory only produces a cargo warning.

use std::{env, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template = manifest_dir.join(".env.example");

    if !template.is_file() {
        println!(
            "cargo:warning=.env.example not found at {}",
            template.display()
        );
        return Ok(());
    }

    if let Err(e) = install_template(&template) {
        println!("cargo:warning=could not install .env.example: {}", e);
    }

    Ok(())
}

fn install_template(template: &PathBuf) -> std::io::Result<()> {
    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("sunoplayer");
    fs::create_dir_all(&out_dir)?;

    let contents = fs::read_to_string(template)?;
    let target = out_dir.join(".env.example");
    // leave an unchanged copy alone so its mtime stays meaningful
    if fs::read_to_string(&target).ok().as_deref() != Some(contents.as_str()) {
        fs::write(target, contents)?;
    }
    Ok(())
}
