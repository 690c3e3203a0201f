//! Build script for spotexp.
//!
//! Copies the `.env.example` configuration template into the user's local data
//! directory so that a ready-to-edit template sits next to the `.env` file the
//! binary reads at startup.
//!
//! - Linux: `~/.local/share/spotexp/.env.example`
//! - macOS: `~/Library/Application Support/spotexp/.env.example`
//! - Windows: `%LOCALAPPDATA%/spotexp/.env.example`

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` from the crate root into `<data_local_dir>/spotexp/`.
///
/// A missing template only produces a cargo warning; failing to create the
/// target directory or to write the copy fails the build.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let template_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotexp");
    fs::create_dir_all(&out_dir)?;

    if template_path.is_file() {
        let contents = fs::read_to_string(&template_path)?;
        fs::write(out_dir.join(".env.example"), contents)?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            template_path.display()
        );
    }

    Ok(())
}
