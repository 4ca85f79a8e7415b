//! Build script for the GoatMusic relay.
//!
//! Copies the `.env.example` template into the user's local data directory so
//! that the relay finds a ready-to-edit configuration where it looks for one.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` to the platform data directory.
///
/// # File Operations
///
/// The template is read from the crate root and written to:
/// - Linux: `~/.local/share/goatmusic/.env.example`
/// - macOS: `~/Library/Application Support/goatmusic/.env.example`
/// - Windows: `%LOCALAPPDATA%/goatmusic/.env.example`
///
/// A missing template only produces a cargo warning. Directory creation and
/// write failures abort the build.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("goatmusic");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        let contents = fs::read_to_string(&env_example_path)?;
        fs::write(out_dir.join(".env.example"), contents)?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
