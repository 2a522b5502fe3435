use owo_colors::OwoColorize;
use std::error::Error;
use std::path::PathBuf;

use crate::config::Config;
use crate::constants::AUDIO_EXTENSIONS;

pub fn handle_play(files: &[String]) -> Result<(), Box<dyn Error>> {
    if files.is_empty() {
        println!("{} {}", "🎵".cyan(), "ABX Player".bold());
        println!();
        println!("{} No files given.", "Note:".yellow());
        println!();
        println!("Load the tracks you want to compare:");
        println!("  {}", "abx play mix-v1.wav mix-v2.wav".cyan());
        return Ok(());
    }

    let mut paths = Vec::new();
    for file in files {
        let path = PathBuf::from(file);
        if !path.exists() {
            return Err(format!("File not found: {file}").into());
        }
        let supported = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()));
        if !supported {
            return Err(format!(
                "Unsupported file type: {file} (supported: {})",
                AUDIO_EXTENSIONS.join(", ")
            )
            .into());
        }
        paths.push(path);
    }

    let config = Config::load()?;
    crate::player::run(&paths, &config)
}
