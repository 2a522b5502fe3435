use crate::config::Config;
use std::error::Error;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("Current ABX configuration:");
    println!("  default_volume: {}", config.default_volume);
    println!("  seek_step_secs: {}", config.seek_step_secs);
    println!("  max_tracks: {}", config.max_tracks);
    println!("  max_file_mib: {}", config.max_file_mib);

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}
