pub mod app;
pub mod ui;

use std::error::Error;
use std::path::PathBuf;

use crate::config::Config;

pub fn run(files: &[PathBuf], config: &Config) -> Result<(), Box<dyn Error>> {
    app::run_with_files(files, config)
}
