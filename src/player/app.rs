//! Main application state and control flow for the comparison player.
//!
//! This module owns the terminal event loop: it drives the engine one tick
//! per frame, translates keyboard input into session calls, and surfaces
//! engine events as short status messages. All playback state lives in the
//! engine session; the app only holds UI concerns (list cursor, status line).

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{error::Error, io, path::PathBuf, time::Duration, time::Instant};

use super::ui;
use crate::config::Config;
use crate::constants::TICK_INTERVAL_MS;
use crate::engine::{Session, TransportEvent};

pub struct App {
    pub session: Session,
    pub seek_step: f32,
    pub should_quit: bool,
    pub selected: usize,
    pub status: Option<String>,
    status_set_at: Option<Instant>,
}

impl App {
    pub fn new(session: Session, seek_step: f32) -> Self {
        Self {
            session,
            seek_step,
            should_quit: false,
            selected: 0,
            status: None,
            status_set_at: None,
        }
    }

    pub fn set_status(&mut self, message: String) {
        info!("{message}");
        self.status = Some(message);
        self.status_set_at = Some(Instant::now());
    }

    fn clear_stale_status(&mut self) {
        if let Some(set_at) = self.status_set_at
            && set_at.elapsed() > Duration::from_secs(3)
        {
            self.status = None;
            self.status_set_at = None;
        }
    }

    pub fn toggle_playback(&mut self) {
        if self.session.snapshot().is_playing {
            self.session.pause();
        } else if let Err(e) = self.session.play() {
            self.set_status(format!("Playback failed: {e}"));
        }
    }

    fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn select_next(&mut self) {
        let count = self.session.tracks().len();
        if count > 0 {
            self.selected = (self.selected + 1).min(count - 1);
        }
    }

    fn activate_selected(&mut self) {
        if let Some(track) = self.session.tracks().get(self.selected) {
            let id = track.id;
            self.session.set_active_track(id);
        }
    }

    fn remove_selected(&mut self) {
        if let Some(track) = self.session.tracks().get(self.selected) {
            let id = track.id;
            let name = track.name.clone();
            self.session.remove_track(id);
            self.set_status(format!("Removed {name}"));
        }
        let count = self.session.tracks().len();
        if count > 0 {
            self.selected = self.selected.min(count - 1);
        } else {
            self.selected = 0;
        }
    }

    fn activate_by_number(&mut self, number: usize) {
        if number == 0 {
            return;
        }
        if let Some(track) = self.session.tracks().get(number - 1) {
            let id = track.id;
            self.selected = number - 1;
            self.session.set_active_track(id);
        }
    }

    fn drop_marker(&mut self) {
        match self.session.add_marker_at_playhead() {
            Ok(Some(_)) => self.set_status("Marker added".to_string()),
            Ok(None) => {}
            Err(e) => self.set_status(format!("Marker failed: {e}")),
        }
    }

    fn remove_last_marker(&mut self) {
        let target = self.session.snapshot().active_track_id.and_then(|id| {
            self.session
                .track(id)
                .and_then(|t| t.markers.last().map(|m| (id, m.id, m.label.clone())))
        });
        if let Some((track_id, marker_id, label)) = target {
            let _ = self.session.remove_marker(track_id, marker_id);
            self.set_status(format!("Removed marker {label}"));
        }
    }

    fn apply_events(&mut self, events: Vec<TransportEvent>) {
        for event in events {
            match event {
                TransportEvent::TrackEnded { .. } => {
                    self.set_status("End of track".to_string());
                }
                TransportEvent::Looped { .. } => {}
                TransportEvent::ResumeFailed { reason, .. } => {
                    self.set_status(format!("Resume failed: {reason}"));
                }
            }
        }
    }
}

pub fn run_with_files(files: &[PathBuf], config: &Config) -> Result<(), Box<dyn Error>> {
    init_logging()?;
    info!("Starting ABX comparison player");

    let mut session = Session::open(config).map_err(|e| e.to_string())?;

    // Load everything before taking over the terminal; partial failures
    // become a status line, total failure is a hard error
    let mut failures = Vec::new();
    for path in files {
        if let Err(e) = session.add_track(path) {
            log::error!("could not load {}: {e}", path.display());
            failures.push(format!("{}: {e}", path.display()));
        }
    }
    if !files.is_empty() && session.tracks().is_empty() {
        return Err(format!("no tracks loaded: {}", failures.join("; ")).into());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, config.seek_step_secs);
    if !failures.is_empty() {
        app.set_status(format!("{} file(s) failed to load", failures.len()));
    }

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        eprintln!("Error: {e}");
    }
    result
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    loop {
        let events = app.session.tick();
        app.apply_events(events);
        app.clear_stale_status();

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll with a short timeout so the progress display keeps moving
        if event::poll(Duration::from_millis(TICK_INTERVAL_MS))?
            && let Event::Key(key) = event::read()?
        {
            handle_key_event(app, key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key_event(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char('n') | KeyCode::Tab => app.session.next_track(),
        KeyCode::Char('p') => app.session.previous_track(),
        KeyCode::Char(c @ '1'..='9') => {
            app.activate_by_number(c.to_digit(10).unwrap_or(0) as usize);
        }
        KeyCode::Left => {
            let step = app.seek_step;
            app.session.seek_by(-step);
        }
        KeyCode::Right => {
            let step = app.seek_step;
            app.session.seek_by(step);
        }
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::Enter => app.activate_selected(),
        KeyCode::Char('r') => app.remove_selected(),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let volume = app.session.snapshot().volume + 0.05;
            app.session.set_volume(volume);
        }
        KeyCode::Char('-') => {
            let volume = app.session.snapshot().volume - 0.05;
            app.session.set_volume(volume);
        }
        KeyCode::Char('m') => app.session.toggle_mute(),
        KeyCode::Char('l') => app.session.toggle_loop(),
        KeyCode::Char('>') | KeyCode::Char('.') => {
            let rate = app.session.snapshot().playback_rate + 0.25;
            app.session.set_playback_rate(rate);
        }
        KeyCode::Char('<') | KeyCode::Char(',') => {
            let rate = app.session.snapshot().playback_rate - 0.25;
            app.session.set_playback_rate(rate);
        }
        KeyCode::Char('a') => app.drop_marker(),
        KeyCode::Char('x') => app.remove_last_marker(),
        _ => {}
    }
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    use simplelog::*;
    use std::fs::File;

    let log_file = "/tmp/abx-player.log";
    CombinedLogger::init(vec![WriteLogger::new(
        LevelFilter::Info,
        simplelog::Config::default(),
        File::create(log_file)?,
    )])?;

    Ok(())
}
