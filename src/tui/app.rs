//! Main TUI application state machine.
//!
//! Handles:
//! - Page navigation
//! - Input event handling
//! - Service integration

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{CachedSource, CsvFileSource, DenseNetwork, FallbackSource, RemoteCsvSource};
use crate::application::{DetectionService, VisualizationService};
use crate::config::AppConfig;
use crate::domain::charts;

use super::ui::{
    detection::{render_detection, DetectionFormState, DetectionResult},
    render_disclaimer, render_navigation,
    visualization::{render_visualization, ChartTab, ChartView, PageData, VisualizationState},
};

/// Dataset source shared by both pages.
pub type AppSource = Arc<CachedSource<FallbackSource<RemoteCsvSource, CsvFileSource>>>;

/// Current page in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Visualization,
    Detection,
}

/// Main application state
pub struct App {
    /// Current page
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    visualization: VisualizationService<AppSource>,

    detection: DetectionService<AppSource, DenseNetwork>,

    visualization_state: VisualizationState,

    /// Last dataset failure on the visualization page, cleared on resample
    visualization_error: Option<String>,

    detection_state: DetectionFormState,
}

impl App {
    /// Create a new application instance from configuration.
    ///
    /// # Errors
    /// Returns error if the model cannot be loaded or the filter is misconfigured.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let local = CsvFileSource::new(config.dataset_path.clone());
        let source = if config.offline {
            tracing::info!("Offline mode: using {}", config.dataset_path.display());
            FallbackSource::fallback_only(local)
        } else {
            let remote = RemoteCsvSource::new(&config.dataset_url, config.http_timeout)
                .with_credentials(config.credentials.clone());
            FallbackSource::new(remote, local)
        };
        let source = Arc::new(CachedSource::new(source));

        // Refuse to start without a usable model.
        let model = DenseNetwork::load(&config.model_path).map_err(|e| {
            anyhow!(
                "Failed to load model from {:?}: {}. Set CARDIOLENS_MODEL_PATH to the exported network JSON.",
                config.model_path,
                e
            )
        })?;

        let filter = config.outlier_filter()?;
        let visualization = VisualizationService::new(
            source.clone(),
            filter,
            config.sample_size,
            config.sample_seed,
        );
        let detection = DetectionService::new(source, Arc::new(model));

        Ok(Self::with_services(visualization, detection))
    }

    /// Create application with injected services.
    pub fn with_services(
        visualization: VisualizationService<AppSource>,
        detection: DetectionService<AppSource, DenseNetwork>,
    ) -> Self {
        Self {
            screen: Screen::Visualization,
            should_quit: false,
            visualization,
            detection,
            visualization_state: VisualizationState::default(),
            visualization_error: None,
            detection_state: DetectionFormState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if the dataset is unavailable or terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Reference statistics are required before any prediction.
        self.detection.initialize()?;
        self.refresh_visualization();

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                render_navigation(f, chunks[0], self.screen);

                match self.screen {
                    Screen::Visualization => {
                        let data = match &self.visualization_error {
                            Some(message) => Err(message.clone()),
                            None => self.visualization_data().map_err(|e| e.to_string()),
                        };
                        render_visualization(f, chunks[1], &self.visualization_state, data);
                    }
                    Screen::Detection => render_detection(f, chunks[1], &self.detection_state),
                }

                render_disclaimer(f, chunks[2]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Chart data for the current selections.
    fn visualization_data(&self) -> crate::Result<PageData<'_>> {
        let sample = self.visualization.dataset()?;
        let s = &self.visualization_state;
        let chart = match s.tab {
            ChartTab::Donut => ChartView::Donut(self.visualization.proportions(s.color)?),
            ChartTab::Bar => ChartView::Bar(self.visualization.histogram(s.x, s.color)?),
            ChartTab::Scatter => ChartView::Scatter {
                series: self.visualization.scatter(s.x, s.y, s.color)?,
                x_bounds: charts::bounds(sample.records(), s.x),
                y_bounds: charts::bounds(sample.records(), s.y),
            },
        };
        Ok(PageData { sample, chart })
    }

    /// Draw the sample now so failures are reported once, not every frame.
    fn refresh_visualization(&mut self) {
        self.visualization_error = match self.visualization.dataset() {
            Ok(_) => None,
            Err(e) => {
                tracing::error!("Visualization dataset unavailable: {}", e);
                Some(e.to_string())
            }
        };
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if key == KeyCode::Tab {
            self.screen = match self.screen {
                Screen::Visualization => Screen::Detection,
                Screen::Detection => Screen::Visualization,
            };
            return;
        }

        match self.screen {
            Screen::Visualization => self.handle_visualization_key(key),
            Screen::Detection => self.handle_detection_key(key),
        }
    }

    fn handle_visualization_key(&mut self, key: KeyCode) {
        let state = &mut self.visualization_state;
        match key {
            KeyCode::Char('1') => state.tab = ChartTab::Donut,
            KeyCode::Char('2') => state.tab = ChartTab::Bar,
            KeyCode::Char('3') => state.tab = ChartTab::Scatter,
            KeyCode::Right => state.tab = state.tab.next(),
            KeyCode::Left => state.tab = state.tab.prev(),
            KeyCode::Char('c') | KeyCode::Char('C') => state.color = state.color.next(),
            KeyCode::Char('x') | KeyCode::Char('X') => state.x = state.x.next(),
            KeyCode::Char('y') | KeyCode::Char('Y') => state.y = state.y.next(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.visualization.resample();
                self.refresh_visualization();
            }
            _ => {}
        }
    }

    fn handle_detection_key(&mut self, key: KeyCode) {
        let form = &mut self.detection_state;
        match key {
            KeyCode::Esc => *form = DetectionFormState::default(),
            KeyCode::Up => form.prev_field(),
            KeyCode::Down => form.next_field(),
            KeyCode::Left => form.cycle_choice(false),
            KeyCode::Right => form.cycle_choice(true),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Enter => self.submit_detection(),
            _ => {}
        }
    }

    fn submit_detection(&mut self) {
        let input = match self.detection_state.to_patient_input() {
            Ok(input) => input,
            Err(e) => {
                self.detection_state.error_message = Some(e);
                return;
            }
        };

        let today = chrono::Local::now().date_naive();
        self.detection_state.error_message = None;
        self.detection_state.result = Some(match self.detection.assess(&input, today) {
            Ok(assessment) => DetectionResult::Assessed(assessment),
            Err(e) => {
                tracing::warn!("Risk assessment failed: {}", e);
                DetectionResult::Failed(e.to_string())
            }
        });
    }
}
