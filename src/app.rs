//! Application state management for the weather dashboard
//!
//! This module holds the interactive state: which view is showing, the list
//! selection, the search box, and status messages. City and weather data live
//! in the shared [`CityStore`]; long-running store operations are spawned onto
//! the runtime so key handling never blocks the draw loop.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use weatherdash::data::{CityConfig, GeocodingResult, WeatherResult};
use weatherdash::search::{SearchMessage, SearchWorker};
use weatherdash::store::{AddOutcome, CityStore, StoreSnapshot};

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for the store's first load
    Loading,
    /// City cards
    Dashboard,
    /// Search box over the dashboard
    Search,
}

/// Completion of a store operation spawned from a key press
#[derive(Debug, Clone, PartialEq, Eq)]
enum TaskEvent {
    Added { name: String, outcome: AddOutcome },
    /// A manual refresh or reset fetched the whole list
    Refreshed,
}

/// State of the add-city search box
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<GeocodingResult>,
    pub selected: usize,
    /// A query is waiting on the debounce or the network
    pub pending: bool,
    pub error: Option<String>,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Index of the selected city in the dashboard
    pub selected_index: usize,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Whether the help overlay is visible
    pub show_help: bool,
    /// Timestamp of last completed load or refresh
    pub last_refresh: Option<DateTime<Local>>,
    /// One-line feedback shown in the footer
    pub status: Option<String>,
    pub search: SearchState,
    store: CityStore,
    search_worker: SearchWorker,
    task_tx: mpsc::UnboundedSender<TaskEvent>,
    task_rx: mpsc::UnboundedReceiver<TaskEvent>,
}

impl App {
    pub fn new(store: CityStore, search_worker: SearchWorker) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::Loading,
            selected_index: 0,
            should_quit: false,
            show_help: false,
            last_refresh: None,
            status: None,
            search: SearchState::default(),
            store,
            search_worker,
            task_tx,
            task_rx,
        }
    }

    /// Copy of the store state for one frame
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Result for `city`, if it has been fetched yet
    pub fn result_for<'a>(snapshot: &'a StoreSnapshot, city: &CityConfig) -> Option<&'a WeatherResult> {
        snapshot
            .weather_data
            .iter()
            .find(|result| result.city_name() == city.name)
    }

    /// Applies background progress; call once per frame
    pub fn tick(&mut self) {
        if self.state == AppState::Loading && self.store.is_initialized() {
            self.state = AppState::Dashboard;
            self.last_refresh = Some(Local::now());
        }

        while let Ok(event) = self.task_rx.try_recv() {
            match event {
                TaskEvent::Added { name, outcome } => {
                    self.status = Some(match outcome {
                        AddOutcome::Added => format!("Added {}", name),
                        AddOutcome::Duplicate => format!("{} is already on the dashboard", name),
                        AddOutcome::NameTaken => {
                            format!("A city named {} is already on the dashboard", name)
                        }
                    });
                }
                TaskEvent::Refreshed => self.mark_refreshed(),
            }
        }

        while let Ok(message) = self.search_worker.receiver.try_recv() {
            self.apply_search(message);
        }

        self.clamp_selection();
    }

    /// Records a finished background refresh
    pub fn mark_refreshed(&mut self) {
        self.last_refresh = Some(Local::now());
    }

    fn apply_search(&mut self, message: SearchMessage) {
        if !self.search_worker.is_current(&message) {
            return;
        }
        self.search.pending = false;
        match message.outcome {
            Ok(results) => {
                self.search.results = results;
                self.search.error = None;
            }
            Err(error) => {
                self.search.results.clear();
                self.search.error = Some(error);
            }
        }
        self.search.selected = 0;
    }

    fn clamp_selection(&mut self) {
        let count = self.store.cities().len();
        if count == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= count {
            self.selected_index = count - 1;
        }
    }

    /// Handles keyboard input based on current state
    ///
    /// Dashboard keys:
    /// - `q` or `Esc`: Quit
    /// - `Up`/`k`, `Down`/`j`: Move selection
    /// - `Shift+Up`/`K`, `Shift+Down`/`J`: Move the selected city up/down
    /// - `d`/`Delete`: Remove the selected city
    /// - `a` or `/`: Open the search box
    /// - `r`: Refresh all cities
    /// - `R`: Restore the default cities
    /// - `?`: Toggle help
    ///
    /// In the search box, typing edits the query, `Up`/`Down` pick a result,
    /// `Enter` adds it and `Esc` closes the box.
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match self.state {
            AppState::Loading => {
                // Only quit is allowed during loading
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::Dashboard => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Up if key_event.modifiers.contains(KeyModifiers::SHIFT) => {
                    self.move_city_up();
                }
                KeyCode::Down if key_event.modifiers.contains(KeyModifiers::SHIFT) => {
                    self.move_city_down();
                }
                KeyCode::Char('K') => {
                    self.move_city_up();
                }
                KeyCode::Char('J') => {
                    self.move_city_down();
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.move_selection_up();
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.move_selection_down();
                }
                KeyCode::Char('d') | KeyCode::Delete => {
                    self.remove_selected();
                }
                KeyCode::Char('a') | KeyCode::Char('/') => {
                    self.open_search();
                }
                KeyCode::Char('r') => {
                    self.spawn_refresh();
                }
                KeyCode::Char('R') => {
                    self.spawn_reset();
                }
                KeyCode::Char('?') => {
                    self.show_help = true;
                }
                _ => {}
            },
            AppState::Search => match key_event.code {
                KeyCode::Esc => {
                    self.close_search();
                }
                KeyCode::Enter => {
                    self.add_selected_result();
                }
                KeyCode::Up => {
                    if self.search.selected > 0 {
                        self.search.selected -= 1;
                    }
                }
                KeyCode::Down => {
                    if self.search.selected + 1 < self.search.results.len() {
                        self.search.selected += 1;
                    }
                }
                KeyCode::Backspace => {
                    self.search.query.pop();
                    self.submit_query();
                }
                KeyCode::Char(c) => {
                    self.search.query.push(c);
                    self.submit_query();
                }
                _ => {}
            },
        }
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.store.cities().len();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.store.cities().len();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    /// Swaps the selected city with the one above it; the selection follows
    fn move_city_up(&mut self) {
        if self.selected_index == 0 {
            return;
        }
        let to = self.selected_index - 1;
        if self.store.reorder_city(self.selected_index, to) {
            self.selected_index = to;
        }
    }

    /// Swaps the selected city with the one below it; the selection follows
    fn move_city_down(&mut self) {
        let to = self.selected_index + 1;
        if self.store.reorder_city(self.selected_index, to) {
            self.selected_index = to;
        }
    }

    fn remove_selected(&mut self) {
        let Some(city) = self.store.cities().get(self.selected_index).cloned() else {
            return;
        };
        if self.store.remove_city(&city.name) {
            self.status = Some(format!("Removed {}", city.name));
        }
        self.clamp_selection();
    }

    fn open_search(&mut self) {
        self.state = AppState::Search;
        self.search = SearchState::default();
        self.status = None;
    }

    fn close_search(&mut self) {
        self.search_worker.cancel();
        self.search = SearchState::default();
        self.state = AppState::Dashboard;
    }

    fn submit_query(&mut self) {
        self.search.pending = true;
        self.search.error = None;
        self.search_worker.submit(&self.search.query);
    }

    fn add_selected_result(&mut self) {
        let Some(result) = self.search.results.get(self.search.selected) else {
            return;
        };
        let city = result.to_city();
        self.status = Some(format!("Adding {}...", city.name));
        self.close_search();

        let store = self.store.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let name = city.name.clone();
            let outcome = store.add_city(city).await;
            let _ = tx.send(TaskEvent::Added { name, outcome });
        });
    }

    fn spawn_refresh(&mut self) {
        self.status = None;
        let store = self.store.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            store.refresh_weather().await;
            let _ = tx.send(TaskEvent::Refreshed);
        });
    }

    fn spawn_reset(&mut self) {
        self.status = Some("Restored default cities".to_string());
        self.selected_index = 0;
        let store = self.store.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            store.reset_to_defaults().await;
            let _ = tx.send(TaskEvent::Refreshed);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;
    use weatherdash::data::{
        CityWeatherData, GeocodingClient, WeatherError, WeatherGateway,
    };

    struct FixedGateway;

    #[async_trait]
    impl WeatherGateway for FixedGateway {
        async fn fetch_one(&self, city: &CityConfig) -> Result<CityWeatherData, WeatherError> {
            Ok(CityWeatherData {
                city: city.name.clone(),
                country: city.country.clone(),
                timezone: city.timezone.clone(),
                temperature: 20,
                feels_like: 19,
                humidity: 50,
                wind_speed: 10.0,
                weather_code: 0,
                weather_description: "Clear sky".to_string(),
                timestamp: chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
            })
        }
    }

    fn cities() -> Vec<CityConfig> {
        vec![
            CityConfig::new("London", "GB", 51.5074, -0.1278, "Europe/London"),
            CityConfig::new("Tokyo", "JP", 35.6762, 139.6503, "Asia/Tokyo"),
        ]
    }

    fn test_app() -> App {
        let store = CityStore::with_defaults(Arc::new(FixedGateway), None, cities());
        let worker = SearchWorker::new(
            GeocodingClient::new().with_base_url("http://127.0.0.1:9"),
            Duration::from_millis(10),
        );
        App::new(store, worker)
    }

    async fn ready_app() -> App {
        let mut app = test_app();
        app.store.initialize().await;
        app.tick();
        app
    }

    /// Helper to create a KeyEvent for testing
    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn candidate(name: &str, lat: f64, lon: f64) -> GeocodingResult {
        GeocodingResult {
            id: 1,
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
            country: "Norway".to_string(),
            country_code: "NO".to_string(),
            timezone: "Europe/Oslo".to_string(),
            admin1: None,
            admin2: None,
            population: None,
        }
    }

    #[tokio::test]
    async fn test_app_starts_loading() {
        let mut app = test_app();
        assert_eq!(app.state, AppState::Loading);
        app.tick();
        assert_eq!(app.state, AppState::Loading);
    }

    #[tokio::test]
    async fn test_tick_moves_to_dashboard_once_initialized() {
        let app = ready_app().await;
        assert_eq!(app.state, AppState::Dashboard);
        assert!(app.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_q_during_loading_quits() {
        let mut app = test_app();
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_selection_wraps() {
        let mut app = ready_app().await;

        app.handle_key(key_event(KeyCode::Up));
        assert_eq!(app.selected_index, 1);

        app.handle_key(key_event(KeyCode::Char('j')));
        assert_eq!(app.selected_index, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_selected_city() {
        let mut app = ready_app().await;
        app.handle_key(key_event(KeyCode::Char('j')));
        app.handle_key(key_event(KeyCode::Char('d')));

        let names: Vec<String> = app.store.cities().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["London"]);
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.status.as_deref(), Some("Removed Tokyo"));
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let mut app = ready_app().await;
        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);

        app.handle_key(key_event(KeyCode::Char('d')));
        assert_eq!(app.store.cities().len(), 2);

        app.handle_key(key_event(KeyCode::Esc));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_search_typing_and_escape() {
        let mut app = ready_app().await;
        app.handle_key(key_event(KeyCode::Char('/')));
        assert_eq!(app.state, AppState::Search);

        app.handle_key(key_event(KeyCode::Char('O')));
        app.handle_key(key_event(KeyCode::Char('s')));
        app.handle_key(key_event(KeyCode::Backspace));
        assert_eq!(app.search.query, "O");
        assert!(app.search.pending);

        // 'q' is text here, not quit
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(!app.should_quit);

        app.handle_key(key_event(KeyCode::Esc));
        assert_eq!(app.state, AppState::Dashboard);
        assert!(app.search.query.is_empty());
    }

    #[tokio::test]
    async fn test_stale_search_message_is_ignored() {
        let mut app = ready_app().await;
        app.handle_key(key_event(KeyCode::Char('a')));
        app.handle_key(key_event(KeyCode::Char('O')));
        app.search.results = vec![candidate("Oslo", 59.9139, 10.7522)];

        // Generation 0 predates the keystroke above
        app.apply_search(SearchMessage {
            generation: 0,
            query: "x".to_string(),
            outcome: Ok(Vec::new()),
        });

        assert_eq!(app.search.results.len(), 1);
    }

    #[tokio::test]
    async fn test_enter_adds_selected_result() {
        let mut app = ready_app().await;
        app.handle_key(key_event(KeyCode::Char('a')));
        app.search.results = vec![
            candidate("Oslo", 59.9139, 10.7522),
            candidate("Bergen", 60.3913, 5.3221),
        ];
        app.handle_key(key_event(KeyCode::Down));
        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.state, AppState::Dashboard);

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.tick();
            if app.status.as_deref() == Some("Added Bergen") {
                break;
            }
        }

        assert_eq!(app.status.as_deref(), Some("Added Bergen"));
        assert_eq!(app.store.cities().len(), 3);
        assert_eq!(app.store.weather_data().len(), 3);
    }

    #[tokio::test]
    async fn test_enter_with_duplicate_reports_it() {
        let mut app = ready_app().await;
        app.handle_key(key_event(KeyCode::Char('a')));
        app.search.results = vec![candidate("London", 51.5074, -0.1278)];
        app.handle_key(key_event(KeyCode::Enter));

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.tick();
            if app.status.as_deref() != Some("Adding London...") {
                break;
            }
        }

        assert_eq!(
            app.status.as_deref(),
            Some("London is already on the dashboard")
        );
        assert_eq!(app.store.cities().len(), 2);
    }

    #[tokio::test]
    async fn test_shift_keys_reorder_selected_city() {
        let mut app = ready_app().await;

        app.handle_key(key_event(KeyCode::Char('J')));
        let names: Vec<String> = app.store.cities().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Tokyo", "London"]);
        assert_eq!(app.selected_index, 1, "selection follows the moved city");

        // Already last, nothing to do
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));
        assert_eq!(app.selected_index, 1);

        app.handle_key(KeyEvent::new(KeyCode::Up, KeyModifiers::SHIFT));
        let names: Vec<String> = app.store.cities().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["London", "Tokyo"]);
        assert_eq!(app.selected_index, 0);

        let weather: Vec<String> = app
            .store
            .weather_data()
            .iter()
            .map(|r| r.city_name().to_string())
            .collect();
        assert_eq!(weather, vec!["London", "Tokyo"]);
    }

    #[tokio::test]
    async fn test_manual_refresh_updates_last_refresh() {
        let mut app = ready_app().await;
        app.last_refresh = None;

        app.handle_key(key_event(KeyCode::Char('r')));
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.tick();
            if app.last_refresh.is_some() {
                break;
            }
        }

        assert!(app.last_refresh.is_some());
        assert!(!app.store.is_loading());
    }
}
