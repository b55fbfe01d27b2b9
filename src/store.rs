//! City and weather state store
//!
//! `CityStore` owns the canonical city list and the last fetched weather
//! results, and decides how much network traffic each change costs:
//!
//! - `initialize`, `reset_to_defaults` and `refresh_weather` fetch the whole
//!   list in one batch and replace the results wholesale.
//! - `add_city` fetches only the new city.
//! - `remove_city` and `reorder_city` never touch the network.
//!
//! The store is a cheap cloneable handle. Build one at the application root
//! and pass clones down; there is no global instance. State is guarded by a
//! lock that is never held across an `.await` or a disk write, so operations
//! interleave at their network calls and overlapping operations resolve
//! last-write-wins.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::data::{
    default_cities, dominant_theme, CityConfig, WeatherGateway, WeatherResult, WeatherTheme,
};
use crate::storage::CityStorage;

/// What `add_city` did with the requested city
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Appended and its weather fetched
    Added,
    /// A held city is within the same-city tolerance; nothing changed
    Duplicate,
    /// A held city already uses this name; nothing changed
    NameTaken,
}

/// Point-in-time copy of the store state, for rendering
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub cities: Vec<CityConfig>,
    pub weather_data: Vec<WeatherResult>,
    pub is_loading: bool,
    pub is_initialized: bool,
}

#[derive(Debug)]
struct StoreState {
    cities: Vec<CityConfig>,
    weather_data: Vec<WeatherResult>,
    is_loading: bool,
    is_initialized: bool,
    init_started: bool,
}

struct Inner {
    gateway: Arc<dyn WeatherGateway>,
    storage: Option<CityStorage>,
    defaults: Vec<CityConfig>,
    state: Mutex<StoreState>,
}

/// Shared handle to the city list and its weather
#[derive(Clone)]
pub struct CityStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CityStore")
            .field("state", &*self.inner.state.lock())
            .finish_non_exhaustive()
    }
}

impl CityStore {
    /// Creates a store seeded with the built-in default cities
    ///
    /// Pass `None` for `storage` to run without persistence.
    pub fn new(gateway: Arc<dyn WeatherGateway>, storage: Option<CityStorage>) -> Self {
        Self::with_defaults(gateway, storage, default_cities())
    }

    /// Creates a store with a custom default city list
    pub fn with_defaults(
        gateway: Arc<dyn WeatherGateway>,
        storage: Option<CityStorage>,
        defaults: Vec<CityConfig>,
    ) -> Self {
        let state = StoreState {
            cities: defaults.clone(),
            weather_data: Vec::new(),
            is_loading: true,
            is_initialized: false,
            init_started: false,
        };

        Self {
            inner: Arc::new(Inner {
                gateway,
                storage,
                defaults,
                state: Mutex::new(state),
            }),
        }
    }

    /// Loads the persisted cities (or the defaults) and fetches their weather
    ///
    /// Runs once per store; later calls return immediately. The loaded list
    /// is not written back.
    pub async fn initialize(&self) {
        {
            let mut state = self.inner.state.lock();
            if state.init_started {
                return;
            }
            state.init_started = true;
        }

        let cities = match self.inner.storage.as_ref().and_then(CityStorage::load) {
            Some(stored) if !stored.is_empty() => {
                tracing::info!(count = stored.len(), "restored persisted cities");
                stored
            }
            _ => {
                tracing::info!("no persisted cities, using defaults");
                self.inner.defaults.clone()
            }
        };

        self.inner.state.lock().cities = cities.clone();
        self.fetch_all(cities).await;
        self.inner.state.lock().is_initialized = true;
    }

    /// Adds a city and fetches weather for it alone
    ///
    /// The city is appended to the list immediately; its result is appended
    /// once the fetch settles. Between the two, `cities()` is one longer than
    /// `weather_data()`. A result whose city was removed in the meantime is
    /// dropped.
    pub async fn add_city(&self, city: CityConfig) -> AddOutcome {
        let pending = {
            let mut state = self.inner.state.lock();
            if state.cities.iter().any(|held| held.is_same_city(&city)) {
                tracing::debug!(city = %city.name, "ignoring duplicate city");
                return AddOutcome::Duplicate;
            }
            if state.cities.iter().any(|held| held.name == city.name) {
                tracing::debug!(city = %city.name, "city name already in use");
                return AddOutcome::NameTaken;
            }

            state.cities.push(city.clone());
            self.pending_save(&state)
        };
        self.save(pending);
        tracing::info!(city = %city.name, "added city");

        let results = self
            .inner
            .gateway
            .fetch_many(std::slice::from_ref(&city))
            .await;

        let Some(result) = results.into_iter().next() else {
            tracing::warn!(city = %city.name, "weather fetch returned no result");
            return AddOutcome::Added;
        };

        let mut state = self.inner.state.lock();
        let still_held = state
            .cities
            .iter()
            .any(|held| held.name == city.name && held.is_same_city(&city));
        let already_fetched = state
            .weather_data
            .iter()
            .any(|held| held.city_name() == city.name);
        if !still_held {
            tracing::debug!(city = %city.name, "city removed before its weather arrived");
        } else if already_fetched {
            // A batch fetch that included this city settled first
            tracing::debug!(city = %city.name, "weather already present, keeping batch result");
        } else {
            state.weather_data.push(result);
        }

        AddOutcome::Added
    }

    /// Removes every city named `name` together with its weather
    ///
    /// Purely local, never fetches. Returns true if a city was removed.
    pub fn remove_city(&self, name: &str) -> bool {
        let pending = {
            let mut state = self.inner.state.lock();

            let before = state.cities.len();
            state.cities.retain(|city| city.name != name);
            state.weather_data.retain(|result| result.city_name() != name);

            if state.cities.len() == before {
                return false;
            }
            self.pending_save(&state)
        };

        tracing::info!(city = %name, "removed city");
        self.save(pending);
        true
    }

    /// Moves the city at `from` to position `to`, shifting the ones between
    ///
    /// Results follow the new city order. Never fetches. Returns false, and
    /// changes nothing, when either index is out of range or they are equal.
    pub fn reorder_city(&self, from: usize, to: usize) -> bool {
        let pending = {
            let mut state = self.inner.state.lock();
            let len = state.cities.len();
            if from >= len || to >= len || from == to {
                return false;
            }

            let city = state.cities.remove(from);
            state.cities.insert(to, city);

            let order: Vec<String> = state.cities.iter().map(|c| c.name.clone()).collect();
            state.weather_data.sort_by_key(|result| {
                order
                    .iter()
                    .position(|name| name == result.city_name())
                    .unwrap_or(usize::MAX)
            });
            self.pending_save(&state)
        };

        tracing::debug!(from, to, "reordered cities");
        self.save(pending);
        true
    }

    /// Replaces the list with the defaults and fetches all of them
    pub async fn reset_to_defaults(&self) {
        let defaults = self.inner.defaults.clone();
        let pending = {
            let mut state = self.inner.state.lock();
            state.cities = defaults.clone();
            self.pending_save(&state)
        };
        self.save(pending);
        tracing::info!("reset cities to defaults");

        self.fetch_all(defaults).await;
    }

    /// Refetches weather for the current list
    pub async fn refresh_weather(&self) {
        let cities = self.cities();
        tracing::debug!(count = cities.len(), "refreshing weather");
        self.fetch_all(cities).await;
    }

    /// Batch fetch that replaces the results wholesale and drives `is_loading`
    async fn fetch_all(&self, cities: Vec<CityConfig>) {
        if cities.is_empty() {
            let mut state = self.inner.state.lock();
            state.weather_data.clear();
            state.is_loading = false;
            return;
        }

        self.inner.state.lock().is_loading = true;

        let results = self.inner.gateway.fetch_many(&cities).await;
        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::info!(total = results.len(), failed, "weather fetched");

        let mut state = self.inner.state.lock();
        state.weather_data = results;
        state.is_loading = false;
    }

    /// Copy of the list to write back, taken under the lock
    ///
    /// None before initialization or without storage.
    fn pending_save(&self, state: &StoreState) -> Option<Vec<CityConfig>> {
        if !state.is_initialized {
            return None;
        }
        self.inner.storage.as_ref().map(|_| state.cities.clone())
    }

    /// Writes a list taken by `pending_save`; call with the lock released
    fn save(&self, pending: Option<Vec<CityConfig>>) {
        if let (Some(storage), Some(cities)) = (&self.inner.storage, pending) {
            storage.save(&cities);
        }
    }

    pub fn cities(&self) -> Vec<CityConfig> {
        self.inner.state.lock().cities.clone()
    }

    pub fn weather_data(&self) -> Vec<WeatherResult> {
        self.inner.state.lock().weather_data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().is_loading
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().is_initialized
    }

    /// Copy of the whole state, taken under one lock
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.state.lock();
        StoreSnapshot {
            cities: state.cities.clone(),
            weather_data: state.weather_data.clone(),
            is_loading: state.is_loading,
            is_initialized: state.is_initialized,
        }
    }

    /// Most common theme among the successful results
    pub fn dominant_theme(&self) -> WeatherTheme {
        let state = self.inner.state.lock();
        dominant_theme(state.weather_data.iter().filter_map(WeatherResult::data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::weather::settle;
    use crate::data::{CityWeatherData, WeatherError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use futures::future::join_all;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    /// Gateway that records every batch and fails the cities it is told to
    #[derive(Default)]
    struct MockGateway {
        failing: Vec<String>,
        calls: Mutex<Vec<Vec<String>>>,
        gate: Option<Arc<Notify>>,
    }

    impl MockGateway {
        fn failing(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Default::default()
            }
        }

        fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl WeatherGateway for MockGateway {
        async fn fetch_one(&self, city: &CityConfig) -> Result<CityWeatherData, WeatherError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.failing.contains(&city.name) {
                return Err(WeatherError::Status {
                    city: city.name.clone(),
                    reason: "Bad Gateway".to_string(),
                });
            }
            Ok(weather_for(city))
        }

        async fn fetch_many(&self, cities: &[CityConfig]) -> Vec<WeatherResult> {
            self.calls
                .lock()
                .push(cities.iter().map(|c| c.name.clone()).collect());
            let outcomes = join_all(cities.iter().map(|city| self.fetch_one(city))).await;
            cities
                .iter()
                .zip(outcomes)
                .map(|(city, outcome)| settle(city, outcome))
                .collect()
        }
    }

    fn weather_for(city: &CityConfig) -> CityWeatherData {
        CityWeatherData {
            city: city.name.clone(),
            country: city.country.clone(),
            timezone: city.timezone.clone(),
            temperature: 18,
            feels_like: 17,
            humidity: 60,
            wind_speed: 9.5,
            weather_code: 1,
            weather_description: "Mainly clear".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 7, 15)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
        }
    }

    fn london() -> CityConfig {
        CityConfig::new("London", "GB", 51.5074, -0.1278, "Europe/London")
    }

    fn tokyo() -> CityConfig {
        CityConfig::new("Tokyo", "JP", 35.6762, 139.6503, "Asia/Tokyo")
    }

    fn oslo() -> CityConfig {
        CityConfig::new("Oslo", "NO", 59.9139, 10.7522, "Europe/Oslo")
    }

    fn default_names() -> Vec<String> {
        default_cities().into_iter().map(|c| c.name).collect()
    }

    fn create_store(gateway: Arc<MockGateway>) -> (CityStore, CityStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = CityStorage::with_dir(temp_dir.path().to_path_buf());
        let store = CityStore::new(gateway, Some(storage.clone()));
        (store, storage, temp_dir)
    }

    #[tokio::test]
    async fn test_initialize_from_persisted_cities() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[london(), tokyo()]);

        assert!(!store.is_initialized());
        assert!(store.is_loading());

        store.initialize().await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.cities, vec![london(), tokyo()]);
        assert_eq!(snapshot.weather_data.len(), 2);
        assert!(snapshot.weather_data.iter().all(WeatherResult::is_success));
        assert!(snapshot.is_initialized);
        assert!(!snapshot.is_loading);
        assert_eq!(gateway.calls(), vec![vec!["London", "Tokyo"]]);
    }

    #[tokio::test]
    async fn test_initialize_falls_back_to_defaults_without_persisting() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());

        store.initialize().await;

        assert_eq!(store.cities(), default_cities());
        assert_eq!(gateway.calls(), vec![default_names()]);
        assert!(storage.load().is_none(), "initial population must not be persisted");
    }

    #[tokio::test]
    async fn test_initialize_treats_empty_persisted_list_as_absent() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[]);

        store.initialize().await;

        assert_eq!(store.cities(), default_cities());
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let gateway = Arc::new(MockGateway::default());
        let (store, _storage, _temp_dir) = create_store(gateway.clone());

        store.initialize().await;
        store.initialize().await;

        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_initialize_settles_under_total_failure() {
        let gateway = Arc::new(MockGateway::failing(&["London", "Tokyo"]));
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[london(), tokyo()]);

        store.initialize().await;

        let snapshot = store.snapshot();
        assert!(snapshot.is_initialized);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.weather_data.len(), 2);
        assert!(snapshot.weather_data.iter().all(|r| !r.is_success()));
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let gateway = Arc::new(MockGateway::failing(&["Tokyo"]));
        let (store, _storage, _temp_dir) = create_store(gateway.clone());

        store.initialize().await;

        let results = store.weather_data();
        assert_eq!(results.len(), 5);
        for result in &results {
            assert_eq!(result.is_success(), result.city_name() != "Tokyo");
        }
    }

    #[tokio::test]
    async fn test_add_duplicate_is_a_silent_noop() {
        let gateway = Arc::new(MockGateway::default());
        let (store, _storage, _temp_dir) = create_store(gateway.clone());
        store.initialize().await;

        let nearby = CityConfig::new("Londinium", "GB", 51.5100, -0.1300, "Europe/London");
        let outcome = store.add_city(nearby).await;

        assert_eq!(outcome, AddOutcome::Duplicate);
        assert_eq!(store.cities().len(), 5);
        assert_eq!(store.weather_data().len(), 5);
        assert_eq!(gateway.calls().len(), 1, "duplicate must not fetch");
    }

    #[tokio::test]
    async fn test_add_fetches_only_new_city_and_persists() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        store.initialize().await;

        let outcome = store.add_city(oslo()).await;

        assert_eq!(outcome, AddOutcome::Added);
        assert_eq!(gateway.calls().last().unwrap(), &vec!["Oslo".to_string()]);
        assert_eq!(store.cities().last().unwrap(), &oslo());
        assert_eq!(store.weather_data().last().unwrap().city_name(), "Oslo");
        assert_eq!(storage.load().unwrap().last().unwrap(), &oslo());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_add_with_taken_name_is_rejected() {
        let gateway = Arc::new(MockGateway::default());
        let (store, _storage, _temp_dir) = create_store(gateway.clone());
        store.initialize().await;

        let other_london = CityConfig::new("London", "CA", 42.9849, -81.2453, "America/Toronto");
        let outcome = store.add_city(other_london).await;

        assert_eq!(outcome, AddOutcome::NameTaken);
        assert_eq!(store.cities().len(), 5);
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_add_failure_is_kept_as_failure_result() {
        let gateway = Arc::new(MockGateway::failing(&["Oslo"]));
        let (store, _storage, _temp_dir) = create_store(gateway.clone());
        store.initialize().await;

        store.add_city(oslo()).await;

        let last = store.weather_data().pop().unwrap();
        assert_eq!(last.city_name(), "Oslo");
        assert!(!last.is_success());
    }

    #[tokio::test]
    async fn test_add_is_two_phase() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(MockGateway::gated(gate.clone()));
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[london()]);

        let init = {
            let store = store.clone();
            tokio::spawn(async move { store.initialize().await })
        };
        gate.notify_one();
        init.await.unwrap();

        let add = {
            let store = store.clone();
            tokio::spawn(async move { store.add_city(tokyo()).await })
        };
        for _ in 0..100 {
            if store.cities().len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }

        // Phase 1 done, phase 2 still waiting on the network
        assert_eq!(store.cities(), vec![london(), tokyo()]);
        assert_eq!(store.weather_data().len(), 1);
        assert!(!store.is_loading(), "add does not raise the global loading flag");

        gate.notify_one();
        assert_eq!(add.await.unwrap(), AddOutcome::Added);

        let names: Vec<String> = store
            .weather_data()
            .iter()
            .map(|r| r.city_name().to_string())
            .collect();
        assert_eq!(names, vec!["London", "Tokyo"]);
    }

    #[tokio::test]
    async fn test_result_of_city_removed_mid_fetch_is_dropped() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(MockGateway::gated(gate.clone()));
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[london()]);

        gate.notify_one();
        store.initialize().await;

        let add = {
            let store = store.clone();
            tokio::spawn(async move { store.add_city(tokyo()).await })
        };
        for _ in 0..100 {
            if store.cities().len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(store.remove_city("Tokyo"));
        gate.notify_one();
        add.await.unwrap();

        assert_eq!(store.cities(), vec![london()]);
        assert_eq!(store.weather_data().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_never_fetches() {
        let gateway = Arc::new(MockGateway::failing(&["Tokyo"]));
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        store.initialize().await;

        assert!(store.remove_city("London"));
        assert!(store.remove_city("Tokyo"));
        assert!(!store.remove_city("Atlantis"));

        assert_eq!(gateway.calls().len(), 1, "removal must not fetch");
        let snapshot = store.snapshot();
        assert_eq!(snapshot.cities.len(), 3);
        assert_eq!(snapshot.weather_data.len(), 3);
        assert!(snapshot
            .weather_data
            .iter()
            .all(|r| r.city_name() != "London" && r.city_name() != "Tokyo"));
        assert_eq!(storage.load().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_remove_before_initialize_does_not_persist() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());

        assert!(store.remove_city("London"));

        assert!(storage.load().is_none());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_after_removing_everything() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        store.initialize().await;

        for name in default_names() {
            store.remove_city(&name);
        }
        assert!(store.cities().is_empty());
        assert!(store.weather_data().is_empty());
        let calls_before = gateway.calls().len();

        store.reset_to_defaults().await;

        assert_eq!(store.cities(), default_cities());
        assert_eq!(store.weather_data().len(), 5);
        let calls = gateway.calls();
        assert_eq!(calls.len(), calls_before + 1);
        assert_eq!(calls.last().unwrap(), &default_names());
        assert_eq!(storage.load(), Some(default_cities()));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_refresh_uses_current_cities() {
        let gateway = Arc::new(MockGateway::default());
        let (store, _storage, _temp_dir) = create_store(gateway.clone());
        store.initialize().await;
        store.remove_city("London");
        store.add_city(oslo()).await;

        store.refresh_weather().await;

        let calls = gateway.calls();
        let last = calls.last().unwrap();
        assert_eq!(last.len(), 5);
        assert!(!last.contains(&"London".to_string()));
        assert_eq!(last.last().unwrap(), "Oslo");
        assert_eq!(store.weather_data().len(), 5);
    }

    #[tokio::test]
    async fn test_refresh_with_no_cities_skips_network() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[london()]);
        store.initialize().await;
        store.remove_city("London");

        store.refresh_weather().await;

        assert_eq!(gateway.calls().len(), 1);
        assert!(store.weather_data().is_empty());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_store_without_storage() {
        let gateway = Arc::new(MockGateway::default());
        let store = CityStore::with_defaults(gateway.clone(), None, vec![london()]);

        store.initialize().await;
        store.add_city(tokyo()).await;

        assert_eq!(store.cities(), vec![london(), tokyo()]);
        assert_eq!(store.weather_data().len(), 2);
    }

    async fn wait_for_calls(gateway: &MockGateway, count: usize) {
        for _ in 0..100 {
            if gateway.calls().len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_is_loading_only_while_batch_outstanding() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(MockGateway::gated(gate.clone()));
        let store = CityStore::with_defaults(gateway.clone(), None, vec![london()]);

        gate.notify_one();
        store.initialize().await;
        assert!(!store.is_loading());

        let refresh = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_weather().await })
        };
        wait_for_calls(&gateway, 2).await;
        assert!(store.is_loading(), "refresh in flight");
        gate.notify_one();
        refresh.await.unwrap();
        assert!(!store.is_loading());

        let reset = {
            let store = store.clone();
            tokio::spawn(async move { store.reset_to_defaults().await })
        };
        wait_for_calls(&gateway, 3).await;
        assert!(store.is_loading(), "reset in flight");
        gate.notify_one();
        reset.await.unwrap();
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_add_skips_result_already_delivered_by_batch() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(MockGateway::gated(gate.clone()));
        let store = CityStore::with_defaults(gateway.clone(), None, vec![london()]);

        gate.notify_one();
        store.initialize().await;

        let add = {
            let store = store.clone();
            tokio::spawn(async move { store.add_city(tokyo()).await })
        };
        wait_for_calls(&gateway, 2).await;

        // A refresh covering Tokyo lands while the add is still waiting
        store
            .inner
            .state
            .lock()
            .weather_data
            .push(WeatherResult::Success(weather_for(&tokyo())));

        gate.notify_one();
        assert_eq!(add.await.unwrap(), AddOutcome::Added);

        let names: Vec<String> = store
            .weather_data()
            .iter()
            .map(|r| r.city_name().to_string())
            .collect();
        assert_eq!(names, vec!["London", "Tokyo"]);
    }

    #[tokio::test]
    async fn test_reorder_moves_city_and_its_weather() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[london(), tokyo(), oslo()]);
        store.initialize().await;

        assert!(store.reorder_city(2, 0));

        assert_eq!(store.cities(), vec![oslo(), london(), tokyo()]);
        let names: Vec<String> = store
            .weather_data()
            .iter()
            .map(|r| r.city_name().to_string())
            .collect();
        assert_eq!(names, vec!["Oslo", "London", "Tokyo"]);
        assert_eq!(storage.load(), Some(vec![oslo(), london(), tokyo()]));
        assert_eq!(gateway.calls().len(), 1, "reorder must not fetch");
    }

    #[tokio::test]
    async fn test_reorder_with_bad_indices_changes_nothing() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[london(), tokyo()]);
        store.initialize().await;
        let before = store.snapshot();

        assert!(!store.reorder_city(0, 2));
        assert!(!store.reorder_city(5, 0));
        assert!(!store.reorder_city(1, 1));

        let after = store.snapshot();
        assert_eq!(after.cities, before.cities);
        assert_eq!(after.weather_data.len(), before.weather_data.len());
        assert_eq!(storage.load(), Some(vec![london(), tokyo()]));
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_reorder_before_initialize_does_not_persist() {
        let gateway = Arc::new(MockGateway::default());
        let (store, storage, _temp_dir) = create_store(gateway.clone());

        assert!(store.reorder_city(0, 1));

        assert_eq!(store.cities()[1].name, default_cities()[0].name);
        assert!(storage.load().is_none());
    }

    #[tokio::test]
    async fn test_dominant_theme_ignores_failures() {
        let gateway = Arc::new(MockGateway::failing(&["Tokyo"]));
        let (store, storage, _temp_dir) = create_store(gateway.clone());
        storage.save(&[london(), tokyo()]);

        assert_eq!(store.dominant_theme(), WeatherTheme::Sunny);
        store.initialize().await;

        // Mock weather is code 1, "Mainly clear"
        assert_eq!(store.dominant_theme(), WeatherTheme::Sunny);
    }
}
