//! weatherdash - current weather for your own list of cities
//!
//! Runs the terminal dashboard by default, or one of the scripting
//! subcommands (`show`, `cities`, `search`, `add`, `remove`, `reset`).

mod app;
mod ui;

use std::error::Error;
use std::io;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use weatherdash::cli::{join_query, pick_candidate, Cli, CliError, Command};
use weatherdash::commands;
use weatherdash::config::Config;
use weatherdash::data::{GeocodingClient, WeatherClient};
use weatherdash::logging;
use weatherdash::refresh::{self, RefreshConfig, RefreshHandle, RefreshMessage};
use weatherdash::search::SearchWorker;
use weatherdash::storage::CityStorage;
use weatherdash::store::{AddOutcome, CityStore};

use app::App;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Network clients built from config
struct Clients {
    weather: WeatherClient,
    geocoding: GeocodingClient,
}

impl Clients {
    fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("weatherdash/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            weather: WeatherClient::with_client(http.clone()).with_base_url(&config.weather_base_url),
            geocoding: GeocodingClient::with_client(http).with_base_url(&config.geocoding_base_url),
        })
    }
}

/// `--data-dir`, then the config file, then the platform data directory
fn resolve_storage(cli: &Cli, config: &Config) -> Option<CityStorage> {
    cli.data_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .map(CityStorage::with_dir)
        .or_else(CityStorage::new)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let storage = resolve_storage(&cli, &config);

    match cli.command {
        None => run_dashboard(&config, storage).await,
        Some(command) => {
            logging::init_stderr("warn");
            if let Err(err) = run_command(command, &config, storage).await {
                eprintln!("error: {}", err);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

/// Runs one subcommand and prints its output
async fn run_command(
    command: Command,
    config: &Config,
    storage: Option<CityStorage>,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Cities => {
            print!("{}", commands::render_city_list(&commands::saved_or_default(storage.as_ref())));
        }
        Command::Remove { name } => {
            let storage = storage.ok_or("no data directory available to save cities in")?;
            if !commands::remove_saved(&storage, &name) {
                return Err(CliError::UnknownCity(name).into());
            }
            print!("{}", commands::render_city_list(&commands::saved_or_default(Some(&storage))));
        }
        Command::Search { query } => {
            let clients = Clients::from_config(config)?;
            let query = join_query(&query);
            let results = clients.geocoding.search(&query).await?;
            if results.is_empty() {
                return Err(CliError::NoMatch(query).into());
            }
            print!("{}", commands::render_candidates(&results));
        }
        Command::Show => {
            let store = open_store(config, storage)?;
            store.initialize().await;
            print!("{}", commands::render_report(&store.snapshot(), chrono::Utc::now()));
        }
        Command::Add { query, pick } => {
            let clients = Clients::from_config(config)?;
            let query = join_query(&query);
            let results = clients.geocoding.search(&query).await?;
            let city = pick_candidate(&results, pick, &query)?.to_city();

            let store = CityStore::new(Arc::new(clients.weather), storage);
            store.initialize().await;
            match store.add_city(city.clone()).await {
                AddOutcome::Added => {}
                AddOutcome::Duplicate => eprintln!("{} is already saved", city.name),
                AddOutcome::NameTaken => {
                    eprintln!("A city named {} is already saved", city.name)
                }
            }
            print!("{}", commands::render_report(&store.snapshot(), chrono::Utc::now()));
        }
        Command::Reset => {
            if let Some(storage) = &storage {
                storage.clear();
            }
            let store = open_store(config, storage)?;
            store.initialize().await;
            print!("{}", commands::render_report(&store.snapshot(), chrono::Utc::now()));
        }
    }
    Ok(())
}

fn open_store(config: &Config, storage: Option<CityStorage>) -> Result<CityStore, Box<dyn Error>> {
    let clients = Clients::from_config(config)?;
    Ok(CityStore::new(Arc::new(clients.weather), storage))
}

/// Runs the interactive dashboard until the user quits
async fn run_dashboard(config: &Config, storage: Option<CityStorage>) -> Result<(), Box<dyn Error>> {
    if let Some(storage) = &storage {
        // Logging is best effort; the dashboard runs without it
        let _ = logging::init_file(storage.data_dir(), "info");
    }

    let clients = Clients::from_config(config)?;
    let store = CityStore::new(Arc::new(clients.weather), storage);
    let search = SearchWorker::new(clients.geocoding, config.search_debounce());
    let mut app = App::new(store.clone(), search);

    tokio::spawn({
        let store = store.clone();
        async move { store.initialize().await }
    });

    let mut refresh_handle = RefreshHandle::spawn(
        store,
        RefreshConfig {
            interval: config.refresh_interval(),
            enabled: config.auto_refresh,
        },
    );

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    loop {
        app.tick();
        while let Some(message) = refresh::try_recv(&mut refresh_handle) {
            if message == RefreshMessage::RefreshCompleted {
                app.mark_refreshed();
            }
        }

        terminal.draw(|f| ui::render(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }

    refresh_handle.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
