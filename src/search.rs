//! Debounced city search
//!
//! Typing in the search box submits a query per keystroke. Each submission
//! gets a generation number; the worker waits out the debounce delay, skips
//! the request if a newer query has arrived since, and tags the outcome with
//! its generation. The receiver keeps only outcomes whose generation is still
//! current, so a slow response to an old query never overwrites a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::data::geocoding::MIN_QUERY_LEN;
use crate::data::{GeocodingClient, GeocodingResult};

/// Outcome of one search, tagged with the generation it was submitted as
#[derive(Debug, Clone)]
pub struct SearchMessage {
    pub generation: u64,
    pub query: String,
    /// Candidates, or a user-facing error message
    pub outcome: Result<Vec<GeocodingResult>, String>,
}

/// Runs searches in the background with a "latest query wins" guard
pub struct SearchWorker {
    client: GeocodingClient,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    sender: mpsc::Sender<SearchMessage>,
    /// Channel for receiving search outcomes
    pub receiver: mpsc::Receiver<SearchMessage>,
}

impl SearchWorker {
    pub fn new(client: GeocodingClient, debounce: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(16);
        Self {
            client,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            sender,
            receiver,
        }
    }

    /// Generation of the most recent submission
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns true if `message` answers the most recent submission
    pub fn is_current(&self, message: &SearchMessage) -> bool {
        message.generation == self.current_generation()
    }

    /// Supersedes any pending search without starting a new one
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Submits `query`, superseding earlier submissions
    ///
    /// Queries shorter than the minimum length resolve immediately to an
    /// empty list without a network call.
    pub fn submit(&self, query: &str) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim().to_string();

        let sender = self.sender.clone();
        let latest = Arc::clone(&self.generation);
        let client = self.client.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            if query.chars().count() < MIN_QUERY_LEN {
                let _ = sender
                    .send(SearchMessage {
                        generation,
                        query,
                        outcome: Ok(Vec::new()),
                    })
                    .await;
                return;
            }

            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            let outcome = client.search(&query).await.map_err(|err| {
                tracing::warn!(%query, error = %err, "city search failed");
                "Search failed. Please try again.".to_string()
            });

            // Late answers for superseded queries are dropped here and again by the receiver
            if latest.load(Ordering::SeqCst) == generation {
                let _ = sender
                    .send(SearchMessage {
                        generation,
                        query,
                        outcome,
                    })
                    .await;
            }
        });

        generation
    }
}
