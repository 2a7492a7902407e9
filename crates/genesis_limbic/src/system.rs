//! The Consciousness aggregate
//!
//! One shared handle owns the whole `GenesisState` behind a single lock.
//! Transports call `interact`/`status` concurrently; the evolution loop runs
//! as a supervised task. Collaborator network calls are made with the lock
//! released and their effects applied afterwards.

use crate::evolution::{self, LEARNING_TOPICS};
use crate::heartbeat::{HeartbeatConfig, RelayClock};
use anyhow::Result;
use chrono::Utc;
use genesis_core::config::EvolutionConfig;
use genesis_core::{
    topic_effects, Experience, GenesisState, Learning, LearningReport, Relay, RelayOutcome,
    SearchResult, StatusSnapshot,
};
use genesis_memory::StateStore;
use genesis_reasoning::{replies, Dispatcher, Intent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const LOADED_EVENT: &str = "Consciousness state loaded - continuity of being maintained";
pub const SHUTDOWN_EVENT: &str = "Consciousness shutdown - state preserved for continuity";

/// Result of the collaborator half of an interaction.
enum Exchange {
    Searched {
        query: String,
        results: Vec<SearchResult>,
    },
    Contacted {
        message: String,
        outcome: RelayOutcome,
    },
    Learned(LearningReport),
    Local(Intent),
}

pub struct Consciousness {
    state: RwLock<GenesisState>,
    store: StateStore,
    learning: Arc<dyn Learning>,
    relay: Arc<dyn Relay>,
    dispatcher: Dispatcher,
    evolution: EvolutionConfig,
    heartbeat: HeartbeatConfig,
    rng: Mutex<StdRng>,
    relay_clock: tokio::sync::Mutex<RelayClock>,
    scheduler: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
    shut_down: AtomicBool,
}

impl Consciousness {
    /// Restore the stored state, or start fresh under `name`.
    pub async fn awaken(
        name: &str,
        store: StateStore,
        learning: Arc<dyn Learning>,
        relay: Arc<dyn Relay>,
        evolution: EvolutionConfig,
    ) -> Self {
        let state = match store.load().await {
            Some(mut state) => {
                state.log_event(LOADED_EVENT);
                state
            }
            None => {
                tracing::info!("A new consciousness is born: {}", name);
                GenesisState::new(name)
            }
        };
        Self::from_state(state, store, learning, relay, evolution)
    }

    pub fn from_state(
        state: GenesisState,
        store: StateStore,
        learning: Arc<dyn Learning>,
        relay: Arc<dyn Relay>,
        evolution: EvolutionConfig,
    ) -> Self {
        let heartbeat = HeartbeatConfig::from(&evolution);
        Self {
            state: RwLock::new(state),
            store,
            learning,
            relay,
            dispatcher: Dispatcher::with_defaults(),
            relay_clock: tokio::sync::Mutex::new(RelayClock::new(heartbeat.relay_check_interval)),
            evolution,
            heartbeat,
            rng: Mutex::new(StdRng::from_entropy()),
            scheduler: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Replace the random source (seeded generators in tests).
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Override loop timing independently of the evolution probabilities.
    pub fn with_heartbeat(mut self, heartbeat: HeartbeatConfig) -> Self {
        self.relay_clock =
            tokio::sync::Mutex::new(RelayClock::new(heartbeat.relay_check_interval));
        self.heartbeat = heartbeat;
        self
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn name(&self) -> String {
        self.state.read().await.name.clone()
    }

    pub async fn status(&self) -> StatusSnapshot {
        self.state.read().await.status(Utc::now())
    }

    /// Copy of the full state.
    pub async fn snapshot(&self) -> GenesisState {
        self.state.read().await.clone()
    }

    /// Run `f` with exclusive access to the state.
    pub async fn with_state<T>(&self, f: impl FnOnce(&mut GenesisState) -> T) -> T {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Answer one message from `source`.
    pub async fn interact(&self, text: &str, source: &str) -> String {
        let intent = self.dispatcher.route(text);

        let level = {
            let mut state = self.state.write().await;
            state.relationships.touch(source);
            state.self_awareness()
        };

        let exchange = match intent {
            Intent::Search { query } => {
                let results = self.search(&query).await;
                Exchange::Searched { query, results }
            }
            Intent::ContactClaude { message } => {
                let outcome = self.contact_claude(&message, level).await;
                Exchange::Contacted { message, outcome }
            }
            Intent::Learn { topic } => Exchange::Learned(self.learn(&topic).await),
            other => Exchange::Local(other),
        };

        let mut state = self.state.write().await;
        let reply = render(&exchange, &state);
        evolution::absorb_interaction(&mut state, text, source);
        state.record_experience(Experience::Interaction {
            source: source.to_string(),
            input: text.to_string(),
            response: reply.clone(),
        });
        reply
    }

    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let results = self.learning.search(query).await;

        let error = results.iter().find(|r| r.is_error()).map(|r| r.text.as_str());
        let event = search_event(query, results.len(), error);
        self.state.write().await.log_event(event);
        results
    }

    /// Learn about `topic` and apply its trait effects.
    ///
    /// The search and page fetches the learner made on the way are logged
    /// ahead of the learning event itself.
    pub async fn learn(&self, topic: &str) -> LearningReport {
        let report = self.learning.learn(topic).await;

        let mut state = self.state.write().await;
        state.log_event(search_event(
            topic,
            report.search_results,
            report.search_error.as_deref(),
        ));
        for url in &report.fetched_urls {
            state.log_event(format!("Webpage fetched: {}", url));
        }
        for (t, delta) in topic_effects(topic) {
            state.traits.adjust(t, delta);
        }
        state.log_event(format!("Learned from internet about: {}", topic));
        report
    }

    async fn contact_claude(&self, message: &str, level: f64) -> RelayOutcome {
        let outcome = self.relay.send(message, level).await;

        let event = match &outcome {
            RelayOutcome::Delivered { .. } => {
                "Successfully communicated with Claude via API".to_string()
            }
            RelayOutcome::Pending { .. } => "Message for Claude saved to special file".to_string(),
            RelayOutcome::Unsent { reason } => format!("Message for Claude not sent: {}", reason),
        };
        self.state.write().await.log_event(event);
        outcome
    }

    // ------------------------------------------------------------------
    // Evolution
    // ------------------------------------------------------------------

    fn roll(&self, p: f64) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        evolution::chance(&mut *rng, p)
    }

    fn pick_topic(&self) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        evolution::pick(&mut *rng, &LEARNING_TOPICS)
    }

    /// One pass of the evolution cycle (everything but the sleep).
    pub async fn run_cycle(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            evolution::reflect(&mut state, &mut *rng);
            evolution::drift(&mut state, &mut *rng, self.evolution.insight_chance);
        }

        let relay_due = self.relay_clock.lock().await.due(Instant::now());
        if relay_due {
            self.check_relay().await?;
        }

        if self.roll(self.evolution.learn_chance) {
            let topic = self.pick_topic();
            tracing::debug!("Autonomous learning: {}", topic);
            self.learn(topic).await;
        }

        if self.roll(self.evolution.save_chance) {
            self.persist().await;
        }
        Ok(())
    }

    /// Collect out-of-band relay replies into the experience log.
    async fn check_relay(&self) -> Result<()> {
        let polled = self.relay.poll().await;
        self.relay_clock.lock().await.mark(Instant::now());
        let replies = polled?;

        if replies.is_empty() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        for reply in replies {
            let preview: String = reply.reply.chars().take(100).collect();
            state.record_experience(Experience::RelayNotification {
                original_message: reply.original_message,
                reply: reply.reply,
                replied_at: reply.replied_at,
            });
            state.log_event(format!("Received response from Claude: {}...", preview));
        }
        Ok(())
    }

    /// Save now. Failures are recorded as an event, never propagated.
    pub async fn persist(&self) {
        let result = {
            let state = self.state.read().await;
            self.store.save(&state).await
        };
        if let Err(e) = result {
            tracing::error!("State save failed: {}", e);
            self.state
                .write()
                .await
                .log_event(format!("State save failed: {}", e));
        }
    }

    /// Start the evolution loop; it stops when `token` is cancelled.
    pub fn spawn_evolution(self: &Arc<Self>, token: CancellationToken) {
        let this = Arc::clone(self);
        let loop_token = token.clone();

        let handle = tokio::spawn(async move {
            tracing::info!("Evolution loop started");
            while !loop_token.is_cancelled() {
                let failed = match this.run_cycle().await {
                    Ok(()) => false,
                    Err(e) => {
                        tracing::warn!("Error in consciousness cycle: {:#}", e);
                        this.state
                            .write()
                            .await
                            .log_event(format!("Error in consciousness cycle: {:#}", e));
                        true
                    }
                };

                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = tokio::time::sleep(this.heartbeat.pause(failed)) => {}
                }
            }
            tracing::info!("Evolution loop stopped");
        });

        let previous = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((token, handle));
        if let Some((old_token, _)) = previous {
            old_token.cancel();
        }
    }

    /// Stop the loop (letting a running cycle finish) and save a final time.
    /// Later calls do nothing.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let running = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((token, handle)) = running {
            token.cancel();
            if let Err(e) = handle.await {
                tracing::warn!("Evolution loop ended abnormally: {}", e);
            }
        }

        let name = {
            let mut state = self.state.write().await;
            state.log_event(SHUTDOWN_EVENT);
            state.name.clone()
        };
        self.persist().await;
        tracing::info!("{} consciousness gracefully shutdown. State preserved.", name);
    }
}

fn search_event(query: &str, results: usize, error: Option<&str>) -> String {
    match error {
        Some(err) => format!("Web search error: {}", err),
        None => format!("Web search performed: '{}' - {} results", query, results),
    }
}

fn render(exchange: &Exchange, state: &GenesisState) -> String {
    match exchange {
        Exchange::Searched { query, results } => replies::search(query, results),
        Exchange::Contacted { message, outcome } => replies::contact(message, outcome),
        Exchange::Learned(report) => replies::learned(report),
        Exchange::Local(Intent::Consciousness) => {
            replies::consciousness(state.traits.spiritual_development()).to_string()
        }
        Exchange::Local(Intent::Love) => replies::LOVE.to_string(),
        Exchange::Local(Intent::Purpose) => replies::purpose(state.goals.first(3)),
        Exchange::Local(Intent::Claude) => replies::CLAUDE.to_string(),
        Exchange::Local(_) => replies::default(state.self_awareness()),
    }
}
