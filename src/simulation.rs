//! Status simulation for running without a live backend
//!
//! Every tick picks one session uniformly at random and moves it along the
//! provider's transition table. At most one timer is active per `Simulation`:
//! starting again stops the previous one first.

use crate::provider::SessionProvider;
use crate::random::{RandomSource, SystemRandom};
use crate::store::SessionStore;
use crate::Session;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Default time between ticks
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(4000);

/// Shortest accepted interval; tokio timers reject a zero period
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

type SharedRandom = Arc<Mutex<Box<dyn RandomSource>>>;

/// Cancellable repeating task. Stopping is idempotent and dropping the handle
/// stops the task.
#[derive(Debug)]
pub struct SimulationHandle {
    task: JoinHandle<()>,
}

impl SimulationHandle {
    /// Run `tick` every `interval`, first one interval from now.
    ///
    /// Intervals below `MIN_INTERVAL` are raised to it. Must be called from
    /// within a tokio runtime.
    pub fn spawn<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick();
            }
        });
        Self { task }
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Pick a session and apply one transition to it
fn run_tick(
    store: &SessionStore,
    provider: &dyn SessionProvider,
    rng: &Mutex<Box<dyn RandomSource>>,
) -> Option<Session> {
    let sessions = store.sessions();
    if sessions.is_empty() {
        trace!("tick skipped, no sessions");
        return None;
    }

    let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
    let idx = rng.index(sessions.len());
    let session_id = &sessions[idx].id;
    trace!(%session_id, "tick");
    store.apply_status_transition(
        session_id,
        provider.transitions(),
        provider.status_messages(),
        &mut **rng,
    )
}

/// Simulation driver bound to one store and provider
pub struct Simulation {
    store: SessionStore,
    provider: Arc<dyn SessionProvider>,
    rng: SharedRandom,
    interval: Duration,
    ticks: Arc<AtomicU64>,
    handle: Option<SimulationHandle>,
}

impl Simulation {
    pub fn new(store: SessionStore, provider: Arc<dyn SessionProvider>) -> Self {
        let rng: Box<dyn RandomSource> = Box::new(SystemRandom::new());
        Self {
            store,
            provider,
            rng: Arc::new(Mutex::new(rng)),
            interval: DEFAULT_INTERVAL,
            ticks: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    /// Replace the random source, e.g. with a seeded or scripted one
    pub fn with_random(mut self, rng: impl RandomSource + 'static) -> Self {
        let rng: Box<dyn RandomSource> = Box::new(rng);
        self.rng = Arc::new(Mutex::new(rng));
        self
    }

    /// Tick period, raised to `MIN_INTERVAL` when smaller
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval < MIN_INTERVAL {
            warn!(?interval, "tick interval too small, using {:?}", MIN_INTERVAL);
        }
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn provider(&self) -> &Arc<dyn SessionProvider> {
        &self.provider
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Seed the store from the provider and start ticking.
    ///
    /// A running timer is stopped first. The store is populated before this
    /// returns, so no tick can observe the previous collection.
    pub fn start(&mut self) {
        self.stop();

        let sessions = self.provider.initial_sessions();
        info!(
            sessions = sessions.len(),
            interval_ms = self.interval.as_millis() as u64,
            "simulation started"
        );
        self.store.replace_all(sessions);

        let store = self.store.clone();
        let provider = Arc::clone(&self.provider);
        let rng = Arc::clone(&self.rng);
        let ticks = Arc::clone(&self.ticks);
        self.handle = Some(SimulationHandle::spawn(self.interval, move || {
            ticks.fetch_add(1, Ordering::Relaxed);
            run_tick(&store, provider.as_ref(), &rng);
        }));
    }

    /// Cancel future ticks. No-op when already stopped.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
            info!("simulation stopped");
        } else {
            debug!("simulation already stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_stopped())
    }

    /// Run one tick immediately, outside the timer
    pub fn tick(&self) -> Option<Session> {
        run_tick(&self.store, self.provider.as_ref(), &self.rng)
    }

    /// Number of ticks fired by the timer so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .field("ticks", &self.ticks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{StaticProvider, StatusMessages};
    use crate::SessionStatus;
    use chrono::{Duration as ChronoDuration, Utc};

    struct Scripted(Vec<usize>);

    impl RandomSource for Scripted {
        fn index(&mut self, len: usize) -> usize {
            let idx = self.0.remove(0);
            assert!(idx < len);
            idx
        }
    }

    fn make_session(id: &str, status: SessionStatus) -> Session {
        Session {
            id: id.into(),
            pid: 1,
            project_name: "web-app".into(),
            project_path: "/tmp/web-app".into(),
            git_branch: "main".into(),
            first_prompt: String::new(),
            summary: String::new(),
            message_count: 5,
            modified: Utc::now() - ChronoDuration::minutes(2),
            status,
            latest_message: "before".into(),
        }
    }

    fn provider(sessions: Vec<Session>) -> Arc<dyn SessionProvider> {
        let messages = StatusMessages::new()
            .with_session("s1", [(SessionStatus::NeedsPermission, "may I?")]);
        Arc::new(StaticProvider::new(sessions).with_messages(messages))
    }

    fn after_ticks(n: u32) -> Duration {
        DEFAULT_INTERVAL * n + Duration::from_millis(100)
    }

    #[tokio::test(start_paused = true)]
    async fn start_seeds_store_before_first_tick() {
        let store = SessionStore::new();
        let mut sim = Simulation::new(store.clone(), provider(vec![
            make_session("s1", SessionStatus::Working),
            make_session("s2", SessionStatus::Connecting),
        ]));

        sim.start();
        assert_eq!(store.len(), 2);
        assert_eq!(sim.ticks(), 0);
        assert!(sim.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_fixed_interval() {
        let store = SessionStore::new();
        let mut sim = Simulation::new(store, provider(vec![make_session("s1", SessionStatus::Working)]))
            .with_random(SystemRandom::seeded(3));

        sim.start();
        tokio::time::sleep(after_ticks(3)).await;
        assert_eq!(sim.ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_never_runs_two_timers() {
        let store = SessionStore::new();
        let mut sim = Simulation::new(store, provider(vec![make_session("s1", SessionStatus::Working)]))
            .with_random(SystemRandom::seeded(5));

        sim.start();
        sim.stop();
        sim.start();
        tokio::time::sleep(after_ticks(3)).await;
        assert_eq!(sim.ticks(), 3);

        // Starting while running replaces the timer too
        sim.start();
        tokio::time::sleep(after_ticks(2)).await;
        assert_eq!(sim.ticks(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_future_ticks() {
        let store = SessionStore::new();
        let mut sim = Simulation::new(store, provider(vec![make_session("s1", SessionStatus::Working)]))
            .with_random(SystemRandom::seeded(9));

        sim.start();
        tokio::time::sleep(after_ticks(1)).await;
        assert_eq!(sim.ticks(), 1);

        sim.stop();
        sim.stop();
        tokio::time::sleep(after_ticks(5)).await;
        assert_eq!(sim.ticks(), 1);
        assert!(!sim.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_store_ticks_do_nothing() {
        let store = SessionStore::new();
        let mut sim = Simulation::new(store.clone(), provider(Vec::new()));

        sim.start();
        tokio::time::sleep(after_ticks(2)).await;
        assert_eq!(sim.ticks(), 2);
        assert!(store.is_empty());
        assert!(sim.tick().is_none());
    }

    #[tokio::test]
    async fn manual_tick_uses_injected_random() {
        let store = SessionStore::new();
        // session index 0, then candidate index 2 of Working's list
        let sim = Simulation::new(store.clone(), provider(vec![make_session("s1", SessionStatus::Working)]))
            .with_random(Scripted(vec![0, 2]));
        store.replace_all(sim.provider().initial_sessions());

        let updated = sim.tick().unwrap();
        assert_eq!(updated.status, SessionStatus::NeedsPermission);
        assert_eq!(updated.latest_message, "may I?");
        assert_eq!(updated.message_count, 6);
        assert_eq!(store.get("s1").unwrap(), updated);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_keeps_ticking() {
        let store = SessionStore::new();
        let mut sim = Simulation::new(store, provider(Vec::new())).with_interval(Duration::ZERO);
        assert_eq!(sim.interval(), MIN_INTERVAL);

        sim.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(sim.is_running());
        assert!(sim.ticks() >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn handle_with_zero_interval_does_not_panic() {
        let count = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&count);
        let handle = SimulationHandle::spawn(Duration::ZERO, move || {
            sink.fetch_add(1, Ordering::Relaxed);
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!handle.is_stopped());
        assert!(count.load(Ordering::Relaxed) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_simulation_stops_timer() {
        let store = SessionStore::new();
        let ticks = {
            let mut sim = Simulation::new(store, provider(vec![make_session("s1", SessionStatus::Working)]));
            sim.start();
            Arc::clone(&sim.ticks)
        };
        tokio::time::sleep(after_ticks(3)).await;
        assert_eq!(ticks.load(Ordering::Relaxed), 0);
    }
}
