//! Demo mode: persisted toggle that seeds the store and runs the simulation

use crate::preferences::{PreferenceStore, load_demo_flag, save_demo_flag};
use crate::signal::Signal;
use crate::simulation::Simulation;
use tracing::info;

pub struct DemoMode {
    simulation: Simulation,
    preferences: Box<dyn PreferenceStore>,
    enabled: Signal<bool>,
}

impl DemoMode {
    pub fn new(simulation: Simulation, preferences: Box<dyn PreferenceStore>) -> Self {
        Self {
            simulation,
            preferences,
            enabled: Signal::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self.enabled.get()
    }

    /// Observable enabled flag
    pub fn enabled(&self) -> &Signal<bool> {
        &self.enabled
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Start the simulation when demo mode was left on last time.
    ///
    /// Must be called from within a tokio runtime. Returns whether demo mode
    /// is now active.
    pub fn load_if_active(&mut self) -> bool {
        if !load_demo_flag(self.preferences.as_ref()) {
            return false;
        }
        info!("demo mode restored");
        self.enabled.set(true);
        self.simulation.start();
        true
    }

    /// Flip demo mode, persist the choice, and start or stop the simulation.
    ///
    /// Turning it off clears the session collection. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        let next = !self.is_enabled();
        info!(enabled = next, "demo mode toggled");
        self.enabled.set(next);
        save_demo_flag(self.preferences.as_ref(), next);

        if next {
            self.simulation.start();
        } else {
            self.simulation.stop();
            self.simulation.store().replace_all(Vec::new());
        }
        next
    }

    /// Expand a session card and load its demo transcript, or collapse with `None`
    pub fn expand_session(&self, session_id: Option<&str>) {
        let store = self.simulation.store();
        store.set_expanded_session_id(session_id.map(str::to_string));
        let conversation = session_id.and_then(|id| self.simulation.provider().conversation(id));
        store.set_conversation(conversation);
    }
}

impl std::fmt::Debug for DemoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoMode")
            .field("enabled", &self.is_enabled())
            .field("simulation", &self.simulation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoProvider;
    use crate::preferences::{DEMO_MODE_KEY, MemoryStore};
    use crate::store::SessionStore;
    use std::sync::Arc;

    fn demo_mode(preferences: MemoryStore) -> (SessionStore, DemoMode) {
        let store = SessionStore::new();
        let simulation = Simulation::new(store.clone(), Arc::new(DemoProvider::new()));
        (store, DemoMode::new(simulation, Box::new(preferences)))
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_on_seeds_and_persists() {
        let (store, mut demo) = demo_mode(MemoryStore::new());

        assert!(demo.toggle());
        assert!(demo.is_enabled());
        assert!(demo.simulation().is_running());
        assert_eq!(store.len(), 6);
        assert_eq!(
            demo.preferences.get(DEMO_MODE_KEY).unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_off_clears_store() {
        let (store, mut demo) = demo_mode(MemoryStore::new());
        demo.toggle();
        assert!(!demo.toggle());

        assert!(store.is_empty());
        assert!(!demo.simulation().is_running());
        assert!(!load_demo_flag(demo.preferences.as_ref()));
    }

    #[tokio::test(start_paused = true)]
    async fn load_if_active_restores_persisted_flag() {
        let preferences = MemoryStore::new();
        preferences.set(DEMO_MODE_KEY, "true").unwrap();
        let (store, mut demo) = demo_mode(preferences);

        assert!(demo.load_if_active());
        assert!(demo.is_enabled());
        assert_eq!(store.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn load_if_active_off_by_default() {
        let (store, mut demo) = demo_mode(MemoryStore::new());
        assert!(!demo.load_if_active());
        assert!(!demo.is_enabled());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_preferences_still_toggle() {
        let (store, mut demo) = demo_mode(MemoryStore::failing());
        assert!(!demo.load_if_active());

        assert!(demo.toggle());
        assert_eq!(store.len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn expand_session_loads_transcript() {
        let (store, mut demo) = demo_mode(MemoryStore::new());
        demo.toggle();

        demo.expand_session(Some("demo-3"));
        assert_eq!(store.expanded_session_id().as_deref(), Some("demo-3"));
        assert_eq!(store.conversation().unwrap().session_id, "demo-3");

        // No transcript for demo-2
        demo.expand_session(Some("demo-2"));
        assert!(store.conversation().is_none());

        demo.expand_session(None);
        assert!(store.expanded_session_id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn enabled_signal_notifies() {
        let (_store, mut demo) = demo_mode(MemoryStore::new());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = demo
            .enabled()
            .subscribe(move |enabled| sink.lock().unwrap().push(*enabled));

        demo.toggle();
        demo.toggle();
        assert_eq!(*seen.lock().unwrap(), vec![false, true, false]);
    }
}
