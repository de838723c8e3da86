// Debounced autosave of an in-progress entry form.
//
// One controller task per attached form. The task owns the save state and
// runs a `tokio::select!` loop over four sources:
// 1. Commands from the `Autosave` handle (field changes, enable/disable, ...)
// 2. The debounce deadline, re-armed on every field change
// 3. The periodic save interval
// 4. Completions of the (at most one) in-flight network save
//
// Successful saves are mirrored into the local `DraftStore` so a reload can
// restore the answers; drafts older than the freshness window are ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::AutosaveSection;
use crate::error::{AutosaveError, StoreError, TransportError};
use crate::form::FormScope;
use crate::snapshot::FormSnapshot;
use crate::store::{Draft, DraftStore};
use crate::transport::EntryTransport;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing knobs for one controller. The endpoint template is owned by the
/// transport, which is built from the same config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Cadence of the periodic save check.
    pub save_interval: Duration,
    /// Quiet period after the last edit before a save is attempted.
    pub debounce_delay: Duration,
    /// Maximum age of a local draft that will still be restored.
    pub freshness_window: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        AutosaveConfig {
            save_interval: Duration::from_secs(30),
            debounce_delay: Duration::from_secs(2),
            freshness_window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl From<&AutosaveSection> for AutosaveConfig {
    fn from(section: &AutosaveSection) -> Self {
        AutosaveConfig {
            save_interval: section.save_interval(),
            debounce_delay: section.debounce_delay(),
            freshness_window: section.freshness_window(),
        }
    }
}

// ---------------------------------------------------------------------------
// SaveState
// ---------------------------------------------------------------------------

/// Where the controller is in its save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Idle,
    /// Debounce timer armed for an unsaved change.
    Pending,
    /// A network save is in flight.
    Saving,
    Saved,
    Failed,
}

impl SaveState {
    /// Indicator text shown to the user, if any.
    pub fn label(self) -> Option<&'static str> {
        match self {
            SaveState::Idle | SaveState::Pending => None,
            SaveState::Saving => Some("Saving..."),
            SaveState::Saved => Some("Saved"),
            SaveState::Failed => Some("Save failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands and completions
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Command {
    FieldChanged(FormSnapshot),
    SaveNow,
    FlushOnUnload,
    BeforeSubmit(oneshot::Sender<()>),
    ClearSavedData,
    Enable,
    Disable,
    Destroy,
}

/// Result of one network save, tagged with the generation it started under.
struct SaveOutcome {
    generation: u64,
    snapshot: FormSnapshot,
    result: Result<(), TransportError>,
}

// ---------------------------------------------------------------------------
// Autosave (public handle)
// ---------------------------------------------------------------------------

/// Autosave bound to one form, or a no-op when there was nothing to bind.
pub enum Autosave {
    Active(AutosaveHandle),
    /// No form scope (or no contest id): every operation does nothing.
    Detached,
}

/// Handle to a running controller task.
pub struct AutosaveHandle {
    contest_id: String,
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<SaveState>,
    restored_draft: bool,
    task: JoinHandle<()>,
}

impl Autosave {
    /// Bind autosave to `scope`.
    ///
    /// Restores a fresh local draft into the scope before anything else, then
    /// spawns the controller task. Must be called from within a tokio
    /// runtime. A missing scope yields `Autosave::Detached`.
    pub fn attach<F>(
        scope: Option<&mut F>,
        config: AutosaveConfig,
        transport: Arc<dyn EntryTransport>,
        store: Arc<DraftStore>,
    ) -> Self
    where
        F: FormScope + ?Sized,
    {
        match Self::try_attach(scope, config, transport, store) {
            Ok(handle) => Autosave::Active(handle),
            Err(e) => {
                debug!("autosave not attached: {e}");
                Autosave::Detached
            }
        }
    }

    /// Like `attach`, but reports why nothing was bound.
    pub fn try_attach<F>(
        scope: Option<&mut F>,
        config: AutosaveConfig,
        transport: Arc<dyn EntryTransport>,
        store: Arc<DraftStore>,
    ) -> Result<AutosaveHandle, AutosaveError>
    where
        F: FormScope + ?Sized,
    {
        let scope = scope.ok_or(AutosaveError::ConfigurationAbsent)?;
        let contest_id = scope
            .contest_id()
            .ok_or(AutosaveError::ConfigurationAbsent)?
            .to_string();

        let now_ms = chrono::Utc::now().timestamp_millis();
        let restored_draft = match load_restorable_draft(&store, &contest_id, now_ms, config.freshness_window) {
            Ok(Some(draft)) => {
                let changed = draft.data.restore_into(scope.inputs_mut());
                info!(contest_id = %contest_id, fields = draft.data.len(), changed, "draft restored");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(contest_id = %contest_id, "ignoring local draft: {e}");
                false
            }
        };

        // Whatever the form shows now (restored or server-rendered) counts as
        // already saved, so attaching never triggers a save by itself.
        let initial = FormSnapshot::capture(scope.inputs());

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SaveState::Idle);

        let controller = Controller {
            contest_id: contest_id.clone(),
            config,
            transport,
            store,
            current: initial.clone(),
            last_saved: initial,
            enabled: true,
            debounce_deadline: None,
            saving: false,
            follow_up: false,
            generation: 0,
            settled: SaveState::Idle,
            submit_waiters: Vec::new(),
            state_tx,
            done_tx,
        };
        let task = tokio::spawn(controller.run(cmd_rx, done_rx));

        info!(contest_id = %contest_id, restored_draft, "autosave attached");

        Ok(AutosaveHandle {
            contest_id,
            cmd_tx,
            state_rx,
            restored_draft,
            task,
        })
    }

    fn handle(&self) -> Option<&AutosaveHandle> {
        match self {
            Autosave::Active(handle) => Some(handle),
            Autosave::Detached => None,
        }
    }

    fn send(&self, command: Command) {
        if let Some(handle) = self.handle() {
            // The task only stops on destroy; a closed channel means there is
            // nothing left to do.
            let _ = handle.cmd_tx.send(command);
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle().is_some()
    }

    pub fn contest_id(&self) -> Option<&str> {
        self.handle().map(|h| h.contest_id.as_str())
    }

    /// Whether a local draft was restored into the form on attach.
    pub fn restored_draft(&self) -> bool {
        self.handle().is_some_and(|h| h.restored_draft)
    }

    /// Current save state (`Idle` when detached).
    pub fn state(&self) -> SaveState {
        self.handle()
            .map(|h| *h.state_rx.borrow())
            .unwrap_or_default()
    }

    /// Receiver that observes every state transition.
    pub fn subscribe(&self) -> Option<watch::Receiver<SaveState>> {
        self.handle().map(|h| h.state_rx.clone())
    }

    /// Report the form's snapshot after a recognised field change. Re-arms
    /// the debounce timer.
    pub fn field_changed(&self, snapshot: FormSnapshot) {
        self.send(Command::FieldChanged(snapshot));
    }

    /// Attempt a save right away, skipping the debounce.
    pub fn save_now(&self) {
        self.send(Command::SaveNow);
    }

    /// Fire-and-forget delivery of unsaved changes, for when the user is
    /// leaving. Returns immediately.
    pub fn flush_on_unload(&self) {
        self.send(Command::FlushOnUnload);
    }

    /// Resolve once no save is in flight. Call before submitting the entry so
    /// the server never processes a submission concurrently with a draft
    /// write.
    pub async fn before_submit(&self) {
        let Some(handle) = self.handle() else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        if handle.cmd_tx.send(Command::BeforeSubmit(tx)).is_err() {
            return;
        }
        // A dropped sender means the controller stopped; nothing to wait for.
        let _ = rx.await;
    }

    /// Remove the local draft, typically after a confirmed submission.
    pub fn clear_saved_data(&self) {
        self.send(Command::ClearSavedData);
    }

    pub fn enable(&self) {
        self.send(Command::Enable);
    }

    /// Pause autosave and cancel any pending debounce. A save already in
    /// flight completes but its result is discarded.
    pub fn disable(&self) {
        self.send(Command::Disable);
    }

    /// Stop the controller task and wait for it to exit.
    pub async fn destroy(self) {
        if let Autosave::Active(handle) = self {
            let _ = handle.cmd_tx.send(Command::Destroy);
            if let Err(e) = handle.task.await {
                warn!("autosave task ended abnormally: {e}");
            }
        }
    }
}

/// Load the draft for `contest_id` if it is fresh enough to restore.
fn load_restorable_draft(
    store: &DraftStore,
    contest_id: &str,
    now_ms: i64,
    window: Duration,
) -> Result<Option<Draft>, AutosaveError> {
    match store.load_fresh(contest_id, now_ms, window) {
        Ok(draft) => Ok(draft),
        Err(StoreError::Corrupt { source, .. }) => {
            Err(AutosaveError::Serialization(source.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Controller (task-owned state)
// ---------------------------------------------------------------------------

struct Controller {
    contest_id: String,
    config: AutosaveConfig,
    transport: Arc<dyn EntryTransport>,
    store: Arc<DraftStore>,
    /// Latest snapshot reported by the form.
    current: FormSnapshot,
    /// Snapshot the server last acknowledged (or the attach-time snapshot).
    last_saved: FormSnapshot,
    enabled: bool,
    debounce_deadline: Option<Instant>,
    /// A network save is outstanding. Stays set until its completion
    /// arrives, even if that completion is later discarded.
    saving: bool,
    /// A trigger arrived while saving; run it once the save completes.
    follow_up: bool,
    /// Bumped on disable so completions started earlier are discarded.
    generation: u64,
    /// Last non-transient state, shown again when a pending change reverts.
    settled: SaveState,
    submit_waiters: Vec<oneshot::Sender<()>>,
    state_tx: watch::Sender<SaveState>,
    done_tx: mpsc::UnboundedSender<SaveOutcome>,
}

impl Controller {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut done_rx: mpsc::UnboundedReceiver<SaveOutcome>,
    ) {
        let mut interval = tokio::time::interval(self.config.save_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first
        // periodic check happens one full interval after attach.
        interval.tick().await;

        loop {
            let debounce = self.debounce_deadline;

            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(Command::Destroy) | None => break,
                        Some(cmd) => self.handle_command(cmd),
                    }
                }

                _ = tokio::time::sleep_until(debounce.unwrap_or_else(Instant::now)), if debounce.is_some() => {
                    self.debounce_deadline = None;
                    debug!(contest_id = %self.contest_id, "debounce elapsed");
                    self.try_save();
                }

                _ = interval.tick() => {
                    self.on_interval();
                }

                Some(outcome) = done_rx.recv() => {
                    self.on_save_complete(outcome);
                }
            }
        }

        self.generation += 1;
        self.debounce_deadline = None;
        debug!(contest_id = %self.contest_id, "autosave controller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::FieldChanged(snapshot) => self.on_field_changed(snapshot),
            Command::SaveNow => {
                self.debounce_deadline = None;
                self.try_save();
            }
            Command::FlushOnUnload => self.flush_on_unload(),
            Command::BeforeSubmit(waiter) => {
                if self.saving {
                    debug!(contest_id = %self.contest_id, "submission deferred until save completes");
                    self.submit_waiters.push(waiter);
                } else {
                    let _ = waiter.send(());
                }
            }
            Command::ClearSavedData => {
                if let Err(e) = self.store.clear_draft(&self.contest_id) {
                    warn!(contest_id = %self.contest_id, "failed to clear local draft: {e}");
                }
            }
            Command::Enable => {
                self.enabled = true;
            }
            Command::Disable => {
                self.enabled = false;
                self.generation += 1;
                self.debounce_deadline = None;
                self.follow_up = false;
                if *self.state_tx.borrow() == SaveState::Pending {
                    self.set_state(self.settled);
                }
            }
            // Handled by the run loop.
            Command::Destroy => {}
        }
    }

    fn has_changes(&self) -> bool {
        self.current != self.last_saved
    }

    fn on_field_changed(&mut self, snapshot: FormSnapshot) {
        self.current = snapshot;
        if !self.enabled {
            return;
        }

        self.debounce_deadline = Some(Instant::now() + self.config.debounce_delay);
        // The debounce owns this change now; an older follow-up must not fire
        // before the quiet period has elapsed.
        self.follow_up = false;

        if self.saving {
            return;
        }
        if self.has_changes() {
            self.set_state(SaveState::Pending);
        } else if *self.state_tx.borrow() == SaveState::Pending {
            self.set_state(self.settled);
        }
    }

    fn on_interval(&mut self) {
        if self.enabled && self.debounce_deadline.is_none() && !self.saving && self.has_changes() {
            debug!(contest_id = %self.contest_id, "periodic save");
            self.try_save();
        }
    }

    /// Start a network save if there is anything new to send.
    fn try_save(&mut self) {
        if !self.enabled || !self.has_changes() {
            return;
        }
        if self.saving {
            self.follow_up = true;
            return;
        }

        self.saving = true;
        self.follow_up = false;
        self.set_state(SaveState::Saving);

        let generation = self.generation;
        let snapshot = self.current.clone();
        let contest_id = self.contest_id.clone();
        let transport = Arc::clone(&self.transport);
        let done_tx = self.done_tx.clone();

        debug!(contest_id = %contest_id, generation, fields = snapshot.len(), "saving draft");
        tokio::spawn(async move {
            let result = transport.save_draft(&contest_id, &snapshot).await;
            let _ = done_tx.send(SaveOutcome {
                generation,
                snapshot,
                result,
            });
        });
    }

    fn on_save_complete(&mut self, outcome: SaveOutcome) {
        self.saving = false;

        if outcome.generation == self.generation {
            self.apply_save_result(outcome);
        } else {
            debug!(
                contest_id = %self.contest_id,
                generation = outcome.generation,
                current = self.generation,
                "discarding result of save started before disable"
            );
            self.set_state(self.settled);
        }

        self.release_submit_waiters();

        // Triggers that arrived while the save was out run now, whether or
        // not its result was kept.
        if self.follow_up {
            self.follow_up = false;
            self.try_save();
        } else if self.debounce_deadline.is_some() && self.has_changes() {
            self.set_state(SaveState::Pending);
        }
    }

    fn apply_save_result(&mut self, outcome: SaveOutcome) {
        match outcome.result {
            Ok(()) => {
                let draft = Draft::now(outcome.snapshot.clone());
                self.last_saved = outcome.snapshot;
                if let Err(e) = self.store.save_draft(&self.contest_id, &draft) {
                    let err = AutosaveError::from(e);
                    warn!(contest_id = %self.contest_id, "failed to write local draft: {err}");
                }
                self.settled = SaveState::Saved;
                self.set_state(SaveState::Saved);
                info!(contest_id = %self.contest_id, "draft saved");
            }
            Err(e) => {
                let err = AutosaveError::from(e);
                if err.is_retryable() {
                    warn!(contest_id = %self.contest_id, "{err}; will retry on next trigger");
                } else {
                    error!(contest_id = %self.contest_id, "server rejected draft: {err}");
                }
                self.settled = SaveState::Failed;
                self.set_state(SaveState::Failed);
            }
        }
    }

    fn flush_on_unload(&mut self) {
        if !self.enabled || !self.has_changes() {
            return;
        }
        info!(contest_id = %self.contest_id, "flushing unsaved changes on unload");
        self.transport.send_beacon(&self.contest_id, &self.current);
    }

    fn release_submit_waiters(&mut self) {
        for waiter in self.submit_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    fn set_state(&self, state: SaveState) {
        self.state_tx.send_replace(state);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
