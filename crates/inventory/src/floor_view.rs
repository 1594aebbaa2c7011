//! Live, cached car list for one floor.
//!
//! A [`FloorView`] owns a background task that keeps the cars on its
//! current floor loaded. The list is refetched only when:
//!
//! - the watched floor changes ([`FloorView::set_floor`]),
//! - a caller asks for it ([`FloorView::refetch`] / [`FloorView::refresh`]),
//! - a [`CarChangeEvent`] concerning the watched floor arrives on the bus.
//!
//! Every fetch carries a generation number. Switching floors aborts the
//! fetch in flight, and any outcome whose generation is not the latest is
//! discarded, so switching floors quickly never shows the old floor's cars.
//!
//! Refetches of the same floor never abort. One requested while a fetch is
//! in flight is queued and runs once that fetch lands, however many requests
//! arrive meanwhile. A steady stream of events therefore still lands a fresh
//! list every fetch round trip.

use std::sync::{Arc, Mutex};

use dealer_core::floors::Floor;
use dealer_db::models::car::Car;
use dealer_events::{CarChangeEvent, EventBus};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::InventoryBackend;
use crate::error::InventoryError;

/// Load status of a floor view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Snapshot of a floor view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorViewState {
    pub floor: Floor,
    pub status: LoadStatus,
    /// Cars on `floor` as of the last successful fetch. Empty while loading
    /// a newly selected floor and after a failed fetch.
    pub cars: Vec<Car>,
    pub error: Option<String>,
    /// Generation of the most recently started fetch.
    pub generation: u64,
    /// Generation of the fetch `cars` and `error` come from. Zero until the
    /// first fetch of `floor` lands.
    pub loaded_generation: u64,
}

impl FloorViewState {
    fn initial(floor: Floor) -> Self {
        Self {
            floor,
            status: LoadStatus::Idle,
            cars: Vec::new(),
            error: None,
            generation: 0,
            loaded_generation: 0,
        }
    }

    /// Whether no fetch is in flight.
    pub fn is_settled(&self) -> bool {
        matches!(self.status, LoadStatus::Ready | LoadStatus::Error)
    }

    /// Whether a fetch of `floor` has landed, even if a refetch is under way.
    pub fn is_loaded(&self) -> bool {
        self.loaded_generation > 0
    }
}

enum Command {
    SetFloor(Floor),
    Refetch {
        /// Receives the generation of the fetch started for this request.
        reply: Option<oneshot::Sender<u64>>,
    },
}

/// Handle to a running floor view task.
///
/// Dropping the handle stops the task.
pub struct FloorView {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<FloorViewState>,
    requested: Mutex<Floor>,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FloorView {
    /// Start a view of `floor` that refreshes on relevant events from `bus`.
    ///
    /// The first fetch starts immediately.
    pub fn spawn(floor: Floor, backend: Arc<dyn InventoryBackend>, bus: &EventBus) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(FloorViewState::initial(floor));
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker = Worker {
            floor,
            backend,
            state: state_tx,
            generation: 0,
            in_flight: None,
            queued: false,
            outcomes: outcome_tx,
        };
        let handle = tokio::spawn(worker.run(
            command_rx,
            outcome_rx,
            bus.subscribe(),
            cancel.clone(),
        ));

        Self {
            commands,
            state,
            requested: Mutex::new(floor),
            cancel,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// The floor most recently requested through this handle.
    pub fn floor(&self) -> Floor {
        *self.requested.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Current state.
    pub fn snapshot(&self) -> FloorViewState {
        self.state.borrow().clone()
    }

    /// Watch every state change.
    pub fn subscribe(&self) -> watch::Receiver<FloorViewState> {
        self.state.clone()
    }

    /// Switch to `floor`. The list is cleared and reloaded.
    pub fn set_floor(&self, floor: Floor) -> Result<(), InventoryError> {
        *self.requested.lock().unwrap_or_else(|p| p.into_inner()) = floor;
        self.commands
            .send(Command::SetFloor(floor))
            .map_err(|_| InventoryError::ViewClosed)
    }

    /// Ask for a refetch without waiting for it.
    pub fn refetch(&self) -> Result<(), InventoryError> {
        self.commands
            .send(Command::Refetch { reply: None })
            .map_err(|_| InventoryError::ViewClosed)
    }

    /// Refetch and wait for the result of a fetch started no earlier than
    /// this call.
    pub async fn refresh(&self) -> Result<FloorViewState, InventoryError> {
        let (reply, generation) = oneshot::channel();
        self.commands
            .send(Command::Refetch { reply: Some(reply) })
            .map_err(|_| InventoryError::ViewClosed)?;
        let generation = generation.await.map_err(|_| InventoryError::ViewClosed)?;

        self.wait_for(|s| s.loaded_generation >= generation).await
    }

    /// Wait until the requested floor has been loaded at least once.
    ///
    /// Returns the latest landed list without waiting for a refetch that is
    /// still in flight.
    pub async fn settled(&self) -> Result<FloorViewState, InventoryError> {
        let floor = self.floor();
        self.wait_for(|s| s.floor == floor && s.is_loaded()).await
    }

    async fn wait_for(
        &self,
        predicate: impl FnMut(&FloorViewState) -> bool,
    ) -> Result<FloorViewState, InventoryError> {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(predicate)
            .await
            .map_err(|_| InventoryError::ViewClosed)?
            .clone();
        Ok(state)
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for FloorView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct FetchOutcome {
    generation: u64,
    result: Result<Vec<Car>, String>,
}

enum Step {
    Stop,
    Command(Command),
    Fetched(FetchOutcome),
    Event(Result<CarChangeEvent, broadcast::error::RecvError>),
}

struct Worker {
    floor: Floor,
    backend: Arc<dyn InventoryBackend>,
    state: watch::Sender<FloorViewState>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    /// A refetch was requested while a fetch was in flight.
    queued: bool,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
}

impl Worker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
        mut events: broadcast::Receiver<CarChangeEvent>,
        cancel: CancellationToken,
    ) {
        let mut listening = true;
        self.start_fetch(true);

        loop {
            let step = tokio::select! {
                _ = cancel.cancelled() => Step::Stop,
                cmd = commands.recv() => match cmd {
                    Some(cmd) => Step::Command(cmd),
                    None => Step::Stop,
                },
                Some(outcome) = outcomes.recv() => Step::Fetched(outcome),
                event = events.recv(), if listening => Step::Event(event),
            };

            match step {
                Step::Stop => break,
                Step::Command(Command::SetFloor(floor)) => {
                    if floor != self.floor {
                        tracing::debug!(from = %self.floor, to = %floor, "Floor view switching floor");
                        self.floor = floor;
                        self.queued = false;
                        self.start_fetch(true);
                    }
                }
                Step::Command(Command::Refetch { reply }) => {
                    let generation = self.request_refetch();
                    if let Some(reply) = reply {
                        let _ = reply.send(generation);
                    }
                }
                Step::Fetched(outcome) => self.apply(outcome),
                Step::Event(Ok(event)) => {
                    if event.concerns(self.floor) {
                        tracing::debug!(
                            floor = %self.floor,
                            car_id = event.record.id,
                            kind = ?event.change_kind,
                            "Refetching after car change",
                        );
                        self.request_refetch();
                    }
                }
                Step::Event(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!(floor = %self.floor, skipped, "Floor view lagged, refetching");
                    self.request_refetch();
                }
                Step::Event(Err(broadcast::error::RecvError::Closed)) => {
                    tracing::debug!(floor = %self.floor, "Event bus closed, no further live updates");
                    listening = false;
                }
            }
        }

        if let Some(fetch) = self.in_flight.take() {
            fetch.abort();
        }
        tracing::debug!(floor = %self.floor, "Floor view stopped");
    }

    /// Refetch the current floor, or queue one behind the fetch in flight.
    ///
    /// Returns the generation whose outcome answers the request.
    fn request_refetch(&mut self) -> u64 {
        if self.in_flight.is_none() {
            return self.start_fetch(false);
        }
        self.queued = true;
        self.generation + 1
    }

    /// Start a fetch of the current floor, superseding any fetch in flight.
    ///
    /// `clear` marks a floor switch: the old floor's list and error are
    /// dropped. Otherwise they stay visible until the new outcome lands.
    fn start_fetch(&mut self, clear: bool) -> u64 {
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }

        self.generation += 1;
        let generation = self.generation;
        let floor = self.floor;

        self.state.send_modify(|s| {
            s.floor = floor;
            s.status = LoadStatus::Loading;
            s.generation = generation;
            if clear {
                s.cars.clear();
                s.error = None;
                s.loaded_generation = 0;
            }
        });

        let backend = Arc::clone(&self.backend);
        let outcomes = self.outcomes.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = backend.list_cars(floor).await.map_err(|e| e.to_string());
            let _ = outcomes.send(FetchOutcome { generation, result });
        }));

        generation
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        if outcome.generation != self.generation {
            tracing::debug!(
                floor = %self.floor,
                stale = outcome.generation,
                current = self.generation,
                "Discarding superseded fetch",
            );
            return;
        }
        self.in_flight = None;

        let generation = outcome.generation;
        match outcome.result {
            Ok(cars) => self.state.send_modify(|s| {
                s.status = LoadStatus::Ready;
                s.cars = cars;
                s.error = None;
                s.loaded_generation = generation;
            }),
            Err(error) => {
                tracing::warn!(floor = %self.floor, error = %error, "Floor fetch failed");
                self.state.send_modify(|s| {
                    s.status = LoadStatus::Error;
                    s.cars.clear();
                    s.error = Some(error);
                    s.loaded_generation = generation;
                });
            }
        }

        if std::mem::take(&mut self.queued) {
            self.start_fetch(false);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
