//! Periodic refresh of the current result set.
//!
//! A single tokio task owns the fetch loop. It is the only writer of the
//! shared snapshot; everybody else reads `Arc<Snapshot>` values that never
//! change after publication. The presentation layer steers the loop through
//! a [`RefreshHandle`] and is told about refreshes and failures through a
//! channel of [`RefreshEvent`]s.

use crate::config::{ConfigError, RefreshConfig};
use crate::source::FeedSource;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use quake_data::filter;
use quake_feed::{EventRecord, FeedError, QueryWindow};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Started, no fetch issued yet
    Idle,
    /// A fetch is in flight
    Running,
    /// The last fetch was applied
    Succeeded,
    /// The last fetch failed; ticking is paused until acknowledged
    Failed,
    /// Terminal
    Stopped,
}

/// Inputs the presentation layer controls.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshContext {
    pub window: QueryWindow,
    /// Region substring; empty shows everything
    pub filter: String,
}

/// Immutable view of one applied result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub window: QueryWindow,
    pub filter: String,
    pub events: Vec<EventRecord>,
    /// `None` until the first result is applied
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn empty(context: &RefreshContext) -> Snapshot {
        Snapshot {
            window: context.window,
            filter: context.filter.clone(),
            events: Vec::new(),
            refreshed_at: None,
        }
    }

    /// Events passing the filter that was active when the set was fetched.
    pub fn visible(&self) -> Vec<EventRecord> {
        filter::apply(&self.events, &self.filter)
    }
}

/// Notification pushed to the presentation layer.
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    Updated(Arc<Snapshot>),
    /// Ticking is paused until [`RefreshHandle::acknowledge`] is called.
    Failed(FeedError),
}

enum Control {
    ContextChanged,
    IntervalChanged,
    Acknowledge,
    Replace(Vec<EventRecord>),
    Stop,
}

/// What a control message means to the loop once side effects are done.
enum Signal {
    Stop,
    Changed,
    Rescheduled,
    Acknowledged,
    Handled,
}

struct Shared {
    state: watch::Sender<RefreshState>,
    snapshot: watch::Sender<Arc<Snapshot>>,
    context: watch::Sender<RefreshContext>,
    config: watch::Sender<RefreshConfig>,
}

impl Shared {
    fn is_stopped(&self) -> bool {
        *self.state.borrow() == RefreshState::Stopped
    }

    /// Move to `next` unless stopped.
    fn set_state(&self, next: RefreshState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == RefreshState::Stopped {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Publish `snapshot` unless stopped. The stop check and the write
    /// happen under the state lock, so nothing lands after `stop()`.
    fn publish(&self, snapshot: Snapshot, next: Option<RefreshState>) -> Option<Arc<Snapshot>> {
        let snapshot = Arc::new(snapshot);
        let published = self.state.send_if_modified(|state| {
            if *state == RefreshState::Stopped {
                return false;
            }
            self.snapshot.send_replace(Arc::clone(&snapshot));
            if let Some(next) = next {
                *state = next;
            }
            true
        });
        published.then_some(snapshot)
    }
}

/// Control surface of a running refresh loop. Dropping it stops the loop.
pub struct RefreshHandle {
    shared: Arc<Shared>,
    control: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn state(&self) -> RefreshState {
        *self.shared.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<RefreshState> {
        self.shared.state.subscribe()
    }

    /// Latest applied result set.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.shared.snapshot.borrow())
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.snapshot.subscribe()
    }

    pub fn context(&self) -> RefreshContext {
        self.shared.context.borrow().clone()
    }

    pub fn config(&self) -> RefreshConfig {
        *self.shared.config.borrow()
    }

    /// Query another window; fetches right away (debounced).
    pub fn set_window(&self, window: QueryWindow) {
        self.shared.context.send_modify(|context| context.window = window);
        self.send(Control::ContextChanged);
    }

    /// Change the region filter; fetches right away (debounced).
    pub fn set_filter(&self, filter: impl Into<String>) {
        let filter = filter.into();
        self.shared.context.send_modify(|context| context.filter = filter);
        self.send(Control::ContextChanged);
    }

    /// Change the tick interval. The new interval applies from now on.
    pub fn set_interval(&self, interval: Duration) -> Result<(), ConfigError> {
        let config = RefreshConfig {
            interval,
            ..self.config()
        };
        config.validate()?;
        self.shared.config.send_replace(config);
        self.send(Control::IntervalChanged);
        Ok(())
    }

    /// Resume ticking, at the backoff interval, after a reported failure.
    pub fn acknowledge(&self) {
        self.send(Control::Acknowledge);
    }

    /// Replace the result set with imported events.
    pub fn replace(&self, events: Vec<EventRecord>) {
        self.send(Control::Replace(events));
    }

    /// Stop the loop. Results still in flight are discarded. Calling it
    /// again does nothing.
    pub fn stop(&self) {
        let changed = self.shared.state.send_if_modified(|state| {
            if *state == RefreshState::Stopped {
                return false;
            }
            *state = RefreshState::Stopped;
            true
        });
        if changed {
            info!("Refresh stopped");
        }
        self.send(Control::Stop);
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Stop the loop and wait for its task to end.
    pub async fn join(self) {
        self.stop();
        if let Err(e) = self.task.await {
            error!("Refresh task ended abnormally: {}", e);
        }
    }

    fn send(&self, control: Control) {
        // the loop is gone once stopped; nothing left to tell it
        let _ = self.control.send(control);
    }
}

/// Start the refresh loop on the current tokio runtime. The first fetch is
/// issued immediately.
pub fn spawn<S>(
    source: S,
    config: RefreshConfig,
    context: RefreshContext,
) -> Result<(RefreshHandle, mpsc::UnboundedReceiver<RefreshEvent>), ConfigError>
where
    S: FeedSource + 'static,
{
    config.validate()?;
    let shared = Arc::new(Shared {
        state: watch::Sender::new(RefreshState::Idle),
        snapshot: watch::Sender::new(Arc::new(Snapshot::empty(&context))),
        context: watch::Sender::new(context),
        config: watch::Sender::new(config),
    });
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let refresh_loop = RefreshLoop {
        source,
        shared: Arc::clone(&shared),
        control: control_rx,
        events: events_tx,
        backing_off: false,
        pending_change: false,
    };
    info!(
        "Starting refresh every {:?} (backoff {:?})",
        config.interval,
        config.backoff()
    );
    let task = tokio::spawn(refresh_loop.run());
    Ok((
        RefreshHandle {
            shared,
            control: control_tx,
            task,
        },
        events_rx,
    ))
}

enum Outcome {
    Succeeded,
    Failed(FeedError),
    Stopped,
}

struct RefreshLoop<S> {
    source: S,
    shared: Arc<Shared>,
    control: mpsc::UnboundedReceiver<Control>,
    events: mpsc::UnboundedSender<RefreshEvent>,
    backing_off: bool,
    /// A context change arrived while a fetch was in flight
    pending_change: bool,
}

fn ticker(first_in: Duration, period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + first_in, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

impl<S: FeedSource> RefreshLoop<S> {
    async fn run(mut self) {
        let mut ticks = ticker(Duration::ZERO, self.period());
        loop {
            if self.shared.is_stopped() {
                break;
            }
            let triggered = if self.pending_change {
                self.pending_change = false;
                true
            } else {
                let signal = tokio::select! {
                    _ = ticks.tick() => None,
                    msg = self.control.recv() => Some(self.on_control(msg)),
                };
                match signal {
                    None => false,
                    Some(Signal::Stop) => break,
                    Some(Signal::Changed) => true,
                    Some(Signal::Rescheduled) => {
                        ticks = ticker(self.period(), self.period());
                        continue;
                    }
                    Some(Signal::Acknowledged) | Some(Signal::Handled) => continue,
                }
            };
            if triggered && !self.debounce(&mut ticks).await {
                break;
            }

            match self.fetch_once(&mut ticks).await {
                Outcome::Succeeded => {
                    self.backing_off = false;
                }
                Outcome::Failed(error) => {
                    let _ = self.events.send(RefreshEvent::Failed(error));
                    if !self.await_acknowledgment().await {
                        break;
                    }
                    // the backoff fetch reads the latest context anyway
                    self.pending_change = false;
                    self.backing_off = true;
                    info!("Failure acknowledged, retrying in {:?}", self.period());
                }
                Outcome::Stopped => break,
            }
            ticks = ticker(self.period(), self.period());
        }
        self.shared.state.send_replace(RefreshState::Stopped);
        debug!("Refresh loop finished");
    }

    fn config(&self) -> RefreshConfig {
        *self.shared.config.borrow()
    }

    /// Current tick period: the backoff interval after a failure, the
    /// normal one otherwise.
    fn period(&self) -> Duration {
        let config = self.config();
        if self.backing_off {
            config.backoff()
        } else {
            config.interval
        }
    }

    fn on_control(&mut self, msg: Option<Control>) -> Signal {
        match msg {
            None | Some(Control::Stop) => Signal::Stop,
            Some(Control::ContextChanged) => Signal::Changed,
            Some(Control::IntervalChanged) => Signal::Rescheduled,
            Some(Control::Acknowledge) => Signal::Acknowledged,
            Some(Control::Replace(events)) => {
                self.import(events);
                Signal::Handled
            }
        }
    }

    fn import(&self, events: Vec<EventRecord>) {
        let context = self.shared.context.borrow().clone();
        let count = events.len();
        let snapshot = Snapshot {
            window: context.window,
            filter: context.filter,
            events,
            refreshed_at: Some(Utc::now()),
        };
        if let Some(snapshot) = self.shared.publish(snapshot, None) {
            info!("Imported {} events", count);
            let _ = self.events.send(RefreshEvent::Updated(snapshot));
        }
    }

    /// Wait until context changes stop arriving for the debounce period.
    async fn debounce(&mut self, ticks: &mut Interval) -> bool {
        let quiet = self.config().debounce;
        let sleep = tokio::time::sleep(quiet);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                _ = ticks.tick() => debug!("Tick folded into pending context refresh"),
                msg = self.control.recv() => match self.on_control(msg) {
                    Signal::Stop => return false,
                    Signal::Changed => sleep.as_mut().reset(Instant::now() + quiet),
                    Signal::Rescheduled | Signal::Acknowledged | Signal::Handled => {}
                },
            }
        }
    }

    async fn fetch_once(&mut self, ticks: &mut Interval) -> Outcome {
        let context = self.shared.context.borrow().clone();
        if !self.shared.set_state(RefreshState::Running) {
            return Outcome::Stopped;
        }
        debug!(
            "Fetching events from {} to {}",
            context.window.from(),
            context.window.to()
        );

        let fetch = self.source.fetch(&context.window);
        tokio::pin!(fetch);
        let result = loop {
            tokio::select! {
                result = &mut fetch => break result,
                _ = ticks.tick() => debug!("Fetch still in flight, dropping tick"),
                msg = self.control.recv() => match msg {
                    None | Some(Control::Stop) => return Outcome::Stopped,
                    Some(Control::ContextChanged) => self.pending_change = true,
                    Some(Control::Replace(events)) => self.import(events),
                    Some(Control::IntervalChanged) | Some(Control::Acknowledge) => {}
                },
            }
        };

        match result {
            Ok(events) => {
                let count = events.len();
                let snapshot = Snapshot {
                    window: context.window,
                    filter: context.filter,
                    events,
                    refreshed_at: Some(Utc::now()),
                };
                match self.shared.publish(snapshot, Some(RefreshState::Succeeded)) {
                    Some(snapshot) => {
                        info!("Refreshed result set with {} events", count);
                        let _ = self.events.send(RefreshEvent::Updated(snapshot));
                        Outcome::Succeeded
                    }
                    None => Outcome::Stopped,
                }
            }
            Err(error) => {
                if !self.shared.set_state(RefreshState::Failed) {
                    return Outcome::Stopped;
                }
                warn!("Refresh failed, pausing until acknowledged: {}", error);
                Outcome::Failed(error)
            }
        }
    }

    /// Block ticking until the failure is acknowledged. Context changes
    /// made meanwhile are picked up by the next fetch.
    async fn await_acknowledgment(&mut self) -> bool {
        loop {
            let msg = self.control.recv().await;
            match self.on_control(msg) {
                Signal::Stop => return false,
                Signal::Acknowledged => return true,
                Signal::Changed | Signal::Rescheduled | Signal::Handled => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::sleep;

    struct Step {
        delay: Duration,
        result: Result<Vec<EventRecord>, FeedError>,
    }

    impl Step {
        fn ok(events: Vec<EventRecord>) -> Step {
            Step {
                delay: Duration::ZERO,
                result: Ok(events),
            }
        }

        fn err(error: FeedError) -> Step {
            Step {
                delay: Duration::ZERO,
                result: Err(error),
            }
        }

        fn slow(delay: Duration, events: Vec<EventRecord>) -> Step {
            Step {
                delay,
                result: Ok(events),
            }
        }
    }

    /// Plays back a fixed list of results, then answers with empty sets.
    struct Scripted {
        start: Instant,
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<(Duration, QueryWindow)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Arc<Scripted> {
            Arc::new(Scripted {
                start: Instant::now(),
                steps: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn call_secs(&self) -> Vec<u64> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(at, _)| at.as_secs())
                .collect()
        }

        fn windows(&self) -> Vec<QueryWindow> {
            self.calls.lock().unwrap().iter().map(|(_, w)| *w).collect()
        }
    }

    #[async_trait]
    impl FeedSource for Arc<Scripted> {
        async fn fetch(&self, window: &QueryWindow) -> Result<Vec<EventRecord>, FeedError> {
            let step = self.steps.lock().unwrap().pop_front();
            self.calls
                .lock()
                .unwrap()
                .push((self.start.elapsed(), *window));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let step = step.unwrap_or_else(|| Step::ok(Vec::new()));
            if !step.delay.is_zero() {
                sleep(step.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            step.result
        }
    }

    fn window(day: u32) -> QueryWindow {
        QueryWindow::single_day(NaiveDate::from_ymd_opt(2024, 3, day).unwrap())
    }

    fn context() -> RefreshContext {
        RefreshContext {
            window: window(10),
            filter: String::new(),
        }
    }

    fn quake(region: &str) -> EventRecord {
        EventRecord::new(
            "earthquake",
            1_710_079_530_000,
            Some(3.1),
            Some(format!("12 km N of Somewhere, {}", region)),
            None,
        )
        .unwrap()
    }

    async fn next_failure(events: &mut mpsc::UnboundedReceiver<RefreshEvent>) -> FeedError {
        loop {
            match events.recv().await {
                Some(RefreshEvent::Failed(error)) => return error,
                Some(RefreshEvent::Updated(_)) => continue,
                None => panic!("refresh loop ended"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_interval() {
        let source = Scripted::new(vec![Step::ok(vec![quake("Alaska")])]);
        let (handle, mut events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();

        match events.recv().await {
            Some(RefreshEvent::Updated(snapshot)) => assert_eq!(snapshot.events.len(), 1),
            other => panic!("expected an update, got {:?}", other),
        }
        assert_eq!(handle.state(), RefreshState::Succeeded);

        sleep(Duration::from_secs(11)).await;
        assert_eq!(source.call_secs(), vec![0, 5, 10]);
        assert!(handle.snapshot().events.is_empty());
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_waits_for_acknowledgment_then_backs_off() {
        let source = Scripted::new(vec![
            Step::ok(vec![quake("Alaska")]),
            Step::err(FeedError::HttpStatus(503)),
        ]);
        let (handle, mut events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();

        assert_eq!(next_failure(&mut events).await, FeedError::HttpStatus(503));
        assert_eq!(handle.state(), RefreshState::Failed);
        // the last good set stays visible
        assert_eq!(handle.snapshot().events.len(), 1);

        sleep(Duration::from_secs(20)).await;
        assert_eq!(source.call_secs(), vec![0, 5]);

        // acknowledged at 25s: backoff of 10s, then back to 5s
        handle.acknowledge();
        sleep(Duration::from_secs(16)).await;
        assert_eq!(source.call_secs(), vec![0, 5, 35, 40]);
        assert_eq!(handle.state(), RefreshState::Succeeded);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_during_failing_fetch_waits_for_backoff() {
        let source = Scripted::new(vec![
            Step::ok(vec![quake("Alaska")]),
            Step {
                delay: Duration::from_secs(2),
                result: Err(FeedError::HttpStatus(503)),
            },
        ]);
        let (handle, mut events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();

        sleep(Duration::from_secs(6)).await;
        handle.set_filter("alaska");
        assert_eq!(next_failure(&mut events).await, FeedError::HttpStatus(503));

        // acknowledged at 10s: nothing before the 10s backoff runs out
        sleep(Duration::from_secs(3)).await;
        handle.acknowledge();
        sleep(Duration::from_secs(9)).await;
        assert_eq!(source.call_secs(), vec![0, 5]);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(source.call_secs(), vec![0, 5, 20]);
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.filter, "alaska");
        assert!(snapshot.refreshed_at.is_some());
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_failures_keep_backoff() {
        let source = Scripted::new(vec![
            Step::err(FeedError::Transport("connection reset".into())),
            Step::err(FeedError::MalformedFeed("missing field `features`".into())),
        ]);
        let config = RefreshConfig {
            interval: Duration::from_secs(2),
            ..RefreshConfig::default()
        };
        let (handle, mut events) = spawn(Arc::clone(&source), config, context()).unwrap();

        next_failure(&mut events).await;
        handle.acknowledge();
        next_failure(&mut events).await;
        assert_eq!(source.call_secs(), vec![0, 4]);
        handle.acknowledge();
        sleep(Duration::from_secs(9)).await;
        // 4s backoff after the second failure, 2s once healthy again
        assert_eq!(source.call_secs(), vec![0, 4, 8, 10, 12]);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_fetch_in_flight() {
        let source = Scripted::new(vec![Step::slow(
            Duration::from_secs(12),
            vec![quake("Chile")],
        )]);
        let (handle, mut events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();

        sleep(Duration::from_secs(11)).await;
        assert_eq!(source.call_secs(), vec![0]);
        assert_eq!(handle.state(), RefreshState::Running);

        match events.recv().await {
            Some(RefreshEvent::Updated(snapshot)) => {
                assert_eq!(snapshot.events[0].region(), "Chile")
            }
            other => panic!("expected an update, got {:?}", other),
        }
        sleep(Duration::from_secs(6)).await;
        assert_eq!(source.call_secs(), vec![0, 17]);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_changes_are_debounced() {
        let source = Scripted::new(Vec::new());
        let (handle, mut events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();
        events.recv().await;

        sleep(Duration::from_secs(1)).await;
        handle.set_window(window(11));
        handle.set_window(window(12));
        handle.set_filter("alaska");
        sleep(Duration::from_secs(1)).await;

        assert_eq!(source.call_secs(), vec![0, 1]);
        assert_eq!(source.windows(), vec![window(10), window(12)]);
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.window, window(12));
        assert_eq!(snapshot.filter, "alaska");
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_during_fetch_refetches_after_it() {
        let source = Scripted::new(vec![Step::slow(Duration::from_secs(3), Vec::new())]);
        let (handle, _events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();

        sleep(Duration::from_secs(1)).await;
        handle.set_window(window(12));
        sleep(Duration::from_secs(3)).await;
        assert_eq!(source.call_secs(), vec![0, 3]);
        assert_eq!(source.windows(), vec![window(10), window(12)]);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_result() {
        let source = Scripted::new(vec![Step::slow(
            Duration::from_secs(3),
            vec![quake("Japan")],
        )]);
        let (handle, mut events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();

        sleep(Duration::from_secs(1)).await;
        handle.stop();
        handle.stop();
        assert_eq!(handle.state(), RefreshState::Stopped);
        assert!(handle.is_stopped());

        sleep(Duration::from_secs(30)).await;
        assert_eq!(source.call_secs(), vec![0]);
        assert!(handle.snapshot().events.is_empty());
        assert!(events.recv().await.is_none());
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_replaces_snapshot() {
        let source = Scripted::new(Vec::new());
        let (handle, mut events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();
        events.recv().await;

        handle.replace(vec![quake("Alaska"), quake("Nevada")]);
        match events.recv().await {
            Some(RefreshEvent::Updated(snapshot)) => assert_eq!(snapshot.events.len(), 2),
            other => panic!("expected an update, got {:?}", other),
        }
        assert_eq!(handle.snapshot().events.len(), 2);
        handle.set_filter("nev");
        // the refetch replaces the import wholesale
        sleep(Duration::from_secs(1)).await;
        assert!(handle.snapshot().events.is_empty());
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval() {
        let source = Scripted::new(Vec::new());
        let (handle, mut events) =
            spawn(Arc::clone(&source), RefreshConfig::default(), context()).unwrap();
        events.recv().await;

        handle.set_interval(Duration::from_secs(2)).unwrap();
        assert_eq!(
            handle.set_interval(Duration::from_secs(20)),
            Err(ConfigError::BackoffTooShort {
                interval: Duration::from_secs(20),
                max_backoff: Duration::from_secs(10),
            })
        );
        sleep(Duration::from_secs(5)).await;
        assert_eq!(source.call_secs(), vec![0, 2, 4]);
        assert_eq!(handle.config().interval, Duration::from_secs(2));
        handle.join().await;
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = RefreshConfig {
            interval: Duration::from_secs(10),
            max_backoff: Duration::from_secs(10),
            ..RefreshConfig::default()
        };
        let result = spawn(Scripted::new(Vec::new()), config, context());
        assert!(matches!(result, Err(ConfigError::BackoffTooShort { .. })));
    }

    #[test]
    fn test_snapshot_visible_applies_filter() {
        let snapshot = Snapshot {
            window: window(10),
            filter: "ALASKA".to_string(),
            events: vec![quake("Alaska"), quake("Nevada"), quake("alaska peninsula")],
            refreshed_at: None,
        };
        let visible = snapshot.visible();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[1].region(), "alaska peninsula");
    }
}
