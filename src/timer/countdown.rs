//! The countdown state machine and its background tick source

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use super::{TimerError, TimerEvent, TimerPhase, TimerSnapshot};

/// Fixed advancement period of a running countdown
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Undelivered events a subscriber can fall behind before it starts
/// lagging. A lagging subscriber never blocks the countdown.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A single pausable, abortable countdown
///
/// Created in [`TimerPhase::Idle`] with its full time remaining. While
/// running, a background task decrements the remaining time once per
/// second and notifies subscribers; pausing freezes the remaining time
/// exactly, aborting ends the countdown early with a distinct terminal
/// event. `Completed` and `Aborted` are dead ends: construct a new
/// `Countdown` to run again.
///
/// All operations may be called from any thread and are serialized
/// against tick delivery internally. Once `pause` or `abort` returns, no
/// further event is delivered for the cancelled run. Dropping the
/// `Countdown` stops its tick source.
///
/// `resume` spawns onto the ambient Tokio runtime and must be called
/// from within one.
pub struct Countdown {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    events: broadcast::Sender<TimerEvent>,
}

struct Inner {
    total_seconds: u64,
    remaining_seconds: u64,
    phase: TimerPhase,
    /// Generation of the current tick task. Bumped on every transition
    /// that invalidates an in-flight run, checked by the task under the
    /// lock before any effect is applied.
    run: u64,
    cancel: Option<watch::Sender<bool>>,
    /// Keep one receiver alive so event sends cannot fail with zero
    /// external subscribers
    _events_rx: broadcast::Receiver<TimerEvent>,
}

impl Countdown {
    /// Create an idle countdown of `total_seconds`
    ///
    /// A zero-length countdown is valid: once resumed it delivers a
    /// single `Tick { remaining_seconds: 0 }` on its first tick and then
    /// completes.
    pub fn new(total_seconds: u64) -> Self {
        let (events, events_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    total_seconds,
                    remaining_seconds: total_seconds,
                    phase: TimerPhase::Idle,
                    run: 0,
                    cancel: None,
                    _events_rx: events_rx,
                }),
                events,
            }),
        }
    }

    /// Subscribe to this countdown's events
    ///
    /// Receivers are not owned by the countdown; dropping one has no
    /// effect on it. The channel closes when the `Countdown` is dropped.
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.shared.events.subscribe()
    }

    /// Take a consistent snapshot of phase and remaining time
    pub fn snapshot(&self) -> TimerSnapshot {
        let inner = self.shared.lock_inner();
        TimerSnapshot {
            phase: inner.phase,
            total_seconds: inner.total_seconds,
            remaining_seconds: inner.remaining_seconds,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> TimerPhase {
        self.shared.lock_inner().phase
    }

    /// Seconds left to run
    pub fn remaining_seconds(&self) -> u64 {
        self.shared.lock_inner().remaining_seconds
    }

    /// Configured countdown length
    pub fn total_seconds(&self) -> u64 {
        self.shared.lock_inner().total_seconds
    }

    /// Reconfigure the countdown length
    ///
    /// Only permitted while idle; resets the remaining time to the new
    /// total. Any other phase is rejected without state change.
    pub fn set_total_seconds(&self, total_seconds: u64) -> Result<(), TimerError> {
        let mut inner = self.shared.lock_inner();
        if inner.phase != TimerPhase::Idle {
            return Err(TimerError::InvalidTransition {
                from: inner.phase,
                op: "reconfigure",
            });
        }
        inner.total_seconds = total_seconds;
        inner.remaining_seconds = total_seconds;
        Ok(())
    }

    /// Start, or continue after a pause
    ///
    /// Valid from `Idle` and `Paused`; begins a fresh 1-second tick
    /// cadence counting down from the preserved remaining time. Calling
    /// this on an already-running countdown is rejected and does not
    /// disturb the tick cadence already in flight.
    pub fn resume(&self) -> Result<(), TimerError> {
        let mut inner = self.shared.lock_inner();
        match inner.phase {
            TimerPhase::Idle | TimerPhase::Paused => {}
            from => return Err(TimerError::InvalidTransition { from, op: "resume" }),
        }
        inner.phase = TimerPhase::Running;
        inner.run += 1;
        let run = inner.run;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        inner.cancel = Some(cancel_tx);
        debug!(run, remaining = inner.remaining_seconds, "countdown running");
        drop(inner);

        tokio::spawn(run_ticks(Arc::downgrade(&self.shared), run, cancel_rx));
        Ok(())
    }

    /// Freeze the countdown, preserving the remaining time exactly
    ///
    /// Valid only while running. Once this returns, no tick from the
    /// stopped run will be delivered.
    pub fn pause(&self) -> Result<(), TimerError> {
        let mut inner = self.shared.lock_inner();
        if inner.phase != TimerPhase::Running {
            return Err(TimerError::InvalidTransition {
                from: inner.phase,
                op: "pause",
            });
        }
        inner.phase = TimerPhase::Paused;
        inner.stop_run();
        debug!(remaining = inner.remaining_seconds, "countdown paused");
        Ok(())
    }

    /// Cancel the countdown before it completes
    ///
    /// Valid from `Idle`, `Running`, and `Paused`. Delivers exactly one
    /// [`TimerEvent::Aborted`] to subscribers; once this returns, no
    /// further tick is delivered.
    pub fn abort(&self) -> Result<(), TimerError> {
        let mut inner = self.shared.lock_inner();
        if inner.phase.is_terminal() {
            return Err(TimerError::InvalidTransition {
                from: inner.phase,
                op: "abort",
            });
        }
        inner.phase = TimerPhase::Aborted;
        inner.stop_run();
        debug!(remaining = inner.remaining_seconds, "countdown aborted");
        if let Err(e) = self.shared.events.send(TimerEvent::Aborted) {
            warn!("failed to deliver abort notification: {}", e);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("Countdown")
            .field("phase", &snapshot.phase)
            .field("total_seconds", &snapshot.total_seconds)
            .field("remaining_seconds", &snapshot.remaining_seconds)
            .finish()
    }
}

impl Inner {
    /// Invalidate the current tick task and wake it so it exits promptly
    fn stop_run(&mut self) {
        self.run += 1;
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(true);
        }
    }
}

impl Shared {
    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock means a tick task panicked between field
        // writes that are individually consistent; the state is still
        // usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Apply one 1-second advancement for the given run
    ///
    /// Returns `false` once the run should stop ticking, either because
    /// it was superseded or because the countdown completed.
    fn apply_tick(&self, run: u64) -> bool {
        let mut inner = self.lock_inner();
        if inner.run != run || inner.phase != TimerPhase::Running {
            return false;
        }
        inner.remaining_seconds = inner.remaining_seconds.saturating_sub(1);
        let remaining_seconds = inner.remaining_seconds;
        if let Err(e) = self.events.send(TimerEvent::Tick { remaining_seconds }) {
            warn!("failed to deliver tick notification: {}", e);
        }
        if remaining_seconds > 0 {
            return true;
        }
        inner.phase = TimerPhase::Completed;
        inner.stop_run();
        debug!("countdown completed");
        if let Err(e) = self.events.send(TimerEvent::Completed) {
            warn!("failed to deliver completion notification: {}", e);
        }
        false
    }
}

/// Tick source for one run of a countdown
///
/// Holds only a weak reference to the countdown so a dropped `Countdown`
/// is not kept alive by its own ticker; the watch channel doubles as a
/// drop signal because the sender lives inside the countdown state.
async fn run_ticks(shared: Weak<Shared>, run: u64, mut cancel: watch::Receiver<bool>) {
    let mut ticker = time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval's first tick completes immediately; consume it so the
    // first decrement lands a full period after resume.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                if !shared.apply_tick(run) {
                    break;
                }
            }
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    async fn next_event(events: &mut broadcast::Receiver<TimerEvent>) -> TimerEvent {
        time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("no event arrived")
            .expect("event channel closed")
    }

    async fn assert_no_event(events: &mut broadcast::Receiver<TimerEvent>) {
        let result = time::timeout(Duration::from_secs(5), events.recv()).await;
        assert!(result.is_err(), "unexpected event: {:?}", result);
    }

    fn tick(remaining_seconds: u64) -> TimerEvent {
        TimerEvent::Tick { remaining_seconds }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_completion_with_one_tick_per_second() {
        let countdown = Countdown::new(3);
        let mut events = countdown.subscribe();
        assert_eq!(countdown.phase(), TimerPhase::Idle);

        countdown.resume().unwrap();
        assert_eq!(next_event(&mut events).await, tick(2));
        assert_eq!(next_event(&mut events).await, tick(1));
        assert_eq!(next_event(&mut events).await, tick(0));
        assert_eq!(next_event(&mut events).await, TimerEvent::Completed);

        assert_eq!(countdown.phase(), TimerPhase::Completed);
        assert_eq!(countdown.remaining_seconds(), 0);
        assert_no_event(&mut events).await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_length_countdown_ticks_once_then_completes() {
        let countdown = Countdown::new(0);
        let mut events = countdown.subscribe();

        countdown.resume().unwrap();
        assert_eq!(next_event(&mut events).await, tick(0));
        assert_eq!(next_event(&mut events).await, TimerEvent::Completed);
        assert_eq!(countdown.phase(), TimerPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_preserves_remaining_and_silences_ticks() {
        let countdown = Countdown::new(10);
        let mut events = countdown.subscribe();

        countdown.resume().unwrap();
        assert_eq!(next_event(&mut events).await, tick(9));
        assert_eq!(next_event(&mut events).await, tick(8));
        assert_eq!(next_event(&mut events).await, tick(7));

        countdown.pause().unwrap();
        assert_eq!(countdown.phase(), TimerPhase::Paused);
        assert_eq!(countdown.remaining_seconds(), 7);
        assert_no_event(&mut events).await;

        countdown.resume().unwrap();
        assert_eq!(next_event(&mut events).await, tick(6));
        assert_eq!(next_event(&mut events).await, tick(5));
        assert_eq!(countdown.total_seconds(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_delivers_one_terminal_event_and_nothing_after() {
        let countdown = Countdown::new(5);
        let mut events = countdown.subscribe();

        countdown.resume().unwrap();
        assert_eq!(next_event(&mut events).await, tick(4));

        countdown.abort().unwrap();
        assert_eq!(next_event(&mut events).await, TimerEvent::Aborted);
        assert_eq!(countdown.phase(), TimerPhase::Aborted);
        assert_eq!(countdown.remaining_seconds(), 4);
        assert_no_event(&mut events).await;

        assert_eq!(
            countdown.abort(),
            Err(TimerError::InvalidTransition {
                from: TimerPhase::Aborted,
                op: "abort",
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abort_is_valid_before_first_resume() {
        let countdown = Countdown::new(5);
        let mut events = countdown.subscribe();

        countdown.abort().unwrap();
        assert_eq!(next_event(&mut events).await, TimerEvent::Aborted);
        assert_eq!(countdown.phase(), TimerPhase::Aborted);
        assert_eq!(countdown.remaining_seconds(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn misplaced_transitions_are_rejected_without_state_change() {
        let countdown = Countdown::new(10);
        let mut events = countdown.subscribe();

        assert_eq!(
            countdown.pause(),
            Err(TimerError::InvalidTransition {
                from: TimerPhase::Idle,
                op: "pause",
            })
        );

        countdown.resume().unwrap();
        assert_eq!(
            countdown.resume(),
            Err(TimerError::InvalidTransition {
                from: TimerPhase::Running,
                op: "resume",
            })
        );

        assert_eq!(next_event(&mut events).await, tick(9));
        countdown.pause().unwrap();
        assert_eq!(
            countdown.pause(),
            Err(TimerError::InvalidTransition {
                from: TimerPhase::Paused,
                op: "pause",
            })
        );
        assert_eq!(countdown.remaining_seconds(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_phases_reject_every_operation() {
        let countdown = Countdown::new(1);
        let mut events = countdown.subscribe();

        countdown.resume().unwrap();
        assert_eq!(next_event(&mut events).await, tick(0));
        assert_eq!(next_event(&mut events).await, TimerEvent::Completed);

        for (result, op) in [
            (countdown.resume(), "resume"),
            (countdown.pause(), "pause"),
            (countdown.abort(), "abort"),
            (countdown.set_total_seconds(30), "reconfigure"),
        ] {
            assert_eq!(
                result,
                Err(TimerError::InvalidTransition {
                    from: TimerPhase::Completed,
                    op,
                })
            );
        }
        assert_no_event(&mut events).await;
    }

    #[tokio::test(start_paused = true)]
    async fn reconfiguration_is_idle_only() {
        let countdown = Countdown::new(10);
        countdown.set_total_seconds(25).unwrap();
        assert_eq!(countdown.total_seconds(), 25);
        assert_eq!(countdown.remaining_seconds(), 25);

        let mut events = countdown.subscribe();
        countdown.resume().unwrap();
        assert_eq!(
            countdown.set_total_seconds(99),
            Err(TimerError::InvalidTransition {
                from: TimerPhase::Running,
                op: "reconfigure",
            })
        );

        assert_eq!(next_event(&mut events).await, tick(24));
        countdown.pause().unwrap();
        assert_eq!(
            countdown.set_total_seconds(99),
            Err(TimerError::InvalidTransition {
                from: TimerPhase::Paused,
                op: "reconfigure",
            })
        );
        assert_eq!(countdown.remaining_seconds(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_running_countdown_closes_the_stream_without_terminal_event() {
        let countdown = Countdown::new(60);
        let mut events = countdown.subscribe();
        countdown.resume().unwrap();
        drop(countdown);

        let result = time::timeout(Duration::from_secs(5), events.recv()).await;
        assert!(matches!(result, Ok(Err(RecvError::Closed))));
    }

    #[tokio::test(start_paused = true)]
    async fn events_keep_flowing_with_no_subscribers() {
        let countdown = Countdown::new(2);
        countdown.resume().unwrap();

        // Nobody is listening; the countdown must still complete.
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(countdown.phase(), TimerPhase::Completed);
        assert_eq!(countdown.remaining_seconds(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_resume_matches_an_uninterrupted_run() {
        let countdown = Countdown::new(4);
        let mut events = countdown.subscribe();

        countdown.resume().unwrap();
        assert_eq!(next_event(&mut events).await, tick(3));
        countdown.pause().unwrap();
        time::sleep(Duration::from_secs(30)).await;
        countdown.resume().unwrap();

        assert_eq!(next_event(&mut events).await, tick(2));
        countdown.pause().unwrap();
        countdown.resume().unwrap();
        assert_eq!(next_event(&mut events).await, tick(1));
        assert_eq!(next_event(&mut events).await, tick(0));
        assert_eq!(next_event(&mut events).await, TimerEvent::Completed);
    }
}
