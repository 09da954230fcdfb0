//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::tasks::timer_monitor_task;
use crate::timer::{Countdown, TimerError, TimerEvent, TimerPhase, TimerSnapshot};

/// Main application state: owns the current countdown and server metadata
///
/// The countdown itself enforces its own state machine; this layer adds
/// the owning-application concerns on top of it: replacing a finished
/// countdown with a fresh one, wiring each countdown to a monitor task,
/// and tracking the last action for the status endpoint.
#[derive(Debug)]
pub struct AppState {
    /// The countdown currently owned by the server
    timer: Mutex<Countdown>,
    /// Countdown length armed at boot, also the fallback for restarts
    pub default_seconds: u64,
    /// Last event observed by the monitor task
    last_event: Arc<Mutex<Option<TimerEvent>>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    /// Create the application state with an idle countdown of
    /// `default_seconds` armed and monitored
    ///
    /// Spawns the monitor task, so this must be called from within a
    /// Tokio runtime.
    pub fn new(port: u16, host: String, default_seconds: u64) -> Self {
        let timer = Countdown::new(default_seconds);
        let last_event = Arc::new(Mutex::new(None));
        tokio::spawn(timer_monitor_task(
            timer.subscribe(),
            Arc::clone(&last_event),
        ));

        Self {
            timer: Mutex::new(timer),
            default_seconds,
            last_event,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Start the countdown
    ///
    /// From `Idle` this optionally reconfigures the length, then resumes.
    /// From a terminal phase it constructs a fresh countdown (defaulting
    /// to the previous length), attaches a monitor, and starts it. A
    /// countdown that is already running or paused is not replaced.
    pub fn start(&self, seconds: Option<u64>) -> Result<TimerSnapshot, TimerError> {
        let mut slot = lock_timer(&self.timer);
        let current = slot.snapshot();

        if matches!(current.phase, TimerPhase::Running | TimerPhase::Paused) {
            return Err(TimerError::InvalidTransition {
                from: current.phase,
                op: "start",
            });
        }

        if current.phase.is_terminal() {
            let fresh = Countdown::new(seconds.unwrap_or(current.total_seconds));
            if let Ok(mut last_event) = self.last_event.lock() {
                *last_event = None;
            }
            tokio::spawn(timer_monitor_task(
                fresh.subscribe(),
                Arc::clone(&self.last_event),
            ));
            fresh.resume()?;
            *slot = fresh;
        } else {
            if let Some(seconds) = seconds {
                slot.set_total_seconds(seconds)?;
            }
            slot.resume()?;
        }

        let snapshot = slot.snapshot();
        info!("Countdown started: {}s remaining", snapshot.remaining_seconds);
        self.record_action("start");
        Ok(snapshot)
    }

    /// Pause the running countdown, preserving its remaining time
    pub fn pause(&self) -> Result<TimerSnapshot, TimerError> {
        let slot = lock_timer(&self.timer);
        slot.pause()?;
        let snapshot = slot.snapshot();
        info!("Countdown paused: {}s remaining", snapshot.remaining_seconds);
        self.record_action("pause");
        Ok(snapshot)
    }

    /// Resume a paused (or idle) countdown from its preserved remaining
    /// time
    pub fn resume(&self) -> Result<TimerSnapshot, TimerError> {
        let slot = lock_timer(&self.timer);
        slot.resume()?;
        let snapshot = slot.snapshot();
        info!("Countdown resumed: {}s remaining", snapshot.remaining_seconds);
        self.record_action("resume");
        Ok(snapshot)
    }

    /// Abort the countdown before it completes
    pub fn abort(&self) -> Result<TimerSnapshot, TimerError> {
        let slot = lock_timer(&self.timer);
        slot.abort()?;
        let snapshot = slot.snapshot();
        info!("Countdown aborted: {}s were remaining", snapshot.remaining_seconds);
        self.record_action("abort");
        Ok(snapshot)
    }

    /// Reconfigure the countdown length; only valid while idle
    pub fn reconfigure(&self, seconds: u64) -> Result<TimerSnapshot, TimerError> {
        let slot = lock_timer(&self.timer);
        slot.set_total_seconds(seconds)?;
        info!("Countdown reconfigured to {}s", seconds);
        self.record_action("reconfigure");
        Ok(slot.snapshot())
    }

    /// Get a consistent snapshot of the current countdown
    pub fn timer_snapshot(&self) -> TimerSnapshot {
        lock_timer(&self.timer).snapshot()
    }

    /// Get the last event the monitor task observed, if any
    pub fn last_event(&self) -> Option<TimerEvent> {
        self.last_event.lock().ok().and_then(|event| *event)
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }
}

fn lock_timer(timer: &Mutex<Countdown>) -> MutexGuard<'_, Countdown> {
    match timer.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
