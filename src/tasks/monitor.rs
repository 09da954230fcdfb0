//! Countdown observer background task

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::timer::TimerEvent;

/// Background task that observes one countdown's event stream
///
/// This is where the owning application reacts to the countdown: progress
/// is logged at debug, terminal events at info, and the most recent event
/// is recorded for the status endpoint. The task exits when the countdown
/// it observes is dropped.
pub async fn timer_monitor_task(
    mut events: broadcast::Receiver<TimerEvent>,
    last_event: Arc<Mutex<Option<TimerEvent>>>,
) {
    debug!("Starting countdown monitor task");

    loop {
        match events.recv().await {
            Ok(event) => {
                match event {
                    TimerEvent::Tick { remaining_seconds } => {
                        debug!("Countdown tick: {}s remaining", remaining_seconds);
                    }
                    TimerEvent::Completed => {
                        info!("Countdown completed");
                    }
                    TimerEvent::Aborted => {
                        info!("Countdown aborted before completion");
                    }
                }

                if let Ok(mut last_event) = last_event.lock() {
                    *last_event = Some(event);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Countdown monitor lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }

    debug!("Countdown monitor task exiting");
}
