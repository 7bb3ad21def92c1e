//! Door transition monitor
//!
//! Polls the door position on a fixed interval and records one
//! `State Change` event per observed change. The startup reading is recorded
//! as `System Startup` and is not a transition.
//!
//! Positions that last shorter than the poll interval can be missed.

use crate::domain::types::{DoorPosition, HardwareIoError};
use crate::io::event_log::{EventSink, ACTION_STARTUP, ACTION_STATE_CHANGE};
use crate::services::position::PositionReader;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// State shared between the monitor handle and its polling task
#[derive(Debug, Default)]
pub struct MonitorState {
    last_position: Mutex<Option<DoorPosition>>,
    running: AtomicBool,
}

impl MonitorState {
    pub fn last_position(&self) -> Option<DoorPosition> {
        *self.last_position.lock()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

struct RunningLoop {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct TransitionMonitor {
    reader: Arc<PositionReader>,
    sink: Arc<dyn EventSink>,
    poll_interval: Duration,
    stop_timeout: Duration,
    state: Arc<MonitorState>,
    task: Mutex<Option<RunningLoop>>,
}

impl TransitionMonitor {
    pub fn new(
        reader: Arc<PositionReader>,
        sink: Arc<dyn EventSink>,
        poll_interval: Duration,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            reader,
            sink,
            poll_interval,
            stop_timeout,
            state: Arc::new(MonitorState::default()),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Record the startup position and begin polling. No-op while running.
    pub fn start(&self) -> Result<(), HardwareIoError> {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            debug!("door_monitor_already_running");
            return Ok(());
        }

        let initial = self.reader.position()?;
        self.sink.record(ACTION_STARTUP, initial.as_str());
        *self.state.last_position.lock() = Some(initial);
        self.state.running.store(true, Ordering::Release);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(
            self.reader.clone(),
            self.sink.clone(),
            self.state.clone(),
            self.poll_interval,
            shutdown_rx,
        ));
        *task = Some(RunningLoop { shutdown_tx, handle });

        info!(
            position = %initial.as_str(),
            poll_interval_ms = %self.poll_interval.as_millis(),
            "door_monitor_started"
        );
        Ok(())
    }

    /// Signal the loop to exit and wait up to the stop timeout for it.
    /// Returns whether the loop exited on its own in time.
    pub async fn stop(&self) -> bool {
        let running = self.task.lock().take();
        let Some(RunningLoop { shutdown_tx, mut handle }) = running else {
            return true;
        };

        let _ = shutdown_tx.send(true);
        let clean = match tokio::time::timeout(self.stop_timeout, &mut handle).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "door_monitor_task_failed");
                true
            }
            Err(_) => {
                warn!(timeout_ms = %self.stop_timeout.as_millis(), "door_monitor_stop_timeout");
                handle.abort();
                false
            }
        };

        self.state.running.store(false, Ordering::Release);
        info!(clean = %clean, "door_monitor_stopped");
        clean
    }
}

async fn poll_loop(
    reader: Arc<PositionReader>,
    sink: Arc<dyn EventSink>,
    state: Arc<MonitorState>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the startup reading covers it
    ticker.tick().await;

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let position = match reader.position() {
            Ok(position) => position,
            Err(e) => {
                warn!(pin = %e.pin(), error = %e, "door_poll_failed");
                continue;
            }
        };

        let mut last = state.last_position.lock();
        if *last != Some(position) {
            info!(
                from = %last.map_or("none", |p| p.as_str()),
                to = %position.as_str(),
                "door_state_change"
            );
            *last = Some(position);
            drop(last);
            sink.record(ACTION_STATE_CHANGE, position.as_str());
        } else {
            tracing::trace!(position = %position.as_str(), "door_poll");
        }
    }

    state.running.store(false, Ordering::Release);
    debug!("door_monitor_loop_exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decode::DecodeTable;
    use crate::domain::types::{Level, PinId, SensorTopology};
    use crate::io::emulated::EmulatedGpio;
    use crate::io::event_log::MemoryEventSink;

    fn setup() -> (Arc<EmulatedGpio>, Arc<MemoryEventSink>, TransitionMonitor) {
        let gpio = Arc::new(EmulatedGpio::new());
        let sink = Arc::new(MemoryEventSink::new());
        let reader = Arc::new(PositionReader::new(
            gpio.clone(),
            SensorTopology::new(vec![PinId(27), PinId(22), PinId(23), PinId(24)]),
            DecodeTable::ladder(4).unwrap(),
        ));
        let monitor = TransitionMonitor::new(
            reader,
            sink.clone(),
            Duration::from_secs(1),
            Duration::from_secs(2),
        );
        (gpio, sink, monitor)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_records_startup_only() {
        let (_gpio, sink, monitor) = setup();
        monitor.start().unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(sink.with_action("System Startup").len(), 1);
        assert_eq!(sink.with_action("System Startup")[0].state, "Closed");
        assert!(sink.with_action("State Change").is_empty());
        assert!(monitor.is_running());
        assert_eq!(monitor.state().last_position(), Some(DoorPosition::Closed));
        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_recorded_once() {
        let (gpio, sink, monitor) = setup();
        monitor.start().unwrap();

        gpio.force(PinId(27), Level::High);
        tokio::time::sleep(Duration::from_millis(3500)).await;

        let changes = sink.with_action("State Change");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].state, "Ajar");
        assert_eq!(monitor.state().last_position(), Some(DoorPosition::Ajar));
        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_noop() {
        let (_gpio, sink, monitor) = setup();
        monitor.start().unwrap();
        monitor.start().unwrap();
        assert_eq!(sink.len(), 1);
        monitor.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_polling() {
        let (gpio, sink, monitor) = setup();
        monitor.start().unwrap();

        let started = tokio::time::Instant::now();
        assert!(monitor.stop().await);
        assert!(started.elapsed() <= Duration::from_secs(2));
        assert!(!monitor.is_running());

        gpio.force(PinId(27), Level::High);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let (_gpio, sink, monitor) = setup();
        monitor.start().unwrap();
        monitor.stop().await;
        monitor.start().unwrap();
        assert!(monitor.is_running());
        assert_eq!(sink.with_action("System Startup").len(), 2);
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_stop_when_never_started() {
        let (_gpio, _sink, monitor) = setup();
        assert!(monitor.stop().await);
    }
}
