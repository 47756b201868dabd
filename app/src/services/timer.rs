//! Rest timer driven by a one-second tokio interval
//!
//! Wraps the [`RestTimer`] state machine. At most one ticker task exists per
//! service: every transition that stops or restarts the countdown aborts the
//! previous task first, and dropping the service aborts it too. Must be used
//! from within a tokio runtime.

use crate::config::TimerConfig;
use appfitness_shared::validation::custom_duration;
use appfitness_shared::{RestTimer, TickOutcome};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Side effects emitted by the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The countdown reached zero; hosts play the haptic/alert once
    Finished,
}

struct Shared {
    timer: Mutex<RestTimer>,
    snapshots: watch::Sender<RestTimer>,
    events: broadcast::Sender<TimerEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RestTimer> {
        // RestTimer is Copy and every mutation is a single step
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a transition and publish the resulting state
    fn update<R>(&self, f: impl FnOnce(&mut RestTimer) -> R) -> (R, RestTimer) {
        let mut timer = self.lock();
        let result = f(&mut timer);
        let snapshot = *timer;
        drop(timer);
        self.snapshots.send_replace(snapshot);
        (result, snapshot)
    }
}

pub struct RestTimerService {
    shared: Arc<Shared>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    presets: Vec<u32>,
    default_seconds: u32,
    max_custom_seconds: u32,
    tick_period: Duration,
}

impl RestTimerService {
    pub fn new(config: &TimerConfig) -> Self {
        let timer = RestTimer::new(config.default_seconds);
        let (snapshots, _) = watch::channel(timer);
        let (events, _) = broadcast::channel(8);
        Self {
            shared: Arc::new(Shared {
                timer: Mutex::new(timer),
                snapshots,
                events,
            }),
            ticker: Mutex::new(None),
            presets: config.presets.clone(),
            default_seconds: config.default_seconds,
            max_custom_seconds: config.max_custom_seconds,
            tick_period: Duration::from_secs(1),
        }
    }

    pub fn presets(&self) -> &[u32] {
        &self.presets
    }

    /// Current state
    pub fn snapshot(&self) -> RestTimer {
        *self.shared.lock()
    }

    /// State after every transition and tick
    pub fn subscribe(&self) -> watch::Receiver<RestTimer> {
        self.shared.snapshots.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<TimerEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start or resume the countdown
    pub fn start(&self) {
        let (_, snapshot) = self.shared.update(RestTimer::start);
        debug!(remaining = snapshot.remaining(), "Rest timer started");
        self.spawn_ticker();
    }

    pub fn pause(&self) {
        self.stop_ticker();
        let (_, snapshot) = self.shared.update(RestTimer::pause);
        debug!(remaining = snapshot.remaining(), "Rest timer paused");
    }

    pub fn reset(&self) {
        self.stop_ticker();
        self.shared.update(RestTimer::reset);
    }

    pub fn select_preset(&self, seconds: u32) {
        self.stop_ticker();
        self.shared.update(|t| t.select_preset(seconds));
    }

    /// Apply a user-entered duration; false and no change if out of range
    pub fn set_custom(&self, total_seconds: u32) -> bool {
        if !(1..=self.max_custom_seconds).contains(&total_seconds) {
            return false;
        }
        self.stop_ticker();
        let (applied, _) = self.shared.update(|t| t.set_custom(total_seconds));
        applied
    }

    /// Parse the minutes and seconds fields of the custom form and apply them
    pub fn set_custom_text(&self, minutes: &str, seconds: &str) -> bool {
        match custom_duration(minutes, seconds) {
            Some(total) => self.set_custom(total),
            None => false,
        }
    }

    /// Add time in any phase; a finished countdown resumes
    pub fn add_time(&self, seconds: u32) {
        let (_, snapshot) = self.shared.update(|t| t.add_time(seconds));
        debug!(seconds, remaining = snapshot.remaining(), "Added rest time");
        if snapshot.is_running() && !self.is_ticking() {
            self.spawn_ticker();
        }
    }

    /// Back to the configured default duration, idle
    pub fn restore_default(&self) {
        self.select_preset(self.default_seconds);
    }

    fn ticker_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stop_ticker(&self) {
        if let Some(handle) = self.ticker_slot().take() {
            handle.abort();
        }
    }

    fn spawn_ticker(&self) {
        let mut slot = self.ticker_slot();
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.shared);
        let period = self.tick_period;
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let (outcome, _) = shared.update(RestTimer::tick);
                match outcome {
                    TickOutcome::Counted { .. } => continue,
                    TickOutcome::Finished => {
                        info!("Rest timer finished");
                        let _ = shared.events.send(TimerEvent::Finished);
                        break;
                    }
                    TickOutcome::Ignored => break,
                }
            }
        }));
    }
}

impl Drop for RestTimerService {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appfitness_shared::TimerPhase;

    fn service() -> RestTimerService {
        RestTimerService::new(&TimerConfig::default())
    }

    /// Let `secs` ticks fire, landing half a second past the last one
    async fn advance_secs(secs: u64) {
        tokio::time::sleep(Duration::from_millis(secs * 1000 + 500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_to_finished_once() {
        let timer = service();
        let mut events = timer.events();

        timer.start();
        advance_secs(95).await;

        let state = timer.snapshot();
        assert_eq!(state.remaining(), 0);
        assert_eq!(state.phase(), TimerPhase::Finished);
        assert_eq!(events.try_recv(), Ok(TimerEvent::Finished));
        assert!(events.try_recv().is_err());
        assert!(!timer.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_does_not_double_tick() {
        let timer = service();
        timer.start();
        timer.start();
        timer.start();

        advance_secs(10).await;
        assert_eq!(timer.snapshot().remaining(), 80);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_stops_ticking() {
        let timer = service();
        timer.start();
        advance_secs(5).await;
        timer.pause();
        advance_secs(5).await;

        let state = timer.snapshot();
        assert_eq!(state.remaining(), 85);
        assert_eq!(state.phase(), TimerPhase::Paused);
        assert!(!timer.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_time_after_finish_resumes_ticking() {
        let timer = service();
        assert!(timer.set_custom(2));
        timer.start();
        advance_secs(3).await;
        assert_eq!(timer.snapshot().phase(), TimerPhase::Finished);

        timer.add_time(30);
        assert_eq!(timer.snapshot().remaining(), 30);
        assert!(timer.snapshot().is_running());

        advance_secs(4).await;
        assert_eq!(timer.snapshot().remaining(), 26);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preset_overrides_run() {
        let timer = service();
        timer.start();
        advance_secs(3).await;
        timer.select_preset(120);
        advance_secs(3).await;

        let state = timer.snapshot();
        assert_eq!(state.phase(), TimerPhase::Idle);
        assert_eq!(state.remaining(), 120);
    }

    #[tokio::test]
    async fn test_custom_text_bounds() {
        let timer = service();
        assert!(timer.set_custom_text("2", "30"));
        assert_eq!(timer.snapshot().base(), 150);
        assert_eq!(timer.snapshot().phase(), TimerPhase::Idle);

        let before = timer.snapshot();
        assert!(!timer.set_custom(700));
        assert!(!timer.set_custom_text("11", "0"));
        assert_eq!(timer.snapshot(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_ticks() {
        let timer = service();
        let mut rx = timer.subscribe();
        timer.start();
        rx.borrow_and_update();

        advance_secs(1).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().remaining(), 89);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_ticker() {
        let timer = service();
        let rx = timer.subscribe();
        timer.start();
        drop(timer);

        advance_secs(3).await;
        assert_eq!(rx.borrow().remaining(), 90);
    }
}
