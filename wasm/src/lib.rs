//! AppFitness WASM Module
//!
//! Browser bindings for the pieces of the engine that need no I/O: the rest
//! timer state machine, the lenient form parsers, display formatting and the
//! progress aggregations. Collections cross the boundary as JSON in the same
//! camelCase shape the stores persist.

use appfitness_shared::stats::{self, chart_series};
use appfitness_shared::validation;
use appfitness_shared::{
    format_clock, format_volume, BodyMetric, ProgressEntry, RestTimer, TickOutcome, WorkoutRecord,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

/// Rest timer driven by a browser interval calling [`RestTimerHandle::tick`]
#[wasm_bindgen]
pub struct RestTimerHandle {
    inner: RestTimer,
}

#[wasm_bindgen]
impl RestTimerHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(base_seconds: u32) -> Self {
        Self {
            inner: RestTimer::new(base_seconds),
        }
    }

    pub fn start(&mut self) {
        self.inner.start();
    }

    pub fn pause(&mut self) {
        self.inner.pause();
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Returns true exactly once, on the tick that reaches zero
    pub fn tick(&mut self) -> bool {
        matches!(self.inner.tick(), TickOutcome::Finished)
    }

    pub fn select_preset(&mut self, seconds: u32) {
        self.inner.select_preset(seconds);
    }

    pub fn set_custom(&mut self, total_seconds: u32) -> bool {
        self.inner.set_custom(total_seconds)
    }

    pub fn add_time(&mut self, seconds: u32) {
        self.inner.add_time(seconds);
    }

    #[wasm_bindgen(getter)]
    pub fn remaining(&self) -> u32 {
        self.inner.remaining()
    }

    #[wasm_bindgen(getter)]
    pub fn base(&self) -> u32 {
        self.inner.base()
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.inner.is_running()
    }

    /// "idle", "running", "paused" or "finished"
    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        serde_json::to_value(self.inner.phase())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Fraction of the base duration still left, 0 to 1
    #[wasm_bindgen(getter)]
    pub fn progress(&self) -> f64 {
        self.inner.progress()
    }

    /// Remaining time as m:ss
    pub fn display(&self) -> String {
        format_clock(self.inner.remaining())
    }
}

#[wasm_bindgen]
pub fn parse_reps(text: &str) -> u32 {
    validation::parse_reps(text)
}

#[wasm_bindgen]
pub fn parse_weight(text: &str) -> f64 {
    validation::parse_weight(text)
}

#[wasm_bindgen]
pub fn parse_measurement(text: &str) -> f64 {
    validation::parse_measurement(text)
}

/// Total seconds of the custom timer form, or undefined if invalid
#[wasm_bindgen]
pub fn custom_duration(minutes_text: &str, seconds_text: &str) -> Option<u32> {
    validation::custom_duration(minutes_text, seconds_text)
}

#[wasm_bindgen]
pub fn volume_label(volume_kg: f64) -> String {
    format_volume(volume_kg)
}

#[wasm_bindgen]
pub fn clock_label(seconds: u32) -> String {
    format_clock(seconds)
}

/// Weekly count and volume as JSON `{count, volume}`
#[wasm_bindgen]
pub fn weekly_stats(history_json: &str, today: &str) -> Result<String, JsError> {
    weekly_stats_json(history_json, today).map_err(|e| JsError::new(&e))
}

#[wasm_bindgen]
pub fn streak(history_json: &str, today: &str) -> Result<u32, JsError> {
    streak_days(history_json, today).map_err(|e| JsError::new(&e))
}

/// Chronological `[{date, value}]` points for "weight", "waist", "chest" or "hip"
#[wasm_bindgen]
pub fn chart(entries_json: &str, metric: &str) -> Result<String, JsError> {
    chart_json(entries_json, metric).map_err(|e| JsError::new(&e))
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {}", e))
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| format!("Invalid date {:?}: {}", text, e))
}

fn weekly_stats_json(history_json: &str, today: &str) -> Result<String, String> {
    let history: Vec<WorkoutRecord> = parse_json(history_json)?;
    let weekly = stats::weekly_stats(&history, parse_date(today)?);
    serde_json::to_string(&weekly).map_err(|e| e.to_string())
}

fn streak_days(history_json: &str, today: &str) -> Result<u32, String> {
    let history: Vec<WorkoutRecord> = parse_json(history_json)?;
    Ok(stats::streak(&history, parse_date(today)?))
}

fn chart_json(entries_json: &str, metric: &str) -> Result<String, String> {
    let entries: Vec<ProgressEntry> = parse_json(entries_json)?;
    let metric: BodyMetric = serde_json::from_value(serde_json::Value::String(metric.to_lowercase()))
        .map_err(|_| format!("Unknown metric {:?}", metric))?;
    serde_json::to_string(&chart_series(&entries, metric)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORY: &str = r#"[
        {"id":"w2","name":"Legs","date":"2025-03-11","durationMinutes":40,"totalSets":6,"totalVolume":2400.0,"exercises":[]},
        {"id":"w1","name":"Push","date":"2025-03-10","durationMinutes":45,"totalSets":8,"totalVolume":1800.5,"exercises":[]},
        {"id":"w0","name":"Pull","date":"2025-03-07","durationMinutes":30,"totalSets":5,"totalVolume":900.0,"exercises":[]}
    ]"#;

    #[test]
    fn test_timer_handle_finishes_once() {
        let mut timer = RestTimerHandle::new(2);
        timer.start();
        assert_eq!(timer.phase(), "running");
        assert!(!timer.tick());
        assert_eq!(timer.display(), "0:01");
        assert!(timer.tick());
        assert!(!timer.tick());
        assert_eq!(timer.phase(), "finished");
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_weekly_stats_and_streak() {
        let weekly = weekly_stats_json(HISTORY, "2025-03-12").unwrap();
        assert_eq!(weekly, r#"{"count":2,"volume":4200.5}"#);
        assert_eq!(streak_days(HISTORY, "2025-03-12").unwrap(), 2);
        assert_eq!(streak_days(HISTORY, "2025-03-14").unwrap(), 0);
    }

    #[test]
    fn test_chart_skips_unrecorded_values() {
        let entries = r#"[
            {"id":"p2","date":"2025-03-12","weight":80.5,"photos":[]},
            {"id":"p1","date":"2025-03-05","waist":84.0},
            {"id":"p0","date":"2025-03-01","weight":82.0}
        ]"#;
        let points = chart_json(entries, "Weight").unwrap();
        assert_eq!(
            points,
            r#"[{"date":"2025-03-01","value":82.0},{"date":"2025-03-12","value":80.5}]"#
        );
        assert!(chart_json(entries, "biceps").is_err());
    }

    #[test]
    fn test_bad_input_is_reported() {
        assert!(weekly_stats_json("not json", "2025-03-12").is_err());
        assert!(streak_days("[]", "12/03/2025").is_err());
    }

    #[test]
    fn test_form_helpers() {
        assert_eq!(parse_reps("12x"), 12);
        assert_eq!(parse_weight("62,5"), 62.5);
        assert_eq!(custom_duration("2", "30"), Some(150));
        assert_eq!(custom_duration("10", "01"), None);
        assert_eq!(volume_label(1500.0), "1.5t");
    }
}
