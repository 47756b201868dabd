//! AppFitness engine
//!
//! Everything a workout tracking app needs below its screens: the rest
//! timer, the active-session editor, progress aggregation, per-user data
//! access and sign-in. Hosts build an [`state::AppState`] once at startup.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod services;
pub mod state;
pub mod telemetry;
