//! process-usage : storage and http api for per-process resource usage samples
//!
//! Samples carry the elapsed cpu time in the compact text form printed by
//! `ps` (see [`process_time`]). The whole set can be replaced in one call
//! (see [`store::ProcessStore::replace_all`]).

// crate-specific lint exceptions:
#![allow(clippy::missing_errors_doc)]

pub mod handlers;
pub mod observability;
pub mod process_record;
pub mod process_time;
pub mod store;
pub mod view;
pub mod web_service;
