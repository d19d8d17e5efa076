//! DeepCAL Core - multi-criteria decision engine for freight forwarder selection
//!
//! Ranks alternatives with neutrosophic AHP weights, grey normalization and a
//! TOPSIS / grey relational blend, then adapts its weights from observed
//! shipment outcomes. Drift records are persisted at least once through a
//! durable local queue.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
