//! Telemetry shipper for entity-extraction events.
//!
//! Worker tasks build structured [`event::Event`] records and deliver them
//! through [`shipper::EventShipper`] to a CloudWatch-style log stream. The
//! shipper maintains the per-stream upload sequence token the backend
//! requires for ordered writes, retrying (bounded) when the token goes stale
//! and failing fast on every other transport error.

pub mod config;
pub mod event;
pub mod shipper;
pub mod trace;
pub mod transport;
