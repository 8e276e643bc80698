//! Viewport synchronization between application state and the live map.

pub mod controller;

pub use controller::{InitOutcome, ViewportEvent, ViewportSyncController};
