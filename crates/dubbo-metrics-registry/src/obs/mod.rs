//! In-process metrics backend.
//!
//! Implements the backend seam with atomics and `DashMap`, no external
//! exporter. Used for headless runs, tests, and the demo binary.

pub mod memory;

pub use memory::InMemoryMeterProvider;
