//! pulsebridge library.
//!
//! Bridges timed intensity commands from a polled mailbox onto a device
//! behind a device-control server. Exposes the core (pulse store, mixer,
//! session controller, discovery loop) and its adapters for integration
//! testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channels;
pub mod config;
pub mod discovery;
pub mod error;
pub mod mixer;
pub mod pulses;
pub mod session;
