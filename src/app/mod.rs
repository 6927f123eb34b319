//! Application core types: commands, events and the port boundary.
//!
//! The mixer, session controller and discovery loop are built on these.
//! All interaction with the device server and the mailbox happens through
//! **port traits** defined in [`ports`], keeping the core testable without
//! a real device or addon.

pub mod commands;
pub mod events;
pub mod ports;
