//! Fuzz target: `commands::decode`
//!
//! Feeds arbitrary mailbox contents (lossily decoded as UTF-8, the way the
//! file mailbox reads them) into the command decoder and checks that it
//! never panics and never yields an out-of-range pulse.
//!
//! cargo fuzz run fuzz_command_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsebridge::app::commands::{Command, decode};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);

    match decode(&raw) {
        Some(Command::Vibe { amount, .. }) => {
            assert!((0.0..=1.0).contains(&amount), "amount out of range");
        }
        Some(Command::Unknown(payload)) => {
            assert!(!payload.is_empty(), "unknown command without payload");
        }
        Some(_) => {}
        None => assert!(raw.trim().is_empty(), "non-blank input decoded to nothing"),
    }
});
