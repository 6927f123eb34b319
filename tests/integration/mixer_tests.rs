//! Mixer ticks driven with explicit instants.

use std::time::{Duration, Instant};

use futures_lite::future::block_on;

use pulsebridge::app::ports::DeviceHandle;
use pulsebridge::channels::DeviceEventHub;
use pulsebridge::error::LinkError;
use pulsebridge::mixer::{Mixer, MixerSettings};
use pulsebridge::pulses::{Pulse, PulseStore};
use pulsebridge::session::{EndReason, SessionState};

use crate::mock_link::MockLink;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn settings(max_intensity: f64) -> MixerSettings {
    MixerSettings {
        interval: ms(5),
        max_intensity,
        epsilon: 0.01,
    }
}

#[test]
fn overlapping_pulses_decay_in_steps() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub);
    let store = PulseStore::new();
    let state = SessionState::new(DeviceHandle::new(0, "toy"));
    let mixer = Mixer::new(&link, &store, &state, settings(1.0));
    let t0 = Instant::now();

    store.add(Pulse::starting_at(t0, 0.3, ms(2000)));
    assert_eq!(block_on(mixer.tick(t0)), Ok(Some(0.3)));

    store.add(Pulse::starting_at(t0 + ms(100), 0.4, ms(100)));
    let stacked = block_on(mixer.tick(t0 + ms(100))).unwrap().unwrap();
    assert!((stacked - 0.7).abs() < 1e-9);

    assert_eq!(block_on(mixer.tick(t0 + ms(150))), Ok(None), "unchanged, debounced");
    let decayed = block_on(mixer.tick(t0 + ms(200))).unwrap().unwrap();
    assert!((decayed - 0.3).abs() < 1e-9);
    assert_eq!(block_on(mixer.tick(t0 + ms(2000))), Ok(Some(0.0)));

    assert_eq!(link.sends().len(), 4);
}

#[test]
fn stacking_clamps_at_max() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub);
    let store = PulseStore::new();
    let state = SessionState::new(DeviceHandle::new(0, "toy"));
    let mixer = Mixer::new(&link, &store, &state, settings(0.6));
    let t0 = Instant::now();

    for _ in 0..3 {
        store.add(Pulse::starting_at(t0, 0.5, ms(500)));
    }
    assert_eq!(block_on(mixer.tick(t0)), Ok(Some(0.6)));
    store.add(Pulse::starting_at(t0, 0.5, ms(500)));
    assert_eq!(block_on(mixer.tick(t0 + ms(1))), Ok(None));

    // All four expire together; output falls straight back to zero.
    assert_eq!(block_on(mixer.tick(t0 + ms(500))), Ok(Some(0.0)));
    assert_eq!(link.sends(), vec![0.6, 0.0]);
}

#[test]
fn small_moves_are_debounced_but_first_send_is_forced() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub);
    let store = PulseStore::new();
    let state = SessionState::new(DeviceHandle::new(0, "toy"));
    let mixer = Mixer::new(&link, &store, &state, settings(1.0));
    let t0 = Instant::now();

    assert_eq!(block_on(mixer.tick(t0)), Ok(Some(0.0)), "baseline");
    store.add(Pulse::starting_at(t0, 0.005, ms(500)));
    assert_eq!(block_on(mixer.tick(t0)), Ok(None));

    state.reset_last_sent();
    let forced = block_on(mixer.tick(t0)).unwrap().unwrap();
    assert!((forced - 0.005).abs() < 1e-9);
}

#[test]
fn no_send_once_cancelled() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub);
    let store = PulseStore::new();
    let state = SessionState::new(DeviceHandle::new(0, "toy"));
    let mixer = Mixer::new(&link, &store, &state, settings(1.0));

    state.cancellation().cancel(EndReason::Shutdown);
    store.add(Pulse::starting_at(Instant::now(), 0.8, ms(500)));
    assert_eq!(block_on(mixer.tick(Instant::now())), Ok(None));
    block_on(mixer.run()).unwrap();
    assert!(link.sends().is_empty());
}

#[test]
fn send_failure_cancels_the_session() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub);
    link.fail_sends(true);
    let store = PulseStore::new();
    let state = SessionState::new(DeviceHandle::new(0, "toy"));
    let mixer = Mixer::new(&link, &store, &state, settings(1.0));

    assert!(matches!(block_on(mixer.run()), Err(LinkError::SendFailed(_))));
    assert_eq!(state.cancellation().reason(), Some(EndReason::SendFailed));
    assert_eq!(state.last_sent(), None, "failed sends are not recorded");
}
