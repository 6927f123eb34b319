//! Session controller against the mock link and mailbox.
//!
//! Each test runs a session on the current thread and drives it from a
//! second future joined alongside it, the way the discovery loop and the
//! device server would.

use futures_lite::future::{block_on, zip};

use pulsebridge::app::events::BridgeEvent;
use pulsebridge::app::ports::DeviceHandle;
use pulsebridge::channels::{DeviceEventHub, LinkEvent};
use pulsebridge::session::{EndReason, Session, SessionPhase};

use crate::mock_link::{LinkCall, MockLink, RecordingSink, ScriptedMailbox, fast_config, sleep_ms};

fn toy() -> DeviceHandle {
    DeviceHandle::new(1, "toy")
}

#[test]
fn first_tick_sends_zero_then_the_pulse_level() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    let (reason, ()) = block_on(zip(session.run(), async {
        sleep_ms(30).await;
        mailbox.write("#VIBE|0.5|\"5000\"");
        sleep_ms(60).await;
        session.shutdown();
    }));

    assert_eq!(reason, EndReason::Shutdown);
    let sends = link.sends();
    assert_eq!(sends.first().copied(), Some(0.0), "baseline goes out first");
    assert!(sends.contains(&0.5), "pulse level reached the device: {sends:?}");
    assert!(sink.contains(&BridgeEvent::PulseApplied {
        amount: 0.5,
        duration: std::time::Duration::from_millis(5000),
    }));
    assert_eq!(mailbox.content(), "", "processed payload is cleared");
}

#[test]
fn stop_mid_pulse_resends_zero_once() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    block_on(zip(session.run(), async {
        sleep_ms(30).await;
        mailbox.write("VIBE|0.6|5000");
        sleep_ms(60).await;
        mailbox.write("STOP");
        sleep_ms(60).await;
        session.shutdown();
    }));

    assert_eq!(link.sends(), vec![0.0, 0.6, 0.0]);
    // One from STOP, one from teardown.
    assert_eq!(link.count(&LinkCall::StopAll), 2);
    assert!(sink.contains(&BridgeEvent::PulsesCleared));
}

#[test]
fn removal_of_another_device_is_ignored() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    let (reason, ()) = block_on(zip(session.run(), async {
        sleep_ms(20).await;
        hub.publish(LinkEvent::DeviceRemoved(DeviceHandle::new(7, "other")));
        sleep_ms(30).await;
        assert!(!session.state().cancellation().is_cancelled());
        assert_eq!(session.phase(), SessionPhase::Bound);

        // Same index, different display name: still the bound device.
        hub.publish(LinkEvent::DeviceRemoved(DeviceHandle::new(1, "renamed")));
    }));

    assert_eq!(reason, EndReason::DeviceRemoved);
    assert_eq!(session.phase(), SessionPhase::Terminal);
    assert_eq!(
        sink.count(|e| matches!(e, BridgeEvent::DeviceRemoved(_))),
        1
    );
}

#[test]
fn send_failure_ends_the_session_with_stop_all() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    link.fail_sends(true);
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    let reason = block_on(session.run());

    assert_eq!(reason, EndReason::SendFailed);
    assert_eq!(link.sends().len(), 1, "no retry after a failed send");
    assert_eq!(link.last_call(), Some(LinkCall::StopAll));
    assert_eq!(
        sink.count(|e| matches!(e, BridgeEvent::SendFailed(_))),
        1
    );
    assert!(sink.contains(&BridgeEvent::SessionEnded(EndReason::SendFailed)));
}

#[test]
fn server_loss_ends_the_session() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    let (reason, ()) = block_on(zip(session.run(), async {
        sleep_ms(20).await;
        hub.publish(LinkEvent::ServerDisconnected);
    }));

    assert_eq!(reason, EndReason::ServerLost);
    assert_eq!(link.last_call(), Some(LinkCall::StopAll));
}

#[test]
fn removal_buried_under_an_event_burst_still_ends_the_session() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    let (reason, ()) = block_on(zip(session.run(), async {
        sleep_ms(20).await;
        // No await in between: the removal is overwritten before the
        // session gets to read it.
        link.remove_device(&toy());
        for i in 0..8 {
            hub.publish(LinkEvent::DeviceAdded(DeviceHandle::new(10 + i, "other")));
        }
        sleep_ms(200).await;
        session.shutdown();
    }));

    assert_eq!(reason, EndReason::DeviceRemoved);
    assert!(sink.contains(&BridgeEvent::DeviceRemoved(toy())));
    assert!(sink.contains(&BridgeEvent::SessionEnded(EndReason::DeviceRemoved)));
}

#[test]
fn event_burst_keeps_a_present_device_bound() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    let (reason, ()) = block_on(zip(session.run(), async {
        sleep_ms(20).await;
        for i in 0..9 {
            hub.publish(LinkEvent::DeviceAdded(DeviceHandle::new(10 + i, "other")));
        }
        sleep_ms(50).await;
        assert_eq!(session.phase(), SessionPhase::Bound);
        session.shutdown();
    }));

    assert_eq!(reason, EndReason::Shutdown);
}

#[test]
fn server_already_lost_ends_immediately() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let subscription = hub.subscribe().unwrap();
    hub.publish(LinkEvent::ServerDisconnected);

    let session = Session::new(&link, &mailbox, &sink, toy(), subscription, &config);
    assert_eq!(block_on(session.run()), EndReason::ServerLost);
}

#[test]
fn shutdown_is_idempotent_and_stop_all_comes_last() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::new();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    let (reason, ()) = block_on(zip(session.run(), async {
        sleep_ms(20).await;
        mailbox.write("VIBE|0.3|5000");
        sleep_ms(30).await;
        assert!(session.shutdown());
        assert!(!session.shutdown());
    }));

    assert_eq!(reason, EndReason::Shutdown);
    assert_eq!(session.phase(), SessionPhase::Terminal);
    assert!(session.store().is_empty(), "pulses die with the session");

    let calls = link.calls.borrow();
    let last_send = calls
        .iter()
        .rposition(|c| matches!(c, LinkCall::Send { .. }))
        .unwrap();
    let last_stop = calls.iter().rposition(|c| *c == LinkCall::StopAll).unwrap();
    assert!(last_send < last_stop, "no send after teardown: {calls:?}");
    assert_eq!(calls.last(), Some(&LinkCall::StopAll));
}

#[test]
fn missing_mailbox_ends_with_commands_stopped() {
    let hub = DeviceEventHub::new();
    let link = MockLink::new(&hub).with_device(toy());
    let mailbox = ScriptedMailbox::missing();
    let sink = RecordingSink::new();
    let config = fast_config();
    let session = Session::new(&link, &mailbox, &sink, toy(), hub.subscribe().unwrap(), &config);

    assert_eq!(block_on(session.run()), EndReason::CommandsStopped);
    assert_eq!(
        sink.count(|e| matches!(e, BridgeEvent::MailboxUnavailable(_))),
        1
    );
    assert!(!sink.contains(&BridgeEvent::MailboxReady));
}
