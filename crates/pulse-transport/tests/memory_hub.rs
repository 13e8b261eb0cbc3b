//! Integration tests for the in-memory transport, with peers owned by
//! separate Tokio tasks.

use std::time::Duration;

use pulse_protocol::{DeliveryMode, PacketData};
use pulse_transport::{
    EventReceiver, EventSender, MemoryHub, SessionDescriptor, Transport,
    TransportEvent,
};

fn descriptor() -> SessionDescriptor {
    SessionDescriptor::new("127.0.0.1", 7000, "token")
}

async fn next_event(rx: &mut EventReceiver) -> TransportEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
        .event
}

#[tokio::test]
async fn test_packet_sent_from_another_task_is_received() {
    let hub = MemoryHub::new();
    let mut receiver = hub.transport();
    let (events, mut rx) = EventSender::channel(1);
    receiver.configure(&descriptor(), events).unwrap();
    receiver.connect().unwrap();
    assert_eq!(next_event(&mut rx).await, TransportEvent::ReadyChanged(true));

    let mut sender = hub.transport();
    let sender_id = sender.peer_id();
    let task = tokio::spawn(async move {
        let (events, _rx) = EventSender::channel(1);
        sender.configure(&descriptor(), events).unwrap();
        sender.connect().unwrap();
        let mut data = PacketData::new();
        data.set_int(1, 1);
        sender
            .send_data(12, DeliveryMode::Unreliable, data)
            .unwrap();
    });

    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::PeerConnected(sender_id)
    );
    let TransportEvent::PacketReceived(packet) = next_event(&mut rx).await
    else {
        panic!("expected a packet");
    };
    assert_eq!(packet.op_code, 12);
    assert_eq!(packet.sender, sender_id);
    assert_eq!(packet.data.get_int(1), Some(1));

    // The sending transport is dropped with the task, leaving the hub.
    task.await.unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        TransportEvent::PeerDisconnected(sender_id)
    );
    assert_eq!(hub.peer_count(), 1);
}

#[tokio::test]
async fn test_events_arrive_in_send_order() {
    let hub = MemoryHub::new();
    let mut a = hub.transport();
    let mut b = hub.transport();
    let (a_events, _a_rx) = EventSender::channel(1);
    let (b_events, mut b_rx) = EventSender::channel(1);
    a.configure(&descriptor(), a_events).unwrap();
    b.configure(&descriptor(), b_events).unwrap();
    a.connect().unwrap();
    b.connect().unwrap();

    for op_code in 1..=10 {
        a.send_data(op_code, DeliveryMode::Reliable, PacketData::new())
            .unwrap();
    }

    // Skip PeerConnected(a) and ReadyChanged(true).
    next_event(&mut b_rx).await;
    next_event(&mut b_rx).await;
    let mut received = Vec::new();
    for _ in 0..10 {
        if let TransportEvent::PacketReceived(packet) =
            next_event(&mut b_rx).await
        {
            received.push(packet.op_code);
        }
    }
    assert_eq!(received, (1..=10).collect::<Vec<_>>());
}
