//! Lifecycle coverage for the session registry and the session driver.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use streammux::decoder::DecoderLimits;
use streammux::frame::{FrameEncoder, FrameHeader};
use streammux::message::{Message, MessageKind};
use streammux::session::{Session, SessionHandle, SessionRegistry};

fn open_session(registry: &Arc<SessionRegistry>) -> (Session, mpsc::UnboundedReceiver<Bytes>) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let session = Session::open(Arc::clone(registry), SessionHandle::new(outbound_tx));
    (session, outbound_rx)
}

#[test]
fn connect_event_arrives_before_any_data() {
    let registry = Arc::new(SessionRegistry::new());
    assert!(registry.recv().is_none());

    let (mut session, _outbound) = open_session(&registry);
    let id = session.id();
    assert!(registry.contains(id));

    let mut encoder = FrameEncoder::new();
    let header = FrameHeader::new(1, 2, 3, 0);
    let frame = encoder.encode(&header, b"first").unwrap();
    session.receive(&frame).unwrap();

    let connect = registry.recv().unwrap();
    assert_eq!(connect.id(), id);
    assert_eq!(connect.kind(), &MessageKind::Connect);

    let data = registry.recv().unwrap();
    assert_eq!(data.id(), id);
    assert_eq!(data.header(), Some(&header));
    assert_eq!(data.into_body().unwrap().as_ref(), b"first");

    assert!(registry.recv().is_none());
}

#[test]
fn close_emits_disconnect_and_deregisters() {
    let registry = Arc::new(SessionRegistry::new());
    let (session, _outbound) = open_session(&registry);
    let id = session.id();

    session.close();

    let connect = registry.recv().unwrap();
    assert_eq!(connect.kind(), &MessageKind::Connect);
    let disconnect = registry.recv().unwrap();
    assert_eq!(disconnect.id(), id);
    assert_eq!(disconnect.kind(), &MessageKind::Disconnect);

    assert!(!registry.contains(id));
    assert!(registry.is_empty());
}

#[test]
fn send_forwards_the_body_to_the_outbound_channel() {
    let registry = Arc::new(SessionRegistry::new());
    let (session, mut outbound) = open_session(&registry);
    let id = session.id();

    let header = FrameHeader::new(4, 5, 6, 1);
    let frame = Bytes::from_static(b"encoded frame bytes");
    assert!(registry.send(Message::frame(id, header, frame.clone())));
    assert_eq!(outbound.try_recv().unwrap(), frame);
}

#[test]
fn send_after_disconnect_is_dropped() {
    let registry = Arc::new(SessionRegistry::new());
    let (session, _outbound) = open_session(&registry);
    let id = session.id();
    session.close();

    let header = FrameHeader::new(1, 1, 1, 0);
    let message = Message::frame(id, header, Bytes::from_static(b"late"));
    assert!(!registry.send(message));
}

#[test]
fn lifecycle_messages_cannot_be_sent() {
    let registry = Arc::new(SessionRegistry::new());
    let (session, mut outbound) = open_session(&registry);

    assert!(!registry.send(Message::connect(session.id())));
    assert!(outbound.try_recv().is_err());
}

#[test]
fn sessions_receive_distinct_identities() {
    let registry = Arc::new(SessionRegistry::new());
    let (first, _a) = open_session(&registry);
    let (second, _b) = open_session(&registry);
    assert_ne!(first.id(), second.id());
    assert_eq!(registry.len(), 2);
}

#[test]
fn decode_failure_leaves_other_sessions_untouched() {
    let registry = Arc::new(SessionRegistry::new());
    let limits = DecoderLimits {
        max_body_size: 8,
        ..DecoderLimits::default()
    };
    let (outbound_tx, _outbound) = mpsc::unbounded_channel();
    let mut faulty = Session::open_with_limits(
        Arc::clone(&registry),
        SessionHandle::new(outbound_tx),
        limits,
    );
    let faulty_id = faulty.id();
    let (healthy, _outbound2) = open_session(&registry);

    // Declares a 9-byte body against an 8-byte maximum.
    let mut data = vec![
        0x00, 0x09, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x03, 0x01,
    ];
    data.extend_from_slice(&[0u8; 9]);
    assert!(faulty.receive(&data).is_err());
    faulty.close();

    assert!(!registry.contains(faulty_id));
    assert!(registry.contains(healthy.id()));
}

#[test]
fn frames_from_one_connection_keep_arrival_order() {
    let registry = Arc::new(SessionRegistry::new());
    let (mut session, _outbound) = open_session(&registry);

    let mut encoder = FrameEncoder::new();
    let mut stream = Vec::new();
    for seq in 0..3i16 {
        let header = FrameHeader::new(1, 100, seq, 0);
        stream.extend_from_slice(&encoder.encode(&header, b"x").unwrap());
    }
    session.receive(&stream).unwrap();

    // Skip the connect event, then check per-frame sequence order.
    let _connect = registry.recv().unwrap();
    for seq in 0..3i16 {
        let message = registry.recv().unwrap();
        assert_eq!(message.header().unwrap().msg_seq, seq);
    }
}
