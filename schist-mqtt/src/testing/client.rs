/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::client::*;
use crate::config::*;
use crate::decode::{Decoder, DecodingContext};
use crate::encode::encode_packet;
use crate::error::{ErrorKind, MqttResult};
use crate::mqtt::*;
use crate::testing::mock::*;

use assert_matches::assert_matches;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use uuid::Uuid;

type ResultRecord<T> = Rc<RefCell<Vec<Result<T, ErrorKind>>>>;

fn recording_callback<T: 'static>() -> (ResultRecord<T>, Box<dyn FnOnce(MqttResult<T>)>) {
    let record : ResultRecord<T> = Rc::new(RefCell::new(Vec::new()));
    let record_clone = record.clone();

    let callback : Box<dyn FnOnce(MqttResult<T>)> = Box::new(move |result: MqttResult<T>| {
        record_clone.borrow_mut().push(result.map_err(|error| error.kind()));
    });

    (record, callback)
}

fn build_test_config_builder() -> ClientConfigBuilder {
    ClientConfigBuilder::new()
        .with_client_id(&Uuid::new_v4().to_string())
        .with_keep_alive_interval_seconds(0)
}

struct ClientTestFixture {
    client: Client,
    transport_calls: TransportCallLog,
    timers: MockTimerStateRef,
    protocol_version: ProtocolVersion,
    errors: Rc<RefCell<Vec<ErrorKind>>>,
}

impl ClientTestFixture {
    fn new(config: ClientConfig) -> Self {
        let (transport, transport_calls) = MockTransport::new();
        let (timer_service, timers) = MockTimerService::new();
        let protocol_version = config.protocol_version();

        let mut client = Client::new(config, Box::new(transport), Box::new(timer_service));

        let errors = Rc::new(RefCell::new(Vec::new()));
        let errors_clone = errors.clone();
        client.set_on_error(move |_, error| {
            errors_clone.borrow_mut().push(error.kind());
        });

        ClientTestFixture {
            client,
            transport_calls,
            timers,
            protocol_version,
            errors,
        }
    }

    fn deliver(&mut self, packets: &[MqttPacket]) {
        let mut bytes = Vec::new();
        for packet in packets {
            encode_packet(packet, self.protocol_version, &mut bytes).unwrap();
        }

        self.client.handle_network_event(NetworkEvent::IncomingData(&bytes));
    }

    fn sent_packets(&self) -> Vec<MqttPacket> {
        let mut decoder = Decoder::new();
        let mut packets = VecDeque::new();

        for call in self.transport_calls.borrow().iter() {
            if let TransportCall::Send(bytes) = call {
                let mut context = DecodingContext {
                    protocol_version: self.protocol_version,
                    decoded_packets: &mut packets,
                };
                decoder.decode_bytes(bytes, &mut context).unwrap();
            }
        }

        packets.into_iter().collect()
    }

    fn call_count(&self, call: &TransportCall) -> usize {
        self.transport_calls.borrow().iter().filter(|recorded| *recorded == call).count()
    }

    fn clear_transport_calls(&self) {
        self.transport_calls.borrow_mut().clear();
    }

    fn find_timer(&self, delay: Duration, repeating: bool) -> Option<TimerHandle> {
        self.timers.borrow().find(delay, repeating)
    }

    fn fire_timer(&mut self, handle: TimerHandle) {
        {
            let mut timers = self.timers.borrow_mut();
            let repeating = timers.active.get(&handle).map(|timer| timer.repeating);
            if repeating == Some(false) {
                timers.active.remove(&handle);
            }
        }

        self.client.handle_timer_event(handle);
    }

    fn open_connection(&mut self) {
        self.client.connect();
        self.client.handle_network_event(NetworkEvent::ConnectionOpened);
        assert_eq!(SessionState::WaitConnack, self.client.state());
    }

    fn establish(&mut self) {
        self.open_connection();
        self.deliver(&[MqttPacket::Connack(ConnackPacket::default())]);
        assert_eq!(SessionState::Established, self.client.state());
    }
}

#[test]
fn connect_sends_connect_from_config() {
    let config = build_test_config_builder()
        .with_username("user")
        .with_password("secret")
        .build()
        .unwrap();
    let mut fixture = ClientTestFixture::new(config);

    fixture.client.connect();
    assert_eq!(SessionState::Connecting, fixture.client.state());
    assert_eq!(1, fixture.call_count(&TransportCall::Connect));
    assert!(fixture.find_timer(Duration::from_secs(30), false).is_some());
    assert!(fixture.sent_packets().is_empty());

    fixture.client.handle_network_event(NetworkEvent::ConnectionOpened);

    let sent = fixture.sent_packets();
    assert_eq!(1, sent.len());
    if let MqttPacket::Connect(connect) = &sent[0] {
        assert_eq!("MQTT", connect.protocol_name);
        assert_eq!(4, connect.protocol_level);
        assert_eq!(fixture.client.config().client_id(), connect.client_id);
        assert_eq!(Some("user".to_string()), connect.username);
        assert_eq!(Some("secret".as_bytes().to_vec()), connect.password);
        assert!(connect.clean_session);
    } else {
        panic!("expected a connect packet");
    }
}

#[test]
fn first_connack_fires_on_connect_and_cancels_timeout() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());

    let connects = Rc::new(RefCell::new(0));
    let connects_clone = connects.clone();
    fixture.client.set_on_connect(move |_| { *connects_clone.borrow_mut() += 1; });

    fixture.open_connection();
    let connect_timer = fixture.find_timer(Duration::from_secs(30), false).unwrap();

    fixture.deliver(&[MqttPacket::Connack(ConnackPacket::default())]);

    assert_eq!(SessionState::Established, fixture.client.state());
    assert_eq!(1, *connects.borrow());
    assert!(fixture.timers.borrow().cancelled.contains(&connect_timer));
    assert!(fixture.timers.borrow().active.is_empty());
}

#[test]
fn subscribe_before_connack_is_not_connected() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.open_connection();

    let (record, callback) = recording_callback::<Vec<(String, u8)>>();
    fixture.client.subscribe(vec![Subscription::new("a/b", QualityOfService::AtLeastOnce)], Properties::new(), Some(callback));

    assert_eq!(vec![Err(ErrorKind::NotConnected)], *record.borrow());
    assert!(fixture.errors.borrow().is_empty());

    let sent = fixture.sent_packets();
    assert_eq!(1, sent.len());
    assert_matches!(sent[0], MqttPacket::Connect(_));
}

#[test]
fn operations_without_callback_report_to_on_error() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());

    fixture.client.publish("a", vec![1], PublishOptions::default(), Properties::new(), None);
    fixture.client.unsubscribe(vec!["a".to_string()], Properties::new(), None);

    assert_eq!(vec![ErrorKind::NotConnected, ErrorKind::NotConnected], *fixture.errors.borrow());
    assert!(fixture.sent_packets().is_empty());
}

#[test]
fn subscribe_with_invalid_topic_sends_nothing() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let (record, callback) = recording_callback::<Vec<(String, u8)>>();
    let subscriptions = vec![
        Subscription::new("good", QualityOfService::AtMostOnce),
        Subscription::new("", QualityOfService::AtMostOnce),
    ];
    fixture.client.subscribe(subscriptions, Properties::new(), Some(callback));

    assert_eq!(vec![Err(ErrorKind::InvalidTopic)], *record.borrow());
    assert!(fixture.sent_packets().is_empty());

    fixture.client.unsubscribe(Vec::new(), Properties::new(), None);
    assert_eq!(vec![ErrorKind::InvalidTopic], *fixture.errors.borrow());
}

#[test]
fn subscribe_completes_with_granted_codes() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let (record, callback) = recording_callback::<Vec<(String, u8)>>();
    let subscriptions = vec![
        Subscription::new("a", QualityOfService::AtMostOnce),
        Subscription::new("b", QualityOfService::ExactlyOnce),
    ];
    fixture.client.subscribe(subscriptions, Properties::new(), Some(callback));

    let sent = fixture.sent_packets();
    assert_eq!(1, sent.len());
    let packet_id =
        if let MqttPacket::Subscribe(subscribe) = &sent[0] {
            assert_eq!(2, subscribe.subscriptions.len());
            subscribe.packet_id
        } else {
            panic!("expected a subscribe packet");
        };

    assert!(record.borrow().is_empty());

    fixture.deliver(&[MqttPacket::Suback(SubackPacket {
        packet_id,
        reason_codes: vec![0, 0x80],
        ..Default::default()
    })]);

    assert_eq!(vec![Ok(vec![("a".to_string(), 0u8), ("b".to_string(), 0x80u8)])], *record.borrow());
}

#[test]
fn qos0_publish_completes_immediately() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let (record, callback) = recording_callback::<()>();
    fixture.client.publish("a/b", "hello".as_bytes().to_vec(), PublishOptions::default(), Properties::new(), Some(callback));

    assert_eq!(vec![Ok(())], *record.borrow());

    let expected = MqttPacket::Publish(PublishPacket {
        topic: "a/b".to_string(),
        payload: "hello".as_bytes().to_vec(),
        ..Default::default()
    });
    assert_eq!(vec![expected], fixture.sent_packets());
}

#[test]
fn qos1_publish_completes_on_puback() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let (record, callback) = recording_callback::<()>();
    let options = PublishOptionsBuilder::new().with_qos(QualityOfService::AtLeastOnce).with_retain(true).build();
    fixture.client.publish("a/b", vec![1, 2, 3], options, Properties::new(), Some(callback));

    let sent = fixture.sent_packets();
    assert_eq!(1, sent.len());
    let packet_id =
        if let MqttPacket::Publish(publish) = &sent[0] {
            assert!(publish.retain);
            assert_eq!(QualityOfService::AtLeastOnce, publish.qos);
            publish.packet_id
        } else {
            panic!("expected a publish packet");
        };
    assert_ne!(0, packet_id);

    // acks for unknown ids are ignored
    fixture.deliver(&[MqttPacket::Puback(PubackPacket { packet_id: packet_id + 1, ..Default::default() })]);
    assert!(record.borrow().is_empty());

    fixture.deliver(&[MqttPacket::Puback(PubackPacket { packet_id, ..Default::default() })]);
    assert_eq!(vec![Ok(())], *record.borrow());
}

#[test]
fn qos2_publish_flow() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let (record, callback) = recording_callback::<()>();
    let options = PublishOptionsBuilder::new().with_qos(QualityOfService::ExactlyOnce).build();
    fixture.client.publish("a/b", vec![9], options, Properties::new(), Some(callback));

    let packet_id =
        if let MqttPacket::Publish(publish) = &fixture.sent_packets()[0] {
            publish.packet_id
        } else {
            panic!("expected a publish packet");
        };
    fixture.clear_transport_calls();

    fixture.deliver(&[MqttPacket::Pubrec(PubrecPacket { packet_id, ..Default::default() })]);

    let expected_pubrel = MqttPacket::Pubrel(PubrelPacket { packet_id, ..Default::default() });
    assert_eq!(vec![expected_pubrel], fixture.sent_packets());
    assert!(record.borrow().is_empty());

    fixture.deliver(&[MqttPacket::Pubcomp(PubcompPacket { packet_id, ..Default::default() })]);
    fixture.deliver(&[MqttPacket::Pubcomp(PubcompPacket { packet_id, ..Default::default() })]);

    assert_eq!(vec![Ok(())], *record.borrow());
    assert_eq!(1, fixture.sent_packets().len());
}

#[test]
fn publish_invalid_qos_fails() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let (record, callback) = recording_callback::<()>();
    let options = PublishOptionsBuilder::new().with_qos_level(3).build();
    fixture.client.publish("a/b", vec![], options, Properties::new(), Some(callback));

    assert_eq!(vec![Err(ErrorKind::InvalidQos)], *record.borrow());
    assert!(fixture.sent_packets().is_empty());
}

#[test]
fn publish_empty_topic_needs_alias_in_mqtt5() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().with_protocol_level(5).build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    fixture.client.publish("", vec![1], PublishOptions::default(), Properties::new(), None);
    assert_eq!(vec![ErrorKind::InvalidTopic], *fixture.errors.borrow());
    assert!(fixture.sent_packets().is_empty());

    let aliased = Properties::new().with(PropertyKey::TopicAlias, PropertyValue::U16(4));
    fixture.client.publish("", vec![1], PublishOptions::default(), aliased, None);
    assert_eq!(1, fixture.sent_packets().len());
}

#[test]
fn incoming_qos1_publish_delivered_then_acked() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().with_protocol_level(5).build().unwrap());

    let messages = Rc::new(RefCell::new(Vec::new()));
    let messages_clone = messages.clone();
    fixture.client.set_on_message(move |_, topic, payload, properties| {
        messages_clone.borrow_mut().push((topic.to_string(), payload.to_vec(), properties.clone()));
    });

    fixture.establish();
    fixture.clear_transport_calls();

    let properties = Properties::new().with_user_property("origin", "test");
    fixture.deliver(&[MqttPacket::Publish(PublishPacket {
        topic: "in/bound".to_string(),
        packet_id: 12,
        qos: QualityOfService::AtLeastOnce,
        payload: vec![4, 5],
        properties: properties.clone(),
        ..Default::default()
    })]);

    assert_eq!(vec![("in/bound".to_string(), vec![4u8, 5], properties.clone())], *messages.borrow());

    let expected_puback = MqttPacket::Puback(PubackPacket {
        packet_id: 12,
        properties,
        ..Default::default()
    });
    assert_eq!(vec![expected_puback], fixture.sent_packets());
}

#[test]
fn incoming_qos2_publish_handshake() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    fixture.deliver(&[MqttPacket::Publish(PublishPacket {
        topic: "x".to_string(),
        packet_id: 300,
        qos: QualityOfService::ExactlyOnce,
        ..Default::default()
    })]);
    fixture.deliver(&[MqttPacket::Pubrel(PubrelPacket { packet_id: 300, ..Default::default() })]);

    let expected = vec![
        MqttPacket::Pubrec(PubrecPacket { packet_id: 300, ..Default::default() }),
        MqttPacket::Pubcomp(PubcompPacket { packet_id: 300, ..Default::default() }),
    ];
    assert_eq!(expected, fixture.sent_packets());
}

#[test]
fn close_inside_on_message_stops_processing() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());

    let deliveries = Rc::new(RefCell::new(0));
    let deliveries_clone = deliveries.clone();
    fixture.client.set_on_message(move |client, _, _, _| {
        *deliveries_clone.borrow_mut() += 1;
        client.close();
    });

    fixture.establish();
    fixture.clear_transport_calls();

    let publish = PublishPacket {
        topic: "x".to_string(),
        packet_id: 1,
        qos: QualityOfService::AtLeastOnce,
        ..Default::default()
    };
    let mut second = publish.clone();
    second.packet_id = 2;

    fixture.deliver(&[MqttPacket::Publish(publish), MqttPacket::Publish(second)]);

    assert_eq!(1, *deliveries.borrow());
    assert!(fixture.sent_packets().is_empty());
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
    assert_eq!(SessionState::Disconnect, fixture.client.state());

    fixture.client.handle_network_event(NetworkEvent::ConnectionClosed);
    assert_eq!(0, fixture.call_count(&TransportCall::Reconnect(Duration::from_secs(1))));
}

#[test]
fn close_fails_pending_operations() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());

    let closes = Rc::new(RefCell::new(0));
    let closes_clone = closes.clone();
    fixture.client.set_on_close(move |_| { *closes_clone.borrow_mut() += 1; });

    fixture.establish();

    let (publish_record, publish_callback) = recording_callback::<()>();
    let options = PublishOptionsBuilder::new().with_qos(QualityOfService::AtLeastOnce).build();
    fixture.client.publish("a", vec![], options, Properties::new(), Some(publish_callback));

    let (unsubscribe_record, unsubscribe_callback) = recording_callback::<()>();
    fixture.client.unsubscribe(vec!["a".to_string()], Properties::new(), Some(unsubscribe_callback));

    fixture.client.close();
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
    assert!(publish_record.borrow().is_empty());

    fixture.client.handle_network_event(NetworkEvent::ConnectionClosed);

    assert_eq!(vec![Err(ErrorKind::ConnectionClosed)], *publish_record.borrow());
    assert_eq!(vec![Err(ErrorKind::ConnectionClosed)], *unsubscribe_record.borrow());
    assert_eq!(1, *closes.borrow());
    assert_eq!(SessionState::Disconnect, fixture.client.state());
    assert!(!fixture.transport_calls.borrow().iter().any(|call| matches!(call, TransportCall::Reconnect(_))));
}

#[test]
fn disconnect_sends_disconnect_then_closes() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    fixture.client.disconnect(0, Properties::new());

    assert_eq!(vec![MqttPacket::Disconnect(DisconnectPacket::default())], fixture.sent_packets());
    assert_eq!(TransportCall::Destroy, *fixture.transport_calls.borrow().last().unwrap());
}

#[test]
fn unexpected_close_reconnects_and_resubscribes() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());

    let reconnects = Rc::new(RefCell::new(0));
    let reconnects_clone = reconnects.clone();
    fixture.client.set_on_reconnect(move |_| { *reconnects_clone.borrow_mut() += 1; });

    fixture.establish();

    let subscriptions = vec![
        Subscription::new("a", QualityOfService::AtMostOnce),
        Subscription::new("b", QualityOfService::AtLeastOnce),
    ];
    fixture.client.subscribe(subscriptions.clone(), Properties::new(), None);

    let first_id =
        if let MqttPacket::Subscribe(subscribe) = fixture.sent_packets().last().unwrap() {
            subscribe.packet_id
        } else {
            panic!("expected a subscribe packet");
        };

    fixture.client.handle_network_event(NetworkEvent::ConnectionClosed);
    assert_eq!(SessionState::Connecting, fixture.client.state());
    assert_eq!(1, fixture.call_count(&TransportCall::Reconnect(Duration::from_secs(1))));
    assert!(fixture.find_timer(Duration::from_secs(31), false).is_some());

    fixture.clear_transport_calls();
    fixture.client.handle_network_event(NetworkEvent::ConnectionOpened);
    fixture.deliver(&[MqttPacket::Connack(ConnackPacket::default())]);

    let sent = fixture.sent_packets();
    assert_eq!(2, sent.len());
    assert_matches!(sent[0], MqttPacket::Connect(_));
    if let MqttPacket::Subscribe(subscribe) = &sent[1] {
        assert_eq!(subscriptions, subscribe.subscriptions);
        assert_ne!(first_id, subscribe.packet_id);
    } else {
        panic!("expected a subscribe packet");
    }

    assert_eq!(1, *reconnects.borrow());
}

#[test]
fn unsubscribed_topics_are_not_resubscribed() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();

    fixture.client.subscribe(vec![Subscription::new("a", QualityOfService::AtMostOnce)], Properties::new(), None);
    fixture.client.unsubscribe(vec!["a".to_string()], Properties::new(), None);

    fixture.client.handle_network_event(NetworkEvent::ConnectionClosed);
    fixture.clear_transport_calls();
    fixture.client.handle_network_event(NetworkEvent::ConnectionOpened);
    fixture.deliver(&[MqttPacket::Connack(ConnackPacket::default())]);

    let sent = fixture.sent_packets();
    assert_eq!(1, sent.len());
    assert_matches!(sent[0], MqttPacket::Connect(_));
}

#[test]
fn keep_alive_without_pingresp_destroys_transport() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().with_keep_alive_interval_seconds(1).build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let ping_timer = fixture.find_timer(Duration::from_secs(1), true).unwrap();

    fixture.fire_timer(ping_timer);
    assert_eq!(vec![MqttPacket::Pingreq(PingreqPacket {})], fixture.sent_packets());
    assert_eq!(0, fixture.call_count(&TransportCall::Destroy));

    fixture.fire_timer(ping_timer);
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
    assert_eq!(1, fixture.sent_packets().len());
}

#[test]
fn keep_alive_with_pingresp_keeps_pinging() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().with_keep_alive_interval_seconds(1).build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let ping_timer = fixture.find_timer(Duration::from_secs(1), true).unwrap();

    for _ in 0..3 {
        fixture.fire_timer(ping_timer);
        fixture.deliver(&[MqttPacket::Pingresp(PingrespPacket {})]);
    }

    assert_eq!(3, fixture.sent_packets().len());
    assert_eq!(0, fixture.call_count(&TransportCall::Destroy));

    fixture.client.handle_network_event(NetworkEvent::ConnectionClosed);
    assert!(fixture.timers.borrow().cancelled.contains(&ping_timer));
}

#[test]
fn connack_refusal_reports_and_destroys() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.open_connection();

    fixture.deliver(&[MqttPacket::Connack(ConnackPacket { reason_code: 5, ..Default::default() })]);

    assert_eq!(vec![ErrorKind::ProtocolRefused], *fixture.errors.borrow());
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
    assert_ne!(SessionState::Established, fixture.client.state());
}

#[test]
fn reconnect_from_on_connect_keeps_new_timeout() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().with_connect_timeout_seconds(5).build().unwrap());
    fixture.client.set_on_connect(|client| { client.reconnect(Duration::from_secs(2)); });

    fixture.open_connection();
    let first_timer = fixture.find_timer(Duration::from_secs(5), false).unwrap();

    fixture.deliver(&[MqttPacket::Connack(ConnackPacket::default())]);

    assert_eq!(SessionState::Connecting, fixture.client.state());
    assert!(fixture.timers.borrow().cancelled.contains(&first_timer));
    assert_eq!(1, fixture.call_count(&TransportCall::Reconnect(Duration::from_secs(2))));

    let retry_timer = fixture.find_timer(Duration::from_secs(7), false).unwrap();
    fixture.fire_timer(retry_timer);

    assert_eq!(vec![ErrorKind::ConnectionTimeout], *fixture.errors.borrow());
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
}

#[test]
fn connect_timeout_reports_and_destroys() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().with_connect_timeout_seconds(5).build().unwrap());
    fixture.open_connection();

    let connect_timer = fixture.find_timer(Duration::from_secs(5), false).unwrap();
    fixture.fire_timer(connect_timer);

    assert_eq!(vec![ErrorKind::ConnectionTimeout], *fixture.errors.borrow());
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));

    // a second firing of the same handle is stale
    fixture.client.handle_timer_event(connect_timer);
    assert_eq!(1, fixture.errors.borrow().len());
}

#[test]
fn transport_errors_are_mapped() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.client.connect();

    fixture.client.handle_network_event(NetworkEvent::ConnectionError(1));
    assert_eq!(vec![ErrorKind::ConnectionFailed], *fixture.errors.borrow());
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
    assert_eq!(SessionState::Disconnect, fixture.client.state());

    fixture.client.handle_network_event(NetworkEvent::ConnectionError(104));
    assert_eq!(2, fixture.call_count(&TransportCall::Destroy));

    fixture.client.handle_network_event(NetworkEvent::BufferFull);

    assert_eq!(vec![ErrorKind::ConnectionFailed, ErrorKind::ConnectionClosed, ErrorKind::SendBufferFull], *fixture.errors.borrow());
    assert_eq!(3, fixture.call_count(&TransportCall::Destroy));
}

#[test]
fn transport_error_while_established_closes_connection() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().with_keep_alive_interval_seconds(10).build().unwrap());
    fixture.establish();

    let (record, callback) = recording_callback::<()>();
    fixture.client.publish("a/b", vec![1], PublishOptionsBuilder::new().with_qos(QualityOfService::AtLeastOnce).build(), Properties::new(), Some(callback));

    fixture.client.handle_network_event(NetworkEvent::ConnectionError(1));

    assert_eq!(SessionState::Disconnect, fixture.client.state());
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
    assert!(record.borrow().is_empty());

    fixture.client.handle_network_event(NetworkEvent::ConnectionClosed);

    assert_eq!(vec![Err(ErrorKind::ConnectionClosed)], *record.borrow());
    assert_eq!(1, fixture.call_count(&TransportCall::Reconnect(Duration::from_secs(1))));
    assert!(fixture.find_timer(Duration::from_secs(10), true).is_none());
}

#[test]
fn malformed_input_reports_and_destroys() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();

    // connack carrying a reserved flag bit
    fixture.client.handle_network_event(NetworkEvent::IncomingData(&[0x21, 0x02, 0x00, 0x00]));

    assert_eq!(vec![ErrorKind::MalformedPacket], *fixture.errors.borrow());
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
}

#[test]
fn data_after_decode_failure_is_dropped() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.open_connection();

    // connack carrying a reserved flag bit
    fixture.client.handle_network_event(NetworkEvent::IncomingData(&[0x21, 0x02, 0x00, 0x00]));
    assert_eq!(vec![ErrorKind::MalformedPacket], *fixture.errors.borrow());
    assert_eq!(SessionState::Disconnect, fixture.client.state());

    fixture.deliver(&[MqttPacket::Pingresp(PingrespPacket {})]);

    assert_eq!(vec![ErrorKind::MalformedPacket], *fixture.errors.borrow());
    assert_eq!(1, fixture.call_count(&TransportCall::Destroy));
}

#[test]
fn auth_under_mqtt311_is_encoding_failure() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    fixture.client.auth(0x18, Properties::new());

    assert_eq!(vec![ErrorKind::EncodingFailure], *fixture.errors.borrow());
    assert!(fixture.sent_packets().is_empty());
}

#[test]
fn auth_under_mqtt5_is_sent() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().with_protocol_level(5).build().unwrap());
    fixture.establish();
    fixture.clear_transport_calls();

    let properties = Properties::new().with(PropertyKey::AuthenticationMethod, PropertyValue::String("SCRAM".to_string()));
    fixture.client.auth(0x18, properties.clone());

    assert_eq!(vec![MqttPacket::Auth(AuthPacket { reason_code: 0x18, properties })], fixture.sent_packets());
}

#[test]
fn connection_opened_after_close_closes_again() {
    let mut fixture = ClientTestFixture::new(build_test_config_builder().build().unwrap());
    fixture.client.connect();
    fixture.client.close();

    fixture.client.handle_network_event(NetworkEvent::ConnectionOpened);

    assert!(fixture.sent_packets().is_empty());
    assert_eq!(2, fixture.call_count(&TransportCall::Destroy));
}
