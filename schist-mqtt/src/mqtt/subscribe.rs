/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::decode::utils::*;
use crate::encode::utils::*;
use crate::error::{MqttError, MqttResult};
use crate::logging::*;
use crate::mqtt::*;
use crate::mqtt::properties::*;
use crate::mqtt::utils::*;

use log::*;
use std::fmt;

fn encode_subscribe_packet(packet: &SubscribePacket, version: ProtocolVersion, dest: &mut Vec<u8>) -> MqttResult<()> {
    if packet.subscriptions.is_empty() {
        error!("SubscribePacket Encode - no subscriptions");
        return Err(MqttError::new_encoding_failure("subscribe packet must contain at least one subscription"));
    }

    let mut body = Vec::new();
    encode_u16(packet.packet_id, &mut body);

    if version == ProtocolVersion::Mqtt5 {
        encode_properties(&packet.properties, PropertyContext::Subscribe, &mut body)?;
    }

    for subscription in &packet.subscriptions {
        encode_length_prefixed_string(&subscription.topic_filter, &mut body)?;
        if version == ProtocolVersion::Mqtt5 {
            encode_u8(subscription.options_byte(), &mut body);
        } else {
            encode_u8(subscription.qos as u8, &mut body);
        }
    }

    encode_fixed_header_and_body(SUBSCRIBE_FIRST_BYTE, &body, dest)
}

pub(crate) fn encode_subscribe_packet5(packet: &SubscribePacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_subscribe_packet(packet, ProtocolVersion::Mqtt5, dest)
}

pub(crate) fn encode_subscribe_packet311(packet: &SubscribePacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_subscribe_packet(packet, ProtocolVersion::Mqtt311, dest)
}

fn decode_subscription_options5(options: u8, subscription: &mut Subscription) -> MqttResult<()> {
    if (options & 0xC0) != 0 {
        error!("SubscribePacket Decode - reserved subscription option bits set");
        return Err(MqttError::new_malformed_packet("subscription options reserved bits set"));
    }

    subscription.qos = QualityOfService::try_from(options & SUBSCRIPTION_OPTIONS_QOS_MASK).map_err(|_| {
        error!("SubscribePacket Decode - invalid subscription qos");
        MqttError::new_malformed_packet("invalid subscription qos")
    })?;
    subscription.no_local = (options & SUBSCRIPTION_OPTIONS_NO_LOCAL_MASK) != 0;
    subscription.retain_as_published = (options & SUBSCRIPTION_OPTIONS_RETAIN_AS_PUBLISHED_MASK) != 0;
    subscription.retain_handling_type = convert_u8_to_retain_handling_type((options >> SUBSCRIPTION_OPTIONS_RETAIN_HANDLING_SHIFT) & 0x03)?;

    Ok(())
}

fn decode_subscription_qos311(qos: u8, subscription: &mut Subscription) -> MqttResult<()> {
    subscription.qos = QualityOfService::try_from(qos).map_err(|_| {
        error!("SubscribePacket Decode - invalid requested qos byte {}", qos);
        MqttError::new_malformed_packet("invalid subscription qos")
    })?;

    Ok(())
}

fn decode_subscribe_packet(first_byte: u8, packet_body: &[u8], version: ProtocolVersion) -> MqttResult<MqttPacket> {
    if first_byte != SUBSCRIBE_FIRST_BYTE {
        error!("SubscribePacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid subscribe first byte"));
    }

    let mut packet = SubscribePacket { ..Default::default() };
    let mut mutable_body = decode_u16(packet_body, &mut packet.packet_id)?;

    if version == ProtocolVersion::Mqtt5 {
        mutable_body = decode_properties(mutable_body, PropertyContext::Subscribe, &mut packet.properties)?;
    }

    while !mutable_body.is_empty() {
        let mut subscription = Subscription { ..Default::default() };
        mutable_body = decode_length_prefixed_string(mutable_body, &mut subscription.topic_filter)?;

        let mut options : u8 = 0;
        mutable_body = decode_u8(mutable_body, &mut options)?;
        if version == ProtocolVersion::Mqtt5 {
            decode_subscription_options5(options, &mut subscription)?;
        } else {
            decode_subscription_qos311(options, &mut subscription)?;
        }

        packet.subscriptions.push(subscription);
    }

    if packet.subscriptions.is_empty() {
        error!("SubscribePacket Decode - no subscriptions");
        return Err(MqttError::new_malformed_packet("subscribe packet contains no subscriptions"));
    }

    Ok(MqttPacket::Subscribe(packet))
}

pub(crate) fn decode_subscribe_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_subscribe_packet(first_byte, packet_body, ProtocolVersion::Mqtt5)
}

pub(crate) fn decode_subscribe_packet311(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_subscribe_packet(first_byte, packet_body, ProtocolVersion::Mqtt311)
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        log_string!(self.topic_filter, f, "topic_filter");
        log_enum!(self.qos, f, "qos", QualityOfService);
        log_primitive_value!(self.no_local, f, "no_local");
        log_primitive_value!(self.retain_as_published, f, "retain_as_published");
        log_enum!(self.retain_handling_type, f, "retain_handling_type", RetainHandlingType);
        write!(f, " }}")
    }
}

impl fmt::Display for SubscribePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscribePacket {{")?;
        log_primitive_value!(self.packet_id, f, "packet_id");
        log_properties!(self.properties, f, "properties");
        write!(f, " subscriptions: [")?;
        for (i, subscription) in self.subscriptions.iter().enumerate() {
            write!(f, " {}:{}", i, subscription)?;
        }
        write!(f, " ] }}")
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::decode::testing::*;
    use assert_matches::assert_matches;

    fn create_subscribe_packet(packet_id: u16) -> SubscribePacket {
        SubscribePacket {
            packet_id,
            subscriptions: vec![
                Subscription::new("hello/world", QualityOfService::AtLeastOnce),
                Subscription::builder("a/b/#", QualityOfService::ExactlyOnce)
                    .with_no_local(true)
                    .with_retain_as_published(true)
                    .with_retain_handling_type(RetainHandlingType::DontSend)
                    .build(),
                Subscription::builder("+/status", QualityOfService::AtMostOnce)
                    .with_retain_handling_type(RetainHandlingType::SendOnSubscribeIfNew)
                    .build(),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn subscribe_round_trip_encode_decode_basic_311() {
        let packet = SubscribePacket {
            packet_id: 123,
            subscriptions: vec![
                Subscription::new("hello/world", QualityOfService::AtLeastOnce),
                Subscription::new("foo/#", QualityOfService::ExactlyOnce),
            ],
            ..Default::default()
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Subscribe(packet), ProtocolVersion::Mqtt311));
    }

    #[test]
    fn subscribe_round_trip_encode_decode_options5() {
        let mut packet = create_subscribe_packet(1023);
        packet.properties = Properties::new()
            .with(PropertyKey::SubscriptionIdentifier, PropertyValue::VarInt(1000))
            .with_user_property("Worms", "inside");

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Subscribe(packet), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn subscribe_encode_layout311() {
        let packet = SubscribePacket {
            packet_id: 10,
            subscriptions: vec![ Subscription::new("a/b", QualityOfService::AtLeastOnce) ],
            ..Default::default()
        };

        let expected : Vec<u8> = vec![0x82, 8, 0, 10, 0, 3, b'a', b'/', b'b', 1];
        assert_eq!(expected, encode_packet_for_test(&MqttPacket::Subscribe(packet), ProtocolVersion::Mqtt311));
    }

    #[test]
    fn subscribe_encode_layout5() {
        let packet = SubscribePacket {
            packet_id: 10,
            subscriptions: vec![ Subscription::builder("a", QualityOfService::ExactlyOnce).with_no_local(true).build() ],
            ..Default::default()
        };

        let expected : Vec<u8> = vec![0x82, 7, 0, 10, 0, 0, 1, b'a', 0x06];
        assert_eq!(expected, encode_packet_for_test(&MqttPacket::Subscribe(packet), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn subscribe_encode_failure_no_subscriptions() {
        let packet = SubscribePacket { packet_id: 1, ..Default::default() };
        let mut dest = Vec::new();

        assert_matches!(encode_subscribe_packet311(&packet, &mut dest), Err(MqttError::EncodingFailure(_)));
        assert_matches!(encode_subscribe_packet5(&packet, &mut dest), Err(MqttError::EncodingFailure(_)));
    }

    #[test]
    fn subscribe_decode_failure_no_subscriptions() {
        assert_matches!(decode_subscribe_packet311(SUBSCRIBE_FIRST_BYTE, &[0, 1]), Err(MqttError::MalformedPacket(_)));
        assert_matches!(decode_subscribe_packet5(SUBSCRIBE_FIRST_BYTE, &[0, 1, 0]), Err(MqttError::MalformedPacket(_)));
    }

    #[test]
    fn subscribe_decode_failure_bad_fixed_header() {
        let packet = create_subscribe_packet(5);

        let clear_reserved_bits = | bytes: &[u8] | -> Vec<u8> {
            let mut clone = bytes.to_vec();
            clone[0] = PACKET_TYPE_SUBSCRIBE << 4;
            clone
        };

        do_mutated_decode_failure_test(&MqttPacket::Subscribe(packet.clone()), ProtocolVersion::Mqtt5, clear_reserved_bits);
        do_fixed_header_flag_decode_failure_test(&MqttPacket::Subscribe(packet), ProtocolVersion::Mqtt311, 8);
    }

    #[test]
    fn subscribe_decode_failure_invalid_qos311() {
        let packet = SubscribePacket {
            packet_id: 10,
            subscriptions: vec![ Subscription::new("a/b", QualityOfService::AtLeastOnce) ],
            ..Default::default()
        };

        let set_qos3 = | bytes: &[u8] | -> Vec<u8> {
            let mut clone = bytes.to_vec();
            clone[9] = 3;
            clone
        };

        do_mutated_decode_failure_test(&MqttPacket::Subscribe(packet), ProtocolVersion::Mqtt311, set_qos3);
    }

    #[test]
    fn subscribe_decode_failure_options5() {
        let packet = SubscribePacket {
            packet_id: 10,
            subscriptions: vec![ Subscription::new("a", QualityOfService::AtMostOnce) ],
            ..Default::default()
        };

        for options in [0x03u8, 0x30, 0x40, 0x80] {
            let set_options = | bytes: &[u8] | -> Vec<u8> {
                let mut clone = bytes.to_vec();
                clone[8] = options;
                clone
            };

            do_mutated_decode_failure_test(&MqttPacket::Subscribe(packet.clone()), ProtocolVersion::Mqtt5, set_options);
        }
    }

    #[test]
    fn subscribe_decode_failure_truncated_subscription() {
        let packet = create_subscribe_packet(5);

        let drop_last_options_byte = | bytes: &[u8] | -> Vec<u8> {
            let mut clone = bytes.to_vec();
            clone.pop();
            clone[1] -= 1;
            clone
        };

        do_mutated_decode_failure_test(&MqttPacket::Subscribe(packet), ProtocolVersion::Mqtt311, drop_last_options_byte);
    }
}
