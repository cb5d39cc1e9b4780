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

fn encode_unsubscribe_packet(packet: &UnsubscribePacket, version: ProtocolVersion, dest: &mut Vec<u8>) -> MqttResult<()> {
    if packet.topic_filters.is_empty() {
        error!("UnsubscribePacket Encode - no topic filters");
        return Err(MqttError::new_encoding_failure("unsubscribe packet must contain at least one topic filter"));
    }

    let mut body = Vec::new();
    encode_u16(packet.packet_id, &mut body);

    if version == ProtocolVersion::Mqtt5 {
        encode_properties(&packet.properties, PropertyContext::Unsubscribe, &mut body)?;
    }

    for topic_filter in &packet.topic_filters {
        encode_length_prefixed_string(topic_filter, &mut body)?;
    }

    encode_fixed_header_and_body(UNSUBSCRIBE_FIRST_BYTE, &body, dest)
}

pub(crate) fn encode_unsubscribe_packet5(packet: &UnsubscribePacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_unsubscribe_packet(packet, ProtocolVersion::Mqtt5, dest)
}

pub(crate) fn encode_unsubscribe_packet311(packet: &UnsubscribePacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_unsubscribe_packet(packet, ProtocolVersion::Mqtt311, dest)
}

fn decode_unsubscribe_packet(first_byte: u8, packet_body: &[u8], version: ProtocolVersion) -> MqttResult<MqttPacket> {
    if first_byte != UNSUBSCRIBE_FIRST_BYTE {
        error!("UnsubscribePacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid unsubscribe first byte"));
    }

    let mut packet = UnsubscribePacket { ..Default::default() };
    let mut mutable_body = decode_u16(packet_body, &mut packet.packet_id)?;

    if version == ProtocolVersion::Mqtt5 {
        mutable_body = decode_properties(mutable_body, PropertyContext::Unsubscribe, &mut packet.properties)?;
    }

    while !mutable_body.is_empty() {
        let mut topic_filter = String::new();
        mutable_body = decode_length_prefixed_string(mutable_body, &mut topic_filter)?;
        packet.topic_filters.push(topic_filter);
    }

    if packet.topic_filters.is_empty() {
        error!("UnsubscribePacket Decode - no topic filters");
        return Err(MqttError::new_malformed_packet("unsubscribe packet contains no topic filters"));
    }

    Ok(MqttPacket::Unsubscribe(packet))
}

pub(crate) fn decode_unsubscribe_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_unsubscribe_packet(first_byte, packet_body, ProtocolVersion::Mqtt5)
}

pub(crate) fn decode_unsubscribe_packet311(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_unsubscribe_packet(first_byte, packet_body, ProtocolVersion::Mqtt311)
}

impl fmt::Display for UnsubscribePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnsubscribePacket {{")?;
        log_primitive_value!(self.packet_id, f, "packet_id");
        log_properties!(self.properties, f, "properties");
        write!(f, " topic_filters: [")?;
        for (i, topic_filter) in self.topic_filters.iter().enumerate() {
            write!(f, " {}:\"{}\"", i, topic_filter)?;
        }
        write!(f, " ] }}")
    }
}
