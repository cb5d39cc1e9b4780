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

fn compute_publish_fixed_header_first_byte(packet: &PublishPacket) -> u8 {
    let mut first_byte: u8 = PACKET_TYPE_PUBLISH << 4;

    if packet.duplicate {
        first_byte |= PUBLISH_PACKET_FIXED_HEADER_DUPLICATE_FLAG;
    }

    first_byte |= (packet.qos as u8) << PUBLISH_PACKET_FIXED_HEADER_QOS_SHIFT;

    if packet.retain {
        first_byte |= PUBLISH_PACKET_FIXED_HEADER_RETAIN_FLAG;
    }

    first_byte
}

fn encode_publish_packet(packet: &PublishPacket, version: ProtocolVersion, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut body = Vec::with_capacity(packet.topic.len() + packet.payload.len() + 16);

    encode_length_prefixed_string(&packet.topic, &mut body)?;
    if packet.qos != QualityOfService::AtMostOnce {
        encode_u16(packet.packet_id, &mut body);
    }

    if version == ProtocolVersion::Mqtt5 {
        encode_properties(&packet.properties, PropertyContext::Publish, &mut body)?;
    }

    body.extend_from_slice(&packet.payload);

    encode_fixed_header_and_body(compute_publish_fixed_header_first_byte(packet), &body, dest)
}

pub(crate) fn encode_publish_packet5(packet: &PublishPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_publish_packet(packet, ProtocolVersion::Mqtt5, dest)
}

pub(crate) fn encode_publish_packet311(packet: &PublishPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_publish_packet(packet, ProtocolVersion::Mqtt311, dest)
}

fn decode_publish_packet(first_byte: u8, packet_body: &[u8], version: ProtocolVersion) -> MqttResult<MqttPacket> {
    if (first_byte >> 4) != PACKET_TYPE_PUBLISH {
        error!("PublishPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid publish first byte"));
    }

    let mut packet = PublishPacket { ..Default::default() };

    packet.duplicate = (first_byte & PUBLISH_PACKET_FIXED_HEADER_DUPLICATE_FLAG) != 0;
    packet.retain = (first_byte & PUBLISH_PACKET_FIXED_HEADER_RETAIN_FLAG) != 0;
    packet.qos = QualityOfService::try_from((first_byte >> PUBLISH_PACKET_FIXED_HEADER_QOS_SHIFT) & QOS_MASK).map_err(|_| {
        error!("PublishPacket Decode - invalid qos");
        MqttError::new_malformed_packet("invalid publish qos")
    })?;

    let mut mutable_body = packet_body;
    mutable_body = decode_length_prefixed_string(mutable_body, &mut packet.topic)?;

    if packet.qos != QualityOfService::AtMostOnce {
        mutable_body = decode_u16(mutable_body, &mut packet.packet_id)?;
    }

    if version == ProtocolVersion::Mqtt5 {
        mutable_body = decode_properties(mutable_body, PropertyContext::Publish, &mut packet.properties)?;
    }

    packet.payload = mutable_body.to_vec();

    Ok(MqttPacket::Publish(packet))
}

pub(crate) fn decode_publish_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_publish_packet(first_byte, packet_body, ProtocolVersion::Mqtt5)
}

pub(crate) fn decode_publish_packet311(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_publish_packet(first_byte, packet_body, ProtocolVersion::Mqtt311)
}

impl fmt::Display for PublishPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublishPacket {{")?;
        log_string!(self.topic, f, "topic");

        if self.packet_id != 0 {
            log_primitive_value!(self.packet_id, f, "packet_id");
        }

        log_enum!(self.qos, f, "qos", QualityOfService);
        log_primitive_value!(self.duplicate, f, "duplicate");
        log_primitive_value!(self.retain, f, "retain");
        log_binary_data!(self.payload, f, "payload");
        log_properties!(self.properties, f, "properties");
        write!(f, " }}")
    }
}
