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

fn encode_suback_packet(packet: &SubackPacket, version: ProtocolVersion, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut body = Vec::with_capacity(packet.reason_codes.len() + 3);
    encode_u16(packet.packet_id, &mut body);

    if version == ProtocolVersion::Mqtt5 {
        encode_properties(&packet.properties, PropertyContext::Ack, &mut body)?;
    }

    body.extend_from_slice(&packet.reason_codes);

    encode_fixed_header_and_body(SUBACK_FIRST_BYTE, &body, dest)
}

pub(crate) fn encode_suback_packet5(packet: &SubackPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_suback_packet(packet, ProtocolVersion::Mqtt5, dest)
}

pub(crate) fn encode_suback_packet311(packet: &SubackPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_suback_packet(packet, ProtocolVersion::Mqtt311, dest)
}

fn decode_suback_packet(first_byte: u8, packet_body: &[u8], version: ProtocolVersion) -> MqttResult<MqttPacket> {
    if first_byte != SUBACK_FIRST_BYTE {
        error!("SubackPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid suback first byte"));
    }

    let mut packet = SubackPacket { ..Default::default() };
    let mut mutable_body = decode_u16(packet_body, &mut packet.packet_id)?;

    if version == ProtocolVersion::Mqtt5 {
        mutable_body = decode_properties(mutable_body, PropertyContext::Ack, &mut packet.properties)?;
    }

    if mutable_body.is_empty() {
        error!("SubackPacket Decode - no reason codes");
        return Err(MqttError::new_malformed_packet("suback packet contains no reason codes"));
    }

    packet.reason_codes = mutable_body.to_vec();

    Ok(MqttPacket::Suback(packet))
}

pub(crate) fn decode_suback_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_suback_packet(first_byte, packet_body, ProtocolVersion::Mqtt5)
}

pub(crate) fn decode_suback_packet311(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_suback_packet(first_byte, packet_body, ProtocolVersion::Mqtt311)
}

impl fmt::Display for SubackPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubackPacket {{")?;
        log_primitive_value!(self.packet_id, f, "packet_id");
        log_properties!(self.properties, f, "properties");
        write!(f, " reason_codes: [")?;
        for (i, reason_code) in self.reason_codes.iter().enumerate() {
            write!(f, " {}:{}", i, reason_code)?;
        }
        write!(f, " ] }}")
    }
}
