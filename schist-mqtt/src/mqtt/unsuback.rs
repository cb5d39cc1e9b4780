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

pub(crate) fn encode_unsuback_packet5(packet: &UnsubackPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut body = Vec::with_capacity(packet.reason_codes.len() + 3);
    encode_u16(packet.packet_id, &mut body);
    encode_properties(&packet.properties, PropertyContext::Ack, &mut body)?;
    body.extend_from_slice(&packet.reason_codes);

    encode_fixed_header_and_body(UNSUBACK_FIRST_BYTE, &body, dest)
}

/// Mqtt311 unsubacks carry no per-topic result.
pub(crate) fn encode_unsuback_packet311(packet: &UnsubackPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut body = Vec::with_capacity(2);
    encode_u16(packet.packet_id, &mut body);

    encode_fixed_header_and_body(UNSUBACK_FIRST_BYTE, &body, dest)
}

pub(crate) fn decode_unsuback_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != UNSUBACK_FIRST_BYTE {
        error!("UnsubackPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid unsuback first byte"));
    }

    let mut packet = UnsubackPacket { ..Default::default() };
    let mut mutable_body = decode_u16(packet_body, &mut packet.packet_id)?;
    mutable_body = decode_properties(mutable_body, PropertyContext::Ack, &mut packet.properties)?;

    if mutable_body.is_empty() {
        error!("UnsubackPacket Decode - no reason codes");
        return Err(MqttError::new_malformed_packet("unsuback packet contains no reason codes"));
    }

    packet.reason_codes = mutable_body.to_vec();

    Ok(MqttPacket::Unsuback(packet))
}

pub(crate) fn decode_unsuback_packet311(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != UNSUBACK_FIRST_BYTE {
        error!("UnsubackPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid unsuback first byte"));
    }

    let mut packet = UnsubackPacket { ..Default::default() };
    let mutable_body = decode_u16(packet_body, &mut packet.packet_id)?;
    if !mutable_body.is_empty() {
        error!("UnsubackPacket Decode - body length does not match remaining length");
        return Err(MqttError::new_malformed_packet("unsuback body has trailing bytes"));
    }

    Ok(MqttPacket::Unsuback(packet))
}

impl fmt::Display for UnsubackPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnsubackPacket {{")?;
        log_primitive_value!(self.packet_id, f, "packet_id");
        log_properties!(self.properties, f, "properties");
        if !self.reason_codes.is_empty() {
            write!(f, " reason_codes: [")?;
            for (i, reason_code) in self.reason_codes.iter().enumerate() {
                write!(f, " {}:{}", i, reason_code)?;
            }
            write!(f, " ]")?;
        }
        write!(f, " }}")
    }
}
