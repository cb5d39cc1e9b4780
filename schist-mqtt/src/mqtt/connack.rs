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

fn encode_connack_flags(packet: &ConnackPacket) -> u8 {
    if packet.session_present {
        CONNACK_PACKET_SESSION_PRESENT_FLAG_MASK
    } else {
        0
    }
}

pub(crate) fn encode_connack_packet5(packet: &ConnackPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut body = Vec::new();
    encode_u8(encode_connack_flags(packet), &mut body);
    encode_u8(packet.reason_code, &mut body);
    encode_properties(&packet.properties, PropertyContext::Connack, &mut body)?;

    encode_fixed_header_and_body(CONNACK_FIRST_BYTE, &body, dest)
}

pub(crate) fn encode_connack_packet311(packet: &ConnackPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    let body = [encode_connack_flags(packet), packet.reason_code];

    encode_fixed_header_and_body(CONNACK_FIRST_BYTE, &body, dest)
}

fn decode_connack_flags_and_code<'a>(first_byte: u8, packet_body: &'a[u8], packet: &mut ConnackPacket) -> MqttResult<&'a[u8]> {
    if first_byte != CONNACK_FIRST_BYTE {
        error!("ConnackPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid connack first byte"));
    }

    let mut flags : u8 = 0;
    let mut mutable_body = decode_u8(packet_body, &mut flags)?;
    if (flags & !CONNACK_PACKET_SESSION_PRESENT_FLAG_MASK) != 0 {
        error!("ConnackPacket Decode - reserved flag bits set");
        return Err(MqttError::new_malformed_packet("connack reserved flags set"));
    }

    packet.session_present = flags != 0;
    mutable_body = decode_u8(mutable_body, &mut packet.reason_code)?;

    Ok(mutable_body)
}

pub(crate) fn decode_connack_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    let mut packet = ConnackPacket { ..Default::default() };
    let mut mutable_body = decode_connack_flags_and_code(first_byte, packet_body, &mut packet)?;

    if !mutable_body.is_empty() {
        mutable_body = decode_properties(mutable_body, PropertyContext::Connack, &mut packet.properties)?;
    }

    if !mutable_body.is_empty() {
        error!("ConnackPacket Decode - body length does not match remaining length");
        return Err(MqttError::new_malformed_packet("connack body has trailing bytes"));
    }

    Ok(MqttPacket::Connack(packet))
}

pub(crate) fn decode_connack_packet311(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    let mut packet = ConnackPacket { ..Default::default() };
    let mutable_body = decode_connack_flags_and_code(first_byte, packet_body, &mut packet)?;

    if !mutable_body.is_empty() {
        error!("ConnackPacket Decode - body length does not match remaining length");
        return Err(MqttError::new_malformed_packet("connack body has trailing bytes"));
    }

    Ok(MqttPacket::Connack(packet))
}

impl fmt::Display for ConnackPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnackPacket {{")?;
        log_primitive_value!(self.session_present, f, "session_present");
        log_primitive_value!(self.reason_code, f, "reason_code");
        log_properties!(self.properties, f, "properties");
        write!(f, " }}")
    }
}
