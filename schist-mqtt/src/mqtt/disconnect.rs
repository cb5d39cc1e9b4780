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

pub(crate) fn encode_disconnect_packet5(packet: &DisconnectPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut body = Vec::new();
    encode_u8(packet.reason_code, &mut body);
    encode_properties(&packet.properties, PropertyContext::Disconnect, &mut body)?;

    encode_fixed_header_and_body(DISCONNECT_FIRST_BYTE, &body, dest)
}

pub(crate) fn encode_disconnect_packet311(_: &DisconnectPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_fixed_header_and_body(DISCONNECT_FIRST_BYTE, &[], dest)
}

pub(crate) fn decode_disconnect_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != DISCONNECT_FIRST_BYTE {
        error!("DisconnectPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid disconnect first byte"));
    }

    let mut packet = DisconnectPacket { ..Default::default() };

    /* an empty body is a normal disconnect; a lone reason code has no properties */
    let mut mutable_body = packet_body;
    if !mutable_body.is_empty() {
        mutable_body = decode_u8(mutable_body, &mut packet.reason_code)?;
        if !mutable_body.is_empty() {
            mutable_body = decode_properties(mutable_body, PropertyContext::Disconnect, &mut packet.properties)?;
        }
    }

    if !mutable_body.is_empty() {
        error!("DisconnectPacket Decode - body length does not match remaining length");
        return Err(MqttError::new_malformed_packet("disconnect body has trailing bytes"));
    }

    Ok(MqttPacket::Disconnect(packet))
}

pub(crate) fn decode_disconnect_packet311(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != DISCONNECT_FIRST_BYTE {
        error!("DisconnectPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid disconnect first byte"));
    }

    if !packet_body.is_empty() {
        error!("DisconnectPacket Decode - non-zero remaining length");
        return Err(MqttError::new_malformed_packet("disconnect packet has a non-empty body"));
    }

    Ok(MqttPacket::Disconnect(DisconnectPacket { ..Default::default() }))
}

impl fmt::Display for DisconnectPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisconnectPacket {{")?;
        log_primitive_value!(self.reason_code, f, "reason_code");
        log_properties!(self.properties, f, "properties");
        write!(f, " }}")
    }
}
