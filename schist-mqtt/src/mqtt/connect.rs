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

fn compute_connect_flags(packet: &ConnectPacket) -> u8 {
    let mut flags: u8 = 0;
    if packet.clean_session {
        flags |= CONNECT_PACKET_CLEAN_SESSION_FLAG_MASK;
    }

    if let Some(will) = &packet.will {
        flags |= CONNECT_PACKET_HAS_WILL_FLAG_MASK;
        flags |= (will.qos as u8) << CONNECT_PACKET_WILL_QOS_FLAG_SHIFT;
        if will.retain {
            flags |= CONNECT_PACKET_WILL_RETAIN_FLAG_MASK;
        }
    }

    if packet.password.is_some() {
        flags |= CONNECT_PACKET_HAS_PASSWORD_FLAG_MASK;
    }

    if packet.username.is_some() {
        flags |= CONNECT_PACKET_HAS_USERNAME_FLAG_MASK;
    }

    flags
}

fn encode_connect_packet(packet: &ConnectPacket, version: ProtocolVersion, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut body = Vec::new();

    encode_length_prefixed_string(&packet.protocol_name, &mut body)?;
    encode_u8(packet.protocol_level, &mut body);
    encode_u8(compute_connect_flags(packet), &mut body);
    encode_u16(packet.keep_alive_interval_seconds, &mut body);
    if version == ProtocolVersion::Mqtt5 {
        encode_properties(&packet.properties, PropertyContext::Connect, &mut body)?;
    }

    encode_length_prefixed_string(&packet.client_id, &mut body)?;

    if let Some(will) = &packet.will {
        if version == ProtocolVersion::Mqtt5 {
            encode_properties(&will.properties, PropertyContext::Will, &mut body)?;
        }
        encode_length_prefixed_string(&will.topic, &mut body)?;
        encode_length_prefixed_bytes(&will.payload, &mut body)?;
    }

    if let Some(username) = &packet.username {
        encode_length_prefixed_string(username, &mut body)?;
    }

    if let Some(password) = &packet.password {
        encode_length_prefixed_bytes(password, &mut body)?;
    }

    encode_fixed_header_and_body(CONNECT_FIRST_BYTE, &body, dest)
}

pub(crate) fn encode_connect_packet5(packet: &ConnectPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_connect_packet(packet, ProtocolVersion::Mqtt5, dest)
}

pub(crate) fn encode_connect_packet311(packet: &ConnectPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_connect_packet(packet, ProtocolVersion::Mqtt311, dest)
}

fn validate_protocol_name_and_level(packet: &ConnectPacket, version: ProtocolVersion) -> MqttResult<()> {
    let valid = match version {
        ProtocolVersion::Mqtt5 => {
            packet.protocol_name == PROTOCOL_NAME_MQTT && packet.protocol_level == PROTOCOL_LEVEL_5
        }
        ProtocolVersion::Mqtt311 => {
            (packet.protocol_name == PROTOCOL_NAME_MQTT && packet.protocol_level == PROTOCOL_LEVEL_311)
                || (packet.protocol_name == PROTOCOL_NAME_MQISDP && packet.protocol_level == PROTOCOL_LEVEL_31)
        }
    };

    if !valid {
        error!("ConnectPacket Decode - unexpected protocol name/level ({}, {})", packet.protocol_name, packet.protocol_level);
        return Err(MqttError::new_malformed_packet("invalid connect protocol name or level"));
    }

    Ok(())
}

fn decode_connect_packet(first_byte: u8, packet_body: &[u8], version: ProtocolVersion) -> MqttResult<MqttPacket> {
    if first_byte != CONNECT_FIRST_BYTE {
        error!("ConnectPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid connect first byte"));
    }

    let mut packet = ConnectPacket { ..Default::default() };
    let mut mutable_body = packet_body;

    mutable_body = decode_length_prefixed_string(mutable_body, &mut packet.protocol_name)?;
    mutable_body = decode_u8(mutable_body, &mut packet.protocol_level)?;
    validate_protocol_name_and_level(&packet, version)?;

    let mut connect_flags : u8 = 0;
    mutable_body = decode_u8(mutable_body, &mut connect_flags)?;

    if (connect_flags & CONNECT_PACKET_RESERVED_FLAG_MASK) != 0 {
        error!("ConnectPacket Decode - reserved connect flag is set");
        return Err(MqttError::new_malformed_packet("connect reserved flag set"));
    }

    packet.clean_session = (connect_flags & CONNECT_PACKET_CLEAN_SESSION_FLAG_MASK) != 0;
    let has_will = (connect_flags & CONNECT_PACKET_HAS_WILL_FLAG_MASK) != 0;
    let will_retain = (connect_flags & CONNECT_PACKET_WILL_RETAIN_FLAG_MASK) != 0;
    let will_qos = (connect_flags >> CONNECT_PACKET_WILL_QOS_FLAG_SHIFT) & QOS_MASK;

    if !has_will && (will_retain || will_qos != 0) {
        error!("ConnectPacket Decode - will flags set without a will");
        return Err(MqttError::new_malformed_packet("connect will flags set without a will"));
    }

    mutable_body = decode_u16(mutable_body, &mut packet.keep_alive_interval_seconds)?;
    if version == ProtocolVersion::Mqtt5 {
        mutable_body = decode_properties(mutable_body, PropertyContext::Connect, &mut packet.properties)?;
    }

    mutable_body = decode_length_prefixed_string(mutable_body, &mut packet.client_id)?;

    if has_will {
        let mut will = Will {
            qos : QualityOfService::try_from(will_qos).map_err(|_| {
                error!("ConnectPacket Decode - invalid will qos");
                MqttError::new_malformed_packet("invalid connect will qos")
            })?,
            retain : will_retain,
            ..Default::default()
        };

        if version == ProtocolVersion::Mqtt5 {
            mutable_body = decode_properties(mutable_body, PropertyContext::Will, &mut will.properties)?;
        }
        mutable_body = decode_length_prefixed_string(mutable_body, &mut will.topic)?;
        mutable_body = decode_length_prefixed_bytes(mutable_body, &mut will.payload)?;

        packet.will = Some(will);
    }

    if (connect_flags & CONNECT_PACKET_HAS_USERNAME_FLAG_MASK) != 0 {
        let mut username = String::new();
        mutable_body = decode_length_prefixed_string(mutable_body, &mut username)?;
        packet.username = Some(username);
    }

    if (connect_flags & CONNECT_PACKET_HAS_PASSWORD_FLAG_MASK) != 0 {
        let mut password = Vec::new();
        mutable_body = decode_length_prefixed_bytes(mutable_body, &mut password)?;
        packet.password = Some(password);
    }

    if !mutable_body.is_empty() {
        error!("ConnectPacket Decode - body length does not match remaining length");
        return Err(MqttError::new_malformed_packet("connect body has trailing bytes"));
    }

    Ok(MqttPacket::Connect(packet))
}

pub(crate) fn decode_connect_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_connect_packet(first_byte, packet_body, ProtocolVersion::Mqtt5)
}

pub(crate) fn decode_connect_packet311(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    decode_connect_packet(first_byte, packet_body, ProtocolVersion::Mqtt311)
}

impl fmt::Display for ConnectPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectPacket {{")?;
        log_string!(self.protocol_name, f, "protocol_name");
        log_primitive_value!(self.protocol_level, f, "protocol_level");
        log_primitive_value!(self.keep_alive_interval_seconds, f, "keep_alive_interval_seconds");
        log_primitive_value!(self.clean_session, f, "clean_session");
        log_string!(self.client_id, f, "client_id");
        log_optional_string!(self.username, f, "username", value);
        log_optional_binary_data_sensitive!(self.password, f, "password");
        log_properties!(self.properties, f, "properties");

        if let Some(will) = &self.will {
            write!(f, " will: {{")?;
            log_string!(will.topic, f, "topic");
            log_enum!(will.qos, f, "qos", QualityOfService);
            log_primitive_value!(will.retain, f, "retain");
            log_binary_data!(will.payload, f, "payload");
            log_properties!(will.properties, f, "properties");
            write!(f, " }}")?;
        }

        write!(f, " }}")
    }
}
