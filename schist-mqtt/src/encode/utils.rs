/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Internal primitives for writing MQTT wire data into a byte vector.

use crate::error::{MqttError, MqttResult};

use log::*;

pub(crate) const MAXIMUM_VARIABLE_LENGTH_INTEGER: usize = (1 << 28) - 1;
pub(crate) const MAXIMUM_LENGTH_PREFIXED_FIELD: usize = u16::MAX as usize;

pub(crate) fn compute_variable_length_integer_encode_size(value: usize) -> MqttResult<usize> {
    if value < 1usize << 7 {
        Ok(1)
    } else if value < 1usize << 14 {
        Ok(2)
    } else if value < 1usize << 21 {
        Ok(3)
    } else if value < 1usize << 28 {
        Ok(4)
    } else {
        error!("Packet Encode - variable length integer value {} exceeds the protocol maximum", value);
        Err(MqttError::new_encoding_failure("variable length integer maximum exceeded"))
    }
}

pub(crate) fn encode_vli(value: u32, dest: &mut Vec<u8>) -> MqttResult<()> {
    if value as usize > MAXIMUM_VARIABLE_LENGTH_INTEGER {
        error!("Packet Encode - variable length integer value {} exceeds the protocol maximum", value);
        return Err(MqttError::new_encoding_failure("variable length integer maximum exceeded"));
    }

    let mut done = false;
    let mut val = value;
    while !done {
        let mut byte: u8 = (val & 0x7F) as u8;
        val /= 128;

        if val != 0 {
            byte |= 128;
        }

        dest.push(byte);

        done = val == 0;
    }

    Ok(())
}

pub(crate) fn encode_u8(value: u8, dest: &mut Vec<u8>) {
    dest.push(value);
}

pub(crate) fn encode_u16(value: u16, dest: &mut Vec<u8>) {
    dest.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn encode_u32(value: u32, dest: &mut Vec<u8>) {
    dest.extend_from_slice(&value.to_be_bytes());
}

pub(crate) fn encode_length_prefixed_bytes(value: &[u8], dest: &mut Vec<u8>) -> MqttResult<()> {
    if value.len() > MAXIMUM_LENGTH_PREFIXED_FIELD {
        error!("Packet Encode - length-prefixed field of {} bytes is too long", value.len());
        return Err(MqttError::new_encoding_failure("length-prefixed field exceeds 65535 bytes"));
    }

    encode_u16(value.len() as u16, dest);
    dest.extend_from_slice(value);

    Ok(())
}

pub(crate) fn encode_length_prefixed_string(value: &str, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_length_prefixed_bytes(value.as_bytes(), dest)
}

/// Writes the first byte and the remaining length, followed by the already-encoded variable
/// header and payload.
pub(crate) fn encode_fixed_header_and_body(first_byte: u8, body: &[u8], dest: &mut Vec<u8>) -> MqttResult<()> {
    let remaining_length = body.len();
    let vli_size = compute_variable_length_integer_encode_size(remaining_length)?;

    dest.reserve(1 + vli_size + remaining_length);
    encode_u8(first_byte, dest);
    encode_vli(remaining_length as u32, dest)?;
    dest.extend_from_slice(body);

    Ok(())
}

macro_rules! define_ack_packet_encoding_impl5 {
    ($function_name: ident, $packet_type: ident, $first_byte: expr) => {
        pub(crate) fn $function_name(packet: &$packet_type, dest: &mut Vec<u8>) -> MqttResult<()> {
            let mut body = Vec::new();
            encode_u16(packet.packet_id, &mut body);
            encode_u8(packet.reason_code, &mut body);
            encode_properties(&packet.properties, PropertyContext::Ack, &mut body)?;

            encode_fixed_header_and_body($first_byte, &body, dest)
        }
    };
}

pub(crate) use define_ack_packet_encoding_impl5;

macro_rules! define_ack_packet_encoding_impl311 {
    ($function_name: ident, $packet_type: ident, $first_byte: expr) => {
        pub(crate) fn $function_name(packet: &$packet_type, dest: &mut Vec<u8>) -> MqttResult<()> {
            let mut body = Vec::with_capacity(2);
            encode_u16(packet.packet_id, &mut body);

            encode_fixed_header_and_body($first_byte, &body, dest)
        }
    };
}

pub(crate) use define_ack_packet_encoding_impl311;
