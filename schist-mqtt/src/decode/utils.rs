/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Internal primitives for reading MQTT wire data.  Every function takes the unread input and
//! returns the input that remains after the value.

use crate::error::{MqttError, MqttResult};

use log::*;

#[derive(Eq, PartialEq, Debug)]
pub(crate) enum DecodeVliResult<'a> {
    InsufficientData,
    Value(u32, &'a[u8]), /* (decoded value, remaining bytes) */
}

pub(crate) fn decode_vli(buffer: &[u8]) -> MqttResult<DecodeVliResult<'_>> {
    let mut value: u32 = 0;
    let mut shift: u32 = 0;
    let data_len = buffer.len();

    for i in 0..4 {
        if i >= data_len {
            return Ok(DecodeVliResult::InsufficientData);
        }

        let byte = buffer[i];
        value |= ((byte & 0x7F) as u32) << shift;
        shift += 7;

        if (byte & 0x80) == 0 {
            return Ok(DecodeVliResult::Value(value, &buffer[(i + 1)..]));
        }
    }

    error!("Packet Decode - invalid variable length integer");
    Err(MqttError::new_malformed_packet("variable length integer has more than four bytes"))
}

/// A vli inside a packet body can never legitimately be truncated.
pub(crate) fn decode_vli_into_mutable<'a>(buffer: &'a[u8], value: &mut usize) -> MqttResult<&'a[u8]> {
    match decode_vli(buffer)? {
        DecodeVliResult::InsufficientData => {
            error!("Packet Decode - truncated variable length integer");
            Err(MqttError::new_malformed_packet("truncated variable length integer"))
        }
        DecodeVliResult::Value(vli, remaining_slice) => {
            *value = vli as usize;
            Ok(remaining_slice)
        }
    }
}

pub(crate) fn decode_u8<'a>(bytes: &'a[u8], value: &mut u8) -> MqttResult<&'a[u8]> {
    if bytes.is_empty() {
        error!("Packet Decode - Insufficient packet bytes for u8 value");
        return Err(MqttError::new_malformed_packet("insufficient bytes for u8 value"));
    }

    *value = bytes[0];

    Ok(&bytes[1..])
}

pub(crate) fn decode_u16<'a>(bytes: &'a[u8], value: &mut u16) -> MqttResult<&'a[u8]> {
    if bytes.len() < 2 {
        error!("Packet Decode - Insufficient packet bytes for u16 value");
        return Err(MqttError::new_malformed_packet("insufficient bytes for u16 value"));
    }

    *value = u16::from_be_bytes([bytes[0], bytes[1]]);

    Ok(&bytes[2..])
}

pub(crate) fn decode_u32<'a>(bytes: &'a[u8], value: &mut u32) -> MqttResult<&'a[u8]> {
    if bytes.len() < 4 {
        error!("Packet Decode - Insufficient packet bytes for u32 value");
        return Err(MqttError::new_malformed_packet("insufficient bytes for u32 value"));
    }

    *value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

    Ok(&bytes[4..])
}

pub(crate) fn decode_length_prefixed_bytes<'a>(bytes: &'a[u8], value: &mut Vec<u8>) -> MqttResult<&'a[u8]> {
    let mut value_length : u16 = 0;
    let mutable_bytes = decode_u16(bytes, &mut value_length)?;
    let value_length = value_length as usize;

    if value_length > mutable_bytes.len() {
        error!("Packet Decode - Length-prefixed value has length larger than remaining packet bytes");
        return Err(MqttError::new_malformed_packet("length-prefixed value exceeds remaining bytes"));
    }

    *value = Vec::from(&mutable_bytes[..value_length]);
    Ok(&mutable_bytes[value_length..])
}

pub(crate) fn decode_length_prefixed_string<'a>(bytes: &'a[u8], value: &mut String) -> MqttResult<&'a[u8]> {
    let mut value_length : u16 = 0;
    let mutable_bytes = decode_u16(bytes, &mut value_length)?;
    let value_length = value_length as usize;

    if value_length > mutable_bytes.len() {
        error!("Packet Decode - Utf-8 string value has length larger than remaining packet bytes");
        return Err(MqttError::new_malformed_packet("string value exceeds remaining bytes"));
    }

    let decoded = std::str::from_utf8(&mutable_bytes[..value_length]).map_err(|err| {
        error!("Packet Decode - invalid utf-8");
        MqttError::from(err)
    })?;

    *value = decoded.to_string();
    Ok(&mutable_bytes[value_length..])
}

macro_rules! define_ack_packet_decode_function5 {
    ($function_name: ident, $mqtt_packet_type:ident, $packet_type: ident, $packet_type_as_string: expr, $first_byte: expr) => {
        pub(crate) fn $function_name(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
            if first_byte != $first_byte {
                error!("{}Packet Decode - invalid first byte", $packet_type_as_string);
                return Err(MqttError::new_malformed_packet(format!("invalid {} first byte", $packet_type_as_string)));
            }

            let mut packet = $packet_type { ..Default::default() };
            let mut mutable_body = packet_body;
            mutable_body = decode_u16(mutable_body, &mut packet.packet_id)?;

            /* the reason code and the properties may both be omitted */
            if !mutable_body.is_empty() {
                mutable_body = decode_u8(mutable_body, &mut packet.reason_code)?;
                if !mutable_body.is_empty() {
                    mutable_body = decode_properties(mutable_body, PropertyContext::Ack, &mut packet.properties)?;
                }
            }

            if !mutable_body.is_empty() {
                error!("{}Packet Decode - body length does not match remaining length", $packet_type_as_string);
                return Err(MqttError::new_malformed_packet(format!("{} body has trailing bytes", $packet_type_as_string)));
            }

            Ok(MqttPacket::$mqtt_packet_type(packet))
        }
    };
}

pub(crate) use define_ack_packet_decode_function5;

macro_rules! define_ack_packet_decode_function311 {
    ($function_name: ident, $mqtt_packet_type:ident, $packet_type: ident, $packet_type_as_string: expr, $first_byte: expr) => {
        pub(crate) fn $function_name(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
            if first_byte != $first_byte {
                error!("{}Packet Decode - invalid first byte", $packet_type_as_string);
                return Err(MqttError::new_malformed_packet(format!("invalid {} first byte", $packet_type_as_string)));
            }

            let mut packet = $packet_type { ..Default::default() };
            let mutable_body = decode_u16(packet_body, &mut packet.packet_id)?;
            if !mutable_body.is_empty() {
                error!("{}Packet Decode - body length does not match remaining length", $packet_type_as_string);
                return Err(MqttError::new_malformed_packet(format!("{} body has trailing bytes", $packet_type_as_string)));
            }

            Ok(MqttPacket::$mqtt_packet_type(packet))
        }
    };
}

pub(crate) use define_ack_packet_decode_function311;
