/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Inbound half of the packet codec: locating packet boundaries in a byte stream and turning complete
frames into [`MqttPacket`] values.
 */

pub(crate) mod utils;

use crate::decode::utils::*;
use crate::error::{MqttError, MqttResult};
use crate::logging::*;
use crate::mqtt::*;
use crate::mqtt::utils::*;

use crate::mqtt::auth::*;
use crate::mqtt::connack::*;
use crate::mqtt::connect::*;
use crate::mqtt::disconnect::*;
use crate::mqtt::pingreq::*;
use crate::mqtt::pingresp::*;
use crate::mqtt::puback::*;
use crate::mqtt::pubcomp::*;
use crate::mqtt::publish::*;
use crate::mqtt::pubrec::*;
use crate::mqtt::pubrel::*;
use crate::mqtt::suback::*;
use crate::mqtt::subscribe::*;
use crate::mqtt::unsuback::*;
use crate::mqtt::unsubscribe::*;

use log::*;

use std::collections::VecDeque;

const DECODE_BUFFER_DEFAULT_SIZE : usize = 16 * 1024;

/// Returns (fixed header length, total frame length) once a complete frame is available at the
/// start of `bytes`.
fn try_frame(bytes: &[u8]) -> MqttResult<Option<(usize, usize)>> {
    if bytes.is_empty() {
        return Ok(None);
    }

    match decode_vli(&bytes[1..])? {
        DecodeVliResult::InsufficientData => { Ok(None) }
        DecodeVliResult::Value(remaining_length, remaining_bytes) => {
            let header_length = bytes.len() - remaining_bytes.len();
            let total_length = header_length + remaining_length as usize;
            if bytes.len() < total_length {
                Ok(None)
            } else {
                Ok(Some((header_length, total_length)))
            }
        }
    }
}

/// Computes the length of the complete MQTT packet at the start of `bytes`.
///
/// Returns 0 if more data is needed before the length is known or before the whole packet is
/// present.  Bytes past the end of the first packet are ignored.  A remaining length field with
/// more than four bytes is a [`MqttError::MalformedPacket`] error.
pub fn try_frame_length(bytes: &[u8]) -> MqttResult<usize> {
    match try_frame(bytes)? {
        Some((_, total_length)) => { Ok(total_length) }
        None => { Ok(0) }
    }
}

/// Decodes a single packet body, given the first byte of its fixed header.  The codec variant is
/// selected by `protocol_version`.
pub fn decode_packet(first_byte: u8, packet_body: &[u8], protocol_version: ProtocolVersion) -> MqttResult<MqttPacket> {
    let packet_type = first_byte >> 4;

    debug!("Decoding a packet of type {}", packet_type_to_str(packet_type));

    match protocol_version {
        ProtocolVersion::Mqtt5 => {
            match packet_type {
                PACKET_TYPE_CONNECT => { decode_connect_packet5(first_byte, packet_body) }
                PACKET_TYPE_CONNACK => { decode_connack_packet5(first_byte, packet_body) }
                PACKET_TYPE_PUBLISH => { decode_publish_packet5(first_byte, packet_body) }
                PACKET_TYPE_PUBACK => { decode_puback_packet5(first_byte, packet_body) }
                PACKET_TYPE_PUBREC => { decode_pubrec_packet5(first_byte, packet_body) }
                PACKET_TYPE_PUBREL => { decode_pubrel_packet5(first_byte, packet_body) }
                PACKET_TYPE_PUBCOMP => { decode_pubcomp_packet5(first_byte, packet_body) }
                PACKET_TYPE_SUBSCRIBE => { decode_subscribe_packet5(first_byte, packet_body) }
                PACKET_TYPE_SUBACK => { decode_suback_packet5(first_byte, packet_body) }
                PACKET_TYPE_UNSUBSCRIBE => { decode_unsubscribe_packet5(first_byte, packet_body) }
                PACKET_TYPE_UNSUBACK => { decode_unsuback_packet5(first_byte, packet_body) }
                PACKET_TYPE_PINGREQ => { decode_pingreq_packet(first_byte, packet_body) }
                PACKET_TYPE_PINGRESP => { decode_pingresp_packet(first_byte, packet_body) }
                PACKET_TYPE_DISCONNECT => { decode_disconnect_packet5(first_byte, packet_body) }
                PACKET_TYPE_AUTH => { decode_auth_packet5(first_byte, packet_body) }
                _ => {
                    error!("Packet Decode - invalid packet type {}", packet_type);
                    Err(MqttError::new_malformed_packet("invalid packet type value"))
                }
            }
        }
        ProtocolVersion::Mqtt311 => {
            match packet_type {
                PACKET_TYPE_CONNECT => { decode_connect_packet311(first_byte, packet_body) }
                PACKET_TYPE_CONNACK => { decode_connack_packet311(first_byte, packet_body) }
                PACKET_TYPE_PUBLISH => { decode_publish_packet311(first_byte, packet_body) }
                PACKET_TYPE_PUBACK => { decode_puback_packet311(first_byte, packet_body) }
                PACKET_TYPE_PUBREC => { decode_pubrec_packet311(first_byte, packet_body) }
                PACKET_TYPE_PUBREL => { decode_pubrel_packet311(first_byte, packet_body) }
                PACKET_TYPE_PUBCOMP => { decode_pubcomp_packet311(first_byte, packet_body) }
                PACKET_TYPE_SUBSCRIBE => { decode_subscribe_packet311(first_byte, packet_body) }
                PACKET_TYPE_SUBACK => { decode_suback_packet311(first_byte, packet_body) }
                PACKET_TYPE_UNSUBSCRIBE => { decode_unsubscribe_packet311(first_byte, packet_body) }
                PACKET_TYPE_UNSUBACK => { decode_unsuback_packet311(first_byte, packet_body) }
                PACKET_TYPE_PINGREQ => { decode_pingreq_packet(first_byte, packet_body) }
                PACKET_TYPE_PINGRESP => { decode_pingresp_packet(first_byte, packet_body) }
                PACKET_TYPE_DISCONNECT => { decode_disconnect_packet311(first_byte, packet_body) }
                PACKET_TYPE_AUTH => { decode_auth_packet311(first_byte, packet_body) }
                _ => {
                    error!("Packet Decode - invalid packet type {}", packet_type);
                    Err(MqttError::new_malformed_packet("invalid packet type value"))
                }
            }
        }
    }
}

/// Per-call decoding parameters.  Successfully decoded packets are appended to `decoded_packets`
/// in arrival order.
pub struct DecodingContext<'a> {

    /// Codec variant to decode with
    pub protocol_version : ProtocolVersion,

    /// Destination for complete packets
    pub decoded_packets: &'a mut VecDeque<MqttPacket>
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum DecoderState {
    Ready,
    TerminalError
}

/// Stream decoder that accumulates inbound bytes across calls and emits every complete packet.
///
/// Once a decode fails, the decoder stays failed until [`Decoder::reset_for_new_connection`] is called;
/// the connection that produced the bad data cannot be trusted to be in sync anymore.
pub struct Decoder {
    state: DecoderState,

    buffer: Vec<u8>,
}

impl Decoder {

    /// Creates a new decoder with an empty buffer
    pub fn new() -> Decoder {
        Decoder {
            state: DecoderState::Ready,
            buffer : Vec::<u8>::with_capacity(DECODE_BUFFER_DEFAULT_SIZE),
        }
    }

    /// Discards any partial packet and clears a previous decode failure
    pub fn reset_for_new_connection(&mut self) {
        self.state = DecoderState::Ready;
        self.buffer.clear();
    }

    /// Appends `bytes` to the pending input and decodes as many complete packets as possible.
    pub fn decode_bytes(&mut self, bytes: &[u8], context: &mut DecodingContext<'_>) -> MqttResult<()> {
        if self.state == DecoderState::TerminalError {
            error!("Decoder - decode_bytes called after a previous decode failure");
            return Err(MqttError::new_internal_state_error("decoder is in a terminal error state"));
        }

        self.buffer.extend_from_slice(bytes);

        let result = self.decode_buffered_packets(context);
        if result.is_err() {
            self.state = DecoderState::TerminalError;
            self.buffer.clear();
        }

        result
    }

    fn decode_buffered_packets(&mut self, context: &mut DecodingContext<'_>) -> MqttResult<()> {
        let mut consumed : usize = 0;

        while let Some((header_length, total_length)) = try_frame(&self.buffer[consumed..])? {
            let frame = &self.buffer[consumed..(consumed + total_length)];
            let packet = decode_packet(frame[0], &frame[header_length..], context.protocol_version)?;

            log_packet("Successfully decoded incoming packet: ", &packet);
            context.decoded_packets.push_back(packet);

            consumed += total_length;
        }

        self.buffer.drain(..consumed);

        Ok(())
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}
