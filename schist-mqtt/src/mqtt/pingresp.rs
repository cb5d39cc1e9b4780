/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::encode::utils::*;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;
use crate::mqtt::utils::*;

use log::*;
use std::fmt;

pub(crate) fn encode_pingresp_packet(_: &PingrespPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_fixed_header_and_body(PINGRESP_FIRST_BYTE, &[], dest)
}

pub(crate) fn decode_pingresp_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if !packet_body.is_empty() {
        error!("PingrespPacket Decode - non-zero remaining length");
        return Err(MqttError::new_malformed_packet("pingresp packet has a non-empty body"));
    }

    if first_byte != PINGRESP_FIRST_BYTE {
        error!("PingrespPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid pingresp first byte"));
    }

    Ok(MqttPacket::Pingresp(PingrespPacket{}))
}

impl fmt::Display for PingrespPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PingrespPacket {{ }}")
    }
}
