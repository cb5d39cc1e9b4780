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

pub(crate) fn encode_pingreq_packet(_: &PingreqPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_fixed_header_and_body(PINGREQ_FIRST_BYTE, &[], dest)
}

pub(crate) fn decode_pingreq_packet(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if !packet_body.is_empty() {
        error!("PingreqPacket Decode - non-zero remaining length");
        return Err(MqttError::new_malformed_packet("pingreq packet has a non-empty body"));
    }

    if first_byte != PINGREQ_FIRST_BYTE {
        error!("PingreqPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid pingreq first byte"));
    }

    Ok(MqttPacket::Pingreq(PingreqPacket{}))
}

impl fmt::Display for PingreqPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PingreqPacket {{ }}")
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::decode::testing::*;

    #[test]
    fn pingreq_round_trip_encode_decode5() {
        assert!(do_round_trip_encode_decode_test(&MqttPacket::Pingreq(PingreqPacket {}), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn pingreq_round_trip_encode_decode311() {
        assert!(do_round_trip_encode_decode_test(&MqttPacket::Pingreq(PingreqPacket {}), ProtocolVersion::Mqtt311));
    }

    #[test]
    fn pingreq_encode_layout() {
        assert_eq!(vec![0xC0, 0x00], encode_packet_for_test(&MqttPacket::Pingreq(PingreqPacket {}), ProtocolVersion::Mqtt311));
    }

    #[test]
    fn pingreq_decode_failure_bad_fixed_header() {
        do_fixed_header_flag_decode_failure_test(&MqttPacket::Pingreq(PingreqPacket {}), ProtocolVersion::Mqtt5, 2);
        do_fixed_header_flag_decode_failure_test(&MqttPacket::Pingreq(PingreqPacket {}), ProtocolVersion::Mqtt311, 8);
    }
}
