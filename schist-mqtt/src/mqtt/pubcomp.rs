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

define_ack_packet_encoding_impl5!(encode_pubcomp_packet5, PubcompPacket, PUBCOMP_FIRST_BYTE);
define_ack_packet_encoding_impl311!(encode_pubcomp_packet311, PubcompPacket, PUBCOMP_FIRST_BYTE);

define_ack_packet_decode_function5!(decode_pubcomp_packet5, Pubcomp, PubcompPacket, "Pubcomp", PUBCOMP_FIRST_BYTE);
define_ack_packet_decode_function311!(decode_pubcomp_packet311, Pubcomp, PubcompPacket, "Pubcomp", PUBCOMP_FIRST_BYTE);

define_ack_packet_display_trait!(PubcompPacket, "PubcompPacket");

#[cfg(test)]
mod tests {

    use super::*;
    use crate::decode::testing::*;

    #[test]
    fn pubcomp_round_trip_encode_decode_311() {
        let packet = PubcompPacket {
            packet_id: 1,
            ..Default::default()
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Pubcomp(packet), ProtocolVersion::Mqtt311));
    }

    #[test]
    fn pubcomp_round_trip_encode_decode_with_props5() {
        let packet = PubcompPacket {
            packet_id: 1,
            reason_code: 0,
            properties: Properties::new()
                .with_user_property("Pubcomp", "Props"),
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Pubcomp(packet), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn pubcomp_decode_failure_bad_fixed_header() {
        let packet = PubcompPacket {
            packet_id: 1,
            ..Default::default()
        };

        do_fixed_header_flag_decode_failure_test(&MqttPacket::Pubcomp(packet), ProtocolVersion::Mqtt311, 15);
    }

    #[test]
    fn pubcomp_decode_failure_property_length_overrun5() {
        let packet = PubcompPacket {
            packet_id: 1,
            properties: Properties::new().with_user_property("a", "b"),
            ..Default::default()
        };

        let inflate_property_length = | bytes: &[u8] | -> Vec<u8> {
            let mut clone = bytes.to_vec();
            clone[5] += 1;
            clone
        };

        do_mutated_decode_failure_test(&MqttPacket::Pubcomp(packet), ProtocolVersion::Mqtt5, inflate_property_length);
    }
}
