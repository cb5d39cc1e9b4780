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

define_ack_packet_encoding_impl5!(encode_pubrec_packet5, PubrecPacket, PUBREC_FIRST_BYTE);
define_ack_packet_encoding_impl311!(encode_pubrec_packet311, PubrecPacket, PUBREC_FIRST_BYTE);

define_ack_packet_decode_function5!(decode_pubrec_packet5, Pubrec, PubrecPacket, "Pubrec", PUBREC_FIRST_BYTE);
define_ack_packet_decode_function311!(decode_pubrec_packet311, Pubrec, PubrecPacket, "Pubrec", PUBREC_FIRST_BYTE);

define_ack_packet_display_trait!(PubrecPacket, "PubrecPacket");

#[cfg(test)]
mod tests {

    use super::*;
    use crate::decode::testing::*;
    use assert_matches::assert_matches;

    #[test]
    fn pubrec_round_trip_encode_decode_311() {
        let packet = PubrecPacket {
            packet_id: 65535,
            ..Default::default()
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Pubrec(packet), ProtocolVersion::Mqtt311));
    }

    #[test]
    fn pubrec_round_trip_encode_decode_with_props5() {
        let packet = PubrecPacket {
            packet_id: 4096,
            reason_code: 0x97,
            properties: Properties::new()
                .with(PropertyKey::ReasonString, PropertyValue::String("Quota".to_string()))
                .with_user_property("Key", "Value")
                .with_user_property("Key", "Value2"),
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Pubrec(packet), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn pubrec_decode_failure_illegal_property5() {
        let packet = PubrecPacket {
            packet_id: 10,
            ..Default::default()
        };

        let add_content_type = | bytes: &[u8] | -> Vec<u8> {
            let mut clone = bytes.to_vec();
            clone[1] += 4;
            clone[5] = 4;
            clone.extend_from_slice(&[3, 0, 1, b'x']);
            clone
        };

        do_mutated_decode_failure_test(&MqttPacket::Pubrec(packet), ProtocolVersion::Mqtt5, add_content_type);
    }

    #[test]
    fn pubrec_decode_failure_truncated_id() {
        assert_matches!(decode_pubrec_packet311(PUBREC_FIRST_BYTE, &[0]), Err(MqttError::MalformedPacket(_)));
        assert_matches!(decode_pubrec_packet5(PUBREC_FIRST_BYTE, &[]), Err(MqttError::MalformedPacket(_)));
    }

    #[test]
    fn pubrec_decode_failure_bad_fixed_header() {
        let packet = PubrecPacket {
            packet_id: 1,
            ..Default::default()
        };

        do_fixed_header_flag_decode_failure_test(&MqttPacket::Pubrec(packet), ProtocolVersion::Mqtt311, 2);
    }
}
