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

define_ack_packet_encoding_impl5!(encode_puback_packet5, PubackPacket, PUBACK_FIRST_BYTE);
define_ack_packet_encoding_impl311!(encode_puback_packet311, PubackPacket, PUBACK_FIRST_BYTE);

define_ack_packet_decode_function5!(decode_puback_packet5, Puback, PubackPacket, "Puback", PUBACK_FIRST_BYTE);
define_ack_packet_decode_function311!(decode_puback_packet311, Puback, PubackPacket, "Puback", PUBACK_FIRST_BYTE);

define_ack_packet_display_trait!(PubackPacket, "PubackPacket");

#[cfg(test)]
mod tests {

    use super::*;
    use crate::decode::testing::*;
    use assert_matches::assert_matches;

    #[test]
    fn puback_round_trip_encode_decode_311() {
        let packet = PubackPacket {
            packet_id: 123,
            ..Default::default()
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Puback(packet), ProtocolVersion::Mqtt311));
    }

    #[test]
    fn puback_round_trip_encode_decode_failure_no_props5() {
        let packet = PubackPacket {
            packet_id: 16384,
            reason_code: 0x87,
            ..Default::default()
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Puback(packet), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn puback_round_trip_encode_decode_with_props5() {
        let packet = PubackPacket {
            packet_id: 1025,
            reason_code: 0x10,
            properties: Properties::new()
                .with(PropertyKey::ReasonString, PropertyValue::String("No one home".to_string()))
                .with_user_property("This", "wasbad"),
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Puback(packet), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn puback_encode_layouts() {
        let packet = MqttPacket::Puback(PubackPacket {
            packet_id: 0x0102,
            ..Default::default()
        });

        assert_eq!(vec![0x40, 2, 1, 2], encode_packet_for_test(&packet, ProtocolVersion::Mqtt311));
        assert_eq!(vec![0x40, 4, 1, 2, 0, 0], encode_packet_for_test(&packet, ProtocolVersion::Mqtt5));
    }

    #[test]
    fn puback_decode_short_forms5() {
        let expected = MqttPacket::Puback(PubackPacket { packet_id: 7, ..Default::default() });
        assert_eq!(expected, decode_puback_packet5(PUBACK_FIRST_BYTE, &[0, 7]).unwrap());

        let expected = MqttPacket::Puback(PubackPacket { packet_id: 7, reason_code: 0x80, ..Default::default() });
        assert_eq!(expected, decode_puback_packet5(PUBACK_FIRST_BYTE, &[0, 7, 0x80]).unwrap());
    }

    #[test]
    fn puback_decode_failure_trailing_bytes311() {
        assert_matches!(decode_puback_packet311(PUBACK_FIRST_BYTE, &[0, 7, 0]), Err(MqttError::MalformedPacket(_)));
    }

    #[test]
    fn puback_decode_failure_bad_fixed_header() {
        let packet = PubackPacket {
            packet_id: 123,
            ..Default::default()
        };

        do_fixed_header_flag_decode_failure_test(&MqttPacket::Puback(packet), ProtocolVersion::Mqtt5, 9);
    }
}
