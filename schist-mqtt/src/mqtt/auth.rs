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

pub(crate) fn encode_auth_packet5(packet: &AuthPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut body = Vec::new();
    encode_u8(packet.reason_code, &mut body);
    encode_properties(&packet.properties, PropertyContext::Auth, &mut body)?;

    encode_fixed_header_and_body(AUTH_FIRST_BYTE, &body, dest)
}

pub(crate) fn encode_auth_packet311(_: &AuthPacket, _: &mut Vec<u8>) -> MqttResult<()> {
    error!("AuthPacket Encode - auth packets do not exist in MQTT 3.1.1");
    Err(MqttError::new_encoding_failure("auth packets are only supported by MQTT5"))
}

pub(crate) fn decode_auth_packet5(first_byte: u8, packet_body: &[u8]) -> MqttResult<MqttPacket> {
    if first_byte != AUTH_FIRST_BYTE {
        error!("AuthPacket Decode - invalid first byte");
        return Err(MqttError::new_malformed_packet("invalid auth first byte"));
    }

    let mut packet = AuthPacket { ..Default::default() };

    let mut mutable_body = packet_body;
    if !mutable_body.is_empty() {
        mutable_body = decode_u8(mutable_body, &mut packet.reason_code)?;
        if !mutable_body.is_empty() {
            mutable_body = decode_properties(mutable_body, PropertyContext::Auth, &mut packet.properties)?;
        }
    }

    if !mutable_body.is_empty() {
        error!("AuthPacket Decode - body length does not match remaining length");
        return Err(MqttError::new_malformed_packet("auth body has trailing bytes"));
    }

    Ok(MqttPacket::Auth(packet))
}

pub(crate) fn decode_auth_packet311(_: u8, _: &[u8]) -> MqttResult<MqttPacket> {
    error!("AuthPacket Decode - auth packets do not exist in MQTT 3.1.1");
    Err(MqttError::new_malformed_packet("auth packet received on an MQTT 3.1.1 connection"))
}

impl fmt::Display for AuthPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthPacket {{")?;
        log_primitive_value!(self.reason_code, f, "reason_code");
        log_properties!(self.properties, f, "properties");
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::decode::testing::*;
    use assert_matches::assert_matches;

    #[test]
    fn auth_round_trip_encode_decode_default5() {
        let packet = AuthPacket { ..Default::default() };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Auth(packet), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn auth_round_trip_encode_decode_all_properties5() {
        let packet = AuthPacket {
            reason_code: 0x18,
            properties: Properties::new()
                .with(PropertyKey::AuthenticationMethod, PropertyValue::String("UnsecureAuth".to_string()))
                .with(PropertyKey::AuthenticationData, PropertyValue::Binary(vec![1, 2, 3, 4, 5]))
                .with(PropertyKey::ReasonString, PropertyValue::String("Myself".to_string()))
                .with_user_property("Roblox", "Wearables"),
        };

        assert!(do_round_trip_encode_decode_test(&MqttPacket::Auth(packet), ProtocolVersion::Mqtt5));
    }

    #[test]
    fn auth_decode_empty_body5() {
        assert_eq!(MqttPacket::Auth(AuthPacket { ..Default::default() }), decode_auth_packet5(AUTH_FIRST_BYTE, &[]).unwrap());
    }

    #[test]
    fn auth_not_supported311() {
        let packet = AuthPacket { ..Default::default() };
        let mut dest = Vec::new();

        assert_matches!(encode_auth_packet311(&packet, &mut dest), Err(MqttError::EncodingFailure(_)));
        assert!(dest.is_empty());
        assert_matches!(decode_auth_packet311(AUTH_FIRST_BYTE, &[0, 0]), Err(MqttError::MalformedPacket(_)));
    }

    #[test]
    fn auth_decode_failure_bad_fixed_header() {
        let packet = AuthPacket { ..Default::default() };

        do_fixed_header_flag_decode_failure_test(&MqttPacket::Auth(packet), ProtocolVersion::Mqtt5, 1);
    }
}
