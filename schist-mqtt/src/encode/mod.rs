/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Outbound half of the packet codec.
 */

pub(crate) mod utils;

use crate::error::MqttResult;
use crate::logging::*;
use crate::mqtt::*;
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

fn encode_packet5(mqtt_packet: &MqttPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    match mqtt_packet {
        MqttPacket::Connect(packet) => { encode_connect_packet5(packet, dest) }
        MqttPacket::Connack(packet) => { encode_connack_packet5(packet, dest) }
        MqttPacket::Publish(packet) => { encode_publish_packet5(packet, dest) }
        MqttPacket::Puback(packet) => { encode_puback_packet5(packet, dest) }
        MqttPacket::Pubrec(packet) => { encode_pubrec_packet5(packet, dest) }
        MqttPacket::Pubrel(packet) => { encode_pubrel_packet5(packet, dest) }
        MqttPacket::Pubcomp(packet) => { encode_pubcomp_packet5(packet, dest) }
        MqttPacket::Subscribe(packet) => { encode_subscribe_packet5(packet, dest) }
        MqttPacket::Suback(packet) => { encode_suback_packet5(packet, dest) }
        MqttPacket::Unsubscribe(packet) => { encode_unsubscribe_packet5(packet, dest) }
        MqttPacket::Unsuback(packet) => { encode_unsuback_packet5(packet, dest) }
        MqttPacket::Pingreq(packet) => { encode_pingreq_packet(packet, dest) }
        MqttPacket::Pingresp(packet) => { encode_pingresp_packet(packet, dest) }
        MqttPacket::Disconnect(packet) => { encode_disconnect_packet5(packet, dest) }
        MqttPacket::Auth(packet) => { encode_auth_packet5(packet, dest) }
    }
}

fn encode_packet311(mqtt_packet: &MqttPacket, dest: &mut Vec<u8>) -> MqttResult<()> {
    match mqtt_packet {
        MqttPacket::Connect(packet) => { encode_connect_packet311(packet, dest) }
        MqttPacket::Connack(packet) => { encode_connack_packet311(packet, dest) }
        MqttPacket::Publish(packet) => { encode_publish_packet311(packet, dest) }
        MqttPacket::Puback(packet) => { encode_puback_packet311(packet, dest) }
        MqttPacket::Pubrec(packet) => { encode_pubrec_packet311(packet, dest) }
        MqttPacket::Pubrel(packet) => { encode_pubrel_packet311(packet, dest) }
        MqttPacket::Pubcomp(packet) => { encode_pubcomp_packet311(packet, dest) }
        MqttPacket::Subscribe(packet) => { encode_subscribe_packet311(packet, dest) }
        MqttPacket::Suback(packet) => { encode_suback_packet311(packet, dest) }
        MqttPacket::Unsubscribe(packet) => { encode_unsubscribe_packet311(packet, dest) }
        MqttPacket::Unsuback(packet) => { encode_unsuback_packet311(packet, dest) }
        MqttPacket::Pingreq(packet) => { encode_pingreq_packet(packet, dest) }
        MqttPacket::Pingresp(packet) => { encode_pingresp_packet(packet, dest) }
        MqttPacket::Disconnect(packet) => { encode_disconnect_packet311(packet, dest) }
        MqttPacket::Auth(packet) => { encode_auth_packet311(packet, dest) }
    }
}

/// Appends the complete wire encoding of a packet (fixed header, variable header, and payload) to `dest`.
///
/// On failure `dest` is left unchanged.
pub fn encode_packet(packet: &MqttPacket, protocol_version: ProtocolVersion, dest: &mut Vec<u8>) -> MqttResult<()> {
    log_packet("Encoding packet: ", packet);

    let mut encoding = Vec::new();
    match protocol_version {
        ProtocolVersion::Mqtt5 => { encode_packet5(packet, &mut encoding)?; }
        ProtocolVersion::Mqtt311 => { encode_packet311(packet, &mut encoding)?; }
    }

    dest.extend_from_slice(&encoding);

    Ok(())
}
