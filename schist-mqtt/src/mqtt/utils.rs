/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

//! Wire constants shared by the per-packet codecs, plus small packet-kind conversions.

use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;

use log::*;

pub(crate) const PACKET_TYPE_CONNECT: u8 = 1;
pub(crate) const PACKET_TYPE_CONNACK: u8 = 2;
pub(crate) const PACKET_TYPE_PUBLISH: u8 = 3;
pub(crate) const PACKET_TYPE_PUBACK: u8 = 4;
pub(crate) const PACKET_TYPE_PUBREC: u8 = 5;
pub(crate) const PACKET_TYPE_PUBREL: u8 = 6;
pub(crate) const PACKET_TYPE_PUBCOMP: u8 = 7;
pub(crate) const PACKET_TYPE_SUBSCRIBE: u8 = 8;
pub(crate) const PACKET_TYPE_SUBACK: u8 = 9;
pub(crate) const PACKET_TYPE_UNSUBSCRIBE: u8 = 10;
pub(crate) const PACKET_TYPE_UNSUBACK: u8 = 11;
pub(crate) const PACKET_TYPE_PINGREQ: u8 = 12;
pub(crate) const PACKET_TYPE_PINGRESP: u8 = 13;
pub(crate) const PACKET_TYPE_DISCONNECT: u8 = 14;
pub(crate) const PACKET_TYPE_AUTH: u8 = 15;

pub(crate) const PUBLISH_PACKET_FIXED_HEADER_DUPLICATE_FLAG : u8 = 8;
pub(crate) const PUBLISH_PACKET_FIXED_HEADER_RETAIN_FLAG : u8 = 1;
pub(crate) const PUBLISH_PACKET_FIXED_HEADER_QOS_SHIFT : u8 = 1;
pub(crate) const QOS_MASK : u8 = 3;

pub(crate) const CONNECT_PACKET_CLEAN_SESSION_FLAG_MASK : u8 = 1 << 1;
pub(crate) const CONNECT_PACKET_HAS_WILL_FLAG_MASK : u8 = 1 << 2;
pub(crate) const CONNECT_PACKET_WILL_QOS_FLAG_SHIFT : u8 = 3;
pub(crate) const CONNECT_PACKET_WILL_RETAIN_FLAG_MASK : u8 = 1 << 5;
pub(crate) const CONNECT_PACKET_HAS_PASSWORD_FLAG_MASK : u8 = 1 << 6;
pub(crate) const CONNECT_PACKET_HAS_USERNAME_FLAG_MASK : u8 = 1 << 7;
pub(crate) const CONNECT_PACKET_RESERVED_FLAG_MASK : u8 = 1;

pub(crate) const CONNACK_PACKET_SESSION_PRESENT_FLAG_MASK : u8 = 1;

pub(crate) const CONNECT_FIRST_BYTE : u8 = PACKET_TYPE_CONNECT << 4;
pub(crate) const CONNACK_FIRST_BYTE : u8 = PACKET_TYPE_CONNACK << 4;
pub(crate) const PUBACK_FIRST_BYTE : u8 = PACKET_TYPE_PUBACK << 4;
pub(crate) const PUBREC_FIRST_BYTE : u8 = PACKET_TYPE_PUBREC << 4;
pub(crate) const PUBREL_FIRST_BYTE : u8 = (PACKET_TYPE_PUBREL << 4) | (0x02u8);
pub(crate) const PUBCOMP_FIRST_BYTE : u8 = PACKET_TYPE_PUBCOMP << 4;
pub(crate) const SUBSCRIBE_FIRST_BYTE : u8 = (PACKET_TYPE_SUBSCRIBE << 4) | (0x02u8);
pub(crate) const SUBACK_FIRST_BYTE : u8 = PACKET_TYPE_SUBACK << 4;
pub(crate) const UNSUBSCRIBE_FIRST_BYTE : u8 = (PACKET_TYPE_UNSUBSCRIBE << 4) | (0x02u8);
pub(crate) const UNSUBACK_FIRST_BYTE : u8 = PACKET_TYPE_UNSUBACK << 4;
pub(crate) const PINGREQ_FIRST_BYTE : u8 = PACKET_TYPE_PINGREQ << 4;
pub(crate) const PINGRESP_FIRST_BYTE : u8 = PACKET_TYPE_PINGRESP << 4;
pub(crate) const DISCONNECT_FIRST_BYTE : u8 = PACKET_TYPE_DISCONNECT << 4;
pub(crate) const AUTH_FIRST_BYTE : u8 = PACKET_TYPE_AUTH << 4;

pub(crate) const SUBSCRIPTION_OPTIONS_QOS_MASK : u8 = 3;
pub(crate) const SUBSCRIPTION_OPTIONS_NO_LOCAL_MASK : u8 = 1u8 << 2;
pub(crate) const SUBSCRIPTION_OPTIONS_RETAIN_AS_PUBLISHED_MASK : u8 = 1u8 << 3;
pub(crate) const SUBSCRIPTION_OPTIONS_RETAIN_HANDLING_SHIFT : u8 = 4;

/// Converts a raw quality of service value into the corresponding enum
pub fn convert_u8_to_quality_of_service(value: u8) -> MqttResult<QualityOfService> {
    match value {
        0 => { Ok(QualityOfService::AtMostOnce) }
        1 => { Ok(QualityOfService::AtLeastOnce) }
        2 => { Ok(QualityOfService::ExactlyOnce) }
        _ => {
            error!("QualityOfService conversion - invalid value {}", value);
            Err(MqttError::new_invalid_qos(format!("{} is not a valid quality of service", value)))
        }
    }
}

pub(crate) fn convert_u8_to_retain_handling_type(value: u8) -> MqttResult<RetainHandlingType> {
    match value {
        0 => { Ok(RetainHandlingType::SendOnSubscribe) }
        1 => { Ok(RetainHandlingType::SendOnSubscribeIfNew) }
        2 => { Ok(RetainHandlingType::DontSend) }
        _ => {
            error!("Packet Decode - invalid retain handling value {}", value);
            Err(MqttError::new_malformed_packet(format!("{} is not a valid retain handling type", value)))
        }
    }
}

pub(crate) fn mqtt_packet_to_packet_type(packet: &MqttPacket) -> PacketType {
    match packet {
        MqttPacket::Connect(_) => { PacketType::Connect }
        MqttPacket::Connack(_) => { PacketType::Connack }
        MqttPacket::Publish(_) => { PacketType::Publish}
        MqttPacket::Puback(_) => { PacketType::Puback }
        MqttPacket::Pubrec(_) => { PacketType::Pubrec }
        MqttPacket::Pubrel(_) => { PacketType::Pubrel }
        MqttPacket::Pubcomp(_) => { PacketType::Pubcomp }
        MqttPacket::Subscribe(_) => { PacketType::Subscribe }
        MqttPacket::Suback(_) => { PacketType::Suback }
        MqttPacket::Unsubscribe(_) => { PacketType::Unsubscribe }
        MqttPacket::Unsuback(_) => { PacketType::Unsuback }
        MqttPacket::Pingreq(_) => { PacketType::Pingreq }
        MqttPacket::Pingresp(_) => { PacketType::Pingresp }
        MqttPacket::Disconnect(_) => { PacketType::Disconnect }
        MqttPacket::Auth(_) => { PacketType::Auth }
    }
}

pub(crate) fn packet_type_to_str(packet_type: u8) -> &'static str {
    match packet_type {
        PACKET_TYPE_CONNECT => { "Connect" }
        PACKET_TYPE_CONNACK => { "Connack" }
        PACKET_TYPE_PUBLISH => { "Publish" }
        PACKET_TYPE_PUBACK => { "Puback" }
        PACKET_TYPE_PUBREC => { "Pubrec" }
        PACKET_TYPE_PUBREL => { "Pubrel" }
        PACKET_TYPE_PUBCOMP => { "Pubcomp" }
        PACKET_TYPE_SUBSCRIBE => { "Subscribe" }
        PACKET_TYPE_SUBACK => { "Suback" }
        PACKET_TYPE_UNSUBSCRIBE => { "Unsubscribe" }
        PACKET_TYPE_UNSUBACK => { "Unsuback" }
        PACKET_TYPE_PINGREQ => { "Pingreq" }
        PACKET_TYPE_PINGRESP => { "Pingresp" }
        PACKET_TYPE_DISCONNECT => { "Disconnect" }
        PACKET_TYPE_AUTH => { "Auth" }
        _ => {
            "Unknown"
        }
    }
}
