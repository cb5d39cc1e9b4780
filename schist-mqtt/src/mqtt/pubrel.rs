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

define_ack_packet_encoding_impl5!(encode_pubrel_packet5, PubrelPacket, PUBREL_FIRST_BYTE);
define_ack_packet_encoding_impl311!(encode_pubrel_packet311, PubrelPacket, PUBREL_FIRST_BYTE);

define_ack_packet_decode_function5!(decode_pubrel_packet5, Pubrel, PubrelPacket, "Pubrel", PUBREL_FIRST_BYTE);
define_ack_packet_decode_function311!(decode_pubrel_packet311, Pubrel, PubrelPacket, "Pubrel", PUBREL_FIRST_BYTE);

define_ack_packet_display_trait!(PubrelPacket, "PubrelPacket");
