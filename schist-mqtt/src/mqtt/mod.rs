/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing a set of structured data types that model MQTT 3.1, 3.1.1 and 5.0 control packets.

One set of packet structures serves every protocol version.  Fields that only exist in MQTT5
(properties, most reason codes) are left at their defaults when encoding or decoding with the
3.1.1 codec.
 */

use std::fmt;

use crate::error::{MqttError, MqttResult};

use log::*;

pub(crate) mod auth;
pub(crate) mod connack;
pub(crate) mod connect;
pub(crate) mod disconnect;
pub(crate) mod pingreq;
pub(crate) mod pingresp;
pub mod properties;
pub(crate) mod puback;
pub(crate) mod pubcomp;
pub(crate) mod publish;
pub(crate) mod pubrec;
pub(crate) mod pubrel;
pub(crate) mod suback;
pub(crate) mod subscribe;
pub(crate) mod unsuback;
pub(crate) mod unsubscribe;
pub mod utils;

pub use properties::{Properties, PropertyContext, PropertyKey, PropertyValue};

/// Protocol name used by MQTT 3.1.1 and MQTT5
pub const PROTOCOL_NAME_MQTT : &str = "MQTT";

/// Protocol name used by MQTT 3.1
pub const PROTOCOL_NAME_MQISDP : &str = "MQIsdp";

/// Protocol level of MQTT 3.1
pub const PROTOCOL_LEVEL_31 : u8 = 3;

/// Protocol level of MQTT 3.1.1
pub const PROTOCOL_LEVEL_311 : u8 = 4;

/// Protocol level of MQTT5
pub const PROTOCOL_LEVEL_5 : u8 = 5;

/// Selects which wire codec is used to encode and decode packets.
///
/// MQTT 3.1 and 3.1.1 share a codec; they only differ in the protocol name and level written into
/// the Connect packet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ProtocolVersion {

    /// MQTT 3.1 (protocol level 3) and MQTT 3.1.1 (protocol level 4)
    #[default]
    Mqtt311,

    /// MQTT 5.0 (protocol level 5)
    Mqtt5,
}

impl ProtocolVersion {

    /// Maps a Connect protocol level onto the codec that handles it
    pub fn from_protocol_level(level: u8) -> MqttResult<ProtocolVersion> {
        match level {
            PROTOCOL_LEVEL_31 | PROTOCOL_LEVEL_311 => { Ok(ProtocolVersion::Mqtt311) }
            PROTOCOL_LEVEL_5 => { Ok(ProtocolVersion::Mqtt5) }
            _ => {
                error!("ProtocolVersion - unsupported protocol level {}", level);
                Err(MqttError::new_invalid_option(format!("unsupported protocol level {}", level)))
            }
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::Mqtt311 => { write!(f, "Mqtt311") }
            ProtocolVersion::Mqtt5 => { write!(f, "Mqtt5") }
        }
    }
}

/// MQTT message delivery quality of service.
///
/// Enum values match [MQTT5 spec](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901234) encoding values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum QualityOfService {

    /// The message is delivered according to the capabilities of the underlying network. No response is sent by the
    /// receiver and no retry is performed by the sender. The message arrives at the receiver either once or not at all.
    #[default]
    AtMostOnce = 0,

    /// A level of service that ensures that the message arrives at the receiver at least once.
    AtLeastOnce = 1,

    /// A level of service that ensures that the message arrives at the receiver exactly once.
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QualityOfService {
    type Error = MqttError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        utils::convert_u8_to_quality_of_service(value)
    }
}

impl fmt::Display for QualityOfService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityOfService::AtMostOnce => { write!(f, "AtMostOnce") }
            QualityOfService::AtLeastOnce => { write!(f, "AtLeastOnce") }
            QualityOfService::ExactlyOnce => { write!(f, "ExactlyOnce") }
        }
    }
}

/// Configures how retained messages should be handled when subscribing with a topic filter that matches topics with
/// associated retained messages.  MQTT5 only.
///
/// Enum values match [MQTT5 spec](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901169) encoding values.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum RetainHandlingType {

    /// The server should always send all retained messages on topics that match a subscription's filter.
    #[default]
    SendOnSubscribe = 0,

    /// The server should send retained messages on topics that match the subscription's filter, but only for the
    /// first matching subscription, per session.
    SendOnSubscribeIfNew = 1,

    /// Subscriptions must not trigger any retained message publishes from the server.
    DontSend = 2,
}

impl fmt::Display for RetainHandlingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetainHandlingType::SendOnSubscribe => { write!(f, "SendOnSubscribe") }
            RetainHandlingType::SendOnSubscribeIfNew => { write!(f, "SendOnSubscribeIfNew") }
            RetainHandlingType::DontSend => { write!(f, "DontSend") }
        }
    }
}

/// A user property is a name-value pair of utf-8 strings that can be added to mqtt5 packets. Names are
/// not unique; a given name value can appear more than once in a packet.
///
/// See [MQTT5 User Property](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901013).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserProperty {

    /// User property name
    pub name: String,

    /// User property value
    pub value: String,
}

impl UserProperty {

    /// Creates a new user property from a name and a value
    pub fn new(name: &str, value: &str) -> Self {
        UserProperty {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Specifies a single subscription within a Subscribe operation
///
/// The no_local, retain_as_published and retain_handling_type options are only encoded by the
/// MQTT5 codec.
///
/// See [MQTT5 Subscription Options](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901169)
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Subscription {
    pub(crate) topic_filter: String,
    pub(crate) qos: QualityOfService,
    pub(crate) no_local: bool,
    pub(crate) retain_as_published: bool,
    pub(crate) retain_handling_type: RetainHandlingType,
}

impl Subscription {

    /// Creates a new builder for a Subscription
    pub fn builder(topic_filter: &str, qos: QualityOfService) -> SubscriptionBuilder {
        SubscriptionBuilder::new(topic_filter, qos)
    }

    /// Creates a subscription with default options
    pub fn new(topic_filter: &str, qos: QualityOfService) -> Self {
        SubscriptionBuilder::new(topic_filter, qos).build()
    }

    /// Returns the topic filter to subscribe to
    pub fn topic_filter(&self) -> &str { self.topic_filter.as_str() }

    /// Returns the maximum QoS on which the subscriber will accept publish messages.
    pub fn qos(&self) -> QualityOfService { self.qos }

    /// Returns if the server should not send publishes to a client when that client was the one who sent the publish
    pub fn no_local(&self) -> bool { self.no_local }

    /// Returns if messages sent due to this subscription should keep the retain flag preserved on the message
    pub fn retain_as_published(&self) -> bool { self.retain_as_published }

    /// Returns if retained messages on matching topics should be sent in reaction to this subscription
    pub fn retain_handling_type(&self) -> RetainHandlingType { self.retain_handling_type }

    pub(crate) fn options_byte(&self) -> u8 {
        let mut options = self.qos as u8;
        if self.no_local {
            options |= utils::SUBSCRIPTION_OPTIONS_NO_LOCAL_MASK;
        }
        if self.retain_as_published {
            options |= utils::SUBSCRIPTION_OPTIONS_RETAIN_AS_PUBLISHED_MASK;
        }
        options |= (self.retain_handling_type as u8) << utils::SUBSCRIPTION_OPTIONS_RETAIN_HANDLING_SHIFT;

        options
    }
}

/// Builder type for Subscription instances
pub struct SubscriptionBuilder {
    subscription: Subscription
}

impl SubscriptionBuilder {

    /// Creates a new builder for a subscription to a topic filter at a maximum quality of service
    pub fn new(topic_filter: &str, qos: QualityOfService) -> Self {
        SubscriptionBuilder {
            subscription: Subscription {
                topic_filter: topic_filter.to_string(),
                qos,
                ..Default::default()
            }
        }
    }

    /// Sets if the server should not send publishes to a client when that client was the one who sent the publish
    pub fn with_no_local(mut self, no_local: bool) -> Self {
        self.subscription.no_local = no_local;
        self
    }

    /// Sets if messages sent due to this subscription should keep the retain flag preserved on the message
    pub fn with_retain_as_published(mut self, retain_as_published: bool) -> Self {
        self.subscription.retain_as_published = retain_as_published;
        self
    }

    /// Sets if retained messages on matching topics should be sent in reaction to this subscription
    pub fn with_retain_handling_type(mut self, retain_handling_type: RetainHandlingType) -> Self {
        self.subscription.retain_handling_type = retain_handling_type;
        self
    }

    /// Builds a new Subscription.  Consumes the builder in the process.
    pub fn build(self) -> Subscription {
        self.subscription
    }
}

/// A message the broker publishes on the client's behalf if the connection is lost without a
/// Disconnect.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Will {

    /// Topic the will message is published to.  Must not be empty.
    pub topic: String,

    /// Will message payload
    pub payload: Vec<u8>,

    /// Quality of service the will message is published with
    pub qos: QualityOfService,

    /// Whether the will message is retained
    pub retain: bool,

    /// MQTT5 will properties
    pub properties: Properties,
}

/// Data model of an [MQTT5 AUTH](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901217) packet.
/// Does not exist in MQTT 3.1.1.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AuthPacket {

    /// Authenticate reason code
    pub reason_code: u8,

    /// Auth properties
    pub properties: Properties,
}

/// Data model of a [CONNACK](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901074) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnackPacket {

    /// True if the client rejoined an existing session on the server, false otherwise.
    pub session_present: bool,

    /// Indicates either success or the reason for failure for the connection attempt.  MQTT 3.1.1
    /// uses codes 0 to 5, MQTT5 uses 0 and codes from 128 up.
    pub reason_code: u8,

    /// Connack properties
    pub properties: Properties,
}

/// Data model of a [CONNECT](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901033) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectPacket {

    /// "MQTT" or "MQIsdp"
    pub protocol_name: String,

    /// 3, 4 or 5
    pub protocol_level: u8,

    /// Clean session (MQTT 3) or clean start (MQTT5) flag
    pub clean_session: bool,

    /// Maximum time interval, in seconds, that is permitted to elapse between the point at which the client
    /// finishes transmitting one MQTT packet and the point it starts sending the next.  Zero disables keep alive.
    pub keep_alive_interval_seconds: u16,

    /// Unique string identifying the client to the server.
    pub client_id: String,

    /// Optional will message
    pub will: Option<Will>,

    /// Optional username
    pub username: Option<String>,

    /// Optional password
    pub password: Option<Vec<u8>>,

    /// Connect properties
    pub properties: Properties,
}

/// Data model of a [DISCONNECT](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901205) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DisconnectPacket {

    /// MQTT5 disconnect reason code.  Always zero under MQTT 3.1.1.
    pub reason_code: u8,

    /// Disconnect properties
    pub properties: Properties,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PingreqPacket {}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PingrespPacket {}

/// Data model of a [PUBACK](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901121) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PubackPacket {

    /// Id of the QoS 1 publish this packet is acknowledging
    pub packet_id: u16,

    /// MQTT5 reason code
    pub reason_code: u8,

    /// Ack properties
    pub properties: Properties,
}

/// Data model of a [PUBCOMP](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901151) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PubcompPacket {

    /// Id of the QoS 2 publish this packet corresponds to
    pub packet_id: u16,

    /// MQTT5 reason code
    pub reason_code: u8,

    /// Ack properties
    pub properties: Properties,
}

/// Data model of a [PUBLISH](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901100) packet
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PublishPacket {

    /// The topic associated with this publish.  May be empty under MQTT5 when a topic alias
    /// property is present.
    pub topic: String,

    /// Packet id of the publish.  Zero (absent) for QoS 0.
    pub packet_id: u16,

    /// Sent publishes - The QoS of this publish
    ///
    /// Received publishes - The QoS the message was delivered at
    pub qos: QualityOfService,

    /// True if this is a retransmission of a previously-sent publish
    pub duplicate: bool,

    /// True if this is a retained message
    pub retain: bool,

    /// The payload of the publish message.
    pub payload: Vec<u8>,

    /// Publish properties
    pub properties: Properties,
}

/// Data model of a [PUBREC](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901131) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PubrecPacket {

    /// Id of the QoS 2 publish this packet corresponds to
    pub packet_id: u16,

    /// MQTT5 reason code
    pub reason_code: u8,

    /// Ack properties
    pub properties: Properties,
}

/// Data model of a [PUBREL](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901141) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PubrelPacket {

    /// Id of the QoS 2 publish this packet corresponds to
    pub packet_id: u16,

    /// MQTT5 reason code
    pub reason_code: u8,

    /// Ack properties
    pub properties: Properties,
}

/// Data model of a [SUBACK](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901171) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubackPacket {

    /// Id of the subscribe this packet is acknowledging
    pub packet_id: u16,

    /// One granted QoS or failure code per requested subscription, in the same order
    pub reason_codes: Vec<u8>,

    /// Ack properties
    pub properties: Properties,
}

/// Data model of a [SUBSCRIBE](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901161) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubscribePacket {

    /// Packet id of the subscribe
    pub packet_id: u16,

    /// List of topic filter subscriptions that the client wishes to listen to
    pub subscriptions: Vec<Subscription>,

    /// Subscribe properties
    pub properties: Properties,
}

/// Data model of an [UNSUBACK](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901187) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UnsubackPacket {

    /// Id of the unsubscribe this packet is acknowledging
    pub packet_id: u16,

    /// MQTT5 per-topic reason codes.  Always empty under MQTT 3.1.1.
    pub reason_codes: Vec<u8>,

    /// Ack properties
    pub properties: Properties,
}

/// Data model of an [UNSUBSCRIBE](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901179) packet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UnsubscribePacket {

    /// Packet id of the unsubscribe
    pub packet_id: u16,

    /// List of topic filters that the client wishes to unsubscribe from.
    pub topic_filters: Vec<String>,

    /// Unsubscribe properties
    pub properties: Properties,
}

/// Tagged union over the fifteen MQTT control packet kinds
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MqttPacket {
    Connect(ConnectPacket),
    Connack(ConnackPacket),
    Publish(PublishPacket),
    Puback(PubackPacket),
    Pubrec(PubrecPacket),
    Pubrel(PubrelPacket),
    Pubcomp(PubcompPacket),
    Subscribe(SubscribePacket),
    Suback(SubackPacket),
    Unsubscribe(UnsubscribePacket),
    Unsuback(UnsubackPacket),
    Pingreq(PingreqPacket),
    Pingresp(PingrespPacket),
    Disconnect(DisconnectPacket),
    Auth(AuthPacket),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// An enum indicating the kind of MQTT packet
pub enum PacketType {
    /// A [Connect](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901033) packet
    Connect,

    /// A [Connack](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901074) packet
    Connack,

    /// A [Publish](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901100) packet
    Publish,

    /// A [Puback](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901121) packet
    Puback,

    /// A [Pubrec](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901131) packet
    Pubrec,

    /// A [Pubrel](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901141) packet
    Pubrel,

    /// A [Pubcomp](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901151) packet
    Pubcomp,

    /// A [Subscribe](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901161) packet
    Subscribe,

    /// A [Suback](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901171) packet
    Suback,

    /// An [Unsubscribe](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901179) packet
    Unsubscribe,

    /// An [Unsuback](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901187) packet
    Unsuback,

    /// A [Pingreq](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901195) packet
    Pingreq,

    /// A [Pingresp](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901200) packet
    Pingresp,

    /// A [Disconnect](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901205) packet
    Disconnect,

    /// An [Auth](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901217) packet
    Auth,
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketType::Connect => { write!(f, "ConnectPacket") }
            PacketType::Connack => { write!(f, "ConnackPacket") }
            PacketType::Publish => { write!(f, "PublishPacket") }
            PacketType::Puback => { write!(f, "PubackPacket") }
            PacketType::Pubrec => { write!(f, "PubrecPacket") }
            PacketType::Pubrel => { write!(f, "PubrelPacket") }
            PacketType::Pubcomp => { write!(f, "PubcompPacket") }
            PacketType::Subscribe => { write!(f, "SubscribePacket") }
            PacketType::Suback => { write!(f, "SubackPacket") }
            PacketType::Unsubscribe => { write!(f, "UnsubscribePacket") }
            PacketType::Unsuback => { write!(f, "UnsubackPacket") }
            PacketType::Pingreq => { write!(f, "PingreqPacket") }
            PacketType::Pingresp => { write!(f, "PingrespPacket") }
            PacketType::Disconnect => { write!(f, "DisconnectPacket") }
            PacketType::Auth => { write!(f, "AuthPacket") }
        }
    }
}
