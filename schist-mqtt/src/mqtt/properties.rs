/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
MQTT5 property support: the property key table, typed property values, the per-packet legal key
sets, and packing/unpacking of length-prefixed property blocks.
 */

use std::fmt;

use crate::decode::utils::*;
use crate::encode::utils::*;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::UserProperty;

use log::*;

pub(crate) const PROPERTY_KEY_USER_PROPERTY: u8 = 38;

/// The wire representation of a property value
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PropertyType {

    /// Single byte
    Byte,

    /// Big-endian two byte integer
    U16,

    /// Big-endian four byte integer
    U32,

    /// Variable length integer
    VarInt,

    /// Length-prefixed utf-8 string
    String,

    /// Length-prefixed binary data
    Binary,
}

/// Identifies a single-valued MQTT5 property.  User properties (id 0x26) are multi-valued and
/// stored separately, see [`Properties::add_user_property`].
///
/// Enum values match the [MQTT5 property identifiers](https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901029).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PropertyKey {
    PayloadFormatIndicator = 1,
    MessageExpiryInterval = 2,
    ContentType = 3,
    ResponseTopic = 8,
    CorrelationData = 9,
    SubscriptionIdentifier = 11,
    SessionExpiryInterval = 17,
    AssignedClientIdentifier = 18,
    ServerKeepAlive = 19,
    AuthenticationMethod = 21,
    AuthenticationData = 22,
    RequestProblemInformation = 23,
    WillDelayInterval = 24,
    RequestResponseInformation = 25,
    ResponseInformation = 26,
    ServerReference = 28,
    ReasonString = 31,
    ReceiveMaximum = 33,
    TopicAliasMaximum = 34,
    TopicAlias = 35,
    MaximumQos = 36,
    RetainAvailable = 37,
    MaximumPacketSize = 39,
    WildcardSubscriptionAvailable = 40,
    SubscriptionIdentifierAvailable = 41,
    SharedSubscriptionAvailable = 42,
}

impl PropertyKey {

    /// Returns how values of this property are represented on the wire
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyKey::PayloadFormatIndicator
            | PropertyKey::RequestProblemInformation
            | PropertyKey::RequestResponseInformation
            | PropertyKey::MaximumQos
            | PropertyKey::RetainAvailable
            | PropertyKey::WildcardSubscriptionAvailable
            | PropertyKey::SubscriptionIdentifierAvailable
            | PropertyKey::SharedSubscriptionAvailable => { PropertyType::Byte }
            PropertyKey::ServerKeepAlive
            | PropertyKey::ReceiveMaximum
            | PropertyKey::TopicAliasMaximum
            | PropertyKey::TopicAlias => { PropertyType::U16 }
            PropertyKey::MessageExpiryInterval
            | PropertyKey::SessionExpiryInterval
            | PropertyKey::WillDelayInterval
            | PropertyKey::MaximumPacketSize => { PropertyType::U32 }
            PropertyKey::SubscriptionIdentifier => { PropertyType::VarInt }
            PropertyKey::ContentType
            | PropertyKey::ResponseTopic
            | PropertyKey::AssignedClientIdentifier
            | PropertyKey::AuthenticationMethod
            | PropertyKey::ResponseInformation
            | PropertyKey::ServerReference
            | PropertyKey::ReasonString => { PropertyType::String }
            PropertyKey::CorrelationData
            | PropertyKey::AuthenticationData => { PropertyType::Binary }
        }
    }

    /// Returns the snake_case name of the property
    pub fn name(&self) -> &'static str {
        match self {
            PropertyKey::PayloadFormatIndicator => { "payload_format_indicator" }
            PropertyKey::MessageExpiryInterval => { "message_expiry_interval" }
            PropertyKey::ContentType => { "content_type" }
            PropertyKey::ResponseTopic => { "response_topic" }
            PropertyKey::CorrelationData => { "correlation_data" }
            PropertyKey::SubscriptionIdentifier => { "subscription_identifier" }
            PropertyKey::SessionExpiryInterval => { "session_expiry_interval" }
            PropertyKey::AssignedClientIdentifier => { "assigned_client_identifier" }
            PropertyKey::ServerKeepAlive => { "server_keep_alive" }
            PropertyKey::AuthenticationMethod => { "authentication_method" }
            PropertyKey::AuthenticationData => { "authentication_data" }
            PropertyKey::RequestProblemInformation => { "request_problem_information" }
            PropertyKey::WillDelayInterval => { "will_delay_interval" }
            PropertyKey::RequestResponseInformation => { "request_response_information" }
            PropertyKey::ResponseInformation => { "response_information" }
            PropertyKey::ServerReference => { "server_reference" }
            PropertyKey::ReasonString => { "reason_string" }
            PropertyKey::ReceiveMaximum => { "receive_maximum" }
            PropertyKey::TopicAliasMaximum => { "topic_alias_maximum" }
            PropertyKey::TopicAlias => { "topic_alias" }
            PropertyKey::MaximumQos => { "maximum_qos" }
            PropertyKey::RetainAvailable => { "retain_available" }
            PropertyKey::MaximumPacketSize => { "maximum_packet_size" }
            PropertyKey::WildcardSubscriptionAvailable => { "wildcard_subscription_available" }
            PropertyKey::SubscriptionIdentifierAvailable => { "subscription_identifier_available" }
            PropertyKey::SharedSubscriptionAvailable => { "shared_subscription_available" }
        }
    }
}

impl TryFrom<u8> for PropertyKey {
    type Error = MqttError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => { Ok(PropertyKey::PayloadFormatIndicator) }
            2 => { Ok(PropertyKey::MessageExpiryInterval) }
            3 => { Ok(PropertyKey::ContentType) }
            8 => { Ok(PropertyKey::ResponseTopic) }
            9 => { Ok(PropertyKey::CorrelationData) }
            11 => { Ok(PropertyKey::SubscriptionIdentifier) }
            17 => { Ok(PropertyKey::SessionExpiryInterval) }
            18 => { Ok(PropertyKey::AssignedClientIdentifier) }
            19 => { Ok(PropertyKey::ServerKeepAlive) }
            21 => { Ok(PropertyKey::AuthenticationMethod) }
            22 => { Ok(PropertyKey::AuthenticationData) }
            23 => { Ok(PropertyKey::RequestProblemInformation) }
            24 => { Ok(PropertyKey::WillDelayInterval) }
            25 => { Ok(PropertyKey::RequestResponseInformation) }
            26 => { Ok(PropertyKey::ResponseInformation) }
            28 => { Ok(PropertyKey::ServerReference) }
            31 => { Ok(PropertyKey::ReasonString) }
            33 => { Ok(PropertyKey::ReceiveMaximum) }
            34 => { Ok(PropertyKey::TopicAliasMaximum) }
            35 => { Ok(PropertyKey::TopicAlias) }
            36 => { Ok(PropertyKey::MaximumQos) }
            37 => { Ok(PropertyKey::RetainAvailable) }
            39 => { Ok(PropertyKey::MaximumPacketSize) }
            40 => { Ok(PropertyKey::WildcardSubscriptionAvailable) }
            41 => { Ok(PropertyKey::SubscriptionIdentifierAvailable) }
            42 => { Ok(PropertyKey::SharedSubscriptionAvailable) }
            _ => { Err(MqttError::new_unknown_property(value)) }
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A typed MQTT5 property value
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PropertyValue {
    Byte(u8),
    U16(u16),
    U32(u32),
    VarInt(u32),
    String(String),
    Binary(Vec<u8>),
}

impl PropertyValue {
    fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Byte(_) => { PropertyType::Byte }
            PropertyValue::U16(_) => { PropertyType::U16 }
            PropertyValue::U32(_) => { PropertyType::U32 }
            PropertyValue::VarInt(_) => { PropertyType::VarInt }
            PropertyValue::String(_) => { PropertyType::String }
            PropertyValue::Binary(_) => { PropertyType::Binary }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Byte(value) => { write!(f, "{}", value) }
            PropertyValue::U16(value) => { write!(f, "{}", value) }
            PropertyValue::U32(value) => { write!(f, "{}", value) }
            PropertyValue::VarInt(value) => { write!(f, "{}", value) }
            PropertyValue::String(value) => { write!(f, "{}", value) }
            PropertyValue::Binary(value) => { write!(f, "{}", String::from_utf8_lossy(value)) }
        }
    }
}

/// Selects the set of properties that may legally appear in a property block
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PropertyContext {
    Connect,
    Will,
    Connack,
    Publish,

    /// Puback, Pubrec, Pubrel, Pubcomp, Suback and Unsuback
    Ack,
    Subscribe,
    Unsubscribe,
    Disconnect,
    Auth,
}

impl PropertyContext {

    /// Returns true if the key may appear in a property block of this context
    pub fn allows(&self, key: PropertyKey) -> bool {
        use PropertyKey::*;

        match self {
            PropertyContext::Connect => {
                matches!(key, SessionExpiryInterval | AuthenticationMethod | AuthenticationData
                    | RequestProblemInformation | RequestResponseInformation | ReceiveMaximum
                    | TopicAliasMaximum | MaximumPacketSize)
            }
            PropertyContext::Will => {
                matches!(key, PayloadFormatIndicator | MessageExpiryInterval | ContentType
                    | ResponseTopic | CorrelationData | WillDelayInterval)
            }
            PropertyContext::Connack => {
                matches!(key, SessionExpiryInterval | AssignedClientIdentifier | ServerKeepAlive
                    | AuthenticationMethod | AuthenticationData | ResponseInformation | ServerReference
                    | ReasonString | ReceiveMaximum | TopicAliasMaximum | MaximumQos | RetainAvailable
                    | MaximumPacketSize | WildcardSubscriptionAvailable | SubscriptionIdentifierAvailable
                    | SharedSubscriptionAvailable)
            }
            PropertyContext::Publish => {
                matches!(key, PayloadFormatIndicator | MessageExpiryInterval | ContentType
                    | ResponseTopic | CorrelationData | SubscriptionIdentifier | TopicAlias)
            }
            PropertyContext::Ack => {
                matches!(key, ReasonString)
            }
            PropertyContext::Subscribe => {
                matches!(key, SubscriptionIdentifier)
            }
            PropertyContext::Unsubscribe => {
                false
            }
            PropertyContext::Disconnect => {
                matches!(key, SessionExpiryInterval | ServerReference | ReasonString)
            }
            PropertyContext::Auth => {
                matches!(key, AuthenticationMethod | AuthenticationData | ReasonString)
            }
        }
    }
}

/// An MQTT5 property map: single-valued properties in insertion order, plus the multi-valued
/// user properties.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Properties {
    entries: Vec<(PropertyKey, PropertyValue)>,
    user_properties: Vec<UserProperty>,
}

impl Properties {

    /// Creates an empty property map
    pub fn new() -> Self {
        Properties::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: PropertyKey, value: PropertyValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style user property append
    pub fn with_user_property(mut self, name: &str, value: &str) -> Self {
        self.add_user_property(name, value);
        self
    }

    /// Sets a property.  An existing value for the key is replaced in place and returned.
    pub fn insert(&mut self, key: PropertyKey, value: PropertyValue) -> Option<PropertyValue> {
        if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            return Some(std::mem::replace(&mut entry.1, value));
        }

        self.entries.push((key, value));
        None
    }

    /// Returns the value of a property, if set
    pub fn get(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.entries.iter().find(|(existing, _)| *existing == key).map(|(_, value)| value)
    }

    /// Returns true if the property is set
    pub fn contains(&self, key: PropertyKey) -> bool {
        self.get(key).is_some()
    }

    /// Removes a property, returning its value
    pub fn remove(&mut self, key: PropertyKey) -> Option<PropertyValue> {
        let index = self.entries.iter().position(|(existing, _)| *existing == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Appends a user property.  Names do not need to be unique.
    pub fn add_user_property(&mut self, name: &str, value: &str) {
        self.user_properties.push(UserProperty::new(name, value));
    }

    /// Iterates the single-valued properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(PropertyKey, PropertyValue)> {
        self.entries.iter()
    }

    /// Returns the user properties
    pub fn user_properties(&self) -> &[UserProperty] {
        self.user_properties.as_slice()
    }

    /// Returns true if there are no properties of either kind
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.user_properties.is_empty()
    }

    /// Removes all properties
    pub fn clear(&mut self) {
        self.entries.clear();
        self.user_properties.clear();
    }

    /// Adds every property of `other` whose key is not already present.  Existing values win.
    /// User properties are taken from `other` only when this map has none.
    pub fn merge_missing(&mut self, other: &Properties) {
        for (key, value) in other.entries.iter() {
            if !self.contains(*key) {
                self.entries.push((*key, value.clone()));
            }
        }

        if self.user_properties.is_empty() {
            self.user_properties = other.user_properties.clone();
        }
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (key, value) in self.entries.iter() {
            write!(f, " {}:{}", key, value)?;
        }
        for property in self.user_properties.iter() {
            write!(f, " {}", property)?;
        }
        write!(f, " }}")
    }
}

fn encode_property_value(key: PropertyKey, value: &PropertyValue, dest: &mut Vec<u8>) -> MqttResult<()> {
    if key.property_type() != value.property_type() {
        error!("Packet Encode - property {} does not accept a {:?} value", key, value.property_type());
        return Err(MqttError::new_encoding_failure(format!("property {} has a value of the wrong type", key)));
    }

    encode_u8(key as u8, dest);
    match value {
        PropertyValue::Byte(val) => { encode_u8(*val, dest); }
        PropertyValue::U16(val) => { encode_u16(*val, dest); }
        PropertyValue::U32(val) => { encode_u32(*val, dest); }
        PropertyValue::VarInt(val) => { encode_vli(*val, dest)?; }
        PropertyValue::String(val) => { encode_length_prefixed_string(val, dest)?; }
        PropertyValue::Binary(val) => { encode_length_prefixed_bytes(val, dest)?; }
    }

    Ok(())
}

fn encode_user_property(name: &str, value: &str, dest: &mut Vec<u8>) -> MqttResult<()> {
    encode_u8(PROPERTY_KEY_USER_PROPERTY, dest);
    encode_length_prefixed_string(name, dest)?;
    encode_length_prefixed_string(value, dest)
}

/// Writes a complete property block (vli length followed by the properties).
///
/// Properties that are not legal in the context are written as user properties instead.
pub(crate) fn encode_properties(properties: &Properties, context: PropertyContext, dest: &mut Vec<u8>) -> MqttResult<()> {
    let mut block = Vec::new();

    for (key, value) in properties.entries.iter() {
        if context.allows(*key) {
            encode_property_value(*key, value, &mut block)?;
        } else {
            warn!("Packet Encode - property {} is not valid in a {:?} property block, sending as a user property", key, context);
            encode_user_property(key.name(), &value.to_string(), &mut block)?;
        }
    }

    for property in properties.user_properties.iter() {
        encode_user_property(&property.name, &property.value, &mut block)?;
    }

    encode_vli(block.len() as u32, dest)?;
    dest.extend_from_slice(&block);

    Ok(())
}

fn decode_property_value<'a>(bytes: &'a[u8], key: PropertyKey, value: &mut PropertyValue) -> MqttResult<&'a[u8]> {
    match key.property_type() {
        PropertyType::Byte => {
            let mut val = 0;
            let remaining = decode_u8(bytes, &mut val)?;
            *value = PropertyValue::Byte(val);
            Ok(remaining)
        }
        PropertyType::U16 => {
            let mut val = 0;
            let remaining = decode_u16(bytes, &mut val)?;
            *value = PropertyValue::U16(val);
            Ok(remaining)
        }
        PropertyType::U32 => {
            let mut val = 0;
            let remaining = decode_u32(bytes, &mut val)?;
            *value = PropertyValue::U32(val);
            Ok(remaining)
        }
        PropertyType::VarInt => {
            let mut val = 0;
            let remaining = decode_vli_into_mutable(bytes, &mut val)?;
            *value = PropertyValue::VarInt(val as u32);
            Ok(remaining)
        }
        PropertyType::String => {
            let mut val = String::new();
            let remaining = decode_length_prefixed_string(bytes, &mut val)?;
            *value = PropertyValue::String(val);
            Ok(remaining)
        }
        PropertyType::Binary => {
            let mut val = Vec::new();
            let remaining = decode_length_prefixed_bytes(bytes, &mut val)?;
            *value = PropertyValue::Binary(val);
            Ok(remaining)
        }
    }
}

/// Reads a complete property block, returning the bytes that follow it.
pub(crate) fn decode_properties<'a>(bytes: &'a[u8], context: PropertyContext, properties: &mut Properties) -> MqttResult<&'a[u8]> {
    let mut property_length : usize = 0;
    let mutable_bytes = decode_vli_into_mutable(bytes, &mut property_length)?;
    if property_length > mutable_bytes.len() {
        error!("Packet Decode - property length exceeds remaining packet length");
        return Err(MqttError::new_malformed_packet("property block length exceeds remaining packet bytes"));
    }

    let mut property_bytes = &mutable_bytes[..property_length];
    while !property_bytes.is_empty() {
        let property_id = property_bytes[0];
        property_bytes = &property_bytes[1..];

        if property_id == PROPERTY_KEY_USER_PROPERTY {
            let mut name = String::new();
            let mut value = String::new();
            property_bytes = decode_length_prefixed_string(property_bytes, &mut name)?;
            property_bytes = decode_length_prefixed_string(property_bytes, &mut value)?;
            properties.user_properties.push(UserProperty { name, value });
            continue;
        }

        let key = PropertyKey::try_from(property_id).map_err(|err| {
            error!("Packet Decode - unknown property id ({})", property_id);
            err
        })?;

        if !context.allows(key) {
            error!("Packet Decode - property {} is not valid in a {:?} property block", key, context);
            return Err(MqttError::new_unknown_property(property_id));
        }

        let mut value = PropertyValue::Byte(0);
        property_bytes = decode_property_value(property_bytes, key, &mut value)?;
        properties.insert(key, value);
    }

    Ok(&mutable_bytes[property_length..])
}
