/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
A module containing the core crate error enumeration, context structures, and the mapping from
numeric client/broker codes to error kinds.
 */

use std::error::Error;
use std::fmt;

/// Additional details about a ProtocolRefused error variant
#[derive(Debug)]
pub struct ProtocolRefusedContext {
    reason_code: u8,
    source: Box<dyn Error + Send + Sync + 'static>
}

impl ProtocolRefusedContext {

    /// Returns the refusal code the broker sent in its Connack packet
    pub fn reason_code(&self) -> u8 {
        self.reason_code
    }
}

/// Additional details about a ConnectionClosed error variant
#[derive(Debug)]
pub struct ConnectionClosedContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a ConnectionTimeout error variant
#[derive(Debug)]
pub struct ConnectionTimeoutContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a ConnectionFailed error variant
#[derive(Debug)]
pub struct ConnectionFailedContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a SendBufferFull error variant
#[derive(Debug)]
pub struct SendBufferFullContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a NotConnected error variant
#[derive(Debug)]
pub struct NotConnectedContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about an InvalidTopic error variant
#[derive(Debug)]
pub struct InvalidTopicContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about an InvalidQos error variant
#[derive(Debug)]
pub struct InvalidQosContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about a MalformedPacket error variant
#[derive(Debug)]
pub struct MalformedPacketContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about an UnknownProperty error variant
#[derive(Debug)]
pub struct UnknownPropertyContext {
    property_id: u8,
}

impl UnknownPropertyContext {

    /// Returns the unrecognized property id byte
    pub fn property_id(&self) -> u8 {
        self.property_id
    }
}

/// Additional details about an EncodingFailure error variant
#[derive(Debug)]
pub struct EncodingFailureContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about an InvalidOption error variant
#[derive(Debug)]
pub struct InvalidOptionContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Additional details about an InternalStateError error variant
#[derive(Debug)]
pub struct InternalStateErrorContext {
    source: Box<dyn Error + Send + Sync + 'static>
}

/// Basic error type for the entire schist-mqtt crate.
#[derive(Debug)]
#[non_exhaustive]
pub enum MqttError {

    /// The broker rejected the connection attempt with a non-zero Connack code.
    ProtocolRefused(ProtocolRefusedContext),

    /// The connection was closed while the operation was still waiting for its acknowledgement,
    /// or the transport reported a send failure.
    ConnectionClosed(ConnectionClosedContext),

    /// No successful Connack arrived before the connect timeout elapsed.
    ConnectionTimeout(ConnectionTimeoutContext),

    /// The transport failed to establish a connection to the broker.
    ConnectionFailed(ConnectionFailedContext),

    /// The transport's outbound buffer filled up; the connection is torn down.
    SendBufferFull(SendBufferFullContext),

    /// An operation was submitted while the session was not in the established state.
    NotConnected(NotConnectedContext),

    /// A topic or topic filter was empty, too long, or (MQTT5) empty without a topic alias.
    InvalidTopic(InvalidTopicContext),

    /// A quality of service value outside of 0, 1 and 2 was supplied.
    InvalidQos(InvalidQosContext),

    /// Error encountered while attempting to decode an MQTT packet.  Examples include bad header
    /// flags, mismatches between remaining length fields and overall packet length, truncated
    /// fields, etc...
    MalformedPacket(MalformedPacketContext),

    /// An MQTT5 property block contained a property id that is not legal for the packet kind.
    UnknownProperty(UnknownPropertyContext),

    /// Error encountered while attempting to encode an MQTT packet
    EncodingFailure(EncodingFailureContext),

    /// Client configuration was rejected at construction time.
    InvalidOption(InvalidOptionContext),

    /// Error emitted by the client when something happens that should never happen.  Always indicates
    /// a bug in the client.
    InternalStateError(InternalStateErrorContext),
}

/// Fieldless mirror of the MqttError variants
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {

    /// See [`MqttError::ProtocolRefused`]
    ProtocolRefused,

    /// See [`MqttError::ConnectionClosed`]
    ConnectionClosed,

    /// See [`MqttError::ConnectionTimeout`]
    ConnectionTimeout,

    /// See [`MqttError::ConnectionFailed`]
    ConnectionFailed,

    /// See [`MqttError::SendBufferFull`]
    SendBufferFull,

    /// See [`MqttError::NotConnected`]
    NotConnected,

    /// See [`MqttError::InvalidTopic`]
    InvalidTopic,

    /// See [`MqttError::InvalidQos`]
    InvalidQos,

    /// See [`MqttError::MalformedPacket`]
    MalformedPacket,

    /// See [`MqttError::UnknownProperty`]
    UnknownProperty,

    /// See [`MqttError::EncodingFailure`]
    EncodingFailure,

    /// See [`MqttError::InvalidOption`]
    InvalidOption,

    /// See [`MqttError::InternalStateError`]
    InternalStateError,
}

/// Client-side code for a closed connection
pub const ERROR_CODE_CONNECTION_CLOSED : u32 = 100;

/// Client-side code for a connect timeout
pub const ERROR_CODE_CONNECTION_TIMEOUT : u32 = 101;

/// Client-side code for a failed connection attempt
pub const ERROR_CODE_CONNECTION_FAILED : u32 = 102;

/// Client-side code for a full transport send buffer
pub const ERROR_CODE_SEND_BUFFER_FULL : u32 = 103;

/// Client-side code for an operation attempted while not connected
pub const ERROR_CODE_NOT_CONNECTED : u32 = 140;

/// Client-side code for an invalid topic
pub const ERROR_CODE_INVALID_TOPIC : u32 = 240;

/// Client-side code for an invalid quality of service
pub const ERROR_CODE_INVALID_QOS : u32 = 241;

/// Maps a numeric code to the error kind and message it stands for.
///
/// Codes 1 through 5 are MQTT 3.1.1 Connack refusals and codes from 128 to 255 are MQTT5 reason
/// codes.  The client-side codes (100-103, 140, 240, 241) take precedence where they overlap the
/// MQTT5 range.  Returns None for codes that have no meaning.
pub fn error_for_code(code: u32) -> Option<(ErrorKind, &'static str)> {
    match code {
        1 => { Some((ErrorKind::ProtocolRefused, "Connection Refused, unacceptable protocol version")) }
        2 => { Some((ErrorKind::ProtocolRefused, "Connection Refused, identifier rejected")) }
        3 => { Some((ErrorKind::ProtocolRefused, "Connection Refused, Server unavailable")) }
        4 => { Some((ErrorKind::ProtocolRefused, "Connection Refused, bad user name or password")) }
        5 => { Some((ErrorKind::ProtocolRefused, "Connection Refused, not authorized")) }
        ERROR_CODE_CONNECTION_CLOSED => { Some((ErrorKind::ConnectionClosed, "Connection closed")) }
        ERROR_CODE_CONNECTION_TIMEOUT => { Some((ErrorKind::ConnectionTimeout, "Connection timeout")) }
        ERROR_CODE_CONNECTION_FAILED => { Some((ErrorKind::ConnectionFailed, "Connection fail")) }
        ERROR_CODE_SEND_BUFFER_FULL => { Some((ErrorKind::SendBufferFull, "Connection buffer full and close connection")) }
        ERROR_CODE_NOT_CONNECTED => { Some((ErrorKind::NotConnected, "No connection to broker")) }
        ERROR_CODE_INVALID_TOPIC => { Some((ErrorKind::InvalidTopic, "Invalid topic")) }
        ERROR_CODE_INVALID_QOS => { Some((ErrorKind::InvalidQos, "Invalid qos")) }
        128..=255 => {
            reason_code_to_str(code as u8).map(|message| (ErrorKind::ProtocolRefused, message))
        }
        _ => { None }
    }
}

fn reason_code_to_str(code: u8) -> Option<&'static str> {
    match code {
        128 => { Some("Unspecified error") }
        129 => { Some("Malformed Packet") }
        130 => { Some("Protocol Error") }
        131 => { Some("Implementation specific error") }
        132 => { Some("Unsupported Protocol Version") }
        133 => { Some("Client Identifier not valid") }
        134 => { Some("Bad User Name or Password") }
        135 => { Some("Not authorized") }
        136 => { Some("Server unavailable") }
        137 => { Some("Server busy") }
        138 => { Some("Banned") }
        139 => { Some("Server shutting down") }
        140 => { Some("Bad authentication method") }
        141 => { Some("Keep Alive timeout") }
        142 => { Some("Session taken over") }
        143 => { Some("Topic Filter invalid") }
        144 => { Some("Topic Name invalid") }
        145 => { Some("Packet Identifier in use") }
        146 => { Some("Packet Identifier not found") }
        147 => { Some("Receive Maximum exceeded") }
        148 => { Some("Topic Alias invalid") }
        149 => { Some("Packet too large") }
        150 => { Some("Message rate too high") }
        151 => { Some("Quota exceeded") }
        152 => { Some("Administrative action") }
        153 => { Some("Payload format invalid") }
        154 => { Some("Retain not supported") }
        155 => { Some("QoS not supported") }
        156 => { Some("Use another server") }
        157 => { Some("Server moved") }
        158 => { Some("Shared Subscriptions not supported") }
        159 => { Some("Connection rate exceeded") }
        160 => { Some("Maximum connect time") }
        161 => { Some("Subscription Identifiers not supported") }
        162 => { Some("Wildcard Subscriptions not supported") }
        _ => { None }
    }
}

impl MqttError {

    /// Builds the error a broker's non-zero Connack code stands for
    pub(crate) fn new_protocol_refused(reason_code: u8) -> Self {
        let description =
            if reason_code <= 5 {
                error_for_code(reason_code as u32).map(|(_, message)| message)
            } else {
                reason_code_to_str(reason_code)
            };

        let message =
            match description {
                Some(message) => { message.to_string() }
                None => { format!("Connection Refused, unknown reason code {}", reason_code) }
            };

        MqttError::ProtocolRefused(
            ProtocolRefusedContext {
                reason_code,
                source : message.into()
            }
        )
    }

    pub(crate) fn new_connection_closed(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::ConnectionClosed(
            ConnectionClosedContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_connection_timeout(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::ConnectionTimeout(
            ConnectionTimeoutContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_connection_failed(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::ConnectionFailed(
            ConnectionFailedContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_send_buffer_full(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::SendBufferFull(
            SendBufferFullContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_not_connected(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::NotConnected(
            NotConnectedContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_invalid_topic(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::InvalidTopic(
            InvalidTopicContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_invalid_qos(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::InvalidQos(
            InvalidQosContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_malformed_packet(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::MalformedPacket(
            MalformedPacketContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_unknown_property(property_id: u8) -> Self {
        MqttError::UnknownProperty(
            UnknownPropertyContext {
                property_id
            }
        )
    }

    pub(crate) fn new_encoding_failure(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::EncodingFailure(
            EncodingFailureContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_invalid_option(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::InvalidOption(
            InvalidOptionContext {
                source : source.into()
            }
        )
    }

    pub(crate) fn new_internal_state_error(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        MqttError::InternalStateError(
            InternalStateErrorContext {
                source : source.into()
            }
        )
    }

    /// Builds the error that a client-side code from [`error_for_code`] stands for.  Codes without
    /// a meaning produce an InternalStateError.
    pub fn from_code(code: u32) -> Self {
        match error_for_code(code) {
            Some((ErrorKind::ProtocolRefused, _)) => { MqttError::new_protocol_refused(code as u8) }
            Some((ErrorKind::ConnectionClosed, message)) => { MqttError::new_connection_closed(message) }
            Some((ErrorKind::ConnectionTimeout, message)) => { MqttError::new_connection_timeout(message) }
            Some((ErrorKind::ConnectionFailed, message)) => { MqttError::new_connection_failed(message) }
            Some((ErrorKind::SendBufferFull, message)) => { MqttError::new_send_buffer_full(message) }
            Some((ErrorKind::NotConnected, message)) => { MqttError::new_not_connected(message) }
            Some((ErrorKind::InvalidTopic, message)) => { MqttError::new_invalid_topic(message) }
            Some((ErrorKind::InvalidQos, message)) => { MqttError::new_invalid_qos(message) }
            _ => { MqttError::new_internal_state_error(format!("unknown error code {}", code)) }
        }
    }

    /// Returns the fieldless kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MqttError::ProtocolRefused(_) => { ErrorKind::ProtocolRefused }
            MqttError::ConnectionClosed(_) => { ErrorKind::ConnectionClosed }
            MqttError::ConnectionTimeout(_) => { ErrorKind::ConnectionTimeout }
            MqttError::ConnectionFailed(_) => { ErrorKind::ConnectionFailed }
            MqttError::SendBufferFull(_) => { ErrorKind::SendBufferFull }
            MqttError::NotConnected(_) => { ErrorKind::NotConnected }
            MqttError::InvalidTopic(_) => { ErrorKind::InvalidTopic }
            MqttError::InvalidQos(_) => { ErrorKind::InvalidQos }
            MqttError::MalformedPacket(_) => { ErrorKind::MalformedPacket }
            MqttError::UnknownProperty(_) => { ErrorKind::UnknownProperty }
            MqttError::EncodingFailure(_) => { ErrorKind::EncodingFailure }
            MqttError::InvalidOption(_) => { ErrorKind::InvalidOption }
            MqttError::InternalStateError(_) => { ErrorKind::InternalStateError }
        }
    }
}

impl Error for MqttError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MqttError::ProtocolRefused(context) => {
                Some(context.source.as_ref())
            }
            MqttError::ConnectionClosed(context) => {
                Some(context.source.as_ref())
            }
            MqttError::ConnectionTimeout(context) => {
                Some(context.source.as_ref())
            }
            MqttError::ConnectionFailed(context) => {
                Some(context.source.as_ref())
            }
            MqttError::SendBufferFull(context) => {
                Some(context.source.as_ref())
            }
            MqttError::NotConnected(context) => {
                Some(context.source.as_ref())
            }
            MqttError::InvalidTopic(context) => {
                Some(context.source.as_ref())
            }
            MqttError::InvalidQos(context) => {
                Some(context.source.as_ref())
            }
            MqttError::MalformedPacket(context) => {
                Some(context.source.as_ref())
            }
            MqttError::EncodingFailure(context) => {
                Some(context.source.as_ref())
            }
            MqttError::InvalidOption(context) => {
                Some(context.source.as_ref())
            }
            MqttError::InternalStateError(context) => {
                Some(context.source.as_ref())
            }
            _ => { None }
        }
    }
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MqttError::ProtocolRefused(context) => {
                write!(f, "broker refused the connection with code {}: {}", context.reason_code, context.source)
            }
            MqttError::ConnectionClosed(context) => {
                write!(f, "connection closed: {}", context.source)
            }
            MqttError::ConnectionTimeout(_) => {
                write!(f, "no successful connack received before the connect timeout elapsed")
            }
            MqttError::ConnectionFailed(_) => {
                write!(f, "transport failed to connect to the broker")
            }
            MqttError::SendBufferFull(_) => {
                write!(f, "connection buffer full and connection closed")
            }
            MqttError::NotConnected(_) => {
                write!(f, "no connection to broker")
            }
            MqttError::InvalidTopic(context) => {
                write!(f, "invalid topic: {}", context.source)
            }
            MqttError::InvalidQos(context) => {
                write!(f, "invalid qos: {}", context.source)
            }
            MqttError::MalformedPacket(context) => {
                write!(f, "failure encountered while decoding an incoming MQTT packet: {}", context.source)
            }
            MqttError::UnknownProperty(context) => {
                write!(f, "property id 0x{:02X} is not valid for this packet", context.property_id)
            }
            MqttError::EncodingFailure(context) => {
                write!(f, "failure encountered while encoding an outbound MQTT packet: {}", context.source)
            }
            MqttError::InvalidOption(context) => {
                write!(f, "invalid client option: {}", context.source)
            }
            MqttError::InternalStateError(_) => {
                write!(f, "client reached an invalid internal state; almost certainly a client bug")
            }
        }
    }
}

impl From<core::str::Utf8Error> for MqttError {
    fn from(err: core::str::Utf8Error) -> Self {
        MqttError::new_malformed_packet(err)
    }
}

/// Crate-wide result type for functions that can fail
pub type MqttResult<T> = Result<T, MqttError>;
