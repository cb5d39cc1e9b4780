/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing types for configuring an MQTT client.

All option validation happens when [`ClientConfigBuilder::build`] is called; a [`ClientConfig`] that
exists is always internally consistent.
 */

use crate::encode::utils::MAXIMUM_LENGTH_PREFIXED_FIELD;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;

use log::*;
use rand::Rng;
use std::time::Duration;

pub(crate) const DEFAULT_KEEP_ALIVE_SECONDS : u16 = 50;
pub(crate) const DEFAULT_RECONNECT_PERIOD_SECONDS : u64 = 1;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECONDS : u64 = 30;
pub(crate) const DEFAULT_CLIENT_ID_PREFIX : &str = "schist-mqtt-client";

/// Validated configuration for a [`Client`](crate::client::Client).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub(crate) clean_session: bool,

    pub(crate) username: Option<String>,

    pub(crate) password: Option<String>,

    pub(crate) keep_alive_interval_seconds: u16,

    pub(crate) protocol_name: String,

    pub(crate) protocol_level: u8,

    pub(crate) reconnect_period: Duration,

    pub(crate) connect_timeout: Duration,

    pub(crate) resubscribe: bool,

    pub(crate) client_id: String,

    pub(crate) will: Option<Will>,

    pub(crate) bindto: Option<String>,

    pub(crate) ssl: bool,

    pub(crate) properties: Properties,
}

impl ClientConfig {

    /// Clean session (MQTT 3) or clean start (MQTT5) flag sent on every connection attempt
    pub fn clean_session(&self) -> bool { self.clean_session }

    /// Keep alive interval, in seconds.  Zero disables pinging.
    pub fn keep_alive_interval_seconds(&self) -> u16 { self.keep_alive_interval_seconds }

    /// Protocol name written into CONNECT packets
    pub fn protocol_name(&self) -> &str { self.protocol_name.as_str() }

    /// Protocol level written into CONNECT packets
    pub fn protocol_level(&self) -> u8 { self.protocol_level }

    /// Codec variant implied by the protocol level
    pub fn protocol_version(&self) -> ProtocolVersion {
        if self.protocol_level == PROTOCOL_LEVEL_5 {
            ProtocolVersion::Mqtt5
        } else {
            ProtocolVersion::Mqtt311
        }
    }

    /// Delay before reconnecting after the connection closes.  Zero disables automatic reconnects.
    pub fn reconnect_period(&self) -> Duration { self.reconnect_period }

    /// Time allowed between starting a connection attempt and receiving a successful CONNACK
    pub fn connect_timeout(&self) -> Duration { self.connect_timeout }

    /// Whether subscriptions are replayed after a clean-session reconnect
    pub fn resubscribe(&self) -> bool { self.resubscribe }

    /// Client identifier, either configured or generated
    pub fn client_id(&self) -> &str { self.client_id.as_str() }

    /// Local address the transport should bind to.  Not interpreted by the client.
    pub fn bindto(&self) -> Option<&str> { self.bindto.as_deref() }

    /// Whether the transport should use TLS.  Not interpreted by the client.
    pub fn ssl(&self) -> bool { self.ssl }

    pub(crate) fn to_connect_packet(&self) -> ConnectPacket {
        ConnectPacket {
            protocol_name: self.protocol_name.clone(),
            protocol_level: self.protocol_level,
            clean_session: self.clean_session,
            keep_alive_interval_seconds: self.keep_alive_interval_seconds,
            client_id: self.client_id.clone(),
            will: self.will.clone(),
            username: self.username.clone(),
            password: self.password.as_ref().map(|password| password.as_bytes().to_vec()),
            properties: self.properties.clone(),
        }
    }
}

/// Builder type for [`ClientConfig`].  Unset options take their documented defaults.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    clean_session: Option<bool>,
    username: Option<String>,
    password: Option<String>,
    keep_alive_interval_seconds: Option<u16>,
    protocol_name: Option<String>,
    protocol_level: Option<u8>,
    reconnect_period_seconds: Option<u64>,
    connect_timeout_seconds: Option<u64>,
    resubscribe: Option<bool>,
    client_id: Option<String>,
    will: Option<Will>,
    bindto: Option<String>,
    ssl: Option<bool>,
    properties: Option<Properties>,
}

impl ClientConfigBuilder {

    /// Creates a new builder with every option unset
    pub fn new() -> Self {
        ClientConfigBuilder {
            ..Default::default()
        }
    }

    /// Defaults to true
    pub fn with_clean_session(mut self, clean_session: bool) -> Self {
        self.clean_session = Some(clean_session);
        self
    }

    /// Must not be empty
    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    /// Must not be empty
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    /// Defaults to 50 seconds.  Zero disables keep alive.
    pub fn with_keep_alive_interval_seconds(mut self, keep_alive: u16) -> Self {
        self.keep_alive_interval_seconds = Some(keep_alive);
        self
    }

    /// "MQTT" (the default) or "MQIsdp"
    pub fn with_protocol_name(mut self, protocol_name: &str) -> Self {
        self.protocol_name = Some(protocol_name.to_string());
        self
    }

    /// 3 for "MQIsdp", 4 or 5 for "MQTT"
    pub fn with_protocol_level(mut self, protocol_level: u8) -> Self {
        self.protocol_level = Some(protocol_level);
        self
    }

    /// Defaults to 1 second.  Zero disables automatic reconnects.
    pub fn with_reconnect_period_seconds(mut self, reconnect_period: u64) -> Self {
        self.reconnect_period_seconds = Some(reconnect_period);
        self
    }

    /// Defaults to 30 seconds.  Must be positive.
    pub fn with_connect_timeout_seconds(mut self, connect_timeout: u64) -> Self {
        self.connect_timeout_seconds = Some(connect_timeout);
        self
    }

    /// Defaults to true
    pub fn with_resubscribe(mut self, resubscribe: bool) -> Self {
        self.resubscribe = Some(resubscribe);
        self
    }

    /// If unset, a random client id is generated
    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    /// Will message registered with the broker on every connection
    pub fn with_will(mut self, will: Will) -> Self {
        self.will = Some(will);
        self
    }

    /// Local address for the transport to bind to
    pub fn with_bindto(mut self, bindto: &str) -> Self {
        self.bindto = Some(bindto.to_string());
        self
    }

    /// Requests a TLS transport
    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = Some(ssl);
        self
    }

    /// MQTT5 CONNECT properties.  Non-empty properties imply protocol level 5 unless a level is
    /// set explicitly.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Validates the options and builds the final configuration
    pub fn build(self) -> MqttResult<ClientConfig> {
        let protocol_name = self.protocol_name.unwrap_or_else(|| PROTOCOL_NAME_MQTT.to_string());
        if protocol_name != PROTOCOL_NAME_MQTT && protocol_name != PROTOCOL_NAME_MQISDP {
            error!("ClientConfigBuilder::build - invalid protocol name \"{}\"", protocol_name);
            return Err(MqttError::new_invalid_option(format!("protocol name must be MQTT or MQIsdp, not {}", protocol_name)));
        }

        let properties = self.properties.unwrap_or_default();

        let protocol_level =
            match self.protocol_level {
                Some(level) => { level }
                None => {
                    if protocol_name == PROTOCOL_NAME_MQISDP {
                        PROTOCOL_LEVEL_31
                    } else if !properties.is_empty() {
                        PROTOCOL_LEVEL_5
                    } else {
                        PROTOCOL_LEVEL_311
                    }
                }
            };

        validate_protocol_level(&protocol_name, protocol_level)?;

        validate_optional_string("username", &self.username)?;
        validate_optional_string("password", &self.password)?;
        validate_optional_string("client_id", &self.client_id)?;

        if let Some(will) = &self.will {
            validate_will(will)?;
        }

        let connect_timeout_seconds = self.connect_timeout_seconds.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECONDS);
        if connect_timeout_seconds == 0 {
            error!("ClientConfigBuilder::build - connect timeout must be positive");
            return Err(MqttError::new_invalid_option("connect timeout must be greater than zero"));
        }

        let client_id = self.client_id.unwrap_or_else(create_random_client_id);

        Ok(ClientConfig {
            clean_session: self.clean_session.unwrap_or(true),
            username: self.username,
            password: self.password,
            keep_alive_interval_seconds: self.keep_alive_interval_seconds.unwrap_or(DEFAULT_KEEP_ALIVE_SECONDS),
            protocol_name,
            protocol_level,
            reconnect_period: Duration::from_secs(self.reconnect_period_seconds.unwrap_or(DEFAULT_RECONNECT_PERIOD_SECONDS)),
            connect_timeout: Duration::from_secs(connect_timeout_seconds),
            resubscribe: self.resubscribe.unwrap_or(true),
            client_id,
            will: self.will,
            bindto: self.bindto,
            ssl: self.ssl.unwrap_or(false),
            properties,
        })
    }
}

fn validate_protocol_level(protocol_name: &str, protocol_level: u8) -> MqttResult<()> {
    let valid =
        if protocol_name == PROTOCOL_NAME_MQISDP {
            protocol_level == PROTOCOL_LEVEL_31
        } else {
            protocol_level == PROTOCOL_LEVEL_311 || protocol_level == PROTOCOL_LEVEL_5
        };

    if !valid {
        error!("ClientConfigBuilder::build - protocol level {} is not valid for protocol name {}", protocol_level, protocol_name);
        return Err(MqttError::new_invalid_option(format!("protocol level {} is not valid for protocol name {}", protocol_level, protocol_name)));
    }

    Ok(())
}

fn validate_optional_string(option_name: &str, value: &Option<String>) -> MqttResult<()> {
    if let Some(value) = value {
        if value.is_empty() {
            error!("ClientConfigBuilder::build - {} must not be empty", option_name);
            return Err(MqttError::new_invalid_option(format!("{} must not be empty", option_name)));
        }

        if value.len() > MAXIMUM_LENGTH_PREFIXED_FIELD {
            error!("ClientConfigBuilder::build - {} is too long", option_name);
            return Err(MqttError::new_invalid_option(format!("{} exceeds 65535 bytes", option_name)));
        }
    }

    Ok(())
}

fn validate_will(will: &Will) -> MqttResult<()> {
    if will.topic.is_empty() || will.topic.len() > MAXIMUM_LENGTH_PREFIXED_FIELD {
        error!("ClientConfigBuilder::build - invalid will topic");
        return Err(MqttError::new_invalid_option("will topic must be non-empty and at most 65535 bytes"));
    }

    if will.payload.is_empty() || will.payload.len() > MAXIMUM_LENGTH_PREFIXED_FIELD {
        error!("ClientConfigBuilder::build - invalid will payload");
        return Err(MqttError::new_invalid_option("will payload must be non-empty and at most 65535 bytes"));
    }

    Ok(())
}

fn create_random_client_id() -> String {
    let suffix : u32 = rand::thread_rng().gen();

    format!("{}-{}", DEFAULT_CLIENT_ID_PREFIX, suffix)
}
