/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

// Client-side checks applied to user-submitted topics before anything is encoded or sent.
// Wildcard placement is left to the broker.

use crate::encode::utils::MAXIMUM_LENGTH_PREFIXED_FIELD;
use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;

use log::*;

fn validate_topic_length(topic: &str, function_name: &str) -> MqttResult<()> {
    if topic.is_empty() {
        error!("{} - empty topic", function_name);
        return Err(MqttError::new_invalid_topic("topic cannot be empty"));
    }

    if topic.len() > MAXIMUM_LENGTH_PREFIXED_FIELD {
        error!("{} - topic length {} exceeds the maximum", function_name, topic.len());
        return Err(MqttError::new_invalid_topic(format!("topic length {} exceeds 65535 bytes", topic.len())));
    }

    Ok(())
}

/// Every filter of a subscribe or unsubscribe must be valid, and there must be at least one
pub(crate) fn validate_topic_filters<'a, I>(topic_filters: I, function_name: &str) -> MqttResult<()> where I : IntoIterator<Item = &'a str> {
    let mut count = 0;
    for topic_filter in topic_filters {
        validate_topic_length(topic_filter, function_name)?;
        count += 1;
    }

    if count == 0 {
        error!("{} - no topic filters supplied", function_name);
        return Err(MqttError::new_invalid_topic("at least one topic filter is required"));
    }

    Ok(())
}

/// An empty publish topic is only legal under MQTT5 with a topic alias present
pub(crate) fn validate_publish_topic(topic: &str, properties: &Properties, protocol_version: ProtocolVersion) -> MqttResult<()> {
    if topic.is_empty() && protocol_version == ProtocolVersion::Mqtt5 {
        if properties.contains(PropertyKey::TopicAlias) {
            return Ok(());
        }

        error!("validate_publish_topic - empty topic without a topic alias");
        return Err(MqttError::new_invalid_topic("empty topic requires a topic alias"));
    }

    validate_topic_length(topic, "validate_publish_topic")
}
