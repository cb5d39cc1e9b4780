/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

// Internal module holding the per-client session bookkeeping: connection state, message id
// allocation, in-flight operations awaiting an ack, and the subscriptions replayed on reconnect.

use crate::error::{MqttError, MqttResult};
use crate::mqtt::*;

use log::*;

use std::collections::HashMap;
use std::fmt::*;

/// Lifecycle state of a client session
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum SessionState {

    /// Constructed, connect() not yet called
    #[default]
    Initial,

    /// Waiting for the transport to open
    Connecting,

    /// CONNECT sent, waiting for the CONNACK
    WaitConnack,

    /// Successful CONNACK received; operations are allowed
    Established,

    /// The transport has closed
    Disconnect,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            SessionState::Initial => { write!(f, "Initial") }
            SessionState::Connecting => { write!(f, "Connecting") }
            SessionState::WaitConnack => { write!(f, "WaitConnack") }
            SessionState::Established => { write!(f, "Established") }
            SessionState::Disconnect => { write!(f, "Disconnect") }
        }
    }
}

/// Cycles through 1..=65535.  Zero is never produced, and no check is made for ids still in use.
pub(crate) struct MessageIdAllocator {
    next_id: u16,
}

impl MessageIdAllocator {
    pub(crate) fn new() -> Self {
        MessageIdAllocator {
            next_id: 1
        }
    }

    pub(crate) fn allocate(&mut self) -> u16 {
        let id = self.next_id;
        self.next_id = if id == u16::MAX { 1 } else { id + 1 };

        id
    }
}

/// Completion callback for a QoS 1 or 2 publish
pub type PublishCallback = Box<dyn FnOnce(MqttResult<()>)>;

/// Completion callback for a subscribe.  On success, receives each requested topic filter paired
/// with the reason code the broker returned for it.
pub type SubscribeCallback = Box<dyn FnOnce(MqttResult<Vec<(String, u8)>>)>;

/// Completion callback for an unsubscribe
pub type UnsubscribeCallback = Box<dyn FnOnce(MqttResult<()>)>;

pub(crate) enum PendingOperation {
    Publish(PublishCallback),
    Subscribe {
        topics: Vec<String>,
        callback: SubscribeCallback,
    },
    Unsubscribe(UnsubscribeCallback),
}

impl PendingOperation {
    fn kind_name(&self) -> &'static str {
        match self {
            PendingOperation::Publish(_) => { "Publish" }
            PendingOperation::Subscribe { .. } => { "Subscribe" }
            PendingOperation::Unsubscribe(_) => { "Unsubscribe" }
        }
    }

    pub(crate) fn fail(self, error: MqttError) {
        match self {
            PendingOperation::Publish(callback) => { callback(Err(error)); }
            PendingOperation::Subscribe { callback, .. } => { callback(Err(error)); }
            PendingOperation::Unsubscribe(callback) => { callback(Err(error)); }
        }
    }
}

/// Ack kinds that complete a pending operation
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum AckKind {
    Puback,
    Pubcomp,
    Suback,
    Unsuback,
}

impl Display for AckKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            AckKind::Puback => { write!(f, "Puback") }
            AckKind::Pubcomp => { write!(f, "Pubcomp") }
            AckKind::Suback => { write!(f, "Suback") }
            AckKind::Unsuback => { write!(f, "Unsuback") }
        }
    }
}

/// Operations that were given a completion callback, keyed by message id
pub(crate) struct PendingOperationTable {
    operations: HashMap<u16, PendingOperation>,
}

impl PendingOperationTable {
    pub(crate) fn new() -> Self {
        PendingOperationTable {
            operations: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, packet_id: u16, operation: PendingOperation) {
        if let Some(replaced) = self.operations.insert(packet_id, operation) {
            warn!("PendingOperationTable::insert - message id {} reused while a {} operation was still pending", packet_id, replaced.kind_name());
        }
    }

    /// Completes the operation with `packet_id` if one exists and it matches the ack kind.
    /// Returns true if a callback was invoked.
    pub(crate) fn complete(&mut self, packet_id: u16, ack: AckKind, reason_codes: &[u8]) -> bool {
        let matches_ack =
            match (self.operations.get(&packet_id), ack) {
                (Some(PendingOperation::Publish(_)), AckKind::Puback | AckKind::Pubcomp) => { true }
                (Some(PendingOperation::Subscribe { .. }), AckKind::Suback) => { true }
                (Some(PendingOperation::Unsubscribe(_)), AckKind::Unsuback) => { true }
                (Some(operation), _) => {
                    warn!("PendingOperationTable::complete - {} for message id {} does not match pending {} operation", ack, packet_id, operation.kind_name());
                    false
                }
                (None, _) => {
                    debug!("PendingOperationTable::complete - no pending operation for {} with message id {}", ack, packet_id);
                    false
                }
            };

        if !matches_ack {
            return false;
        }

        match self.operations.remove(&packet_id) {
            Some(PendingOperation::Publish(callback)) => {
                callback(Ok(()));
            }
            Some(PendingOperation::Subscribe { topics, callback }) => {
                let granted = topics.into_iter().zip(reason_codes.iter().copied()).collect();
                callback(Ok(granted));
            }
            Some(PendingOperation::Unsubscribe(callback)) => {
                callback(Ok(()));
            }
            None => {
                return false;
            }
        }

        true
    }

    /// Fails every pending operation, in message id order, and empties the table
    pub(crate) fn fail_all(&mut self, error_fn: fn() -> MqttError) {
        let mut operations : Vec<(u16, PendingOperation)> = self.operations.drain().collect();
        operations.sort_by_key(|(packet_id, _)| *packet_id);

        for (packet_id, operation) in operations {
            debug!("PendingOperationTable::fail_all - failing {} operation with message id {}", operation.kind_name(), packet_id);
            operation.fail(error_fn());
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.operations.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Subscriptions replayed in a single SUBSCRIBE after a clean-session reconnect
#[derive(Default)]
pub(crate) struct ResubscriptionSet {
    subscriptions: Vec<Subscription>,
    properties: Properties,
}

impl ResubscriptionSet {
    pub(crate) fn new() -> Self {
        ResubscriptionSet {
            ..Default::default()
        }
    }

    /// A topic that is already present keeps its position and takes the newly requested options
    pub(crate) fn record(&mut self, subscriptions: &[Subscription], properties: &Properties) {
        for subscription in subscriptions {
            match self.subscriptions.iter_mut().find(|existing| existing.topic_filter == subscription.topic_filter) {
                Some(existing) => { *existing = subscription.clone(); }
                None => { self.subscriptions.push(subscription.clone()); }
            }
        }

        self.properties.merge_missing(properties);
    }

    pub(crate) fn remove(&mut self, topic_filters: &[String]) {
        self.subscriptions.retain(|subscription| !topic_filters.contains(&subscription.topic_filter));
        self.properties.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub(crate) fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub(crate) fn to_subscribe_packet(&self, packet_id: u16) -> SubscribePacket {
        SubscribePacket {
            packet_id,
            subscriptions: self.subscriptions.clone(),
            properties: self.properties.clone(),
        }
    }
}

/// Mutable session state owned by a client.  Created once and kept across reconnects.
pub(crate) struct Session {
    pub(crate) state: SessionState,

    pub(crate) protocol_version: ProtocolVersion,

    pub(crate) message_ids: MessageIdAllocator,

    pub(crate) pending_operations: PendingOperationTable,

    pub(crate) resubscriptions: ResubscriptionSet,

    pub(crate) first_connect: bool,

    pub(crate) do_not_reconnect: bool,

    pub(crate) ping_response_received: bool,
}

impl Session {
    pub(crate) fn new(protocol_version: ProtocolVersion) -> Self {
        Session {
            state: SessionState::Initial,
            protocol_version,
            message_ids: MessageIdAllocator::new(),
            pending_operations: PendingOperationTable::new(),
            resubscriptions: ResubscriptionSet::new(),
            first_connect: true,
            do_not_reconnect: false,
            ping_response_received: true,
        }
    }

    pub(crate) fn is_established(&self) -> bool {
        self.state == SessionState::Established
    }
}
