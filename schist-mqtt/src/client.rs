/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
Module containing the public MQTT client and the collaborator traits it is driven through.

The client performs no I/O of its own.  An embedding event loop supplies a [`Transport`] and a
[`TimerService`], forwards transport callbacks into [`Client::handle_network_event`], and forwards
timer firings into [`Client::handle_timer_event`].  Every API method returns immediately; results
are delivered through completion callbacks and the client's event hooks.
 */

use crate::config::*;
use crate::decode::{Decoder, DecodingContext};
use crate::encode::encode_packet;
use crate::error::{MqttError, MqttResult, ERROR_CODE_CONNECTION_CLOSED, ERROR_CODE_CONNECTION_FAILED};
use crate::mqtt::*;
use crate::mqtt::utils::mqtt_packet_to_packet_type;
use crate::protocol::*;
use crate::validate::*;

use log::*;
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

pub use crate::protocol::{PublishCallback, SessionState, SubscribeCallback, UnsubscribeCallback};

/// Byte-stream connection to a broker, owned by the client.
///
/// Implementations report connection lifecycle changes back to the client as [`NetworkEvent`]s.
pub trait Transport {

    /// Begins opening the connection.  Success is reported as [`NetworkEvent::ConnectionOpened`].
    fn connect(&mut self);

    /// Begins opening a fresh connection once `after` has elapsed
    fn reconnect(&mut self, after: Duration);

    /// Queues bytes for writing.  A full outbound buffer is reported as [`NetworkEvent::BufferFull`].
    fn send(&mut self, bytes: Vec<u8>);

    /// Tears down the connection.  The transport must report [`NetworkEvent::ConnectionClosed`]
    /// once teardown has finished.
    fn destroy(&mut self);
}

/// Opaque identifier of a scheduled timer
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Scheduling primitive, owned by the client.  Firings are delivered through
/// [`Client::handle_timer_event`].
pub trait TimerService {

    /// Schedules a timer that fires after `delay`, and then every `delay` if `repeating` is set
    fn add(&mut self, delay: Duration, repeating: bool) -> TimerHandle;

    /// Cancels a timer.  Cancelling an unknown or already-fired timer must be harmless.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Transport callbacks, as delivered to [`Client::handle_network_event`]
#[derive(Debug)]
pub enum NetworkEvent<'a> {

    /// The connection to the broker has been established
    ConnectionOpened,

    /// Bytes were read from the connection
    IncomingData(&'a [u8]),

    /// The connection closed, for any reason
    ConnectionClosed,

    /// The transport failed.  Code 1 means the connection attempt itself failed.
    ConnectionError(i32),

    /// The transport's outbound buffer is full
    BufferFull,
}

/// Hook invoked on connection lifecycle changes
pub type ConnectionHook = Box<dyn FnMut(&mut Client)>;

/// Hook invoked for every publish received from the broker, with its topic, payload and properties
pub type MessageHook = Box<dyn FnMut(&mut Client, &str, &[u8], &Properties)>;

/// Hook that receives errors not owned by any operation callback
pub type ErrorHook = Box<dyn FnMut(&mut Client, MqttError)>;

/// Additional options applicable to an MQTT Publish operation
#[derive(Debug, Default, Clone)]
pub struct PublishOptions {
    pub(crate) qos: u8,
    pub(crate) retain: bool,
    pub(crate) duplicate: bool,
}

/// Builder type for [`PublishOptions`]
#[derive(Default)]
pub struct PublishOptionsBuilder {
    options: PublishOptions
}

impl PublishOptionsBuilder {

    /// Creates a new PublishOptionsBuilder with default values (QoS 0, not retained, not a duplicate)
    pub fn new() -> Self {
        PublishOptionsBuilder {
            ..Default::default()
        }
    }

    /// Sets the quality of service to publish with
    pub fn with_qos(mut self, qos: QualityOfService) -> Self {
        self.options.qos = qos as u8;
        self
    }

    /// Sets the quality of service from its raw wire value.  Values outside 0..=2 cause the
    /// publish to fail with [`MqttError::InvalidQos`].
    pub fn with_qos_level(mut self, qos: u8) -> Self {
        self.options.qos = qos;
        self
    }

    /// Sets whether the broker should retain the message
    pub fn with_retain(mut self, retain: bool) -> Self {
        self.options.retain = retain;
        self
    }

    /// Sets the duplicate delivery flag
    pub fn with_duplicate(mut self, duplicate: bool) -> Self {
        self.options.duplicate = duplicate;
        self
    }

    /// Creates a new PublishOptions object from what was configured on the builder.
    pub fn build(self) -> PublishOptions {
        self.options
    }
}

// Takes the hook out of its slot for the duration of the call so that it may call back into the
// client.  A hook installed by the callee takes precedence over the one being restored.
macro_rules! fire_hook {
    ($self:ident, $slot:ident $(, $arg:expr)*) => {
        if let Some(mut hook) = $self.$slot.take() {
            hook(&mut *$self $(, $arg)*);
            if $self.$slot.is_none() {
                $self.$slot = Some(hook);
            }
        }
    };
}

/// An MQTT client session.
///
/// Created once and kept across reconnects; the resubscription set, the message id counter and
/// the pending operation table all live as long as the client does.
pub struct Client {
    config: ClientConfig,
    session: Session,
    transport: Box<dyn Transport>,
    timers: Box<dyn TimerService>,
    decoder: Decoder,

    connect_timeout_timer: Option<TimerHandle>,
    ping_timer: Option<TimerHandle>,

    base_timestamp: Instant,

    on_connect: Option<ConnectionHook>,
    on_reconnect: Option<ConnectionHook>,
    on_message: Option<MessageHook>,
    on_close: Option<ConnectionHook>,
    on_error: Option<ErrorHook>,
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.config.client_id())
            .field("state", &self.session.state)
            .field("protocol_version", &self.session.protocol_version)
            .field("pending_operations", &self.session.pending_operations.len())
            .finish()
    }
}

impl Client {

    /// Creates a new client in the Initial state.  Nothing happens until [`Client::connect`] is called.
    pub fn new(config: ClientConfig, transport: Box<dyn Transport>, timers: Box<dyn TimerService>) -> Client {
        let protocol_version = config.protocol_version();

        Client {
            config,
            session: Session::new(protocol_version),
            transport,
            timers,
            decoder: Decoder::new(),
            connect_timeout_timer: None,
            ping_timer: None,
            base_timestamp: Instant::now(),
            on_connect: None,
            on_reconnect: None,
            on_message: None,
            on_close: None,
            on_error: None,
        }
    }

    /// Returns the configuration the client was created with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the current session state
    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// Sets the hook invoked after the first successful Connack
    pub fn set_on_connect<F>(&mut self, hook: F) where F : FnMut(&mut Client) + 'static {
        self.on_connect = Some(Box::new(hook));
    }

    /// Sets the hook invoked after every later successful Connack, once resubscription has been sent
    pub fn set_on_reconnect<F>(&mut self, hook: F) where F : FnMut(&mut Client) + 'static {
        self.on_reconnect = Some(Box::new(hook));
    }

    /// Sets the hook invoked for each incoming publish, before it is acknowledged
    pub fn set_on_message<F>(&mut self, hook: F) where F : FnMut(&mut Client, &str, &[u8], &Properties) + 'static {
        self.on_message = Some(Box::new(hook));
    }

    /// Sets the hook invoked after the connection has closed and pending operations have been failed
    pub fn set_on_close<F>(&mut self, hook: F) where F : FnMut(&mut Client) + 'static {
        self.on_close = Some(Box::new(hook));
    }

    /// Sets the hook that receives transport errors, connection refusals, decode failures, and
    /// operation errors for operations submitted without a callback
    pub fn set_on_error<F>(&mut self, hook: F) where F : FnMut(&mut Client, MqttError) + 'static {
        self.on_error = Some(Box::new(hook));
    }

    /// Starts connecting to the broker
    pub fn connect(&mut self) {
        info!("[{} ms] connect - connecting as client id {}", self.elapsed_ms(), self.config.client_id());

        self.session.do_not_reconnect = false;
        self.change_state(SessionState::Connecting);
        self.transport.connect();
        self.arm_connect_timeout(self.config.connect_timeout());
    }

    /// Starts a fresh connection attempt after `after` has elapsed.  The connect timeout covers
    /// the delay as well.
    pub fn reconnect(&mut self, after: Duration) {
        info!("[{} ms] reconnect - reconnecting after {} ms", self.elapsed_ms(), after.as_millis());

        self.session.do_not_reconnect = false;
        self.transport.reconnect(after);
        self.change_state(SessionState::Connecting);
        self.arm_connect_timeout(self.config.connect_timeout() + after);
    }

    /// Closes the connection without sending a Disconnect and disables automatic reconnection
    pub fn close(&mut self) {
        info!("[{} ms] close - closing connection", self.elapsed_ms());

        self.session.do_not_reconnect = true;
        self.destroy_transport();
    }

    /// Sends a Disconnect packet and then closes the connection.  `reason_code` and `properties`
    /// are only encoded under MQTT5.
    pub fn disconnect(&mut self, reason_code: u8, properties: Properties) {
        if self.session.is_established() {
            let disconnect = MqttPacket::Disconnect(DisconnectPacket {
                reason_code,
                properties,
            });

            if let Err(error) = self.send_packet(&disconnect) {
                self.report_error(error);
            }
        } else {
            self.report_error(MqttError::new_not_connected("disconnect requires an established session"));
        }

        self.close();
    }

    /// Sends an MQTT5 Auth packet.  Fails with [`MqttError::EncodingFailure`] under MQTT 3.
    pub fn auth(&mut self, reason_code: u8, properties: Properties) {
        if !self.session.is_established() {
            self.report_error(MqttError::new_not_connected("auth requires an established session"));
            return;
        }

        let auth = MqttPacket::Auth(AuthPacket {
            reason_code,
            properties,
        });

        if let Err(error) = self.send_packet(&auth) {
            self.report_error(error);
        }
    }

    /// Subscribes to one or more topic filters.  On success the callback receives each topic
    /// filter paired with the code the broker granted for it.
    pub fn subscribe(&mut self, subscriptions: Vec<Subscription>, properties: Properties, callback: Option<SubscribeCallback>) {
        if !self.session.is_established() {
            self.fail_operation(callback, MqttError::new_not_connected("subscribe requires an established session"));
            return;
        }

        if let Err(error) = validate_topic_filters(subscriptions.iter().map(|subscription| subscription.topic_filter()), "subscribe") {
            self.fail_operation(callback, error);
            return;
        }

        let packet_id = self.session.message_ids.allocate();
        let topics : Vec<String> = subscriptions.iter().map(|subscription| subscription.topic_filter().to_string()).collect();
        let packet = MqttPacket::Subscribe(SubscribePacket {
            packet_id,
            subscriptions,
            properties,
        });

        if let Err(error) = self.send_packet(&packet) {
            self.fail_operation(callback, error);
            return;
        }

        if self.config.resubscribe() {
            if let MqttPacket::Subscribe(subscribe) = &packet {
                self.session.resubscriptions.record(&subscribe.subscriptions, &subscribe.properties);
            }
        }

        if let Some(callback) = callback {
            self.session.pending_operations.insert(packet_id, PendingOperation::Subscribe { topics, callback });
        }
    }

    /// Unsubscribes from one or more topic filters
    pub fn unsubscribe(&mut self, topic_filters: Vec<String>, properties: Properties, callback: Option<UnsubscribeCallback>) {
        if !self.session.is_established() {
            self.fail_operation(callback, MqttError::new_not_connected("unsubscribe requires an established session"));
            return;
        }

        if let Err(error) = validate_topic_filters(topic_filters.iter().map(|filter| filter.as_str()), "unsubscribe") {
            self.fail_operation(callback, error);
            return;
        }

        let packet_id = self.session.message_ids.allocate();
        self.session.resubscriptions.remove(&topic_filters);

        let packet = MqttPacket::Unsubscribe(UnsubscribePacket {
            packet_id,
            topic_filters,
            properties,
        });

        if let Err(error) = self.send_packet(&packet) {
            self.fail_operation(callback, error);
            return;
        }

        if let Some(callback) = callback {
            self.session.pending_operations.insert(packet_id, PendingOperation::Unsubscribe(callback));
        }
    }

    /// Publishes a message.
    ///
    /// QoS 1 and 2 callbacks complete when the final acknowledgement arrives.  A QoS 0 callback
    /// completes as soon as the packet has been handed to the transport.
    pub fn publish(&mut self, topic: &str, payload: Vec<u8>, options: PublishOptions, properties: Properties, callback: Option<PublishCallback>) {
        if !self.session.is_established() {
            self.fail_operation(callback, MqttError::new_not_connected("publish requires an established session"));
            return;
        }

        let qos =
            match QualityOfService::try_from(options.qos) {
                Ok(qos) => { qos }
                Err(_) => {
                    error!("[{} ms] publish - invalid qos {}", self.elapsed_ms(), options.qos);
                    self.fail_operation(callback, MqttError::new_invalid_qos(format!("qos {} is not 0, 1 or 2", options.qos)));
                    return;
                }
            };

        if let Err(error) = validate_publish_topic(topic, &properties, self.session.protocol_version) {
            self.fail_operation(callback, error);
            return;
        }

        let packet_id =
            if qos != QualityOfService::AtMostOnce {
                self.session.message_ids.allocate()
            } else {
                0
            };

        let packet = MqttPacket::Publish(PublishPacket {
            topic: topic.to_string(),
            packet_id,
            qos,
            duplicate: options.duplicate,
            retain: options.retain,
            payload,
            properties,
        });

        if let Err(error) = self.send_packet(&packet) {
            self.fail_operation(callback, error);
            return;
        }

        if let Some(callback) = callback {
            if packet_id == 0 {
                callback(Ok(()));
            } else {
                self.session.pending_operations.insert(packet_id, PendingOperation::Publish(callback));
            }
        }
    }

    /// Entry point for transport callbacks
    pub fn handle_network_event(&mut self, event: NetworkEvent) {
        debug!("[{} ms] handle_network_event - {:?} in state {}", self.elapsed_ms(), event, self.session.state);

        match event {
            NetworkEvent::ConnectionOpened => { self.handle_connection_opened(); }
            NetworkEvent::IncomingData(bytes) => { self.handle_incoming_data(bytes); }
            NetworkEvent::ConnectionClosed => { self.handle_connection_closed(); }
            NetworkEvent::ConnectionError(code) => {
                let error_code = if code == 1 { ERROR_CODE_CONNECTION_FAILED } else { ERROR_CODE_CONNECTION_CLOSED };
                warn!("[{} ms] handle_network_event - transport error {}", self.elapsed_ms(), code);
                self.report_error(MqttError::from_code(error_code));
                self.destroy_transport();
            }
            NetworkEvent::BufferFull => {
                self.report_error(MqttError::new_send_buffer_full("transport send buffer is full"));
                self.destroy_transport();
            }
        }
    }

    /// Entry point for timer firings.  Firings of timers the client no longer tracks are ignored.
    pub fn handle_timer_event(&mut self, handle: TimerHandle) {
        if self.connect_timeout_timer == Some(handle) {
            self.connect_timeout_timer = None;
            self.handle_connect_timeout();
        } else if self.ping_timer == Some(handle) {
            self.handle_ping_timer();
        } else {
            debug!("[{} ms] handle_timer_event - ignoring stale timer {:?}", self.elapsed_ms(), handle);
        }
    }

    fn elapsed_ms(&self) -> u128 {
        self.base_timestamp.elapsed().as_millis()
    }

    fn change_state(&mut self, next_state: SessionState) {
        if self.session.state != next_state {
            info!("[{} ms] change_state - transitioning from {} to {}", self.elapsed_ms(), self.session.state, next_state);
            self.session.state = next_state;
        }
    }

    fn send_packet(&mut self, packet: &MqttPacket) -> MqttResult<()> {
        let mut bytes = Vec::new();
        encode_packet(packet, self.session.protocol_version, &mut bytes)?;
        self.transport.send(bytes);

        Ok(())
    }

    // Moves to Disconnect right away so that work queued behind a teardown, such as the rest of
    // an inbound batch, is dropped.  The close path runs once the transport reports the closure.
    fn destroy_transport(&mut self) {
        if self.session.state != SessionState::Initial {
            self.change_state(SessionState::Disconnect);
        }

        self.transport.destroy();
    }

    fn report_error(&mut self, error: MqttError) {
        if self.on_error.is_some() {
            fire_hook!(self, on_error, error);
        } else {
            error!("[{} ms] report_error - {}", self.elapsed_ms(), error);
        }
    }

    fn fail_operation<T>(&mut self, callback: Option<Box<dyn FnOnce(MqttResult<T>)>>, error: MqttError) {
        match callback {
            Some(callback) => { callback(Err(error)); }
            None => { self.report_error(error); }
        }
    }

    fn arm_connect_timeout(&mut self, timeout: Duration) {
        if let Some(handle) = self.connect_timeout_timer.take() {
            self.timers.cancel(handle);
        }

        self.connect_timeout_timer = Some(self.timers.add(timeout, false));
    }

    fn cancel_timers(&mut self) {
        if let Some(handle) = self.connect_timeout_timer.take() {
            self.timers.cancel(handle);
        }

        if let Some(handle) = self.ping_timer.take() {
            self.timers.cancel(handle);
        }
    }

    fn handle_connection_opened(&mut self) {
        if self.session.do_not_reconnect {
            info!("[{} ms] handle_connection_opened - connection opened after close was requested", self.elapsed_ms());
            self.close();
            return;
        }

        self.decoder.reset_for_new_connection();

        let connect = MqttPacket::Connect(self.config.to_connect_packet());
        if let Err(error) = self.send_packet(&connect) {
            self.report_error(error);
            self.destroy_transport();
            return;
        }

        self.change_state(SessionState::WaitConnack);
    }

    fn handle_incoming_data(&mut self, bytes: &[u8]) {
        if self.session.state != SessionState::WaitConnack && !self.session.is_established() {
            debug!("[{} ms] handle_incoming_data - dropping {} bytes in state {}", self.elapsed_ms(), bytes.len(), self.session.state);
            return;
        }

        let mut decoded_packets = VecDeque::new();
        let mut context = DecodingContext {
            protocol_version: self.session.protocol_version,
            decoded_packets: &mut decoded_packets,
        };

        let decode_result = self.decoder.decode_bytes(bytes, &mut context);

        for packet in decoded_packets {
            if self.session.state != SessionState::WaitConnack && !self.session.is_established() {
                debug!("[{} ms] handle_incoming_data - dropping remaining packets in state {}", self.elapsed_ms(), self.session.state);
                return;
            }

            self.handle_packet(packet);
        }

        if let Err(error) = decode_result {
            error!("[{} ms] handle_incoming_data - decode failure: {}", self.elapsed_ms(), error);
            self.report_error(error);
            self.destroy_transport();
        }
    }

    fn handle_packet(&mut self, packet: MqttPacket) {
        match packet {
            MqttPacket::Connack(connack) => { self.handle_connack(connack); }
            MqttPacket::Publish(publish) => { self.handle_publish(publish); }
            MqttPacket::Puback(puback) => {
                self.session.pending_operations.complete(puback.packet_id, AckKind::Puback, &[]);
            }
            MqttPacket::Pubrec(pubrec) => {
                let pubrel = MqttPacket::Pubrel(PubrelPacket {
                    packet_id: pubrec.packet_id,
                    ..Default::default()
                });
                self.send_ack(&pubrel);
            }
            MqttPacket::Pubrel(pubrel) => {
                let pubcomp = MqttPacket::Pubcomp(PubcompPacket {
                    packet_id: pubrel.packet_id,
                    ..Default::default()
                });
                self.send_ack(&pubcomp);
            }
            MqttPacket::Pubcomp(pubcomp) => {
                self.session.pending_operations.complete(pubcomp.packet_id, AckKind::Pubcomp, &[]);
            }
            MqttPacket::Suback(suback) => {
                self.session.pending_operations.complete(suback.packet_id, AckKind::Suback, &suback.reason_codes);
            }
            MqttPacket::Unsuback(unsuback) => {
                self.session.pending_operations.complete(unsuback.packet_id, AckKind::Unsuback, &unsuback.reason_codes);
            }
            MqttPacket::Pingresp(_) => {
                self.session.ping_response_received = true;
            }
            MqttPacket::Disconnect(disconnect) => {
                info!("[{} ms] handle_packet - broker sent disconnect with reason code {}", self.elapsed_ms(), disconnect.reason_code);
            }
            MqttPacket::Auth(auth) => {
                info!("[{} ms] handle_packet - broker sent auth with reason code {}", self.elapsed_ms(), auth.reason_code);
            }
            _ => {
                warn!("[{} ms] handle_packet - ignoring unexpected {} packet", self.elapsed_ms(), mqtt_packet_to_packet_type(&packet));
            }
        }
    }

    fn send_ack(&mut self, packet: &MqttPacket) {
        if !self.session.is_established() {
            debug!("[{} ms] send_ack - session not established, dropping {}", self.elapsed_ms(), mqtt_packet_to_packet_type(packet));
            return;
        }

        if let Err(error) = self.send_packet(packet) {
            self.report_error(error);
        }
    }

    fn handle_connack(&mut self, connack: ConnackPacket) {
        if self.session.state != SessionState::WaitConnack {
            warn!("[{} ms] handle_connack - unexpected connack in state {}", self.elapsed_ms(), self.session.state);
            return;
        }

        if connack.reason_code != 0 {
            error!("[{} ms] handle_connack - connection refused with reason code {}", self.elapsed_ms(), connack.reason_code);
            self.report_error(MqttError::new_protocol_refused(connack.reason_code));
            self.destroy_transport();
            return;
        }

        self.change_state(SessionState::Established);

        // hooks may start a new attempt with its own timeout
        if let Some(handle) = self.connect_timeout_timer.take() {
            self.timers.cancel(handle);
        }

        if self.session.first_connect {
            self.session.first_connect = false;
            fire_hook!(self, on_connect);
        } else {
            self.resubscribe();
            fire_hook!(self, on_reconnect);
        }

        let keep_alive = self.config.keep_alive_interval_seconds();
        if keep_alive > 0 && self.session.is_established() && self.ping_timer.is_none() {
            self.ping_timer = Some(self.timers.add(Duration::from_secs(keep_alive as u64), true));
        }
    }

    fn resubscribe(&mut self) {
        if !self.config.clean_session() || !self.config.resubscribe() || self.session.resubscriptions.is_empty() {
            return;
        }

        let packet_id = self.session.message_ids.allocate();
        let subscribe = MqttPacket::Subscribe(self.session.resubscriptions.to_subscribe_packet(packet_id));

        info!("[{} ms] resubscribe - resubscribing to {} topic filters with message id {}", self.elapsed_ms(), self.session.resubscriptions.subscriptions().len(), packet_id);

        if let Err(error) = self.send_packet(&subscribe) {
            self.report_error(error);
        }
    }

    fn handle_publish(&mut self, publish: PublishPacket) {
        fire_hook!(self, on_message, publish.topic.as_str(), publish.payload.as_slice(), &publish.properties);

        if !self.session.is_established() {
            return;
        }

        match publish.qos {
            QualityOfService::AtMostOnce => {}
            QualityOfService::AtLeastOnce => {
                let puback = MqttPacket::Puback(PubackPacket {
                    packet_id: publish.packet_id,
                    properties: publish.properties,
                    ..Default::default()
                });
                self.send_ack(&puback);
            }
            QualityOfService::ExactlyOnce => {
                let pubrec = MqttPacket::Pubrec(PubrecPacket {
                    packet_id: publish.packet_id,
                    properties: publish.properties,
                    ..Default::default()
                });
                self.send_ack(&pubrec);
            }
        }
    }

    fn handle_connect_timeout(&mut self) {
        match self.session.state {
            SessionState::Connecting | SessionState::WaitConnack => {
                error!("[{} ms] handle_connect_timeout - no connack received in state {}", self.elapsed_ms(), self.session.state);
                self.report_error(MqttError::new_connection_timeout("connect timeout elapsed"));
                self.destroy_transport();
            }
            _ => {
                debug!("[{} ms] handle_connect_timeout - ignored in state {}", self.elapsed_ms(), self.session.state);
            }
        }
    }

    fn handle_ping_timer(&mut self) {
        if !self.session.is_established() {
            return;
        }

        if !self.session.ping_response_received {
            warn!("[{} ms] handle_ping_timer - no pingresp since the last pingreq, closing connection", self.elapsed_ms());
            self.destroy_transport();
            return;
        }

        self.session.ping_response_received = false;
        if let Err(error) = self.send_packet(&MqttPacket::Pingreq(PingreqPacket {})) {
            self.report_error(error);
        }
    }

    fn handle_connection_closed(&mut self) {
        info!("[{} ms] handle_connection_closed - connection closed in state {}", self.elapsed_ms(), self.session.state);

        self.cancel_timers();
        self.session.ping_response_received = true;
        self.change_state(SessionState::Disconnect);

        let reconnect_period = self.config.reconnect_period();
        if !self.session.do_not_reconnect && !reconnect_period.is_zero() {
            self.reconnect(reconnect_period);
        }

        if !self.session.pending_operations.is_empty() {
            debug!("[{} ms] handle_connection_closed - failing {} pending operations", self.elapsed_ms(), self.session.pending_operations.len());
            self.session.pending_operations.fail_all(|| { MqttError::from_code(ERROR_CODE_CONNECTION_CLOSED) });
        }

        fire_hook!(self, on_close);
    }
}
