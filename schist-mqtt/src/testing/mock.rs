/*
 * Copyright Bret Ambrose. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

use crate::client::{TimerHandle, TimerService, Transport};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TransportCall {
    Connect,
    Reconnect(Duration),
    Send(Vec<u8>),
    Destroy,
}

pub(crate) type TransportCallLog = Rc<RefCell<Vec<TransportCall>>>;

/// Records every call made on it; the test drives the matching network events by hand
pub(crate) struct MockTransport {
    calls: TransportCallLog,
}

impl MockTransport {
    pub(crate) fn new() -> (MockTransport, TransportCallLog) {
        let calls : TransportCallLog = Rc::new(RefCell::new(Vec::new()));

        (MockTransport { calls: calls.clone() }, calls)
    }
}

impl Transport for MockTransport {
    fn connect(&mut self) {
        self.calls.borrow_mut().push(TransportCall::Connect);
    }

    fn reconnect(&mut self, after: Duration) {
        self.calls.borrow_mut().push(TransportCall::Reconnect(after));
    }

    fn send(&mut self, bytes: Vec<u8>) {
        self.calls.borrow_mut().push(TransportCall::Send(bytes));
    }

    fn destroy(&mut self) {
        self.calls.borrow_mut().push(TransportCall::Destroy);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MockTimer {
    pub(crate) delay: Duration,
    pub(crate) repeating: bool,
}

#[derive(Default)]
pub(crate) struct MockTimerState {
    next_id: u64,
    pub(crate) active: HashMap<TimerHandle, MockTimer>,
    pub(crate) cancelled: Vec<TimerHandle>,
}

impl MockTimerState {
    pub(crate) fn find(&self, delay: Duration, repeating: bool) -> Option<TimerHandle> {
        self.active.iter()
            .find(|(_, timer)| timer.delay == delay && timer.repeating == repeating)
            .map(|(handle, _)| *handle)
    }
}

pub(crate) type MockTimerStateRef = Rc<RefCell<MockTimerState>>;

/// Never fires on its own; tests fire timers through the client's timer entry point
pub(crate) struct MockTimerService {
    state: MockTimerStateRef,
}

impl MockTimerService {
    pub(crate) fn new() -> (MockTimerService, MockTimerStateRef) {
        let state : MockTimerStateRef = Rc::new(RefCell::new(MockTimerState::default()));

        (MockTimerService { state: state.clone() }, state)
    }
}

impl TimerService for MockTimerService {
    fn add(&mut self, delay: Duration, repeating: bool) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;

        let handle = TimerHandle(state.next_id);
        state.active.insert(handle, MockTimer { delay, repeating });

        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let mut state = self.state.borrow_mut();
        state.active.remove(&handle);
        state.cancelled.push(handle);
    }
}
