//! Recording backend for unit tests.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{Backend, BackendStatus};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::frame::Frame;

/// One backend call, tagged with the backend's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Install(&'static str),
    Start(&'static str),
    Stop(&'static str),
    Uninstall(&'static str),
    Transmit(&'static str, Frame),
    Receive(&'static str),
}

/// Calls of every mock sharing the journal, in order.
pub(crate) type Journal = Arc<Mutex<Vec<Call>>>;

#[derive(Debug, Default)]
struct State {
    inbound: VecDeque<Frame>,
    fail_install: bool,
    fail_start: bool,
    fail_stop: bool,
    fail_transmit: bool,
    fail_receive: bool,
    fail_status: bool,
    pending_tx: usize,
    tx_queue_len: usize,
}

/// Handle used by a test to steer a [`MockBackend`] after it moved into a transport.
#[derive(Debug, Clone)]
pub(crate) struct MockHandle(Arc<Mutex<State>>);

impl MockHandle {
    pub(crate) fn inject(&self, frame: Frame) {
        self.0.lock().unwrap().inbound.push_back(frame);
    }

    pub(crate) fn fail_install(&self, fail: bool) {
        self.0.lock().unwrap().fail_install = fail;
    }

    pub(crate) fn fail_start(&self, fail: bool) {
        self.0.lock().unwrap().fail_start = fail;
    }

    pub(crate) fn fail_stop(&self, fail: bool) {
        self.0.lock().unwrap().fail_stop = fail;
    }

    pub(crate) fn fail_transmit(&self, fail: bool) {
        self.0.lock().unwrap().fail_transmit = fail;
    }

    pub(crate) fn fail_receive(&self, fail: bool) {
        self.0.lock().unwrap().fail_receive = fail;
    }

    pub(crate) fn fail_status(&self, fail: bool) {
        self.0.lock().unwrap().fail_status = fail;
    }

    pub(crate) fn set_pending_tx(&self, pending: usize) {
        self.0.lock().unwrap().pending_tx = pending;
    }

    pub(crate) fn tx_queue_len(&self) -> usize {
        self.0.lock().unwrap().tx_queue_len
    }
}

/// A backend that records every call into a shared [`Journal`].
#[derive(Debug)]
pub(crate) struct MockBackend {
    name: &'static str,
    journal: Journal,
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub(crate) fn new(name: &'static str, journal: &Journal) -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(State::default()));
        let backend = Self {
            name,
            journal: Arc::clone(journal),
            state: Arc::clone(&state),
        };
        (backend, MockHandle(state))
    }

    fn record(&self, call: Call) {
        self.journal.lock().unwrap().push(call);
    }

    fn status_for(fail: bool) -> Result<(), BackendError> {
        if fail {
            Err(BackendError::NotStarted)
        } else {
            Ok(())
        }
    }
}

impl Backend for MockBackend {
    fn install(&mut self, config: &BackendConfig) -> Result<(), BackendError> {
        self.record(Call::Install(self.name));
        let mut state = self.state.lock().unwrap();
        state.tx_queue_len = config.general.tx_queue_len;
        Self::status_for(state.fail_install)
    }

    fn start(&mut self) -> Result<(), BackendError> {
        self.record(Call::Start(self.name));
        Self::status_for(self.state.lock().unwrap().fail_start)
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.record(Call::Stop(self.name));
        Self::status_for(self.state.lock().unwrap().fail_stop)
    }

    fn uninstall(&mut self) -> Result<(), BackendError> {
        self.record(Call::Uninstall(self.name));
        Ok(())
    }

    fn transmit(&mut self, frame: &Frame) -> Result<(), BackendError> {
        self.record(Call::Transmit(self.name, *frame));
        let state = self.state.lock().unwrap();
        if state.fail_transmit {
            return Err(BackendError::QueueFull {
                capacity: state.tx_queue_len,
            });
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Frame>, BackendError> {
        self.record(Call::Receive(self.name));
        let mut state = self.state.lock().unwrap();
        Self::status_for(state.fail_receive)?;
        Ok(state.inbound.pop_front())
    }

    fn status(&self) -> Result<BackendStatus, BackendError> {
        let state = self.state.lock().unwrap();
        Self::status_for(state.fail_status)?;
        Ok(BackendStatus {
            pending_tx: state.pending_tx,
            pending_rx: state.inbound.len(),
        })
    }
}
