//! The GATT session.
//!
//! A [`GattSession`] owns exactly one logical connection to one remote
//! peripheral. Public operations fire a request and return; every outcome
//! surfaces as an [`Event`] once the corresponding transport completion
//! arrives. The [`run`] task must be polled for anything to happen.
//!
//! The underlying transport allows a single outstanding GATT request per
//! connection, so characteristic and descriptor operations go through a
//! queue that drains one operation at a time.
//!
//! [`run`]: GattSession::run

use core::cell::RefCell;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;

use crate::classify::{Payload, Registry};
use crate::config;
use crate::event::{Event, EventBus};
use crate::link::{CharacteristicRef, DeviceAddress, LinkEvent, Radio, ServiceCatalog};
use crate::types::uuid::{Uuid, CHARACTERISTIC_CCCD_UUID16};
use crate::{BleClientError, Error};

/// Standard descriptor value enabling notification delivery.
pub const ENABLE_NOTIFICATION_VALUE: [u8; 2] = [0x01, 0x00];
/// Standard descriptor value disabling notification delivery.
pub const DISABLE_NOTIFICATION_VALUE: [u8; 2] = [0x00, 0x00];

/// Connection lifecycle state.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection.
    Disconnected,
    /// A connection request is in flight.
    Connecting,
    /// The link is up.
    Connected,
}

#[derive(Debug, Clone)]
enum Operation {
    Read(CharacteristicRef),
    Write(CharacteristicRef, u8),
    SetNotification(CharacteristicRef, bool),
}

struct Inner {
    initialized: bool,
    state: ConnectionState,
    address: Option<DeviceAddress>,
    link_open: bool,
    services: ServiceCatalog,
}

/// A session against one remote GATT peripheral.
pub struct GattSession<'d, R: Radio> {
    radio: &'d R,
    registry: Registry<'d>,
    inner: RefCell<Inner>,
    operations: Channel<NoopRawMutex, Operation, { config::OPERATION_QUEUE_SIZE }>,
    events: EventBus,
}

impl<'d, R: Radio> GattSession<'d, R> {
    /// Create a session with the built-in characteristic policies.
    pub fn new(radio: &'d R) -> Self {
        Self::with_registry(radio, Registry::new())
    }

    /// Create a session with a caller-assembled policy registry.
    pub fn with_registry(radio: &'d R, registry: Registry<'d>) -> Self {
        Self {
            radio,
            registry,
            inner: RefCell::new(Inner {
                initialized: false,
                state: ConnectionState::Disconnected,
                address: None,
                link_open: false,
                services: ServiceCatalog::new(),
            }),
            operations: Channel::new(),
            events: EventBus::new(),
        }
    }

    /// The session's event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.borrow().state
    }

    /// The discovered service catalog; empty until discovery completes.
    pub fn services(&self) -> ServiceCatalog {
        self.inner.borrow().services.clone()
    }

    /// Acquire the local radio adapter.
    ///
    /// Fails with [`Error::NoAdapter`] when the host has no usable radio.
    /// Idempotent.
    pub fn initialize(&self) -> Result<(), BleClientError<R::Error>> {
        if !self.radio.is_available() {
            error!("[session] no radio adapter available");
            return Err(Error::NoAdapter.into());
        }
        self.inner.borrow_mut().initialized = true;
        Ok(())
    }

    /// Request a connection to the peripheral at `address`.
    ///
    /// Returns synchronously once the request is accepted; the outcome
    /// arrives as [`Event::Connected`] (after which service discovery is
    /// chained automatically) or not at all. Connecting again to the
    /// address this session is already bound to reuses the existing link.
    pub fn connect(&self, address: &str) -> Result<(), BleClientError<R::Error>> {
        let mut inner = self.inner.borrow_mut();
        if !inner.initialized {
            warn!("[session] connect requested without an initialized adapter");
            return Err(Error::NoAdapter.into());
        }
        let address = DeviceAddress::new(address).ok_or(Error::InvalidAddress)?;
        if inner.link_open && inner.address.as_ref() == Some(&address) {
            debug!("[session] reusing the existing link");
            self.radio.reconnect().map_err(BleClientError::Radio)?;
            inner.state = ConnectionState::Connecting;
            return Ok(());
        }
        self.radio.connect(&address).map_err(BleClientError::Radio)?;
        inner.address = Some(address);
        inner.link_open = true;
        inner.state = ConnectionState::Connecting;
        Ok(())
    }

    /// Request teardown of the active connection.
    ///
    /// The outcome arrives as [`Event::Disconnected`].
    pub fn disconnect(&self) -> Result<(), BleClientError<R::Error>> {
        let inner = self.inner.borrow();
        if !inner.initialized || !inner.link_open {
            warn!("[session] disconnect requested without an active link");
            return Err(Error::NotConnected.into());
        }
        self.radio.disconnect().map_err(BleClientError::Radio)
    }

    /// Release the connection resource.
    ///
    /// Safe to call any number of times. A subsequent [`connect`] behaves
    /// as a fresh connection.
    ///
    /// [`connect`]: GattSession::connect
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.link_open {
            self.radio.close();
        }
        inner.link_open = false;
        inner.address = None;
        inner.state = ConnectionState::Disconnected;
        inner.services.clear();
    }

    /// Queue a characteristic read. The value arrives as
    /// [`Event::DataAvailable`], rendered by the characteristic's policy.
    pub fn read_characteristic(&self, characteristic: &CharacteristicRef) -> Result<(), BleClientError<R::Error>> {
        self.enqueue(Operation::Read(characteristic.clone()))
    }

    /// Queue a single-byte characteristic write. Completion arrives as
    /// [`Event::DataWritten`].
    pub fn write_characteristic(
        &self,
        characteristic: &CharacteristicRef,
        value: u8,
    ) -> Result<(), BleClientError<R::Error>> {
        self.enqueue(Operation::Write(characteristic.clone(), value))
    }

    /// Queue a notification toggle for a characteristic.
    ///
    /// Interest is always registered locally with the radio. When the
    /// characteristic's policy requires it, the standard enable/disable
    /// value is additionally written to the configuration descriptor,
    /// looked up by its UUID; that write completes as
    /// [`Event::NotificationEnabled`].
    pub fn set_notification(
        &self,
        characteristic: &CharacteristicRef,
        enabled: bool,
    ) -> Result<(), BleClientError<R::Error>> {
        if self.registry.policy(&characteristic.uuid).needs_cccd_write()
            && characteristic.descriptor(&CHARACTERISTIC_CCCD_UUID16).is_none()
        {
            warn!("[session] characteristic {:?} has no configuration descriptor", characteristic.uuid);
            return Err(Error::NotSupported.into());
        }
        self.enqueue(Operation::SetNotification(characteristic.clone(), enabled))
    }

    fn enqueue(&self, operation: Operation) -> Result<(), BleClientError<R::Error>> {
        if self.inner.borrow().state != ConnectionState::Connected {
            warn!("[session] operation requested while not connected");
            return Err(Error::NotConnected.into());
        }
        self.operations.try_send(operation).map_err(|_| Error::QueueFull.into())
    }

    /// Process transport completions and drain the operation queue.
    ///
    /// Must run alongside any use of the session; events only flow while
    /// this task is polled. Failed completions are logged and their
    /// success events suppressed; the session stays usable.
    pub async fn run(&self) -> Result<(), BleClientError<R::Error>> {
        loop {
            match select(self.operations.receive(), self.radio.read_event()).await {
                Either::First(operation) => {
                    if self.dispatch(&operation) {
                        loop {
                            let event = self.radio.read_event().await;
                            if self.handle_link_event(event, Some(&operation)) {
                                break;
                            }
                        }
                    }
                }
                Either::Second(event) => {
                    self.handle_link_event(event, None);
                }
            }
        }
    }

    /// Fire a queued operation on the radio. Returns whether a completion
    /// should be awaited before the next operation.
    fn dispatch(&self, operation: &Operation) -> bool {
        if self.inner.borrow().state != ConnectionState::Connected {
            warn!("[session] dropping queued operation, link no longer connected");
            return false;
        }
        match operation {
            Operation::Read(characteristic) => {
                if self.radio.read_characteristic(characteristic).is_err() {
                    warn!("[session] read request rejected by radio");
                    return false;
                }
                true
            }
            Operation::Write(characteristic, value) => {
                if self.radio.write_characteristic(characteristic, &[*value]).is_err() {
                    warn!("[session] write request rejected by radio");
                    return false;
                }
                true
            }
            Operation::SetNotification(characteristic, enabled) => {
                self.dispatch_set_notification(characteristic, *enabled)
            }
        }
    }

    fn dispatch_set_notification(&self, characteristic: &CharacteristicRef, enabled: bool) -> bool {
        if self.radio.set_notify(characteristic, enabled).is_err() {
            warn!("[session] notification registration rejected by radio");
            return false;
        }
        if !self.registry.policy(&characteristic.uuid).needs_cccd_write() {
            // Local registration only; nothing further to wait for.
            return false;
        }
        // The peripheral only emits notifications once its configuration
        // descriptor is written; local registration alone is not enough.
        let Some(descriptor) = characteristic.descriptor(&CHARACTERISTIC_CCCD_UUID16) else {
            warn!("[session] characteristic {:?} has no configuration descriptor", characteristic.uuid);
            return false;
        };
        let value: &[u8] = if enabled {
            &ENABLE_NOTIFICATION_VALUE
        } else {
            &DISABLE_NOTIFICATION_VALUE
        };
        if self.radio.write_descriptor(characteristic, descriptor, value).is_err() {
            warn!("[session] descriptor write rejected by radio");
            return false;
        }
        true
    }

    /// Apply one transport completion. Returns whether it completes the
    /// in-flight operation.
    fn handle_link_event(&self, event: LinkEvent, in_flight: Option<&Operation>) -> bool {
        match event {
            LinkEvent::ConnectionChanged { connected: true } => {
                self.inner.borrow_mut().state = ConnectionState::Connected;
                info!("[session] connected, starting service discovery");
                self.events.publish(Event::Connected);
                // Discovery is chained here, not requested by the caller.
                if self.radio.discover_services().is_err() {
                    warn!("[session] service discovery request rejected by radio");
                }
                false
            }
            LinkEvent::ConnectionChanged { connected: false } => {
                self.inner.borrow_mut().state = ConnectionState::Disconnected;
                info!("[session] disconnected");
                self.events.publish(Event::Disconnected);
                // Abort whatever was in flight; its completion will never come.
                in_flight.is_some()
            }
            LinkEvent::ServicesDiscovered { status, services } => {
                if status.is_success() {
                    self.inner.borrow_mut().services = services;
                    self.events.publish(Event::ServicesDiscovered);
                } else {
                    warn!("[session] service discovery failed: {:?}", status);
                }
                false
            }
            LinkEvent::CharacteristicRead {
                characteristic,
                status,
                value,
            } => {
                if status.is_success() {
                    self.publish_data(&characteristic, &value, false);
                } else {
                    warn!("[session] read of {:?} failed: {:?}", characteristic, status);
                }
                matches!(in_flight, Some(Operation::Read(c)) if c.uuid == characteristic)
            }
            LinkEvent::CharacteristicWrite {
                characteristic,
                status,
                value,
            } => {
                if status.is_success() {
                    self.publish_data(&characteristic, &value, true);
                } else {
                    warn!("[session] write of {:?} failed: {:?}", characteristic, status);
                }
                matches!(in_flight, Some(Operation::Write(c, _)) if c.uuid == characteristic)
            }
            LinkEvent::CharacteristicChanged { characteristic, value } => {
                self.publish_data(&characteristic, &value, false);
                false
            }
            LinkEvent::DescriptorWrite {
                characteristic,
                descriptor,
                status,
            } => {
                let done = matches!(in_flight, Some(Operation::SetNotification(c, _)) if c.uuid == characteristic);
                if status.is_success() {
                    self.events.publish(Event::NotificationEnabled { descriptor });
                } else {
                    warn!("[session] descriptor write on {:?} failed: {:?}", characteristic, status);
                }
                done
            }
        }
    }

    fn publish_data(&self, characteristic: &Uuid, value: &[u8], written: bool) {
        let mut payload = Payload::new();
        match self.registry.policy(characteristic).render(value, &mut payload) {
            Ok(()) => {
                let event = if written {
                    Event::DataWritten { payload }
                } else {
                    Event::DataAvailable { payload }
                };
                self.events.publish(event);
            }
            Err(e) => warn!("[session] could not render value for {:?}: {:?}", characteristic, e),
        }
    }
}
