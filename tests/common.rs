#![allow(dead_code)]

use core::cell::RefCell;
use core::convert::Infallible;

use cts_client::link::{
    CharacteristicProps, CharacteristicRef, DeviceAddress, LinkEvent, Radio, ServiceCatalog, ServiceInfo, ValueBuf,
};
use cts_client::types::uuid::{
    Uuid, BATTERY_LEVEL_UUID16, BATTERY_SERVICE_UUID16, CHARACTERISTIC_CCCD_UUID16, CURRENT_TIME_SERVICE_UUID16,
    CURRENT_TIME_UUID16, HEART_RATE_MEASUREMENT_UUID16, HEART_RATE_SERVICE_UUID16,
};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;

pub const DEVICE_ADDRESS: &str = "C0:FF:EE:00:00:01";

/// A request the session fired on the radio.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Connect(String),
    Reconnect,
    Disconnect,
    Close,
    DiscoverServices,
    Read(Uuid),
    Write(Uuid, Vec<u8>),
    WriteDescriptor(Uuid, Uuid, Vec<u8>),
    SetNotify(Uuid, bool),
}

/// A scripted in-memory radio: records every request and replays the
/// completions a test injects.
pub struct MockRadio {
    available: bool,
    requests: RefCell<Vec<Request>>,
    events: Channel<NoopRawMutex, LinkEvent, 16>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            available: true,
            requests: RefCell::new(Vec::new()),
            events: Channel::new(),
        }
    }

    pub fn without_adapter() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Queue a completion for the session to consume.
    pub fn inject(&self, event: LinkEvent) {
        self.events.try_send(event).expect("mock completion queue full");
    }

    /// Everything the session has requested so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    fn record(&self, request: Request) {
        self.requests.borrow_mut().push(request);
    }
}

impl Radio for MockRadio {
    type Error = Infallible;

    fn is_available(&self) -> bool {
        self.available
    }

    fn connect(&self, address: &DeviceAddress) -> Result<(), Infallible> {
        self.record(Request::Connect(address.as_str().to_string()));
        Ok(())
    }

    fn reconnect(&self) -> Result<(), Infallible> {
        self.record(Request::Reconnect);
        Ok(())
    }

    fn disconnect(&self) -> Result<(), Infallible> {
        self.record(Request::Disconnect);
        Ok(())
    }

    fn close(&self) {
        self.record(Request::Close);
    }

    fn discover_services(&self) -> Result<(), Infallible> {
        self.record(Request::DiscoverServices);
        Ok(())
    }

    fn read_characteristic(&self, characteristic: &CharacteristicRef) -> Result<(), Infallible> {
        self.record(Request::Read(characteristic.uuid.clone()));
        Ok(())
    }

    fn write_characteristic(&self, characteristic: &CharacteristicRef, value: &[u8]) -> Result<(), Infallible> {
        self.record(Request::Write(characteristic.uuid.clone(), value.to_vec()));
        Ok(())
    }

    fn write_descriptor(
        &self,
        characteristic: &CharacteristicRef,
        descriptor: &Uuid,
        value: &[u8],
    ) -> Result<(), Infallible> {
        self.record(Request::WriteDescriptor(
            characteristic.uuid.clone(),
            descriptor.clone(),
            value.to_vec(),
        ));
        Ok(())
    }

    fn set_notify(&self, characteristic: &CharacteristicRef, enabled: bool) -> Result<(), Infallible> {
        self.record(Request::SetNotify(characteristic.uuid.clone(), enabled));
        Ok(())
    }

    async fn read_event(&self) -> LinkEvent {
        self.events.receive().await
    }
}

pub fn value(bytes: &[u8]) -> ValueBuf {
    ValueBuf::from_slice(bytes).expect("value too large for mock")
}

pub fn current_time_characteristic() -> CharacteristicRef {
    CharacteristicRef {
        service: CURRENT_TIME_SERVICE_UUID16,
        uuid: CURRENT_TIME_UUID16,
        props: CharacteristicProps::READ
            .union(CharacteristicProps::WRITE)
            .union(CharacteristicProps::NOTIFY),
        descriptors: heapless::Vec::new(),
    }
}

pub fn heart_rate_characteristic() -> CharacteristicRef {
    CharacteristicRef {
        service: HEART_RATE_SERVICE_UUID16,
        uuid: HEART_RATE_MEASUREMENT_UUID16,
        props: CharacteristicProps::NOTIFY,
        descriptors: heapless::Vec::new(),
    }
}

pub fn battery_characteristic() -> CharacteristicRef {
    let mut descriptors = heapless::Vec::new();
    // A vendor descriptor first: the configuration descriptor must be
    // found by UUID, not by position.
    descriptors.push(Uuid::new_short(0x2901)).unwrap();
    descriptors.push(CHARACTERISTIC_CCCD_UUID16).unwrap();
    CharacteristicRef {
        service: BATTERY_SERVICE_UUID16,
        uuid: BATTERY_LEVEL_UUID16,
        props: CharacteristicProps::READ.union(CharacteristicProps::NOTIFY),
        descriptors,
    }
}

pub fn battery_characteristic_without_cccd() -> CharacteristicRef {
    CharacteristicRef {
        descriptors: heapless::Vec::new(),
        ..battery_characteristic()
    }
}

pub fn catalog() -> ServiceCatalog {
    let mut characteristics = heapless::Vec::new();
    characteristics.push(current_time_characteristic()).unwrap();
    let mut services = ServiceCatalog::new();
    services
        .push(ServiceInfo {
            uuid: CURRENT_TIME_SERVICE_UUID16,
            characteristics,
        })
        .unwrap();
    services
}
