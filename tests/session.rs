use cts_client::event::Event;
use cts_client::link::{GattStatus, LinkEvent};
use cts_client::session::{ConnectionState, GattSession};
use cts_client::types::uuid::{BATTERY_LEVEL_UUID16, CHARACTERISTIC_CCCD_UUID16, CURRENT_TIME_UUID16, HEART_RATE_MEASUREMENT_UUID16};
use cts_client::{BleClientError, Error};

mod common;

use common::{MockRadio, Request, DEVICE_ADDRESS};

// E6 07 0A 10 0D 2F 34 07 03 00 -> 16.10.2022 13:47:52
const EXAMPLE_TIME: [u8; 10] = [0xE6, 0x07, 0x0A, 0x10, 0x0D, 0x2F, 0x34, 0x07, 0x03, 0x00];

#[test]
fn initialize_fails_without_adapter() {
    let radio = MockRadio::without_adapter();
    let session = GattSession::new(&radio);
    assert_eq!(session.initialize(), Err(BleClientError::Client(Error::NoAdapter)));
}

#[test]
fn connect_requires_initialized_adapter() {
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();
    assert_eq!(
        session.connect(DEVICE_ADDRESS),
        Err(BleClientError::Client(Error::NoAdapter))
    );
    assert_eq!(events.try_next(), None);
    assert!(radio.requests().is_empty());
}

#[test]
fn connect_rejects_empty_address() {
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();
    session.initialize().unwrap();
    assert_eq!(session.connect(""), Err(BleClientError::Client(Error::InvalidAddress)));
    assert_eq!(events.try_next(), None);
    assert!(radio.requests().is_empty());
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[test]
fn connect_transitions_to_connecting() {
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    session.initialize().unwrap();
    session.connect(DEVICE_ADDRESS).unwrap();
    assert_eq!(session.state(), ConnectionState::Connecting);
    assert_eq!(radio.requests(), vec![Request::Connect(DEVICE_ADDRESS.to_string())]);
}

#[test]
fn connect_to_bound_address_reuses_link() {
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    session.initialize().unwrap();
    session.connect(DEVICE_ADDRESS).unwrap();
    session.connect(DEVICE_ADDRESS).unwrap();
    assert_eq!(
        radio.requests(),
        vec![Request::Connect(DEVICE_ADDRESS.to_string()), Request::Reconnect]
    );
}

#[test]
fn close_is_idempotent_and_resets_the_session() {
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    session.initialize().unwrap();
    session.connect(DEVICE_ADDRESS).unwrap();
    session.close();
    session.close();
    // Connecting again after close opens a fresh connection, not a reuse.
    session.connect(DEVICE_ADDRESS).unwrap();
    assert_eq!(
        radio.requests(),
        vec![
            Request::Connect(DEVICE_ADDRESS.to_string()),
            Request::Close,
            Request::Connect(DEVICE_ADDRESS.to_string()),
        ]
    );
}

#[test]
fn disconnect_requires_an_open_link() {
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    session.initialize().unwrap();
    assert_eq!(session.disconnect(), Err(BleClientError::Client(Error::NotConnected)));
    session.connect(DEVICE_ADDRESS).unwrap();
    session.disconnect().unwrap();
    assert!(radio.requests().contains(&Request::Disconnect));
}

#[test]
fn operations_require_a_connection() {
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    session.initialize().unwrap();
    let characteristic = common::current_time_characteristic();
    assert_eq!(
        session.read_characteristic(&characteristic),
        Err(BleClientError::Client(Error::NotConnected))
    );
    assert_eq!(
        session.write_characteristic(&characteristic, 1),
        Err(BleClientError::Client(Error::NotConnected))
    );
    assert_eq!(
        session.set_notification(&characteristic, true),
        Err(BleClientError::Client(Error::NotConnected))
    );
}

#[test]
fn set_notification_needs_a_configuration_descriptor() {
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    session.initialize().unwrap();
    // The battery policy requires the descriptor write; a characteristic
    // without the descriptor is rejected up front.
    assert_eq!(
        session.set_notification(&common::battery_characteristic_without_cccd(), true),
        Err(BleClientError::Client(Error::NotSupported))
    );
}

async fn connect_and_wait(
    session: &GattSession<'_, MockRadio>,
    radio: &MockRadio,
    events: &mut cts_client::event::EventListener<'_>,
) {
    session.initialize().unwrap();
    session.connect(DEVICE_ADDRESS).unwrap();
    radio.inject(LinkEvent::ConnectionChanged { connected: true });
    assert_eq!(events.next().await, Event::Connected);
    assert_eq!(session.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn connection_chains_service_discovery() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            // Discovery was requested by the session itself.
            assert!(radio.requests().contains(&Request::DiscoverServices));
            radio.inject(LinkEvent::ServicesDiscovered {
                status: GattStatus::SUCCESS,
                services: common::catalog(),
            });
            assert_eq!(events.next().await, Event::ServicesDiscovered);
            let services = session.services();
            assert_eq!(services.len(), 1);
            assert_eq!(services[0].characteristics[0].uuid, CURRENT_TIME_UUID16);
        } => {}
    }
}

#[tokio::test]
async fn failed_discovery_emits_no_event() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            radio.inject(LinkEvent::ServicesDiscovered {
                status: GattStatus::REQUEST_NOT_SUPPORTED,
                services: common::catalog(),
            });
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            assert_eq!(events.try_next(), None);
            assert!(session.services().is_empty());
        } => {}
    }
}

#[tokio::test]
async fn read_renders_current_time() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            session.read_characteristic(&common::current_time_characteristic()).unwrap();
            radio.inject(LinkEvent::CharacteristicRead {
                characteristic: CURRENT_TIME_UUID16,
                status: GattStatus::SUCCESS,
                value: common::value(&EXAMPLE_TIME),
            });
            match events.next().await {
                Event::DataAvailable { payload } => assert_eq!(payload.as_str(), "16.10.2022 13:47"),
                other => panic!("unexpected event: {:?}", other),
            }
            assert!(radio.requests().contains(&Request::Read(CURRENT_TIME_UUID16)));
        } => {}
    }
}

#[tokio::test]
async fn write_completion_reports_data_written() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            session.write_characteristic(&common::current_time_characteristic(), 0x42).unwrap();
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            assert!(radio.requests().contains(&Request::Write(CURRENT_TIME_UUID16, vec![0x42])));
            radio.inject(LinkEvent::CharacteristicWrite {
                characteristic: CURRENT_TIME_UUID16,
                status: GattStatus::SUCCESS,
                value: common::value(&EXAMPLE_TIME),
            });
            match events.next().await {
                Event::DataWritten { payload } => assert_eq!(payload.as_str(), "16.10.2022 13:47"),
                other => panic!("unexpected event: {:?}", other),
            }
        } => {}
    }
}

#[tokio::test]
async fn operations_are_serialized() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            session.read_characteristic(&common::current_time_characteristic()).unwrap();
            session.read_characteristic(&common::battery_characteristic()).unwrap();
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            // Only the first read has been fired; the second waits for the
            // first completion.
            let reads = |requests: &[Request]| {
                requests
                    .iter()
                    .filter(|request| matches!(request, Request::Read(_)))
                    .count()
            };
            assert_eq!(reads(&radio.requests()), 1);
            radio.inject(LinkEvent::CharacteristicRead {
                characteristic: CURRENT_TIME_UUID16,
                status: GattStatus::SUCCESS,
                value: common::value(&EXAMPLE_TIME),
            });
            assert!(matches!(events.next().await, Event::DataAvailable { .. }));
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            assert_eq!(reads(&radio.requests()), 2);
            assert!(radio.requests().contains(&Request::Read(BATTERY_LEVEL_UUID16)));
        } => {}
    }
}

#[tokio::test]
async fn failed_read_suppresses_the_event_and_session_recovers() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            session.read_characteristic(&common::current_time_characteristic()).unwrap();
            radio.inject(LinkEvent::CharacteristicRead {
                characteristic: CURRENT_TIME_UUID16,
                status: GattStatus::READ_NOT_PERMITTED,
                value: common::value(&[]),
            });
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            assert_eq!(events.try_next(), None);
            // Retrying the same request works.
            session.read_characteristic(&common::current_time_characteristic()).unwrap();
            radio.inject(LinkEvent::CharacteristicRead {
                characteristic: CURRENT_TIME_UUID16,
                status: GattStatus::SUCCESS,
                value: common::value(&EXAMPLE_TIME),
            });
            assert!(matches!(events.next().await, Event::DataAvailable { .. }));
        } => {}
    }
}

#[tokio::test]
async fn set_notification_chains_the_descriptor_write() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            let battery = common::battery_characteristic();
            session.set_notification(&battery, true).unwrap();
            radio.inject(LinkEvent::DescriptorWrite {
                characteristic: BATTERY_LEVEL_UUID16,
                descriptor: CHARACTERISTIC_CCCD_UUID16,
                status: GattStatus::SUCCESS,
            });
            assert_eq!(
                events.next().await,
                Event::NotificationEnabled {
                    descriptor: CHARACTERISTIC_CCCD_UUID16
                }
            );
            let requests = radio.requests();
            assert!(requests.contains(&Request::SetNotify(BATTERY_LEVEL_UUID16, true)));
            assert!(requests.contains(&Request::WriteDescriptor(
                BATTERY_LEVEL_UUID16,
                CHARACTERISTIC_CCCD_UUID16,
                vec![0x01, 0x00]
            )));
        } => {}
    }
}

#[tokio::test]
async fn set_notification_without_policy_is_local_only() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            // The current time policy does not request a descriptor write:
            // local registration completes the operation immediately.
            session.set_notification(&common::current_time_characteristic(), true).unwrap();
            session.read_characteristic(&common::current_time_characteristic()).unwrap();
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            let requests = radio.requests();
            assert!(requests.contains(&Request::SetNotify(CURRENT_TIME_UUID16, true)));
            assert!(!requests.iter().any(|request| matches!(request, Request::WriteDescriptor(..))));
            // The queue moved straight on to the read.
            assert!(requests.contains(&Request::Read(CURRENT_TIME_UUID16)));
        } => {}
    }
}

#[tokio::test]
async fn notifications_flow_through_the_classifier() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            // Unsolicited value change while no operation is in flight.
            radio.inject(LinkEvent::CharacteristicChanged {
                characteristic: HEART_RATE_MEASUREMENT_UUID16,
                value: common::value(&[0x01, 0x48, 0x00]),
            });
            match events.next().await {
                Event::DataAvailable { payload } => assert_eq!(payload.as_str(), "72"),
                other => panic!("unexpected event: {:?}", other),
            }
        } => {}
    }
}

#[tokio::test]
async fn disconnect_event_aborts_the_in_flight_operation() {
    let _ = env_logger::try_init();
    let radio = MockRadio::new();
    let session = GattSession::new(&radio);
    let mut events = session.events().subscribe().unwrap();

    tokio::select! {
        _ = session.run() => unreachable!("run() does not return"),
        _ = async {
            connect_and_wait(&session, &radio, &mut events).await;
            session.read_characteristic(&common::current_time_characteristic()).unwrap();
            radio.inject(LinkEvent::ConnectionChanged { connected: false });
            assert_eq!(events.next().await, Event::Disconnected);
            assert_eq!(session.state(), ConnectionState::Disconnected);
            // The read never completed and further operations are rejected.
            assert_eq!(
                session.read_characteristic(&common::current_time_characteristic()),
                Err(BleClientError::Client(Error::NotConnected))
            );
        } => {}
    }
}
