//! The radio transport seam.
//!
//! The platform GATT stack sits behind the [`Radio`] trait: public methods
//! fire a request and return, and every outcome arrives later as a
//! [`LinkEvent`] on the transport's completion stream. The transport allows
//! one outstanding request per connection; the session enforces that.

use core::fmt;

use heapless::{String, Vec};

use crate::config;
use crate::types::uuid::Uuid;

/// An opaque remote device identifier.
///
/// Bound to a session on connect and immutable from then on.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress(String<{ config::ADDRESS_MAX }>);

impl DeviceAddress {
    /// Returns `None` for an empty or oversized address; the session
    /// treats both as unusable.
    pub fn new(address: &str) -> Option<Self> {
        if address.is_empty() {
            return None;
        }
        let mut inner = String::new();
        inner.push_str(address).ok()?;
        Some(Self(inner))
    }

    /// The address string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Status byte attached to a transport completion.
///
/// Zero means success; any other value suppresses the corresponding
/// success event.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct GattStatus {
    value: u8,
}

impl GattStatus {
    /// The operation completed successfully.
    pub const SUCCESS: Self = Self { value: 0x00 };
    /// The attribute cannot be read.
    pub const READ_NOT_PERMITTED: Self = Self { value: 0x02 };
    /// The attribute cannot be written.
    pub const WRITE_NOT_PERMITTED: Self = Self { value: 0x03 };
    /// The attribute requires authentication.
    pub const INSUFFICIENT_AUTHENTICATION: Self = Self { value: 0x05 };
    /// The peripheral does not support the request.
    pub const REQUEST_NOT_SUPPORTED: Self = Self { value: 0x06 };

    /// Wrap a raw transport status byte.
    pub const fn new(value: u8) -> Self {
        Self { value }
    }

    /// Whether the completion reports success.
    pub const fn is_success(self) -> bool {
        self.value == 0x00
    }
}

impl fmt::Display for GattStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::SUCCESS => f.write_str("success"),
            &Self::READ_NOT_PERMITTED => f.write_str("read not permitted"),
            &Self::WRITE_NOT_PERMITTED => f.write_str("write not permitted"),
            &Self::INSUFFICIENT_AUTHENTICATION => f.write_str("insufficient authentication"),
            &Self::REQUEST_NOT_SUPPORTED => f.write_str("request not supported"),
            other => write!(f, "status {:#04x}", other.value),
        }
    }
}

/// Characteristic property bitmask, as reported by service discovery.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacteristicProps(u8);

impl CharacteristicProps {
    /// Broadcast
    pub const BROADCAST: Self = Self(0x01);
    /// Read
    pub const READ: Self = Self(0x02);
    /// Write without response
    pub const WRITE_WITHOUT_RESPONSE: Self = Self(0x04);
    /// Write
    pub const WRITE: Self = Self(0x08);
    /// Notify
    pub const NOTIFY: Self = Self(0x10);
    /// Indicate
    pub const INDICATE: Self = Self(0x20);

    /// Combine two property sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether any property in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// The characteristic can be read.
    pub const fn readable(self) -> bool {
        self.contains(Self::READ)
    }

    /// The characteristic supports any form of write.
    pub const fn writable(self) -> bool {
        self.contains(Self::WRITE.union(Self::WRITE_WITHOUT_RESPONSE))
    }

    /// The characteristic supports write without response.
    pub const fn writable_without_response(self) -> bool {
        self.contains(Self::WRITE_WITHOUT_RESPONSE)
    }

    /// The characteristic supports write with response.
    pub const fn writable_with_response(self) -> bool {
        self.contains(Self::WRITE)
    }

    /// The characteristic supports notifications.
    pub const fn notifiable(self) -> bool {
        self.contains(Self::NOTIFY)
    }

    /// The characteristic supports indications.
    pub const fn indicatable(self) -> bool {
        self.contains(Self::INDICATE)
    }
}

/// A handle to a remote characteristic in the discovered catalog.
///
/// The session never owns or mutates the remote state this points into.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub struct CharacteristicRef {
    /// UUID of the service the characteristic belongs to.
    pub service: Uuid,
    /// UUID of the characteristic.
    pub uuid: Uuid,
    /// Property bitmask.
    pub props: CharacteristicProps,
    /// UUIDs of the characteristic's descriptors.
    pub descriptors: Vec<Uuid, { config::DESCRIPTORS_MAX }>,
}

impl CharacteristicRef {
    /// Look up a descriptor by its UUID.
    pub fn descriptor(&self, uuid: &Uuid) -> Option<&Uuid> {
        self.descriptors.iter().find(|descriptor| *descriptor == uuid)
    }
}

/// One discovered service and its characteristics.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    /// UUID of the service.
    pub uuid: Uuid,
    /// The service's characteristics.
    pub characteristics: Vec<CharacteristicRef, { config::CHARACTERISTICS_MAX }>,
}

/// A characteristic or descriptor value as carried by the transport.
pub type ValueBuf = Vec<u8, { config::VALUE_MAX }>;

/// The discovered-services snapshot.
pub type ServiceCatalog = Vec<ServiceInfo, { config::SERVICES_MAX }>;

/// An asynchronous completion delivered by the transport.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// The connection came up or went down.
    ConnectionChanged {
        /// Whether the link is now connected.
        connected: bool,
    },
    /// Service discovery finished.
    ServicesDiscovered {
        /// Completion status.
        status: GattStatus,
        /// The discovered catalog; empty on failure.
        services: ServiceCatalog,
    },
    /// A characteristic read finished.
    CharacteristicRead {
        /// UUID of the characteristic.
        characteristic: Uuid,
        /// Completion status.
        status: GattStatus,
        /// The value read.
        value: ValueBuf,
    },
    /// A characteristic write finished.
    CharacteristicWrite {
        /// UUID of the characteristic.
        characteristic: Uuid,
        /// Completion status.
        status: GattStatus,
        /// The value written.
        value: ValueBuf,
    },
    /// The peripheral pushed an unsolicited value change.
    CharacteristicChanged {
        /// UUID of the characteristic.
        characteristic: Uuid,
        /// The new value.
        value: ValueBuf,
    },
    /// A descriptor write finished.
    DescriptorWrite {
        /// UUID of the characteristic the descriptor belongs to.
        characteristic: Uuid,
        /// UUID of the descriptor.
        descriptor: Uuid,
        /// Completion status.
        status: GattStatus,
    },
}

/// The platform radio stack.
///
/// Request methods fire and return; outcomes arrive on [`read_event`].
/// Implementations must deliver completions in the order the underlying
/// stack reports them.
///
/// [`read_event`]: Radio::read_event
pub trait Radio {
    /// Transport error for rejected requests.
    type Error: core::fmt::Debug;

    /// Whether a local radio adapter is present.
    fn is_available(&self) -> bool;

    /// Request a new connection to `address`.
    fn connect(&self, address: &DeviceAddress) -> Result<(), Self::Error>;

    /// Request reconnection over the existing link.
    fn reconnect(&self) -> Result<(), Self::Error>;

    /// Request teardown of the active connection.
    fn disconnect(&self) -> Result<(), Self::Error>;

    /// Release the connection resource.
    fn close(&self);

    /// Request discovery of the peripheral's services.
    fn discover_services(&self) -> Result<(), Self::Error>;

    /// Request a characteristic read.
    fn read_characteristic(&self, characteristic: &CharacteristicRef) -> Result<(), Self::Error>;

    /// Request a characteristic write.
    fn write_characteristic(&self, characteristic: &CharacteristicRef, value: &[u8]) -> Result<(), Self::Error>;

    /// Request a descriptor write.
    fn write_descriptor(
        &self,
        characteristic: &CharacteristicRef,
        descriptor: &Uuid,
        value: &[u8],
    ) -> Result<(), Self::Error>;

    /// Register or deregister local interest in notifications for a
    /// characteristic.
    fn set_notify(&self, characteristic: &CharacteristicRef, enabled: bool) -> Result<(), Self::Error>;

    /// Wait for the next completion from the transport.
    async fn read_event(&self) -> LinkEvent;
}
