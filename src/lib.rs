//! An async GATT client for BLE peripherals exposing the Current Time Service.
//!
//! The crate drives one logical connection to one remote peripheral: connect,
//! discover services, read/write characteristics and enable notifications.
//! Completions surface as typed [`event::Event`]s on an ordered channel, with
//! payloads rendered through a per-characteristic policy registry.
#![no_std]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

mod cursor;

pub mod classify;
pub mod codec;
pub mod config;
pub mod event;
pub mod link;
pub mod session;
pub mod time;
pub mod types;

pub use types::uuid::Uuid;

/// Errors raised by the client itself, independent of the radio transport.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No local radio adapter is present, or the session was not initialized.
    NoAdapter,
    /// The operation requires an active connection.
    NotConnected,
    /// The device address is empty or not representable.
    InvalidAddress,
    /// The per-session operation queue is full; retry after a completion.
    QueueFull,
    /// The characteristic does not support the requested operation.
    NotSupported,
    /// A structured payload was shorter than its wire format requires,
    /// or carried a field outside its valid range.
    MalformedBuffer,
    /// The maximum number of event subscribers has been reached.
    SubscriberLimitReached,
    /// Not enough space in the destination buffer.
    InsufficientSpace,
    /// Wire codec error.
    Codec(codec::Error),
}

impl From<codec::Error> for Error {
    fn from(error: codec::Error) -> Self {
        Self::Codec(error)
    }
}

/// Errors surfaced by session operations: either a client error or an error
/// reported by the underlying radio transport.
#[derive(Debug, PartialEq)]
pub enum BleClientError<E> {
    /// Error from the radio transport.
    Radio(E),
    /// Error from the client.
    Client(Error),
}

impl<E> From<Error> for BleClientError<E> {
    fn from(error: Error) -> Self {
        Self::Client(error)
    }
}

impl<E> From<codec::Error> for BleClientError<E> {
    fn from(error: codec::Error) -> Self {
        Self::Client(Error::Codec(error))
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for BleClientError<E>
where
    E: defmt::Format,
{
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            BleClientError::Radio(value) => {
                defmt::write!(fmt, "Radio({})", value)
            }
            BleClientError::Client(value) => {
                defmt::write!(fmt, "Client({})", value)
            }
        }
    }
}
