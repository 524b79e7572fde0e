//! Compile-time configuration.
//!
//! Capacities for the session's queues and buffers. They are plain constants:
//! a client that needs different sizes adjusts them here and rebuilds.

/// Maximum length of a device address string.
pub const ADDRESS_MAX: usize = 32;

/// Maximum length of a characteristic or descriptor value, in bytes.
pub const VALUE_MAX: usize = 64;

/// Maximum length of a rendered event payload.
///
/// Sized for the generic rendering of a [`VALUE_MAX`] value: the lossy text
/// line (up to 3 bytes per input byte), a newline, and the hex dump
/// (3 bytes per input byte).
pub const PAYLOAD_MAX: usize = VALUE_MAX * 6 + 1;

/// Maximum number of services kept in the discovered-services snapshot.
pub const SERVICES_MAX: usize = 8;

/// Maximum number of characteristics per service.
pub const CHARACTERISTICS_MAX: usize = 8;

/// Maximum number of descriptors per characteristic.
pub const DESCRIPTORS_MAX: usize = 4;

/// Depth of the per-session operation queue.
///
/// One operation is outstanding at a time; the rest wait here.
pub const OPERATION_QUEUE_SIZE: usize = 4;

/// Event queue size for every subscriber.
pub const EVENT_QUEUE_SIZE: usize = 8;

/// Maximum number of event subscribers.
pub const EVENT_MAX_SUBSCRIBERS: usize = 4;

/// Maximum number of entries in the characteristic policy registry.
pub const POLICIES_MAX: usize = 8;
