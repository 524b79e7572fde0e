//! Per-characteristic value interpretation.
//!
//! Incoming bytes mean different things depending on which characteristic
//! they came from. The [`Registry`] maps a characteristic or descriptor UUID
//! to a [`ValuePolicy`] that knows how to render the bytes; adding support
//! for a new profile means registering a new entry, not editing the session.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::config;
use crate::time::CurrentTime;
use crate::types::uuid::{
    Uuid, BATTERY_LEVEL_UUID16, CHARACTERISTIC_CCCD_UUID16, CURRENT_TIME_UUID16, HEART_RATE_MEASUREMENT_UUID16,
};
use crate::Error;

/// A rendered characteristic payload.
pub type Payload = String<{ config::PAYLOAD_MAX }>;

/// The named interpretation applied to a characteristic or descriptor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Heart Rate Measurement: flag byte plus an 8 or 16-bit rate.
    HeartRate,
    /// Current Time: the 10-byte calendar value.
    CurrentTime,
    /// Battery Level: a percentage byte.
    BatteryLevel,
    /// The battery level configuration descriptor completion.
    BatteryLevelDescriptor,
    /// Anything else: raw text plus a hex dump.
    Generic,
}

/// How to interpret bytes for one characteristic.
pub trait ValuePolicy {
    /// The kind this policy implements.
    fn kind(&self) -> Kind;

    /// Render a payload into `out`.
    fn render(&self, data: &[u8], out: &mut Payload) -> Result<(), Error>;

    /// Whether enabling notifications additionally requires writing the
    /// characteristic's configuration descriptor on the peripheral.
    /// Local registration alone does not make the peripheral emit
    /// notifications for such characteristics.
    fn needs_cccd_write(&self) -> bool {
        false
    }
}

/// Heart Rate Measurement, per the Heart Rate profile: bit 0 of the flag
/// byte selects a 16-bit little-endian rate at offset 1, otherwise an
/// 8-bit rate at offset 1.
pub struct HeartRatePolicy;

impl ValuePolicy for HeartRatePolicy {
    fn kind(&self) -> Kind {
        Kind::HeartRate
    }

    fn render(&self, data: &[u8], out: &mut Payload) -> Result<(), Error> {
        let rate = match data {
            [flags, lo, hi, ..] if flags & 0x01 != 0 => u16::from_le_bytes([*lo, *hi]),
            [flags, rate, ..] if flags & 0x01 == 0 => *rate as u16,
            _ => return Err(Error::MalformedBuffer),
        };
        write!(out, "{}", rate).map_err(|_| Error::InsufficientSpace)
    }
}

/// Current Time: decode the 10-byte value and render the timestamp.
pub struct CurrentTimePolicy;

impl ValuePolicy for CurrentTimePolicy {
    fn kind(&self) -> Kind {
        Kind::CurrentTime
    }

    fn render(&self, data: &[u8], out: &mut Payload) -> Result<(), Error> {
        let time = CurrentTime::from_bytes(data)?;
        out.push_str(time.render().as_str()).map_err(|_| Error::InsufficientSpace)
    }
}

/// Battery Level: a single percentage byte. Subscribing requires the
/// chained configuration descriptor write on the peripheral.
pub struct BatteryLevelPolicy;

impl ValuePolicy for BatteryLevelPolicy {
    fn kind(&self) -> Kind {
        Kind::BatteryLevel
    }

    fn render(&self, data: &[u8], out: &mut Payload) -> Result<(), Error> {
        let level = data.first().ok_or(Error::MalformedBuffer)?;
        write!(out, "{}", level).map_err(|_| Error::InsufficientSpace)
    }

    fn needs_cccd_write(&self) -> bool {
        true
    }
}

/// The battery level configuration descriptor: surfaces a fixed label
/// rather than decoded bytes.
pub struct BatteryDescriptorPolicy;

impl ValuePolicy for BatteryDescriptorPolicy {
    fn kind(&self) -> Kind {
        Kind::BatteryLevelDescriptor
    }

    fn render(&self, _data: &[u8], out: &mut Payload) -> Result<(), Error> {
        out.push_str("BATTERY_LEVEL").map_err(|_| Error::InsufficientSpace)
    }
}

/// Fallback for unknown characteristics: a best-effort text line, a
/// newline, then an upper-case hex dump. Both representations are kept
/// since the bytes may not be valid text.
pub struct GenericPolicy;

impl ValuePolicy for GenericPolicy {
    fn kind(&self) -> Kind {
        Kind::Generic
    }

    fn render(&self, data: &[u8], out: &mut Payload) -> Result<(), Error> {
        if data.is_empty() {
            return Err(Error::MalformedBuffer);
        }
        push_text_lossy(data, out)?;
        out.push('\n').map_err(|_| Error::InsufficientSpace)?;
        for byte in data {
            write!(out, "{:02X} ", byte).map_err(|_| Error::InsufficientSpace)?;
        }
        Ok(())
    }
}

/// Append the UTF-8 decoding of `data`, replacing invalid sequences with
/// U+FFFD.
fn push_text_lossy(mut data: &[u8], out: &mut Payload) -> Result<(), Error> {
    loop {
        match core::str::from_utf8(data) {
            Ok(text) => {
                out.push_str(text).map_err(|_| Error::InsufficientSpace)?;
                return Ok(());
            }
            Err(err) => {
                let (valid, rest) = data.split_at(err.valid_up_to());
                if let Ok(text) = core::str::from_utf8(valid) {
                    out.push_str(text).map_err(|_| Error::InsufficientSpace)?;
                }
                out.push('\u{fffd}').map_err(|_| Error::InsufficientSpace)?;
                data = match err.error_len() {
                    Some(skip) => &rest[skip..],
                    // Truncated sequence at the end of the payload.
                    None => return Ok(()),
                };
            }
        }
    }
}

static HEART_RATE: HeartRatePolicy = HeartRatePolicy;
static CURRENT_TIME: CurrentTimePolicy = CurrentTimePolicy;
static BATTERY_LEVEL: BatteryLevelPolicy = BatteryLevelPolicy;
static BATTERY_DESCRIPTOR: BatteryDescriptorPolicy = BatteryDescriptorPolicy;
static GENERIC: GenericPolicy = GenericPolicy;

/// The characteristic policy registry.
///
/// Looks up the policy for a characteristic or descriptor UUID, falling
/// back to [`GenericPolicy`] for anything unregistered.
pub struct Registry<'a> {
    entries: Vec<(Uuid, &'a dyn ValuePolicy), { config::POLICIES_MAX }>,
}

impl<'a> Registry<'a> {
    /// Create a registry with the built-in profiles registered.
    pub fn new() -> Self {
        let mut registry = Self { entries: Vec::new() };
        // The registry is sized to hold at least the built-in profiles.
        unwrap!(registry.register(HEART_RATE_MEASUREMENT_UUID16, &HEART_RATE));
        unwrap!(registry.register(CURRENT_TIME_UUID16, &CURRENT_TIME));
        unwrap!(registry.register(BATTERY_LEVEL_UUID16, &BATTERY_LEVEL));
        unwrap!(registry.register(CHARACTERISTIC_CCCD_UUID16, &BATTERY_DESCRIPTOR));
        registry
    }

    /// Register a policy for a characteristic or descriptor UUID.
    pub fn register(&mut self, uuid: Uuid, policy: &'a dyn ValuePolicy) -> Result<(), Error> {
        self.entries.push((uuid, policy)).map_err(|_| Error::InsufficientSpace)
    }

    /// The policy for a UUID.
    pub fn policy(&self, uuid: &Uuid) -> &dyn ValuePolicy {
        self.entries
            .iter()
            .find(|(registered, _)| registered == uuid)
            .map(|(_, policy)| *policy)
            .unwrap_or(&GENERIC)
    }

    /// The interpretation kind for a UUID.
    pub fn classify(&self, uuid: &Uuid) -> Kind {
        self.policy(uuid).kind()
    }
}

impl Default for Registry<'_> {
    fn default() -> Self {
        Self::new()
    }
}
