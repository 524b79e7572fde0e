//! UUID types.

/// A 16-bit, 32-bit or 128-bit UUID.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Uuid {
    /// 16-bit UUID
    Uuid16([u8; 2]),
    /// 32-bit UUID
    Uuid32([u8; 4]),
    /// 128-bit UUID
    Uuid128([u8; 16]),
}

/// UUID for the Current Time service.
pub const CURRENT_TIME_SERVICE_UUID16: Uuid = Uuid::Uuid16(0x1805u16.to_le_bytes());

/// UUID for the Current Time characteristic.
pub const CURRENT_TIME_UUID16: Uuid = Uuid::Uuid16(0x2A2Bu16.to_le_bytes());

/// UUID for the Heart Rate service.
pub const HEART_RATE_SERVICE_UUID16: Uuid = Uuid::Uuid16(0x180Du16.to_le_bytes());

/// UUID for the Heart Rate Measurement characteristic.
pub const HEART_RATE_MEASUREMENT_UUID16: Uuid = Uuid::Uuid16(0x2A37u16.to_le_bytes());

/// UUID for the Battery service.
pub const BATTERY_SERVICE_UUID16: Uuid = Uuid::Uuid16(0x180Fu16.to_le_bytes());

/// UUID for the Battery Level characteristic.
pub const BATTERY_LEVEL_UUID16: Uuid = Uuid::Uuid16(0x2A19u16.to_le_bytes());

/// UUID for characteristic notification/indication configuration.
pub const CHARACTERISTIC_CCCD_UUID16: Uuid = Uuid::Uuid16(0x2902u16.to_le_bytes());

impl From<u128> for Uuid {
    fn from(data: u128) -> Self {
        Uuid::Uuid128(data.to_le_bytes())
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(data: [u8; 16]) -> Self {
        Uuid::Uuid128(data)
    }
}

impl From<u32> for Uuid {
    fn from(data: u32) -> Self {
        Uuid::Uuid32(data.to_le_bytes())
    }
}

impl From<u16> for Uuid {
    fn from(data: u16) -> Self {
        Uuid::Uuid16(data.to_le_bytes())
    }
}

impl Uuid {
    /// Create a new 16-bit UUID.
    pub const fn new_short(val: u16) -> Self {
        Self::Uuid16(val.to_le_bytes())
    }

    /// Create a new 128-bit UUID.
    pub const fn new_long(val: [u8; 16]) -> Self {
        Self::Uuid128(val)
    }

    /// Get the raw little-endian UUID bytes.
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Uuid::Uuid16(uuid) => uuid,
            Uuid::Uuid32(uuid) => uuid,
            Uuid::Uuid128(uuid) => uuid,
        }
    }
}
