//! Current Time Service wire codec.
//!
//! The Current Time characteristic carries a fixed 10-byte value:
//!
//! `[year_lo, year_hi, month, day, hour, minute, second, weekday, fractions256, adjust_reason]`
//!
//! The year is a little-endian composite, the month is 1-based, and the
//! fractions byte counts coarse 1/256-of-a-second units. Field order and
//! widths must match this layout exactly for interoperability with real
//! peripherals.

use core::fmt::Write;

use heapless::String;

use crate::codec::{self, Decode, Encode, FixedSize};
use crate::cursor::{ReadCursor, WriteCursor};
use crate::Error;

/// Weekday code for a date the calendar cannot produce.
const DAY_UNKNOWN: u8 = 0;

/// Rendered timestamp, `dd.MM.yyyy HH:mm`.
pub type RenderedTime = String<20>;

/// A day of the week, in the Bluetooth SIG numbering.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weekday {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl Weekday {
    /// The wire code for this weekday: Monday = 1 through Sunday = 7.
    pub const fn code(self) -> u8 {
        match self {
            Weekday::Monday => 1,
            Weekday::Tuesday => 2,
            Weekday::Wednesday => 3,
            Weekday::Thursday => 4,
            Weekday::Friday => 5,
            Weekday::Saturday => 6,
            Weekday::Sunday => 7,
        }
    }
}

/// The wire code for a possibly-unknown weekday. Total: any value the
/// calendar cannot produce maps to 0.
pub fn day_of_week_code(weekday: Option<Weekday>) -> u8 {
    weekday.map(Weekday::code).unwrap_or(DAY_UNKNOWN)
}

/// Day of the week for a calendar date, `None` if the date is not valid.
pub fn weekday_of(year: u16, month: u8, day: u8) -> Option<Weekday> {
    if year == 0 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    // Sakamoto's method, yielding 0 = Sunday .. 6 = Saturday.
    const OFFSETS: [u32; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
    let y = if month < 3 { (year - 1) as u32 } else { year as u32 };
    let index = (y + y / 4 - y / 100 + y / 400 + OFFSETS[(month - 1) as usize] + day as u32) % 7;
    Some(match index {
        1 => Weekday::Monday,
        2 => Weekday::Tuesday,
        3 => Weekday::Wednesday,
        4 => Weekday::Thursday,
        5 => Weekday::Friday,
        6 => Weekday::Saturday,
        _ => Weekday::Sunday,
    })
}

/// A decoded Current Time value.
///
/// The weekday and fractions bytes are preserved even though [`render`]
/// ignores them, so a consumer that needs them has the full wire value.
///
/// [`render`]: CurrentTime::render
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentTime {
    /// Calendar year.
    pub year: u16,
    /// Calendar month, 1-12.
    pub month: u8,
    /// Day of month, 1-31.
    pub day: u8,
    /// Hour of day.
    pub hour: u8,
    /// Minute.
    pub minute: u8,
    /// Second.
    pub second: u8,
    /// Weekday code as received: 1 = Monday .. 7 = Sunday, 0 = unknown.
    /// Recomputed from the date on encode.
    pub weekday: u8,
    /// Fractions of a second in 1/256 units.
    pub fractions256: u8,
    /// Why the time was last adjusted. Carried as an opaque byte.
    pub adjust_reason: u8,
}

impl FixedSize for CurrentTime {
    const SIZE: usize = 10;
}

impl Decode<'_> for CurrentTime {
    fn decode(src: &[u8]) -> Result<Self, codec::Error> {
        if src.len() < Self::SIZE {
            return Err(codec::Error::InsufficientSpace);
        }
        let mut r = ReadCursor::new(src);
        let year: u16 = r.read()?;
        let month: u8 = r.read()?;
        let day: u8 = r.read()?;
        let hour: u8 = r.read()?;
        let minute: u8 = r.read()?;
        let second: u8 = r.read()?;
        let weekday: u8 = r.read()?;
        let fractions256: u8 = r.read()?;
        let adjust_reason: u8 = r.read()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(codec::Error::InvalidValue);
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday,
            fractions256,
            adjust_reason,
        })
    }
}

impl Encode for CurrentTime {
    fn encode(&self, dest: &mut [u8]) -> Result<(), codec::Error> {
        let mut w = WriteCursor::new(dest);
        w.write(self.year)?;
        w.write(self.month)?;
        w.write(self.day)?;
        w.write(self.hour)?;
        w.write(self.minute)?;
        w.write(self.second)?;
        w.write(day_of_week_code(self.weekday_of_date()))?;
        w.write(self.fractions256)?;
        w.write(self.adjust_reason)?;
        Ok(())
    }
}

impl CurrentTime {
    /// Decode a Current Time value from a characteristic payload.
    ///
    /// Fails with [`Error::MalformedBuffer`] when fewer than 10 bytes are
    /// supplied, or when the month or day field is out of range.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        Self::decode(data).map_err(|_| Error::MalformedBuffer)
    }

    /// Build a value from calendar fields.
    ///
    /// The fractions byte is `millisecond / 256`, truncated toward zero.
    /// The precision loss is part of the wire format.
    pub fn from_calendar(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
    ) -> Result<Self, Error> {
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) || hour > 23 || minute > 59 || second > 59 {
            return Err(Error::MalformedBuffer);
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            weekday: day_of_week_code(weekday_of(year, month, day)),
            fractions256: (millisecond / 256) as u8,
            adjust_reason: 0,
        })
    }

    /// Encode to the 10-byte wire format with the given adjust reason.
    ///
    /// The weekday byte is recomputed from the date rather than copied.
    pub fn to_bytes(&self, adjust_reason: u8) -> [u8; Self::SIZE] {
        let mut value = *self;
        value.adjust_reason = adjust_reason;
        let mut buf = [0; Self::SIZE];
        // A SIZE-byte buffer always has room for the full layout.
        unwrap!(value.encode(&mut buf[..]));
        buf
    }

    /// Day of the week derived from the date fields.
    pub fn weekday_of_date(&self) -> Option<Weekday> {
        weekday_of(self.year, self.month, self.day)
    }

    /// Render as `dd.MM.yyyy HH:mm`. Seconds are dropped from the display
    /// but preserved in the value.
    pub fn render(&self) -> RenderedTime {
        let mut out = RenderedTime::new();
        // Widest rendering is 17 bytes (a five-digit year), within capacity.
        let _ = write!(
            out,
            "{:02}.{:02}.{:04} {:02}:{:02}",
            self.day, self.month, self.year, self.hour, self.minute
        );
        out
    }
}
