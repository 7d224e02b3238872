// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Parameter store.
//!
//! A fixed table of named entries readable from every interrupt tier. Each entry is either a
//! *parameter* (written by the operator over the terminal or CAN) or a *spot value* (published by
//! the firmware). Values are held as `f32` in [`AtomicF32`] cells, so reads and writes never
//! block and never mask interrupts.
//!
//! Internal writes (`set_int`/`set_flt`) are silent. External writes go through
//! [`crate::Drive::set_param`], which range-checks and then runs the change notification.

use crate::atomic::AtomicF32;

/// Number of entries in the store.
pub const PARAM_COUNT: usize = 19;

/// Identifier of a parameter or spot value. The discriminant indexes the store.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
#[repr(u8)]
pub enum ParamId {
    // Spot values
    Version,
    Start,
    Opmode,
    Cpuload,
    Udc,
    Boosteramp,
    Il1,
    Il2,

    // Parameters
    Pwmfrq,
    Udcspnt,
    Udckp,
    Udcki,
    Frq,
    Il1gain,
    Il2gain,
    Udcgain,
    Udcofs,
    Canspeed,
    Canperiod,
}

/// Who is allowed to write an entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Operator-writable setting.
    Parameter,
    /// Published by the firmware, read-only from outside.
    Value,
}

/// Static description of one entry.
#[derive(Copy, Clone, Debug)]
pub struct ParamInfo {
    pub name: &'static str,
    pub unit: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub kind: ParamKind,
}

const fn value(name: &'static str, unit: &'static str, min: f32, max: f32) -> ParamInfo {
    ParamInfo {
        name,
        unit,
        min,
        max,
        default: 0.0,
        kind: ParamKind::Value,
    }
}

const fn param(
    name: &'static str,
    unit: &'static str,
    min: f32,
    max: f32,
    default: f32,
) -> ParamInfo {
    ParamInfo {
        name,
        unit,
        min,
        max,
        default,
        kind: ParamKind::Parameter,
    }
}

// Indexed by `ParamId as usize`.
static TABLE: [ParamInfo; PARAM_COUNT] = [
    value("version", "", 0.0, 1000.0),
    // `start` is the operator's mode request: writable, but never saved as a setting.
    ParamInfo {
        kind: ParamKind::Parameter,
        ..value("start", "0=Off, 1=Run", 0.0, 1.0)
    },
    value("opmode", "0=Off, 1=Run", 0.0, 1.0),
    value("cpuload", "%", 0.0, 100.0),
    value("udc", "V", -100.0, 2000.0),
    value("boosteramp", "dig", 0.0, 65535.0),
    value("il1", "A", -1000.0, 1000.0),
    value("il2", "A", -1000.0, 1000.0),
    param("pwmfrq", "0=105kHz, 1=52kHz, 2=26kHz, 3=13kHz, 4=6.5kHz", 0.0, 4.0, 1.0),
    param("udcspnt", "V", 0.0, 1000.0, 0.0),
    param("udckp", "dig/V", 0.0, 10000.0, 10.0),
    param("udcki", "dig/Vs", 0.0, 10000.0, 100.0),
    param("frq", "Hz", 100.0, 20000.0, 10000.0),
    param("il1gain", "dig/A", -100.0, 100.0, 4.7),
    param("il2gain", "dig/A", -100.0, 100.0, 4.7),
    param("udcgain", "dig/V", 0.01, 4095.0, 6.175),
    param("udcofs", "dig", 0.0, 4095.0, 0.0),
    param("canspeed", "0=125k, 1=250k, 2=500k, 3=1M", 0.0, 3.0, 2.0),
    param("canperiod", "0=100ms, 1=10ms", 0.0, 1.0, 0.0),
];

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Version,
        ParamId::Start,
        ParamId::Opmode,
        ParamId::Cpuload,
        ParamId::Udc,
        ParamId::Boosteramp,
        ParamId::Il1,
        ParamId::Il2,
        ParamId::Pwmfrq,
        ParamId::Udcspnt,
        ParamId::Udckp,
        ParamId::Udcki,
        ParamId::Frq,
        ParamId::Il1gain,
        ParamId::Il2gain,
        ParamId::Udcgain,
        ParamId::Udcofs,
        ParamId::Canspeed,
        ParamId::Canperiod,
    ];

    #[inline]
    pub fn info(self) -> &'static ParamInfo {
        &TABLE[self as usize]
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Look an entry up by its terminal name.
    pub fn from_name(name: &str) -> Option<ParamId> {
        ParamId::ALL.iter().copied().find(|id| id.name() == name)
    }
}

/// Error type for external parameter writes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ParamError {
    /// No entry with that name.
    UnknownName,
    /// Spot values cannot be written from outside.
    ReadOnly(ParamId),
    /// Value outside `[min, max]` (or NaN).
    OutOfRange { id: ParamId, value: f32 },
}

/// The store itself. One instance lives inside [`crate::Drive`].
pub struct ParamStore {
    values: [AtomicF32; PARAM_COUNT],
}

impl ParamStore {
    /// Create a store holding every entry's default.
    pub const fn new() -> Self {
        const ZERO: AtomicF32 = AtomicF32::zero();
        let mut values = [ZERO; PARAM_COUNT];

        let mut i = 0;
        while i < PARAM_COUNT {
            values[i] = AtomicF32::new(TABLE[i].default);
            i += 1;
        }

        Self { values }
    }

    /// Restore every entry to its default.
    pub fn load_defaults(&self) {
        for id in ParamId::ALL {
            self.set_flt(id, id.info().default);
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id as usize].load()
    }

    /// Integer part of the entry, truncated toward zero.
    #[inline]
    pub fn get_int(&self, id: ParamId) -> i32 {
        self.get(id) as i32
    }

    /// Firmware-internal write. No range check, no notification.
    #[inline]
    pub fn set_flt(&self, id: ParamId, value: f32) {
        self.values[id as usize].store(value);
    }

    /// Firmware-internal write. No range check, no notification.
    #[inline]
    pub fn set_int(&self, id: ParamId, value: i32) {
        self.set_flt(id, value as f32);
    }

    /// Whether an operator may write `value` to `id`. Stores nothing; the caller stores and
    /// notifies.
    pub(crate) fn check(id: ParamId, value: f32) -> Result<(), ParamError> {
        let info = id.info();

        if info.kind == ParamKind::Value {
            return Err(ParamError::ReadOnly(id));
        }
        if !(info.min..=info.max).contains(&value) {
            return Err(ParamError::OutOfRange { id, value });
        }

        Ok(())
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_ids() {
        for (i, id) in ParamId::ALL.iter().enumerate() {
            assert_eq!(*id as usize, i);
            assert_eq!(ParamId::from_name(id.name()), Some(*id));
        }
    }

    #[test]
    fn defaults_are_within_range() {
        for id in ParamId::ALL {
            let info = id.info();
            assert!(info.min <= info.default && info.default <= info.max, "{}", info.name);
        }
    }

    #[test]
    fn new_store_holds_defaults() {
        let params = ParamStore::new();
        assert_eq!(params.get_int(ParamId::Canspeed), 2);
        assert_eq!(params.get(ParamId::Udcgain), 6.175);
        assert_eq!(params.get_int(ParamId::Opmode), 0);
    }

    #[test]
    fn get_int_truncates() {
        let params = ParamStore::new();
        params.set_flt(ParamId::Udc, 399.9);
        assert_eq!(params.get_int(ParamId::Udc), 399);
        params.set_flt(ParamId::Il1, -2.7);
        assert_eq!(params.get_int(ParamId::Il1), -2);
    }

    #[test]
    fn checked_write_rejects_spot_values() {
        assert_eq!(
            ParamStore::check(ParamId::Opmode, 1.0),
            Err(ParamError::ReadOnly(ParamId::Opmode))
        );
    }

    #[test]
    fn checked_write_rejects_out_of_range_and_nan() {
        assert!(matches!(
            ParamStore::check(ParamId::Pwmfrq, 5.0),
            Err(ParamError::OutOfRange { id: ParamId::Pwmfrq, .. })
        ));
        assert!(ParamStore::check(ParamId::Udcspnt, f32::NAN).is_err());
        assert_eq!(ParamStore::check(ParamId::Pwmfrq, 3.0), Ok(()));
    }

    #[test]
    fn load_defaults_resets_everything() {
        let params = ParamStore::new();
        params.set_flt(ParamId::Udckp, 1234.0);
        params.set_int(ParamId::Opmode, 1);
        params.load_defaults();
        assert_eq!(params.get(ParamId::Udckp), 10.0);
        assert_eq!(params.get_int(ParamId::Opmode), 0);
    }
}
