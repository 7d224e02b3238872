// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin-init record layout.
//!
//! The boot loader reads [`RECORD_WORDS`] words from the start of the record sector:
//!
//! | Words | Content |
//! | ----- | ------- |
//! | `2n` | GPIO port base address of slot `n` (0 = empty) |
//! | `2n + 1` | bits 0..16 pin mask, bits 16..24 direction, bits 24..32 level |
//! | `PIN_DATA_WORDS` | CRC-32 over all preceding words |
//!
//! It recomputes the CRC with the hardware unit and, on a match, applies every command before
//! jumping to the firmware.

use super::crc::Crc32;
use crate::config::PIN_COMMAND_SLOTS;

/// Data words before the checksum.
pub const PIN_DATA_WORDS: usize = 2 * PIN_COMMAND_SLOTS;

/// Total record size in words, checksum included.
pub const RECORD_WORDS: usize = PIN_DATA_WORDS + 1;

const GPIO_BASE: u32 = 0x4002_0000;
const GPIO_STRIDE: u32 = 0x400;

const MASK_BITS: u32 = 0x0000_FFFF;
const DIRECTION_SHIFT: u32 = 16;
const LEVEL_SHIFT: u32 = 24;

/// GPIO port on the AHB1 bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
}

impl Port {
    pub const ALL: [Port; 11] = [
        Port::A,
        Port::B,
        Port::C,
        Port::D,
        Port::E,
        Port::F,
        Port::G,
        Port::H,
        Port::I,
        Port::J,
        Port::K,
    ];

    /// Register block base address.
    #[inline]
    pub const fn base(self) -> u32 {
        GPIO_BASE + GPIO_STRIDE * self as u32
    }

    pub fn from_base(address: u32) -> Option<Port> {
        Port::ALL.iter().copied().find(|p| p.base() == address)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Direction {
    Input = 0,
    Output = 1,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum Level {
    Low = 0,
    High = 1,
}

/// Terminal state of one group of pins on one port.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub struct PinCommand {
    pub port: Port,
    pub pins: u16,
    pub direction: Direction,
    pub level: Level,
}

impl PinCommand {
    pub const fn output(port: Port, pins: u16, level: Level) -> Self {
        Self {
            port,
            pins,
            direction: Direction::Output,
            level,
        }
    }

    pub const fn input(port: Port, pins: u16) -> Self {
        Self {
            port,
            pins,
            direction: Direction::Input,
            level: Level::Low,
        }
    }

    fn encode(&self) -> [u32; 2] {
        [
            self.port.base(),
            self.pins as u32
                | (self.direction as u32) << DIRECTION_SHIFT
                | (self.level as u32) << LEVEL_SHIFT,
        ]
    }

    fn decode(slot: usize, address: u32, word: u32) -> Result<Option<Self>, DecodeError> {
        if address == 0 {
            return if word == 0 {
                Ok(None)
            } else {
                Err(DecodeError::StrayData { slot })
            };
        }

        let port = Port::from_base(address).ok_or(DecodeError::UnknownPort { slot, address })?;

        let direction = match (word >> DIRECTION_SHIFT) & 0xFF {
            0 => Direction::Input,
            1 => Direction::Output,
            _ => return Err(DecodeError::InvalidDirection { slot }),
        };

        let level = match word >> LEVEL_SHIFT {
            0 => Level::Low,
            1 => Level::High,
            _ => return Err(DecodeError::InvalidLevel { slot }),
        };

        Ok(Some(Self {
            port,
            pins: (word & MASK_BITS) as u16,
            direction,
            level,
        }))
    }
}

/// Why a stored record was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "board", derive(defmt::Format))]
pub enum DecodeError {
    Checksum { stored: u32, computed: u32 },
    UnknownPort { slot: usize, address: u32 },
    InvalidDirection { slot: usize },
    InvalidLevel { slot: usize },
    /// Empty slot with a non-zero command word.
    StrayData { slot: usize },
}

/// Fixed-capacity table of pin commands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PinConfigRecord {
    commands: [Option<PinCommand>; PIN_COMMAND_SLOTS],
}

impl PinConfigRecord {
    pub const fn new(commands: [Option<PinCommand>; PIN_COMMAND_SLOTS]) -> Self {
        Self { commands }
    }

    pub const fn empty() -> Self {
        Self::new([None; PIN_COMMAND_SLOTS])
    }

    /// Occupied slots, in slot order.
    pub fn commands(&self) -> impl Iterator<Item = &PinCommand> {
        self.commands.iter().flatten()
    }

    pub fn data_words(&self) -> [u32; PIN_DATA_WORDS] {
        let mut words = [0u32; PIN_DATA_WORDS];
        for (slot, command) in self.commands.iter().enumerate() {
            if let Some(command) = command {
                words[2 * slot..2 * slot + 2].copy_from_slice(&command.encode());
            }
        }
        words
    }

    pub fn checksum<C: Crc32>(&self, crc: &mut C) -> u32 {
        crc.checksum(&self.data_words())
    }

    /// Flash image, checksum last.
    pub fn encode<C: Crc32>(&self, crc: &mut C) -> [u32; RECORD_WORDS] {
        let data = self.data_words();

        let mut words = [0u32; RECORD_WORDS];
        words[..PIN_DATA_WORDS].copy_from_slice(&data);
        words[PIN_DATA_WORDS] = crc.checksum(&data);
        words
    }

    /// Validate a flash image the way the boot loader does.
    pub fn decode<C: Crc32>(words: &[u32; RECORD_WORDS], crc: &mut C) -> Result<Self, DecodeError> {
        let stored = words[PIN_DATA_WORDS];
        let computed = crc.checksum(&words[..PIN_DATA_WORDS]);
        if stored != computed {
            return Err(DecodeError::Checksum { stored, computed });
        }

        let mut commands = [None; PIN_COMMAND_SLOTS];
        for (slot, command) in commands.iter_mut().enumerate() {
            *command = PinCommand::decode(slot, words[2 * slot], words[2 * slot + 1])?;
        }

        Ok(Self { commands })
    }
}

/// Pin states the boot loader establishes before this firmware runs.
///
/// PC13 drives the status LED; it must come up as a low output.
pub const fn desired_record() -> PinConfigRecord {
    let mut commands = [None; PIN_COMMAND_SLOTS];
    commands[0] = Some(PinCommand::output(Port::C, 1 << 13, Level::Low));
    PinConfigRecord::new(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pininit::crc::SoftCrc32;

    #[test]
    fn port_addresses() {
        assert_eq!(Port::A.base(), 0x4002_0000);
        assert_eq!(Port::C.base(), 0x4002_0800);
        assert_eq!(Port::K.base(), 0x4002_2800);
        assert_eq!(Port::from_base(0x4002_0C00), Some(Port::D));
        assert_eq!(Port::from_base(0x4002_0C04), None);
    }

    #[test]
    fn desired_record_image() {
        let words = desired_record().encode(&mut SoftCrc32::new());

        assert_eq!(words[0], 0x4002_0800);
        assert_eq!(words[1], (1 << 13) | (1 << 16));
        assert!(words[2..PIN_DATA_WORDS].iter().all(|w| *w == 0));
        assert_eq!(words[PIN_DATA_WORDS], 0x0AFF_B4F6);
    }

    #[test]
    fn empty_record_checksum() {
        assert_eq!(
            PinConfigRecord::empty().checksum(&mut SoftCrc32::new()),
            0x98E7_3B8E
        );
    }

    #[test]
    fn boot_side_decode_recovers_commands() {
        let mut crc = SoftCrc32::new();
        let words = desired_record().encode(&mut crc);

        let record = PinConfigRecord::decode(&words, &mut crc).unwrap();
        let commands: Vec<_> = record.commands().copied().collect();
        assert_eq!(
            commands,
            vec![PinCommand::output(Port::C, 1 << 13, Level::Low)]
        );
    }

    #[test]
    fn boot_side_decode_rejects_corruption() {
        let mut crc = SoftCrc32::new();
        let mut words = desired_record().encode(&mut crc);
        words[1] ^= 1 << 24;

        assert!(matches!(
            PinConfigRecord::decode(&words, &mut crc),
            Err(DecodeError::Checksum { .. })
        ));
    }

    #[test]
    fn boot_side_decode_rejects_malformed_slots() {
        let mut crc = SoftCrc32::new();

        let mut words = [0u32; RECORD_WORDS];
        words[2] = Port::B.base();
        words[3] = 1 | (2 << DIRECTION_SHIFT);
        words[PIN_DATA_WORDS] = crc.checksum(&words[..PIN_DATA_WORDS]);
        assert_eq!(
            PinConfigRecord::decode(&words, &mut crc),
            Err(DecodeError::InvalidDirection { slot: 1 })
        );

        let mut words = [0u32; RECORD_WORDS];
        words[5] = 0x10;
        words[PIN_DATA_WORDS] = crc.checksum(&words[..PIN_DATA_WORDS]);
        assert_eq!(
            PinConfigRecord::decode(&words, &mut crc),
            Err(DecodeError::StrayData { slot: 2 })
        );

        let mut words = [0u32; RECORD_WORDS];
        words[0] = 0x5000_0000;
        words[PIN_DATA_WORDS] = crc.checksum(&words[..PIN_DATA_WORDS]);
        assert_eq!(
            PinConfigRecord::decode(&words, &mut crc),
            Err(DecodeError::UnknownPort {
                slot: 0,
                address: 0x5000_0000
            })
        );
    }

    #[test]
    fn distinct_commands_give_distinct_checksums() {
        let mut crc = SoftCrc32::new();
        let mut sums = vec![PinConfigRecord::empty().checksum(&mut crc)];

        for port in &Port::ALL[..5] {
            for pin in 0..16 {
                for direction in [Direction::Input, Direction::Output] {
                    for level in [Level::Low, Level::High] {
                        let mut commands = [None; PIN_COMMAND_SLOTS];
                        commands[0] = Some(PinCommand {
                            port: *port,
                            pins: 1 << pin,
                            direction,
                            level,
                        });
                        sums.push(PinConfigRecord::new(commands).checksum(&mut crc));
                    }
                }
            }
        }

        let total = sums.len();
        assert_eq!(total, 5 * 16 * 2 * 2 + 1);
        sums.sort_unstable();
        sums.dedup();
        assert_eq!(sums.len(), total);
    }
}
