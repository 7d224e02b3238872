// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! MCU-level wrappers.
//!
//! Only [`led`] is hardware independent; everything else talks to STM32F777 registers and is
//! built with the `board` feature.

pub mod led;

#[cfg(feature = "board")]
pub mod adc;
#[cfg(feature = "board")]
pub mod can;
#[cfg(feature = "board")]
pub mod crc;
#[cfg(feature = "board")]
pub mod flash;
#[cfg(feature = "board")]
pub mod nvic;
#[cfg(feature = "board")]
pub mod pins;
#[cfg(feature = "board")]
pub mod power;
#[cfg(feature = "board")]
pub mod tick;
#[cfg(feature = "board")]
pub mod watchdog;

pub use led::Led;

#[cfg(feature = "board")]
pub use {
    adc::AdcFeedback, can::CanTransport, crc::HwCrc, flash::Flash, pins::BoardPins,
    power::Tim1Stage, tick::TickTimer, watchdog::Iwdg,
};
