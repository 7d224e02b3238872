// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 power board.
//!
//! The states these pins must hold while the boot loader runs are described separately by
//! [`crate::pininit::desired_record`].

use stm32f7xx_hal::{
    gpio::{gpioa, gpioc, gpioe, Alternate, Analog, Output, PushPull},
    pac,
    prelude::*,
};

/// Status LED pin, active high.
pub type LedPin = gpioc::PC13<Output<PushPull>>;

/// All board pins. Construct this once at startup using:
///
/// ```rust
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOC, dp.GPIOE);
/// ```
pub struct BoardPins {
    pub led: LedPin,
    pub power: PowerPins,
    pub feedback: FeedbackPins,
    pub can1: Can1Pins,
}

/// Boost stage pins
pub struct PowerPins {
    pub high: gpioa::PA8<Alternate<1>>,  // TIM1_CH1
    pub low: gpioa::PA7<Alternate<1>>,   // TIM1_CH1N
    pub fault: gpioa::PA6<Alternate<1>>, // TIM1_BKIN
    pub contactor: gpioe::PE2<Output<PushPull>>,
}

/// Analog feedback inputs
pub struct FeedbackPins {
    pub udc: gpioa::PA0<Analog>, // ADC1_IN0
    pub il1: gpioa::PA1<Analog>, // ADC2_IN1
    pub il2: gpioa::PA2<Analog>, // ADC3_IN2
}

/// CAN1 bus pins
pub struct Can1Pins {
    pub tx: gpioa::PA12<Alternate<9>>,
    pub rx: gpioa::PA11<Alternate<9>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpioc: pac::GPIOC, gpioe: pac::GPIOE) -> Self {
        let gpioa = gpioa.split();
        let gpioc = gpioc.split();
        let gpioe = gpioe.split();

        // Contactor stays open from the first instruction that owns the pin.
        let mut contactor = gpioe.pe2.into_push_pull_output();
        contactor.set_low();

        Self {
            led: gpioc.pc13.into_push_pull_output(),

            power: PowerPins {
                high: gpioa.pa8.into_alternate::<1>(),
                low: gpioa.pa7.into_alternate::<1>(),
                fault: gpioa.pa6.into_alternate::<1>(),
                contactor,
            },

            feedback: FeedbackPins {
                udc: gpioa.pa0.into_analog(),
                il1: gpioa.pa1.into_analog(),
                il2: gpioa.pa2.into_analog(),
            },

            can1: Can1Pins {
                tx: gpioa.pa12.into_alternate::<9>(),
                rx: gpioa.pa11.into_alternate::<9>().internal_pull_up(true),
            },
        }
    }
}
