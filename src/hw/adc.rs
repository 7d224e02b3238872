// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Feedback sampling on ADC1/ADC2/ADC3 using direct PAC register access.
//!
//! Each converter runs one channel in continuous mode, so the control loop only reads the data
//! registers and never waits on a conversion.

use stm32f7xx_hal::pac;

use crate::control::{FeedbackSource, RawFeedback};
use crate::hw::pins::FeedbackPins;

const UDC_CHANNEL: u8 = 0;
const IL1_CHANNEL: u8 = 1;
const IL2_CHANNEL: u8 = 2;

fn configure_common() {
    let common = unsafe { &*pac::ADC_COMMON::ptr() };

    // ADC prescaler: PCLK2 / 4
    common.ccr.modify(|_, w| w.adcpre().div4());
}

/// Put one converter into continuous single-channel conversion and start it.
fn start_continuous(adc: &pac::adc1::RegisterBlock, channel: u8) {
    // Power off to configure
    adc.cr2.modify(|_, w| w.adon().clear_bit());

    // 12-bit, right-aligned, software trigger, free running
    adc.cr1.modify(|_, w| w.res().bits(0b00));
    adc.cr2.modify(|_, w| {
        w.cont().set_bit();
        w.align().right();
        w.exten().disabled();
        w
    });

    // 56 cycles keeps the sense dividers settled at PCLK2 / 4
    adc.smpr2.modify(|_, w| match channel {
        0 => w.smp0().bits(0b011),
        1 => w.smp1().bits(0b011),
        _ => w.smp2().bits(0b011),
    });

    // Sequence length = 1 conversion
    adc.sqr1.modify(|_, w| w.l().bits(0));
    adc.sqr3
        .modify(|_, w| unsafe { w.sq1().bits(channel & 0x1F) });

    adc.cr2.modify(|_, w| w.adon().set_bit());
    adc.cr2.modify(|_, w| w.swstart().set_bit());
}

#[inline]
fn latest(adc: &pac::adc1::RegisterBlock) -> u16 {
    adc.dr.read().data().bits() as u16
}

/// DC link voltage and the two inductor currents, one converter each.
pub struct AdcFeedback {
    udc: pac::ADC1,
    il1: pac::ADC2,
    il2: pac::ADC3,
    pins: FeedbackPins,
}

impl AdcFeedback {
    pub fn new(udc: pac::ADC1, il1: pac::ADC2, il2: pac::ADC3, pins: FeedbackPins) -> Self {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| {
            w.adc1en().set_bit();
            w.adc2en().set_bit();
            w.adc3en().set_bit();
            w
        });

        configure_common();
        start_continuous(&udc, UDC_CHANNEL);
        start_continuous(&il1, IL1_CHANNEL);
        start_continuous(&il2, IL2_CHANNEL);

        Self {
            udc,
            il1,
            il2,
            pins,
        }
    }

    #[inline]
    pub fn free(self) -> (pac::ADC1, pac::ADC2, pac::ADC3, FeedbackPins) {
        (self.udc, self.il1, self.il2, self.pins)
    }
}

impl FeedbackSource for AdcFeedback {
    #[inline]
    fn sample(&mut self) -> RawFeedback {
        RawFeedback {
            udc: latest(&self.udc),
            il1: latest(&self.il1),
            il2: latest(&self.il2),
        }
    }
}
