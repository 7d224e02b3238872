// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Boost power stage on TIM1 using direct PAC register access.
//!
//! - CH1/CH1N drive the boost switch pair, complementary with dead time.
//! - BKIN is the hardware fault input; it clears MOE by itself and raises the break interrupt.
//! - The update interrupt paces the control loop; the repetition counter divides the PWM rate
//!   down to the loop rate.
//! - The DC contactor is a plain GPIO written through BSRR.
//!
//! Every [`PowerStage`] method is a handful of register writes. `Tim1Stage` is zero-sized so it can
//! live inside the `static` drive context; it reaches the registers through the PAC pointers.

use micromath::F32Ext;
use stm32f7xx_hal::pac;

use crate::config::PWM_TIMER_CLOCK_HZ;
use crate::control::Polarity;
use crate::drive::PowerStage;
use crate::hw::pins::PowerPins;

// TIM1_CR1
const CR1_CEN: u32 = 1 << 0;
const CR1_URS: u32 = 1 << 2;
const CR1_ARPE: u32 = 1 << 7;

// TIM1_DIER / TIM1_SR
const UPDATE: u32 = 1 << 0;
const BREAK: u32 = 1 << 7;

// TIM1_EGR
const EGR_UG: u32 = 1 << 0;

// TIM1_CCMR1: OC1 in PWM mode 1 with preload
const CCMR1_OC1_PWM1: u32 = (0b110 << 4) | (1 << 3);

// TIM1_CCER
const CCER_CC1E: u32 = 1 << 0;
const CCER_CC1P: u32 = 1 << 1;
const CCER_CC1NE: u32 = 1 << 2;
const CCER_CC1NP: u32 = 1 << 3;

// TIM1_BDTR
const BDTR_DEAD_TIME: u32 = 0x20; // ~150 ns at 216 MHz
const BDTR_OSSI: u32 = 1 << 10;
const BDTR_OSSR: u32 = 1 << 11;
const BDTR_BKE: u32 = 1 << 12;
const BDTR_MOE: u32 = 1 << 15;

const CONTACTOR_PIN: u32 = 2; // PE2

#[inline]
fn tim1() -> &'static pac::tim1::RegisterBlock {
    unsafe { &*pac::TIM1::ptr() }
}

pub struct Tim1Stage {
    _private: (),
}

impl Tim1Stage {
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// One-time bring-up with outputs, break and contactor inactive. Consumes the timer and pins
    /// so nothing else can reconfigure them.
    pub fn setup(&self, _tim1: pac::TIM1, _pins: PowerPins) {
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.apb2enr.modify(|_, w| w.tim1en().set_bit());

        let tim = tim1();

        // Stop while configuring
        tim.cr1.write(|w| unsafe { w.bits(0) });
        tim.psc.write(|w| unsafe { w.bits(0) });

        tim.ccmr1_output()
            .write(|w| unsafe { w.bits(CCMR1_OC1_PWM1) });
        tim.ccr1.write(|w| unsafe { w.bits(0) });
        tim.ccer
            .write(|w| unsafe { w.bits(CCER_CC1E | CCER_CC1NE) });

        // Break active low on BKIN, MOE only set by software
        tim.bdtr.write(|w| unsafe {
            w.bits(BDTR_DEAD_TIME | BDTR_OSSI | BDTR_OSSR | BDTR_BKE)
        });

        // Update interrupt always on, break interrupt armed per start
        tim.dier.write(|w| unsafe { w.bits(UPDATE) });

        tim.cr1
            .write(|w| unsafe { w.bits(CR1_ARPE | CR1_URS | CR1_CEN) });

        self.set_contactor(false);
    }
}

impl Default for Tim1Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerStage for Tim1Stage {
    fn configure(&self, polarity: Polarity, pwm_digits: u8, loop_hz: f32) {
        let tim = tim1();

        let period = 1u32 << pwm_digits;
        let pwm_hz = PWM_TIMER_CLOCK_HZ as f32 / period as f32;
        let repetitions = if loop_hz > 0.0 {
            (pwm_hz / loop_hz).round().clamp(1.0, 256.0) as u32
        } else {
            1
        };

        let ccer = match polarity {
            Polarity::ActiveHigh => CCER_CC1E | CCER_CC1NE,
            Polarity::ActiveLow => CCER_CC1E | CCER_CC1NE | CCER_CC1P | CCER_CC1NP,
        };

        tim.ccr1.write(|w| unsafe { w.bits(0) });
        tim.arr.write(|w| unsafe { w.bits(period - 1) });
        tim.rcr.write(|w| unsafe { w.bits(repetitions - 1) });
        tim.ccer.write(|w| unsafe { w.bits(ccer) });

        // Latch the preloaded values now; URS keeps this from raising an update interrupt.
        tim.egr.write(|w| unsafe { w.bits(EGR_UG) });
    }

    fn enable_outputs(&self) {
        tim1()
            .bdtr
            .modify(|r, w| unsafe { w.bits(r.bits() | BDTR_MOE) });
    }

    fn disable_outputs(&self) {
        let tim = tim1();
        tim.bdtr
            .modify(|r, w| unsafe { w.bits(r.bits() & !BDTR_MOE) });
        tim.ccr1.write(|w| unsafe { w.bits(0) });
    }

    fn set_contactor(&self, closed: bool) {
        let bit = if closed {
            1 << CONTACTOR_PIN
        } else {
            1 << (CONTACTOR_PIN + 16)
        };
        let gpioe = unsafe { &*pac::GPIOE::ptr() };
        gpioe.bsrr.write(|w| unsafe { w.bits(bit) });
    }

    fn arm_fault_trigger(&self) {
        let tim = tim1();
        // rc_w0: writing 0 clears only the break flag
        tim.sr.write(|w| unsafe { w.bits(!BREAK) });
        tim.dier
            .modify(|r, w| unsafe { w.bits(r.bits() | BREAK) });
    }

    fn disarm_fault_trigger(&self) {
        tim1()
            .dier
            .modify(|r, w| unsafe { w.bits(r.bits() & !BREAK) });
    }

    #[inline]
    fn set_duty(&self, duty: u16) {
        tim1().ccr1.write(|w| unsafe { w.bits(duty as u32) });
    }

    #[inline]
    fn acknowledge_update(&self) {
        tim1().sr.write(|w| unsafe { w.bits(!UPDATE) });
    }
}
