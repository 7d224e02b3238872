// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board entry point.
//!
//! Startup order:
//! 1. Clocks and pins, contactor open.
//! 2. Pin-init record brought up to date for the boot loader.
//! 3. Drive context initialised, power stage set up with outputs off.
//! 4. Handler state moved into the interrupt-owned cells.
//! 5. Priorities set and interrupts unmasked.
//!
//! After that the main thread only sleeps; all work happens in the three handlers.

#![no_main]
#![no_std]

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::DWT;
use cortex_m_rt::entry;
use defmt_rtt as _;
use panic_halt as _;

use stm32f7xx_hal::{can as hal_can, pac, pac::interrupt, prelude::*};

use drivecore::config::{CYCLES_PER_TICK, WATCHDOG_TIMEOUT_MS};
use drivecore::control::{BoostRegulator, ControlLoop};
use drivecore::hw::pins::LedPin;
use drivecore::hw::{nvic, AdcFeedback, BoardPins, CanTransport, Flash, HwCrc, Iwdg, Led};
use drivecore::hw::{Tim1Stage, TickTimer};
use drivecore::pininit::{self, PersistOutcome};
use drivecore::sched::{tasks, App, Scheduler};
use drivecore::transport::CanSpeed;
use drivecore::{log_error, log_info, log_warn};
use drivecore::{Drive, ParamId, PowerStage};

type BoardApp = App<'static, Tim1Stage, Iwdg, LedPin, CanTransport>;
type BoardLoop = ControlLoop<BoostRegulator, AdcFeedback>;

/// State owned by the scheduler tick handler.
struct SchedulerTier {
    sched: Scheduler<BoardApp>,
    app: BoardApp,
    _tick: TickTimer,
}

static DRIVE: Drive<Tim1Stage> = Drive::new(Tim1Stage::new());

static CONTROL: Mutex<RefCell<Option<BoardLoop>>> = Mutex::new(RefCell::new(None));
static SCHEDULER: Mutex<RefCell<Option<SchedulerTier>>> = Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    // Peripherals
    let (Some(dp), Some(mut cp)) = (pac::Peripherals::take(), cortex_m::Peripherals::take())
    else {
        panic!("peripherals already taken");
    };

    // Clocks
    let mut rcc = dp.RCC.constrain();
    let _clocks = rcc.cfgr.sysclk(216.MHz()).freeze();

    // GPIO
    let pins = BoardPins::new(dp.GPIOA, dp.GPIOC, dp.GPIOE);

    // Pin-init record for the boot loader, before anything can interrupt the flash write
    let mut flash = Flash::new(dp.FLASH);
    let mut crc = HwCrc::new(dp.CRC);
    match pininit::persist(&mut flash, &mut crc, &pininit::desired_record()) {
        Ok(PersistOutcome::Unchanged) => log_info!("pin-init record up to date"),
        Ok(PersistOutcome::Rewritten { words }) => {
            log_info!("pin-init record rewritten ({=usize} words)", words)
        }
        Err(err) => log_error!("pin-init record write failed: {}", err),
    }

    // Drive context and power stage
    DRIVE.power.setup(dp.TIM1, pins.power);
    DRIVE.init();

    // Control loop
    let feedback = AdcFeedback::new(dp.ADC1, dp.ADC2, dp.ADC3, pins.feedback);
    let control = ControlLoop::new(BoostRegulator::new(), feedback, &DRIVE.control);

    // CAN1
    let speed = match CanSpeed::from_param(DRIVE.params.get_int(ParamId::Canspeed)) {
        Some(speed) => speed,
        None => {
            log_warn!("invalid canspeed, using 500k");
            CanSpeed::K500
        }
    };
    let can = hal_can::Can::new(dp.CAN1, &mut rcc.apb1, (pins.can1.tx, pins.can1.rx));
    let transport = CanTransport::new(can, speed);

    // Scheduler tier
    let watchdog = Iwdg::start(dp.IWDG, WATCHDOG_TIMEOUT_MS);
    let led = Led::active_high(pins.led);
    let app = App::new(&DRIVE, watchdog, led, transport);

    let mut sched = Scheduler::new();
    if let Err(err) = tasks::register(&mut sched) {
        log_error!("task registration failed: {}", err);
    }

    // CPU load measurement
    cp.DCB.enable_trace();
    cp.DWT.enable_cycle_counter();

    let tick = TickTimer::start(dp.TIM2);

    cortex_m::interrupt::free(|cs| {
        CONTROL.borrow(cs).replace(Some(control));
        SCHEDULER.borrow(cs).replace(Some(SchedulerTier {
            sched,
            app,
            _tick: tick,
        }));
    });

    nvic::install(&mut cp.NVIC);
    log_info!("drivecore v{=i32} running", DRIVE.params.get_int(ParamId::Version));

    loop {
        cortex_m::asm::wfi();
    }
}

/// Hardware fault input. Highest priority, takes no lock.
#[interrupt]
fn TIM1_BRK_TIM9() {
    DRIVE.emergency_stop();
}

#[interrupt]
fn TIM1_UP_TIM10() {
    static mut CONTROL_LOOP: Option<BoardLoop> = None;

    if CONTROL_LOOP.is_none() {
        *CONTROL_LOOP = cortex_m::interrupt::free(|cs| CONTROL.borrow(cs).take());
    }

    if let Some(control) = CONTROL_LOOP {
        control.on_update(&DRIVE);
    } else {
        DRIVE.power.acknowledge_update();
    }
}

#[interrupt]
fn TIM2() {
    static mut TIER: Option<SchedulerTier> = None;

    TickTimer::acknowledge();

    if TIER.is_none() {
        *TIER = cortex_m::interrupt::free(|cs| SCHEDULER.borrow(cs).take());
    }
    let Some(tier) = TIER else {
        return;
    };

    let start = DWT::cycle_count();
    tier.sched.run(&mut tier.app);
    let busy = DWT::cycle_count().wrapping_sub(start);

    tier.app.load.record(busy, CYCLES_PER_TICK);
}
