// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Periodic housekeeping tasks.
//!
//! | Period | Work |
//! | ------ | ---- |
//! | 10 ms | mode poll, CAN send if `canperiod = 10ms` |
//! | 100 ms | status LED, watchdog refresh, CPU load, CAN send if `canperiod = 100ms` |

use embedded_hal::digital::v2::OutputPin;
use embedded_hal::watchdog::Watchdog;

use super::load::LoadMeter;
use super::scheduler::{Scheduler, SchedulerError};
use crate::config::{FAST_TASK_PERIOD_MS, SLOW_TASK_PERIOD_MS};
use crate::drive::{Drive, PowerStage};
use crate::hw::led::Led;
use crate::params::ParamId;
use crate::transport::{CanPeriod, Transport};

/// Everything the scheduler tier owns, plus a handle to the shared drive.
pub struct App<'d, P, W, L, T>
where
    L: OutputPin,
{
    pub drive: &'d Drive<P>,
    pub watchdog: W,
    pub led: Led<L>,
    pub transport: T,
    pub load: LoadMeter,
}

impl<'d, P, W, L, T> App<'d, P, W, L, T>
where
    P: PowerStage,
    W: Watchdog,
    L: OutputPin,
    T: Transport,
{
    pub fn new(drive: &'d Drive<P>, watchdog: W, led: Led<L>, transport: T) -> Self {
        Self {
            drive,
            watchdog,
            led,
            transport,
            load: LoadMeter::new(),
        }
    }

    fn can_period(&self) -> CanPeriod {
        CanPeriod::from_param(self.drive.params.get_int(ParamId::Canperiod))
    }
}

pub fn ms10_task<P, W, L, T>(app: &mut App<'_, P, W, L, T>)
where
    P: PowerStage,
    W: Watchdog,
    L: OutputPin,
    T: Transport,
{
    app.drive.poll_mode();

    if app.can_period() == CanPeriod::Ms10 {
        app.transport.send_all(&app.drive.params);
    }
}

pub fn ms100_task<P, W, L, T>(app: &mut App<'_, P, W, L, T>)
where
    P: PowerStage,
    W: Watchdog,
    L: OutputPin,
    T: Transport,
{
    app.led.toggle();
    app.watchdog.feed();

    app.drive
        .params
        .set_flt(ParamId::Cpuload, app.load.permille() as f32 / 10.0);

    if app.can_period() == CanPeriod::Ms100 {
        app.transport.send_all(&app.drive.params);
    }
}

/// Register both tasks, fast one first.
pub fn register<'d, P, W, L, T, const N: usize>(
    sched: &mut Scheduler<App<'d, P, W, L, T>, N>,
) -> Result<(), SchedulerError>
where
    P: PowerStage,
    W: Watchdog,
    L: OutputPin,
    T: Transport,
{
    sched.add_task(ms10_task::<P, W, L, T>, FAST_TASK_PERIOD_MS)?;
    sched.add_task(ms100_task::<P, W, L, T>, SLOW_TASK_PERIOD_MS)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPowerStage, MockTransport, MockWatchdog};
    use crate::mode::OpMode;
    use embedded_hal_mock::pin::{Mock as PinMock, State as PinState, Transaction as PinTransaction};

    type TestApp<'d> = App<'d, MockPowerStage, MockWatchdog, PinMock, MockTransport>;

    fn app<'d>(drive: &'d Drive<MockPowerStage>, pin: &PinMock) -> TestApp<'d> {
        App::new(
            drive,
            MockWatchdog::new(),
            Led::active_high(pin.clone()),
            MockTransport::new(),
        )
    }

    fn run_ticks<'d>(sched: &mut Scheduler<TestApp<'d>>, app: &mut TestApp<'d>, ticks: u32) {
        for _ in 0..ticks {
            sched.run(app);
        }
    }

    #[test]
    fn slow_task_feeds_watchdog_and_blinks() {
        let drive = Drive::new(MockPowerStage::new());
        drive.init();
        let mut pin = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut app = app(&drive, &pin);
        let mut sched = Scheduler::new();
        register(&mut sched).unwrap();

        run_ticks(&mut sched, &mut app, 200);

        assert_eq!(app.watchdog.feeds(), 2);
        assert!(!app.led.is_on());
        pin.done();
    }

    #[test]
    fn can_rate_follows_parameter() {
        let drive = Drive::new(MockPowerStage::new());
        drive.init();
        let mut pin = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut app = app(&drive, &pin);
        let mut sched = Scheduler::new();
        register(&mut sched).unwrap();

        run_ticks(&mut sched, &mut app, 100);
        assert_eq!(app.transport.sends(), 1);

        drive.set_param(ParamId::Canperiod, 1.0).unwrap();
        app.transport.reset();
        run_ticks(&mut sched, &mut app, 99);
        assert_eq!(app.transport.sends(), 9);
        pin.done();
    }

    #[test]
    fn fast_task_polls_mode() {
        let drive = Drive::new(MockPowerStage::new());
        drive.init();
        let mut pin = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut app = app(&drive, &pin);
        let mut sched = Scheduler::new();
        register(&mut sched).unwrap();

        drive.set_param(ParamId::Start, 1.0).unwrap();
        run_ticks(&mut sched, &mut app, 9);
        assert_eq!(drive.params.get_int(ParamId::Opmode), OpMode::Off.as_param());

        run_ticks(&mut sched, &mut app, 1);
        assert_eq!(drive.params.get_int(ParamId::Opmode), OpMode::Run.as_param());
        pin.done();
    }

    #[test]
    fn cpu_load_is_published_in_percent() {
        let drive = Drive::new(MockPowerStage::new());
        drive.init();
        let mut pin = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let mut app = app(&drive, &pin);
        for _ in 0..crate::config::LOAD_WINDOW_TICKS {
            app.load.record(125, 1000);
        }

        ms100_task(&mut app);

        assert_eq!(drive.params.get(ParamId::Cpuload), 12.5);
        pin.done();
    }
}
