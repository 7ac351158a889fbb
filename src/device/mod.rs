//! Supervised sensor session
//!
//! [`Device`] owns a [`Board`] and drives one chip through
//!
//! ```text
//! Unconfigured -> Connecting -> VerifyingIdentity -> ApplyingProfile -> Running -> Stopped
//!                      \               |                  /
//!                       +-------> RetryWaiting <---------+
//! ```
//!
//! Any setup failure releases what was acquired so far and waits
//! `retry_interval_ms` before starting over. Once running, the poll timer and
//! the interrupt line are serviced by one task, so threshold updates from the
//! two sources never interleave on the bus. The interrupt line is awaited by
//! level, so an INT asserted while a poll is on the bus is serviced as soon as
//! the poll returns. Handler failures are logged and never end the session;
//! only the [`StopSignal`] does.
//!
//! ```rust,ignore
//! static STOP: StopSignal = StopSignal::new();
//!
//! let mut device = Device::new(board, DeviceConfig::interrupt_driven(Strategy::Jump), listener);
//! if device.setup_with_retry(&STOP).await.is_ok() {
//!     device.start(&STOP).await;
//! }
//! ```

mod board;
mod config;
mod events;

pub use board::{Board, Unavailable};
pub use config::{DeviceConfig, PeripheralConfig, PollConfig, StepConfig};
pub use events::{Event, Listener, PollResult};

use core::future::pending;

use embassy_futures::select::{select, select3, Either, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker, Timer};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::digital::Wait;

use crate::fmt::Debug2Format;
use crate::ll::RegisterBus;
use crate::measurement::Measurement;
use crate::{Error, Tcs34725};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum State {
    /// Created, setup not requested yet
    #[default]
    Unconfigured,
    /// Acquiring the bus
    Connecting,
    /// Checking the ID register
    VerifyingIdentity,
    /// Writing the configured profile
    ApplyingProfile,
    /// Polling and handling interrupts
    Running,
    /// Waiting to retry setup
    RetryWaiting,
    /// Resources released
    Stopped,
}

/// Cancels retry waits and running sessions
pub struct StopSignal(Signal<CriticalSectionRawMutex, ()>);

impl StopSignal {
    /// Unsignalled
    pub const fn new() -> Self {
        Self(Signal::new())
    }

    /// Ask the session to stop
    pub fn stop(&self) {
        self.0.signal(());
    }

    /// Forget a stop request nobody consumed yet
    pub fn reset(&self) {
        self.0.reset();
    }

    /// True if a stop request is pending
    pub fn is_stopped(&self) -> bool {
        self.0.signaled()
    }

    async fn wait(&self) {
        self.0.wait().await;
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// `setup_with_retry` was cancelled by the [`StopSignal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Stopped;

/// Failure of one setup attempt
#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum SetupError<A, E> {
    /// The board could not provide the bus
    Acquire(A),
    /// The chip did not answer or was not a TCS34725
    Device(Error<E>),
}

/// Transport error of a board's bus
pub type BusError<Bd> = <<Bd as Board>::Bus as RegisterBus>::Error;

struct Session<Bd: Board> {
    sensor: Tcs34725<Bd::Bus>,
    led: Option<Bd::Led>,
    interrupt: Option<Bd::Interrupt>,
}

impl<Bd: Board> Session<Bd> {
    /// LED on, wait, read, LED off
    async fn read_data(&mut self, flash_ms: u64) -> Result<Measurement, Error<BusError<Bd>>> {
        let led = if flash_ms > 0 { self.led.as_mut() } else { None };
        let Some(led) = led else {
            return self.sensor.data().await;
        };

        if let Err(e) = led.set_high() {
            warn!("led on failed: {:?}", Debug2Format(&e));
        }
        Timer::after_millis(flash_ms).await;
        let result = self.sensor.data().await;
        if let Err(e) = led.set_low() {
            warn!("led off failed: {:?}", Debug2Format(&e));
        }
        result
    }
}

/// One supervised sensor
pub struct Device<Bd: Board, L> {
    board: Bd,
    config: DeviceConfig,
    listener: L,
    state: State,
    session: Option<Session<Bd>>,
    retries_scheduled: u32,
}

impl<Bd: Board, L: Listener> Device<Bd, L> {
    /// Create an unconfigured device
    pub fn new(board: Bd, config: DeviceConfig, listener: L) -> Self {
        Self {
            board,
            config,
            listener,
            state: State::Unconfigured,
            session: None,
            retries_scheduled: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> State {
        self.state
    }

    /// Session configuration
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The board
    pub fn board(&self) -> &Bd {
        &self.board
    }

    /// The event listener
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Number of setup retries scheduled so far
    pub fn retries_scheduled(&self) -> u32 {
        self.retries_scheduled
    }

    /// The driver while a session is up
    pub fn sensor(&mut self) -> Option<&mut Tcs34725<Bd::Bus>> {
        self.session.as_mut().map(|session| &mut session.sensor)
    }

    /// Release everything and return the board and listener
    pub fn destroy(mut self) -> (Bd, L) {
        self.release();
        (self.board, self.listener)
    }

    /// Run setup until it succeeds or `stop` is signalled
    pub async fn setup_with_retry(&mut self, stop: &StopSignal) -> Result<(), Stopped> {
        loop {
            match self.setup().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "{}: setup failed: {:?}, retrying in {} ms",
                        self.config.name,
                        Debug2Format(&e),
                        self.config.retry_interval_ms
                    );
                    self.transition(State::RetryWaiting);
                    self.retries_scheduled += 1;

                    let retry = Timer::after_millis(self.config.retry_interval_ms);
                    if let Either::Second(()) = select(retry, stop.wait()).await {
                        self.transition(State::Stopped);
                        return Err(Stopped);
                    }
                }
            }
        }
    }

    /// One setup attempt
    ///
    /// On failure everything acquired by this attempt has been released.
    pub async fn setup(&mut self) -> Result<(), SetupError<Bd::Error, BusError<Bd>>> {
        self.release();
        let result = self.try_setup().await;
        if result.is_err() {
            self.release();
        }
        result
    }

    async fn try_setup(&mut self) -> Result<(), SetupError<Bd::Error, BusError<Bd>>> {
        self.transition(State::Connecting);
        let bus = self
            .board
            .acquire_bus()
            .await
            .map_err(SetupError::Acquire)?;
        self.session = Some(Session {
            sensor: Tcs34725::new(bus),
            led: None,
            interrupt: None,
        });

        self.transition(State::VerifyingIdentity);
        if let Some(session) = self.session.as_mut() {
            session
                .sensor
                .verify_id()
                .await
                .map_err(SetupError::Device)?;
        }
        let led = self.acquire_led().await;
        let interrupt = self.acquire_interrupt().await;
        self.notice_missing_peripherals(led.is_some(), interrupt.is_some());

        self.transition(State::ApplyingProfile);
        if let Some(session) = self.session.as_mut() {
            session.led = led;
            session.interrupt = interrupt;
            session
                .sensor
                .set_profile(&self.config.profile)
                .await
                .map_err(SetupError::Device)?;
            if self.config.clear_interrupt_on_start {
                session
                    .sensor
                    .clear_interrupt()
                    .await
                    .map_err(SetupError::Device)?;
            }
        }

        info!("{}: running", self.config.name);
        self.transition(State::Running);
        Ok(())
    }

    async fn acquire_led(&mut self) -> Option<Bd::Led> {
        if !self.config.led.enabled {
            return None;
        }
        match self.board.acquire_led().await {
            Ok(mut led) => {
                if let Err(e) = led.set_low() {
                    warn!("{}: led off failed: {:?}", self.config.name, Debug2Format(&e));
                }
                Some(led)
            }
            Err(e) => {
                warn!(
                    "{}: led unavailable, disabling: {:?}",
                    self.config.name,
                    Debug2Format(&e)
                );
                None
            }
        }
    }

    async fn acquire_interrupt(&mut self) -> Option<Bd::Interrupt> {
        if !self.config.interrupt.enabled {
            return None;
        }
        match self.board.acquire_interrupt().await {
            Ok(pin) => Some(pin),
            Err(e) => {
                warn!(
                    "{}: interrupt line unavailable, disabling: {:?}",
                    self.config.name,
                    Debug2Format(&e)
                );
                None
            }
        }
    }

    fn notice_missing_peripherals(&self, has_led: bool, has_interrupt: bool) {
        if self.config.poll.flash_ms > 0 && !has_led {
            info!("{}: flash configured but led is disabled", self.config.name);
        }
        let step = self.config.step;
        if step.enabled && !step.software_interrupt && !has_interrupt {
            info!(
                "{}: stepping configured but interrupt is disabled",
                self.config.name
            );
        }
    }

    /// Service the poll timer and the interrupt line until `stop` is signalled
    ///
    /// Returns at once unless [`State::Running`]. Resources are released on
    /// return and the state is [`State::Stopped`].
    pub async fn start(&mut self, stop: &StopSignal) {
        if self.state != State::Running {
            warn!("{}: start in state {:?}", self.config.name, self.state);
            return;
        }

        let poll = self.config.poll;
        let mut ticker = poll
            .enabled
            .then(|| Ticker::every(Duration::from_millis(poll.interval_ms)));
        let stepping = self.config.step.enabled;

        loop {
            let Some(session) = self.session.as_mut() else {
                break;
            };
            let tick = async {
                match ticker.as_mut() {
                    Some(ticker) => ticker.next().await,
                    None => pending().await,
                }
            };
            // INT stays asserted until cleared, so the level survives a dropped wait
            let asserted = async {
                match session.interrupt.as_mut() {
                    Some(pin) if stepping => pin.wait_for_high().await,
                    _ => pending().await,
                }
            };

            match select3(tick, asserted, stop.wait()).await {
                Either3::First(()) => self.poll().await,
                Either3::Second(Ok(())) => self.handle_interrupt().await,
                Either3::Second(Err(e)) => {
                    error!(
                        "{}: interrupt line failed, detaching: {:?}",
                        self.config.name,
                        Debug2Format(&e)
                    );
                    if let Some(pin) = self.session.as_mut().and_then(|s| s.interrupt.take()) {
                        self.board.release_interrupt(pin);
                    }
                }
                Either3::Third(()) => break,
            }
        }

        self.stop();
    }

    /// Release the session and enter [`State::Stopped`]
    pub fn stop(&mut self) {
        self.release();
        self.transition(State::Stopped);
    }

    /// One poll cycle
    ///
    /// Failures are logged and end only this cycle.
    pub async fn poll(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let name = self.config.name;
        let poll = self.config.poll;
        let step = self.config.step;

        let result = if poll.profile {
            match session.sensor.profile().await {
                Ok(report) => PollResult::Profile(report),
                Err(e) => {
                    error!("{}: profile poll failed: {:?}", name, Debug2Format(&e));
                    PollResult::Empty
                }
            }
        } else if poll.status {
            match session.sensor.status().await {
                Ok(status) => PollResult::Status(status),
                Err(e) => {
                    error!("{}: status poll failed: {:?}", name, Debug2Format(&e));
                    PollResult::Empty
                }
            }
        } else {
            PollResult::Empty
        };

        let status = result.status();
        if status.is_some_and(|status| !status.valid) {
            debug!("{}: data not ready", name);
            return;
        }

        let mut sample = None;
        if !poll.skip_data {
            match session.read_data(poll.flash_ms).await {
                Ok(measurement) => {
                    sample = Some((measurement.raw.clear, Instant::now()));
                    self.listener.on_data(&measurement, &result);
                }
                Err(e) => error!("{}: data read failed: {:?}", name, Debug2Format(&e)),
            }
        }

        let violation = status.is_some_and(|status| status.threshold_violation);
        if !(violation && step.enabled && step.software_interrupt) {
            return;
        }
        let stepped = match sample {
            Some((clear, timestamp)) => {
                session
                    .sensor
                    .step_with_sample(clear, timestamp, step.strategy)
                    .await
            }
            None => session.sensor.step(step.strategy).await,
        };
        match stepped {
            Ok(step) => self.listener.on_step(&step),
            Err(e) => error!("{}: software step failed: {:?}", name, Debug2Format(&e)),
        }
    }

    /// Handle one interrupt: adapt the window, re-arm, emit the step
    ///
    /// Failures are logged.
    pub async fn handle_interrupt(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.sensor.step(self.config.step.strategy).await {
            Ok(step) => self.listener.on_step(&step),
            Err(e) => error!(
                "{}: interrupt handling failed: {:?}",
                self.config.name,
                Debug2Format(&e)
            ),
        }
    }

    fn release(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Some(mut led) = session.led {
            if let Err(e) = led.set_low() {
                warn!("{}: led off failed: {:?}", self.config.name, Debug2Format(&e));
            }
            self.board.release_led(led);
        }
        if let Some(pin) = session.interrupt {
            self.board.release_interrupt(pin);
        }
        self.board.release_bus(session.sensor.destroy());
    }

    fn transition(&mut self, state: State) {
        debug!("{}: {:?} -> {:?}", self.config.name, self.state, state);
        self.state = state;
        self.listener.on_state(state);
    }
}
