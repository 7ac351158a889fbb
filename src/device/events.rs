//! Session events

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::measurement::Measurement;
use crate::profile::ProfileReport;
use crate::threshold::Step;
use crate::types::Status;

use super::State;

/// What a poll read before the data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PollResult {
    /// Nothing, or the read failed
    #[default]
    Empty,
    /// STATUS register
    Status(Status),
    /// Whole profile block
    Profile(ProfileReport),
}

impl PollResult {
    /// Status flags if any were read
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Empty => None,
            Self::Status(status) => Some(*status),
            Self::Profile(report) => Some(report.status),
        }
    }
}

/// Receives session events
///
/// Every method has an empty default, so implementors pick what they need.
/// Handlers run inline on the session task and should return quickly.
pub trait Listener {
    /// A poll read a measurement
    fn on_data(&mut self, _measurement: &Measurement, _poll: &PollResult) {}

    /// The comparator window was adapted and the interrupt re-armed
    fn on_step(&mut self, _step: &Step) {}

    /// The session changed state
    fn on_state(&mut self, _state: State) {}
}

impl Listener for () {}

impl<L: Listener + ?Sized> Listener for &mut L {
    fn on_data(&mut self, measurement: &Measurement, poll: &PollResult) {
        (**self).on_data(measurement, poll);
    }

    fn on_step(&mut self, step: &Step) {
        (**self).on_step(step);
    }

    fn on_state(&mut self, state: State) {
        (**self).on_state(state);
    }
}

/// Owned form of a [`Listener`] call, for forwarding to other tasks
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Event {
    /// See [`Listener::on_data`]
    Data(Measurement, PollResult),
    /// See [`Listener::on_step`]
    Step(Step),
    /// See [`Listener::on_state`]
    State(State),
}

/// Forwards events into a channel, dropping them when it is full
impl<M: RawMutex, const N: usize> Listener for &Channel<M, Event, N> {
    fn on_data(&mut self, measurement: &Measurement, poll: &PollResult) {
        forward(self, Event::Data(*measurement, *poll));
    }

    fn on_step(&mut self, step: &Step) {
        forward(self, Event::Step(*step));
    }

    fn on_state(&mut self, state: State) {
        forward(self, Event::State(state));
    }
}

fn forward<M: RawMutex, const N: usize>(channel: &Channel<M, Event, N>, event: Event) {
    if channel.try_send(event).is_err() {
        warn!("event channel full, dropping event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use crate::types::RawSample;

    #[test]
    fn poll_result_status() {
        let status = Status {
            valid: true,
            threshold_violation: true,
        };
        assert_eq!(PollResult::Empty.status(), None);
        assert_eq!(PollResult::Status(status).status(), Some(status));
    }

    #[test]
    fn channel_listener_drops_when_full() {
        let channel: Channel<CriticalSectionRawMutex, Event, 1> = Channel::new();
        let mut listener = &channel;
        listener.on_state(State::Connecting);
        listener.on_state(State::Running);

        assert_eq!(channel.try_receive().ok(), Some(Event::State(State::Connecting)));
        assert!(channel.try_receive().is_err());

        let measurement = Measurement::from_raw(RawSample::default());
        listener.on_data(&measurement, &PollResult::Empty);
        assert!(matches!(
            channel.try_receive(),
            Ok(Event::Data(_, PollResult::Empty))
        ));
    }
}
