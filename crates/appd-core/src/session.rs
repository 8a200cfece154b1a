//! Session timers
//!
//! A session is the interval between vehicle started/stopped transitions.
//! All delays are counted in frames; the frame counter advances by the
//! configured step once per telemetry sample.

use appd_api::ThermalStatus;
use appd_config::SupervisorTiming;

/// Timers and gates owned by the supervisor; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Started flag of the previous sample
    pub last_started: bool,

    /// Thermal status of the current sample (started samples only)
    pub thermal_status: Option<ThermalStatus>,

    /// Thermal status of the previous started sample
    pub previous_thermal_status: Option<ThermalStatus>,

    /// Frame at which automatic runs may begin
    pub start_deadline: Option<u64>,

    /// Frame at which running apps are killed after the vehicle stops
    pub stop_deadline: Option<u64>,

    /// Cleared while thermal status is red or worse
    pub auto_run_allowed: bool,

    /// Any enabled app is fullscreen; recomputed every cycle
    pub any_fullscreen_enabled: bool,

    pub frame: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            last_started: false,
            thermal_status: None,
            previous_thermal_status: None,
            start_deadline: None,
            stop_deadline: None,
            auto_run_allowed: true,
            any_fullscreen_enabled: false,
            frame: 0,
        }
    }

    /// Whether `started` differs from the previous sample
    pub fn is_edge(&self, started: bool) -> bool {
        self.last_started != started
    }

    /// Apply a started sample to the timers and the thermal gate.
    ///
    /// Returns the new value of `auto_run_allowed` if it changed.
    pub fn observe_started(
        &mut self,
        thermal: ThermalStatus,
        timing: &SupervisorTiming,
    ) -> Option<bool> {
        self.stop_deadline = None;
        if self.start_deadline.is_none() {
            self.start_deadline = Some(self.frame + timing.start_delay);
        }

        self.thermal_status = Some(thermal);
        let before = self.auto_run_allowed;

        if thermal.allows_auto_run() {
            self.auto_run_allowed = true;
            // Cooling down from red: hold off automatic runs again
            if self.previous_thermal_status == Some(ThermalStatus::Red) {
                self.start_deadline = Some(self.frame + timing.thermal_restart_delay);
            }
        } else if thermal.blocks_auto_run() {
            self.auto_run_allowed = false;
        }

        self.previous_thermal_status = Some(thermal);

        (before != self.auto_run_allowed).then_some(self.auto_run_allowed)
    }

    /// Apply a stopped sample to the timers
    pub fn observe_stopped(&mut self, timing: &SupervisorTiming) {
        self.start_deadline = None;
        if self.stop_deadline.is_none() {
            self.stop_deadline = Some(self.frame + timing.stop_delay);
        }
    }

    pub fn start_deadline_reached(&self) -> bool {
        self.start_deadline.is_some_and(|deadline| self.frame >= deadline)
    }

    pub fn stop_deadline_reached(&self) -> bool {
        self.stop_deadline.is_some_and(|deadline| self.frame >= deadline)
    }

    /// End of cycle bookkeeping
    pub fn advance(&mut self, started: bool, frame_step: u64) {
        self.last_started = started;
        self.frame += frame_step;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> SupervisorTiming {
        SupervisorTiming::default()
    }

    #[test]
    fn initial_state() {
        let state = SessionState::new();
        assert!(state.auto_run_allowed);
        assert_eq!(state.frame, 0);
        assert!(!state.last_started);
        assert!(!state.is_edge(false));
        assert!(state.is_edge(true));
    }

    #[test]
    fn start_delay_set_once_per_session() {
        let mut state = SessionState::new();
        state.frame = 12;
        state.observe_started(ThermalStatus::Green, &timing());
        assert_eq!(state.start_deadline, Some(17));

        state.advance(true, 3);
        state.observe_started(ThermalStatus::Green, &timing());
        assert_eq!(state.start_deadline, Some(17));
        assert!(!state.start_deadline_reached());

        state.advance(true, 3);
        assert!(state.start_deadline_reached());
    }

    #[test]
    fn red_to_yellow_reschedules_start() {
        let mut state = SessionState::new();
        assert_eq!(state.observe_started(ThermalStatus::Red, &timing()), Some(false));
        state.advance(true, 3);

        assert_eq!(
            state.observe_started(ThermalStatus::Yellow, &timing()),
            Some(true)
        );
        assert_eq!(state.start_deadline, Some(3 + 60));
    }

    #[test]
    fn yellow_to_yellow_keeps_start() {
        let mut state = SessionState::new();
        state.observe_started(ThermalStatus::Yellow, &timing());
        state.advance(true, 3);

        assert_eq!(state.observe_started(ThermalStatus::Yellow, &timing()), None);
        assert_eq!(state.start_deadline, Some(5));
    }

    #[test]
    fn danger_to_green_does_not_reschedule() {
        let mut state = SessionState::new();
        state.observe_started(ThermalStatus::Danger, &timing());
        state.advance(true, 3);

        state.observe_started(ThermalStatus::Green, &timing());
        assert!(state.auto_run_allowed);
        assert_eq!(state.start_deadline, Some(5));
    }

    #[test]
    fn stop_clears_start_and_sets_stop_once() {
        let mut state = SessionState::new();
        state.observe_started(ThermalStatus::Green, &timing());
        state.advance(true, 3);

        state.observe_stopped(&timing());
        assert_eq!(state.start_deadline, None);
        assert_eq!(state.stop_deadline, Some(33));

        state.advance(false, 3);
        state.observe_stopped(&timing());
        assert_eq!(state.stop_deadline, Some(33));

        state.observe_started(ThermalStatus::Green, &timing());
        assert_eq!(state.stop_deadline, None);
    }

    #[test]
    fn stop_deadline_reached_at_boundary() {
        let mut state = SessionState::new();
        state.frame = 9;
        state.observe_stopped(&timing());

        state.frame = 38;
        assert!(!state.stop_deadline_reached());
        state.frame = 39;
        assert!(state.stop_deadline_reached());
    }
}
