//! Daemon-side driver: startup grace, one-time construction, cycles

use appd_config::Policy;
use appd_host_api::TelemetrySource;
use appd_util::{MonotonicInstant, StartupGate};
use tracing::info;

use crate::{HostServices, Supervisor, SupervisorEvent};

/// Outcome of one [`SupervisorLoop::step`]
#[derive(Debug)]
pub enum LoopStep {
    /// Still inside the startup grace period; nothing was touched
    Waiting,

    /// Grace elapsed and the app records were built this step
    Started,

    /// A full cycle ran
    Cycle(Vec<SupervisorEvent>),

    /// The telemetry source is gone; the cycle was cut short
    TelemetryClosed,
}

/// Owns the supervisor across its whole lifetime.
///
/// No app record exists, and telemetry is not read, until the startup gate
/// opens. Records are built exactly once.
pub struct SupervisorLoop {
    policy: Policy,
    services: HostServices,
    gate: StartupGate,
    supervisor: Option<Supervisor>,
}

impl SupervisorLoop {
    pub fn new(policy: Policy, services: HostServices, started_at: MonotonicInstant) -> Self {
        let gate = StartupGate::new(started_at, policy.supervisor.startup_grace);
        info!(grace = ?gate.grace(), "Supervisor waiting for startup grace");

        Self {
            policy,
            services,
            gate,
            supervisor: None,
        }
    }

    /// The supervisor, once built
    pub fn supervisor(&self) -> Option<&Supervisor> {
        self.supervisor.as_ref()
    }

    /// Advance by one loop iteration at monotonic time `now`
    pub async fn step(
        &mut self,
        now: MonotonicInstant,
        telemetry: &mut dyn TelemetrySource,
    ) -> appd_util::Result<LoopStep> {
        let Some(supervisor) = self.supervisor.as_mut() else {
            if !self.gate.poll(now) {
                return Ok(LoopStep::Waiting);
            }
            info!("Startup grace elapsed, building app records");
            self.supervisor = Some(Supervisor::from_policy(&self.policy, &self.services)?);
            return Ok(LoopStep::Started);
        };

        Ok(match supervisor.run_cycle(telemetry).await {
            Some(events) => LoopStep::Cycle(events),
            None => LoopStep::TelemetryClosed,
        })
    }
}
