//! Integration tests for appd
//!
//! These tests drive the supervisor through full multi-cycle scenarios with
//! the real configuration parser, the file-backed parameter store and the
//! socket telemetry transport; only the shell and the package manager are
//! mocked.

use appd_api::{AppCategory, TelemetrySample, ThermalStatus};
use appd_config::{parse_config, Policy};
use appd_core::{
    ActionReason, HostServices, LoopStep, Supervisor, SupervisorEvent, SupervisorEventKind,
    SupervisorLoop,
};
use appd_host_api::{MockExecutor, MockInstaller, ParamStore, ScriptedTelemetry};
use appd_params::FileParams;
use appd_telemetry::{TelemetryPublisher, TelemetryServer};
use appd_util::{AppId, MonotonicInstant};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const CONFIG: &str = r#"
config_version = 1

[[apps]]
package = "com.nav"
entry_point = "com.nav.MainActivity"
category = "gps"
enable_param = "EnableNav"
auto_run_param = "AutoRunNav"
manual_ctrl_param = "RunNav"

[[apps]]
package = "com.gpsd"
entry_point = "com.gpsd.LocationService"
category = "gps_service"
enable_param = "EnableGpsd"
app_ops = ["android:run_in_background"]

[[apps]]
package = "com.mixplorer"
entry_point = "com.mixplorer.activities.BrowseActivity"
category = "utility"
manual_ctrl_param = "OpkrRunMixplorer"
permissions = ["android.permission.READ_EXTERNAL_STORAGE"]
"#;

struct Bench {
    _dir: TempDir,
    params: Arc<FileParams>,
    executor: Arc<MockExecutor>,
    installer: Arc<MockInstaller>,
    policy: Policy,
}

impl Bench {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let params = Arc::new(FileParams::open(dir.path().join("params")).unwrap());
        params.put("EnableNav", "1").unwrap();
        params.put("AutoRunNav", "1").unwrap();
        params.put("EnableGpsd", "1").unwrap();

        let installer = MockInstaller::new()
            .with_installed("com.nav", "3.1")
            .with_installed("com.gpsd", "1.0")
            .with_installed("com.mixplorer", "6.58");

        Self {
            _dir: dir,
            params,
            executor: Arc::new(MockExecutor::new()),
            installer: Arc::new(installer),
            policy: parse_config(CONFIG).unwrap(),
        }
    }

    fn services(&self) -> HostServices {
        HostServices {
            params: self.params.clone(),
            executor: self.executor.clone(),
            installer: self.installer.clone(),
        }
    }

    fn supervisor(&self) -> Supervisor {
        Supervisor::from_policy(&self.policy, &self.services()).unwrap()
    }

    /// External write as another process would make it. The marker only has
    /// filesystem timestamp resolution, so wait until it moves.
    fn set_param(&self, key: &str, value: &str) {
        let before = self.params.last_modified();
        for _ in 0..200 {
            self.params.put(key, value).unwrap();
            if self.params.last_modified() != before {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("params marker did not change");
    }
}

fn id(package: &str) -> AppId {
    match package {
        "com.nav" => AppId::new("com.nav", "com.nav.MainActivity"),
        "com.gpsd" => AppId::new("com.gpsd", "com.gpsd.LocationService"),
        _ => AppId::new("com.mixplorer", "com.mixplorer.activities.BrowseActivity"),
    }
}

fn started(events: &[SupervisorEvent], package: &str) -> bool {
    events.iter().any(|e| {
        matches!(&e.kind, SupervisorEventKind::AppStarted { app, .. } if app.package() == package)
    })
}

fn killed(events: &[SupervisorEvent], package: &str) -> bool {
    events.iter().any(|e| {
        matches!(&e.kind, SupervisorEventKind::AppKilled { app, .. } if app.package() == package)
    })
}

fn drive() -> TelemetrySample {
    TelemetrySample::started(ThermalStatus::Green)
}

fn park() -> TelemetrySample {
    TelemetrySample::stopped(ThermalStatus::Green)
}

#[test]
fn test_construction_grants_and_resets_manual_keys() {
    let bench = Bench::new();
    bench.params.put("OpkrRunMixplorer", "1").unwrap();

    let supervisor = bench.supervisor();
    assert_eq!(supervisor.apps().len(), 3);

    let commands = bench.executor.take_commands();
    assert!(commands.contains(
        &"pm grant com.mixplorer android.permission.READ_EXTERNAL_STORAGE".to_string()
    ));
    assert!(commands.contains(
        &"LD_LIBRARY_PATH= appops set com.gpsd android:run_in_background allow".to_string()
    ));

    assert_eq!(bench.params.get("OpkrRunMixplorer").as_deref(), Some("0"));
    assert_eq!(bench.params.get("RunNav").as_deref(), Some("0"));

    let nav = supervisor.app(&id("com.nav")).unwrap();
    assert!(nav.is_enabled());
    assert!(nav.is_auto_run_eligible());
    assert_eq!(nav.category(), AppCategory::Gps);
}

#[tokio::test]
async fn test_startup_grace_suppresses_construction() {
    let bench = Bench::new();
    bench.params.put("OpkrRunMixplorer", "1").unwrap();

    let start = MonotonicInstant::now();
    let mut runner = SupervisorLoop::new(bench.policy.clone(), bench.services(), start);
    let mut telemetry = ScriptedTelemetry::new([drive(); 6]);

    // Telemetry is already flowing while the grace period runs
    for offset in [0, 3, 6, 9] {
        let step = runner
            .step(start + Duration::from_secs(offset), &mut telemetry)
            .await
            .unwrap();
        assert!(matches!(step, LoopStep::Waiting));
    }
    assert!(runner.supervisor().is_none());
    assert!(bench.executor.commands().is_empty());
    assert!(bench.installer.uninstalled().is_empty());
    assert_eq!(bench.params.get("RunNav"), None);
    assert_eq!(bench.params.get("OpkrRunMixplorer").as_deref(), Some("1"));
    assert_eq!(telemetry.remaining(), 6);

    let step = runner
        .step(start + Duration::from_secs(12), &mut telemetry)
        .await
        .unwrap();
    assert!(matches!(step, LoopStep::Started));
    assert_eq!(runner.supervisor().unwrap().apps().len(), 3);
    assert_eq!(bench.params.get("RunNav").as_deref(), Some("0"));
    assert_eq!(bench.params.get("OpkrRunMixplorer").as_deref(), Some("0"));

    let step = runner
        .step(start + Duration::from_secs(15), &mut telemetry)
        .await
        .unwrap();
    match step {
        LoopStep::Cycle(events) => assert!(started(&events, "com.gpsd")),
        other => panic!("expected a cycle, got {:?}", other),
    }
    assert_eq!(telemetry.remaining(), 5);
}

#[test]
fn test_override_written_in_place_is_honored() {
    let bench = Bench::new();
    let mut supervisor = bench.supervisor();
    supervisor.cycle(park());

    // Same as `echo 1 > OpkrRunMixplorer`: truncate and rewrite, no rename
    std::thread::sleep(Duration::from_millis(50));
    std::fs::write(bench.params.dir().join("OpkrRunMixplorer"), "1").unwrap();

    let events = supervisor.cycle(park());
    assert!(started(&events, "com.mixplorer"));
    assert_eq!(bench.params.get("OpkrRunMixplorer").as_deref(), Some("0"));
}

#[test]
fn test_drive_session() {
    let bench = Bench::new();
    let mut supervisor = bench.supervisor();
    bench.executor.take_commands();

    // Engine start: GPS service comes up at once
    let events = supervisor.cycle(drive());
    assert!(started(&events, "com.gpsd"));
    assert!(!started(&events, "com.nav"));
    assert_eq!(
        bench.executor.take_commands(),
        vec![
            "pm enable com.gpsd",
            "LD_LIBRARY_PATH= appops set com.gpsd android:mock_location allow",
            "am startservice com.gpsd/com.gpsd.LocationService",
        ]
    );

    // Navigation waits out the start delay
    let events = supervisor.cycle(drive());
    assert!(!started(&events, "com.nav"));
    let events = supervisor.cycle(drive());
    assert!(started(&events, "com.nav"));
    assert_eq!(
        bench.executor.take_commands(),
        vec!["pm enable com.nav", "am start -n com.nav/com.nav.MainActivity"]
    );

    // Steady state: nothing more to do
    for _ in 0..5 {
        assert!(supervisor.cycle(drive()).is_empty());
    }
    assert!(bench.executor.commands().is_empty());

    // Parked: everything survives the stop delay, then goes down
    let mut parked_cycles = 0;
    loop {
        let events = supervisor.cycle(park());
        parked_cycles += 1;
        if killed(&events, "com.nav") {
            assert!(killed(&events, "com.gpsd"));
            break;
        }
        assert!(parked_cycles < 20, "apps never stopped");
    }
    // First parked frame F, kill at F + 30 with a step of 3
    assert_eq!(parked_cycles, 11);

    let commands = bench.executor.take_commands();
    assert!(commands.contains(&"pkill com.nav".to_string()));
    assert!(commands.contains(
        &"LD_LIBRARY_PATH= appops set com.gpsd android:mock_location deny".to_string()
    ));
}

#[test]
fn test_overheating_and_recovery() {
    let bench = Bench::new();
    let mut supervisor = bench.supervisor();

    for _ in 0..3 {
        supervisor.cycle(drive());
    }
    assert!(supervisor.app(&id("com.nav")).unwrap().is_running());

    let events = supervisor.cycle(TelemetrySample::started(ThermalStatus::Red));
    assert!(killed(&events, "com.nav"));
    assert!(events.iter().any(|e| matches!(
        &e.kind,
        SupervisorEventKind::AppKilled {
            reason: ActionReason::Thermal,
            ..
        }
    )));

    // Cooling to yellow does not restart navigation for 60 frames
    let recovered_at = supervisor.session().frame;
    let mut restarted_at = None;
    for _ in 0..30 {
        let frame = supervisor.session().frame;
        let events = supervisor.cycle(TelemetrySample::started(ThermalStatus::Yellow));
        if started(&events, "com.nav") {
            restarted_at = Some(frame);
            break;
        }
    }
    assert_eq!(restarted_at, Some(recovered_at + 60));
}

#[test]
fn test_manual_utility_session() {
    let bench = Bench::new();
    let mut supervisor = bench.supervisor();
    bench.executor.take_commands();

    supervisor.cycle(park());

    // User opens the file manager while parked
    bench.set_param("OpkrRunMixplorer", "1");
    let events = supervisor.cycle(park());
    assert!(started(&events, "com.mixplorer"));
    assert_eq!(bench.params.get("OpkrRunMixplorer").as_deref(), Some("0"));
    assert!(
        supervisor
            .app(&id("com.mixplorer"))
            .unwrap()
            .overridden_this_session()
    );

    // Overridden apps ignore the stop delay for the rest of the session
    for _ in 0..15 {
        let events = supervisor.cycle(park());
        assert!(!killed(&events, "com.mixplorer"));
    }
    assert!(supervisor.app(&id("com.mixplorer")).unwrap().is_running());

    // Engine start kills utilities and clears the override
    let events = supervisor.cycle(drive());
    assert!(killed(&events, "com.mixplorer"));
    assert!(
        !supervisor
            .app(&id("com.mixplorer"))
            .unwrap()
            .overridden_this_session()
    );
}

#[test]
fn test_disable_while_running() {
    let bench = Bench::new();
    let mut supervisor = bench.supervisor();

    supervisor.cycle(drive());
    assert!(supervisor.app(&id("com.gpsd")).unwrap().is_running());
    bench.executor.take_commands();

    bench.set_param("EnableGpsd", "0");
    let events = supervisor.cycle(drive());
    assert!(events.iter().any(|e| matches!(
        &e.kind,
        SupervisorEventKind::AppKilled {
            forced: true,
            reason: ActionReason::Disabled,
            ..
        }
    )));
    assert_eq!(
        bench.executor.take_commands(),
        vec![
            "LD_LIBRARY_PATH= appops set com.gpsd android:mock_location deny",
            "pkill com.gpsd",
        ]
    );
    assert!(!supervisor.app(&id("com.gpsd")).unwrap().is_enabled());
}

#[test]
fn test_command_failures_are_not_fatal() {
    let bench = Bench::new();
    let mut supervisor = bench.supervisor();
    bench.executor.set_fail(true);

    let events = supervisor.cycle(drive());
    assert!(started(&events, "com.gpsd"));
    assert!(supervisor.app(&id("com.gpsd")).unwrap().is_running());
}

#[tokio::test]
async fn test_scripted_telemetry_loop() {
    let bench = Bench::new();
    let mut supervisor = bench.supervisor();

    let script = [drive(), drive(), drive(), park()];
    let mut telemetry = ScriptedTelemetry::new(script);

    let mut all = Vec::new();
    while let Some(events) = supervisor.run_cycle(&mut telemetry).await {
        all.extend(events);
    }

    assert!(started(&all, "com.gpsd"));
    assert!(started(&all, "com.nav"));
    let edges = all
        .iter()
        .filter(|e| matches!(e.kind, SupervisorEventKind::SessionEdge { .. }))
        .count();
    assert_eq!(edges, 2);
    assert_eq!(telemetry.remaining(), 0);
}

#[tokio::test]
async fn test_socket_telemetry_drives_supervisor() {
    let bench = Bench::new();
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("telemetry.sock");

    let mut server = TelemetryServer::new(&socket_path);
    server.start().await.unwrap();
    let server = Arc::new(server);
    let accept = server.clone();
    tokio::spawn(async move {
        let _ = accept.run().await;
    });

    let mut receiver = server.receiver();
    let mut supervisor = bench.supervisor();

    let mut publisher = TelemetryPublisher::connect(&socket_path).await.unwrap();
    publisher.publish(&drive()).await.unwrap();

    let events = tokio::time::timeout(Duration::from_secs(5), supervisor.run_cycle(&mut receiver))
        .await
        .unwrap()
        .unwrap();
    assert!(started(&events, "com.gpsd"));
    assert!(supervisor.session().last_started);
}
