use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use super::Script;
use crate::utils::truncate_lines;

/// Channel a resolved command is pushed through (an SSH shell in production)
pub trait Transport {
    fn send(&mut self, command: &str) -> anyhow::Result<String>;
}

/// Honors the wait attached to each resolved step
pub trait Pause {
    fn pause(&mut self, wait: Duration);
}

/// Blocking pause for runs driven from a blocking thread
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&mut self, wait: Duration) {
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }
}

/// Identification of the host a script is pushed to, used for labeling only
pub trait HostIdentity {
    fn name(&self) -> &str;
    fn address(&self) -> &str;
}

/// StepOutcome records one command that was sent and what came back
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub command: String,
    pub output: String,
}

/// ScriptReport is the result of pushing a script to a host
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub host: String,
    pub address: String,
    pub script: String,
    pub steps: Vec<StepOutcome>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Push `script` to `host` one step at a time.
///
/// Each step's pre-send wait is observed through `pause` before the command
/// is sent. The first failure, whether a missing parameter or a transport
/// error, ends the run: no later step is resolved, waited for, or sent.
pub fn run_script<H, V, T, P>(
    host: &H,
    script: &Script,
    values: &HashMap<String, V>,
    wait_override: Option<Duration>,
    transport: &mut T,
    pause: &mut P,
) -> ScriptReport
where
    H: HostIdentity + ?Sized,
    V: fmt::Display,
    T: Transport + ?Sized,
    P: Pause + ?Sized,
{
    let span = tracing::info_span!("script_run", host = host.name(), script = script.name());
    let _guard = span.enter();

    tracing::info!(
        "Pushing script '{}' ({} steps) to {} ({})",
        script.name(),
        script.steps().len(),
        host.name(),
        host.address()
    );

    let mut report = ScriptReport {
        host: host.name().to_string(),
        address: host.address().to_string(),
        script: script.name().to_string(),
        steps: Vec::with_capacity(script.steps().len()),
        success: true,
        failed_step: None,
        error: None,
    };

    for resolved in script.resolve_all(values).with_wait_override(wait_override) {
        let step = match resolved {
            Ok(step) => step,
            Err(e) => {
                tracing::warn!("{}", e);
                report.success = false;
                report.failed_step = e.step;
                report.error = Some(e.to_string());
                break;
            }
        };

        pause.pause(step.wait_before);

        tracing::debug!(step = step.step, "Sending: {}", step.command);
        match transport.send(&step.command) {
            Ok(output) => {
                tracing::debug!(step = step.step, "Output:\n{}", truncate_lines(&output, 20));
                report.steps.push(StepOutcome {
                    step: step.step,
                    command: step.command,
                    output,
                });
            }
            Err(e) => {
                tracing::warn!(step = step.step, "Send failed: {:#}", e);
                report.success = false;
                report.failed_step = Some(step.step);
                report.error = Some(format!("step {}: {:#}", step.step, e));
                break;
            }
        }
    }

    if report.success {
        tracing::info!("Script '{}' completed on {}", script.name(), host.name());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::CommandTemplate;
    use std::cell::Cell;
    use std::rc::Rc;

    struct TestHost;

    impl HostIdentity for TestHost {
        fn name(&self) -> &str {
            "switch-01"
        }

        fn address(&self) -> &str {
            "192.0.2.10"
        }
    }

    /// Fake clock advanced only by FakePause
    #[derive(Clone, Default)]
    struct FakeClock(Rc<Cell<Duration>>);

    impl FakeClock {
        fn now(&self) -> Duration {
            self.0.get()
        }

        fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    struct FakePause(FakeClock);

    impl Pause for FakePause {
        fn pause(&mut self, wait: Duration) {
            self.0.advance(wait);
        }
    }

    /// Records every command with the fake time it was sent at
    struct RecordingTransport {
        clock: FakeClock,
        sent: Vec<(Duration, String)>,
        fail_on: Option<String>,
    }

    impl RecordingTransport {
        fn new(clock: FakeClock) -> Self {
            Self {
                clock,
                sent: Vec::new(),
                fail_on: None,
            }
        }
    }

    impl Transport for RecordingTransport {
        fn send(&mut self, command: &str) -> anyhow::Result<String> {
            if self.fail_on.as_deref() == Some(command) {
                anyhow::bail!("connection reset");
            }
            self.sent.push((self.clock.now(), command.to_string()));
            Ok(format!("ok: {}", command))
        }
    }

    fn step(template: &str, wait_ms: u64, params: &[&str]) -> CommandTemplate {
        CommandTemplate::new(template, wait_ms, params.iter().map(|p| p.to_string()).collect())
            .unwrap()
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_run_sends_all_steps_in_order() {
        let script = Script::new(
            "configure",
            vec![step("conf t", 0, &[]), step("hostname NAME", 0, &["NAME"]), step("end", 0, &[])],
        )
        .unwrap();
        let clock = FakeClock::default();
        let mut transport = RecordingTransport::new(clock.clone());

        let report = run_script(
            &TestHost,
            &script,
            &values(&[("NAME", "core-1")]),
            None,
            &mut transport,
            &mut FakePause(clock),
        );

        assert!(report.success);
        assert_eq!(report.host, "switch-01");
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.steps[1].output, "ok: hostname core-1");
        let sent: Vec<&str> = transport.sent.iter().map(|(_, c)| c.as_str()).collect();
        assert_eq!(sent, vec!["conf t", "hostname core-1", "end"]);
    }

    #[test]
    fn test_run_observes_wait_between_commands() {
        let script = Script::new("waits", vec![step("reload", 500, &[]), step("show ver", 0, &[])])
            .unwrap();
        let clock = FakeClock::default();
        let mut transport = RecordingTransport::new(clock.clone());

        let report = run_script(
            &TestHost,
            &script,
            &values(&[]),
            None,
            &mut transport,
            &mut FakePause(clock),
        );

        assert!(report.success);
        let elapsed = transport.sent[1].0 - transport.sent[0].0;
        assert!(elapsed >= Duration::from_millis(500));
    }

    #[test]
    fn test_run_stops_at_missing_parameter() {
        let script = Script::new(
            "partial",
            vec![step("first", 0, &[]), step("second X", 0, &["X"]), step("third", 0, &[])],
        )
        .unwrap();
        let clock = FakeClock::default();
        let mut transport = RecordingTransport::new(clock.clone());

        let report = run_script(
            &TestHost,
            &script,
            &values(&[]),
            None,
            &mut transport,
            &mut FakePause(clock),
        );

        assert!(!report.success);
        assert_eq!(report.failed_step, Some(2));
        assert_eq!(report.steps.len(), 1);
        assert_eq!(transport.sent.len(), 1);
        assert!(report.error.unwrap().contains("missing parameter(s): X"));
    }

    #[test]
    fn test_run_stops_after_transport_failure() {
        let script = Script::new(
            "fails",
            vec![step("a", 1000, &[]), step("b", 1000, &[]), step("c", 0, &[])],
        )
        .unwrap();
        let clock = FakeClock::default();
        let mut transport = RecordingTransport::new(clock.clone());
        transport.fail_on = Some("b".to_string());

        let report = run_script(
            &TestHost,
            &script,
            &values(&[]),
            None,
            &mut transport,
            &mut FakePause(clock.clone()),
        );

        assert!(!report.success);
        assert_eq!(report.failed_step, Some(2));
        assert_eq!(report.error.as_deref(), Some("step 2: connection reset"));
        // the wait after "b" is never observed because "c" is never pulled
        assert_eq!(clock.now(), Duration::from_millis(1000));
        assert_eq!(transport.sent.len(), 1);
    }
}
