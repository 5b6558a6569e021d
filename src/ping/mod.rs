use serde::{Serialize, Serializer};
use std::process::Output;
use std::sync::OnceLock;
use tokio::process::Command;

/// Result of a single echo request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PingOutcome {
    /// Round-trip time in milliseconds
    Latency(f64),
    Timeout,
    Error,
}

/// Latencies serialize as numbers, failures as "timeout" / "error"
impl Serialize for PingOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PingOutcome::Latency(ms) => serializer.serialize_f64(*ms),
            PingOutcome::Timeout => serializer.serialize_str("timeout"),
            PingOutcome::Error => serializer.serialize_str("error"),
        }
    }
}

/// PingReport lists the outcome of each echo sent to `host`
#[derive(Debug, Clone, Serialize)]
pub struct PingReport {
    pub host: String,
    pub pings: Vec<PingOutcome>,
}

/// Extract the round-trip time from `ping` output, e.g. "time=0.045 ms"
pub fn parse_latency(output: &str) -> Option<f64> {
    static TIME_RE: OnceLock<regex_lite::Regex> = OnceLock::new();
    let re = TIME_RE.get_or_init(|| {
        regex_lite::Regex::new(r"time[=<]\s*([0-9]+(?:\.[0-9]+)?)\s*ms").expect("valid latency regex")
    });
    re.captures(output)?.get(1)?.as_str().parse().ok()
}

/// Classify a finished `ping -c 1` run.
/// Exit code 1 means no reply; any other failure is an error.
pub fn classify(output: &Output) -> PingOutcome {
    if output.status.success() {
        return parse_latency(&String::from_utf8_lossy(&output.stdout))
            .map(PingOutcome::Latency)
            .unwrap_or(PingOutcome::Error);
    }
    match output.status.code() {
        Some(1) => PingOutcome::Timeout,
        _ => PingOutcome::Error,
    }
}

/// Send one echo request with the system ping binary
pub async fn ping_once(ip: &str, timeout_secs: u64) -> PingOutcome {
    let output = Command::new("ping")
        .args(["-c", "1", "-W", &timeout_secs.max(1).to_string(), ip])
        .output()
        .await;

    match output {
        Ok(output) => classify(&output),
        Err(e) => {
            tracing::warn!("Failed to run ping for {}: {}", ip, e);
            PingOutcome::Error
        }
    }
}

/// Ping `ip` `amount` times, one echo after another.
/// Callers validate `ip` before it reaches the command line.
pub async fn ping_host(ip: &str, amount: u32, timeout_secs: u64) -> PingReport {
    let mut pings = Vec::with_capacity(amount as usize);
    for _ in 0..amount {
        pings.push(ping_once(ip, timeout_secs).await);
    }
    tracing::debug!("Pinged {} x{}: {:?}", ip, amount, pings);

    PingReport {
        host: ip.to_string(),
        pings,
    }
}
