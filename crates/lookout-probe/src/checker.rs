//! Health check probe logic.
//!
//! Issues a single HTTP request per monitor with a hard deadline and turns
//! whatever happens into a [`StatusSample`].

use std::time::{Duration, Instant};

use lookout_core::{MonitorDescriptor, Settings, StatusSample, DEFAULT_METHOD};
use tracing::{debug, error, warn};

const USER_AGENT: &str = concat!("lookout/", env!("CARGO_PKG_VERSION"));

/// Executes health probes. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    agent: ureq::Agent,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(Settings::default().check_timeout())
    }
}

impl HealthChecker {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Probe one monitor. Never fails: every error becomes a `down` sample.
    ///
    /// Latency runs from request start to response headers and is only
    /// recorded when the monitor is up.
    pub fn check(&self, monitor: &MonitorDescriptor, timestamp: &str) -> StatusSample {
        debug!(id = %monitor.id, url = %monitor.url, method = %monitor.method, "checking");
        let start = Instant::now();
        let result = self.send(monitor);
        let elapsed = start.elapsed();

        match result {
            Ok(code) if (200..400).contains(&code) => {
                StatusSample::up(&monitor.id, timestamp, round_millis(elapsed))
            }
            Ok(code) => {
                warn!(id = %monitor.id, url = %monitor.url, status = code, "check failed");
                StatusSample::down(&monitor.id, timestamp)
            }
            Err(e) => {
                warn!(id = %monitor.id, url = %monitor.url, error = %e, "check error");
                StatusSample::down(&monitor.id, timestamp)
            }
        }
    }

    /// Probe every monitor with at most `concurrency` requests in flight.
    /// Results come back in the same order as `monitors`.
    pub fn check_all(
        &self,
        monitors: &[MonitorDescriptor],
        timestamp: &str,
        concurrency: usize,
    ) -> Vec<StatusSample> {
        let mut results = Vec::with_capacity(monitors.len());
        for batch in monitors.chunks(concurrency.max(1)) {
            std::thread::scope(|s| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|m| s.spawn(move || self.check(m, timestamp)))
                    .collect();
                for (monitor, handle) in batch.iter().zip(handles) {
                    let sample = handle.join().unwrap_or_else(|_| {
                        error!(id = %monitor.id, "probe thread panicked");
                        StatusSample::down(&monitor.id, timestamp)
                    });
                    results.push(sample);
                }
            });
        }
        results
    }

    /// Send the request and return the final status code (after redirects).
    fn send(&self, monitor: &MonitorDescriptor) -> anyhow::Result<u16> {
        let url = monitor.url.as_str();
        let method = match monitor.method.trim() {
            "" => DEFAULT_METHOD.to_string(),
            m => m.to_ascii_uppercase(),
        };
        let response = match method.as_str() {
            "GET" => self.agent.get(url).header("User-Agent", USER_AGENT).call()?,
            "HEAD" => self.agent.head(url).header("User-Agent", USER_AGENT).call()?,
            "DELETE" => self.agent.delete(url).header("User-Agent", USER_AGENT).call()?,
            "OPTIONS" => self.agent.options(url).header("User-Agent", USER_AGENT).call()?,
            "POST" => self.agent.post(url).header("User-Agent", USER_AGENT).send_empty()?,
            "PUT" => self.agent.put(url).header("User-Agent", USER_AGENT).send_empty()?,
            "PATCH" => self.agent.patch(url).header("User-Agent", USER_AGENT).send_empty()?,
            other => anyhow::bail!("unsupported method {other}"),
        };
        Ok(response.status().as_u16())
    }
}

fn round_millis(d: Duration) -> u64 {
    (d.as_secs_f64() * 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_core::Status;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    const TS: &str = "2024-05-01T12:00:00.000Z";

    /// Loopback HTTP server answering every request with `status_line` after `delay`.
    /// Request lines are forwarded on the returned channel.
    fn serve(status_line: &'static str, delay: Duration) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 4096];
                let n = stream.read(&mut buf).unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]);
                let _ = tx.send(head.lines().next().unwrap_or_default().to_string());
                std::thread::sleep(delay);
                let _ = write!(
                    stream,
                    "HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                );
            }
        });
        (format!("http://{addr}/health"), rx)
    }

    fn monitor(url: &str) -> MonitorDescriptor {
        MonitorDescriptor::new("a", "Site A", url)
    }

    #[test]
    fn success_is_up_with_latency() {
        let (url, _rx) = serve("200 OK", Duration::from_millis(80));
        let sample = HealthChecker::default().check(&monitor(&url), TS);
        assert_eq!(sample.status, Status::Up);
        assert_eq!(sample.id, "a");
        assert_eq!(sample.timestamp, TS);
        assert!(sample.latency >= 80, "latency {}", sample.latency);
        assert!(sample.latency < 2_000, "latency {}", sample.latency);
    }

    #[test]
    fn server_error_is_down_with_zero_latency() {
        let (url, _rx) = serve("503 Service Unavailable", Duration::ZERO);
        let sample = HealthChecker::default().check(&monitor(&url), TS);
        assert_eq!(sample, StatusSample::down("a", TS));
    }

    #[test]
    fn client_error_is_down() {
        let (url, _rx) = serve("404 Not Found", Duration::ZERO);
        let sample = HealthChecker::default().check(&monitor(&url), TS);
        assert_eq!(sample.status, Status::Down);
    }

    #[test]
    fn not_modified_counts_as_up() {
        let (url, _rx) = serve("304 Not Modified", Duration::ZERO);
        let sample = HealthChecker::default().check(&monitor(&url), TS);
        assert_eq!(sample.status, Status::Up);
    }

    #[test]
    fn timeout_is_down_with_zero_latency() {
        let (url, _rx) = serve("200 OK", Duration::from_secs(2));
        let checker = HealthChecker::new(Duration::from_millis(200));
        let start = Instant::now();
        let sample = checker.check(&monitor(&url), TS);
        assert_eq!(sample, StatusSample::down("a", TS));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn connection_refused_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let sample = HealthChecker::default().check(&monitor(&format!("http://{addr}/")), TS);
        assert_eq!(sample, StatusSample::down("a", TS));
    }

    #[test]
    fn invalid_url_is_down() {
        let sample = HealthChecker::default().check(&monitor("not a url"), TS);
        assert_eq!(sample, StatusSample::down("a", TS));
    }

    #[test]
    fn unsupported_method_is_down() {
        let (url, rx) = serve("200 OK", Duration::ZERO);
        let mut m = monitor(&url);
        m.method = "BREW".to_string();
        let sample = HealthChecker::default().check(&m, TS);
        assert_eq!(sample.status, Status::Down);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn uses_descriptor_method() {
        let (url, rx) = serve("200 OK", Duration::ZERO);
        let mut m = monitor(&url);
        m.method = "head".to_string();
        let sample = HealthChecker::default().check(&m, TS);
        assert_eq!(sample.status, Status::Up);
        let line = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(line.starts_with("HEAD /health"), "{line}");
    }

    #[test]
    fn blank_method_sends_get() {
        let (url, rx) = serve("200 OK", Duration::ZERO);
        let mut m = monitor(&url);
        m.method = String::new();
        let sample = HealthChecker::default().check(&m, TS);
        assert_eq!(sample.status, Status::Up);
        let line = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(line.starts_with("GET /health"), "{line}");
    }

    #[test]
    fn check_all_preserves_order_and_timestamp() {
        let (up, _r1) = serve("200 OK", Duration::from_millis(50));
        let (down, _r2) = serve("500 Internal Server Error", Duration::ZERO);
        let monitors = vec![
            MonitorDescriptor::new("first", "First", &up),
            MonitorDescriptor::new("second", "Second", &down),
            MonitorDescriptor::new("third", "Third", &up),
        ];

        let results = HealthChecker::default().check_all(&monitors, TS, 2);
        let ids: Vec<&str> = results.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
        assert!(results.iter().all(|s| s.timestamp == TS));
        let statuses: Vec<Status> = results.iter().map(|s| s.status).collect();
        assert_eq!(statuses, [Status::Up, Status::Down, Status::Up]);
    }

    #[test]
    fn check_all_with_zero_concurrency_still_runs() {
        let (url, _rx) = serve("200 OK", Duration::ZERO);
        let results = HealthChecker::default().check_all(&[monitor(&url)], TS, 0);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn round_millis_rounds_to_nearest() {
        assert_eq!(round_millis(Duration::from_micros(80_499)), 80);
        assert_eq!(round_millis(Duration::from_micros(80_500)), 81);
        assert_eq!(round_millis(Duration::ZERO), 0);
    }
}
