use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("timed out while waiting for {addr} to answer after {attempts} attempts")]
    Timeout { addr: String, attempts: u32 },
}

/// Checks whether a service accepts connections.
#[async_trait]
pub trait ServiceProbe: Send + Sync + 'static {
    async fn probe(&self, addr: &str, timeout: Duration) -> io::Result<()>;
}

/// Probe that opens (and immediately drops) a TCP connection.
pub struct TcpProbe;

#[async_trait]
impl ServiceProbe for TcpProbe {
    async fn probe(&self, addr: &str, timeout: Duration) -> io::Result<()> {
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "dial timed out")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadinessPolicy {
    pub attempts: u32,
    pub dial_timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            dial_timeout: Duration::from_secs(60),
        }
    }
}

/// Probe `addr` until it answers or the policy's attempts run out.
///
/// Returns the 1-based attempt that succeeded. Attempts follow each other
/// directly; a slow dial is bounded by the dial timeout only.
pub async fn wait_for_service(
    probe: &dyn ServiceProbe,
    addr: &str,
    policy: ReadinessPolicy,
) -> Result<u32, ReadinessError> {
    for attempt in 1..=policy.attempts {
        info!(addr, attempt, "readiness: probing");
        match probe.probe(addr, policy.dial_timeout).await {
            Ok(()) => {
                info!(addr, attempt, "readiness: service is up");
                return Ok(attempt);
            }
            Err(e) => warn!(addr, attempt, error = %e, "readiness: service not answering"),
        }
    }

    Err(ReadinessError::Timeout {
        addr: addr.to_string(),
        attempts: policy.attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::net::TcpListener;

    use super::*;

    fn quick() -> ReadinessPolicy {
        ReadinessPolicy {
            attempts: 5,
            dial_timeout: Duration::from_millis(500),
        }
    }

    struct Refusing(AtomicU32);

    #[async_trait]
    impl ServiceProbe for Refusing {
        async fn probe(&self, _addr: &str, _timeout: Duration) -> io::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(io::Error::from(io::ErrorKind::ConnectionRefused))
        }
    }

    #[tokio::test]
    async fn gives_up_after_exactly_five_attempts() {
        let probe = Refusing(AtomicU32::new(0));

        let err = wait_for_service(&probe, "app.abc1234.x.pifft.com:9200", quick())
            .await
            .unwrap_err();

        assert!(matches!(err, ReadinessError::Timeout { attempts: 5, .. }));
        assert_eq!(probe.0.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn succeeds_once_a_listener_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let attempt = wait_for_service(&TcpProbe, &addr, quick()).await.unwrap();
        assert_eq!(attempt, 1);
    }

    #[tokio::test]
    async fn closed_port_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = wait_for_service(&TcpProbe, &addr, quick()).await.unwrap_err();
        assert!(matches!(err, ReadinessError::Timeout { attempts: 5, .. }));
    }
}
