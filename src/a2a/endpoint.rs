//! Listener addresses: `unix:///path` and `tcp://host:port`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use crate::error::SwarmError;

/// A bidirectional byte stream from either transport.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;

/// Where an agent listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Endpoint {
    /// Default endpoint for an agent: a socket in the temp directory.
    pub fn default_for(agent: &str) -> Self {
        Self::Unix(std::env::temp_dir().join(format!("agent-swarm-{agent}.sock")))
    }

    pub async fn bind(&self) -> Result<Listener, SwarmError> {
        match self {
            Self::Tcp(addr) => Ok(Listener::Tcp(TcpListener::bind(addr).await?)),
            #[cfg(unix)]
            Self::Unix(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "removing stale socket");
                    std::fs::remove_file(path)?;
                }
                let listener = tokio::net::UnixListener::bind(path)?;
                Ok(Listener::Unix {
                    listener,
                    path: path.clone(),
                })
            }
            #[cfg(not(unix))]
            Self::Unix(_) => Err(SwarmError::Configuration(
                "unix endpoints are not supported on this platform".into(),
            )),
        }
    }

    pub async fn connect(&self) -> std::io::Result<BoxedStream> {
        match self {
            Self::Tcp(addr) => Ok(Box::new(TcpStream::connect(addr).await?)),
            #[cfg(unix)]
            Self::Unix(path) => Ok(Box::new(tokio::net::UnixStream::connect(path).await?)),
            #[cfg(not(unix))]
            Self::Unix(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "unix endpoints are not supported on this platform",
            )),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

impl FromStr for Endpoint {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(SwarmError::Configuration(format!("endpoint '{s}' has no socket path")));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        if let Some(addr) = s.strip_prefix("tcp://") {
            let valid = addr
                .rsplit_once(':')
                .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
            if !valid {
                return Err(SwarmError::Configuration(format!(
                    "endpoint '{s}' must be tcp://host:port"
                )));
            }
            return Ok(Self::Tcp(addr.to_string()));
        }
        Err(SwarmError::Configuration(format!(
            "unsupported endpoint '{s}': use unix:///path or tcp://host:port"
        )))
    }
}

impl TryFrom<String> for Endpoint {
    type Error = SwarmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(value: Endpoint) -> Self {
        value.to_string()
    }
}

/// A bound listener. Dropping a unix listener removes its socket file.
pub enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix {
        listener: tokio::net::UnixListener,
        path: PathBuf,
    },
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(listener) => f.debug_tuple("Tcp").field(&listener.local_addr().ok()).finish(),
            #[cfg(unix)]
            Self::Unix { path, .. } => f.debug_tuple("Unix").field(path).finish(),
        }
    }
}

impl Listener {
    /// Accept one connection, returning it with a printable peer address.
    pub async fn accept(&self) -> std::io::Result<(BoxedStream, String)> {
        match self {
            Self::Tcp(listener) => {
                let (stream, addr) = listener.accept().await?;
                Ok((Box::new(stream), addr.to_string()))
            }
            #[cfg(unix)]
            Self::Unix { listener, path } => {
                let (stream, _) = listener.accept().await?;
                Ok((Box::new(stream), format!("unix:{}", path.display())))
            }
        }
    }

    /// The endpoint actually bound, with the real port for `tcp://host:0`.
    pub fn local_endpoint(&self) -> std::io::Result<Endpoint> {
        match self {
            Self::Tcp(listener) => Ok(Endpoint::Tcp(listener.local_addr()?.to_string())),
            #[cfg(unix)]
            Self::Unix { path, .. } => Ok(Endpoint::Unix(path.clone())),
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            if let Self::Unix { path, .. } = self {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_schemes() {
        assert_eq!(
            "unix:///tmp/a.sock".parse::<Endpoint>().unwrap(),
            Endpoint::Unix(PathBuf::from("/tmp/a.sock"))
        );
        assert_eq!(
            "tcp://127.0.0.1:7000".parse::<Endpoint>().unwrap(),
            Endpoint::Tcp("127.0.0.1:7000".into())
        );
    }

    #[test]
    fn rejects_bad_endpoints() {
        for bad in ["http://x", "unix://", "tcp://nohost", "tcp://:80", "tcp://h:port"] {
            assert!(bad.parse::<Endpoint>().is_err(), "{bad}");
        }
    }

    #[test]
    fn display_round_trips() {
        let endpoint = Endpoint::default_for("writer");
        assert!(endpoint.to_string().ends_with("agent-swarm-writer.sock"));
        assert_eq!(endpoint.to_string().parse::<Endpoint>().unwrap(), endpoint);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn bind_replaces_stale_socket_and_drop_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.sock");
        std::fs::write(&path, b"").unwrap();

        let endpoint = Endpoint::Unix(path.clone());
        let listener = endpoint.bind().await.unwrap();
        assert!(path.exists());
        drop(listener);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn tcp_port_zero_reports_real_port() {
        let listener = Endpoint::Tcp("127.0.0.1:0".into()).bind().await.unwrap();
        match listener.local_endpoint().unwrap() {
            Endpoint::Tcp(addr) => assert!(!addr.ends_with(":0")),
            other => panic!("unexpected endpoint {other:?}"),
        }
    }
}
