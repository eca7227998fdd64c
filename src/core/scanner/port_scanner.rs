// src/core/scanner/port_scanner.rs

use tracing::{debug, info};

use futures::future::join_all;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// The default TCP ports probed by a connect scan.
pub const DEFAULT_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 143, 443, 445, 465, 587, 993, 995, 1433, 3306, 3389, 5432, 6379,
    8080, 8443, 9200,
];

const CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);
const BANNER_TIMEOUT: Duration = Duration::from_millis(600);
const BANNER_MAX_BYTES: usize = 256;

/// One open port, with whatever greeting the service volunteered.
#[derive(Debug, Clone)]
pub struct PortHit {
    pub port: u16,
    pub banner: Option<String>,
}

/// Runs a TCP connect scan over the default port list.
///
/// Every port is probed concurrently with a short timeout; a connection that
/// succeeds is given one more short window to volunteer a banner (SSH, FTP
/// and mail services greet immediately, HTTP does not). Closed and filtered
/// ports are indistinguishable here and both count as not open.
pub async fn scan_host(host: &str) -> Result<Vec<PortHit>, String> {
    info!(host, ports = DEFAULT_PORTS.len(), "Starting port scan.");

    let probes = DEFAULT_PORTS.iter().map(|&port| {
        let host = host.to_string();
        async move { probe_port(&host, port).await }
    });

    let mut hits: Vec<PortHit> = join_all(probes).await.into_iter().flatten().collect();
    hits.sort_by_key(|h| h.port);

    info!(host, open = hits.len(), "Port scan finished.");
    Ok(hits)
}

/// Probes one port. `None` means closed, filtered or timed out.
async fn probe_port(host: &str, port: u16) -> Option<PortHit> {
    let stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            debug!(host, port, error = %e, "Connect failed.");
            return None;
        }
        Err(_) => {
            debug!(host, port, "Connect timed out.");
            return None;
        }
    };

    debug!(host, port, "Port open, waiting for banner.");
    let banner = grab_banner(stream).await;
    Some(PortHit { port, banner })
}

/// Reads whatever the service sends first, within a short window.
async fn grab_banner(mut stream: TcpStream) -> Option<String> {
    let mut buffer = [0u8; BANNER_MAX_BYTES];
    match timeout(BANNER_TIMEOUT, stream.read(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => sanitize_banner(&buffer[..n]),
        _ => None,
    }
}

/// Reduces raw banner bytes to one clean, printable line.
fn sanitize_banner(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())?
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    if line.is_empty() { None } else { Some(line) }
}

/// Renders the open-port list into a banner fragment, one entry per port.
pub fn format_hits(hits: &[PortHit]) -> String {
    hits.iter()
        .map(|h| match &h.banner {
            Some(banner) => format!("{}/tcp {}", h.port, banner),
            None => format!("{}/tcp open", h.port),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
