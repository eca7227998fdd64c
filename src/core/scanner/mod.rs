// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module and hosts
// the per-target fan-out that runs every scanner a task enables.
pub mod fofa_scanner;
pub mod port_scanner;
pub mod subdomain_scanner;
pub mod title_scanner;
pub mod whatweb_scanner;

use crate::config::FofaCredentials;
use crate::core::models::{DomainFinding, ScanOptions};
use std::net::IpAddr;
use tracing::{debug, info, warn};

/// Everything one target contributed to a scan: the findings to merge into
/// the inventory and the errors met along the way. Individual scanner
/// failures degrade the report, they never abort the task.
#[derive(Debug, Default)]
pub struct TargetReport {
    pub findings: Vec<DomainFinding>,
    pub errors: Vec<String>,
}

impl TargetReport {
    /// How many findings actually carry resolved data. A bare record created
    /// only because the target was named does not count.
    pub fn resolved_findings(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.ip.is_some() || f.title.is_some() || f.banner.is_some())
            .count()
    }
}

/// Runs every enabled scanner against one target concurrently and merges the
/// partial results into a single report.
///
/// An address target skips the domain-only scanners (subdomain enumeration,
/// FOFA search). The FOFA search is also skipped, silently, when no
/// credentials are configured.
pub async fn scan_target(
    target: &str,
    options: &ScanOptions,
    fofa: Option<&FofaCredentials>,
) -> TargetReport {
    info!(target, "Starting target scan.");
    let is_address = target.parse::<IpAddr>().is_ok();

    let (resolved, subdomains, title, technologies, ports) = tokio::join!(
        async {
            if is_address {
                Ok(Some(vec![target.to_string()]))
            } else {
                subdomain_scanner::resolve_ips(target).await
            }
        },
        async {
            if options.subdomain && !is_address {
                Some(subdomain_scanner::enumerate(target).await)
            } else {
                None
            }
        },
        async {
            if options.webtitle {
                Some(title_scanner::fetch_title(target).await)
            } else {
                None
            }
        },
        async {
            if options.whatweb {
                Some(whatweb_scanner::fingerprint(target).await)
            } else {
                None
            }
        },
        async {
            if options.portscan {
                Some(port_scanner::scan_host(target).await)
            } else {
                None
            }
        },
    );

    let mut report = TargetReport::default();
    let mut base = DomainFinding::new(target);
    let mut banner_parts: Vec<String> = Vec::new();
    let mut resolved_ips: Vec<String> = Vec::new();

    match resolved {
        Ok(Some(ips)) => {
            resolved_ips = ips;
            base.ip = Some(resolved_ips.join(","));
        }
        Ok(None) => debug!(target, "Target resolved to no address."),
        Err(e) => report.errors.push(e),
    }

    if let Some(result) = title {
        match result {
            Ok(Some(found)) => base.title = Some(found),
            Ok(None) => debug!(target, "No page title found."),
            Err(e) => report.errors.push(e),
        }
    }

    if let Some(result) = technologies {
        match result {
            Ok(techs) if !techs.is_empty() => {
                banner_parts.push(whatweb_scanner::format_technologies(&techs));
            }
            Ok(_) => debug!(target, "No technology fingerprint matched."),
            Err(e) => report.errors.push(e),
        }
    }

    if let Some(result) = ports {
        match result {
            Ok(hits) if !hits.is_empty() => {
                banner_parts.push(port_scanner::format_hits(&hits));
            }
            Ok(_) => debug!(target, "No open port found."),
            Err(e) => report.errors.push(e),
        }
    }

    // The network scan widens the port scan to every address the target
    // resolved to, skipping the hostname pass already done above.
    if options.networkscan {
        for ip in &resolved_ips {
            if ip == target {
                continue;
            }
            match port_scanner::scan_host(ip).await {
                Ok(hits) if !hits.is_empty() => {
                    banner_parts.push(format!("{}: {}", ip, port_scanner::format_hits(&hits)));
                }
                Ok(_) => debug!(ip = %ip, "No open port found on resolved address."),
                Err(e) => report.errors.push(e),
            }
        }
    }

    if !banner_parts.is_empty() {
        base.banner = Some(banner_parts.join("; "));
    }
    report.findings.push(base);

    if let Some(result) = subdomains {
        match result {
            Ok(found) => report.findings.extend(found),
            Err(e) => report.errors.push(e),
        }
    }

    if options.fofasearch && !is_address {
        match fofa {
            Some(credentials) => match fofa_scanner::search(credentials, target).await {
                Ok(found) => report.findings.extend(found),
                Err(e) => report.errors.push(e),
            },
            None => debug!(target, "FOFA search enabled but no credentials configured, skipping."),
        }
    }

    if !report.errors.is_empty() {
        warn!(
            target,
            errors = report.errors.len(),
            "Target scan finished with errors."
        );
    }
    info!(
        target,
        findings = report.findings.len(),
        "Target scan finished."
    );
    report
}
