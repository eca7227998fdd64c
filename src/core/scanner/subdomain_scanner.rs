// src/core/scanner/subdomain_scanner.rs

use tracing::{debug, info, warn};

use crate::core::models::{DomainFinding, ScanResult};
use futures::future::join_all;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};

/// NXDOMAIN and empty answers are everyday outcomes during reconnaissance,
/// not failures worth surfacing.
fn is_no_records(error: &ResolveError) -> bool {
    matches!(error.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

/// Common subdomain labels probed when no wordlist is supplied by the
/// operator. Ordered roughly by how often they exist in the wild.
const COMMON_SUBDOMAIN_LABELS: &[&str] = &[
    "www", "mail", "webmail", "smtp", "mx", "ns1", "ns2", "ftp", "api", "admin", "portal", "vpn",
    "dev", "test", "staging", "blog", "shop", "cdn", "static", "git", "wiki", "docs", "db",
    "remote", "owa", "autodiscover", "m", "app",
];

/// Resolves the A/AAAA records of one host name.
///
/// `Ok(None)` means the name exists but carries no address (or does not
/// exist), which is a normal outcome during reconnaissance; `Err` is a
/// resolver-level failure worth reporting.
pub async fn resolve_ips(target: &str) -> ScanResult<Vec<String>> {
    debug!(target, "Resolving target addresses.");
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    match resolver.lookup_ip(target).await {
        Ok(lookup) => {
            let ips: Vec<String> = lookup.iter().map(|ip| ip.to_string()).collect();
            if ips.is_empty() {
                debug!(target, "Name resolved to no address.");
                Ok(None)
            } else {
                debug!(target, count = ips.len(), "Target resolved.");
                Ok(Some(ips))
            }
        }
        Err(e) => {
            if is_no_records(&e) {
                debug!(target, "No records found.");
                Ok(None)
            } else {
                warn!(target, error = %e, "Address lookup failed.");
                Err(format!("DNS Error: {}", e))
            }
        }
    }
}

/// Enumerates subdomains of the target by probing a built-in label list.
///
/// Every label is looked up concurrently; each one that resolves becomes a
/// finding carrying its addresses. Labels that do not exist are skipped
/// silently, which is the overwhelmingly common case.
pub async fn enumerate(target: &str) -> Result<Vec<DomainFinding>, String> {
    // Probe the root domain, not a www-prefixed one.
    let root_target = target.strip_prefix("www.").unwrap_or(target);
    info!(target = %root_target, "Starting subdomain enumeration.");

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    let lookups = COMMON_SUBDOMAIN_LABELS.iter().map(|label| {
        let candidate = format!("{label}.{root_target}");
        let resolver = resolver.clone();
        async move {
            match resolver.lookup_ip(&candidate).await {
                Ok(lookup) => {
                    let ips: Vec<String> = lookup.iter().map(|ip| ip.to_string()).collect();
                    if ips.is_empty() {
                        None
                    } else {
                        debug!(subdomain = %candidate, count = ips.len(), "Subdomain resolved.");
                        let mut finding = DomainFinding::new(&candidate);
                        finding.ip = Some(ips.join(","));
                        Some(finding)
                    }
                }
                Err(e) => {
                    if !is_no_records(&e) {
                        warn!(subdomain = %candidate, error = %e, "Subdomain lookup failed.");
                    }
                    None
                }
            }
        }
    });

    let findings: Vec<DomainFinding> = join_all(lookups).await.into_iter().flatten().collect();
    info!(
        target = %root_target,
        found = findings.len(),
        "Subdomain enumeration finished."
    );
    Ok(findings)
}
