// src/core/store.rs

use crate::core::error::{Error, Result};
use crate::core::models::{DomainFinding, DomainListResponse, DomainRecord, DomainRow, ListQuery};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// The shared inventory of discovered domains.
///
/// Records live in insertion order, which is also the only listing order the
/// query surface honors. The natural key for upsert and delete is
/// `(org_id, domain)`; the numeric row id exists for the wire contract only.
pub struct DomainStore {
    inner: RwLock<StoreInner>,
}

struct StoreInner {
    records: Vec<DomainRecord>,
    next_id: u64,
}

impl DomainStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Merges one scan finding into the inventory.
    ///
    /// A new domain gets a fresh row; an existing one is updated in place.
    /// Non-empty incoming fields overwrite, empty ones never clobber already
    /// resolved data. Banner fragments accumulate, because different scanners
    /// contribute different pieces (fingerprint, port banners) for the same
    /// domain. Returns the row id.
    pub async fn upsert(&self, org_id: u64, finding: DomainFinding) -> u64 {
        let mut inner = self.inner.write().await;

        if let Some(record) = inner
            .records
            .iter_mut()
            .find(|r| r.org_id == org_id && r.domain == finding.domain)
        {
            if let Some(ip) = finding.ip.filter(|v| !v.is_empty()) {
                record.ip = ip;
            }
            if let Some(title) = finding.title.filter(|v| !v.is_empty()) {
                record.title = title;
            }
            if let Some(banner) = finding.banner.filter(|v| !v.is_empty()) {
                if record.banner.is_empty() {
                    record.banner = banner;
                } else if !record.banner.contains(&banner) {
                    record.banner = format!("{}; {}", record.banner, banner);
                }
            }
            debug!(domain = %record.domain, org_id, "Domain record updated.");
            return record.id;
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let record = DomainRecord {
            id,
            domain: finding.domain,
            ip: finding.ip.unwrap_or_default(),
            title: finding.title.unwrap_or_default(),
            banner: finding.banner.unwrap_or_default(),
            org_id,
            created_at: Utc::now(),
        };
        info!(domain = %record.domain, org_id, id, "Domain record created.");
        inner.records.push(record);
        id
    }

    /// Runs one paginated listing query.
    ///
    /// Filters are applied before pagination; the returned window holds
    /// exactly `min(length, max(0, records_filtered - offset))` rows in
    /// insertion order. An offset past the end yields an empty window with
    /// the correct totals, not an error.
    pub async fn list(&self, query: &ListQuery) -> DomainListResponse {
        let inner = self.inner.read().await;

        // The unfiltered total stays scoped to the organization when one is
        // selected, so page math and the inventory size line up for a tenant.
        let records_total = inner
            .records
            .iter()
            .filter(|r| query.org_id.is_none_or(|org| r.org_id == org))
            .count();

        let matched: Vec<&DomainRecord> =
            inner.records.iter().filter(|r| query.matches(r)).collect();
        let records_filtered = matched.len();

        let data: Vec<DomainRow> = matched
            .into_iter()
            .skip(query.offset)
            .take(query.length)
            .enumerate()
            .map(|(i, r)| DomainRow {
                id: r.id,
                index: query.offset + i + 1,
                domain: r.domain.clone(),
                ip: r.ip.clone(),
                title: r.title.clone(),
                banner: r.banner.clone(),
            })
            .collect();

        debug!(
            rows = data.len(),
            records_filtered, records_total, "Domain list query served."
        );
        DomainListResponse {
            data,
            records_filtered,
            records_total,
        }
    }

    /// Deletes one domain by its natural key. Irreversible; a second delete
    /// of the same key reports the absence instead of crashing.
    pub async fn delete(&self, org_id: u64, domain: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let position = inner
            .records
            .iter()
            .position(|r| r.org_id == org_id && r.domain == domain)
            .ok_or_else(|| Error::not_found(format!("domain {domain}")))?;

        inner.records.remove(position);
        info!(domain, org_id, "Domain record deleted.");
        Ok(())
    }

    /// Deletes the record behind a wire row id, returning the natural key it
    /// carried. The id is globally unique and names exactly one tenant's
    /// record, so the delete can never cross organizations.
    pub async fn delete_row(&self, id: u64) -> Result<(u64, String)> {
        let mut inner = self.inner.write().await;
        let position = inner
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::not_found(format!("record {id}")))?;

        let record = inner.records.remove(position);
        info!(domain = %record.domain, org_id = record.org_id, id, "Domain record deleted.");
        Ok((record.org_id, record.domain))
    }
}

impl Default for DomainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(domain: &str, ip: &str, title: &str, banner: &str) -> DomainFinding {
        DomainFinding {
            domain: domain.to_string(),
            ip: Some(ip.to_string()).filter(|v| !v.is_empty()),
            title: Some(title.to_string()).filter(|v| !v.is_empty()),
            banner: Some(banner.to_string()).filter(|v| !v.is_empty()),
        }
    }

    async fn seeded_store() -> DomainStore {
        let store = DomainStore::new();
        store
            .upsert(1, finding("www.example.com", "10.0.0.1", "Example", "nginx/1.18.0"))
            .await;
        store
            .upsert(1, finding("mail.example.com", "10.0.0.2", "", "Postfix"))
            .await;
        store
            .upsert(1, finding("dev.example.com", "192.168.1.9", "Dev portal", ""))
            .await;
        store
            .upsert(2, finding("intranet.other.org", "172.16.0.4", "Intranet", "Apache"))
            .await;
        store
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_by_natural_key() {
        let store = DomainStore::new();
        let first = store.upsert(1, finding("www.example.com", "", "", "")).await;
        let second = store
            .upsert(1, finding("www.example.com", "10.0.0.1", "Example", ""))
            .await;
        assert_eq!(first, second);

        let listed = store.list(&ListQuery::new(0, 20)).await;
        assert_eq!(listed.records_filtered, 1);
        assert_eq!(listed.data[0].ip, "10.0.0.1");
        assert_eq!(listed.data[0].title, "Example");
    }

    #[tokio::test]
    async fn same_domain_in_two_organizations_stays_two_records() {
        let store = DomainStore::new();
        let a = store.upsert(1, finding("www.example.com", "", "", "")).await;
        let b = store.upsert(2, finding("www.example.com", "", "", "")).await;
        assert_ne!(a, b);
        assert_eq!(store.list(&ListQuery::new(0, 20)).await.records_filtered, 2);
    }

    #[tokio::test]
    async fn empty_fields_never_clobber_resolved_data() {
        let store = DomainStore::new();
        store
            .upsert(1, finding("www.example.com", "10.0.0.1", "Example", "nginx"))
            .await;
        store.upsert(1, finding("www.example.com", "", "", "")).await;

        let listed = store.list(&ListQuery::new(0, 20)).await;
        assert_eq!(listed.data[0].ip, "10.0.0.1");
        assert_eq!(listed.data[0].title, "Example");
        assert_eq!(listed.data[0].banner, "nginx");
    }

    #[tokio::test]
    async fn banner_fragments_accumulate_without_duplicates() {
        let store = DomainStore::new();
        store
            .upsert(1, finding("www.example.com", "", "", "nginx/1.18.0 (Web Server)"))
            .await;
        store
            .upsert(1, finding("www.example.com", "", "", "22/tcp SSH-2.0-OpenSSH_8.2"))
            .await;
        store
            .upsert(1, finding("www.example.com", "", "", "nginx/1.18.0 (Web Server)"))
            .await;

        let listed = store.list(&ListQuery::new(0, 20)).await;
        assert_eq!(
            listed.data[0].banner,
            "nginx/1.18.0 (Web Server); 22/tcp SSH-2.0-OpenSSH_8.2"
        );
    }

    #[tokio::test]
    async fn pagination_window_respects_offset_and_length() {
        let store = seeded_store().await;

        let mut query = ListQuery::new(0, 2);
        query.org_id = Some(1);
        let page = store.list(&query).await;
        assert_eq!(page.records_filtered, 3);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].domain, "www.example.com");
        assert_eq!(page.data[0].index, 1);

        query.offset = 2;
        let page = store.list(&query).await;
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].domain, "dev.example.com");
        assert_eq!(page.data[0].index, 3);
    }

    #[tokio::test]
    async fn offset_past_the_end_yields_empty_rows_with_correct_totals() {
        let store = seeded_store().await;
        let mut query = ListQuery::new(1000, 20);
        query.org_id = Some(1);

        let page = store.list(&query).await;
        assert!(page.data.is_empty());
        assert_eq!(page.records_filtered, 3);
    }

    #[tokio::test]
    async fn removing_a_filter_never_decreases_the_match_count() {
        let store = seeded_store().await;

        let mut narrow = ListQuery::new(0, 20);
        narrow.org_id = Some(1);
        narrow.ip = Some("10.0.0".to_string());
        let narrow_count = store.list(&narrow).await.records_filtered;

        let mut wide = narrow.clone();
        wide.ip = None;
        let wide_count = store.list(&wide).await.records_filtered;

        assert_eq!(narrow_count, 2);
        assert!(wide_count >= narrow_count);
    }

    #[tokio::test]
    async fn unknown_org_yields_zero_matches_not_an_error() {
        let store = seeded_store().await;
        let mut query = ListQuery::new(0, 20);
        query.org_id = Some(999);

        let page = store.list(&query).await;
        assert!(page.data.is_empty());
        assert_eq!(page.records_filtered, 0);
        assert_eq!(page.records_total, 0);
    }

    #[tokio::test]
    async fn unfiltered_total_is_scoped_to_the_selected_org() {
        let store = seeded_store().await;

        let mut query = ListQuery::new(0, 20);
        query.org_id = Some(1);
        query.domain = Some("mail".to_string());
        let page = store.list(&query).await;
        assert_eq!(page.records_filtered, 1);
        assert_eq!(page.records_total, 3);

        let page = store.list(&ListQuery::new(0, 20)).await;
        assert_eq!(page.records_total, 4);
    }

    #[tokio::test]
    async fn delete_is_irreversible_and_reported_once() {
        let store = seeded_store().await;
        store.delete(1, "www.example.com").await.unwrap();

        let page = store.list(&ListQuery::new(0, 20)).await;
        assert!(page.data.iter().all(|r| r.domain != "www.example.com"));
        assert_eq!(page.records_filtered, 3);

        let err = store.delete(1, "www.example.com").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        // A failed delete alters nothing.
        assert_eq!(store.list(&ListQuery::new(0, 20)).await.records_filtered, 3);
    }

    #[tokio::test]
    async fn delete_by_row_id_resolves_the_natural_key() {
        let store = seeded_store().await;
        let page = store.list(&ListQuery::new(0, 20)).await;
        let row = &page.data[0];

        let (org_id, domain) = store.delete_row(row.id).await.unwrap();
        assert_eq!(org_id, 1);
        assert_eq!(domain, row.domain);

        let err = store.delete_row(row.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
