use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use models::{premium::Upserted, Entry, PremiumDuration};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::auth::SharedSecret;
use crate::errors::ServiceError;
use crate::metrics;
use crate::premium::store::RegistryStore;

/// Parameters of an add/renew request, as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct AddPremium {
    pub email: Option<String>,
    pub kind: Option<String>,
    pub duration: Option<String>,
}

/// Entries still active at `retrieved_at`.
#[derive(Debug, Clone)]
pub struct Listing {
    pub retrieved_at: DateTime<Utc>,
    pub entries: Vec<Entry>,
}

/// Parameters an add request must carry, in the order they are reported.
pub const ADD_PARAMETERS: &[&str] = &["addemail", "day", "type", "key"];

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Timestamps are persisted with microsecond precision.
fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Expiry-lifecycle operations over the persisted registry.
///
/// Every call re-reads the document from the store, applies its change and
/// writes the result back. One mutex serialises those cycles within the
/// process; separate processes sharing a file are still last-writer-wins.
pub struct RegistryService {
    store: Arc<dyn RegistryStore>,
    secret: SharedSecret,
    cycle: Mutex<()>,
}

impl RegistryService {
    pub fn new(store: Arc<dyn RegistryStore>, secret: SharedSecret) -> Self {
        Self { store, secret, cycle: Mutex::new(()) }
    }

    fn authorize(&self, key: Option<&str>) -> Result<(), ServiceError> {
        if self.secret.verify(key) {
            Ok(())
        } else {
            metrics::AUTH_FAILURES_TOTAL.inc();
            warn!("rejected request with invalid api key");
            Err(ServiceError::Unauthorized)
        }
    }

    /// Create or renew the entry for `input.email`.
    pub async fn add(&self, key: Option<&str>, input: AddPremium) -> Result<Entry, ServiceError> {
        self.add_at(key, input, now_utc()).await
    }

    pub async fn add_at(
        &self,
        key: Option<&str>,
        input: AddPremium,
        now: DateTime<Utc>,
    ) -> Result<Entry, ServiceError> {
        self.authorize(key)?;

        let (email, duration_raw, kind) = match (
            present(input.email.as_deref()),
            present(input.duration.as_deref()),
            present(input.kind.as_deref()),
        ) {
            (Some(e), Some(d), Some(k)) => (e, d, k),
            _ => return Err(ServiceError::MissingParameters(ADD_PARAMETERS)),
        };

        let duration = PremiumDuration::parse(duration_raw)?;
        let expires_at = duration.expiry_from(now)?;

        let _cycle = self.cycle.lock().await;
        let mut doc = self.store.load().await;
        let (outcome, entry) = doc.upsert(email, kind, duration_raw, expires_at, now);
        let entry = entry.clone();
        self.store.save(&doc).await?;

        match outcome {
            Upserted::Created => {
                metrics::ENTRIES_CREATED_TOTAL.inc();
                info!(email, kind, duration = duration_raw, %expires_at, "premium entry created");
            }
            Upserted::Renewed => {
                metrics::ENTRIES_RENEWED_TOTAL.inc();
                info!(email, kind, duration = duration_raw, %expires_at, "premium entry renewed");
            }
        }
        Ok(entry)
    }

    /// Remove the entry whose email matches exactly.
    pub async fn delete(&self, key: Option<&str>, email: Option<&str>) -> Result<(), ServiceError> {
        self.authorize(key)?;
        let email = present(email).ok_or(ServiceError::MissingParameter("delemail"))?;

        let _cycle = self.cycle.lock().await;
        let mut doc = self.store.load().await;
        if !doc.remove(email) {
            return Err(ServiceError::not_found(email));
        }
        self.store.save(&doc).await?;

        metrics::ENTRIES_DELETED_TOTAL.inc();
        info!(email, remaining = doc.len(), "premium entry deleted");
        Ok(())
    }

    /// Purge expired entries from storage and return the survivors.
    pub async fn list(&self) -> Result<Listing, ServiceError> {
        self.list_at(now_utc()).await
    }

    pub async fn list_at(&self, now: DateTime<Utc>) -> Result<Listing, ServiceError> {
        let _cycle = self.cycle.lock().await;
        let mut doc = self.store.load().await;
        let removed = doc.purge_expired(now);
        if removed > 0 {
            self.store.save(&doc).await?;
            metrics::ENTRIES_PURGED_TOTAL.inc_by(removed as u64);
            info!(removed, remaining = doc.len(), "expired premium entries purged");
        }
        Ok(Listing { retrieved_at: now, entries: doc.premium_users })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::premium::store::FileRegistryStore;
    use chrono::TimeDelta;
    use std::path::PathBuf;
    use uuid::Uuid;

    const KEY: &str = "test-key";

    fn setup() -> (RegistryService, PathBuf) {
        let path = std::env::temp_dir().join(format!("svc_registry_{}.json", Uuid::new_v4()));
        let store = FileRegistryStore::new(&path);
        (RegistryService::new(store, SharedSecret::new(KEY)), path)
    }

    fn add_input(email: &str, kind: &str, duration: &str) -> AddPremium {
        AddPremium {
            email: Some(email.into()),
            kind: Some(kind.into()),
            duration: Some(duration.into()),
        }
    }

    async fn stored(path: &PathBuf) -> models::RegistryDocument {
        FileRegistryStore::new(path).load().await
    }

    #[tokio::test]
    async fn add_twice_keeps_one_entry_and_original_added_at() -> Result<(), anyhow::Error> {
        let (svc, path) = setup();
        let t0 = now_utc();
        let t1 = t0 + TimeDelta::hours(3);

        let first = svc.add_at(Some(KEY), add_input("a@x.io", "gold", "7day"), t0).await?;
        assert_eq!(first.expires_at, Some(t0 + TimeDelta::days(7)));

        let second = svc.add_at(Some(KEY), add_input("a@x.io", "silver", "2mon"), t1).await?;
        assert_eq!(second.added_at, Some(t0));
        assert_eq!(second.expires_at, Some(t1 + TimeDelta::days(60)));

        let doc = stored(&path).await;
        assert_eq!(doc.len(), 1);
        let entry = &doc.premium_users[0];
        assert_eq!(entry.added_at, Some(t0));
        assert_eq!(entry.expires_at, Some(t1 + TimeDelta::days(60)));
        assert_eq!(entry.kind, "silver");
        assert_eq!(entry.duration, "2mon");

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn add_validates_before_touching_storage() -> Result<(), anyhow::Error> {
        let (svc, path) = setup();

        let err = svc.add(Some("wrong"), add_input("a@x.io", "gold", "7day")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
        let err = svc.add(None, add_input("a@x.io", "gold", "7day")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));

        let missing = AddPremium { email: Some("a@x.io".into()), kind: Some("  ".into()), duration: Some("7day".into()) };
        let err = svc.add(Some(KEY), missing).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameters(names) if names == ADD_PARAMETERS));

        let err = svc.add(Some(KEY), add_input("a@x.io", "gold", "10week")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDuration(ref raw) if raw == "10week"));

        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn wrong_key_leaves_file_bytes_unchanged() -> Result<(), anyhow::Error> {
        let (svc, path) = setup();
        svc.add(Some(KEY), add_input("a@x.io", "gold", "7day")).await?;
        let before = tokio::fs::read(&path).await?;

        assert!(svc.add(Some("nope"), add_input("b@x.io", "gold", "7day")).await.is_err());
        assert!(svc.delete(Some("nope"), Some("a@x.io")).await.is_err());

        assert_eq!(tokio::fs::read(&path).await?, before);
        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_missing_email_is_not_found() -> Result<(), anyhow::Error> {
        let (svc, path) = setup();
        svc.add(Some(KEY), add_input("a@x.io", "gold", "7day")).await?;

        let err = svc.delete(Some(KEY), Some("ghost@x.io")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(stored(&path).await.len(), 1);

        let err = svc.delete(Some(KEY), Some("")).await.unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter("delemail")));

        svc.delete(Some(KEY), Some("a@x.io")).await?;
        assert!(stored(&path).await.is_empty());

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn list_purges_expired_and_persists() -> Result<(), anyhow::Error> {
        let (svc, path) = setup();
        let past = now_utc() - TimeDelta::days(30);
        // expires a day after `past`, long gone by now
        svc.add_at(Some(KEY), add_input("old@x.io", "gold", "1day"), past).await?;
        svc.add(Some(KEY), add_input("new@x.io", "gold", "1day")).await?;
        assert_eq!(stored(&path).await.len(), 2);

        let listing = svc.list().await?;
        let emails: Vec<_> = listing.entries.iter().map(|e| e.email.as_str()).collect();
        assert_eq!(emails, vec!["new@x.io"]);

        let doc = stored(&path).await;
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.premium_users[0].email, "new@x.io");

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn list_without_expired_entries_does_not_rewrite() -> Result<(), anyhow::Error> {
        let (svc, path) = setup();
        let listing = svc.list().await?;
        assert!(listing.entries.is_empty());
        // nothing purged, so nothing written
        assert!(!path.exists());
        Ok(())
    }

    #[tokio::test]
    async fn list_drops_entries_without_expiry() -> Result<(), anyhow::Error> {
        let (svc, path) = setup();
        tokio::fs::write(
            &path,
            br#"{"premium_users":[{"email":"legacy@x.io","type":"gold","duration":"7day"}]}"#,
        )
        .await?;

        assert!(svc.list().await?.entries.is_empty());
        assert!(stored(&path).await.is_empty());

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_are_not_lost() -> Result<(), anyhow::Error> {
        let (svc, path) = setup();
        let svc = Arc::new(svc);
        let mut handles = Vec::new();
        for i in 0..16 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.add(Some(KEY), add_input(&format!("u{i}@x.io"), "gold", "7day")).await
            }));
        }
        for h in handles {
            h.await??;
        }
        assert_eq!(stored(&path).await.len(), 16);

        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }
}
