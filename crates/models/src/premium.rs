use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One premium subscription, keyed by `email`.
///
/// Timestamps are written as RFC 3339 with an explicit `+00:00` offset.
/// Stored timestamps without an offset are read back as UTC. Stored values
/// that don't decode (a broken timestamp, a non-string field) and unknown
/// per-entry keys are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "StoredEntry", into = "StoredEntry")]
pub struct Entry {
    pub email: String,
    pub kind: String,
    pub added_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub duration: String,
    pub extra: Map<String, Value>,
}

/// On-disk shape of an [`Entry`]: every known field as a raw JSON value.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    added_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn decode_string(extra: &mut Map<String, Value>, key: &str, raw: Option<Value>) -> String {
    match raw {
        Some(Value::String(s)) => s,
        Some(other) => {
            extra.insert(key.to_string(), other);
            String::new()
        }
        None => String::new(),
    }
}

fn decode_timestamp(extra: &mut Map<String, Value>, key: &str, raw: Option<Value>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    let parsed = raw.as_str().and_then(parse_timestamp);
    if parsed.is_none() {
        extra.insert(key.to_string(), raw);
    }
    parsed
}

// A decoded value wins over the kept raw one; the raw one is only written
// back while the field still holds nothing.
fn encode_string(extra: &mut Map<String, Value>, key: &str, value: String) -> Option<Value> {
    let raw = extra.remove(key);
    match raw {
        Some(raw) if value.is_empty() => Some(raw),
        _ => Some(Value::String(value)),
    }
}

fn encode_timestamp(extra: &mut Map<String, Value>, key: &str, ts: Option<DateTime<Utc>>) -> Option<Value> {
    let raw = extra.remove(key);
    ts.map(|ts| Value::String(format_timestamp(&ts))).or(raw)
}

impl From<StoredEntry> for Entry {
    fn from(stored: StoredEntry) -> Self {
        let mut extra = stored.extra;
        Entry {
            email: decode_string(&mut extra, "email", stored.email),
            kind: decode_string(&mut extra, "type", stored.kind),
            added_at: decode_timestamp(&mut extra, "added_at", stored.added_at),
            expires_at: decode_timestamp(&mut extra, "expires_at", stored.expires_at),
            duration: decode_string(&mut extra, "duration", stored.duration),
            extra,
        }
    }
}

impl From<Entry> for StoredEntry {
    fn from(entry: Entry) -> Self {
        let mut extra = entry.extra;
        StoredEntry {
            email: encode_string(&mut extra, "email", entry.email),
            kind: encode_string(&mut extra, "type", entry.kind),
            added_at: encode_timestamp(&mut extra, "added_at", entry.added_at),
            expires_at: encode_timestamp(&mut extra, "expires_at", entry.expires_at),
            duration: encode_string(&mut extra, "duration", entry.duration),
            extra,
        }
    }
}

impl Entry {
    /// Active means `expires_at` is present and strictly after `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires > now)
    }
}

/// Whole persisted registry: `{"premium_users": [...]}`.
///
/// Unknown top-level keys survive a load/save cycle untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub premium_users: Vec<Entry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of [`RegistryDocument::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Renewed,
}

impl RegistryDocument {
    pub fn len(&self) -> usize {
        self.premium_users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.premium_users.is_empty()
    }

    /// Renew the entry for `email` in place, or append a new one.
    ///
    /// Renewal overwrites `type`, `expires_at` and `duration`; `added_at`
    /// keeps its original value. New entries get `added_at = now`.
    pub fn upsert(
        &mut self,
        email: &str,
        kind: &str,
        duration: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> (Upserted, &Entry) {
        if let Some(idx) = self.premium_users.iter().position(|e| e.email == email) {
            let entry = &mut self.premium_users[idx];
            entry.kind = kind.to_string();
            entry.expires_at = Some(expires_at);
            entry.duration = duration.to_string();
            return (Upserted::Renewed, &self.premium_users[idx]);
        }

        self.premium_users.push(Entry {
            email: email.to_string(),
            kind: kind.to_string(),
            added_at: Some(now),
            expires_at: Some(expires_at),
            duration: duration.to_string(),
            extra: Map::new(),
        });
        let last = self.premium_users.len() - 1;
        (Upserted::Created, &self.premium_users[last])
    }

    /// Drop every entry whose email equals `email` exactly; returns whether any matched.
    pub fn remove(&mut self, email: &str) -> bool {
        let before = self.premium_users.len();
        self.premium_users.retain(|e| e.email != email);
        self.premium_users.len() < before
    }

    /// Drop entries that are not active at `now`, including those without
    /// an expiry. Returns the number removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.premium_users.len();
        self.premium_users.retain(|e| e.is_active_at(now));
        before - self.premium_users.len()
    }
}

/// Parse a stored timestamp: RFC 3339, or a naive ISO-8601 date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}
