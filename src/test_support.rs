use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::audit_log::{AuditLog, AuditPage, EventQuery};
use crate::error::ExportError;
use crate::models::AuditEvent;

pub fn named_event(name: &str) -> AuditEvent {
    AuditEvent {
        event_time: Some(Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap()),
        event_name: Some(name.to_string()),
        username: None,
        cloud_trail_event: None,
    }
}

pub fn identity_event(name: &str, username: &str, arn: &str, issuer: Option<&str>) -> AuditEvent {
    let mut identity = serde_json::json!({ "type": "IAMUser", "arn": arn });
    if let Some(issuer) = issuer {
        identity["type"] = "AssumedRole".into();
        identity["sessionContext"] = serde_json::json!({
            "sessionIssuer": { "type": "Role", "userName": issuer }
        });
    }

    AuditEvent {
        username: Some(username.to_string()),
        cloud_trail_event: Some(serde_json::json!({ "userIdentity": identity }).to_string()),
        ..named_event(name)
    }
}

/// Serves a fixed sequence of pages, chaining them with `token-<n>` continuation tokens.
/// Queries for any day return the same pages.
#[derive(Default)]
pub struct FakeAuditLog {
    pages: Vec<Vec<AuditEvent>>,
    fail_on_page: Option<usize>,
    calls: Mutex<Vec<(EventQuery, Option<String>)>>,
}

impl FakeAuditLog {
    pub fn with_pages(pages: Vec<Vec<AuditEvent>>) -> Self {
        Self { pages, ..Default::default() }
    }

    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn requested_tokens(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|(_, token)| token.clone()).collect()
    }

    pub fn queries(&self) -> Vec<EventQuery> {
        self.calls.lock().unwrap().iter().map(|(query, _)| query.clone()).collect()
    }
}

#[async_trait]
impl AuditLog for FakeAuditLog {
    async fn lookup_page(&self, query: &EventQuery, next_token: Option<String>) -> Result<AuditPage, ExportError> {
        self.calls.lock().unwrap().push((query.clone(), next_token.clone()));

        let index = match next_token.as_deref() {
            None => 0,
            Some(token) => token
                .strip_prefix("token-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| ExportError::audit_log(format!("unknown token {}", token)))?,
        };

        if self.fail_on_page == Some(index) {
            return Err(ExportError::audit_log("service unavailable"));
        }

        let events = self.pages.get(index).cloned().unwrap_or_default();
        let next_token = (index + 1 < self.pages.len()).then(|| format!("token-{}", index + 1));

        Ok(AuditPage { events, next_token })
    }
}

#[derive(Default)]
pub struct FakeReportStore {
    existing: Vec<String>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    uploads: Mutex<Vec<String>>,
    fail_listing: bool,
    fail_uploads: bool,
}

impl FakeReportStore {
    pub fn with_keys<K: ToString>(keys: &[K]) -> Self {
        Self {
            existing: keys.iter().map(ToString::to_string).collect(),
            ..Default::default()
        }
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// Keys in upload order.
    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl crate::storage::ReportStore for FakeReportStore {
    async fn list_keys(&self) -> Result<Vec<String>, ExportError> {
        if self.fail_listing {
            return Err(ExportError::storage("access denied"));
        }
        let mut keys = self.existing.clone();
        keys.extend(self.uploaded_keys());
        Ok(keys)
    }

    async fn put_report(&self, key: &str, body: Vec<u8>) -> Result<(), ExportError> {
        if self.fail_uploads {
            return Err(ExportError::storage("slow down"));
        }
        self.uploads.lock().unwrap().push(key.to_string());
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }
}
