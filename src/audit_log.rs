use async_trait::async_trait;
use aws_sdk_cloudtrail as cloudtrail;
use chrono::{DateTime, Days, NaiveDate, Utc};
use cloudtrail::primitives::DateTime as SdkDateTime;
use cloudtrail::types::{LookupAttribute, LookupAttributeKey};
use futures_util::stream::{self, Stream, TryStreamExt};

use crate::error::ExportError;
use crate::models::AuditEvent;

/// Filter for one day of events from a single service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub event_source: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventQuery {
    /// Covers `[date 00:00 UTC, date + 1 day 00:00 UTC)`.
    pub fn for_day(event_source: &str, date: NaiveDate) -> Self {
        let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let end = date
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(chrono::NaiveTime::MIN).and_utc())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            event_source: event_source.to_string(),
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditPage {
    pub events: Vec<AuditEvent>,
    pub next_token: Option<String>,
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn lookup_page(
        &self,
        query: &EventQuery,
        next_token: Option<String>,
    ) -> Result<AuditPage, ExportError>;
}

enum Cursor {
    First,
    Next(String),
    Done,
}

/// All events matching `query`, fetched page by page as the stream is polled.
///
/// A page is only requested once the previous one has been consumed, and the
/// stream ends when a response carries no continuation token.
pub fn events<'a, L>(
    log: &'a L,
    query: &'a EventQuery,
) -> impl Stream<Item = Result<AuditEvent, ExportError>> + Send + 'a
where
    L: AuditLog + ?Sized,
{
    stream::try_unfold(Cursor::First, move |cursor| next_page(log, query, cursor))
        .map_ok(|events| stream::iter(events.into_iter().map(Ok::<_, ExportError>)))
        .try_flatten()
}

async fn next_page<L>(
    log: &L,
    query: &EventQuery,
    cursor: Cursor,
) -> Result<Option<(Vec<AuditEvent>, Cursor)>, ExportError>
where
    L: AuditLog + ?Sized,
{
    let token = match cursor {
        Cursor::Done => return Ok(None),
        Cursor::First => None,
        Cursor::Next(token) => Some(token),
    };

    let page = log.lookup_page(query, token).await?;
    tracing::debug!(
        "Fetched {} events from {} starting {}",
        page.events.len(),
        query.event_source,
        query.start
    );

    let next = match page.next_token {
        Some(token) if !token.is_empty() => Cursor::Next(token),
        _ => Cursor::Done,
    };

    Ok(Some((page.events, next)))
}

pub struct CloudTrailAuditLog {
    client: cloudtrail::Client,
}

impl CloudTrailAuditLog {
    pub fn new(client: cloudtrail::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditLog for CloudTrailAuditLog {
    async fn lookup_page(
        &self,
        query: &EventQuery,
        next_token: Option<String>,
    ) -> Result<AuditPage, ExportError> {
        let source_filter = LookupAttribute::builder()
            .attribute_key(LookupAttributeKey::EventSource)
            .attribute_value(&query.event_source)
            .build()
            .map_err(ExportError::audit_log)?;

        let output = self
            .client
            .lookup_events()
            .lookup_attributes(source_filter)
            .start_time(SdkDateTime::from_secs(query.start.timestamp()))
            .end_time(SdkDateTime::from_secs(query.end.timestamp()))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| ExportError::audit_log(cloudtrail::Error::from(err)))?;

        Ok(AuditPage {
            events: output.events().iter().map(audit_event_from_sdk).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

fn audit_event_from_sdk(event: &cloudtrail::types::Event) -> AuditEvent {
    AuditEvent {
        event_time: event
            .event_time()
            .and_then(|time| time.to_millis().ok())
            .and_then(DateTime::from_timestamp_millis),
        event_name: event.event_name().map(str::to_string),
        username: event.username().map(str::to_string),
        cloud_trail_event: event.cloud_trail_event().map(str::to_string),
    }
}
