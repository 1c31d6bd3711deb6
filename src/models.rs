use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COLUMNS: [&str; 5] = ["event_time", "event_name", "username", "user_arn", "assumed_role"];

const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// A single CloudTrail lookup result. `cloud_trail_event` is the raw JSON record,
/// which is where the caller identity lives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditEvent {
    pub event_time: Option<DateTime<Utc>>,
    pub event_name: Option<String>,
    pub username: Option<String>,
    pub cloud_trail_event: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudTrailRecord {
    user_identity: Option<UserIdentity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdentity {
    arn: Option<String>,
    session_context: Option<SessionContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionContext {
    session_issuer: Option<SessionIssuer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionIssuer {
    user_name: Option<String>,
}

/// One line of a daily report. Field order matches `COLUMNS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub event_time: String,
    pub event_name: String,
    pub username: String,
    pub user_arn: String,
    pub assumed_role: String,
}

impl ReportRow {
    pub fn from_event(event: &AuditEvent) -> Self {
        let identity = event
            .cloud_trail_event
            .as_deref()
            .map(parse_record)
            .unwrap_or_default()
            .user_identity
            .unwrap_or_default();

        let assumed_role = identity
            .session_context
            .and_then(|context| context.session_issuer)
            .and_then(|issuer| issuer.user_name)
            .unwrap_or_default();

        ReportRow {
            event_time: event
                .event_time
                .map(|time| time.format(EVENT_TIME_FORMAT).to_string())
                .unwrap_or_default(),
            event_name: event.event_name.clone().unwrap_or_default(),
            username: event.username.clone().unwrap_or_default(),
            user_arn: identity.arn.unwrap_or_default(),
            assumed_role,
        }
    }
}

fn parse_record(raw: &str) -> CloudTrailRecord {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        tracing::warn!("Unparseable CloudTrail record, identity columns left empty: {}", err);
        CloudTrailRecord::default()
    })
}
