//! Remote payload models and their conversion into domain records.
//!
//! Conversion is where malformed individual records surface: each parse
//! failure is a `DataValidation` error the caller counts and skips, never a
//! batch failure.

use serde::Deserialize;

use legisync_core::model::{Chamber, Committee, Hearing, HearingStatus, Member};
use legisync_core::{SyncError, SyncResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteParent {
    system_code: String,
}

/// Committee record as the API ships it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommittee {
    pub system_code: String,
    pub name: String,
    pub chamber: String,
    #[serde(default)]
    parent: Option<RemoteParent>,
    #[serde(default)]
    pub is_current: Option<bool>,
    #[serde(default)]
    pub update_date: Option<String>,
}

/// Member record as the API ships it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMember {
    pub bioguide_id: String,
    pub name: String,
    #[serde(default)]
    pub party_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub chamber: Option<String>,
    #[serde(default)]
    pub update_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteMeetingCommittee {
    system_code: String,
}

/// Committee meeting (hearing) record as the API ships it.
///
/// Event ids arrive as strings upstream even though they are numeric.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteHearing {
    pub event_id: String,
    pub congress: i64,
    pub chamber: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub meeting_status: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    committees: Vec<RemoteMeetingCommittee>,
    #[serde(default)]
    pub update_date: Option<String>,
}

fn parse_chamber(raw: &str, context: &str) -> SyncResult<Chamber> {
    Chamber::from_str(raw)
        .ok_or_else(|| SyncError::validation(format!("{}: unknown chamber '{}'", context, raw)))
}

fn update_date_or_now(date: Option<String>) -> String {
    date.unwrap_or_else(|| chrono::Utc::now().to_rfc3339())
}

/// Decode a raw committee record.
pub fn parse_committee(value: &serde_json::Value) -> SyncResult<Committee> {
    let remote: RemoteCommittee = serde_json::from_value(value.clone())
        .map_err(|e| SyncError::validation(format!("committee record: {}", e)))?;
    if remote.system_code.is_empty() {
        return Err(SyncError::validation("committee record: empty systemCode"));
    }
    let chamber = parse_chamber(&remote.chamber, &format!("committee {}", remote.system_code))?;
    Ok(Committee {
        system_code: remote.system_code,
        name: remote.name,
        chamber,
        parent_code: remote.parent.map(|p| p.system_code),
        is_current: remote.is_current.unwrap_or(true),
        updated_at: update_date_or_now(remote.update_date),
    })
}

/// Decode a raw member record.
pub fn parse_member(value: &serde_json::Value) -> SyncResult<Member> {
    let remote: RemoteMember = serde_json::from_value(value.clone())
        .map_err(|e| SyncError::validation(format!("member record: {}", e)))?;
    if remote.bioguide_id.is_empty() {
        return Err(SyncError::validation("member record: empty bioguideId"));
    }
    Ok(Member {
        bioguide_id: remote.bioguide_id,
        name: remote.name,
        party: remote.party_name,
        state: remote.state,
        chamber: remote.chamber.as_deref().and_then(Chamber::from_str),
        updated_at: update_date_or_now(remote.update_date),
    })
}

/// Decode a raw committee-meeting record.
pub fn parse_hearing(value: &serde_json::Value) -> SyncResult<Hearing> {
    let remote: RemoteHearing = serde_json::from_value(value.clone())
        .map_err(|e| SyncError::validation(format!("hearing record: {}", e)))?;
    let event_id: i64 = remote.event_id.parse().map_err(|_| {
        SyncError::validation(format!("hearing record: bad eventId '{}'", remote.event_id))
    })?;
    let chamber = parse_chamber(&remote.chamber, &format!("hearing {}", event_id))?;
    Ok(Hearing {
        event_id,
        congress: remote.congress,
        chamber,
        title: remote.title,
        hearing_date: remote.date,
        status: remote
            .meeting_status
            .as_deref()
            .map(HearingStatus::from_str)
            .unwrap_or(HearingStatus::Unknown),
        video_url: remote.video_url,
        api_committee_codes: remote.committees.into_iter().map(|c| c.system_code).collect(),
        updated_at: update_date_or_now(remote.update_date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_hearing() {
        let value = json!({
            "eventId": "115538",
            "congress": 118,
            "chamber": "House",
            "title": "Examination of Crop Insurance",
            "date": "2025-03-10T10:00:00Z",
            "meetingStatus": "Scheduled",
            "committees": [{"systemCode": "hsag00"}],
            "updateDate": "2025-03-01T00:00:00Z"
        });
        let hearing = parse_hearing(&value).unwrap();
        assert_eq!(hearing.event_id, 115538);
        assert_eq!(hearing.chamber, Chamber::House);
        assert_eq!(hearing.status, HearingStatus::Scheduled);
        assert_eq!(hearing.api_committee_codes, vec!["hsag00".to_string()]);
    }

    #[test]
    fn test_parse_hearing_bad_event_id() {
        let value = json!({
            "eventId": "not-a-number",
            "congress": 118,
            "chamber": "House"
        });
        assert!(matches!(
            parse_hearing(&value),
            Err(SyncError::DataValidation(_))
        ));
    }

    #[test]
    fn test_parse_committee_with_parent() {
        let value = json!({
            "systemCode": "hsag14",
            "name": "Subcommittee on Commodity Markets",
            "chamber": "House",
            "parent": {"systemCode": "hsag00"},
            "updateDate": "2025-03-01T00:00:00Z"
        });
        let committee = parse_committee(&value).unwrap();
        assert_eq!(committee.parent_code.as_deref(), Some("hsag00"));
        assert!(committee.is_subcommittee());
    }

    #[test]
    fn test_parse_member_minimal() {
        let value = json!({
            "bioguideId": "A000370",
            "name": "Adams, Alma S.",
            "partyName": "Democratic",
            "state": "North Carolina"
        });
        let member = parse_member(&value).unwrap();
        assert_eq!(member.bioguide_id, "A000370");
        assert!(member.chamber.is_none());
    }

    #[test]
    fn test_parse_committee_unknown_chamber_rejected() {
        let value = json!({
            "systemCode": "xx00",
            "name": "Mystery",
            "chamber": "Assembly"
        });
        assert!(matches!(
            parse_committee(&value),
            Err(SyncError::DataValidation(_))
        ));
    }
}
