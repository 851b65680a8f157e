//! Domain records shared across the client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which side of the app a user logs in as. Each role has its own backend
/// endpoints and its own credential-cache namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Manager,
    Engineer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Engineer => "engineer",
        }
    }
}

/// Job status a work item can be in on the server side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkStatus {
    Pending,
    Completed,
    StandBy,
    UnderObservation,
}

impl WorkStatus {
    /// Lenient parse of the free-form status strings the backend emits.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("complete") {
            Self::Completed
        } else if lower.contains("stand by") || lower.contains("standby") {
            Self::StandBy
        } else if lower.contains("observation") {
            Self::UnderObservation
        } else {
            Self::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::StandBy => "Stand By",
            Self::UnderObservation => "Under Observation",
        }
    }
}

/// One assigned complaint/work order as returned under the envelope `data` key.
///
/// Field names mirror the backend columns verbatim; everything is a string on
/// the wire and several columns are nullable.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WorkItem {
    /// Unique server-issued complaint number.
    #[serde(rename = "S_SERVNO")]
    pub id: String,
    #[serde(rename = "COMP_NAME")]
    pub client_name: String,
    #[serde(rename = "COMP_ADD1", default)]
    pub address1: Option<String>,
    #[serde(rename = "COMP_ADD2", default)]
    pub address2: Option<String>,
    #[serde(rename = "COMP_ADD3", default)]
    pub address3: Option<String>,
    #[serde(rename = "SYSTEM_NAME", default)]
    pub system_name: Option<String>,
    #[serde(rename = "S_TASK_TYPE", default)]
    pub task_type: Option<String>,
    #[serde(rename = "S_assignedengg", default)]
    pub assigned_engineer: Option<String>,
    #[serde(rename = "S_assigndate", default)]
    pub assign_date: Option<String>,
    #[serde(rename = "S_REMARK1", default)]
    pub remark: Option<String>,
    #[serde(rename = "S_jobstatus", default)]
    pub job_status: Option<String>,
    /// Timestamp the complaint was reported at.
    #[serde(rename = "S_SERVDT", default)]
    pub reported_at: Option<String>,
}

impl WorkItem {
    /// Parsed job status; unknown or missing strings read as pending.
    pub fn status(&self) -> WorkStatus {
        WorkStatus::parse(self.job_status.as_deref().unwrap_or(""))
    }

    /// Address lines joined into one display string, skipping empty parts.
    pub fn address(&self) -> String {
        [&self.address1, &self.address2, &self.address3]
            .into_iter()
            .filter_map(|a| a.as_deref())
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Call category the technician selects on the report form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeOfCall {
    Installation,
    Warranty,
    CallBasis,
    Amc,
    Preventive,
}

impl TypeOfCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installation => "Installation",
            Self::Warranty => "Warranty",
            Self::CallBasis => "Call Basis",
            Self::Amc => "AMC",
            Self::Preventive => "Preventive",
        }
    }
}

/// Outcome the technician reports for the visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportStatus {
    Completed,
    Pending,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Pending => "Pending",
        }
    }
}

/// Date + time pair entered separately on the form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DateTimePair {
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    /// Wall clock, `HH:MM`.
    pub time: String,
}

impl DateTimePair {
    pub fn is_complete(&self) -> bool {
        !self.date.trim().is_empty() && !self.time.trim().is_empty()
    }

    /// Combined display form, or `None` when either half is missing.
    pub fn combined(&self) -> Option<String> {
        self.is_complete()
            .then(|| format!("{} {}", self.date.trim(), self.time.trim()))
    }
}

/// The technician's record of one visit, assembled by the form model and
/// consumed by the template renderer. Transient: dropped once the document
/// has been exported and uploaded.
#[derive(Clone, Debug)]
pub struct VisitReport {
    pub work_item_id: String,
    pub fault_reported: String,
    pub cause_problem: String,
    pub diagnosis: String,
    pub part_replaced: String,
    pub material_taken_out: String,
    pub remark: String,
    pub customer_comment: String,
    pub type_of_call: Option<TypeOfCall>,
    pub call_attended_at: DateTimePair,
    pub call_completed_at: DateTimePair,
    pub status: Option<ReportStatus>,
    /// Required iff `status` is pending; picked from the server list.
    pub pending_reason: String,
    /// JPEG bytes produced by the signature pad at save time.
    pub signature_image: Option<Vec<u8>>,
}

/// Output format of the exporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// A document produced by the exporter, optionally enriched with the public
/// URL once the upload client has pushed it.
#[derive(Clone, Debug)]
pub struct GeneratedDocument {
    pub format: DocumentFormat,
    pub local_path: PathBuf,
    pub remote_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_status_lenient_parse() {
        assert_eq!(WorkStatus::parse("Completed"), WorkStatus::Completed);
        assert_eq!(WorkStatus::parse("work complete"), WorkStatus::Completed);
        assert_eq!(WorkStatus::parse("Stand By"), WorkStatus::StandBy);
        assert_eq!(
            WorkStatus::parse("Under Observation"),
            WorkStatus::UnderObservation
        );
        assert_eq!(WorkStatus::parse(""), WorkStatus::Pending);
        assert_eq!(WorkStatus::parse("anything else"), WorkStatus::Pending);
    }

    #[test]
    fn test_work_item_address_joins_non_empty_lines() {
        let item = WorkItem {
            id: "SRV-1001".into(),
            client_name: "Acme Hospital".into(),
            address1: Some("12 Ring Road".into()),
            address2: Some("  ".into()),
            address3: Some("Pune".into()),
            system_name: None,
            task_type: None,
            assigned_engineer: None,
            assign_date: None,
            remark: None,
            job_status: Some("Pending".into()),
            reported_at: None,
        };
        assert_eq!(item.address(), "12 Ring Road, Pune");
        assert_eq!(item.status(), WorkStatus::Pending);
    }

    #[test]
    fn test_work_item_deserializes_wire_names() {
        let raw = r#"{
            "S_SERVNO": "SRV-77",
            "COMP_NAME": "Crown Labs",
            "COMP_ADD1": "Plot 4",
            "COMP_ADD2": null,
            "SYSTEM_NAME": "Boiler-X",
            "S_TASK_TYPE": "Repair",
            "S_assignedengg": "eng1",
            "S_assigndate": "2024-03-01",
            "S_REMARK1": "urgent",
            "S_jobstatus": "Pending",
            "S_SERVDT": "2024-02-28 14:05"
        }"#;
        let item: WorkItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.id, "SRV-77");
        assert_eq!(item.client_name, "Crown Labs");
        assert_eq!(item.address(), "Plot 4");
        assert_eq!(item.system_name.as_deref(), Some("Boiler-X"));
    }

    #[test]
    fn test_date_time_pair_combined() {
        let pair = DateTimePair {
            date: "2024-03-05".into(),
            time: "10:30".into(),
        };
        assert_eq!(pair.combined().as_deref(), Some("2024-03-05 10:30"));
        assert!(!DateTimePair::default().is_complete());
        assert_eq!(DateTimePair::default().combined(), None);
    }
}
