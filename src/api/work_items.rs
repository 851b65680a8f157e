//! Work-item listing, pending reasons, and visit status submission.

use reqwest::{Client, header::CONTENT_TYPE};
use thiserror::Error;

use crate::{
    api::{envelope, form_body},
    config::ApiCfg,
    model::{Role, WorkItem},
};

/// Failures of the repository calls. An empty item list is not one of them.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("invalid server response format")]
    Malformed,
    #[error("no work-item data found in response")]
    MissingData,
    #[error("{0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Outcome of a check-in/check-out submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The visit status was recorded.
    Recorded,
    /// The backend had already recorded this visit; treated as success.
    AlreadyProcessed,
}

/// Fetch the work items assigned to the authenticated user.
///
/// The listing endpoint is the role-scoped login endpoint itself; the item
/// list rides in the envelope's `data` key. Fetched fresh on every call, no
/// caching, whole result set in memory.
pub async fn list_work_items(
    http: &Client,
    api: &ApiCfg,
    role: Role,
    username: &str,
    password: &str,
) -> Result<Vec<WorkItem>, RepoError> {
    let body = form_body(&[("username", username), ("password", password)]);
    let text = http
        .post(api.login_url(role))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?
        .text()
        .await?;

    let env = envelope::parse_server_envelope(&text).map_err(|_| RepoError::Malformed)?;
    if !env.is_success() {
        return Err(RepoError::Rejected(
            env.message
                .unwrap_or_else(|| "Failed to fetch work items.".into()),
        ));
    }
    let data = env.data.ok_or(RepoError::MissingData)?;
    let items: Vec<WorkItem> =
        serde_json::from_value(data).map_err(|_| RepoError::Malformed)?;
    tracing::info!("work-item list fetched: {} items", items.len());
    Ok(items)
}

/// Fetch the server-provided pending-reason options.
///
/// The form layer treats a failure here as an empty dropdown, never as a
/// blocking error, so this returns whatever could be read.
pub async fn fetch_pending_reasons(http: &Client, api: &ApiCfg) -> Result<Vec<String>, RepoError> {
    let text = http
        .post(api.pending_reasons_url())
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(String::new())
        .send()
        .await?
        .text()
        .await?;

    let env = envelope::parse_server_envelope(&text).map_err(|_| RepoError::Malformed)?;
    if !env.is_success() {
        return Err(RepoError::Rejected(
            env.message
                .unwrap_or_else(|| "Failed to fetch pending reasons.".into()),
        ));
    }
    let data = env.data.ok_or(RepoError::MissingData)?;
    Ok(reason_strings(&data))
}

/// Accept both shapes the backend has been seen returning: a plain string
/// array, or an array of objects whose `reason` field carries the text.
fn reason_strings(data: &serde_json::Value) -> Vec<String> {
    let Some(rows) = data.as_array() else {
        return vec![];
    };
    rows.iter()
        .filter_map(|row| match row {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => {
                map.get("reason").and_then(|v| v.as_str()).map(String::from)
            }
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Record the visit outcome for a complaint.
///
/// The endpoint's success reporting is loose: a body echoing the complaint
/// number and engineer name counts as success even before JSON parsing, and
/// two literal status strings distinguish a duplicate from a fresh update.
pub async fn submit_check_in_out(
    http: &Client,
    api: &ApiCfg,
    complaint_no: &str,
    engineer_name: &str,
    pending_reason: &str,
) -> Result<SubmitOutcome, RepoError> {
    let body = form_body(&[
        ("complainno", complaint_no),
        ("enggname", engineer_name),
        ("pendingreason", pending_reason),
    ]);
    let text = http
        .post(api.check_in_out_url())
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?
        .text()
        .await?;

    // Echo check first: the backend sometimes wraps the envelope in text
    // that never parses, but still repeats the submitted identifiers.
    if text.contains(complaint_no) && text.contains(engineer_name) {
        if text.contains(&format!(r#""status":"{}""#, envelope::STATUS_ALREADY_PROCESSED)) {
            tracing::info!("check-in/out duplicate for {complaint_no}");
            return Ok(SubmitOutcome::AlreadyProcessed);
        }
        tracing::info!("check-in/out recorded for {complaint_no}");
        return Ok(SubmitOutcome::Recorded);
    }

    let env = envelope::parse_server_envelope(&text).map_err(|_| RepoError::Malformed)?;
    if env.status == envelope::STATUS_ALREADY_PROCESSED {
        return Ok(SubmitOutcome::AlreadyProcessed);
    }
    if env.is_any_success() {
        return Ok(SubmitOutcome::Recorded);
    }
    Err(RepoError::Rejected(env.message.unwrap_or_else(|| {
        "Failed to process request. Please try again.".into()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use mockito::Server;

    fn api_for(server: &Server) -> ApiCfg {
        let mut api = Config::default().api;
        api.base_url = server.url();
        api
    }

    #[tokio::test]
    async fn test_list_items_parses_data_rows() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/appMEngglogin.php")
            .with_body(
                r#"{"status":"success","data":[
                    {"S_SERVNO":"SRV-1","COMP_NAME":"Acme","S_jobstatus":"Pending"},
                    {"S_SERVNO":"SRV-2","COMP_NAME":"Crown","S_jobstatus":"Completed"}
                ]}"#,
            )
            .create_async()
            .await;

        let http = Client::new();
        let items = list_work_items(&http, &api_for(&server), Role::Engineer, "eng1", "pass1")
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "SRV-1");
        assert_eq!(items[1].client_name, "Crown");
    }

    #[tokio::test]
    async fn test_list_items_empty_data_is_not_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/appMEngglogin.php")
            .with_body(r#"{"status":"success","data":[]}"#)
            .create_async()
            .await;

        let http = Client::new();
        let items = list_work_items(&http, &api_for(&server), Role::Engineer, "eng1", "pass1")
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_list_items_missing_data_key() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/appMEngglogin.php")
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;

        let http = Client::new();
        let err = list_work_items(&http, &api_for(&server), Role::Engineer, "eng1", "pass1")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::MissingData));
    }

    #[tokio::test]
    async fn test_list_items_malformed_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/appEngglogin.php")
            .with_body("not json at all")
            .create_async()
            .await;

        let http = Client::new();
        let err = list_work_items(&http, &api_for(&server), Role::Manager, "m", "p")
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Malformed));
    }

    #[tokio::test]
    async fn test_pending_reasons_string_rows() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/appPendingreason.php")
            .with_body(r#"{"status":"success","data":["Awaiting spare part","Customer not present"]}"#)
            .create_async()
            .await;

        let http = Client::new();
        let reasons = fetch_pending_reasons(&http, &api_for(&server)).await.unwrap();
        assert_eq!(reasons, vec!["Awaiting spare part", "Customer not present"]);
    }

    #[test]
    fn test_reason_strings_object_rows() {
        let data = serde_json::json!([
            {"reason": "Awaiting spare part"},
            {"reason": ""},
            {"other": "ignored"}
        ]);
        assert_eq!(reason_strings(&data), vec!["Awaiting spare part"]);
    }

    #[tokio::test]
    async fn test_submit_echo_body_counts_as_success() {
        let mut server = Server::new_async().await;
        // Unparseable body that still echoes both identifiers.
        server
            .mock("POST", "/appCheckINOUT.php")
            .with_body("updated row for SRV-9 by eng1")
            .create_async()
            .await;

        let http = Client::new();
        let out = submit_check_in_out(&http, &api_for(&server), "SRV-9", "eng1", "Completed")
            .await
            .unwrap();
        assert_eq!(out, SubmitOutcome::Recorded);
    }

    #[tokio::test]
    async fn test_submit_detects_duplicate_marker_in_echo() {
        let mut server = Server::new_async().await;
        let body = format!(
            "SRV-9 eng1 {{\"status\":\"{}\"}}",
            envelope::STATUS_ALREADY_PROCESSED
        );
        server
            .mock("POST", "/appCheckINOUT.php")
            .with_body(body)
            .create_async()
            .await;

        let http = Client::new();
        let out = submit_check_in_out(&http, &api_for(&server), "SRV-9", "eng1", "Completed")
            .await
            .unwrap();
        assert_eq!(out, SubmitOutcome::AlreadyProcessed);
    }

    #[tokio::test]
    async fn test_submit_row_updated_status() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/appCheckINOUT.php")
            .with_body(r#"{"status":"success-Record or Row updated ='1'"}"#)
            .create_async()
            .await;

        let http = Client::new();
        let out = submit_check_in_out(&http, &api_for(&server), "SRV-9", "eng1", "Completed")
            .await
            .unwrap();
        assert_eq!(out, SubmitOutcome::Recorded);
    }

    #[tokio::test]
    async fn test_submit_rejected_with_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/appCheckINOUT.php")
            .with_body(r#"{"status":"error","message":"Unknown complaint"}"#)
            .create_async()
            .await;

        let http = Client::new();
        let err = submit_check_in_out(&http, &api_for(&server), "SRV-9", "eng1", "Completed")
            .await
            .unwrap_err();
        match err {
            RepoError::Rejected(msg) => assert_eq!(msg, "Unknown complaint"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
