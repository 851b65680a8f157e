//! Background worker handling network calls and report submissions.

use anyhow::{Result, anyhow};
use reqwest::Client;
use std::path::Path;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    api::{auth, upload, work_items},
    config::Config,
    creds::{Credential, FileCredentialStore},
    model::{DocumentFormat, GeneratedDocument, ReportStatus, Role, WorkItem},
    report::{export, form::FormState, template},
};

/// Commands sent from the UI to the worker.
#[derive(Debug)]
pub enum WorkerCmd {
    /// Authenticate and apply the remember-me decision to the cache.
    Login { role: Role, credential: Credential },
    /// Re-fetch the work-item list for the authenticated user.
    RefreshWorkItems {
        role: Role,
        username: String,
        password: String,
    },
    /// Load the pending-reason options for the report form.
    FetchPendingReasons,
    /// Run the full submission pipeline for one filled report form.
    SubmitReport(SubmitRequest),
    /// Persist and apply updated settings.
    SaveSettings(Config),
}

/// Everything one report submission needs.
#[derive(Debug)]
pub struct SubmitRequest {
    pub job_id: Uuid,
    pub form: FormState,
    pub item: WorkItem,
    pub engineer_name: String,
    pub format: DocumentFormat,
}

/// Progress of one report submission.
#[derive(Clone, Debug)]
pub enum SubmissionStage {
    Validating,
    Rendering,
    Exporting,
    Uploading,
    SubmittingStatus,
    /// Pipeline finished; the document may or may not carry a remote URL.
    Done(GeneratedDocument),
    Failed(String),
}

/// Events emitted by the worker for UI updates.
#[derive(Clone, Debug)]
pub enum WorkerEvent {
    /// Login accepted by the backend.
    LoginSucceeded { role: Role, already_processed: bool },
    /// Full work-item list fetched; may be empty ("no items" is not an error).
    WorkItemsLoaded(Vec<WorkItem>),
    /// Pending-reason options arrived.
    PendingReasonsLoaded(Vec<String>),
    /// The reason fetch failed; the form shows an empty dropdown.
    PendingReasonsUnavailable,
    /// Single submission status update.
    SubmissionUpdated {
        job_id: Uuid,
        stage: SubmissionStage,
    },
    /// Informational log message.
    Log(String),
    /// User-visible error message.
    Error(String),
}

/// Main worker loop: handle commands strictly one at a time.
///
/// Sequential handling is the mutual-exclusion policy: at most one login,
/// one listing fetch, and one submission run at any moment, mirroring the
/// UI disabling its triggering control for the duration.
pub async fn run(
    mut rx: mpsc::Receiver<WorkerCmd>,
    tx: mpsc::Sender<WorkerEvent>,
    mut cfg: Config,
    creds: FileCredentialStore,
) {
    // Shared HTTP client for all API calls.
    let http = Client::new();
    tracing::info!("worker started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkerCmd::SaveSettings(new_cfg) => {
                tracing::info!("settings updated");
                cfg = new_cfg;
                let _ = tx.send(WorkerEvent::Log("settings updated".into())).await;
            }

            WorkerCmd::Login { role, credential } => {
                tracing::info!("login requested for {} role", role.as_str());
                match auth::authenticate(
                    &http,
                    &cfg.api,
                    role,
                    &credential.username,
                    &credential.password,
                )
                .await
                {
                    Ok(ok) => {
                        tracing::debug!("login payload: {} bytes", ok.raw_payload.len());
                        // Save or clear the cache per the checkbox state.
                        if let Err(e) = creds.apply_after_login(role, &credential).await {
                            tracing::warn!("credential cache update failed: {e}");
                        }
                        let _ = tx
                            .send(WorkerEvent::LoginSucceeded {
                                role,
                                already_processed: ok.already_processed,
                            })
                            .await;
                    }
                    Err(e) => {
                        tracing::error!("login failed: {e}");
                        let _ = tx.send(WorkerEvent::Error(e.to_string())).await;
                    }
                }
            }

            WorkerCmd::RefreshWorkItems {
                role,
                username,
                password,
            } => {
                tracing::info!("refresh work items");
                match work_items::list_work_items(&http, &cfg.api, role, &username, &password)
                    .await
                {
                    Ok(items) => {
                        let _ = tx.send(WorkerEvent::WorkItemsLoaded(items)).await;
                    }
                    Err(e) => {
                        tracing::error!("work-item fetch failed: {e}");
                        let _ = tx.send(WorkerEvent::Error(e.to_string())).await;
                    }
                }
            }

            WorkerCmd::FetchPendingReasons => {
                // Failure here must not block the form; it degrades to an
                // empty dropdown.
                match work_items::fetch_pending_reasons(&http, &cfg.api).await {
                    Ok(reasons) => {
                        let _ = tx.send(WorkerEvent::PendingReasonsLoaded(reasons)).await;
                    }
                    Err(e) => {
                        tracing::warn!("pending-reason fetch failed: {e}");
                        let _ = tx.send(WorkerEvent::PendingReasonsUnavailable).await;
                    }
                }
            }

            WorkerCmd::SubmitReport(req) => {
                let job_id = req.job_id;
                tracing::info!("submission start: {job_id} for {}", req.item.id);
                match submit_one(&http, &cfg, &req, &tx).await {
                    Ok(doc) => {
                        tracing::info!("submission done: {job_id}");
                        let _ = tx
                            .send(WorkerEvent::SubmissionUpdated {
                                job_id,
                                stage: SubmissionStage::Done(doc),
                            })
                            .await;
                    }
                    Err(e) => {
                        tracing::error!("submission failed: {job_id}: {e}");
                        let _ = tx
                            .send(WorkerEvent::SubmissionUpdated {
                                job_id,
                                stage: SubmissionStage::Failed(e.to_string()),
                            })
                            .await;
                    }
                }
            }
        }
    }
}

async fn stage(tx: &mpsc::Sender<WorkerEvent>, job_id: Uuid, s: SubmissionStage) {
    let _ = tx
        .send(WorkerEvent::SubmissionUpdated { job_id, stage: s })
        .await;
}

/// Validate, render, export, upload, then record the visit status.
///
/// Validation failure stops the pipeline before any document generation or
/// network call. An upload failure is downgraded to a warning: the exported
/// local file stays usable and the status submission still runs.
async fn submit_one(
    http: &Client,
    cfg: &Config,
    req: &SubmitRequest,
    tx: &mpsc::Sender<WorkerEvent>,
) -> Result<GeneratedDocument> {
    let job_id = req.job_id;

    stage(tx, job_id, SubmissionStage::Validating).await;
    let errors = req.form.validate();
    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(anyhow!(joined));
    }

    stage(tx, job_id, SubmissionStage::Rendering).await;
    let report = req.form.to_report();
    let markup = template::render(&report, &req.item, chrono::Utc::now());

    stage(tx, job_id, SubmissionStage::Exporting).await;
    let file_name = format!("complaint_{}_report", report.work_item_id.replace(' ', ""));
    let mut doc = export::export(
        &markup,
        &file_name,
        req.format,
        Path::new(&cfg.report.output_dir),
    )
    .await?;
    let _ = tx
        .send(WorkerEvent::Log(format!(
            "report exported as {}",
            doc.format.extension()
        )))
        .await;

    stage(tx, job_id, SubmissionStage::Uploading).await;
    if cfg.upload.cloud_name.is_empty() {
        let _ = tx
            .send(WorkerEvent::Log("upload not configured, skipping".into()))
            .await;
    } else {
        match upload::upload_document(http, &cfg.upload, &doc.local_path).await {
            Ok(url) => doc.remote_url = Some(url),
            Err(e) => {
                // Non-fatal: the local document remains valid.
                tracing::warn!("upload failed: {e}");
                let _ = tx
                    .send(WorkerEvent::Log(format!(
                        "upload failed ({e}); local file kept at {}",
                        doc.local_path.display()
                    )))
                    .await;
            }
        }
    }

    stage(tx, job_id, SubmissionStage::SubmittingStatus).await;
    let action = match report.status {
        Some(ReportStatus::Pending) => report.pending_reason.clone(),
        _ => ReportStatus::Completed.as_str().to_string(),
    };
    let outcome = work_items::submit_check_in_out(
        http,
        &cfg.api,
        &req.item.id,
        &req.engineer_name,
        &action,
    )
    .await?;
    if outcome == work_items::SubmitOutcome::AlreadyProcessed {
        let _ = tx
            .send(WorkerEvent::Log(
                "this complaint was already checked in or out".into(),
            ))
            .await;
    }

    Ok(doc)
}
