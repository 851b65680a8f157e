//! Unsigned multipart upload of generated documents to the object store.

use reqwest::Client;
use std::path::Path;
use thiserror::Error;

use crate::{config::UploadCfg, model::DocumentFormat};

/// Upload failures. Never fatal to the submission flow: the exported local
/// file stays valid whether or not the push succeeds.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("upload response had no secure_url")]
    MalformedResponse,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Unsigned-upload URL for the configured account.
pub fn upload_url(cfg: &UploadCfg) -> String {
    format!(
        "{}/{}/raw/upload",
        cfg.base_url.trim_end_matches('/'),
        cfg.cloud_name
    )
}

/// Push a local document to the object store and return its public URL.
///
/// Builds the unsigned-upload multipart body: the file tagged as a raw
/// resource, the client-embedded preset, and the folder hint.
pub async fn upload_document(
    http: &Client,
    cfg: &UploadCfg,
    local_path: &Path,
) -> Result<String, UploadError> {
    let url = upload_url(cfg);
    let bytes = tokio::fs::read(local_path).await?;
    let file_name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".into());
    let mime = match local_path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => DocumentFormat::Pdf.mime_type(),
        Some("docx") => DocumentFormat::Docx.mime_type(),
        _ => "application/octet-stream",
    };

    let form = reqwest::multipart::Form::new()
        .part(
            "file",
            reqwest::multipart::Part::bytes(bytes)
                .file_name(file_name.clone())
                .mime_str(mime)?,
        )
        .text("upload_preset", cfg.upload_preset.clone())
        .text("folder", cfg.folder.clone())
        .text("resource_type", "raw");

    let resp = http.post(url).multipart(form).send().await?;
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        tracing::warn!("upload rejected ({status}): {body}");
        return Err(UploadError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let v: serde_json::Value =
        serde_json::from_str(&body).map_err(|_| UploadError::MalformedResponse)?;
    let secure_url = v["secure_url"]
        .as_str()
        .ok_or(UploadError::MalformedResponse)?
        .to_string();
    tracing::info!("uploaded {file_name} -> {secure_url}");
    Ok(secure_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn cfg(base_url: &str) -> UploadCfg {
        UploadCfg {
            base_url: base_url.into(),
            cloud_name: "demo".into(),
            upload_preset: "unsigned-preset".into(),
            folder: "service-reports".into(),
        }
    }

    #[test]
    fn test_upload_url_embeds_cloud_name() {
        assert_eq!(
            upload_url(&cfg("https://api.cloudinary.com/v1_1")),
            "https://api.cloudinary.com/v1_1/demo/raw/upload"
        );
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("complaint_SRV-1_report.pdf");
        std::fs::write(&file, b"%PDF-1.4 fake").unwrap();

        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/demo/raw/upload")
            .match_body(Matcher::Regex("unsigned-preset".into()))
            .with_body(r#"{"secure_url":"https://cdn.example/reports/x.pdf","public_id":"x"}"#)
            .create_async()
            .await;

        let http = Client::new();
        let secure = upload_document(&http, &cfg(&server.url()), &file)
            .await
            .unwrap();
        assert_eq!(secure, "https://cdn.example/reports/x.pdf");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_rejected_keeps_status_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("r.pdf");
        std::fs::write(&file, b"%PDF-1.4").unwrap();

        let mut server = Server::new_async().await;
        server
            .mock("POST", "/demo/raw/upload")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Invalid upload preset"}}"#)
            .create_async()
            .await;

        let http = Client::new();
        let err = upload_document(&http, &cfg(&server.url()), &file)
            .await
            .unwrap_err();
        match err {
            UploadError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid upload preset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upload_missing_secure_url() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("r.pdf");
        std::fs::write(&file, b"%PDF-1.4").unwrap();

        let mut server = Server::new_async().await;
        server
            .mock("POST", "/demo/raw/upload")
            .with_body(r#"{"public_id":"x"}"#)
            .create_async()
            .await;

        let http = Client::new();
        let err = upload_document(&http, &cfg(&server.url()), &file)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::MalformedResponse));
    }

    #[tokio::test]
    async fn test_upload_missing_local_file() {
        let http = Client::new();
        let err = upload_document(
            &http,
            &cfg("http://127.0.0.1:1"),
            Path::new("/no/such/file.pdf"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }
}
