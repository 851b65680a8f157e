//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::model::Role;

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL and endpoint paths.
    pub api: ApiCfg,
    /// Unsigned object-store upload settings.
    pub upload: UploadCfg,
    /// Report generation settings.
    pub report: ReportCfg,
}

/// Remote backend endpoints. Paths are joined onto `base_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCfg {
    pub base_url: String,
    /// Login endpoint for the manager role; the same call returns the
    /// manager's work-item list under the envelope `data` key.
    pub manager_login_path: String,
    /// Login endpoint for the engineer role, same double duty.
    pub engineer_login_path: String,
    /// Visit check-in / check-out submission endpoint.
    pub check_in_out_path: String,
    /// Endpoint serving the pending-reason dropdown options.
    pub pending_reasons_path: String,
}

impl ApiCfg {
    /// Full login/listing URL for the given role.
    pub fn login_url(&self, role: Role) -> String {
        let path = match role {
            Role::Manager => &self.manager_login_path,
            Role::Engineer => &self.engineer_login_path,
        };
        join_url(&self.base_url, path)
    }

    pub fn check_in_out_url(&self) -> String {
        join_url(&self.base_url, &self.check_in_out_path)
    }

    pub fn pending_reasons_url(&self) -> String {
        join_url(&self.base_url, &self.pending_reasons_path)
    }
}

/// Unsigned-upload settings for the object store.
///
/// The preset is a client-embedded, revocable credential, not a true secret;
/// keeping it here is the single place to rotate it or point the client at a
/// signed-upload proxy instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCfg {
    /// Upload API base; swap for a signed-upload proxy without touching
    /// calling code.
    pub base_url: String,
    /// Account name, becomes part of the upload URL.
    pub cloud_name: String,
    /// Unsigned upload preset authorizing the request.
    pub upload_preset: String,
    /// Folder hint under which uploads are filed.
    pub folder: String,
}

/// Report pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCfg {
    /// Directory generated documents are written to.
    pub output_dir: String,
    /// Signature canvas width in pixels.
    pub signature_width: u32,
    /// Signature canvas height in pixels.
    pub signature_height: u32,
    /// JPEG quality for the rasterized signature (1-100).
    pub jpeg_quality: u8,
}

/// Join a base URL and a path without doubling the slash.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let s = fs::read_to_string(path)?;
            Ok(toml::from_str(&s)?)
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiCfg {
                base_url: "https://hma.magnum.org.in".into(),
                manager_login_path: "appEngglogin.php".into(),
                engineer_login_path: "appMEngglogin.php".into(),
                check_in_out_path: "appCheckINOUT.php".into(),
                pending_reasons_path: "appPendingreason.php".into(),
            },
            upload: UploadCfg {
                base_url: "https://api.cloudinary.com/v1_1".into(),
                cloud_name: "".into(),
                upload_preset: "".into(),
                folder: "service-reports".into(),
            },
            report: ReportCfg {
                output_dir: "reports".into(),
                signature_width: 400,
                signature_height: 160,
                jpeg_quality: 85,
            },
        }
    }
}
