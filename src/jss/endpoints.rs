//! Endpoints outside the resource catalog
//!
//! Command and log flushes are bare DELETEs and file uploads are a multipart
//! POST. None of them have records behind them, so they are plain functions
//! over a `Jss` rather than proxies.

use super::client::Jss;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, Upload};
use crate::query::encode_segment;
use crate::types::{ApiFamily, Format, Method};
use bytes::Bytes;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Log type flushed when none is given
pub const DEFAULT_LOG_TYPE: &str = "policies";

/// Resource types that accept file uploads
pub const UPLOAD_TYPES: [&str; 11] = [
    "computers",
    "mobiledevices",
    "enrollmentprofiles",
    "peripherals",
    "mobiledeviceenrollmentprofiles",
    "policies",
    "ebooks",
    "mobiledeviceapplicationsicon",
    "mobiledeviceapplicationsipa",
    "diskencryptionconfigurations",
    "printers",
];

/// Form field the server reads an uploaded file from
const UPLOAD_FIELD: &str = "name";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

const CONTENT_TYPES: [(&str, &str); 9] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("xml", "application/xml"),
    ("ppd", "application/vnd.cups-ppd"),
    ("mobileconfig", "application/x-apple-aspen-config"),
];

fn classic_path(rest: &str) -> String {
    format!("{}/{rest}", ApiFamily::Classic.prefix())
}

// ============================================================================
// Command Flush
// ============================================================================

/// Devices whose queued commands can be flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTarget {
    Computers,
    ComputerGroups,
    MobileDevices,
    MobileDeviceGroups,
}

impl FlushTarget {
    /// Path segment naming the target
    pub fn as_str(self) -> &'static str {
        match self {
            FlushTarget::Computers => "computers",
            FlushTarget::ComputerGroups => "computergroups",
            FlushTarget::MobileDevices => "mobiledevices",
            FlushTarget::MobileDeviceGroups => "mobiledevicegroups",
        }
    }
}

impl fmt::Display for FlushTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which queued commands to flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Pending,
    Failed,
    PendingAndFailed,
}

impl CommandStatus {
    /// Path segment naming the status
    pub fn as_str(self) -> &'static str {
        match self {
            CommandStatus::Pending => "Pending",
            CommandStatus::Failed => "Failed",
            CommandStatus::PendingAndFailed => "Pending+Failed",
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flush queued commands of one or more devices or groups
pub async fn command_flush(
    jss: &Jss,
    target: FlushTarget,
    ids: &[u64],
    status: CommandStatus,
) -> Result<()> {
    if ids.is_empty() {
        return Err(Error::invalid_argument("a command flush needs at least one id"));
    }
    let ids = ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",");
    let path = classic_path(&format!("commandflush/{target}/id/{ids}/status/{status}"));

    jss.send(ApiRequest::delete(path, Format::Xml)).await?;
    info!("Flushed {status} commands for {target} {ids}");
    Ok(())
}

/// Flush commands described by a `<commandflush>` document
pub async fn command_flush_with_xml(jss: &Jss, body: &str) -> Result<()> {
    let request = ApiRequest::delete(classic_path("commandflush"), Format::Xml).with_body(body);
    jss.send(request).await?;
    info!("Flushed commands from XML request");
    Ok(())
}

// ============================================================================
// Log Flush
// ============================================================================

/// Normalize an interval such as `"Three Months"` to its path form
fn interval_segment(interval: &str) -> Result<String> {
    let interval = interval.trim();
    if interval.is_empty() || interval.contains('/') {
        return Err(Error::invalid_argument(format!(
            "'{interval}' is not a log flush interval"
        )));
    }
    Ok(interval.replace(' ', "+"))
}

fn log_type_segment(log_type: Option<&str>) -> String {
    let log_type = log_type.map(str::trim).filter(|t| !t.is_empty());
    encode_segment(log_type.unwrap_or(DEFAULT_LOG_TYPE))
}

/// Flush every log of a type older than `interval` (e.g. `"Three Months"`)
pub async fn log_flush_for_interval(jss: &Jss, log_type: Option<&str>, interval: &str) -> Result<()> {
    let log_type = log_type_segment(log_type);
    let interval = interval_segment(interval)?;
    let path = classic_path(&format!("logflush/{log_type}/interval/{interval}"));

    jss.send(ApiRequest::delete(path, Format::Xml)).await?;
    info!("Flushed {log_type} logs older than {interval}");
    Ok(())
}

/// Flush the logs of one record older than `interval`
pub async fn log_flush_for_record(
    jss: &Jss,
    log_type: Option<&str>,
    id: u64,
    interval: &str,
) -> Result<()> {
    let log_type = log_type_segment(log_type);
    let interval = interval_segment(interval)?;
    let path = classic_path(&format!("logflush/{log_type}/id/{id}/interval/{interval}"));

    jss.send(ApiRequest::delete(path, Format::Xml)).await?;
    info!("Flushed {log_type} logs of {id} older than {interval}");
    Ok(())
}

/// Flush logs described by a `<logflush>` document
pub async fn log_flush_with_xml(jss: &Jss, body: &str) -> Result<()> {
    let request = ApiRequest::delete(classic_path("logflush"), Format::Xml).with_body(body);
    jss.send(request).await?;
    info!("Flushed logs from XML request");
    Ok(())
}

// ============================================================================
// File Uploads
// ============================================================================

/// How an upload addresses the record it is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadKey {
    Id(u64),
    Name(String),
}

impl UploadKey {
    fn segments(&self) -> String {
        match self {
            UploadKey::Id(id) => format!("id/{id}"),
            UploadKey::Name(name) => format!("name/{}", encode_segment(name)),
        }
    }
}

impl From<u64> for UploadKey {
    fn from(id: u64) -> Self {
        UploadKey::Id(id)
    }
}

impl From<&str> for UploadKey {
    fn from(name: &str) -> Self {
        UploadKey::Name(name.to_string())
    }
}

/// MIME type guessed from the file extension
pub fn guess_content_type(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    extension
        .and_then(|ext| {
            CONTENT_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, content_type)| *content_type)
        })
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

/// Attach a file (an icon, attachment, PPD or app) to a record.
///
/// `resource_type` must be one of `UPLOAD_TYPES`. Uploads cannot be read
/// back or deleted through the API.
pub async fn upload_file(
    jss: &Jss,
    resource_type: &str,
    key: impl Into<UploadKey>,
    file: &Path,
) -> Result<()> {
    if !UPLOAD_TYPES.contains(&resource_type) {
        return Err(Error::invalid_argument(format!(
            "'{resource_type}' does not take uploads; expected one of {}",
            UPLOAD_TYPES.join(", ")
        )));
    }

    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::invalid_path(file.display().to_string(), "no file name"))?
        .to_string();
    let data = tokio::fs::read(file).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: file.display().to_string(),
        },
        _ => Error::Io(e),
    })?;

    let key = key.into();
    let path = classic_path(&format!("fileuploads/{resource_type}/{}", key.segments()));
    let upload = Upload {
        field: UPLOAD_FIELD.to_string(),
        content_type: guess_content_type(&file_name).to_string(),
        file_name,
        data: Bytes::from(data),
    };
    let size = upload.data.len();
    let name = upload.file_name.clone();

    jss.send(ApiRequest::new(Method::POST, path, Format::Xml).with_upload(upload))
        .await?;
    info!("Uploaded {name} ({size} bytes) to {resource_type} {}", key.segments());
    Ok(())
}
