//! HTML rendering of a visit report.
//!
//! Pure string construction: same report, same work item, same timestamp,
//! same output. Every interpolated field goes through [`escape_html`]; the
//! template never emits an empty cell, absent values render a placeholder.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};

use crate::model::{ReportStatus, VisitReport, WorkItem};

/// Escape a string for interpolation into HTML text or attribute context.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaped value, or the (trusted, literal) placeholder when blank.
fn cell(value: &str, placeholder: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        placeholder.to_string()
    } else {
        escape_html(v)
    }
}

fn opt_cell(value: Option<&str>, placeholder: &str) -> String {
    cell(value.unwrap_or(""), placeholder)
}

fn info_item(label: &str, value: &str) -> String {
    format!(
        r#"<div class="info-item"><div class="info-label">{label}</div><div class="info-value">{value}</div></div>"#
    )
}

/// Render the report document for one work item.
pub fn render(report: &VisitReport, item: &WorkItem, generated_at: DateTime<Utc>) -> String {
    let complaint_no = escape_html(item.id.trim());
    let generated = generated_at.format("%d %b %Y %I:%M %p").to_string();

    let status = report.status.map(|s| s.as_str()).unwrap_or("Pending");
    let status_class = match report.status {
        Some(ReportStatus::Completed) => "status-completed",
        _ => "status-pending",
    };

    let attended = report
        .call_attended_at
        .combined()
        .map(|s| escape_html(&s))
        .unwrap_or_else(|| "Not specified".into());
    let completed = report
        .call_completed_at
        .combined()
        .map(|s| escape_html(&s))
        .unwrap_or_else(|| "Not specified".into());

    let signature = match report.signature_image.as_deref() {
        Some(jpeg) => format!(
            r#"<img class="signature-image" src="data:image/jpeg;base64,{}" alt="Customer signature" />"#,
            STANDARD.encode(jpeg)
        ),
        None => r#"<div class="signature-placeholder">Customer signature not captured</div>"#
            .to_string(),
    };

    let pending_reason_row = match report.status {
        Some(ReportStatus::Pending) => {
            info_item("Pending Reason", &cell(&report.pending_reason, "Not specified"))
        }
        _ => String::new(),
    };

    let client_section = [
        info_item("Client Name", &cell(&item.client_name, "N/A")),
        info_item("System Name", &opt_cell(item.system_name.as_deref(), "N/A")),
        info_item("Location", &cell(&item.address(), "N/A")),
        info_item("Task Type", &opt_cell(item.task_type.as_deref(), "N/A")),
        info_item("Assigned Date", &opt_cell(item.assign_date.as_deref(), "N/A")),
        info_item(
            "Assigned Engineer",
            &opt_cell(item.assigned_engineer.as_deref(), "N/A"),
        ),
    ]
    .join("\n");

    let call_section = [
        info_item("Reported At", &opt_cell(item.reported_at.as_deref(), "N/A")),
        info_item("Fault Reported", &cell(&report.fault_reported, "N/A")),
        info_item(
            "Type of Call",
            &cell(report.type_of_call.map(|t| t.as_str()).unwrap_or(""), "N/A"),
        ),
        info_item("Call Attended On", &attended),
        info_item("Call Completed On", &completed),
    ]
    .join("\n");

    let technical_section = [
        info_item("Part Replaced/Stand by", &cell(&report.part_replaced, "None")),
        info_item("Cause of Problem", &cell(&report.cause_problem, "Not specified")),
        info_item("Diagnosis", &cell(&report.diagnosis, "Not specified")),
        info_item(
            "Material Taken Out",
            &cell(&report.material_taken_out, "None"),
        ),
    ]
    .join("\n");

    let status_section = format!(
        "{}\n{}\n{}",
        info_item(
            "Current Status",
            &format!(r#"<span class="status-tag {status_class}">{status}</span>"#),
        ),
        pending_reason_row,
        info_item("Submission Date", &generated),
    );

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Complaint Report - {complaint_no}</title>
<style>
body {{ font-family: Helvetica, Arial, sans-serif; color: #323130; margin: 0; line-height: 1.5; }}
.container {{ max-width: 850px; margin: 20px auto; }}
.header {{ text-align: center; padding: 20px; border-bottom: 2px solid #0078d4; }}
.document-title {{ font-size: 20px; font-weight: 700; color: #0078d4; }}
.complaint-number {{ text-align: center; padding: 12px; font-size: 18px; font-weight: 600; }}
.section {{ padding: 16px 0; border-bottom: 1px solid #edebe9; }}
.section-title {{ font-size: 15px; font-weight: 600; color: #0078d4; text-transform: uppercase; }}
.info-item {{ margin: 8px 0; }}
.info-label {{ font-size: 12px; color: #605e5c; text-transform: uppercase; }}
.info-value {{ font-size: 14px; }}
.status-tag {{ font-weight: 600; text-transform: uppercase; }}
.status-completed {{ color: #107c10; }}
.status-pending {{ color: #ff8c00; }}
.remark-text {{ font-style: italic; }}
.signature-image {{ max-width: 300px; max-height: 120px; }}
.signature-placeholder {{ color: #605e5c; font-style: italic; border: 1px dashed #edebe9; padding: 16px; }}
.footer {{ text-align: center; font-size: 11px; color: #605e5c; padding: 12px; }}
</style>
</head>
<body>
<div class="container">
<div class="header"><div class="document-title">Complaint Report</div></div>
<div class="complaint-number">Complaint No: {complaint_no}</div>
<div class="section"><div class="section-title">Client Information</div>
{client_section}
</div>
<div class="section"><div class="section-title">Complaint Details</div>
{call_section}
</div>
<div class="section"><div class="section-title">Technical Details</div>
{technical_section}
</div>
<div class="section"><div class="section-title">Status Information</div>
{status_section}
</div>
<div class="section"><div class="section-title">Remarks</div>
<div class="remark-text">{remark}</div>
</div>
<div class="section"><div class="section-title">Customer Comment</div>
<div class="remark-text">{customer_comment}</div>
</div>
<div class="section"><div class="section-title">Customer Signature</div>
{signature}
</div>
<div class="footer">This document was automatically generated on {generated}</div>
</div>
</body>
</html>
"#,
        remark = cell(&report.remark, "No remarks provided."),
        customer_comment = cell(&report.customer_comment, "None"),
    )
}
