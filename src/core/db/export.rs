use time::{OffsetDateTime, format_description::well_known::Rfc3339, macros::format_description};

use crate::core::db::HistoryRecord;
use crate::error::{Result, StorageError};
use crate::models::percent;

pub const EXPORT_HEADER: [&str; 6] = [
    "date",
    "matang",
    "mentah",
    "berbunga",
    "top_label",
    "top_confidence",
];

/// Placeholder for records without a top detection
pub const NO_LABEL: &str = "-";

/// `YYYY-MM-DD HH:MM:SS` for RFC 3339 timestamps, anything else unchanged.
pub fn export_date(created_at: &str) -> String {
    OffsetDateTime::parse(created_at, &Rfc3339)
        .ok()
        .and_then(|t| {
            t.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
                .ok()
        })
        .unwrap_or_else(|| created_at.to_string())
}

pub fn export_row(record: &HistoryRecord) -> [String; 6] {
    let label = if record.top_label.is_empty() {
        NO_LABEL.to_string()
    } else {
        record.top_label.clone()
    };
    [
        export_date(&record.created_at),
        record.matang.to_string(),
        record.mentah.to_string(),
        record.berbunga.to_string(),
        label,
        format!("{}%", percent(record.top_confidence)),
    ]
}

/// Render records as CSV in the order given.
pub fn write_csv(records: &[HistoryRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;
    for record in records {
        writer.write_record(export_row(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StorageError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
