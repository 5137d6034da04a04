use crate::Result;
use crate::models::CanonicalPosting;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Display text of the Apply_Link hyperlink.
pub const APPLY_LABEL: &str = "Apply";

/// Spreadsheet formula rendering `url` as a clickable link.
pub fn hyperlink(url: &str, label: &str) -> String {
    format!(
        r#"=HYPERLINK("{}", "{}")"#,
        url.replace('"', "\"\""),
        label.replace('"', "\"\"")
    )
}

/// A posting as it appears in the combined file. Field order is the column order.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Source")]
    source: &'a str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Description")]
    description: Option<&'a str>,
    #[serde(rename = "Matched_Vertical")]
    matched_vertical: Option<&'a str>,
    #[serde(rename = "Deadline_or_PostingDate")]
    deadline_or_posting_date: Option<&'a str>,
    #[serde(rename = "Apply_Link")]
    apply_link: Option<String>,
}

impl<'a> From<&'a CanonicalPosting> for ExportRow<'a> {
    fn from(posting: &'a CanonicalPosting) -> Self {
        Self {
            source: &posting.source,
            title: &posting.title,
            description: posting.description.as_deref(),
            matched_vertical: posting.matched_vertical.as_deref(),
            deadline_or_posting_date: posting.deadline_or_posting_date.as_deref(),
            apply_link: posting
                .apply_link
                .as_deref()
                .map(|url| hyperlink(url, APPLY_LABEL)),
        }
    }
}

/// Writes the combined dataset, creating the parent directory. The header
/// row comes from the first record, so an empty slice leaves an empty file.
pub fn save_to_csv(postings: &[CanonicalPosting], file_path: impl AsRef<Path>) -> Result<()> {
    let file_path = file_path.as_ref();
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(file_path)?;
    for posting in postings {
        writer.serialize(ExportRow::from(posting))?;
    }

    writer.flush()?;
    Ok(())
}
