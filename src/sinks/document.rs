use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use regex::Regex;
use tokio::io::AsyncWriteExt;

use super::pdf;
use super::{SinkError, SinkOutcome, SubmissionSink};
use crate::models::NewSubmission;

pub const DOCUMENT_TITLE: &str = "User Submission Details";

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]").expect("valid regex"));

/// Renders each submission to a one-page PDF in `dir`.
pub struct DocumentSink {
    dir: PathBuf,
}

impl DocumentSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn write(&self, submission: &NewSubmission, now: DateTime<Local>) -> anyhow::Result<PathBuf> {
        let bytes = render(submission, now);
        let path = self.dir.join(file_name(&submission.name, now));

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        // Same name within the same second: keep the first document intact.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(&bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.flush()
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}

#[async_trait]
impl SubmissionSink for DocumentSink {
    fn id(&self) -> &str {
        "document"
    }

    async fn store(&self, submission: &NewSubmission) -> Result<SinkOutcome, SinkError> {
        let path = self.write(submission, Local::now()).await?;
        tracing::info!("PDF generated: {}", path.display());
        Ok(SinkOutcome {
            artifact: Some(path),
        })
    }
}

pub fn render(submission: &NewSubmission, now: DateTime<Local>) -> Vec<u8> {
    let lines = vec![
        format!("Name: {}", submission.name),
        format!("Contact: {}", submission.contact),
        format!("Age: {}", submission.age),
        format!("Date: {}", now.format("%Y-%m-%d %H:%M:%S")),
    ];
    pdf::render_page(DOCUMENT_TITLE, &lines)
}

/// `<name>_<YYYYmmddHHMMSS>.pdf`, lowercased with spaces as underscores.
/// Anything outside `[a-z0-9_-]` is replaced so the name stays inside the directory.
pub fn file_name(name: &str, now: DateTime<Local>) -> String {
    let lowered = name.replace(' ', "_").to_lowercase();
    let stem = UNSAFE_FILENAME_CHARS.replace_all(&lowered, "_");
    format!("{stem}_{}.pdf", now.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn jane() -> NewSubmission {
        NewSubmission {
            name: "Jane Doe".to_string(),
            contact: "jane@example.com".to_string(),
            age: 42,
        }
    }

    #[test]
    fn file_name_lowercases_and_stamps() {
        assert_eq!(file_name("Jane Doe", at()), "jane_doe_20240309140507.pdf");
    }

    #[test]
    fn file_name_cannot_escape_directory() {
        let name = file_name("../../etc/Passwd", at());
        assert_eq!(name, "______etc_passwd_20240309140507.pdf");
        assert!(!name.contains('/'));
    }

    #[test]
    fn render_includes_fields_and_date() {
        let text = String::from_utf8(render(&jane(), at())).unwrap();
        assert!(text.contains("(User Submission Details) Tj"));
        assert!(text.contains("(Name: Jane Doe) Tj"));
        assert!(text.contains("(Contact: jane@example.com) Tj"));
        assert!(text.contains("(Age: 42) Tj"));
        assert!(text.contains("(Date: 2024-03-09 14:05:07) Tj"));
    }

    #[tokio::test]
    async fn store_writes_file_and_returns_artifact() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let dir = tmp.path().join("pdfs");
        let sink = DocumentSink::new(&dir);

        let outcome = sink.store(&jane()).await.unwrap();
        let path = outcome.artifact.unwrap();

        assert!(path.starts_with(&dir));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("jane_doe_"));
        assert!(name.ends_with(".pdf"));
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn same_name_in_same_second_does_not_overwrite() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let sink = DocumentSink::new(tmp.path());

        let first = sink.write(&jane(), at()).await.unwrap();
        let original = std::fs::read(&first).unwrap();

        let other = NewSubmission {
            contact: "someone-else@example.com".to_string(),
            age: 77,
            ..jane()
        };
        let err = sink.write(&other, at()).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to create"));

        assert_eq!(std::fs::read(&first).unwrap(), original);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn store_fails_when_directory_is_a_file() {
        let tmp = tempfile::tempdir().expect("Failed to create tempdir");
        let blocker = tmp.path().join("pdfs");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let sink = DocumentSink::new(&blocker);
        assert!(sink.store(&jane()).await.is_err());
    }
}
