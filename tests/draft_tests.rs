//! Loading drafts from disk and delivering them into a directory

use std::fs;

use mailcraft::{DirectoryTransport, Draft, MailError, RecipientType, SessionProperties};
use tempfile::TempDir;

const DRAFT: &str = r#"
[session]
host_name = "smtp.example.com"
smtp_port = 2525
socket_connection_timeout_ms = 10000
bounce_address = "bounce@example.com"

[message]
from = "a@x.com"
from_name = "Alice"
to = ["b@x.com"]
cc = ["c@x.com"]
bcc = ["d@x.com"]
reply_to = [{ address = "e@x.com", name = "R" }]
subject = "Quarterly report"
body = "Numbers attached."

[message.headers]
X-Priority = "1"
"#;

fn write_draft(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("draft.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_draft_into_builder() {
    let dir = TempDir::new().unwrap();
    let draft = Draft::load(write_draft(&dir, DRAFT)).unwrap();

    let mut builder = draft.to_builder().unwrap();
    assert_eq!(builder.smtp_port(), 2525);

    let message = builder.build().unwrap();
    assert_eq!(message.from().name(), Some("Alice"));
    assert_eq!(message.recipients(RecipientType::Cc).len(), 1);
    assert_eq!(message.recipients(RecipientType::Bcc).len(), 1);
    assert_eq!(message.reply_to().len(), 1);
    assert_eq!(message.header("X-Priority"), Some("1"));

    let session = builder.open_session().unwrap();
    assert_eq!(session.port(), 2525);
    assert_eq!(
        session.property(SessionProperties::CONNECTION_TIMEOUT),
        Some("10000")
    );
    assert_eq!(
        session.property(SessionProperties::FROM),
        Some("bounce@example.com")
    );
}

#[test]
fn test_missing_draft_file() {
    let dir = TempDir::new().unwrap();
    let err = Draft::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, MailError::Io(_)));
}

#[test]
fn test_invalid_draft_address() {
    let draft: Draft = "[message]\nto = [\"not an address\"]".parse().unwrap();
    assert!(matches!(
        draft.to_builder(),
        Err(MailError::InvalidAddress { .. })
    ));
}

#[test]
fn test_directory_transport_writes_one_file() {
    let dir = TempDir::new().unwrap();
    let draft: Draft = DRAFT.parse().unwrap();
    let mut builder = draft.to_builder().unwrap();

    let transport = DirectoryTransport::new(dir.path());
    let id = mailcraft::send(&mut builder, &transport).unwrap();

    let files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0], dir.path().join(format!("{id}.eml")));

    let written = fs::read_to_string(&files[0]).unwrap();
    assert!(written.contains("Subject: Quarterly report"));
    assert!(written.contains("X-Priority: 1"));
    assert!(!written.contains("d@x.com"));
}

#[test]
fn test_directory_transport_missing_dir() {
    let dir = TempDir::new().unwrap();
    let draft: Draft = DRAFT.parse().unwrap();
    let mut builder = draft.to_builder().unwrap();

    let transport = DirectoryTransport::new(dir.path().join("missing"));
    let err = mailcraft::send(&mut builder, &transport).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Sending the email to the following server failed : smtp.example.com:2525"
    );
}
