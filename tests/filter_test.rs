//! End-to-end scenarios: real rule files on disk, scripted directory.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use palisade::filter::{
    Evaluator, ForbiddenReason, Identity, IdentityLabel, IdentityResolver, IdentityUnavailable,
    RuleKind, Verdict,
};
use palisade::settings::RuleFiles;

struct Directory {
    identity: Identity,
    calls: AtomicUsize,
}

impl Directory {
    fn with_alice() -> Arc<Self> {
        Arc::new(Self {
            identity: Identity {
                full_name: Some("Alice Smith".into()),
                given_name: Some("Alice".into()),
                surname: Some("Smith".into()),
                login: Some("alice".into()),
            },
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityResolver for Directory {
    async fn lookup(&self, account: &str) -> Result<Identity, IdentityUnavailable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if account == "alice" {
            Ok(self.identity.clone())
        } else {
            Ok(Identity::default())
        }
    }
}

fn write_rules(
    dir: &TempDir,
    matches: &[&str],
    contains: &[&str],
    regex: &[&str],
    forbid: &[&str],
) -> RuleFiles {
    let files = RuleFiles {
        match_file: dir.path().join("match.txt"),
        contains_file: dir.path().join("contains.txt"),
        regex_file: dir.path().join("regex.txt"),
        forbid_regex_file: dir.path().join("forbid-regex.txt"),
    };
    fs::write(&files.match_file, matches.join("\n")).unwrap();
    fs::write(&files.contains_file, contains.join("\n")).unwrap();
    fs::write(&files.regex_file, regex.join("\n")).unwrap();
    fs::write(&files.forbid_regex_file, forbid.join("\n")).unwrap();
    files
}

/// Rewrite a rule file, retrying until the filesystem reports a new mtime.
fn rewrite(path: &Path, content: &str) {
    let before = fs::metadata(path).unwrap().modified().unwrap();
    loop {
        fs::write(path, content).unwrap();
        if fs::metadata(path).unwrap().modified().unwrap() != before {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn evaluator(files: RuleFiles, directory: Arc<Directory>) -> Evaluator {
    Evaluator::new(files, directory, Duration::from_secs(1)).unwrap()
}

#[tokio::test]
async fn scenario_poison_substring() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &[], &["password"], &[], &[]);
    let eval = evaluator(files, Directory::with_alice());

    assert_eq!(
        eval.judge("MyPassword1", "alice").await,
        Verdict::Deny(ForbiddenReason::ContainsPoisonSubstring("password".into()))
    );
}

#[tokio::test]
async fn scenario_forbidden_password() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &["summer2024"], &[], &[], &[]);
    let eval = evaluator(files, Directory::with_alice());

    assert_eq!(
        eval.judge("Summer2024", "alice").await,
        Verdict::Deny(ForbiddenReason::MatchesForbiddenPassword)
    );
}

#[tokio::test]
async fn scenario_forbidden_pattern() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &[], &[], &["^[a-z]+$"], &[]);
    let eval = evaluator(files, Directory::with_alice());

    assert_eq!(
        eval.judge("onlylower", "alice").await,
        Verdict::Deny(ForbiddenReason::MatchesForbiddenPattern("^[a-z]+$".into()))
    );
    assert!(eval.judge("Mixed1", "alice").await.is_allow());
}

#[tokio::test]
async fn scenario_required_pattern() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &[], &[], &[], &[".*[0-9].*"]);
    let eval = evaluator(files, Directory::with_alice());

    assert_eq!(
        eval.judge("NoDigitsHere", "alice").await,
        Verdict::Deny(ForbiddenReason::FailsRequiredPattern(".*[0-9].*".into()))
    );
    assert!(eval.judge("HasDigit1", "alice").await.is_allow());
}

#[tokio::test]
async fn scenario_identity_surname() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &[], &[], &[], &[]);
    let eval = evaluator(files, Directory::with_alice());

    assert_eq!(
        eval.judge("Smith!2024", "alice").await,
        Verdict::Deny(ForbiddenReason::ContainsIdentityAttribute(
            IdentityLabel::Surname
        ))
    );
    assert!(eval.judge("unrelated7", "alice").await.is_allow());
}

#[tokio::test]
async fn scenario_all_rule_kinds_together() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(
        &dir,
        &["summer2024"],
        &["password"],
        &["^[a-z]+$"],
        &[".*[0-9].*"],
    );
    let eval = evaluator(files, Directory::with_alice());

    // Clears all four file checks, then the surname substring denies
    assert_eq!(
        eval.judge("Smith1!", "alice").await,
        Verdict::Deny(ForbiddenReason::ContainsIdentityAttribute(
            IdentityLabel::Surname
        ))
    );
    assert!(eval.judge("Zx9!qPq", "alice").await.is_allow());
}

#[tokio::test]
async fn unknown_account_passes_identity_check() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &[], &[], &[], &[]);
    let eval = evaluator(files, Directory::with_alice());

    assert!(eval.judge("Smith!2024", "mallory").await.is_allow());
}

#[tokio::test]
async fn deny_short_circuits_before_directory() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &[], &[], &[], &[".*[0-9].*"]);
    let directory = Directory::with_alice();
    let eval = evaluator(files, directory.clone());

    assert!(!eval.judge("NoDigitsHere", "alice").await.is_allow());
    assert_eq!(directory.calls(), 0);
}

#[tokio::test]
async fn rule_edit_is_picked_up_by_next_judge() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &[], &[], &[], &[]);
    let eval = evaluator(files.clone(), Directory::with_alice());

    assert!(eval.judge("SomePhrase1", "alice").await.is_allow());

    rewrite(&files.contains_file, "phrase\n");
    assert_eq!(
        eval.judge("SomePhrase1", "alice").await,
        Verdict::Deny(ForbiddenReason::ContainsPoisonSubstring("phrase".into()))
    );

    // The store remembers the mtime of the read that produced the payload
    assert_eq!(
        eval.store().last_seen_mtime(RuleKind::Contains),
        fs::metadata(&files.contains_file).unwrap().modified().unwrap()
    );
}

#[tokio::test]
async fn rule_file_deleted_after_startup_keeps_serving() {
    let dir = TempDir::new().unwrap();
    let files = write_rules(&dir, &["summer2024"], &[], &[], &[]);
    let eval = evaluator(files.clone(), Directory::with_alice());

    fs::remove_file(&files.match_file).unwrap();

    // Previous payload still enforced
    assert_eq!(
        eval.judge("summer2024", "alice").await,
        Verdict::Deny(ForbiddenReason::MatchesForbiddenPassword)
    );
    assert!(eval.judge("other9pass", "alice").await.is_allow());
}
