// src/identity.rs

//! Report naming
//!
//! The archive name is derived from who the report is for and which support
//! case it belongs to. [`ReportNamer`] walks through:
//!
//! ```text
//! Empty -> AccountDerived -> OperatorSupplied -> Finalized
//! ```
//!
//! - `AccountDerived`: remote support account username, else hostname
//! - `OperatorSupplied`: interactive answers (skipped in batch mode)
//! - overrides from the command line always win, with the same sanitizing
//! - `Finalized`: an empty name falls back to the account-derived value

use crate::error::Result;
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

/// Location of the RHN system identity document
pub const RHN_SYSTEMID_PATH: &str = "/etc/sysconfig/rhn/systemid";

/// Prefix of every generated archive file name
pub const ARCHIVE_PREFIX: &str = "sosreport-";

/// Second-resolution timestamp format used in archive names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

static USERNAME_MEMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<name>\s*username\s*</name>\s*<value>\s*(?:<string>)?([^<]*)(?:</string>)?\s*</value>")
        .expect("valid systemid regex")
});

/// Keep only ASCII letters, digits and periods
pub fn sanitize_name(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}

/// Keep only ASCII digits
pub fn sanitize_ticket(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Answer to an interactive question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReply {
    Answer(String),
    /// The operator interrupted the prompt (EOF or interrupt)
    Cancelled,
}

/// Source of interactive answers
pub trait Prompter {
    fn ask(&mut self, question: &str) -> Result<PromptReply>;
}

/// Reads answers from the terminal
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, question: &str) -> Result<PromptReply> {
        use std::io::{self, BufRead, Write};

        let mut stdout = io::stdout();
        write!(stdout, "{}", question)?;
        stdout.flush()?;

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) => Ok(PromptReply::Cancelled),
            Ok(_) => Ok(PromptReply::Answer(input.trim_end_matches(['\r', '\n']).to_string())),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(PromptReply::Cancelled),
            Err(e) => Err(e.into()),
        }
    }
}

/// Optional lookup of the remote support account bound to this host
pub trait AccountLookup {
    /// Account username, or `None` when unavailable for any reason
    fn remote_username(&self) -> Option<String>;
}

/// No remote account; naming falls back to the hostname
#[derive(Debug, Default)]
pub struct NoAccount;

impl AccountLookup for NoAccount {
    fn remote_username(&self) -> Option<String> {
        None
    }
}

/// Reads the username from an RHN `systemid` XML-RPC document
#[derive(Debug, Clone)]
pub struct RhnSystemId {
    path: PathBuf,
}

impl Default for RhnSystemId {
    fn default() -> Self {
        Self::new(RHN_SYSTEMID_PATH)
    }
}

impl RhnSystemId {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl AccountLookup for RhnSystemId {
    fn remote_username(&self) -> Option<String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No systemid at {}: {}", self.path.display(), e);
                return None;
            }
        };

        let raw = USERNAME_MEMBER_RE.captures(&content)?.get(1)?.as_str().trim();
        match quick_xml::escape::unescape(raw) {
            Ok(name) if !name.is_empty() => Some(name.into_owned()),
            Ok(_) => None,
            Err(e) => {
                debug!("Malformed username in {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Naming progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamerState {
    Empty,
    AccountDerived,
    OperatorSupplied,
    Finalized,
}

/// Final report name and ticket, both sanitized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportIdentity {
    pub report_name: String,
    pub ticket_number: String,
}

impl ReportIdentity {
    /// `name[.ticket].timestamp`
    pub fn build_archive_basename_at(&self, timestamp: NaiveDateTime) -> String {
        let mut base = self.report_name.clone();
        if !self.ticket_number.is_empty() {
            base.push('.');
            base.push_str(&self.ticket_number);
        }
        format!("{}.{}", base, timestamp.format(TIMESTAMP_FORMAT))
    }

    /// Basename stamped with the current local time
    pub fn build_archive_basename(&self) -> String {
        self.build_archive_basename_at(chrono::Local::now().naive_local())
    }

    /// Full archive file name (without compression suffix)
    pub fn archive_name_at(&self, timestamp: NaiveDateTime) -> String {
        format!("{}{}", ARCHIVE_PREFIX, self.build_archive_basename_at(timestamp))
    }
}

/// Outcome of the naming step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingOutcome {
    Named(ReportIdentity),
    /// The operator aborted at a prompt; no report should be produced
    Cancelled,
}

/// Builds a [`ReportIdentity`] step by step
#[derive(Debug, Clone)]
pub struct ReportNamer {
    state: NamerState,
    local_name: String,
    report_name: String,
    ticket_number: String,
}

impl Default for ReportNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportNamer {
    pub fn new() -> Self {
        Self {
            state: NamerState::Empty,
            local_name: String::new(),
            report_name: String::new(),
            ticket_number: String::new(),
        }
    }

    pub fn state(&self) -> NamerState {
        self.state
    }

    /// The account-derived fallback name
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Derive the fallback name from the remote account, else the hostname
    pub fn derive_account(&mut self, account: &dyn AccountLookup, hostname: &str) {
        self.local_name = match account.remote_username() {
            Some(name) => {
                debug!("Using remote account name {}", name);
                name
            }
            None => {
                debug!("No remote account, using hostname {}", hostname);
                hostname.to_string()
            }
        };
        self.state = NamerState::AccountDerived;
    }

    /// Ask the operator for a name and case number
    ///
    /// Returns `Ok(false)` when the operator cancels; the caller must then
    /// stop without producing a report.
    pub fn prompt(&mut self, prompter: &mut dyn Prompter) -> Result<bool> {
        let question = format!(
            "Please enter your first initial and last name [{}]: ",
            self.local_name
        );
        let name = match prompter.ask(&question)? {
            PromptReply::Answer(answer) => answer,
            PromptReply::Cancelled => return Ok(false),
        };

        let ticket = match prompter
            .ask("Please enter the case number that you are generating this report for: ")?
        {
            PromptReply::Answer(answer) => answer,
            PromptReply::Cancelled => return Ok(false),
        };

        self.report_name = sanitize_name(&name);
        self.ticket_number = sanitize_ticket(&ticket);
        self.state = NamerState::OperatorSupplied;
        Ok(true)
    }

    /// Apply explicit operator values; they take precedence over prompts
    pub fn apply_overrides(&mut self, name: Option<&str>, ticket: Option<&str>) {
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.report_name = sanitize_name(name);
            self.state = NamerState::OperatorSupplied;
        }
        if let Some(ticket) = ticket.filter(|t| !t.is_empty()) {
            self.ticket_number = sanitize_ticket(ticket);
            self.state = NamerState::OperatorSupplied;
        }
    }

    /// Settle the identity, falling back to the account-derived name
    pub fn finalize(mut self) -> ReportIdentity {
        if self.report_name.is_empty() {
            self.report_name = sanitize_name(&self.local_name);
        }
        self.state = NamerState::Finalized;
        info!(
            "Report name '{}', ticket '{}'",
            self.report_name, self.ticket_number
        );
        ReportIdentity {
            report_name: self.report_name,
            ticket_number: self.ticket_number,
        }
    }
}

/// Inputs to [`name_report`]
#[derive(Debug, Clone, Default)]
pub struct NamingOptions {
    /// Skip interactive prompts
    pub batch: bool,
    /// Explicit report name
    pub name: Option<String>,
    /// Explicit ticket/case number
    pub ticket: Option<String>,
}

/// Run the whole naming sequence
pub fn name_report(
    options: &NamingOptions,
    account: &dyn AccountLookup,
    hostname: &str,
    prompter: &mut dyn Prompter,
) -> Result<NamingOutcome> {
    let mut namer = ReportNamer::new();
    namer.derive_account(account, hostname);

    if !options.batch && !namer.prompt(prompter)? {
        info!("Naming cancelled by operator");
        return Ok(NamingOutcome::Cancelled);
    }

    namer.apply_overrides(options.name.as_deref(), options.ticket.as_deref());
    Ok(NamingOutcome::Named(namer.finalize()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Replays a fixed list of answers, then cancels
    pub struct ScriptedPrompter {
        pub replies: VecDeque<PromptReply>,
        pub questions: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn answers(answers: &[&str]) -> Self {
            Self {
                replies: answers
                    .iter()
                    .map(|a| PromptReply::Answer(a.to_string()))
                    .collect(),
                questions: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&mut self, question: &str) -> Result<PromptReply> {
            self.questions.push(question.to_string());
            Ok(self.replies.pop_front().unwrap_or(PromptReply::Cancelled))
        }
    }

    struct FixedAccount(&'static str);

    impl AccountLookup for FixedAccount {
        fn remote_username(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("John O'Brien #42"), "JohnOBrien42");
        assert_eq!(sanitize_name("j.smith"), "j.smith");
        assert_eq!(sanitize_name("Zoë"), "Zo");
    }

    #[test]
    fn test_sanitize_ticket() {
        assert_eq!(sanitize_ticket("CASE-00219"), "00219");
        assert_eq!(sanitize_ticket("no digits"), "");
    }

    #[test]
    fn test_sanitize_idempotent() {
        for input in ["John O'Brien #42", "a.b-c_d", "", "..9"] {
            let once = sanitize_name(input);
            assert_eq!(sanitize_name(&once), once);
            let once = sanitize_ticket(input);
            assert_eq!(sanitize_ticket(&once), once);
        }
    }

    #[test]
    fn test_build_archive_basename() {
        let identity = ReportIdentity {
            report_name: "alice".to_string(),
            ticket_number: "00219".to_string(),
        };
        assert_eq!(identity.build_archive_basename_at(ts()), "alice.00219.20240102030405");
        assert_eq!(identity.archive_name_at(ts()), "sosreport-alice.00219.20240102030405");

        let no_ticket = ReportIdentity {
            report_name: "alice".to_string(),
            ticket_number: String::new(),
        };
        assert_eq!(no_ticket.build_archive_basename_at(ts()), "alice.20240102030405");
    }

    #[test]
    fn test_state_transitions() {
        let mut namer = ReportNamer::new();
        assert_eq!(namer.state(), NamerState::Empty);

        namer.derive_account(&NoAccount, "host1");
        assert_eq!(namer.state(), NamerState::AccountDerived);
        assert_eq!(namer.local_name(), "host1");

        let mut prompter = ScriptedPrompter::answers(&["Bob", "123"]);
        assert!(namer.prompt(&mut prompter).unwrap());
        assert_eq!(namer.state(), NamerState::OperatorSupplied);
        assert!(prompter.questions[0].contains("[host1]"));
    }

    #[test]
    fn test_account_preferred_over_hostname() {
        let mut namer = ReportNamer::new();
        namer.derive_account(&FixedAccount("rhn-user"), "host1");
        assert_eq!(namer.local_name(), "rhn-user");
    }

    #[test]
    fn test_interactive_answers_sanitized() {
        let mut prompter = ScriptedPrompter::answers(&["John O'Brien #42", "CASE-00219"]);
        let outcome = name_report(&NamingOptions::default(), &NoAccount, "host1", &mut prompter).unwrap();
        assert_eq!(
            outcome,
            NamingOutcome::Named(ReportIdentity {
                report_name: "JohnOBrien42".to_string(),
                ticket_number: "00219".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_answer_falls_back_to_local_name() {
        let mut prompter = ScriptedPrompter::answers(&["", ""]);
        let outcome = name_report(&NamingOptions::default(), &NoAccount, "db01", &mut prompter).unwrap();
        match outcome {
            NamingOutcome::Named(identity) => {
                assert_eq!(identity.report_name, "db01");
                assert_eq!(identity.ticket_number, "");
            }
            NamingOutcome::Cancelled => panic!("unexpected cancel"),
        }
    }

    #[test]
    fn test_cancel_at_first_prompt() {
        let mut prompter = ScriptedPrompter::answers(&[]);
        let outcome = name_report(&NamingOptions::default(), &NoAccount, "db01", &mut prompter).unwrap();
        assert_eq!(outcome, NamingOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_at_second_prompt() {
        let mut prompter = ScriptedPrompter::answers(&["alice"]);
        let outcome = name_report(&NamingOptions::default(), &NoAccount, "db01", &mut prompter).unwrap();
        assert_eq!(outcome, NamingOutcome::Cancelled);
    }

    #[test]
    fn test_batch_mode_skips_prompts() {
        let mut prompter = ScriptedPrompter::answers(&["should", "not-be-used"]);
        let options = NamingOptions {
            batch: true,
            ..NamingOptions::default()
        };
        let outcome = name_report(&options, &FixedAccount("acct"), "db01", &mut prompter).unwrap();
        assert!(prompter.questions.is_empty());
        assert_eq!(
            outcome,
            NamingOutcome::Named(ReportIdentity {
                report_name: "acct".to_string(),
                ticket_number: String::new(),
            })
        );
    }

    #[test]
    fn test_overrides_win_over_prompts() {
        let mut prompter = ScriptedPrompter::answers(&["prompted", "111"]);
        let options = NamingOptions {
            batch: false,
            name: Some("Over Ride!".to_string()),
            ticket: Some("#222".to_string()),
        };
        let outcome = name_report(&options, &NoAccount, "db01", &mut prompter).unwrap();
        assert_eq!(
            outcome,
            NamingOutcome::Named(ReportIdentity {
                report_name: "OverRide".to_string(),
                ticket_number: "222".to_string(),
            })
        );
    }

    #[test]
    fn test_override_sanitized_to_empty_falls_back() {
        let options = NamingOptions {
            batch: true,
            name: Some("!!!".to_string()),
            ticket: None,
        };
        let outcome = name_report(&options, &NoAccount, "db01", &mut ScriptedPrompter::answers(&[])).unwrap();
        assert!(matches!(outcome, NamingOutcome::Named(id) if id.report_name == "db01"));
    }

    #[test]
    fn test_rhn_systemid_lookup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("systemid");
        std::fs::write(
            &path,
            r#"<?xml version="1.0"?>
<params><param><value><struct>
<member><name>os_release</name><value><string>7Server</string></value></member>
<member><name>username</name>
<value><string>acme-ops</string></value>
</member>
</struct></value></param></params>
"#,
        )
        .unwrap();

        assert_eq!(RhnSystemId::new(&path).remote_username().as_deref(), Some("acme-ops"));
        assert_eq!(RhnSystemId::new(dir.path().join("absent")).remote_username(), None);

        std::fs::write(&path, "<params></params>").unwrap();
        assert_eq!(RhnSystemId::new(&path).remote_username(), None);
    }

    #[test]
    fn test_rhn_systemid_decodes_entities() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("systemid");
        std::fs::write(
            &path,
            "<member><name>username</name><value><string>r&amp;d&#46;ops&lt;1&gt;</string></value></member>",
        )
        .unwrap();
        assert_eq!(RhnSystemId::new(&path).remote_username().as_deref(), Some("r&d.ops<1>"));

        let mut namer = ReportNamer::new();
        namer.derive_account(&RhnSystemId::new(&path), "host1");
        assert_eq!(namer.finalize().report_name, "rd.ops1");

        std::fs::write(
            &path,
            "<member><name>username</name><value><string>bad&bogus;</string></value></member>",
        )
        .unwrap();
        assert_eq!(RhnSystemId::new(&path).remote_username(), None);
    }
}
