//! Configuration.
//!
//! Two layers, mirroring how operators actually deploy this:
//! - accounts come from environment variables (`WINDFALL_COOKIES`,
//!   `WINDFALL_NOTES`, `WINDFALL_ACCOUNT_RANGE`), newline-separated so a
//!   secret store can hold the whole block;
//! - campaign knobs come from a JSON file (`windfall.json` by default,
//!   override with `WINDFALL_CONFIG`).

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::types::{DiscoveryMode, PostKind};

/// One account the outer loop will run. Accounts are processed strictly
/// one at a time; `number` keys the per-account dedup ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    pub cookie: String,
    pub number: u32,
    pub note: String,
    pub user_agent: String,
    /// Wait before the next account starts, milliseconds.
    pub wait_ms: u64,
}

const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Parse the notes block: one line per account, `N,note=...` or
/// `N,note=...,qq=...`. Lines without a leading index default to account 1.
pub fn parse_notes(raw: &str) -> HashMap<u32, String> {
    let mut notes = HashMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (number, rest) = match split_leading_index(line) {
            Some((n, rest)) => (n, rest),
            None => (1, line),
        };
        let mut note = String::new();
        for part in rest.split([',', '，']) {
            let part = part.trim();
            if let Some(v) = part.strip_prefix("note=") {
                note.push_str(v);
            } else if part.starts_with("qq=") {
                if !note.is_empty() {
                    note.push(' ');
                }
                note.push_str(part);
            }
        }
        if !note.is_empty() {
            notes.insert(number, note);
        }
    }
    notes
}

/// Parse the cookie block: one account per line, optionally prefixed with
/// `N,` to pin the account number. Un-prefixed lines are numbered by
/// position, starting at 1.
pub fn parse_accounts(raw: &str, notes: &HashMap<u32, String>) -> Vec<AccountConfig> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(idx, line)| {
            let (number, cookie) = match split_leading_index(line) {
                Some((n, rest)) => (n, rest.to_string()),
                None => (idx as u32 + 1, line.to_string()),
            };
            AccountConfig {
                cookie,
                number,
                note: notes.get(&number).cloned().unwrap_or_default(),
                user_agent: DEFAULT_UA.to_string(),
                wait_ms: 10_000,
            }
        })
        .collect()
}

/// Parse an account-range expression like `1-3,5` or `all`. `None` means
/// no filtering. Invalid fragments are skipped with a warning.
pub fn parse_account_range(raw: &str, total: u32) -> Option<Vec<(u32, u32)>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "all" {
        return None;
    }
    let mut ranges = Vec::new();
    for item in raw.split([',', '，', ' ']).filter(|s| !s.is_empty()) {
        let parsed = match item.split_once('-') {
            Some((a, b)) => a
                .parse::<u32>()
                .ok()
                .zip(b.parse::<u32>().ok())
                .filter(|(start, end)| *start > 0 && end >= start && *end <= total),
            None => item
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0 && *n <= total)
                .map(|n| (n, n)),
        };
        match parsed {
            Some(range) => ranges.push(range),
            None => tracing::warn!(item, "Unparseable account range fragment, skipping"),
        }
    }
    if ranges.is_empty() {
        tracing::warn!("No valid account range fragment, running all accounts");
        return None;
    }
    Some(ranges)
}

fn in_range(number: u32, ranges: &[(u32, u32)]) -> bool {
    ranges.iter().any(|(start, end)| number >= *start && number <= *end)
}

fn split_leading_index(line: &str) -> Option<(u32, &str)> {
    let sep = line.find([',', '，'])?;
    let number = line[..sep].trim().parse::<u32>().ok()?;
    // the fullwidth comma is multi-byte
    let rest = line[sep..].trim_start_matches([',', '，']).trim();
    Some((number, rest))
}

// ---------------------------------------------------------------------------
// Campaign knobs
// ---------------------------------------------------------------------------

/// A per-post comment override: exact text plus optional image attachments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentOverride {
    pub text: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// One row of the keyword schedule: before `until_hour` (local), these
/// keywords and this max article age apply instead of the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSchedule {
    pub until_hour: u32,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub max_age_days: Option<u32>,
}

/// Filler-post cadence: every `every`-th processed entry (randomly chosen
/// from the options), share `count` recommended videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillerCadence {
    pub every: Vec<u32>,
    pub count: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Enter giveaways carrying the platform's official drawing marker.
    #[serde(default = "default_true")]
    pub official_mode: bool,
    /// Enter keyword-detected giveaways (no official marker).
    #[serde(default = "default_true")]
    pub keyword_mode: bool,
    /// Comment on official giveaways.
    #[serde(default = "default_true")]
    pub comment_official: bool,
    /// Comment on keyword giveaways.
    #[serde(default = "default_true")]
    pub comment_keyword: bool,

    /// Discovery sources scanned each run, in order; empty disables the
    /// campaign entirely.
    #[serde(default = "default_discovery")]
    pub discovery: Vec<DiscoveryMode>,

    /// Duplicate detection level. 0 = interaction flag only; 1 = ledger
    /// only, like step skipped; 2 = flag and ledger, like step skipped;
    /// 3 = flag and ledger, likes performed again.
    #[serde(default = "default_dup_check")]
    pub dup_check_level: u8,

    /// Append discovered candidates to this JSON-lines file before filtering.
    #[serde(default)]
    pub save_candidates_path: Option<PathBuf>,
    /// POST discovered candidates to this endpoint before filtering.
    #[serde(default)]
    pub export_url: Option<String>,

    /// Every pattern must match the description for a keyword giveaway.
    #[serde(default = "default_keywords")]
    pub required_keywords: Vec<String>,
    /// Hour-gated replacements for `required_keywords` / `max_age_days`.
    #[serde(default)]
    pub keyword_schedule: Vec<KeywordSchedule>,
    /// Drop posts whose description or reservation text matches any of these.
    #[serde(default)]
    pub blockwords: Vec<String>,
    /// Post ids and author ids never to touch.
    #[serde(default)]
    pub blacklist: Vec<String>,
    /// When non-empty, only these post ids survive filtering.
    #[serde(default)]
    pub only_posts: Vec<String>,
    #[serde(default)]
    pub blocked_kinds: Vec<PostKind>,
    /// Drop posts older than this many days.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,

    /// Process already-interacted posts anyway (sneak mode).
    #[serde(default)]
    pub sneak_mode: bool,
    /// Only interact when every relevant author is already followed.
    #[serde(default)]
    pub only_followed: bool,

    #[serde(default)]
    pub disable_reservations: bool,
    /// Register reservations but do not repost reservation posts.
    #[serde(default)]
    pub no_relay_reservations: bool,
    #[serde(default = "default_reservation_wait")]
    pub reservation_wait_ms: u64,

    /// Repost text templates; `{uname}` substitutes the author name.
    #[serde(default = "default_repost_templates")]
    pub repost_templates: Vec<String>,
    /// Comment text templates, same substitution.
    #[serde(default = "default_comment_templates")]
    pub comment_templates: Vec<String>,
    /// `(display_name, author_id)` pairs appended when a post asks to @ friends.
    #[serde(default)]
    pub at_targets: Vec<(String, u64)>,
    /// Per-post comment overrides, keyed by post id.
    #[serde(default)]
    pub comment_overrides: HashMap<String, CommentOverride>,

    /// Crib a comment from the post's own thread instead of templates.
    #[serde(default)]
    pub copy_comment: bool,
    #[serde(default)]
    pub copy_blockwords: Vec<String>,
    /// Append the repost text to the comment.
    #[serde(default)]
    pub repost_then_comment: bool,

    #[serde(default)]
    pub ai_comments: bool,
    #[serde(default = "default_captcha_attempts")]
    pub max_captcha_attempts: u32,

    /// Skip moving followed authors into the tracking group.
    #[serde(default)]
    pub no_tracking_group: bool,
    /// Pre-resolved tracking group id; resolved (or created) at run start
    /// when absent.
    #[serde(default)]
    pub tracking_group_id: Option<u64>,
    #[serde(default = "default_group_name")]
    pub tracking_group_name: String,

    /// Minimum follower count for non-official giveaways; 0 disables the gate.
    #[serde(default)]
    pub min_followers: i64,
    /// Skip official giveaways drawing further out than this many days.
    #[serde(default = "default_max_drawing_days")]
    pub max_drawing_days: u32,

    /// Base inter-entry wait, milliseconds; jittered by [0.5, 1.5).
    #[serde(default = "default_entry_wait")]
    pub entry_wait_ms: u64,
    /// Wait after a skip decision, milliseconds.
    #[serde(default = "default_filter_wait")]
    pub filter_wait_ms: u64,

    #[serde(default)]
    pub filler_posts: Option<FillerCadence>,

    /// Report success without touching the network.
    #[serde(default)]
    pub dry_run: bool,

    /// Ledger writes are suppressed when the run started before this local
    /// hour. Same-day reruns then re-evaluate instead of short-circuiting.
    #[serde(default = "default_write_cutoff")]
    pub ledger_write_cutoff_hour: u32,

    /// Keywords that mark a reply as a possible win notice.
    #[serde(default = "default_notice_keywords")]
    pub notice_keywords: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_dup_check() -> u8 {
    3
}
fn default_discovery() -> Vec<DiscoveryMode> {
    vec![
        DiscoveryMode::ByArticle("抽奖".into()),
        DiscoveryMode::ByTag("转发抽奖".into()),
    ]
}
fn default_keywords() -> Vec<String> {
    vec!["关注".into(), "转发".into()]
}
fn default_max_age_days() -> u32 {
    30
}
fn default_reservation_wait() -> u64 {
    5_000
}
fn default_repost_templates() -> Vec<String> {
    vec!["转发动态".into()]
}
fn default_comment_templates() -> Vec<String> {
    vec!["好运来".into()]
}
fn default_captcha_attempts() -> u32 {
    3
}
fn default_group_name() -> String {
    "此处存放因抽奖临时关注的up".into()
}
fn default_max_drawing_days() -> u32 {
    60
}
fn default_entry_wait() -> u64 {
    20_000
}
fn default_filter_wait() -> u64 {
    2_000
}
fn default_write_cutoff() -> u32 {
    12
}
fn default_notice_keywords() -> Vec<String> {
    vec!["中奖".into(), "恭喜".into(), "私信".into()]
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            official_mode: true,
            keyword_mode: true,
            comment_official: true,
            comment_keyword: true,
            discovery: default_discovery(),
            dup_check_level: default_dup_check(),
            save_candidates_path: None,
            export_url: None,
            required_keywords: default_keywords(),
            keyword_schedule: Vec::new(),
            blockwords: Vec::new(),
            blacklist: Vec::new(),
            only_posts: Vec::new(),
            blocked_kinds: Vec::new(),
            max_age_days: default_max_age_days(),
            sneak_mode: false,
            only_followed: false,
            disable_reservations: false,
            no_relay_reservations: false,
            reservation_wait_ms: default_reservation_wait(),
            repost_templates: default_repost_templates(),
            comment_templates: default_comment_templates(),
            at_targets: Vec::new(),
            comment_overrides: HashMap::new(),
            copy_comment: false,
            copy_blockwords: Vec::new(),
            repost_then_comment: false,
            ai_comments: false,
            max_captcha_attempts: default_captcha_attempts(),
            no_tracking_group: false,
            tracking_group_id: None,
            tracking_group_name: default_group_name(),
            min_followers: 0,
            max_drawing_days: default_max_drawing_days(),
            entry_wait_ms: default_entry_wait(),
            filter_wait_ms: default_filter_wait(),
            filler_posts: None,
            dry_run: false,
            ledger_write_cutoff_hour: default_write_cutoff(),
            notice_keywords: default_notice_keywords(),
        }
    }
}

impl CampaignConfig {
    /// Required keywords in effect for a run started now, honoring the
    /// hour-gated schedule.
    pub fn effective_keywords(&self, clock: &dyn Clock) -> &[String] {
        let hour = clock.local_hour();
        for row in &self.keyword_schedule {
            if hour < row.until_hour {
                return &row.keywords;
            }
        }
        &self.required_keywords
    }

    /// Max post age in effect for a run started now.
    pub fn effective_max_age_days(&self, clock: &dyn Clock) -> u32 {
        let hour = clock.local_hour();
        for row in &self.keyword_schedule {
            if hour < row.until_hour {
                if let Some(days) = row.max_age_days {
                    return days;
                }
            }
        }
        self.max_age_days
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub accounts: Vec<AccountConfig>,
    pub campaign: CampaignConfig,
    pub data_dir: PathBuf,

    // Collaborator endpoints; empty disables the collaborator.
    pub ai_api_url: String,
    pub ai_api_key: String,
    pub ai_model: String,
    pub ai_prompt: String,
    pub ocr_url: String,
    pub bark_url: String,
    pub webhook_url: String,
}

impl Config {
    /// Load accounts from the environment and campaign knobs from the JSON
    /// config file.
    pub fn load() -> Result<Self> {
        let path = env::var("WINDFALL_CONFIG").unwrap_or_else(|_| "windfall.json".to_string());
        let campaign = load_campaign(Path::new(&path))?;

        let notes = parse_notes(&env::var("WINDFALL_NOTES").unwrap_or_default());
        let mut accounts = parse_accounts(
            &env::var("WINDFALL_COOKIES").unwrap_or_default(),
            &notes,
        );
        if let Some(ranges) = parse_account_range(
            &env::var("WINDFALL_ACCOUNT_RANGE").unwrap_or_default(),
            accounts.len() as u32,
        ) {
            accounts.retain(|a| in_range(a.number, &ranges));
        }

        Ok(Self {
            accounts,
            campaign,
            data_dir: env::var("WINDFALL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            ai_api_url: env::var("AI_API_URL").unwrap_or_default(),
            ai_api_key: env::var("AI_API_KEY").unwrap_or_default(),
            ai_model: env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            ai_prompt: env::var("AI_PROMPT").unwrap_or_else(|_| {
                "为下面这条抽奖动态写一句简短自然的参与评论".to_string()
            }),
            ocr_url: env::var("OCR_URL").unwrap_or_default(),
            bark_url: env::var("BARK_PUSH").unwrap_or_default(),
            webhook_url: env::var("NOTIFY_WEBHOOK").unwrap_or_default(),
        })
    }

    /// Log a redacted summary. Cookies never hit the log.
    pub fn log_redacted(&self) {
        tracing::info!(
            accounts = self.accounts.len(),
            data_dir = %self.data_dir.display(),
            ai = !self.ai_api_url.is_empty(),
            ocr = !self.ocr_url.is_empty(),
            push = !self.bark_url.is_empty() || !self.webhook_url.is_empty(),
            "Config loaded"
        );
    }
}

fn load_campaign(path: &Path) -> Result<CampaignConfig> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "No config file, using defaults");
        return Ok(CampaignConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
