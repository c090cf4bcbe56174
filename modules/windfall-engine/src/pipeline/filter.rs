//! The candidate filter: batch dedup, ledger pre-check, side-channel
//! export, then the per-post eligibility chain. First failing check drops
//! the candidate and is recorded as its drop reason.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use regex::Regex;
use tokio::io::AsyncWriteExt;

use windfall_common::{CampaignConfig, CandidatePost, Clock, DiscoveryMode};

use crate::ledger::EntryLedger;
use crate::pipeline::entry::outer_text;
use crate::stats::RunStats;
use crate::traits::PlatformApi;

const LEDGER_CHECK_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotInOverride,
    EmptyDescription,
    AlreadyInteracted,
    TooOld,
    PaidLottery,
    Blacklisted,
    BlockedKind,
    Blockword,
    ReservationOnly,
    NotFollowed,
    NotQualified,
}

pub struct FilterPipeline<'a> {
    pub api: &'a dyn PlatformApi,
    pub ledger: &'a EntryLedger,
    pub config: &'a CampaignConfig,
    pub clock: &'a dyn Clock,
    pub follow_snapshot: &'a HashSet<u64>,
}

/// Patterns compiled once per batch; the sets are fixed for a whole run.
struct CompiledRules {
    blockwords: Vec<Regex>,
    keywords: Vec<Regex>,
}

impl FilterPipeline<'_> {
    pub async fn run(
        &self,
        mode: &DiscoveryMode,
        candidates: Vec<CandidatePost>,
        stats: &mut RunStats,
    ) -> Vec<CandidatePost> {
        stats.discovered += candidates.len() as u32;

        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for candidate in candidates {
            if seen.insert(candidate.post_id.clone()) {
                unique.push(candidate);
            } else {
                stats.duplicates_in_batch += 1;
            }
        }

        let entered = if self.config.dup_check_level >= 1 && !mode.is_direct() {
            self.check_ledger(&unique).await
        } else {
            HashSet::new()
        };

        // named posts and external batches are not re-exported
        if !mode.is_direct() && !mode.is_external_api() {
            self.export(&unique).await;
        }

        let rules = CompiledRules {
            blockwords: compile(&self.config.blockwords),
            keywords: compile(self.config.effective_keywords(self.clock)),
        };

        let mut kept = Vec::new();
        for candidate in unique {
            if entered.contains(&candidate.post_id) {
                stats.already_entered += 1;
                tracing::debug!(post_id = %candidate.post_id, "Already in the ledger");
                continue;
            }
            match self.evaluate(&candidate, &rules, stats).await {
                None => kept.push(candidate),
                Some(reason) => {
                    stats.filtered_out += 1;
                    tracing::info!(post_id = %candidate.post_id, ?reason, "Candidate dropped");
                }
            }
        }
        kept
    }

    async fn check_ledger(&self, candidates: &[CandidatePost]) -> HashSet<String> {
        let ledger = self.ledger;
        stream::iter(candidates.iter().map(|c| c.post_id.clone()))
            .map(|id| async move {
                let hit = match ledger.exists(&id).await {
                    Ok(hit) => hit,
                    Err(err) => {
                        tracing::error!(post_id = %id, %err, "Ledger check failed, treating as new");
                        false
                    }
                };
                (id, hit)
            })
            .buffer_unordered(LEDGER_CHECK_CONCURRENCY)
            .filter_map(|(id, hit)| async move { hit.then_some(id) })
            .collect()
            .await
    }

    /// Best-effort side channel: candidates appended to a JSON-lines file
    /// and/or POSTed to an external collector.
    async fn export(&self, candidates: &[CandidatePost]) {
        if candidates.is_empty() {
            return;
        }
        if let Some(path) = &self.config.save_candidates_path {
            let mut lines = String::new();
            for candidate in candidates {
                if let Ok(json) = serde_json::to_string(candidate) {
                    lines.push_str(&json);
                    lines.push('\n');
                }
            }
            let result = async {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(lines.as_bytes()).await
            }
            .await;
            if let Err(err) = result {
                tracing::warn!(path = %path.display(), %err, "Candidate file export failed");
            }
        }
        if let Some(url) = &self.config.export_url {
            let outcome = reqwest::Client::new().post(url).json(candidates).send().await;
            match outcome {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(url, count = candidates.len(), "Candidates exported");
                }
                Ok(resp) => {
                    tracing::warn!(url, status = %resp.status(), "Candidate export rejected");
                }
                Err(err) => {
                    tracing::warn!(url, %err, "Candidate export failed");
                }
            }
        }
    }

    async fn evaluate(
        &self,
        candidate: &CandidatePost,
        rules: &CompiledRules,
        stats: &mut RunStats,
    ) -> Option<DropReason> {
        let cfg = self.config;

        if !cfg.only_posts.is_empty() && !cfg.only_posts.contains(&candidate.post_id) {
            return Some(DropReason::NotInOverride);
        }
        // an empty description usually means upstream throttling, not a
        // genuinely blank post
        if candidate.description.trim().is_empty() {
            return Some(DropReason::EmptyDescription);
        }
        // the interaction flag only counts at dup levels 0, 2 and 3;
        // level 1 leans on the ledger alone
        let flag_checked = cfg.dup_check_level == 0 || cfg.dup_check_level >= 2;
        if flag_checked && candidate.already_interacted && !cfg.sneak_mode {
            return Some(DropReason::AlreadyInteracted);
        }
        if let Some(created) = candidate.created_at {
            let age_secs = self.clock.now().timestamp() - created;
            let max_secs = i64::from(cfg.effective_max_age_days(self.clock)) * 86_400;
            if age_secs > max_secs {
                return Some(DropReason::TooOld);
            }
        }
        if candidate.paid_lottery {
            return Some(DropReason::PaidLottery);
        }
        if cfg.blacklist.iter().any(|entry| {
            entry == &candidate.post_id
                || candidate
                    .author_ids
                    .iter()
                    .any(|id| entry == &id.to_string())
        }) {
            return Some(DropReason::Blacklisted);
        }
        if cfg.blocked_kinds.contains(&candidate.kind) {
            return Some(DropReason::BlockedKind);
        }
        let haystack = format!("{} {}", candidate.description, candidate.reservation_text);
        if matches_any(&rules.blockwords, &haystack) {
            return Some(DropReason::Blockword);
        }

        if let Some(reservation_id) = &candidate.reservation_id {
            if !cfg.disable_reservations {
                if self.api.reserve(reservation_id).await {
                    stats.reservations += 1;
                }
                tokio::time::sleep(std::time::Duration::from_millis(cfg.reservation_wait_ms))
                    .await;
            }
            if cfg.no_relay_reservations {
                return Some(DropReason::ReservationOnly);
            }
        }

        if cfg.only_followed
            && candidate
                .author_ids
                .iter()
                .any(|id| !self.follow_snapshot.contains(id))
        {
            return Some(DropReason::NotFollowed);
        }

        // keyword and mention asks quoted from a reposted source do not
        // qualify the outer post
        let own_text = outer_text(&candidate.description);
        let qualifies = if candidate.official_marker {
            cfg.official_mode
        } else {
            cfg.keyword_mode && matches_all(&rules.keywords, own_text)
        };
        if !qualifies {
            if !candidate.official_marker && cfg.keyword_mode {
                // surfaced so operators can tune their keyword list
                tracing::info!(
                    post_id = %candidate.post_id,
                    description = %candidate.description,
                    "Keyword candidate did not qualify"
                );
            }
            return Some(DropReason::NotQualified);
        }
        None
    }
}

fn compile(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::warn!(pattern, %err, "Unparseable pattern, skipping");
                None
            }
        })
        .collect()
}

fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|re| re.is_match(text))
}

/// Vacuously true on an empty set: no required keywords means every
/// candidate qualifies.
fn matches_all(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().all(|re| re.is_match(text))
}
