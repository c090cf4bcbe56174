//! Campaign orchestration for one account: discovery, filtering, the entry
//! loop with its gates, and status aggregation.
//!
//! Sticky conditions (account flagged, follow cap) latch for the rest of the
//! run and raise one notification each. Hard-stop statuses end the run.

use std::collections::HashSet;

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use windfall_common::{CampaignConfig, Clock, EntryPlan};
use windfall_platform::LotteryNotice;

use crate::action::ActionEngine;
use crate::discovery::Discovery;
use crate::ledger::EntryLedger;
use crate::pipeline::{build_plan, FilterPipeline};
use crate::state::{statuses, RunState};
use crate::stats::RunStats;
use crate::traits::{ChallengeSolver, Notifier, PlatformApi, TextGenerator};

pub struct Campaign<'a> {
    pub api: &'a dyn PlatformApi,
    pub ledger: &'a EntryLedger,
    pub config: &'a CampaignConfig,
    pub clock: &'a dyn Clock,
    pub generator: Option<&'a dyn TextGenerator>,
    pub solver: Option<&'a dyn ChallengeSolver>,
    pub notifier: Option<&'a dyn Notifier>,
    /// Account label used in notifications.
    pub account_note: String,
}

impl Campaign<'_> {
    /// Run the campaign. Returns the aggregate status and the run counters.
    pub async fn run(&self) -> (u32, RunStats) {
        let mut stats = RunStats::default();
        if self.config.discovery.is_empty()
            || (!self.config.official_mode && !self.config.keyword_mode)
        {
            tracing::info!("Campaign disabled by configuration");
            return (statuses::OK, stats);
        }

        let group_id = self.resolve_group().await;
        let snapshot = self.follow_snapshot().await;
        let mut plans = self.collect_plans(&snapshot, &mut stats).await;
        if plans.is_empty() {
            tracing::info!("Nothing to enter");
            return (statuses::OK, stats);
        }
        plans.shuffle(&mut rand::rng());

        let engine = ActionEngine {
            api: self.api,
            solver: self.solver,
            config: self.config,
            group_id,
            retry_wait_ms: self.config.filter_wait_ms,
        };

        let mut state = RunState::default();
        let mut last_status = statuses::OK;
        let mut until_filler = self.next_filler_gap();

        for plan in plans {
            if state.follow_capped && !plan.follow_targets.is_empty() {
                tracing::info!(post_id = %plan.post_id, "Follow cap reached, entry needs a follow, skipping");
                continue;
            }
            if !self.admit(&plan, &mut stats).await {
                self.pause(self.config.filter_wait_ms).await;
                continue;
            }

            let status = engine.go(&plan).await;
            last_status = status;
            state.processed += 1;
            let hard = statuses::HARD_STOPS.contains(&status);
            match status {
                statuses::OK => {
                    stats.entered += 1;
                    tracing::info!(post_id = %plan.post_id, "Entry complete");
                }
                statuses::FLAGGED | statuses::LIKE_FLAGGED => {
                    if !state.flagged {
                        self.notify(
                            "账号异常",
                            &format!("{} 疑似被风控，后续参与可能继续失败", self.account_note),
                        )
                        .await;
                    }
                    state.flagged = true;
                    stats.flagged = true;
                }
                statuses::FOLLOW_CAPPED => {
                    if !state.follow_capped {
                        self.notify(
                            "关注达到上限",
                            &format!("{} 关注数到顶，跳过需要关注的条目", self.account_note),
                        )
                        .await;
                    }
                    state.follow_capped = true;
                    stats.follow_capped = true;
                }
                status if hard => {
                    stats.hard_stop = true;
                    tracing::error!(post_id = %plan.post_id, status, "Hard stop");
                }
                status => {
                    stats.soft_failures += 1;
                    tracing::warn!(post_id = %plan.post_id, status, "Entry failed");
                }
            }
            if !hard {
                if let Err(err) = self.ledger.record(&plan.post_id).await {
                    tracing::error!(post_id = %plan.post_id, %err, "Ledger write failed");
                }
            } else {
                self.notify(
                    "抽奖任务中断",
                    &format!("{} 运行终止，状态 {status}", self.account_note),
                )
                .await;
                break;
            }

            if let Some(cadence) = &self.config.filler_posts {
                if until_filler > 0 {
                    until_filler -= 1;
                    if until_filler == 0 {
                        self.post_fillers(cadence.count.as_slice(), &mut stats).await;
                        until_filler = self.next_filler_gap();
                    }
                }
            }

            self.pause(self.config.entry_wait_ms).await;
        }

        (state.aggregate(last_status), stats)
    }

    async fn resolve_group(&self) -> Option<u64> {
        if self.config.no_tracking_group {
            return None;
        }
        if let Some(id) = self.config.tracking_group_id {
            return Some(id);
        }
        let id = self
            .api
            .ensure_group(&self.config.tracking_group_name, true)
            .await;
        if id.is_none() {
            tracing::warn!("Tracking group unavailable, follows stay ungrouped");
        }
        id
    }

    /// Follow state is read once; entries trust this snapshot for the whole
    /// run rather than re-querying per post.
    async fn follow_snapshot(&self) -> HashSet<u64> {
        match self.api.following().await {
            Ok(uids) => uids.into_iter().collect(),
            Err(err) => {
                tracing::warn!(%err, "Follow snapshot unavailable, assuming none followed");
                HashSet::new()
            }
        }
    }

    async fn collect_plans(
        &self,
        snapshot: &HashSet<u64>,
        stats: &mut RunStats,
    ) -> Vec<EntryPlan> {
        let discovery = Discovery::new(self.api);
        let pipeline = FilterPipeline {
            api: self.api,
            ledger: self.ledger,
            config: self.config,
            clock: self.clock,
            follow_snapshot: snapshot,
        };
        let mut plans = Vec::new();
        for mode in &self.config.discovery {
            let batch = match discovery.discover(mode).await {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::warn!(mode = %mode.label(), %err, "Discovery failed, skipping source");
                    continue;
                }
            };
            for candidate in pipeline.run(mode, batch, stats).await {
                plans.push(build_plan(&candidate, self.config, snapshot, self.generator).await);
            }
        }
        plans
    }

    /// Gates evaluated just before an entry runs: drawing notice for official
    /// giveaways, follower floor for keyword ones.
    async fn admit(&self, plan: &EntryPlan, stats: &mut RunStats) -> bool {
        if plan.official {
            let notice = self.api.lottery_notice(&plan.post_id).await;
            if notice.ts == LotteryNotice::UNKNOWN {
                // lookup failed; leave it for the next run
                tracing::warn!(post_id = %plan.post_id, "Drawing time unavailable, deferring");
                stats.filtered_out += 1;
                return false;
            }
            let now = self.clock.unix_now();
            let horizon = now + i64::from(self.config.max_drawing_days) * 86_400;
            if notice.ts == LotteryNotice::WITHDRAWN || notice.ts <= now || notice.ts > horizon {
                tracing::info!(post_id = %plan.post_id, ts = notice.ts, "Drawing gone or out of range");
                stats.filtered_out += 1;
                self.record_skip(&plan.post_id).await;
                return false;
            }
        } else if self.config.min_followers > 0 {
            let count = self.api.follower_count(plan.author_id).await;
            if count < 0 {
                tracing::warn!(author = plan.author_id, "Follower count unavailable, deferring");
                stats.filtered_out += 1;
                return false;
            }
            if count < self.config.min_followers {
                tracing::info!(
                    author = plan.author_id,
                    count,
                    "Author below the follower floor"
                );
                stats.filtered_out += 1;
                self.record_skip(&plan.post_id).await;
                return false;
            }
        }
        true
    }

    /// Skips that are final for this post still go into the ledger so later
    /// runs do not re-evaluate it.
    async fn record_skip(&self, post_id: &str) {
        if let Err(err) = self.ledger.record(post_id).await {
            tracing::error!(post_id, %err, "Ledger write failed");
        }
    }

    fn next_filler_gap(&self) -> u32 {
        self.config
            .filler_posts
            .as_ref()
            .and_then(|cadence| cadence.every.choose(&mut rand::rng()).copied())
            .unwrap_or(0)
    }

    /// Dilute the account's feed with ordinary shares between entries.
    async fn post_fillers(&self, counts: &[u32], stats: &mut RunStats) {
        let wanted = counts.choose(&mut rand::rng()).copied().unwrap_or(1) as usize;
        let feed = self.api.recommended_feed().await;
        for video in feed.choose_multiple(&mut rand::rng(), wanted) {
            let outcome = self
                .api
                .share_video(video.author_id, &video.video_id.to_string())
                .await;
            tracing::debug!(video = video.video_id, ?outcome, "Filler share");
            stats.filler_posts += 1;
        }
    }

    async fn notify(&self, title: &str, body: &str) {
        if let Some(notifier) = self.notifier {
            notifier.notify(title, body).await;
        }
    }

    async fn pause(&self, base_ms: u64) {
        if base_ms == 0 {
            return;
        }
        let factor: f64 = rand::rng().random_range(0.5..1.5);
        let wait = (base_ms as f64 * factor) as u64;
        tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
    }
}
