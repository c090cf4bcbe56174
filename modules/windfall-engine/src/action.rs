//! The action engine: executes one [`EntryPlan`] against the platform.
//!
//! Four strictly sequential steps (comment, follow, like, repost); the first
//! failing step ends the entry with its operation base plus the outcome
//! detail. Zero means the entry went through every applicable step.

use rand::seq::IndexedRandom;

use windfall_common::{CampaignConfig, EntryPlan, PostKind};
use windfall_platform::{
    CommentImage, CommentOutcome, FollowOutcome, LikeOutcome, RepostOutcome,
};

use crate::state::statuses;
use crate::traits::{ChallengeSolver, PlatformApi};

const LIKE_ATTEMPTS: u32 = 5;
const REPOST_ATTEMPTS: u32 = 5;
/// Posted when the platform rejects the comment as duplicate or sensitive.
const FALLBACK_COMMENT: &str = "接好运";

pub struct ActionEngine<'a> {
    pub api: &'a dyn PlatformApi,
    pub solver: Option<&'a dyn ChallengeSolver>,
    pub config: &'a CampaignConfig,
    /// Tracking group freshly-followed authors land in, when resolved.
    pub group_id: Option<u64>,
    /// Wait between retries of a rate-limited step.
    pub retry_wait_ms: u64,
}

impl ActionEngine<'_> {
    pub async fn go(&self, plan: &EntryPlan) -> u32 {
        if self.config.dry_run {
            tracing::info!(post_id = %plan.post_id, "Dry run, entry skipped");
            return statuses::OK;
        }

        let wants_comment = plan.comment_text.is_some() || self.config.copy_comment;
        if wants_comment {
            if let (Some(target), Some(channel)) =
                (&plan.comment_target_id, plan.comment_channel)
            {
                let status = self.comment_step(plan, target, channel.code()).await;
                if status != statuses::OK {
                    return status;
                }
            }
        }

        let status = self.follow_step(plan).await;
        if status != statuses::OK {
            return status;
        }

        let status = self.like_step(plan).await;
        if status != statuses::OK {
            return status;
        }

        self.repost_step(plan).await
    }

    async fn comment_step(&self, plan: &EntryPlan, target: &str, channel: u32) -> u32 {
        let mut message = match self.resolve_message(plan, target, channel).await {
            Some(message) => message,
            None => return statuses::OK,
        };
        if self.config.repost_then_comment {
            message.push_str(&plan.repost_text);
        }

        let mut images: Vec<CommentImage> = plan
            .comment_images
            .iter()
            .map(|url| CommentImage {
                img_src: url.clone(),
            })
            .collect();
        let mut captcha: Option<String> = None;
        let mut captcha_attempts = 0;
        let mut fallback_sent = false;

        loop {
            let outcome = self
                .api
                .comment(target, channel, &message, captcha.as_deref(), &images)
                .await;
            let detail = outcome.detail();
            match outcome {
                CommentOutcome::Posted => return statuses::OK,
                CommentOutcome::NeedCaptcha(url) => {
                    captcha_attempts += 1;
                    if captcha_attempts > self.config.max_captcha_attempts {
                        tracing::warn!(target, "Captcha attempts exhausted");
                        return statuses::COMMENT_BASE + detail;
                    }
                    let solver = match self.solver {
                        Some(solver) => solver,
                        None => {
                            tracing::warn!(target, "Captcha demanded but no solver configured");
                            return statuses::COMMENT_BASE + detail;
                        }
                    };
                    match solver.solve(&url).await {
                        Ok(code) => {
                            tracing::info!(target, "Captcha solved, resending comment");
                            captcha = Some(code);
                        }
                        Err(err) => {
                            tracing::warn!(target, %err, "Captcha solve failed");
                            return statuses::COMMENT_BASE + detail;
                        }
                    }
                }
                CommentOutcome::Sensitive | CommentOutcome::Duplicate if !fallback_sent => {
                    tracing::info!(
                        target,
                        ?outcome,
                        "Comment rejected, retrying once with the fallback text"
                    );
                    fallback_sent = true;
                    message = FALLBACK_COMMENT.to_string();
                    images.clear();
                    captcha = None;
                }
                outcome => {
                    tracing::warn!(target, ?outcome, "Comment failed");
                    return statuses::COMMENT_BASE + detail;
                }
            }
        }
    }

    /// Comment text for the entry. Copy mode cribs a clean comment from the
    /// post's own thread; fall back to the resolved plan text.
    async fn resolve_message(
        &self,
        plan: &EntryPlan,
        target: &str,
        channel: u32,
    ) -> Option<String> {
        if self.config.copy_comment {
            let candidates: Vec<String> = self
                .api
                .fetch_comments(target, channel)
                .await
                .into_iter()
                .map(|(_, message)| message)
                .filter(|message| {
                    !message.contains('@')
                        && !self
                            .config
                            .copy_blockwords
                            .iter()
                            .any(|word| message.contains(word.as_str()))
                })
                .collect();
            if let Some(copied) = candidates.choose(&mut rand::rng()) {
                return Some(copied.replace("{uname}", &plan.author_name));
            }
            tracing::debug!(target, "No comment worth copying, using the plan text");
        }
        plan.comment_text.clone()
    }

    async fn follow_step(&self, plan: &EntryPlan) -> u32 {
        for &uid in &plan.follow_targets {
            let outcome = self.api.follow(uid).await;
            match outcome {
                FollowOutcome::Followed => {
                    if self.config.no_tracking_group {
                        continue;
                    }
                    if let Some(group_id) = self.group_id {
                        if !self.api.move_to_group(uid, group_id).await {
                            tracing::warn!(uid, group_id, "Tracking group move failed");
                            return statuses::GROUP_MOVE_FAILED;
                        }
                    }
                }
                FollowOutcome::AlreadyFollowing => {}
                outcome => {
                    tracing::warn!(uid, ?outcome, "Follow failed");
                    return statuses::FOLLOW_BASE + outcome.detail();
                }
            }
        }
        statuses::OK
    }

    async fn like_step(&self, plan: &EntryPlan) -> u32 {
        // likes run only at dup levels 0 and 3; 1 and 2 leave the
        // interaction flag untouched
        if !matches!(self.config.dup_check_level, 0 | 3) {
            return statuses::OK;
        }
        let mut attempt = 1;
        loop {
            let outcome = self.api.like(&plan.post_id).await;
            match outcome {
                LikeOutcome::Liked => return statuses::OK,
                LikeOutcome::RateLimited if attempt < LIKE_ATTEMPTS => {
                    attempt += 1;
                    tracing::debug!(post_id = %plan.post_id, attempt, "Like rate-limited, retrying");
                    self.retry_wait().await;
                }
                outcome => {
                    tracing::warn!(post_id = %plan.post_id, ?outcome, "Like failed");
                    return statuses::LIKE_BASE + outcome.detail();
                }
            }
        }
    }

    async fn repost_step(&self, plan: &EntryPlan) -> u32 {
        let ctrl = serde_json::to_string(&plan.control_spans).unwrap_or_default();
        let mut attempt = 1;
        loop {
            let outcome = match (plan.kind, &plan.share_target) {
                (PostKind::Video, Some((author_id, video_id))) => {
                    self.api.share_video(*author_id, video_id).await
                }
                _ => {
                    self.api
                        .repost(&plan.post_id, &plan.repost_text, &ctrl)
                        .await
                }
            };
            match outcome {
                RepostOutcome::Reposted => return statuses::OK,
                RepostOutcome::RateLimited | RepostOutcome::TransientError
                    if attempt < REPOST_ATTEMPTS =>
                {
                    attempt += 1;
                    tracing::debug!(post_id = %plan.post_id, attempt, "Repost retrying");
                    self.retry_wait().await;
                }
                outcome => {
                    tracing::warn!(post_id = %plan.post_id, ?outcome, "Repost failed");
                    return statuses::REPOST_BASE + outcome.detail();
                }
            }
        }
    }

    async fn retry_wait(&self) {
        if self.retry_wait_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.retry_wait_ms)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entry_plan, MockPlatform, MockSolver};

    fn engine<'a>(api: &'a MockPlatform, config: &'a CampaignConfig) -> ActionEngine<'a> {
        ActionEngine {
            api,
            solver: None,
            config,
            group_id: Some(55),
            retry_wait_ms: 0,
        }
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let api = MockPlatform::new();
        let config = CampaignConfig {
            dry_run: true,
            ..CampaignConfig::default()
        };
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 0);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn full_entry_runs_all_four_steps() {
        let api = MockPlatform::new();
        let config = CampaignConfig::default();
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 0);

        assert_eq!(api.call_count("comment:"), 1);
        assert_eq!(api.call_count("follow:100"), 1);
        assert_eq!(api.call_count("move_to_group:100:55"), 1);
        assert_eq!(api.call_count("like:1"), 1);
        assert_eq!(api.call_count("repost:1"), 1);
    }

    #[tokio::test]
    async fn duplicate_comment_falls_back_once_without_images_then_proceeds() {
        let api = MockPlatform::new().script_comment(vec![CommentOutcome::Duplicate]);
        let config = CampaignConfig::default();

        let mut plan = entry_plan("1");
        plan.comment_images = vec!["https://example/img.jpg".into()];
        assert_eq!(engine(&api, &config).go(&plan).await, 0);

        let comments: Vec<String> = api
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("comment:"))
            .collect();
        assert_eq!(comments.len(), 2);
        assert!(comments[0].ends_with("images=1"));
        assert!(comments[1].contains(FALLBACK_COMMENT));
        assert!(comments[1].ends_with("images=0"));
        // the entry still went through
        assert_eq!(api.call_count("repost:"), 1);
    }

    #[tokio::test]
    async fn second_duplicate_rejection_ends_the_entry() {
        let api = MockPlatform::new()
            .script_comment(vec![CommentOutcome::Duplicate, CommentOutcome::Duplicate]);
        let config = CampaignConfig::default();
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 1009);
        assert_eq!(api.call_count("follow:"), 0);
    }

    #[tokio::test]
    async fn captcha_is_solved_and_resent() {
        let api = MockPlatform::new().script_comment(vec![CommentOutcome::NeedCaptcha(
            "https://example/challenge.jpg".into(),
        )]);
        let config = CampaignConfig::default();
        let solver = MockSolver {
            code: "A7K2".into(),
        };
        let mut engine = engine(&api, &config);
        engine.solver = Some(&solver);

        assert_eq!(engine.go(&entry_plan("1")).await, 0);
        let comments: Vec<String> = api
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("comment:"))
            .collect();
        assert_eq!(comments.len(), 2);
        assert!(comments[0].contains("captcha=-"));
        assert!(comments[1].contains("captcha=A7K2"));
    }

    #[tokio::test]
    async fn captcha_without_a_solver_fails_the_comment() {
        let api = MockPlatform::new().script_comment(vec![CommentOutcome::NeedCaptcha(
            "https://example/challenge.jpg".into(),
        )]);
        let config = CampaignConfig::default();
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 1004);
    }

    #[tokio::test]
    async fn group_move_failure_maps_to_its_own_status() {
        let mut api = MockPlatform::new();
        api.move_fails = true;
        let config = CampaignConfig::default();
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 3001);
    }

    #[tokio::test]
    async fn already_following_counts_as_success() {
        let api = MockPlatform::new().script_follow(vec![FollowOutcome::AlreadyFollowing]);
        let config = CampaignConfig::default();
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 0);
        assert_eq!(api.call_count("move_to_group:"), 0);
    }

    #[tokio::test]
    async fn rate_limited_like_is_retried() {
        let api = MockPlatform::new()
            .script_like(vec![LikeOutcome::RateLimited, LikeOutcome::RateLimited]);
        let config = CampaignConfig::default();
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 0);
        assert_eq!(api.call_count("like:"), 3);
    }

    #[tokio::test]
    async fn like_runs_only_at_dup_levels_zero_and_three() {
        for (level, liked) in [(0u8, 1), (1, 0), (2, 0), (3, 1)] {
            let api = MockPlatform::new();
            let config = CampaignConfig {
                dup_check_level: level,
                ..CampaignConfig::default()
            };
            assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 0);
            assert_eq!(api.call_count("like:"), liked, "level {level}");
            assert_eq!(api.call_count("repost:"), 1, "level {level}");
        }
    }

    #[tokio::test]
    async fn video_plans_use_the_share_operation() {
        let api = MockPlatform::new();
        let config = CampaignConfig::default();
        let mut plan = entry_plan("1");
        plan.kind = PostKind::Video;
        plan.share_target = Some((100, "170001".into()));
        assert_eq!(engine(&api, &config).go(&plan).await, 0);
        assert_eq!(api.call_count("share_video:100:170001"), 1);
        assert_eq!(api.call_count("repost:"), 0);
    }

    #[tokio::test]
    async fn repost_failure_reports_base_plus_detail() {
        let api = MockPlatform::new().script_repost(vec![RepostOutcome::SourceForbids]);
        let config = CampaignConfig::default();
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 5005);
    }

    #[tokio::test]
    async fn copied_comments_skip_mentions_and_blockwords() {
        let mut api = MockPlatform::new();
        api.comments_under_post = vec![
            ("路人甲".into(), "@某人 来看".into()),
            ("路人乙".into(), "万一中了呢".into()),
        ];
        let config = CampaignConfig {
            copy_comment: true,
            ..CampaignConfig::default()
        };
        assert_eq!(engine(&api, &config).go(&entry_plan("1")).await, 0);
        let comment = api
            .calls()
            .into_iter()
            .find(|c| c.starts_with("comment:"))
            .unwrap();
        assert!(comment.contains("万一中了呢"));
    }
}
