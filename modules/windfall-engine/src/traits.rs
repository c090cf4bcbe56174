// Trait abstractions for the campaign's collaborators.
//
// PlatformApi is the narrow platform surface the engine consumes; the
// reqwest-backed PlatformClient implements it below. TextGenerator,
// ChallengeSolver and Notifier wrap the side services. All four have
// deterministic mocks in `testing`, so the pipeline, action engine and
// orchestrator run under `cargo test` without touching the network.

use anyhow::Result;
use async_trait::async_trait;

use windfall_platform::{
    CommentImage, CommentOutcome, FetchedPost, FollowOutcome, LikeOutcome, LotteryNotice,
    MentionItem, MyInfo, PlatformClient, RecommendedVideo, ReplyItem, RepostOutcome,
    UnreadCounts,
};

#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Login-health probe; an error means the credential is unusable.
    async fn my_info(&self) -> Result<MyInfo>;

    /// Fetch one post, `None` when unavailable.
    async fn fetch_post(&self, post_id: &str) -> Option<FetchedPost>;

    /// Follower count of a user, -1 when unavailable.
    async fn follower_count(&self, uid: u64) -> i64;

    async fn follow(&self, uid: u64) -> FollowOutcome;

    /// Uids the account currently follows.
    async fn following(&self) -> Result<Vec<u64>>;

    async fn like(&self, post_id: &str) -> LikeOutcome;

    async fn repost(&self, post_id: &str, content: &str, ctrl: &str) -> RepostOutcome;

    async fn share_video(&self, author_id: u64, video_id: &str) -> RepostOutcome;

    async fn comment(
        &self,
        target: &str,
        channel: u32,
        message: &str,
        captcha: Option<&str>,
        images: &[CommentImage],
    ) -> CommentOutcome;

    /// Existing comments under a post, excluding the author's own.
    async fn fetch_comments(&self, target: &str, channel: u32) -> Vec<(String, String)>;

    /// Register a reservation; re-registering counts as success.
    async fn reserve(&self, reservation_id: &str) -> bool;

    async fn lottery_notice(&self, post_id: &str) -> LotteryNotice;

    /// Find or create the follow group used for campaign follows.
    async fn ensure_group(&self, name: &str, create_if_missing: bool) -> Option<u64>;

    async fn move_to_group(&self, uid: u64, group_id: u64) -> bool;

    async fn recommended_feed(&self) -> Vec<RecommendedVideo>;

    async fn unread_counts(&self) -> Result<UnreadCounts>;

    async fn mention_feed(&self) -> Result<Vec<MentionItem>>;

    async fn reply_feed(&self) -> Result<Vec<ReplyItem>>;

    /// Latest posts on a user's feed.
    async fn author_feed(&self, uid: u64) -> Result<Vec<FetchedPost>>;

    /// Latest posts under a topic tag.
    async fn tag_feed(&self, tag: &str) -> Result<Vec<FetchedPost>>;

    /// Article ids matching a keyword, newest first.
    async fn search_articles(&self, keyword: &str) -> Result<Vec<u64>>;

    /// Raw article page; mined for referenced post ids.
    async fn article_html(&self, article_id: u64) -> Result<String>;
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn my_info(&self) -> Result<MyInfo> {
        Ok(self.my_info().await?)
    }

    async fn fetch_post(&self, post_id: &str) -> Option<FetchedPost> {
        self.fetch_post(post_id).await
    }

    async fn follower_count(&self, uid: u64) -> i64 {
        self.follower_count(uid).await
    }

    async fn follow(&self, uid: u64) -> FollowOutcome {
        self.follow(uid).await
    }

    async fn following(&self) -> Result<Vec<u64>> {
        Ok(self.following().await?)
    }

    async fn like(&self, post_id: &str) -> LikeOutcome {
        self.like(post_id).await
    }

    async fn repost(&self, post_id: &str, content: &str, ctrl: &str) -> RepostOutcome {
        self.repost(post_id, content, ctrl).await
    }

    async fn share_video(&self, author_id: u64, video_id: &str) -> RepostOutcome {
        self.share_video(author_id, video_id).await
    }

    async fn comment(
        &self,
        target: &str,
        channel: u32,
        message: &str,
        captcha: Option<&str>,
        images: &[CommentImage],
    ) -> CommentOutcome {
        self.comment(target, channel, message, captcha, images).await
    }

    async fn fetch_comments(&self, target: &str, channel: u32) -> Vec<(String, String)> {
        self.fetch_comments(target, channel).await
    }

    async fn reserve(&self, reservation_id: &str) -> bool {
        self.reserve(reservation_id).await
    }

    async fn lottery_notice(&self, post_id: &str) -> LotteryNotice {
        self.lottery_notice(post_id).await
    }

    async fn ensure_group(&self, name: &str, create_if_missing: bool) -> Option<u64> {
        self.ensure_group(name, create_if_missing).await
    }

    async fn move_to_group(&self, uid: u64, group_id: u64) -> bool {
        self.move_to_group(uid, group_id).await
    }

    async fn recommended_feed(&self) -> Vec<RecommendedVideo> {
        self.recommended_feed().await
    }

    async fn unread_counts(&self) -> Result<UnreadCounts> {
        Ok(self.unread_counts().await?)
    }

    async fn mention_feed(&self) -> Result<Vec<MentionItem>> {
        Ok(self.mention_feed().await?)
    }

    async fn reply_feed(&self) -> Result<Vec<ReplyItem>> {
        Ok(self.reply_feed().await?)
    }

    async fn author_feed(&self, uid: u64) -> Result<Vec<FetchedPost>> {
        Ok(self.author_feed(uid).await?)
    }

    async fn tag_feed(&self, tag: &str) -> Result<Vec<FetchedPost>> {
        Ok(self.tag_feed(tag).await?)
    }

    async fn search_articles(&self, keyword: &str) -> Result<Vec<u64>> {
        Ok(self.search_articles(keyword).await?)
    }

    async fn article_html(&self, article_id: u64) -> Result<String> {
        Ok(self.article_html(article_id).await?)
    }
}

// ---------------------------------------------------------------------------
// Side services
// ---------------------------------------------------------------------------

/// Produces a short comment for a giveaway description.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, description: &str) -> Result<String>;
}

/// Chat-completions backed generator with a fixed system prompt.
pub struct AiCommenter {
    client: llm_client::LlmClient,
    prompt: String,
}

impl AiCommenter {
    pub fn new(client: llm_client::LlmClient, prompt: String) -> Self {
        Self { client, prompt }
    }
}

#[async_trait]
impl TextGenerator for AiCommenter {
    async fn generate(&self, description: &str) -> Result<String> {
        self.client.complete(&self.prompt, description).await
    }
}

/// Solves a captcha challenge image into its code.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    async fn solve(&self, image_url: &str) -> Result<String>;
}

#[async_trait]
impl ChallengeSolver for ocr_client::OcrClient {
    async fn solve(&self, image_url: &str) -> Result<String> {
        Ok(self.recognize(image_url).await?)
    }
}

/// Best-effort outbound notification. Implementations must swallow their
/// own delivery failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str);
}

#[async_trait]
impl Notifier for push_client::PushClient {
    async fn notify(&self, title: &str, body: &str) {
        self.push(title, body).await;
    }
}
