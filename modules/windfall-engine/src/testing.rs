//! Deterministic collaborators for tests.
//!
//! `MockPlatform` is a scriptable `PlatformApi`: every call is appended to a
//! log, and outcome queues let a test hand back a different result per call.
//! Queues fall back to the success outcome once drained.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use windfall_common::{CandidatePost, CommentChannel, EntryPlan, PostKind};
use windfall_platform::{
    CommentImage, CommentOutcome, FetchedPost, FollowOutcome, LikeOutcome, LotteryNotice,
    MentionItem, MyInfo, RecommendedVideo, ReplyItem, RepostOutcome, UnreadCounts,
};

use crate::traits::{ChallengeSolver, Notifier, PlatformApi, TextGenerator};

#[derive(Default)]
pub struct MockPlatform {
    pub posts: HashMap<String, FetchedPost>,
    pub follower_counts: HashMap<u64, i64>,
    pub already_following: Vec<u64>,
    pub comments_under_post: Vec<(String, String)>,
    pub notices: HashMap<String, i64>,
    pub group_id: Option<u64>,
    pub move_fails: bool,
    pub reserve_fails: bool,
    pub recommended: Vec<RecommendedVideo>,
    pub unread: UnreadCounts,
    pub mentions: Vec<MentionItem>,
    pub replies: Vec<ReplyItem>,
    pub feed_posts: Vec<FetchedPost>,
    pub article_ids: Vec<u64>,
    pub article_pages: HashMap<u64, String>,

    follow_script: Mutex<VecDeque<FollowOutcome>>,
    like_script: Mutex<VecDeque<LikeOutcome>>,
    repost_script: Mutex<VecDeque<RepostOutcome>>,
    comment_script: Mutex<VecDeque<CommentOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_post(mut self, post: FetchedPost) -> Self {
        self.posts.insert(post.post_id.clone(), post);
        self
    }

    pub fn with_follower_count(mut self, uid: u64, count: i64) -> Self {
        self.follower_counts.insert(uid, count);
        self
    }

    pub fn with_notice(mut self, post_id: &str, ts: i64) -> Self {
        self.notices.insert(post_id.to_string(), ts);
        self
    }

    pub fn with_group(mut self, id: u64) -> Self {
        self.group_id = Some(id);
        self
    }

    /// Queue outcomes for successive `follow` calls; `Followed` once drained.
    pub fn script_follow(self, outcomes: Vec<FollowOutcome>) -> Self {
        *lock(&self.follow_script) = outcomes.into();
        self
    }

    pub fn script_like(self, outcomes: Vec<LikeOutcome>) -> Self {
        *lock(&self.like_script) = outcomes.into();
        self
    }

    pub fn script_repost(self, outcomes: Vec<RepostOutcome>) -> Self {
        *lock(&self.repost_script) = outcomes.into();
        self
    }

    pub fn script_comment(self, outcomes: Vec<CommentOutcome>) -> Self {
        *lock(&self.comment_script) = outcomes.into();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn log(&self, call: String) {
        lock(&self.calls).push(call);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn my_info(&self) -> Result<MyInfo> {
        self.log("my_info".into());
        Ok(MyInfo {
            mid: 1,
            name: "tester".into(),
            level: 6,
        })
    }

    async fn fetch_post(&self, post_id: &str) -> Option<FetchedPost> {
        self.log(format!("fetch_post:{post_id}"));
        self.posts.get(post_id).cloned()
    }

    async fn follower_count(&self, uid: u64) -> i64 {
        self.log(format!("follower_count:{uid}"));
        self.follower_counts.get(&uid).copied().unwrap_or(-1)
    }

    async fn follow(&self, uid: u64) -> FollowOutcome {
        self.log(format!("follow:{uid}"));
        lock(&self.follow_script)
            .pop_front()
            .unwrap_or(FollowOutcome::Followed)
    }

    async fn following(&self) -> Result<Vec<u64>> {
        self.log("following".into());
        Ok(self.already_following.clone())
    }

    async fn like(&self, post_id: &str) -> LikeOutcome {
        self.log(format!("like:{post_id}"));
        lock(&self.like_script)
            .pop_front()
            .unwrap_or(LikeOutcome::Liked)
    }

    async fn repost(&self, post_id: &str, content: &str, _ctrl: &str) -> RepostOutcome {
        self.log(format!("repost:{post_id}:{content}"));
        lock(&self.repost_script)
            .pop_front()
            .unwrap_or(RepostOutcome::Reposted)
    }

    async fn share_video(&self, author_id: u64, video_id: &str) -> RepostOutcome {
        self.log(format!("share_video:{author_id}:{video_id}"));
        lock(&self.repost_script)
            .pop_front()
            .unwrap_or(RepostOutcome::Reposted)
    }

    async fn comment(
        &self,
        target: &str,
        channel: u32,
        message: &str,
        captcha: Option<&str>,
        images: &[CommentImage],
    ) -> CommentOutcome {
        self.log(format!(
            "comment:{target}:{channel}:{message}:captcha={}:images={}",
            captcha.unwrap_or("-"),
            images.len()
        ));
        lock(&self.comment_script)
            .pop_front()
            .unwrap_or(CommentOutcome::Posted)
    }

    async fn fetch_comments(&self, target: &str, _channel: u32) -> Vec<(String, String)> {
        self.log(format!("fetch_comments:{target}"));
        self.comments_under_post.clone()
    }

    async fn reserve(&self, reservation_id: &str) -> bool {
        self.log(format!("reserve:{reservation_id}"));
        !self.reserve_fails
    }

    async fn lottery_notice(&self, post_id: &str) -> LotteryNotice {
        self.log(format!("lottery_notice:{post_id}"));
        LotteryNotice {
            ts: self
                .notices
                .get(post_id)
                .copied()
                .unwrap_or(LotteryNotice::UNKNOWN),
        }
    }

    async fn ensure_group(&self, name: &str, create_if_missing: bool) -> Option<u64> {
        self.log(format!("ensure_group:{name}:{create_if_missing}"));
        self.group_id
    }

    async fn move_to_group(&self, uid: u64, group_id: u64) -> bool {
        self.log(format!("move_to_group:{uid}:{group_id}"));
        !self.move_fails
    }

    async fn recommended_feed(&self) -> Vec<RecommendedVideo> {
        self.log("recommended_feed".into());
        self.recommended.clone()
    }

    async fn unread_counts(&self) -> Result<UnreadCounts> {
        self.log("unread_counts".into());
        Ok(self.unread)
    }

    async fn mention_feed(&self) -> Result<Vec<MentionItem>> {
        self.log("mention_feed".into());
        Ok(self.mentions.clone())
    }

    async fn reply_feed(&self) -> Result<Vec<ReplyItem>> {
        self.log("reply_feed".into());
        Ok(self.replies.clone())
    }

    async fn author_feed(&self, uid: u64) -> Result<Vec<FetchedPost>> {
        self.log(format!("author_feed:{uid}"));
        Ok(self.feed_posts.clone())
    }

    async fn tag_feed(&self, tag: &str) -> Result<Vec<FetchedPost>> {
        self.log(format!("tag_feed:{tag}"));
        Ok(self.feed_posts.clone())
    }

    async fn search_articles(&self, keyword: &str) -> Result<Vec<u64>> {
        self.log(format!("search_articles:{keyword}"));
        Ok(self.article_ids.clone())
    }

    async fn article_html(&self, article_id: u64) -> Result<String> {
        self.log(format!("article_html:{article_id}"));
        Ok(self
            .article_pages
            .get(&article_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Text generator returning a fixed reply, or failing when none is set.
#[derive(Default)]
pub struct MockGenerator {
    pub reply: Option<String>,
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _description: &str) -> Result<String> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(anyhow::anyhow!("generator unavailable")),
        }
    }
}

/// Solver returning a fixed code.
pub struct MockSolver {
    pub code: String,
}

#[async_trait]
impl ChallengeSolver for MockSolver {
    async fn solve(&self, _image_url: &str) -> Result<String> {
        Ok(self.code.clone())
    }
}

/// Notifier that records instead of delivering.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        lock(&self.messages).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) {
        lock(&self.messages).push((title.to_string(), body.to_string()));
    }
}

/// A plain keyword-style candidate with sensible defaults.
pub fn candidate(post_id: &str, description: &str) -> CandidatePost {
    CandidatePost {
        post_id: post_id.to_string(),
        author_ids: vec![100],
        author_name: "up主".to_string(),
        description: description.to_string(),
        created_at: None,
        already_interacted: false,
        kind: PostKind::Plain,
        official_marker: false,
        reservation_id: None,
        reservation_text: String::new(),
        paid_lottery: false,
        comment_target_id: Some(post_id.to_string()),
        comment_channel: Some(CommentChannel::PlainPost),
        control_spans: Vec::new(),
        discovered_via: "test".to_string(),
    }
}

/// A minimal resolved plan for the given post.
pub fn entry_plan(post_id: &str) -> EntryPlan {
    EntryPlan {
        post_id: post_id.to_string(),
        author_id: 100,
        follow_targets: vec![100],
        repost_text: "转发动态".to_string(),
        control_spans: Vec::new(),
        comment_target_id: Some(post_id.to_string()),
        comment_channel: Some(CommentChannel::PlainPost),
        comment_text: Some("好运来".to_string()),
        comment_images: Vec::new(),
        official: false,
        kind: PostKind::Plain,
        share_target: None,
        author_name: "up主".to_string(),
    }
}
