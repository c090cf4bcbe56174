use serde::{Deserialize, Serialize};

/// Wire numbering for post kinds, as the platform reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostKind {
    Repost,
    Image,
    Plain,
    Video,
    Article,
    Other(u32),
}

impl PostKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => PostKind::Repost,
            2 => PostKind::Image,
            4 => PostKind::Plain,
            8 => PostKind::Video,
            64 => PostKind::Article,
            other => PostKind::Other(other),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            PostKind::Repost => 1,
            PostKind::Image => 2,
            PostKind::Plain => 4,
            PostKind::Video => 8,
            PostKind::Article => 64,
            PostKind::Other(code) => *code,
        }
    }
}

/// Comment channel selector the reply endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentChannel {
    Video,
    ImagePost,
    PlainPost,
}

impl CommentChannel {
    pub fn code(&self) -> u32 {
        match self {
            CommentChannel::Video => 1,
            CommentChannel::ImagePost => 11,
            CommentChannel::PlainPost => 17,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(CommentChannel::Video),
            11 => Some(CommentChannel::ImagePost),
            17 => Some(CommentChannel::PlainPost),
            _ => None,
        }
    }
}

/// Position-annotated @-mention metadata. `location` and `length` are
/// measured in chars of the final repost text; the platform links the
/// mention from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSpan {
    pub data: String,
    pub location: usize,
    pub length: usize,
    #[serde(rename = "type")]
    pub span_type: u8,
}

impl ControlSpan {
    pub fn mention(author_id: u64, location: usize, length: usize) -> Self {
        Self {
            data: author_id.to_string(),
            location,
            length,
            span_type: 1,
        }
    }
}

/// How a batch of candidates was discovered. Each variant maps to one
/// discovery adapter; `Direct` bypasses discovery and names posts outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryMode {
    ByAuthor(u64),
    ByTag(String),
    ByArticle(String),
    ByApi(String),
    ByList(String),
    Direct(Vec<String>),
}

impl DiscoveryMode {
    /// Direct-target mode skips the ledger pre-check and the side-channel
    /// export; external-API batches skip the export only.
    pub fn is_direct(&self) -> bool {
        matches!(self, DiscoveryMode::Direct(_))
    }

    pub fn is_external_api(&self) -> bool {
        matches!(self, DiscoveryMode::ByApi(_))
    }

    pub fn label(&self) -> String {
        match self {
            DiscoveryMode::ByAuthor(id) => format!("author:{id}"),
            DiscoveryMode::ByTag(tag) => format!("tag:{tag}"),
            DiscoveryMode::ByArticle(kw) => format!("article:{kw}"),
            DiscoveryMode::ByApi(url) => format!("api:{url}"),
            DiscoveryMode::ByList(path) => format!("list:{path}"),
            DiscoveryMode::Direct(ids) => format!("direct:{}", ids.len()),
        }
    }
}

/// A discovered post under evaluation as a possible giveaway.
///
/// `author_ids[0]` is the posting author; `author_ids[1]`, when present, is
/// the origin author of a reposted post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePost {
    pub post_id: String,
    pub author_ids: Vec<u64>,
    pub author_name: String,
    pub description: String,
    pub created_at: Option<i64>,
    pub already_interacted: bool,
    pub kind: PostKind,
    pub official_marker: bool,
    #[serde(default)]
    pub reservation_id: Option<String>,
    #[serde(default)]
    pub reservation_text: String,
    #[serde(default)]
    pub paid_lottery: bool,
    #[serde(default)]
    pub comment_target_id: Option<String>,
    #[serde(default)]
    pub comment_channel: Option<CommentChannel>,
    #[serde(default)]
    pub control_spans: Vec<ControlSpan>,
    /// Set by the adapter that produced this candidate.
    pub discovered_via: String,
}

impl CandidatePost {
    pub fn primary_author(&self) -> Option<u64> {
        self.author_ids.first().copied()
    }

    pub fn origin_author(&self) -> Option<u64> {
        self.author_ids.get(1).copied()
    }

    pub fn permalink(&self) -> String {
        format!("https://t.bilibili.com/{}", self.post_id)
    }
}

/// A candidate that passed filtering, with every action parameter resolved.
/// Consumed once by the action engine.
#[derive(Debug, Clone)]
pub struct EntryPlan {
    pub post_id: String,
    /// Posting author, for the min-follower gate.
    pub author_id: u64,
    /// Authors absent from the follow snapshot taken at campaign start.
    /// Never re-checked mid-run; stale-but-safe.
    pub follow_targets: Vec<u64>,
    pub repost_text: String,
    pub control_spans: Vec<ControlSpan>,
    pub comment_target_id: Option<String>,
    pub comment_channel: Option<CommentChannel>,
    pub comment_text: Option<String>,
    pub comment_images: Vec<String>,
    pub official: bool,
    pub kind: PostKind,
    /// `(author_id, video_id)` when the post is a video; the entry shares
    /// the video instead of reposting the post.
    pub share_target: Option<(u64, String)>,
    pub author_name: String,
}
