pub mod api;
pub mod client;
pub mod error;
pub mod line;
pub mod outcome;
pub mod types;

pub use client::PlatformClient;
pub use error::{PlatformError, Result};
pub use line::{LineVerdict, RequestLine};
pub use outcome::{CommentOutcome, FollowOutcome, LikeOutcome, RepostOutcome};
pub use types::{
    AccountStat, CommentImage, FetchedPost, LotteryNotice, MentionItem, MyInfo,
    RecommendedVideo, ReplyItem, UnreadCounts,
};
