//! Per-operation outcomes.
//!
//! The platform answers every write with a numeric code. Each operation maps
//! its known codes onto a small enum; anything unrecognized collapses to
//! `Unknown`. `detail()` gives the stable small integer the campaign layer
//! folds into its per-entry status (operation base + detail).

/// Result of posting a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    Posted,
    Unknown,
    SourceDeleted,
    CommentsClosed,
    /// The platform demanded a captcha; carries the challenge image URL.
    NeedCaptcha(String),
    Blocklisted,
    BlacklistRestricted,
    CommentsOff,
    Sensitive,
    Duplicate,
    NotLoggedIn,
    FollowAgeRequired,
    WrongCaptcha,
}

impl CommentOutcome {
    pub fn from_code(code: i64, captcha_url: Option<String>) -> Self {
        match code {
            0 => Self::Posted,
            -404 => Self::SourceDeleted,
            12002 => Self::CommentsClosed,
            12015 => Self::NeedCaptcha(captcha_url.unwrap_or_default()),
            12035 => Self::Blocklisted,
            12053 => Self::BlacklistRestricted,
            12061 => Self::CommentsOff,
            12016 => Self::Sensitive,
            12051 => Self::Duplicate,
            -101 => Self::NotLoggedIn,
            12078 => Self::FollowAgeRequired,
            12073 => Self::WrongCaptcha,
            _ => Self::Unknown,
        }
    }

    pub fn detail(&self) -> u32 {
        match self {
            Self::Posted => 0,
            Self::Unknown => 1,
            Self::SourceDeleted => 2,
            Self::CommentsClosed => 3,
            Self::NeedCaptcha(_) => 4,
            Self::Blocklisted => 5,
            Self::BlacklistRestricted => 6,
            Self::CommentsOff => 7,
            Self::Sensitive => 8,
            Self::Duplicate => 9,
            Self::NotLoggedIn => 10,
            Self::FollowAgeRequired => 11,
            Self::WrongCaptcha => 12,
        }
    }
}

/// Result of a follow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    Unknown,
    BlockedByTarget,
    BlacklistRestricted,
    AccountFlagged,
    CapReached,
    AlreadyFollowing,
}

impl FollowOutcome {
    pub fn detail(&self) -> u32 {
        match self {
            Self::Followed => 0,
            Self::Unknown => 1,
            Self::BlockedByTarget => 2,
            Self::BlacklistRestricted => 3,
            Self::AccountFlagged => 4,
            Self::CapReached => 5,
            Self::AlreadyFollowing => 6,
        }
    }
}

/// Result of a thumbs-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked,
    Unknown,
    Anomaly,
    RateLimited,
    AlreadyLiked,
    AccountFlagged,
}

impl LikeOutcome {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Liked,
            1000113 => Self::Anomaly,
            1000001 => Self::RateLimited,
            65006 => Self::AlreadyLiked,
            4128014 => Self::AccountFlagged,
            _ => Self::Unknown,
        }
    }

    pub fn detail(&self) -> u32 {
        match self {
            Self::Liked => 0,
            Self::Unknown => 1,
            Self::Anomaly => 2,
            Self::RateLimited => 3,
            Self::AlreadyLiked => 4,
            Self::AccountFlagged => 5,
        }
    }
}

/// Result of a repost (or a video share).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepostOutcome {
    Reposted,
    Unknown,
    NotShareable,
    TransientError,
    RateLimited,
    SourceForbids,
}

impl RepostOutcome {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Reposted,
            1101004 => Self::NotShareable,
            2201116 => Self::TransientError,
            1101008 => Self::RateLimited,
            4126117 => Self::SourceForbids,
            _ => Self::Unknown,
        }
    }

    pub fn detail(&self) -> u32 {
        match self {
            Self::Reposted => 0,
            Self::Unknown => 1,
            Self::NotShareable => 2,
            Self::TransientError => 3,
            Self::RateLimited => 4,
            Self::SourceForbids => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_codes_map_to_outcomes() {
        assert_eq!(CommentOutcome::from_code(0, None), CommentOutcome::Posted);
        assert_eq!(
            CommentOutcome::from_code(12015, Some("https://example/captcha.jpg".into())),
            CommentOutcome::NeedCaptcha("https://example/captcha.jpg".into())
        );
        assert_eq!(CommentOutcome::from_code(12051, None), CommentOutcome::Duplicate);
        assert_eq!(CommentOutcome::from_code(99999, None), CommentOutcome::Unknown);
        assert_eq!(CommentOutcome::Duplicate.detail(), 9);
        assert_eq!(CommentOutcome::Sensitive.detail(), 8);
    }

    #[test]
    fn like_and_repost_codes_map_to_outcomes() {
        assert_eq!(LikeOutcome::from_code(65006), LikeOutcome::AlreadyLiked);
        assert_eq!(LikeOutcome::from_code(1000001), LikeOutcome::RateLimited);
        assert_eq!(RepostOutcome::from_code(4126117), RepostOutcome::SourceForbids);
        assert_eq!(RepostOutcome::from_code(1101008).detail(), 4);
    }
}
