//! Win-notice check: scan the account's mention and reply feeds for
//! giveaway results and push a digest to the operator.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::DateTime;
use tokio::io::AsyncWriteExt;

use windfall_common::Clock;
use windfall_platform::{MentionItem, ReplyItem};

use crate::traits::{Notifier, PlatformApi};

pub struct WinnerCheck<'a> {
    pub api: &'a dyn PlatformApi,
    pub notifier: Option<&'a dyn Notifier>,
    pub clock: &'a dyn Clock,
    /// A reply counts as a possible win notice when it contains any of these.
    pub notice_keywords: &'a [String],
    /// Digest archive, appended per check.
    pub log_path: PathBuf,
}

impl<'a> WinnerCheck<'a> {
    pub fn new(
        api: &'a dyn PlatformApi,
        notifier: Option<&'a dyn Notifier>,
        clock: &'a dyn Clock,
        notice_keywords: &'a [String],
        data_dir: &Path,
        account: u32,
    ) -> Self {
        Self {
            api,
            notifier,
            clock,
            notice_keywords,
            log_path: data_dir.join(format!("prizes-{account}.md")),
        }
    }

    /// Returns the digest when there is anything worth reporting.
    pub async fn run(&self, account_note: &str) -> Result<Option<String>> {
        let unread = self.api.unread_counts().await?;
        let mentions = self.api.mention_feed().await?;
        let replies = self.api.reply_feed().await?;
        let notices: Vec<&ReplyItem> = replies
            .iter()
            .filter(|reply| {
                self.notice_keywords
                    .iter()
                    .any(|keyword| reply.source.contains(keyword.as_str()))
            })
            .collect();

        if mentions.is_empty() && notices.is_empty() {
            tracing::info!(
                unread_at = unread.at,
                unread_reply = unread.reply,
                "No win notices"
            );
            return Ok(None);
        }

        let digest = self.render(account_note, &mentions, &notices, unread.at, unread.reply);
        if let Some(notifier) = self.notifier {
            notifier.notify("可能中奖了", &digest).await;
        }
        self.append_log(&digest).await;
        Ok(Some(digest))
    }

    fn render(
        &self,
        account_note: &str,
        mentions: &[MentionItem],
        notices: &[&ReplyItem],
        unread_at: u64,
        unread_reply: u64,
    ) -> String {
        let mut out = format!(
            "## 中奖检查 {} ({account_note})\n未读 @ {unread_at} / 未读回复 {unread_reply}\n",
            self.clock.now().format("%Y-%m-%d %H:%M")
        );
        if !mentions.is_empty() {
            out.push_str("\n### @ 我的\n");
            for m in mentions {
                out.push_str(&format!(
                    "- [{}] {} {}: {} ({})\n",
                    ts(m.at_time),
                    m.nickname,
                    m.business,
                    m.source_content,
                    m.url
                ));
            }
        }
        if !notices.is_empty() {
            out.push_str("\n### 疑似中奖回复\n");
            for r in notices {
                out.push_str(&format!(
                    "- [{}] {}: {} ({})\n",
                    ts(r.timestamp),
                    r.nickname,
                    r.source,
                    r.uri
                ));
            }
        }
        out
    }

    async fn append_log(&self, digest: &str) {
        let result = async {
            if let Some(parent) = self.log_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
                .await?;
            file.write_all(digest.as_bytes()).await?;
            file.write_all(b"\n").await
        }
        .await;
        if let Err(err) = result {
            tracing::error!(path = %self.log_path.display(), %err, "Prize log write failed");
        }
    }
}

fn ts(unix: i64) -> String {
    DateTime::from_timestamp(unix, 0)
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_else(|| unix.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use windfall_common::{CampaignConfig, FixedClock};
    use windfall_platform::UnreadCounts;

    use crate::testing::{MockPlatform, RecordingNotifier};

    #[tokio::test]
    async fn quiet_feeds_produce_no_digest() {
        let api = MockPlatform::new();
        let clock = FixedClock::at_hour(14);
        let dir = tempfile::tempdir().unwrap();
        let keywords = CampaignConfig::default().notice_keywords;
        let notifier = RecordingNotifier::default();
        let check = WinnerCheck::new(&api, Some(&notifier), &clock, &keywords, dir.path(), 1);

        assert!(check.run("account 1").await.unwrap().is_none());
        assert!(notifier.sent().is_empty());
        assert!(!check.log_path.exists());
    }

    #[tokio::test]
    async fn keyword_replies_and_mentions_build_a_digest() {
        let mut api = MockPlatform::new();
        api.unread = UnreadCounts { at: 1, reply: 2 };
        api.mentions = vec![MentionItem {
            at_time: 1700000000,
            nickname: "某官号".into(),
            business: "动态".into(),
            source_content: "@我 的开奖公示".into(),
            url: "https://t.bilibili.com/800000000000000020".into(),
        }];
        api.replies = vec![
            ReplyItem {
                timestamp: 1700000100,
                nickname: "某官号".into(),
                source: "恭喜中奖，请私信联系".into(),
                uri: "https://t.bilibili.com/800000000000000021".into(),
            },
            ReplyItem {
                timestamp: 1700000200,
                nickname: "路人".into(),
                source: "顶一下".into(),
                uri: "https://t.bilibili.com/800000000000000022".into(),
            },
        ];
        let clock = FixedClock::at_hour(14);
        let dir = tempfile::tempdir().unwrap();
        let keywords = CampaignConfig::default().notice_keywords;
        let notifier = RecordingNotifier::default();
        let check = WinnerCheck::new(&api, Some(&notifier), &clock, &keywords, dir.path(), 1);

        let digest = check.run("account 1").await.unwrap().unwrap();
        assert!(digest.contains("恭喜中奖"));
        assert!(digest.contains("开奖公示"));
        assert!(!digest.contains("顶一下"));

        assert_eq!(notifier.sent().len(), 1);
        let logged = std::fs::read_to_string(&check.log_path).unwrap();
        assert!(logged.contains("恭喜中奖"));
    }
}
