//! The HTTP client. Cookie-authenticated; the CSRF token and account id are
//! lifted out of the cookie at construction time. Operations with more than
//! one usable endpoint go through a [`RequestLine`].

use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;

use crate::api;
use crate::error::{PlatformError, Result};
use crate::line::{LineVerdict, RequestLine};
use crate::outcome::{CommentOutcome, FollowOutcome, LikeOutcome, RepostOutcome};
use crate::types::{
    AccountStat, CommentImage, FetchedPost, LotteryNotice, MentionItem, MyInfo,
    RecommendedVideo, ReplyItem, UnreadCounts,
};

/// Repost text hard limit imposed by the platform.
const REPOST_MAX_CHARS: usize = 233;

struct ClientInner {
    http: reqwest::Client,
    cookie: String,
    csrf: String,
    uid: u64,
}

impl ClientInner {
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let resp = self
            .http
            .get(url)
            .header("cookie", &self.cookie)
            .header("accept", "application/json, text/plain, */*")
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp.json().await?)
    }

    async fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<Value> {
        let resp = self
            .http
            .post(url)
            .header("cookie", &self.cookie)
            .header("accept", "application/json, text/plain, */*")
            .form(form)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp.json().await?)
    }
}

fn cookie_field(cookie: &str, key: &str) -> Option<String> {
    cookie
        .split(';')
        .filter_map(|kv| kv.trim().split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.trim().to_string())
}

fn code_of(value: &Value) -> i64 {
    value.get("code").and_then(Value::as_i64).unwrap_or(i64::MIN)
}

fn code_err(value: &Value) -> PlatformError {
    PlatformError::Code {
        code: code_of(value),
        message: value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

pub struct PlatformClient {
    inner: Arc<ClientInner>,
    follower_line: RequestLine<u64, i64>,
    follow_line: RequestLine<u64, FollowOutcome>,
    detail_line: RequestLine<String, Option<FetchedPost>>,
    rcmd_line: RequestLine<(), Vec<RecommendedVideo>>,
}

impl PlatformClient {
    pub fn new(cookie: &str, user_agent: &str) -> Result<Self> {
        let csrf = cookie_field(cookie, "bili_jct")
            .ok_or_else(|| PlatformError::Credential("cookie has no bili_jct field".into()))?;
        let uid = cookie_field(cookie, "DedeUserID")
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| PlatformError::Credential("cookie has no DedeUserID field".into()))?;
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        let inner = Arc::new(ClientInner {
            http,
            cookie: cookie.to_string(),
            csrf,
            uid,
        });
        Ok(Self {
            follower_line: build_follower_line(&inner),
            follow_line: build_follow_line(&inner),
            detail_line: build_detail_line(&inner),
            rcmd_line: build_rcmd_line(&inner),
            inner,
        })
    }

    pub fn uid(&self) -> u64 {
        self.inner.uid
    }

    /// Login-health probe. A credential that no longer authenticates comes
    /// back as a `Code` error.
    pub async fn my_info(&self) -> Result<MyInfo> {
        let v = self.inner.get_json(api::SPACE_MYINFO, &[]).await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        Ok(serde_json::from_value(v["data"].clone())?)
    }

    pub async fn account_stat(&self) -> Result<AccountStat> {
        let v = self.inner.get_json(api::NAV_STAT, &[]).await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        Ok(serde_json::from_value(v["data"].clone())?)
    }

    pub async fn unread_counts(&self) -> Result<UnreadCounts> {
        let v = self.inner.get_json(api::MSGFEED_UNREAD, &[]).await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        Ok(serde_json::from_value(v["data"].clone())?)
    }

    pub async fn mention_feed(&self) -> Result<Vec<MentionItem>> {
        let v = self.inner.get_json(api::MSGFEED_AT, &[]).await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        let items = v["data"]["items"].as_array().cloned().unwrap_or_default();
        Ok(items
            .iter()
            .map(|i| MentionItem {
                at_time: i["at_time"].as_i64().unwrap_or(0),
                nickname: i["user"]["nickname"].as_str().unwrap_or_default().to_string(),
                business: i["item"]["business"].as_str().unwrap_or_default().to_string(),
                source_content: i["item"]["source_content"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                url: i["item"]["uri"].as_str().unwrap_or_default().to_string(),
            })
            .collect())
    }

    pub async fn reply_feed(&self) -> Result<Vec<ReplyItem>> {
        let v = self.inner.get_json(api::MSGFEED_REPLY, &[]).await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        let items = v["data"]["items"].as_array().cloned().unwrap_or_default();
        Ok(items
            .iter()
            .filter(|i| {
                i.get("item").is_some() && i.get("user").is_some() && i.get("reply_time").is_some()
            })
            .map(|i| ReplyItem {
                timestamp: i["reply_time"].as_i64().unwrap_or(0),
                nickname: i["user"]["nickname"].as_str().unwrap_or_default().to_string(),
                source: i["item"]["source_content"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                uri: i["item"]["uri"].as_str().unwrap_or_default().to_string(),
            })
            .collect())
    }

    /// Fetch and normalize one post. `None` when every endpoint failed or
    /// the post no longer exists.
    pub async fn fetch_post(&self, post_id: &str) -> Option<FetchedPost> {
        self.detail_line.run(post_id.to_string()).await
    }

    /// Follower count, -1 when every endpoint failed.
    pub async fn follower_count(&self, uid: u64) -> i64 {
        self.follower_line.run(uid).await
    }

    pub async fn follow(&self, uid: u64) -> FollowOutcome {
        self.follow_line.run(uid).await
    }

    /// Uids the account currently follows.
    pub async fn following(&self) -> Result<Vec<u64>> {
        let v = self
            .inner
            .get_json(api::ATTENTION_LIST, &[("uid", self.inner.uid.to_string())])
            .await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        Ok(v["data"]["list"]
            .as_array()
            .map(|list| list.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default())
    }

    pub async fn like(&self, post_id: &str) -> LikeOutcome {
        let form = [
            ("uid", self.inner.uid.to_string()),
            ("dynamic_id", post_id.to_string()),
            ("up", "1".to_string()),
            ("csrf", self.inner.csrf.clone()),
        ];
        match self.inner.post_form(api::DYNAMIC_LIKE_THUMB, &form).await {
            Ok(v) => LikeOutcome::from_code(code_of(&v)),
            Err(err) => {
                tracing::error!(post_id, %err, "Like request failed");
                LikeOutcome::Unknown
            }
        }
    }

    pub async fn repost(&self, post_id: &str, content: &str, ctrl: &str) -> RepostOutcome {
        let content: String = content.chars().take(REPOST_MAX_CHARS).collect();
        let form = [
            ("uid", self.inner.uid.to_string()),
            ("dynamic_id", post_id.to_string()),
            ("content", content),
            ("ctrl", ctrl.to_string()),
            ("csrf", self.inner.csrf.clone()),
        ];
        match self.inner.post_form(api::DYNAMIC_REPOST, &form).await {
            Ok(v) => RepostOutcome::from_code(code_of(&v)),
            Err(err) => {
                tracing::error!(post_id, %err, "Repost request failed");
                RepostOutcome::Unknown
            }
        }
    }

    /// Share a video to the account's feed. The video-specific
    /// cannot-be-shared code is treated as `NotShareable`.
    pub async fn share_video(&self, author_id: u64, video_id: &str) -> RepostOutcome {
        let form = [
            ("platform", "pc".to_string()),
            ("uid", author_id.to_string()),
            ("type", "8".to_string()),
            ("content", "分享视频".to_string()),
            ("repost_code", "20000".to_string()),
            ("rid", video_id.to_string()),
            ("csrf_token", self.inner.csrf.clone()),
            ("csrf", self.inner.csrf.clone()),
        ];
        match self.inner.post_form(api::DYNAMIC_SHARE, &form).await {
            Ok(v) => match code_of(&v) {
                0 => RepostOutcome::Reposted,
                1101015 => RepostOutcome::NotShareable,
                code => RepostOutcome::from_code(code),
            },
            Err(err) => {
                tracing::error!(video_id, %err, "Share request failed");
                RepostOutcome::Unknown
            }
        }
    }

    /// Post a comment. `captcha` carries a solved challenge code on resend;
    /// attaching images switches non-video comments to the image channel.
    pub async fn comment(
        &self,
        target: &str,
        channel: u32,
        message: &str,
        captcha: Option<&str>,
        images: &[CommentImage],
    ) -> CommentOutcome {
        let channel = if !images.is_empty() && channel != 1 { 11 } else { channel };
        let mut form = vec![
            ("oid", target.to_string()),
            ("type", channel.to_string()),
            ("message", message.to_string()),
            ("csrf", self.inner.csrf.clone()),
        ];
        if let Some(code) = captcha {
            form.push(("code", code.to_string()));
        }
        if !images.is_empty() {
            let pictures = serde_json::to_string(images).unwrap_or_else(|_| "[]".to_string());
            form.push(("pictures", pictures));
            form.push(("sync_to_dynamic", "1".to_string()));
        }
        match self.inner.post_form(api::REPLY_ADD, &form).await {
            Ok(v) => CommentOutcome::from_code(
                code_of(&v),
                v["data"]["url"].as_str().map(str::to_string),
            ),
            Err(err) => {
                tracing::error!(target, %err, "Comment request failed");
                CommentOutcome::Unknown
            }
        }
    }

    /// Comments already under a post, excluding the author's own. Used by
    /// copy-comment mode.
    pub async fn fetch_comments(&self, target: &str, channel: u32) -> Vec<(String, String)> {
        let query = [("oid", target.to_string()), ("type", channel.to_string())];
        match self.inner.get_json(api::REPLY_LIST, &query).await {
            Ok(v) if code_of(&v) == 0 => {
                let author = v["data"]["upper"]["mid"].as_u64().unwrap_or(0);
                v["data"]["replies"]
                    .as_array()
                    .map(|replies| {
                        replies
                            .iter()
                            .filter(|r| r["mid"].as_u64() != Some(author))
                            .map(|r| {
                                (
                                    r["member"]["uname"].as_str().unwrap_or_default().to_string(),
                                    r["content"]["message"]
                                        .as_str()
                                        .unwrap_or_default()
                                        .to_string(),
                                )
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            Ok(v) => {
                tracing::error!(target, code = code_of(&v), "Comment listing failed");
                Vec::new()
            }
            Err(err) => {
                tracing::error!(target, %err, "Comment listing failed");
                Vec::new()
            }
        }
    }

    /// Register a reservation. Re-registering is not an error.
    pub async fn reserve(&self, reservation_id: &str) -> bool {
        let form = [
            ("cur_btn_status", "1".to_string()),
            ("reserve_id", reservation_id.to_string()),
            ("csrf", self.inner.csrf.clone()),
        ];
        match self.inner.post_form(api::RESERVE_ATTACH_CARD_BUTTON, &form).await {
            Ok(v) => match code_of(&v) {
                0 => {
                    tracing::info!(reservation_id, "Reservation registered");
                    true
                }
                7604003 => {
                    tracing::warn!(reservation_id, "Reservation already registered");
                    true
                }
                code => {
                    tracing::error!(reservation_id, code, "Reservation failed");
                    false
                }
            },
            Err(err) => {
                tracing::error!(reservation_id, %err, "Reservation request failed");
                false
            }
        }
    }

    pub async fn lottery_notice(&self, post_id: &str) -> LotteryNotice {
        let query = [("dynamic_id", post_id.to_string())];
        match self.inner.get_json(api::LOTTERY_NOTICE, &query).await {
            Ok(v) => match code_of(&v) {
                0 => LotteryNotice {
                    ts: v["data"]["lottery_time"].as_i64().unwrap_or(LotteryNotice::UNKNOWN),
                },
                -9999 => {
                    tracing::warn!(post_id, "Drawing was withdrawn");
                    LotteryNotice {
                        ts: LotteryNotice::WITHDRAWN,
                    }
                }
                code => {
                    tracing::error!(post_id, code, "Drawing notice lookup failed");
                    LotteryNotice {
                        ts: LotteryNotice::UNKNOWN,
                    }
                }
            },
            Err(err) => {
                tracing::error!(post_id, %err, "Drawing notice request failed");
                LotteryNotice {
                    ts: LotteryNotice::UNKNOWN,
                }
            }
        }
    }

    /// Find the follow group with the given name, creating it when asked.
    pub async fn ensure_group(&self, name: &str, create_if_missing: bool) -> Option<u64> {
        let v = match self.inner.get_json(api::RELATION_TAGS, &[]).await {
            Ok(v) if code_of(&v) == 0 => v,
            Ok(v) => {
                tracing::error!(code = code_of(&v), "Group listing failed");
                return None;
            }
            Err(err) => {
                tracing::error!(%err, "Group listing failed");
                return None;
            }
        };
        let found = v["data"]
            .as_array()
            .and_then(|groups| {
                groups
                    .iter()
                    .find(|g| g["name"].as_str() == Some(name))
                    .and_then(|g| g["tagid"].as_u64())
            });
        match found {
            Some(id) => {
                tracing::info!(name, id, "Found follow group");
                Some(id)
            }
            None if create_if_missing => self.create_group(name).await,
            None => {
                tracing::warn!(name, "No follow group with that name");
                None
            }
        }
    }

    async fn create_group(&self, name: &str) -> Option<u64> {
        let form = [("tag", name.to_string()), ("csrf", self.inner.csrf.clone())];
        match self.inner.post_form(api::RELATION_TAG_CREATE, &form).await {
            Ok(v) if code_of(&v) == 0 => {
                let id = v["data"]["tagid"].as_u64();
                tracing::info!(name, ?id, "Created follow group");
                id
            }
            Ok(v) => {
                tracing::error!(name, code = code_of(&v), "Group creation failed");
                None
            }
            Err(err) => {
                tracing::error!(name, %err, "Group creation failed");
                None
            }
        }
    }

    pub async fn move_to_group(&self, uid: u64, group_id: u64) -> bool {
        let form = [
            ("fids", uid.to_string()),
            ("tagids", group_id.to_string()),
            ("csrf", self.inner.csrf.clone()),
        ];
        match self.inner.post_form(api::RELATION_TAGS_ADD_USERS, &form).await {
            Ok(v) if code_of(&v) == 0 => true,
            Ok(v) => {
                tracing::error!(uid, group_id, code = code_of(&v), "Group move failed");
                false
            }
            Err(err) => {
                tracing::error!(uid, group_id, %err, "Group move failed");
                false
            }
        }
    }

    pub async fn recommended_feed(&self) -> Vec<RecommendedVideo> {
        self.rcmd_line.run(()).await
    }

    /// Latest posts on a user's space feed.
    pub async fn author_feed(&self, uid: u64) -> Result<Vec<FetchedPost>> {
        let query = [("host_mid", uid.to_string()), ("offset", String::new())];
        let v = self.inner.get_json(api::POLYMER_FEED_SPACE, &query).await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        Ok(v["data"]["items"]
            .as_array()
            .map(|items| items.iter().filter_map(FetchedPost::from_item).collect())
            .unwrap_or_default())
    }

    /// Latest posts under a topic tag.
    pub async fn tag_feed(&self, tag: &str) -> Result<Vec<FetchedPost>> {
        let query = [
            ("topic_name", tag.to_string()),
            ("offset_dynamic_id", "0".to_string()),
        ];
        let v = self.inner.get_json(api::TOPIC_HISTORY, &query).await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        Ok(v["data"]["cards"]
            .as_array()
            .map(|cards| cards.iter().filter_map(FetchedPost::from_card).collect())
            .unwrap_or_default())
    }

    /// Article ids matching a keyword, newest first.
    pub async fn search_articles(&self, keyword: &str) -> Result<Vec<u64>> {
        let query = [
            ("keyword", keyword.to_string()),
            ("page", "1".to_string()),
            ("order", "pubdate".to_string()),
            ("search_type", "article".to_string()),
        ];
        let v = self.inner.get_json(api::SEARCH_TYPE, &query).await?;
        if code_of(&v) != 0 {
            return Err(code_err(&v));
        }
        Ok(v["data"]["result"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|it| it["id"].as_u64())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Raw article page; callers mine it for referenced post ids.
    pub async fn article_html(&self, article_id: u64) -> Result<String> {
        let url = format!("{}{}", api::ARTICLE_VIEW, article_id);
        let resp = self
            .inner
            .http
            .get(&url)
            .header("cookie", &self.inner.cookie)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: format!("article {article_id} fetch failed"),
            });
        }
        Ok(resp.text().await?)
    }
}

fn json_verdict(result: Result<Value>) -> std::result::Result<Value, String> {
    match result {
        Ok(v) if code_of(&v) == 0 => Ok(v),
        Ok(v) => Err(format!("code {}: {}", code_of(&v), v["message"].as_str().unwrap_or(""))),
        Err(err) => Err(err.to_string()),
    }
}

fn build_follower_line(inner: &Arc<ClientInner>) -> RequestLine<u64, i64> {
    let follower_of = |result: Result<Value>| match json_verdict(result) {
        Ok(v) => LineVerdict::Keep(v["data"]["follower"].as_i64().unwrap_or(-1), "ok".into()),
        Err(msg) => LineVerdict::Switch(-1, msg),
    };
    let a = inner.clone();
    let b = inner.clone();
    let c = inner.clone();
    RequestLine::new(
        "follower-count",
        vec![
            Box::new(move |uid: u64| {
                let inner = a.clone();
                async move {
                    let query = [("mid", uid.to_string()), ("photo", "false".to_string())];
                    follower_of(inner.get_json(api::WEB_INTERFACE_CARD, &query).await)
                }
                .boxed()
            }),
            Box::new(move |uid: u64| {
                let inner = b.clone();
                async move {
                    let query = [("vmid", uid.to_string())];
                    follower_of(inner.get_json(api::RELATION_STAT, &query).await)
                }
                .boxed()
            }),
            Box::new(move |uid: u64| {
                let inner = c.clone();
                async move {
                    let query = [("uid", uid.to_string())];
                    follower_of(inner.get_json(api::FOLLOWER_MIRROR, &query).await)
                }
                .boxed()
            }),
        ],
    )
}

fn follow_verdict(result: Result<Value>) -> LineVerdict<FollowOutcome> {
    match result {
        Ok(v) => match code_of(&v) {
            0 => LineVerdict::Keep(FollowOutcome::Followed, "followed".into()),
            22002 => LineVerdict::Keep(FollowOutcome::BlockedByTarget, "blocked by target".into()),
            22003 => LineVerdict::Keep(
                FollowOutcome::BlacklistRestricted,
                "blacklisted user cannot follow".into(),
            ),
            22015 => LineVerdict::Keep(FollowOutcome::AccountFlagged, "account flagged".into()),
            22009 => LineVerdict::Keep(FollowOutcome::CapReached, "follow cap reached".into()),
            22014 => LineVerdict::Keep(FollowOutcome::AlreadyFollowing, "already following".into()),
            code => LineVerdict::Switch(
                FollowOutcome::Unknown,
                format!("code {}: {}", code, v["message"].as_str().unwrap_or("")),
            ),
        },
        Err(err) => LineVerdict::Switch(FollowOutcome::Unknown, err.to_string()),
    }
}

fn build_follow_line(inner: &Arc<ClientInner>) -> RequestLine<u64, FollowOutcome> {
    let a = inner.clone();
    let b = inner.clone();
    let c = inner.clone();
    RequestLine::new(
        "follow",
        vec![
            Box::new(move |uid: u64| {
                let inner = a.clone();
                async move {
                    let form = [
                        ("fid", uid.to_string()),
                        ("act", "1".to_string()),
                        ("re_src", "0".to_string()),
                        ("csrf", inner.csrf.clone()),
                    ];
                    follow_verdict(inner.post_form(api::RELATION_MODIFY, &form).await)
                }
                .boxed()
            }),
            Box::new(move |uid: u64| {
                let inner = b.clone();
                async move {
                    let form = [
                        ("type", "1".to_string()),
                        ("follow", uid.to_string()),
                        ("csrf", inner.csrf.clone()),
                    ];
                    follow_verdict(inner.post_form(api::FEED_SET_USER_FOLLOW, &form).await)
                }
                .boxed()
            }),
            Box::new(move |uid: u64| {
                let inner = c.clone();
                async move {
                    let form = [
                        ("fids", uid.to_string()),
                        ("act", "1".to_string()),
                        ("re_src", "1".to_string()),
                        ("csrf", inner.csrf.clone()),
                    ];
                    follow_verdict(inner.post_form(api::RELATION_BATCH_MODIFY, &form).await)
                }
                .boxed()
            }),
        ],
    )
}

fn detail_verdict(result: Result<Value>) -> LineVerdict<Option<FetchedPost>> {
    match json_verdict(result) {
        Ok(v) => LineVerdict::Keep(FetchedPost::from_detail(&v["data"]), "ok".into()),
        Err(msg) => LineVerdict::Switch(None, msg),
    }
}

fn build_detail_line(inner: &Arc<ClientInner>) -> RequestLine<String, Option<FetchedPost>> {
    let a = inner.clone();
    let b = inner.clone();
    RequestLine::new(
        "post-detail",
        vec![
            Box::new(move |id: String| {
                let inner = a.clone();
                async move {
                    let query = [("dynamic_id", id)];
                    detail_verdict(inner.get_json(api::DYNAMIC_SVR_DETAIL, &query).await)
                }
                .boxed()
            }),
            Box::new(move |id: String| {
                let inner = b.clone();
                async move {
                    let query = [("id", id), ("features", "itemOpusStyle".to_string())];
                    detail_verdict(inner.get_json(api::POLYMER_DYNAMIC_DETAIL, &query).await)
                }
                .boxed()
            }),
        ],
    )
}

fn rcmd_verdict(result: Result<Value>) -> LineVerdict<Vec<RecommendedVideo>> {
    match json_verdict(result) {
        Ok(v) => {
            let videos = v["data"]["item"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|it| {
                            Some(RecommendedVideo {
                                author_id: it["owner"]["mid"].as_u64()?,
                                video_id: it["id"].as_u64()?,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            LineVerdict::Keep(videos, "ok".into())
        }
        Err(msg) => LineVerdict::Switch(Vec::new(), msg),
    }
}

fn build_rcmd_line(inner: &Arc<ClientInner>) -> RequestLine<(), Vec<RecommendedVideo>> {
    let a = inner.clone();
    let b = inner.clone();
    RequestLine::new(
        "recommended-feed",
        vec![
            Box::new(move |_| {
                let inner = a.clone();
                async move { rcmd_verdict(inner.get_json(api::TOP_RCMD, &[]).await) }.boxed()
            }),
            Box::new(move |_| {
                let inner = b.clone();
                async move { rcmd_verdict(inner.get_json(api::TOP_FEED_RCMD, &[]).await) }.boxed()
            }),
        ],
    )
}
