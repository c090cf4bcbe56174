//! Wire types and the post-detail normalizer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use windfall_common::ControlSpan;

/// Account profile, used as the login-health probe.
#[derive(Debug, Clone, Deserialize)]
pub struct MyInfo {
    pub mid: u64,
    pub name: String,
    #[serde(default)]
    pub level: u32,
}

/// Account relation counters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AccountStat {
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub follower: u64,
    #[serde(default, rename = "dynamic_count")]
    pub posts: u64,
}

/// Unread feed counters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UnreadCounts {
    #[serde(default)]
    pub at: u64,
    #[serde(default)]
    pub reply: u64,
}

/// One mention of the account in someone else's post or comment.
#[derive(Debug, Clone)]
pub struct MentionItem {
    pub at_time: i64,
    pub nickname: String,
    pub business: String,
    pub source_content: String,
    pub url: String,
}

/// One reply to the account's posts or comments.
#[derive(Debug, Clone)]
pub struct ReplyItem {
    pub timestamp: i64,
    pub nickname: String,
    pub source: String,
    pub uri: String,
}

/// Drawing time of an officially-marked giveaway. `ts` is unix seconds,
/// with two sentinels: -1 lookup failed, -9999 the drawing was withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryNotice {
    pub ts: i64,
}

impl LotteryNotice {
    pub const UNKNOWN: i64 = -1;
    pub const WITHDRAWN: i64 = -9999;
}

/// One entry of the recommended video feed.
#[derive(Debug, Clone, Copy)]
pub struct RecommendedVideo {
    pub author_id: u64,
    pub video_id: u64,
}

/// An image attached to a comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentImage {
    pub img_src: String,
}

/// A single post, normalized from either detail endpoint's shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedPost {
    pub post_id: String,
    pub author_id: u64,
    /// Author of the reposted source, when the post is itself a repost.
    pub origin_author_id: Option<u64>,
    pub author_name: String,
    pub description: String,
    pub created_at: Option<i64>,
    pub already_liked: bool,
    pub kind_code: u32,
    /// Target for the video-share and image-comment endpoints.
    pub rid: Option<String>,
    pub official_lottery: bool,
    pub reservation_id: Option<String>,
    pub reservation_text: Option<String>,
    pub paid_lottery: bool,
    /// Mention spans of the description, offsets in chars.
    pub control_spans: Vec<ControlSpan>,
}

impl FetchedPost {
    /// Normalize a detail payload. The legacy endpoint nests everything
    /// under `card` with a stringified inner card; the newer endpoint uses
    /// `item.modules`. Returns `None` when neither shape is present.
    pub fn from_detail(data: &Value) -> Option<Self> {
        if data.get("card").is_some() {
            Self::from_legacy(&data["card"])
        } else if data.get("item").is_some() {
            Self::from_modules(&data["item"])
        } else {
            None
        }
    }

    /// Normalize one legacy feed card (`desc` + stringified inner card).
    pub fn from_card(card: &Value) -> Option<Self> {
        Self::from_legacy(card)
    }

    /// Normalize one `modules`-shaped feed item.
    pub fn from_item(item: &Value) -> Option<Self> {
        Self::from_modules(item)
    }

    fn from_legacy(card: &Value) -> Option<Self> {
        let desc = card.get("desc")?;
        let post_id = desc.get("dynamic_id_str")?.as_str()?.to_string();
        let kind_code = desc.get("type").and_then(Value::as_u64).unwrap_or(0) as u32;
        let inner: Value = card
            .get("card")
            .and_then(Value::as_str)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Null);

        let description = match kind_code {
            1 | 4 => str_at(&inner, &["item", "content"]),
            2 => str_at(&inner, &["item", "description"]),
            8 => {
                let share_text = str_at(&inner, &["dynamic"]);
                if share_text.is_empty() {
                    str_at(&inner, &["title"])
                } else {
                    share_text
                }
            }
            64 => str_at(&inner, &["title"]),
            _ => String::new(),
        };

        // the extension is a second stringified layer on some posts
        let extension = match card.get("extension") {
            Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or(Value::Null),
            Some(ext) => ext.clone(),
            None => Value::Null,
        };
        let lott = extension.get("lott").cloned().unwrap_or(Value::Null);
        let lott = match lott {
            Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::Null),
            other => other,
        };

        let reserve = inner.get("reserve_attach_card").cloned().unwrap_or(Value::Null);

        // extend_json carries the mention spans, one more stringified layer
        let extend = match card.get("extend_json") {
            Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or(Value::Null),
            Some(ext) => ext.clone(),
            None => Value::Null,
        };
        let control_spans = parse_ctrl(extend.get("ctrl"));

        Some(Self {
            post_id,
            author_id: desc.get("uid").and_then(Value::as_u64).unwrap_or(0),
            origin_author_id: desc
                .get("origin")
                .and_then(|o| o.get("uid"))
                .and_then(Value::as_u64),
            author_name: str_at(desc, &["user_profile", "info", "uname"]),
            description,
            created_at: desc.get("timestamp").and_then(Value::as_i64),
            already_liked: desc.get("is_liked").and_then(Value::as_u64) == Some(1),
            kind_code,
            rid: desc
                .get("rid_str")
                .and_then(Value::as_str)
                .map(str::to_string),
            official_lottery: !lott.is_null(),
            reservation_id: reserve
                .get("reserve_id")
                .map(|id| match id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            reservation_text: reserve
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_string),
            paid_lottery: lott.get("pay_type").and_then(Value::as_u64).unwrap_or(0) > 0,
            control_spans,
        })
    }

    fn from_modules(item: &Value) -> Option<Self> {
        let post_id = item.get("id_str")?.as_str()?.to_string();
        let author = &item["modules"]["module_author"];
        let dynamic = &item["modules"]["module_dynamic"];
        let kind_code = match item.get("type").and_then(Value::as_str).unwrap_or("") {
            "DYNAMIC_TYPE_FORWARD" => 1,
            "DYNAMIC_TYPE_DRAW" => 2,
            "DYNAMIC_TYPE_WORD" => 4,
            "DYNAMIC_TYPE_AV" => 8,
            "DYNAMIC_TYPE_ARTICLE" => 64,
            _ => 0,
        };
        let reserve = &dynamic["additional"]["reserve"];

        // the newer shape has no offsets; rebuild them by walking the
        // rich-text nodes in order
        let mut control_spans = Vec::new();
        if let Some(nodes) = dynamic["desc"].get("rich_text_nodes").and_then(Value::as_array) {
            let mut offset = 0usize;
            for node in nodes {
                let text = node.get("text").and_then(Value::as_str).unwrap_or("");
                let length = text.chars().count();
                if node.get("type").and_then(Value::as_str) == Some("RICH_TEXT_NODE_TYPE_AT") {
                    if let Some(rid) = node.get("rid").and_then(Value::as_str) {
                        control_spans.push(ControlSpan {
                            data: rid.to_string(),
                            location: offset,
                            length,
                            span_type: 1,
                        });
                    }
                }
                offset += length;
            }
        }

        Some(Self {
            post_id,
            author_id: author.get("mid").and_then(Value::as_u64).unwrap_or(0),
            origin_author_id: item
                .get("orig")
                .and_then(|o| o["modules"]["module_author"].get("mid"))
                .and_then(Value::as_u64),
            author_name: str_at(author, &["name"]),
            description: str_at(dynamic, &["desc", "text"]),
            created_at: author.get("pub_ts").and_then(Value::as_i64),
            already_liked: item["modules"]["module_stat"]["like"]["status"]
                .as_bool()
                .unwrap_or(false),
            kind_code,
            rid: dynamic["major"]["archive"]
                .get("aid")
                .and_then(Value::as_str)
                .map(str::to_string),
            official_lottery: dynamic["additional"]
                .get("type")
                .and_then(Value::as_str)
                == Some("ADDITIONAL_TYPE_LOTTERY"),
            reservation_id: reserve
                .get("rid")
                .and_then(Value::as_u64)
                .map(|id| id.to_string()),
            reservation_text: reserve
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_string),
            paid_lottery: false,
            control_spans,
        })
    }

    /// Comment surface for this post: `(target_id, channel_code)`.
    /// Videos get channel 1 keyed by the video id, image posts channel 11
    /// keyed by the draw id, plain posts channel 17 keyed by the post id.
    pub fn comment_target(&self) -> Option<(String, u32)> {
        match self.kind_code {
            8 => self.rid.clone().map(|rid| (rid, 1)),
            2 => self.rid.clone().map(|rid| (rid, 11)),
            1 | 4 => Some((self.post_id.clone(), 17)),
            _ => None,
        }
    }
}

fn parse_ctrl(ctrl: Option<&Value>) -> Vec<ControlSpan> {
    match ctrl {
        Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or_default(),
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
        None => Vec::new(),
    }
}

fn str_at(value: &Value, path: &[&str]) -> String {
    let mut cursor = value;
    for key in path {
        match cursor.get(key) {
            Some(next) => cursor = next,
            None => return String::new(),
        }
    }
    cursor.as_str().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_detail_normalizes_a_plain_post_with_lottery_extension() {
        let data = json!({
            "card": {
                "desc": {
                    "dynamic_id_str": "653584537097",
                    "uid": 42,
                    "type": 4,
                    "timestamp": 1700000000,
                    "is_liked": 1,
                    "user_profile": { "info": { "uname": "somebody" } }
                },
                "card": "{\"item\":{\"content\":\"关注转发抽大奖\"}}",
                "extension": "{\"lott\":\"{\\\"lottery_id\\\":7,\\\"pay_type\\\":0}\"}"
            }
        });
        let post = FetchedPost::from_detail(&data).unwrap();
        assert_eq!(post.author_id, 42);
        assert_eq!(post.description, "关注转发抽大奖");
        assert!(post.official_lottery);
        assert!(!post.paid_lottery);
        assert!(post.already_liked);
        assert_eq!(post.comment_target(), Some((post.post_id.clone(), 17)));
    }

    #[test]
    fn legacy_detail_carries_origin_author_and_video_target() {
        let data = json!({
            "card": {
                "desc": {
                    "dynamic_id_str": "111",
                    "uid": 1,
                    "type": 8,
                    "rid_str": "998877",
                    "origin": { "uid": 2 },
                    "user_profile": { "info": { "uname": "v" } }
                },
                "card": "{\"dynamic\":\"新车抽一位\",\"title\":\"标题\"}"
            }
        });
        let post = FetchedPost::from_detail(&data).unwrap();
        assert_eq!(post.origin_author_id, Some(2));
        assert_eq!(post.description, "新车抽一位");
        assert_eq!(post.comment_target(), Some(("998877".into(), 1)));
    }

    #[test]
    fn modules_detail_normalizes_reservation() {
        let data = json!({
            "item": {
                "id_str": "222",
                "type": "DYNAMIC_TYPE_WORD",
                "modules": {
                    "module_author": { "mid": 9, "name": "host", "pub_ts": 1700000001 },
                    "module_dynamic": {
                        "desc": { "text": "预约抽奖" },
                        "additional": {
                            "type": "ADDITIONAL_TYPE_RESERVE",
                            "reserve": { "rid": 555, "title": "直播预约抽奖" }
                        }
                    },
                    "module_stat": { "like": { "status": false } }
                }
            }
        });
        let post = FetchedPost::from_detail(&data).unwrap();
        assert_eq!(post.reservation_id.as_deref(), Some("555"));
        assert_eq!(post.reservation_text.as_deref(), Some("直播预约抽奖"));
        assert!(!post.official_lottery);
    }

    #[test]
    fn legacy_detail_parses_mention_spans_from_the_extension() {
        let data = json!({
            "card": {
                "desc": {
                    "dynamic_id_str": "333",
                    "uid": 1,
                    "type": 1,
                    "user_profile": { "info": { "uname": "r" } }
                },
                "card": "{\"item\":{\"content\":\"@好友 快来\"}}",
                "extend_json":
                    "{\"ctrl\":\"[{\\\"data\\\":\\\"42\\\",\\\"location\\\":0,\\\"length\\\":3,\\\"type\\\":1}]\"}"
            }
        });
        let post = FetchedPost::from_detail(&data).unwrap();
        assert_eq!(post.control_spans.len(), 1);
        assert_eq!(post.control_spans[0].data, "42");
        assert_eq!(post.control_spans[0].location, 0);
        assert_eq!(post.control_spans[0].length, 3);
    }

    #[test]
    fn modules_detail_rebuilds_span_offsets_from_rich_text_nodes() {
        let data = json!({
            "item": {
                "id_str": "444",
                "type": "DYNAMIC_TYPE_WORD",
                "modules": {
                    "module_author": { "mid": 9, "name": "host" },
                    "module_dynamic": {
                        "desc": {
                            "text": "转发抽奖@好友 参加",
                            "rich_text_nodes": [
                                { "type": "RICH_TEXT_NODE_TYPE_TEXT", "text": "转发抽奖" },
                                { "type": "RICH_TEXT_NODE_TYPE_AT", "text": "@好友", "rid": "42" },
                                { "type": "RICH_TEXT_NODE_TYPE_TEXT", "text": " 参加" }
                            ]
                        }
                    },
                    "module_stat": { "like": { "status": false } }
                }
            }
        });
        let post = FetchedPost::from_detail(&data).unwrap();
        assert_eq!(post.control_spans.len(), 1);
        assert_eq!(post.control_spans[0].data, "42");
        assert_eq!(post.control_spans[0].location, 4);
        assert_eq!(post.control_spans[0].length, 3);
    }

    #[test]
    fn unrecognized_shape_is_none() {
        assert!(FetchedPost::from_detail(&json!({"whatever": 1})).is_none());
    }
}
