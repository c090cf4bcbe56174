//! Entry construction: turn a filtered candidate into a ready-to-run
//! [`EntryPlan`]. All offsets are measured in chars, which is what the
//! platform's mention spans count.

use std::collections::HashSet;
use std::sync::OnceLock;

use rand::seq::IndexedRandom;
use regex::Regex;

use windfall_common::{CampaignConfig, CandidatePost, ControlSpan, EntryPlan, PostKind};

use crate::traits::TextGenerator;

fn topic_before() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "带话题#xxx#" / "加上tag #xxx#"
    RE.get_or_init(|| Regex::new(r"[带加]上?(?:话题|tag)[^#]*?(#[^#]+#)").expect("static regex"))
}

fn topic_after() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "带#xxx#话题" / "加#xxx#tag"
    RE.get_or_init(|| Regex::new(r"[带加]上?(#[^#]+#)(?:话题|tag)").expect("static regex"))
}

fn mention_ask() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "@三位好友" / "艾特两名好友"
    RE.get_or_init(|| Regex::new(r"(?:@|艾特)[^@#]{0,8}?好友").expect("static regex"))
}

fn relay_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"//@.*?:").expect("static regex"))
}

/// Text authored by the outermost poster. A repost's description carries
/// the whole attribution chain; only the part before the first `//@name:`
/// speaks for the post being entered.
pub fn outer_text(description: &str) -> &str {
    match relay_marker().find(description) {
        Some(m) => &description[..m.start()],
        None => description,
    }
}

/// Hashtag topics the post demands in the repost, in order of appearance.
pub fn required_topics(description: &str) -> Vec<String> {
    let mut topics = Vec::new();
    for re in [topic_before(), topic_after()] {
        for caps in re.captures_iter(description) {
            if let Some(m) = caps.get(1) {
                let topic = m.as_str().trim_start_matches('上').to_string();
                if !topics.contains(&topic) {
                    topics.push(topic);
                }
            }
        }
    }
    topics
}

/// Whether the post asks entrants to @ a friend.
pub fn asks_for_mention(description: &str) -> bool {
    mention_ask().is_match(description)
}

fn pick<'a>(options: &'a [String], fallback: &'a str) -> &'a str {
    options
        .choose(&mut rand::rng())
        .map(String::as_str)
        .unwrap_or(fallback)
}

/// Compose the repost text and its mention spans.
///
/// Reposting a repost splices the attribution chain
/// (`own//@author:original`) and rebases the original post's spans past the
/// spliced prefix.
pub fn build_repost_text(
    candidate: &CandidatePost,
    config: &CampaignConfig,
) -> (String, Vec<ControlSpan>) {
    let template = pick(&config.repost_templates, "转发动态");
    let mut text = template.replace("{uname}", &candidate.author_name);
    let own_text = outer_text(&candidate.description);
    for topic in required_topics(own_text) {
        if !text.contains(&topic) {
            text.push_str(&topic);
        }
    }

    let mut spans = Vec::new();
    if asks_for_mention(own_text) {
        for (name, uid) in &config.at_targets {
            text.push(' ');
            let location = text.chars().count();
            let mention = format!("@{name}");
            text.push_str(&mention);
            spans.push(ControlSpan::mention(*uid, location, mention.chars().count()));
        }
    }

    if candidate.kind == PostKind::Repost {
        let at = format!("@{}", candidate.author_name);
        let at_location = text.chars().count() + 2;
        let shift = at_location + at.chars().count() + 1;
        spans.push(ControlSpan::mention(
            candidate.primary_author().unwrap_or(0),
            at_location,
            at.chars().count(),
        ));
        for span in &candidate.control_spans {
            spans.push(ControlSpan {
                data: span.data.clone(),
                location: span.location + shift,
                length: span.length,
                span_type: span.span_type,
            });
        }
        text = format!("{text}//{at}:{}", candidate.description);
    }

    (text, spans)
}

/// Comment text and attachments, by priority: per-post override, then the
/// AI generator, then a random template. Generator failures fall through
/// silently.
pub async fn resolve_comment(
    candidate: &CandidatePost,
    config: &CampaignConfig,
    generator: Option<&dyn TextGenerator>,
) -> (Option<String>, Vec<String>) {
    let commenting = if candidate.official_marker {
        config.comment_official
    } else {
        config.comment_keyword
    };
    if !commenting || candidate.comment_target_id.is_none() {
        return (None, Vec::new());
    }
    if let Some(or) = config.comment_overrides.get(&candidate.post_id) {
        return (Some(or.text.clone()), or.images.clone());
    }
    if config.ai_comments {
        if let Some(generator) = generator {
            match generator.generate(&candidate.description).await {
                Ok(text) => return (Some(text), Vec::new()),
                Err(err) => {
                    tracing::warn!(%err, "Comment generation failed, using a template");
                }
            }
        }
    }
    let template = pick(&config.comment_templates, "好运来");
    (
        Some(template.replace("{uname}", &candidate.author_name)),
        Vec::new(),
    )
}

pub async fn build_plan(
    candidate: &CandidatePost,
    config: &CampaignConfig,
    follow_snapshot: &HashSet<u64>,
    generator: Option<&dyn TextGenerator>,
) -> EntryPlan {
    let (repost_text, control_spans) = build_repost_text(candidate, config);
    let follow_targets = candidate
        .author_ids
        .iter()
        .copied()
        .filter(|id| *id != 0 && !follow_snapshot.contains(id))
        .collect();
    let (comment_text, comment_images) = resolve_comment(candidate, config, generator).await;
    let share_target = (candidate.kind == PostKind::Video)
        .then(|| {
            candidate
                .comment_target_id
                .clone()
                .map(|vid| (candidate.primary_author().unwrap_or(0), vid))
        })
        .flatten();
    EntryPlan {
        post_id: candidate.post_id.clone(),
        author_id: candidate.primary_author().unwrap_or(0),
        follow_targets,
        repost_text,
        control_spans,
        comment_target_id: candidate.comment_target_id.clone(),
        comment_channel: candidate.comment_channel,
        comment_text,
        comment_images,
        official: candidate.official_marker,
        kind: candidate.kind,
        share_target,
        author_name: candidate.author_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windfall_common::CommentChannel;

    fn candidate(description: &str) -> CandidatePost {
        CandidatePost {
            post_id: "653584537097011200".into(),
            author_ids: vec![10],
            author_name: "甲".into(),
            description: description.into(),
            created_at: Some(1700000000),
            already_interacted: false,
            kind: PostKind::Plain,
            official_marker: false,
            reservation_id: None,
            reservation_text: String::new(),
            paid_lottery: false,
            comment_target_id: Some("653584537097011200".into()),
            comment_channel: Some(CommentChannel::PlainPost),
            control_spans: Vec::new(),
            discovered_via: "test".into(),
        }
    }

    fn config_with(templates: &[&str]) -> CampaignConfig {
        CampaignConfig {
            repost_templates: templates.iter().map(|s| s.to_string()).collect(),
            ..CampaignConfig::default()
        }
    }

    #[test]
    fn topics_are_detected_in_both_phrasings() {
        assert_eq!(
            required_topics("转发时带话题#年终抽奖#参与"),
            vec!["#年终抽奖#"]
        );
        assert_eq!(
            required_topics("转发加#开箱#话题即可"),
            vec!["#开箱#"]
        );
        assert_eq!(
            required_topics("加上tag #新品首发# 一起抽"),
            vec!["#新品首发#"]
        );
        assert!(required_topics("转发本条动态即可").is_empty());
    }

    #[test]
    fn quoted_relay_text_is_invisible_to_detection() {
        let chain = "转发参与//@乙:带话题#内层#并@三位好友";
        assert_eq!(outer_text(chain), "转发参与");

        let mut cfg = config_with(&["转发"]);
        cfg.at_targets = vec![("小乙".into(), 77)];
        let mut cand = candidate(chain);
        cand.kind = PostKind::Repost;
        let (text, spans) = build_repost_text(&cand, &cfg);
        // neither the quoted topic nor the quoted @ ask leaks into the
        // repost; the splice still carries the full chain
        assert!(text.starts_with("转发//@甲:转发参与//@乙:"));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].data, "10");
    }

    #[test]
    fn mention_requests_are_detected() {
        assert!(asks_for_mention("转发并@三位好友"));
        assert!(asks_for_mention("艾特两名好友来看"));
        assert!(!asks_for_mention("转发即可参与"));
    }

    #[test]
    fn template_substitutes_author_and_appends_topics() {
        let cfg = config_with(&["恭喜{uname}发财"]);
        let (text, spans) = build_repost_text(&candidate("带话题#好运#抽奖"), &cfg);
        assert_eq!(text, "恭喜甲发财#好运#");
        assert!(spans.is_empty());
    }

    #[test]
    fn mention_spans_carry_char_offsets() {
        let mut cfg = config_with(&["转发"]);
        cfg.at_targets = vec![("小乙".into(), 77)];
        let (text, spans) = build_repost_text(&candidate("转发并@一位好友"), &cfg);
        assert_eq!(text, "转发 @小乙");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].data, "77");
        assert_eq!(spans[0].location, 3);
        assert_eq!(spans[0].length, 3);
    }

    #[test]
    fn repost_of_repost_splices_attribution_and_rebases_spans() {
        let cfg = config_with(&["转发"]);
        let mut cand = candidate("原文#话题#");
        cand.kind = PostKind::Repost;
        cand.control_spans = vec![ControlSpan::mention(7, 2, 2)];

        let (text, spans) = build_repost_text(&cand, &cfg);
        assert_eq!(text, "转发//@甲:原文#话题#");
        assert_eq!(spans.len(), 2);
        // attribution mention points at the reposted author
        assert_eq!(spans[0].data, "10");
        assert_eq!(spans[0].location, 4);
        assert_eq!(spans[0].length, 2);
        // the original span moved past "转发//@甲:"
        assert_eq!(spans[1].data, "7");
        assert_eq!(spans[1].location, 9);
    }

    #[tokio::test]
    async fn comment_override_beats_templates() {
        let mut cfg = config_with(&["转发"]);
        cfg.comment_templates = vec!["模板".into()];
        cfg.comment_overrides.insert(
            "653584537097011200".into(),
            windfall_common::config::CommentOverride {
                text: "指定评论".into(),
                images: vec!["https://example/img.jpg".into()],
            },
        );
        let (text, images) = resolve_comment(&candidate("转发抽奖"), &cfg, None).await;
        assert_eq!(text.as_deref(), Some("指定评论"));
        assert_eq!(images.len(), 1);

        cfg.comment_overrides.clear();
        let (text, images) = resolve_comment(&candidate("转发抽奖"), &cfg, None).await;
        assert_eq!(text.as_deref(), Some("模板"));
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn plan_follow_targets_come_from_the_snapshot() {
        let cfg = config_with(&["转发"]);
        let mut cand = candidate("转发抽奖");
        cand.author_ids = vec![10, 20];
        let snapshot: HashSet<u64> = [20].into_iter().collect();
        let plan = build_plan(&cand, &cfg, &snapshot, None).await;
        assert_eq!(plan.follow_targets, vec![10]);
    }
}
