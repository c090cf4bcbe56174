//! Candidate discovery. One adapter per [`DiscoveryMode`] variant, all
//! normalizing into [`CandidatePost`].

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

use windfall_common::{CandidatePost, CommentChannel, DiscoveryMode, PostKind};
use windfall_platform::FetchedPost;

use crate::traits::PlatformApi;

/// Articles inspected per keyword search; each costs a page fetch.
const ARTICLE_SCAN_LIMIT: usize = 3;

pub struct Discovery<'a> {
    api: &'a dyn PlatformApi,
    http: reqwest::Client,
}

impl<'a> Discovery<'a> {
    pub fn new(api: &'a dyn PlatformApi) -> Self {
        Self {
            api,
            http: reqwest::Client::new(),
        }
    }

    pub async fn discover(&self, mode: &DiscoveryMode) -> Result<Vec<CandidatePost>> {
        let label = mode.label();
        let candidates = match mode {
            DiscoveryMode::ByAuthor(uid) => self
                .api
                .author_feed(*uid)
                .await?
                .iter()
                .map(|post| candidate_from_fetched(post, &label))
                .collect(),
            DiscoveryMode::ByTag(tag) => self
                .api
                .tag_feed(tag)
                .await?
                .iter()
                .map(|post| candidate_from_fetched(post, &label))
                .collect(),
            DiscoveryMode::ByArticle(keyword) => self.from_articles(keyword, &label).await?,
            DiscoveryMode::ByApi(url) => self.from_api(url, &label).await?,
            DiscoveryMode::ByList(path) => {
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read id list {path}"))?;
                let ids: Vec<String> = raw
                    .split([',', '\n'])
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect();
                self.fetch_all(&ids, &label).await
            }
            DiscoveryMode::Direct(ids) => self.fetch_all(ids, &label).await,
        };
        tracing::info!(mode = %label, count = candidates.len(), "Discovery complete");
        Ok(candidates)
    }

    /// Keyword-search recent articles and mine their pages for post ids.
    async fn from_articles(&self, keyword: &str, label: &str) -> Result<Vec<CandidatePost>> {
        let articles = self.api.search_articles(keyword).await?;
        let mut ids: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for article_id in articles.into_iter().take(ARTICLE_SCAN_LIMIT) {
            match self.api.article_html(article_id).await {
                Ok(html) => {
                    for id in extract_post_ids(&html) {
                        if seen.insert(id.clone()) {
                            ids.push(id);
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(article_id, %err, "Article fetch failed, skipping");
                }
            }
        }
        Ok(self.fetch_all(&ids, label).await)
    }

    /// Fetch a pre-extracted candidate batch from an external endpoint.
    async fn from_api(&self, url: &str, label: &str) -> Result<Vec<CandidatePost>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Candidate API {url} unreachable"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Candidate API {url} answered {status}");
        }
        let mut candidates: Vec<CandidatePost> = resp
            .json()
            .await
            .with_context(|| format!("Candidate API {url} returned malformed JSON"))?;
        for candidate in &mut candidates {
            candidate.discovered_via = label.to_string();
        }
        Ok(candidates)
    }

    async fn fetch_all(&self, ids: &[String], label: &str) -> Vec<CandidatePost> {
        let mut candidates = Vec::with_capacity(ids.len());
        for id in ids {
            match self.api.fetch_post(id).await {
                Some(post) => candidates.push(candidate_from_fetched(&post, label)),
                None => tracing::warn!(post_id = %id, "Post unavailable, skipping"),
            }
        }
        candidates
    }
}

/// Post ids referenced in an article page. Order of first appearance.
pub fn extract_post_ids(html: &str) -> Vec<String> {
    // post ids are 18+ digit decimals; shorter numbers are everything else
    let re = Regex::new(r"[0-9]{18,}").expect("valid regex");
    let mut seen = HashSet::new();
    re.find_iter(html)
        .map(|m| m.as_str().to_string())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

pub fn candidate_from_fetched(post: &FetchedPost, via: &str) -> CandidatePost {
    let mut author_ids = vec![post.author_id];
    if let Some(origin) = post.origin_author_id {
        author_ids.push(origin);
    }
    let (comment_target_id, comment_channel) = match post.comment_target() {
        Some((target, code)) => (Some(target), CommentChannel::from_code(code)),
        None => (None, None),
    };
    CandidatePost {
        post_id: post.post_id.clone(),
        author_ids,
        author_name: post.author_name.clone(),
        description: post.description.clone(),
        created_at: post.created_at,
        already_interacted: post.already_liked,
        kind: PostKind::from_code(post.kind_code),
        official_marker: post.official_lottery,
        reservation_id: post.reservation_id.clone(),
        reservation_text: post.reservation_text.clone().unwrap_or_default(),
        paid_lottery: post.paid_lottery,
        comment_target_id,
        comment_channel,
        control_spans: post.control_spans.clone(),
        discovered_via: via.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_ids_dedup_in_first_appearance_order() {
        let html = r#"
            <a href="https://t.bilibili.com/653584537097011200">one</a>
            short 123456 stays out
            <a href="https://t.bilibili.com/653584537097011201">two</a>
            <a href="https://t.bilibili.com/653584537097011200">one again</a>
        "#;
        assert_eq!(
            extract_post_ids(html),
            vec!["653584537097011200", "653584537097011201"]
        );
    }

    #[test]
    fn fetched_post_maps_authors_and_comment_surface() {
        let fetched = FetchedPost {
            post_id: "653584537097011200".into(),
            author_id: 10,
            origin_author_id: Some(20),
            author_name: "host".into(),
            description: "关注转发抽奖".into(),
            created_at: Some(1700000000),
            already_liked: true,
            kind_code: 1,
            official_lottery: true,
            control_spans: vec![windfall_common::ControlSpan::mention(7, 2, 3)],
            ..FetchedPost::default()
        };
        let candidate = candidate_from_fetched(&fetched, "direct:1");
        assert_eq!(candidate.author_ids, vec![10, 20]);
        assert_eq!(candidate.control_spans, fetched.control_spans);
        assert_eq!(candidate.kind, PostKind::Repost);
        assert!(candidate.already_interacted);
        assert_eq!(
            candidate.comment_channel,
            Some(CommentChannel::PlainPost)
        );
        assert_eq!(
            candidate.comment_target_id.as_deref(),
            Some("653584537097011200")
        );
    }
}
