//! Push notifications. Two transports, both best-effort: a Bark push URL
//! (GET with title and body in the path) and a generic JSON webhook (POST).
//! Delivery failures are logged and swallowed; nothing in a run should ever
//! fail because a phone was unreachable.

use serde::Serialize;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    title: &'a str,
    body: &'a str,
}

pub struct PushClient {
    http: reqwest::Client,
    bark_url: Option<String>,
    webhook_url: Option<String>,
}

impl PushClient {
    /// Empty URLs disable the corresponding transport.
    pub fn new(bark_url: &str, webhook_url: &str) -> Self {
        let non_empty = |s: &str| {
            let s = s.trim().trim_end_matches('/');
            (!s.is_empty()).then(|| s.to_string())
        };
        Self {
            http: reqwest::Client::new(),
            bark_url: non_empty(bark_url),
            webhook_url: non_empty(webhook_url),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bark_url.is_some() || self.webhook_url.is_some()
    }

    /// Send on every configured transport.
    pub async fn push(&self, title: &str, body: &str) {
        if let Some(base) = &self.bark_url {
            let url = format!(
                "{}/{}/{}",
                base,
                urlencode(title),
                urlencode(body)
            );
            match self.http.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::info!(title, "Bark push sent");
                }
                Ok(resp) => {
                    tracing::warn!(title, status = %resp.status(), "Bark push rejected");
                }
                Err(err) => {
                    tracing::warn!(title, %err, "Bark push failed");
                }
            }
        }
        if let Some(url) = &self.webhook_url {
            let payload = WebhookPayload { title, body };
            match self.http.post(url).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::info!(title, "Webhook push sent");
                }
                Ok(resp) => {
                    tracing::warn!(title, status = %resp.status(), "Webhook push rejected");
                }
                Err(err) => {
                    tracing::warn!(title, %err, "Webhook push failed");
                }
            }
        }
    }
}

/// Percent-encode a path segment. Bark takes title and body as path
/// components, so everything outside the unreserved set is escaped.
fn urlencode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(urlencode("hello"), "hello");
        assert_eq!(urlencode("a b/c"), "a%20b%2Fc");
        assert_eq!(urlencode("中奖"), "%E4%B8%AD%E5%A5%96");
    }

    #[test]
    fn blank_urls_disable_transports() {
        let client = PushClient::new("  ", "");
        assert!(!client.is_configured());
        let client = PushClient::new("https://api.day.app/key/", "");
        assert!(client.is_configured());
        assert_eq!(client.bark_url.as_deref(), Some("https://api.day.app/key"));
    }
}
