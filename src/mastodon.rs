use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

pub const API_BASE_PATH: &str = "/api/v1/";

/// The largest page the timeline and notification endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 40;

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub instance: String,
    pub access_token: String,
    pub user_agent: String,
    pub page_size: u32,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineKind {
    Home,
    Local,
}

impl TimelineKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            TimelineKind::Home => "timelines/home",
            TimelineKind::Local => "timelines/public",
        }
    }
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    access_token: String,
    base_url: Url,
    page_size: u32,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.instance.trim().is_empty() {
            bail!("mastodon client instance URL required");
        }
        if config.access_token.trim().is_empty() {
            bail!("mastodon client access token required");
        }
        if config.user_agent.trim().is_empty() {
            bail!("mastodon client user agent required");
        }

        let base_url = Url::parse(config.instance.trim())?.join(API_BASE_PATH)?;
        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(Duration::from_secs(20))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            access_token: config.access_token,
            base_url,
            page_size: clamp_page_size(config.page_size),
        })
    }

    pub fn timeline(&self, kind: TimelineKind) -> Result<Vec<Status>> {
        let mut params = vec![("limit".to_string(), self.page_size.to_string())];
        if kind == TimelineKind::Local {
            params.push(("local".to_string(), "true".to_string()));
        }
        let resp = self.request(Method::GET, kind.as_path(), &params, None)?;
        Ok(resp.json()?)
    }

    pub fn notifications(&self) -> Result<Vec<Notification>> {
        let params = vec![("limit".to_string(), self.page_size.to_string())];
        let resp = self.request(Method::GET, "notifications", &params, None)?;
        Ok(resp.json()?)
    }

    pub fn publish(&self, body: &str, sensitive: bool, spoiler: Option<&str>) -> Result<Status> {
        if body.trim().is_empty() {
            bail!("mastodon: status text is required");
        }
        let new_status = NewStatus {
            status: body,
            sensitive: sensitive.then_some(true),
            spoiler_text: if sensitive { spoiler } else { None },
        };
        let payload = serde_json::to_value(&new_status)?;
        let resp = self.request(Method::POST, "statuses", &[], Some(payload))?;
        Ok(resp.json()?)
    }

    pub fn favourite(&self, id: &str) -> Result<Status> {
        let path = format!("statuses/{}/favourite", id);
        let resp = self.request(Method::POST, &path, &[], None)?;
        Ok(resp.json()?)
    }

    pub fn reblog(&self, id: &str) -> Result<Status> {
        let path = format!("statuses/{}/reblog", id);
        let resp = self.request(Method::POST, &path, &[], None)?;
        Ok(resp.json()?)
    }

    /// Probes the token against the application credential endpoint.
    pub fn verify_token(&self) -> Result<()> {
        self.request(Method::GET, "apps/verify_credentials", &[], None)?;
        Ok(())
    }

    pub fn current_user(&self) -> Result<Account> {
        let resp = self.request(Method::GET, "accounts/verify_credentials", &[], None)?;
        Ok(resp.json()?)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        json: Option<serde_json::Value>,
    ) -> Result<Response> {
        let mut url = self.base_url.join(path)?;
        if !params.is_empty() {
            {
                let mut pairs = url.query_pairs_mut();
                for (k, v) in params {
                    pairs.append_pair(k, v);
                }
            }
        }

        let mut req = self.http.request(method, url);
        req = req.header(USER_AGENT, self.user_agent.clone());
        req = req.header(AUTHORIZATION, format!("Bearer {}", self.access_token));
        if let Some(body) = json {
            req = req.json(&body);
        }

        let resp = req.send()?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            match status.as_u16() {
                401 => Err(anyhow!("mastodon: unauthorized")),
                403 => Err(anyhow!("mastodon: forbidden")),
                404 => Err(anyhow!("mastodon: not found")),
                422 => Err(anyhow!("mastodon: rejected: {}", body)),
                429 => Err(anyhow!("mastodon: rate limited: {}", body)),
                _ => Err(anyhow!("mastodon: api error {}: {}", status, body)),
            }
        }
    }
}

fn clamp_page_size(requested: u32) -> u32 {
    requested.clamp(1, MAX_PAGE_SIZE)
}

#[derive(Debug, Serialize)]
struct NewStatus<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spoiler_text: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    /// Profile bio, as HTML.
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub followers_count: i64,
    #[serde(default)]
    pub following_count: i64,
    #[serde(default)]
    pub statuses_count: i64,
    #[serde(default)]
    pub last_status_at: Option<String>,
}

impl Account {
    pub fn last_status_display(&self) -> &str {
        self.last_status_at.as_deref().unwrap_or("never")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Private,
    Direct,
    #[serde(other)]
    Other,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Direct => "direct",
            Visibility::Other => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Gifv,
    Audio,
    #[default]
    #[serde(other)]
    Unknown,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Video => "video",
            AttachmentKind::Gifv => "gifv",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Unknown => "attachment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: AttachmentKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Application {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub account: Account,
    /// Post body, as HTML.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub spoiler_text: String,
    #[serde(default)]
    pub favourites_count: i64,
    #[serde(default)]
    pub reblogs_count: i64,
    #[serde(default)]
    pub favourited: bool,
    #[serde(default)]
    pub reblogged: bool,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
    #[serde(default)]
    pub application: Option<Application>,
}

impl Status {
    /// Name of the client the post was made from; the web UI sends none.
    pub fn application_name(&self) -> &str {
        match self.application.as_ref() {
            Some(app) if !app.name.is_empty() => &app.name,
            _ => "Web",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Mention,
    #[serde(alias = "favorite")]
    Favourite,
    #[serde(alias = "boost")]
    Reblog,
    Follow,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub account: Account,
    #[serde(default)]
    pub status: Option<Status>,
}
