use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::mastodon::{self, Notification, Status, TimelineKind};

pub trait FeedService: Send + Sync {
    fn load_timeline(&self, kind: TimelineKind) -> Result<Vec<Status>>;
    fn load_notifications(&self) -> Result<Vec<Notification>>;
}

pub trait StatusService: Send + Sync {
    fn publish(&self, body: &str, sensitive: bool, spoiler: Option<&str>) -> Result<Status>;
    fn favourite(&self, id: &str) -> Result<Status>;
    fn boost(&self, id: &str) -> Result<Status>;
}

pub struct MastodonFeedService {
    client: Arc<mastodon::Client>,
}

impl MastodonFeedService {
    pub fn new(client: Arc<mastodon::Client>) -> Self {
        Self { client }
    }
}

impl FeedService for MastodonFeedService {
    fn load_timeline(&self, kind: TimelineKind) -> Result<Vec<Status>> {
        self.client.timeline(kind).context("fetch timeline")
    }

    fn load_notifications(&self) -> Result<Vec<Notification>> {
        self.client.notifications().context("fetch notifications")
    }
}

pub struct MastodonStatusService {
    client: Arc<mastodon::Client>,
}

impl MastodonStatusService {
    pub fn new(client: Arc<mastodon::Client>) -> Self {
        Self { client }
    }
}

impl StatusService for MastodonStatusService {
    fn publish(&self, body: &str, sensitive: bool, spoiler: Option<&str>) -> Result<Status> {
        self.client
            .publish(body, sensitive, spoiler)
            .context("publish status")
    }

    fn favourite(&self, id: &str) -> Result<Status> {
        self.client.favourite(id).context("favourite status")
    }

    fn boost(&self, id: &str) -> Result<Status> {
        self.client.reblog(id).context("boost status")
    }
}

/// Scriptable stand-in for [`FeedService`]; each fetch pops the next queued
/// response, and an exhausted queue yields an empty batch.
#[derive(Default)]
pub struct MockFeedService {
    timelines: Mutex<VecDeque<Result<Vec<Status>>>>,
    notifications: Mutex<VecDeque<Result<Vec<Notification>>>>,
}

impl MockFeedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_timeline(&self, batch: Vec<Status>) {
        self.timelines.lock().unwrap().push_back(Ok(batch));
    }

    pub fn push_timeline_error(&self, message: &str) {
        self.timelines
            .lock()
            .unwrap()
            .push_back(Err(anyhow!(message.to_string())));
    }

    pub fn push_notifications(&self, batch: Vec<Notification>) {
        self.notifications.lock().unwrap().push_back(Ok(batch));
    }
}

impl FeedService for MockFeedService {
    fn load_timeline(&self, _kind: TimelineKind) -> Result<Vec<Status>> {
        self.timelines
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn load_notifications(&self) -> Result<Vec<Notification>> {
        self.notifications
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Records write actions instead of hitting the network.
#[derive(Default)]
pub struct MockStatusService {
    pub published: Mutex<Vec<(String, bool, Option<String>)>>,
    pub favourited: Mutex<Vec<String>>,
    pub boosted: Mutex<Vec<String>>,
}

impl MockStatusService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusService for MockStatusService {
    fn publish(&self, body: &str, sensitive: bool, spoiler: Option<&str>) -> Result<Status> {
        self.published.lock().unwrap().push((
            body.to_string(),
            sensitive,
            spoiler.map(str::to_string),
        ));
        Ok(echo_status("posted-1", body))
    }

    fn favourite(&self, id: &str) -> Result<Status> {
        self.favourited.lock().unwrap().push(id.to_string());
        Ok(echo_status(id, ""))
    }

    fn boost(&self, id: &str) -> Result<Status> {
        self.boosted.lock().unwrap().push(id.to_string());
        Ok(echo_status(id, ""))
    }
}

fn echo_status(id: &str, body: &str) -> Status {
    Status {
        id: id.to_string(),
        created_at: DateTime::<Utc>::UNIX_EPOCH,
        account: mastodon::Account {
            id: "0".into(),
            acct: "masto-cli".into(),
            display_name: String::new(),
            note: String::new(),
            followers_count: 0,
            following_count: 0,
            statuses_count: 0,
            last_status_at: None,
        },
        content: body.to_string(),
        visibility: Default::default(),
        sensitive: false,
        spoiler_text: String::new(),
        favourites_count: 0,
        reblogs_count: 0,
        favourited: false,
        reblogged: false,
        media_attachments: Vec::new(),
        application: None,
    }
}
