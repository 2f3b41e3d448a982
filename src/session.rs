use crate::mastodon::{Account, Notification, NotificationKind, Status};

/// Small session-local number the user types instead of a remote id.
pub type LocalRef = u64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("nothing fetched yet to act on")]
    NothingFetched,
    #[error("no entry with ID {0} in the last results")]
    UnknownRef(LocalRef),
}

#[derive(Debug, Clone)]
pub struct IndexedStatus {
    pub local_ref: LocalRef,
    pub status: Status,
}

#[derive(Debug, Clone)]
pub struct IndexedNotification {
    /// Present only for mentions, which embed a selectable status.
    pub local_ref: Option<LocalRef>,
    pub notification: Notification,
}

/// The one collection selection commands can currently act on. Replaced
/// wholesale on every successful fetch, never merged.
#[derive(Debug, Clone, Default)]
pub enum ActiveSet {
    #[default]
    Unset,
    Timeline(Vec<IndexedStatus>),
    Notifications(Vec<IndexedNotification>),
}

pub struct Session {
    user: Account,
    counter: LocalRef,
    active: ActiveSet,
}

impl Session {
    pub fn new(user: Account) -> Self {
        Self {
            user,
            counter: 0,
            active: ActiveSet::Unset,
        }
    }

    pub fn user(&self) -> &Account {
        &self.user
    }

    pub fn active(&self) -> &ActiveSet {
        &self.active
    }

    fn next_ref(&mut self) -> LocalRef {
        self.counter += 1;
        self.counter
    }

    /// Stamps a timeline batch with LocalRefs and installs it as the active
    /// set. The wire order is newest-first; the batch is reversed so that the
    /// stored order is chronological and refs ascend oldest-to-newest.
    pub fn install_timeline(&mut self, batch: Vec<Status>) -> &[IndexedStatus] {
        let mut indexed = Vec::with_capacity(batch.len());
        for status in batch.into_iter().rev() {
            let local_ref = self.next_ref();
            indexed.push(IndexedStatus { local_ref, status });
        }
        self.active = ActiveSet::Timeline(indexed);
        match &self.active {
            ActiveSet::Timeline(items) => items,
            _ => &[],
        }
    }

    /// Same as [`install_timeline`](Self::install_timeline) for a
    /// notification batch. Only mentions carry a selectable embedded status,
    /// so only they consume a ref.
    pub fn install_notifications(&mut self, batch: Vec<Notification>) -> &[IndexedNotification] {
        let mut indexed = Vec::with_capacity(batch.len());
        for notification in batch.into_iter().rev() {
            let selectable =
                notification.kind == NotificationKind::Mention && notification.status.is_some();
            let local_ref = selectable.then(|| self.next_ref());
            indexed.push(IndexedNotification {
                local_ref,
                notification,
            });
        }
        self.active = ActiveSet::Notifications(indexed);
        match &self.active {
            ActiveSet::Notifications(items) => items,
            _ => &[],
        }
    }

    /// Looks a ref up in the active set only. Refs stamped by a superseded
    /// batch are gone even though the numbers were once shown.
    pub fn resolve(&self, wanted: LocalRef) -> Result<&Status, SelectionError> {
        match &self.active {
            ActiveSet::Unset => Err(SelectionError::NothingFetched),
            ActiveSet::Timeline(items) => items
                .iter()
                .find(|item| item.local_ref == wanted)
                .map(|item| &item.status)
                .ok_or(SelectionError::UnknownRef(wanted)),
            ActiveSet::Notifications(items) => items
                .iter()
                .find(|item| item.local_ref == Some(wanted))
                .and_then(|item| item.notification.status.as_ref())
                .ok_or(SelectionError::UnknownRef(wanted)),
        }
    }
}
