use std::sync::Arc;

use anyhow::Result;

use crate::console::Console;
use crate::data::{FeedService, StatusService};
use crate::mastodon::{NotificationKind, Status, TimelineKind};
use crate::render::{self, Renderer};
use crate::session::{IndexedNotification, LocalRef, Session};

/// Instance-side cap on status length, counted in characters.
pub const STATUS_CHAR_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Home,
    Local,
    Notifications,
    Toot,
    CwToot,
    Favourite,
    Boost,
    Quit,
    Unknown,
}

impl Command {
    fn parse(input: &str) -> Command {
        match input.trim().to_ascii_lowercase().as_str() {
            "home" => Command::Home,
            "local" => Command::Local,
            "note" | "notes" => Command::Notifications,
            "toot" => Command::Toot,
            "cwtoot" => Command::CwToot,
            "fav" => Command::Favourite,
            "boost" => Command::Boost,
            "exit" | "quit" => Command::Quit,
            _ => Command::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SelectionAction {
    Favourite,
    Boost,
}

impl SelectionAction {
    fn verb(self) -> &'static str {
        match self {
            SelectionAction::Favourite => "favorited",
            SelectionAction::Boost => "boosted",
        }
    }
}

pub struct Engine<C: Console> {
    session: Session,
    feeds: Arc<dyn FeedService>,
    statuses: Arc<dyn StatusService>,
    renderer: Renderer,
    console: C,
}

impl<C: Console> Engine<C> {
    pub fn new(
        session: Session,
        feeds: Arc<dyn FeedService>,
        statuses: Arc<dyn StatusService>,
        renderer: Renderer,
        console: C,
    ) -> Self {
        Self {
            session,
            feeds,
            statuses,
            renderer,
            console,
        }
    }

    /// Runs until `exit`/`quit` or end of input. A failed command reports
    /// and returns to the prompt; it never tears the session down.
    pub fn run(&mut self) -> Result<()> {
        let prompt = format!("[{}]: ", self.session.user().acct);
        loop {
            let Some(line) = self.console.prompt(&prompt)? else {
                break;
            };
            match Command::parse(&line) {
                Command::Quit => break,
                Command::Unknown => continue,
                command => {
                    if let Err(err) = self.dispatch(command) {
                        self.console.write_line(&format!("Error: {err:#}"))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Home => self.show_timeline(TimelineKind::Home),
            Command::Local => self.show_timeline(TimelineKind::Local),
            Command::Notifications => self.show_notifications(),
            Command::Toot => self.compose(false),
            Command::CwToot => self.compose(true),
            Command::Favourite => self.act_on_selection(SelectionAction::Favourite),
            Command::Boost => self.act_on_selection(SelectionAction::Boost),
            Command::Quit | Command::Unknown => Ok(()),
        }
    }

    fn show_timeline(&mut self, kind: TimelineKind) -> Result<()> {
        let batch = self.feeds.load_timeline(kind)?;
        let items = self.session.install_timeline(batch).to_vec();
        for item in &items {
            self.print_status(Some(item.local_ref), &item.status)?;
        }
        Ok(())
    }

    fn show_notifications(&mut self) -> Result<()> {
        let batch = self.feeds.load_notifications()?;
        let items = self.session.install_notifications(batch).to_vec();
        for item in &items {
            self.print_notification(item)?;
        }
        Ok(())
    }

    fn compose(&mut self, with_warning: bool) -> Result<()> {
        let spoiler = if with_warning {
            let Some(text) = self.console.prompt("\nEnter your spoiler text.\n> ")? else {
                return Ok(());
            };
            Some(text)
        } else {
            None
        };
        let Some(body) = self.read_body()? else {
            return Ok(());
        };
        let posted = self.statuses.publish(&body, with_warning, spoiler.as_deref())?;
        self.console
            .write_line(&format!("Successfully posted toot: {}\n", posted.id))?;
        Ok(())
    }

    fn read_body(&mut self) -> Result<Option<String>> {
        self.console.write_line("\nEnter your toot.")?;
        loop {
            let Some(text) = self.console.prompt("> ")? else {
                return Ok(None);
            };
            if text.chars().count() > STATUS_CHAR_LIMIT {
                self.console
                    .write_line("That toot is too long! Try again...")?;
                continue;
            }
            return Ok(Some(text));
        }
    }

    fn act_on_selection(&mut self, action: SelectionAction) -> Result<()> {
        let Some(wanted) = self.read_selection()? else {
            return Ok(());
        };
        // Zero means no selection and must not touch the cache.
        if wanted == 0 {
            return Ok(());
        }

        let status = match self.session.resolve(wanted) {
            Ok(status) => status.clone(),
            Err(err) => {
                self.console.write_line(&err.to_string())?;
                return Ok(());
            }
        };

        match action {
            SelectionAction::Favourite => self.statuses.favourite(&status.id)?,
            SelectionAction::Boost => self.statuses.boost(&status.id)?,
        };
        let body = self.renderer.to_plain_text(&status.content);
        self.console
            .write_line(&format!("Successfully {}: {}", action.verb(), body))?;
        Ok(())
    }

    fn read_selection(&mut self) -> Result<Option<LocalRef>> {
        self.console.write_line("\nEnter the ID.")?;
        let Some(input) = self.console.prompt("> ")? else {
            return Ok(None);
        };
        match input.trim().parse::<LocalRef>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                self.console.write_line(&format!(
                    "{} is not a valid ID! You must enter a number from the last results...",
                    input.trim()
                ))?;
                Ok(Some(0))
            }
        }
    }

    fn print_status(&mut self, local_ref: Option<LocalRef>, status: &Status) -> Result<()> {
        self.console.write_line(&format!(
            "> {} from |{}| to |{}| at {}",
            status.account.acct,
            status.application_name(),
            status.visibility.as_str(),
            render::format_timestamp(&status.created_at)
        ))?;
        if status.sensitive {
            self.console
                .write_line(&format!(">> CW: {}", status.spoiler_text))?;
        }
        self.print_status_body(local_ref, status)
    }

    fn print_status_body(&mut self, local_ref: Option<LocalRef>, status: &Status) -> Result<()> {
        let body = self.renderer.to_plain_text(&status.content);
        self.console.write_line("")?;
        self.console.write_line(&body)?;
        for media in &status.media_attachments {
            self.console
                .write_line(&format!("{}: {}", media.kind.as_str(), media.url))?;
        }
        let shown_ref = match local_ref {
            Some(value) => value.to_string(),
            None => "-".to_string(),
        };
        self.console.write_line(&format!(
            "~=: ID: {}\tFavs: {}\tBoosts: {} :=~\n",
            shown_ref, status.favourites_count, status.reblogs_count
        ))?;
        Ok(())
    }

    fn print_notification(&mut self, item: &IndexedNotification) -> Result<()> {
        let note = &item.notification;
        let actor = &note.account.acct;
        match note.kind {
            NotificationKind::Mention => {
                if let Some(status) = &note.status {
                    self.console.write_line(&format!(
                        "> Mention by {} from |{}| to |{}| at {}",
                        actor,
                        status.application_name(),
                        status.visibility.as_str(),
                        render::format_timestamp(&status.created_at)
                    ))?;
                    self.print_status_body(item.local_ref, status)?;
                } else {
                    self.console
                        .write_line(&format!("> Mention by {}", actor))?;
                }
            }
            NotificationKind::Favourite => {
                self.console.write_line(&format!("> Favorite by {}", actor))?;
                if let Some(status) = &note.status {
                    self.print_status_body(None, status)?;
                }
            }
            NotificationKind::Reblog => {
                self.console.write_line(&format!("> Boost by {}", actor))?;
                if let Some(status) = &note.status {
                    self.print_status_body(None, status)?;
                }
            }
            NotificationKind::Follow => {
                let bio = self.renderer.to_plain_text(&note.account.note);
                self.console
                    .write_line(&format!("> Followed by {}", actor))?;
                self.console.write_line(&format!(
                    ">> Has posted {} statuses, the last on {}",
                    note.account.statuses_count,
                    note.account.last_status_display()
                ))?;
                self.console.write_line(&bio)?;
                self.console.write_line(&format!(
                    "~=: Following: {}\tFollowers: {} :=~\n",
                    note.account.following_count, note.account.followers_count
                ))?;
            }
            NotificationKind::Other => {
                self.console
                    .write_line(&format!("> Unhandled notification from {}\n", actor))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MockFeedService, MockStatusService};
    use crate::mastodon::{Account, Notification, Visibility};
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;

    struct ScriptedConsole {
        inputs: VecDeque<String>,
        output: Vec<String>,
    }

    impl ScriptedConsole {
        fn new(lines: &[&str]) -> Self {
            Self {
                inputs: lines.iter().map(|line| line.to_string()).collect(),
                output: Vec::new(),
            }
        }

        fn printed(&self) -> String {
            self.output.join("\n")
        }
    }

    impl Console for ScriptedConsole {
        fn prompt(&mut self, _text: &str) -> Result<Option<String>> {
            Ok(self.inputs.pop_front())
        }

        fn write_line(&mut self, line: &str) -> Result<()> {
            self.output.push(line.to_string());
            Ok(())
        }
    }

    fn account(acct: &str) -> Account {
        Account {
            id: format!("id-{acct}"),
            acct: acct.to_string(),
            display_name: String::new(),
            note: String::new(),
            followers_count: 0,
            following_count: 0,
            statuses_count: 0,
            last_status_at: None,
        }
    }

    fn status(id: &str, minute: u32) -> Status {
        Status {
            id: id.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
            account: account("author"),
            content: format!("<p>post {id}</p>"),
            visibility: Visibility::Public,
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

    fn mention(id: &str, status: Status) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationKind::Mention,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap(),
            account: account("mentioner"),
            status: Some(status),
        }
    }

    fn follow(id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationKind::Follow,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap(),
            account: account("newfriend"),
            status: None,
        }
    }

    struct Harness {
        feeds: Arc<MockFeedService>,
        statuses: Arc<MockStatusService>,
        engine: Engine<ScriptedConsole>,
    }

    fn harness(script: &[&str]) -> Harness {
        let feeds = Arc::new(MockFeedService::new());
        let statuses = Arc::new(MockStatusService::new());
        let engine = Engine::new(
            Session::new(account("me")),
            feeds.clone(),
            statuses.clone(),
            Renderer::new(),
            ScriptedConsole::new(script),
        );
        Harness {
            feeds,
            statuses,
            engine,
        }
    }

    #[test]
    fn home_prints_oldest_first_with_ascending_refs() {
        let mut h = harness(&["home"]);
        // Wire order newest-first: B then A.
        h.feeds.push_timeline(vec![status("B", 30), status("A", 10)]);
        h.engine.run().unwrap();

        let printed = h.engine.console.printed();
        let pos_a = printed.find("post A").unwrap();
        let pos_b = printed.find("post B").unwrap();
        assert!(pos_a < pos_b, "expected oldest first:\n{printed}");
        let pos_1 = printed.find("ID: 1").unwrap();
        let pos_2 = printed.find("ID: 2").unwrap();
        assert!(pos_1 < pos_2);
    }

    #[test]
    fn fetch_error_reports_and_keeps_previous_results_selectable() {
        let mut h = harness(&["home", "home", "fav", "1"]);
        h.feeds.push_timeline(vec![status("B", 30), status("A", 10)]);
        h.feeds.push_timeline_error("connection reset");
        h.engine.run().unwrap();

        let printed = h.engine.console.printed();
        assert!(printed.contains("Error:"), "missing report:\n{printed}");
        assert!(printed.contains("connection reset"));
        // The failed fetch left the first batch active, so ref 1 still works.
        assert_eq!(*h.statuses.favourited.lock().unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn notifications_supersede_timeline_refs() {
        let mut h = harness(&["home", "notes", "fav", "1", "fav", "3"]);
        h.feeds.push_timeline(vec![status("B", 30), status("A", 10)]);
        h.feeds.push_notifications(vec![mention("n1", status("C", 40))]);
        h.engine.run().unwrap();

        let printed = h.engine.console.printed();
        assert!(
            printed.contains("no entry with ID 1"),
            "stale ref should not resolve:\n{printed}"
        );
        assert_eq!(*h.statuses.favourited.lock().unwrap(), vec!["C".to_string()]);
    }

    #[test]
    fn boost_routes_to_the_boost_endpoint() {
        let mut h = harness(&["home", "boost", "2"]);
        h.feeds.push_timeline(vec![status("B", 30), status("A", 10)]);
        h.engine.run().unwrap();

        assert_eq!(*h.statuses.boosted.lock().unwrap(), vec!["B".to_string()]);
        assert!(h.statuses.favourited.lock().unwrap().is_empty());
        assert!(h.engine.console.printed().contains("Successfully boosted"));
    }

    #[test]
    fn compose_reprompts_until_within_limit() {
        let long = "x".repeat(STATUS_CHAR_LIMIT + 1);
        let exact = "y".repeat(STATUS_CHAR_LIMIT);
        let mut h = harness(&["toot", &long, &exact]);
        h.engine.run().unwrap();

        let published = h.statuses.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, exact);
        assert!(!published[0].1);
        assert!(h.engine.console.printed().contains("too long"));
    }

    #[test]
    fn cwtoot_attaches_spoiler_and_sensitivity() {
        let mut h = harness(&["cwtoot", "politics", "a take"]);
        h.engine.run().unwrap();

        let published = h.statuses.published.lock().unwrap();
        assert_eq!(
            *published,
            vec![("a take".to_string(), true, Some("politics".to_string()))]
        );
        assert!(h
            .engine
            .console
            .printed()
            .contains("Successfully posted toot: posted-1"));
    }

    #[test]
    fn unparseable_selection_short_circuits_before_the_cache() {
        let mut h = harness(&["fav", "abc"]);
        h.engine.run().unwrap();

        let printed = h.engine.console.printed();
        assert!(printed.contains("not a valid ID"));
        // Substituted zero must not reach resolution.
        assert!(!printed.contains("nothing fetched"));
        assert!(h.statuses.favourited.lock().unwrap().is_empty());
    }

    #[test]
    fn selection_with_nothing_fetched_reports() {
        let mut h = harness(&["fav", "1"]);
        h.engine.run().unwrap();

        assert!(h
            .engine
            .console
            .printed()
            .contains("nothing fetched yet to act on"));
        assert!(h.statuses.favourited.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_commands_are_ignored_and_the_loop_continues() {
        let mut h = harness(&["frobnicate", "home"]);
        h.feeds.push_timeline(vec![status("A", 10)]);
        h.engine.run().unwrap();

        assert!(h.engine.console.printed().contains("ID: 1"));
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut h = harness(&["quit", "home"]);
        h.feeds.push_timeline(vec![status("A", 10)]);
        h.engine.run().unwrap();

        assert!(h.engine.console.printed().is_empty());
    }

    #[test]
    fn notification_batch_prints_every_kind() {
        let mut h = harness(&["notes"]);
        h.feeds
            .push_notifications(vec![mention("n2", status("M", 50)), follow("n1")]);
        h.engine.run().unwrap();

        let printed = h.engine.console.printed();
        // Stored order is oldest-first: the follow arrived before the mention.
        let pos_follow = printed.find("Followed by newfriend").unwrap();
        let pos_mention = printed.find("Mention by mentioner").unwrap();
        assert!(pos_follow < pos_mention);
        assert!(printed.contains("ID: 1"));
    }
}
