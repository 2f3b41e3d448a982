use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::config;
use crate::console::StdioConsole;
use crate::data::{self, FeedService, StatusService};
use crate::engine::Engine;
use crate::mastodon;
use crate::render::Renderer;
use crate::session::Session;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let config_path = config::default_path();
    let display_path = friendly_path(config_path.as_ref());

    if cfg.mastodon.instance.trim().is_empty() || cfg.mastodon.access_token.trim().is_empty() {
        bail!(
            "mastodon.instance and mastodon.access_token must be set in {} (or via MASTO_* environment variables)",
            display_path
        );
    }

    let client = Arc::new(
        mastodon::Client::new(mastodon::ClientConfig {
            instance: cfg.mastodon.instance.clone(),
            access_token: cfg.mastodon.access_token.clone(),
            user_agent: cfg.mastodon.user_agent.clone(),
            page_size: cfg.mastodon.page_size,
            http_client: None,
        })
        .context("build mastodon client")?,
    );

    // An invalid credential is the one startup error that ends the session.
    client.verify_token().context("verify access token")?;
    let user = client.current_user().context("load signed-in account")?;

    println!("Logged in as: {}", user.acct);
    println!(
        "{} statuses, last one posted on {}\n",
        user.statuses_count,
        user.last_status_display()
    );

    let feeds: Arc<dyn FeedService> = Arc::new(data::MastodonFeedService::new(client.clone()));
    let statuses: Arc<dyn StatusService> = Arc::new(data::MastodonStatusService::new(client));

    let mut engine = Engine::new(
        Session::new(user),
        feeds,
        statuses,
        Renderer::new(),
        StdioConsole,
    );
    engine.run()
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/masto-cli/config.yaml".to_string()
    }
}
