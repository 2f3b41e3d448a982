use chrono::{DateTime, Utc};

const RENDER_WIDTH: usize = 78;

#[derive(Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Converts a post body (HTML) to plain text.
    pub fn to_plain_text(&self, html: &str) -> String {
        html2text::from_read(html.as_bytes(), RENDER_WIDTH)
            .trim_end()
            .to_string()
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}
