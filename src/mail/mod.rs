mod sandbox;

pub use sandbox::{DeliveredMail, SandboxChannel, SandboxMailer};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Sender identity stamped on every campaign message.
pub const FROM_ADDRESS: &str = "\"Geek News\" <no-reply@geek.news>";

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// An open outbound channel. One is created per campaign send and dropped
/// afterwards.
#[async_trait]
pub trait MailChannel: Send + Sync {
    /// Delivers one message. On success, returns a human-inspectable
    /// preview URL when the transport offers one.
    async fn send(&self, mail: &OutboundEmail) -> Result<Option<String>>;
}

/// Outbound mail transport. Channels carry a transient credential, standing
/// in for a real mail account.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn open_channel(&self) -> Result<Arc<dyn MailChannel>>;
}

/// Minimal HTML template for campaign bodies: escaped text with newlines
/// turned into line breaks.
#[must_use]
pub fn render_campaign_html(subject: &str, body: &str) -> String {
    format!(
        "<div style=\"font-family:system-ui,Arial,sans-serif;\">\
         <h2>{}</h2><div>{}</div></div>",
        escape_html(subject),
        escape_html(body).replace('\n', "<br>"),
    )
}

#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_render_campaign_html() {
        let html = render_campaign_html("Hi <all>", "line one\nline two");
        assert!(html.contains("<h2>Hi &lt;all&gt;</h2>"));
        assert!(html.contains("line one<br>line two"));
    }
}
