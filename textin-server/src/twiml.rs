//! TwiML replies for the SMS webhook.

/// Render a messaging response carrying `reply`, or an empty response.
pub fn render(reply: Option<&str>) -> String {
    let mut out = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    match reply {
        Some(text) => {
            out.push_str("<Response><Message>");
            out.push_str(&escape(text));
            out.push_str("</Message></Response>");
        }
        None => out.push_str("<Response/>"),
    }
    out
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
