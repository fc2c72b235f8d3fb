use axum::http::header;
use axum::response::{IntoResponse, Response};

/// A TwiML reply carrying a single text message.
pub struct MessagingResponse(pub String);

impl MessagingResponse {
    pub fn render(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Response><Message>{}</Message></Response>"#,
            escape_xml(&self.0)
        )
    }
}

impl IntoResponse for MessagingResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "application/xml")], self.render()).into_response()
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
