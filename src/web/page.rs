//! HTML for the browser UI and the offline report. Board images are inlined SVG.

use std::fmt::Write;

use crate::board::svg;
use crate::config::{MAX_TURNS, MIN_TURNS};
use crate::orchestrator::TurnRecord;
use crate::prompt::side_name;
use crate::session::Session;

pub const TITLE: &str = "Agent White vs Agent Black";
pub const MISSING_KEY_WARNING: &str = "Enter your Gemini API key in the sidebar.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    pub fn success(text: impl Into<String>) -> Self { Self { kind: BannerKind::Success, text: text.into() } }
    pub fn warning(text: impl Into<String>) -> Self { Self { kind: BannerKind::Warning, text: text.into() } }
    pub fn error(text: impl Into<String>) -> Self { Self { kind: BannerKind::Error, text: text.into() } }

    fn class(&self) -> &'static str {
        match self.kind {
            BannerKind::Success => "success",
            BannerKind::Warning => "warning",
            BannerKind::Error => "error",
        }
    }
}

pub fn escape(s: &str) -> String {
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

const STYLE: &str = "body{font-family:sans-serif;margin:0;display:flex}\
aside{width:18rem;min-height:100vh;padding:1rem;background:#f0f2f6}\
main{padding:1rem 2rem}\
.banner{padding:.6rem 1rem;border-radius:.4rem;margin:.5rem 0}\
.success{background:#dff5e3}.warning{background:#fff4d6}.error{background:#fde2e2}\
form{margin:.5rem 0}label{display:block;margin:.4rem 0}";

fn open_document(out: &mut String) {
    let _ = write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{TITLE}</title><style>{STYLE}</style></head><body>"
    );
}

fn write_banners(out: &mut String, banners: &[Banner]) {
    for b in banners {
        let _ = write!(out, "<div class=\"banner {}\">{}</div>", b.class(), escape(&b.text));
    }
}

/// "Move N by Side" followed by the board after that move, oldest first.
pub fn render_history(out: &mut String, history: &[TurnRecord]) {
    if history.is_empty() { return; }
    out.push_str("<section id=\"history\"><h2>Move History</h2>");
    for (i, rec) in history.iter().enumerate() {
        let _ = write!(
            out,
            "<figure><figcaption>Move {} by {} ({})</figcaption>{}</figure>",
            i + 1,
            side_name(rec.side),
            escape(&rec.uci),
            rec.svg
        );
    }
    out.push_str("</section>");
}

/// The interactive page: sidebar with the key and turn-cap inputs, then the board,
/// the Start/Reset buttons, any messages, and the move history.
pub fn render_index(session: &Session, max_turns: u32, banners: &[Banner], board_size: u32) -> String {
    let mut out = String::with_capacity(64 * 1024);
    open_document(&mut out);
    let _ = write!(
        out,
        "<aside><h2>Gemini Configuration</h2>\
         <form method=\"post\" action=\"/credential\"><label>Enter Gemini API key:\
         <input type=\"password\" name=\"api_key\" autocomplete=\"off\"></label>\
         <button type=\"submit\">Save key</button></form>"
    );
    if session.has_credential() {
        out.push_str("<div class=\"banner success\">API key saved!</div>");
    }
    let _ = write!(
        out,
        "<form id=\"start\" method=\"post\" action=\"/start\"><label>Max number of turns\
         <input type=\"number\" name=\"max_turns\" min=\"{MIN_TURNS}\" max=\"{MAX_TURNS}\" value=\"{max_turns}\"></label></form>\
         </aside><main><h1>{TITLE}</h1>"
    );
    write_banners(&mut out, banners);

    if !session.has_credential() {
        write_banners(&mut out, &[Banner::warning(MISSING_KEY_WARNING)]);
    } else {
        out.push_str("<h2>Board</h2>");
        out.push_str(&svg::render(&session.position, None, board_size));
        out.push_str(
            "<div><button type=\"submit\" form=\"start\">Start Game</button>\
             <form method=\"post\" action=\"/reset\" style=\"display:inline\"><button type=\"submit\">Reset Game</button></form></div>",
        );
        render_history(&mut out, &session.history);
    }
    out.push_str("</main></body></html>");
    out
}

/// Static page for a finished headless game.
pub fn render_report(session: &Session, result_line: &str, failures: &[String], board_size: u32) -> String {
    let mut out = String::with_capacity(64 * 1024);
    open_document(&mut out);
    let _ = write!(out, "<main><h1>{TITLE}</h1>");
    let mut banners: Vec<Banner> = failures.iter().map(Banner::error).collect();
    banners.push(Banner::success(result_line));
    write_banners(&mut out, &banners);
    out.push_str("<h2>Final position</h2>");
    out.push_str(&svg::render(&session.position, None, board_size));
    render_history(&mut out, &session.history);
    out.push_str("</main></body></html>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<b>\"e2e4\" & 'x'</b>"), "&lt;b&gt;&quot;e2e4&quot; &amp; &#39;x&#39;&lt;/b&gt;");
    }

    #[test]
    fn index_without_key_only_warns() {
        let html = render_index(&Session::new(), 10, &[], svg::DEFAULT_SIZE);
        assert!(html.contains(MISSING_KEY_WARNING));
        assert!(!html.contains("Start Game"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn index_with_key_shows_board_and_buttons() {
        let mut s = Session::new();
        s.set_credential("key");
        let html = render_index(&s, 42, &[Banner::error("boom <x>")], svg::DEFAULT_SIZE);
        assert!(html.contains("Start Game"));
        assert!(html.contains("Reset Game"));
        assert!(html.contains("value=\"42\""));
        assert!(html.contains("boom &lt;x&gt;"));
        assert_eq!(html.matches("<svg").count(), 1);
    }
}
