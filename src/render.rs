//! Text rendering for every page.
//!
//! All functions here are pure: they take page state and return a `String`.
//! Output goes to stdout; diagnostics go through `tracing` on stderr, so
//! piping `mdash` output stays clean.

use crate::chat::{KnowledgeBase, Message, MessageKind, SUGGESTED_QUESTIONS};
use crate::config::UiConfig;
use crate::dashboard::{Dashboard, Tone, QUICK_ACTIONS};
use crate::nav::{Page, Sidebar};
use crate::reports::{category_counts, ReportsPage, CATALOG};
use crate::search::{ClientSearch, SearchView};

/// Default line width for chat bubbles.
pub const DEFAULT_WIDTH: usize = 72;

/// ANSI styling, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }

    /// `ui.color`: `always`, `never`, or `auto` (color when stdout is a TTY).
    pub fn from_config(ui: &UiConfig) -> Self {
        match ui.color.as_str() {
            "always" => Self::colored(),
            "never" => Self::plain(),
            _ => Self {
                color: atty::is(atty::Stream::Stdout),
            },
        }
    }

    fn wrap(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    pub fn tone(&self, tone: Tone, text: &str) -> String {
        let code = match tone {
            Tone::Green => "32",
            Tone::Yellow => "33",
            Tone::Blue => "34",
            Tone::Purple => "35",
            Tone::Indigo => "94",
        };
        self.wrap(code, text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.wrap("1", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.wrap("2", text)
    }

    pub fn red(&self, text: &str) -> String {
        self.wrap("31", text)
    }
}

fn title(out: &mut String, palette: &Palette, text: &str) {
    out.push_str(&palette.bold(text));
    out.push('\n');
    out.push_str(&"=".repeat(text.chars().count()));
    out.push_str("\n\n");
}

/// Word-wrap `text` to `width` columns, keeping explicit newlines.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(8);
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let mut line = String::new();
        for word in raw.split_whitespace() {
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

/// Capitalize each word ("chromadb" → "Chromadb").
fn capitalize(s: &str) -> String {
    s.split(&['_', ' '][..])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============ Chrome ============

/// Brand, banner, and navigation for the interactive shell.
pub fn header(ui: &UiConfig, sidebar: &Sidebar, current: Page, palette: &Palette) -> String {
    let mut out = String::new();
    out.push_str(&palette.bold(sidebar.brand(ui)));
    if sidebar.is_open() {
        out.push_str(&format!("  {}", palette.dim(&ui.subtitle)));
    }
    out.push('\n');

    let nav: Vec<String> = Page::ALL
        .iter()
        .map(|p| {
            let label = if sidebar.is_open() {
                p.label().to_string()
            } else {
                p.route().to_string()
            };
            if *p == current {
                palette.bold(&format!("[{}]", label))
            } else {
                label
            }
        })
        .collect();
    out.push_str(&nav.join("  "));
    out.push('\n');

    out.push_str(&format!(
        "{}  {}\n\n",
        ui.banner,
        palette.dim(&format!(
            "Connected to: {}",
            palette.tone(Tone::Green, &format!("{} databases", ui.data_sources.len()))
        ))
    ));
    out
}

// ============ Dashboard ============

pub fn dashboard(dash: &Dashboard, palette: &Palette) -> String {
    let mut out = String::new();
    title(&mut out, palette, "System Dashboard");

    for card in dash.cards() {
        out.push_str(&format!(
            "  {:<20} {}\n",
            card.title,
            palette.tone(card.tone, &card.value)
        ));
    }
    if let Some(err) = dash.documents_error() {
        out.push_str(&format!("  {}\n", palette.dim(&format!("documents: {}", err))));
    }
    out.push('\n');

    out.push_str(&service_checks(dash, palette));

    out.push_str(&format!("  {}\n", palette.bold("Quick Actions")));
    let actions: Vec<String> = QUICK_ACTIONS
        .iter()
        .map(|a| match a.target {
            Some(page) => format!("{} ({})", a.label, page.route()),
            None => a.label.to_string(),
        })
        .collect();
    out.push_str(&format!("  {}\n", actions.join("  ·  ")));
    out
}

/// "Service Health Checks" block plus the last-checked line.
pub fn service_checks(dash: &Dashboard, palette: &Palette) -> String {
    let mut out = String::new();
    out.push_str(&format!("  {}\n", palette.bold("Service Health Checks")));

    let checks = dash.service_checks();
    if checks.is_empty() && dash.health_error().is_none() {
        out.push_str(&format!("  {}\n", palette.dim("checking...")));
    }
    for check in &checks {
        let tone = if check.ok { Tone::Green } else { Tone::Yellow };
        out.push_str(&format!(
            "  {:<20} {}\n",
            capitalize(&check.service),
            palette.tone(tone, &check.status)
        ));
    }

    if let Some(err) = dash.health_error() {
        out.push_str(&format!("  {}\n", palette.red(&format!("health check failed: {}", err))));
    }
    if let Some(at) = dash.checked_at() {
        out.push_str(&format!(
            "  {}\n",
            palette.dim(&format!("Last checked: {}", at.format("%Y-%m-%d %H:%M:%S UTC")))
        ));
    }
    out.push('\n');
    out
}

// ============ Knowledge base ============

/// One chat bubble. User messages are right-aligned; assistant and error
/// messages are left-aligned behind a badge.
pub fn message(msg: &Message, palette: &Palette, width: usize) -> String {
    let width = width.max(20);
    let bubble = (width * 7 / 10).max(12);
    let mut out = String::new();

    match msg.kind {
        MessageKind::User => {
            let badge = "[you]";
            out.push_str(&format!("{:>width$}\n", badge, width = width));
            for line in wrap_text(&msg.text, bubble) {
                let pad = width.saturating_sub(line.chars().count());
                out.push_str(&" ".repeat(pad));
                out.push_str(&line);
                out.push('\n');
            }
        }
        MessageKind::Assistant | MessageKind::Error => {
            let is_error = msg.kind == MessageKind::Error;
            let badge = if is_error { "[error]" } else { "[bot]" };
            let indent = " ".repeat(badge.len() + 1);
            for (i, line) in wrap_text(&msg.text, bubble).iter().enumerate() {
                let text = if is_error {
                    palette.red(line)
                } else {
                    line.to_string()
                };
                if i == 0 {
                    let badge = if is_error {
                        palette.red(badge)
                    } else {
                        palette.tone(Tone::Blue, badge)
                    };
                    out.push_str(&format!("{} {}\n", badge, text));
                } else {
                    out.push_str(&format!("{}{}\n", indent, text));
                }
            }

            if !msg.sources.is_empty() {
                out.push_str(&format!("{}{}\n", indent, palette.dim("Sources:")));
                for source in &msg.sources {
                    out.push_str(&format!(
                        "{}  - {}\n",
                        indent,
                        palette.dim(source.display_name())
                    ));
                }
            }
        }
    }
    out
}

/// The knowledge-base page: transcript, thinking indicator, or the
/// get-started prompt with suggestions.
pub fn transcript(kb: &KnowledgeBase, palette: &Palette, width: usize) -> String {
    let mut out = String::new();

    if kb.transcript().is_empty() && !kb.is_thinking() {
        out.push_str("Ask a question to get started\n");
        for (i, q) in SUGGESTED_QUESTIONS.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, palette.dim(q)));
        }
        return out;
    }

    for msg in kb.transcript().iter() {
        out.push_str(&message(msg, palette, width));
        out.push('\n');
    }
    if kb.is_thinking() {
        out.push_str(&format!("{}\n", palette.dim("[bot] Thinking...")));
    }
    out
}

// ============ Client search ============

pub fn client_search(page: &ClientSearch, ui: &UiConfig, palette: &Palette) -> String {
    let mut out = String::new();
    if page.is_busy() {
        out.push_str(&format!("{}\n", palette.dim(page.submit_label())));
    }

    match page.view() {
        SearchView::Prompt => {
            out.push_str("Search for clients across all merged databases\n");
            out.push_str(&format!(
                "{}\n",
                palette.dim(&format!("Data sources: {}", ui.data_sources.join(", ")))
            ));
        }
        SearchView::NoMatches { query } => {
            out.push_str(&format!("No clients found matching \"{}\"\n", query));
        }
        SearchView::Failed { query, error } => {
            out.push_str(&palette.red(&format!(
                "Search for \"{}\" failed: {}",
                query, error
            )));
            out.push('\n');
        }
        SearchView::Results { rows, .. } => {
            let name_w = rows
                .iter()
                .map(|r| {
                    let dba = r.dba().map(|d| d.chars().count() + 7).unwrap_or(0);
                    r.legal_name.chars().count().max(dba)
                })
                .max()
                .unwrap_or(0)
                .max(6);
            let tax_w = rows
                .iter()
                .map(|r| r.tax_id_display().chars().count())
                .max()
                .unwrap_or(0)
                .max(6);

            out.push_str(&format!(
                "{:<name_w$}  {:<tax_w$}  {}\n",
                "CLIENT",
                "TAX ID",
                "TYPE",
                name_w = name_w,
                tax_w = tax_w
            ));
            out.push_str(&"-".repeat(name_w + tax_w + 16));
            out.push('\n');
            for r in rows {
                out.push_str(&format!(
                    "{:<name_w$}  {:<tax_w$}  {}\n",
                    r.legal_name,
                    r.tax_id_display(),
                    palette.tone(Tone::Blue, &r.org_type),
                    name_w = name_w,
                    tax_w = tax_w
                ));
                if let Some(dba) = r.dba() {
                    out.push_str(&format!("  {}\n", palette.dim(&format!("DBA: {}", dba))));
                }
            }
            out.push_str(&format!(
                "\n{}\n",
                palette.dim(&format!(
                    "{} client{}",
                    rows.len(),
                    if rows.len() == 1 { "" } else { "s" }
                ))
            ));
        }
    }
    out
}

// ============ Reports ============

pub fn reports(page: &ReportsPage, palette: &Palette) -> String {
    let mut out = String::new();
    title(&mut out, palette, "Reports");

    for (category, count) in category_counts() {
        let tone = match category {
            crate::reports::Category::Financial => Tone::Blue,
            crate::reports::Category::Integration => Tone::Purple,
        };
        out.push_str(&format!(
            "  {:<22} {}\n",
            format!("{} Reports", category.label()),
            palette.tone(tone, &count.to_string())
        ));
    }
    out.push('\n');

    out.push_str(&format!("  {}\n", palette.bold("Available Reports")));
    for report in CATALOG.iter() {
        out.push_str(&format!(
            "  {:<20} {:<24} [{}]\n",
            report.id,
            report.name,
            report.category.label()
        ));
        out.push_str(&format!("  {:<20} {}\n", "", palette.dim(report.description)));
    }

    if let Some(report) = page.selected() {
        out.push('\n');
        out.push_str(&format!("  {}\n", palette.bold(report.name)));
        out.push_str(&format!("  {}\n\n", report.description));
        out.push_str("  Report preview will appear here\n");
        out.push_str(&format!(
            "  {}\n",
            palette.dim("Connect to the MCP Financial Server to generate live reports")
        ));
        out.push_str(&format!("  {}\n", palette.dim(":close  :download")));
    }
    out
}
