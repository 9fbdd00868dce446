//! Pages and sidebar navigation.

use crate::config::UiConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Dashboard,
    ClientSearch,
    KnowledgeBase,
    Reports,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::Dashboard,
        Page::ClientSearch,
        Page::KnowledgeBase,
        Page::Reports,
    ];

    pub fn route(&self) -> &'static str {
        match self {
            Page::Dashboard => "/",
            Page::ClientSearch => "/clients",
            Page::KnowledgeBase => "/knowledge",
            Page::Reports => "/reports",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::ClientSearch => "Client Search",
            Page::KnowledgeBase => "Knowledge Base",
            Page::Reports => "Reports",
        }
    }

    /// Parse a route (`/clients`), a label, or a short alias (`kb`).
    pub fn parse(s: &str) -> Option<Page> {
        let key = s.trim().to_ascii_lowercase();
        if let Some(page) = Page::ALL.iter().find(|p| p.route() == key) {
            return Some(*page);
        }
        match key.trim_start_matches('/') {
            "dashboard" | "home" | "" => Some(Page::Dashboard),
            "clients" | "client search" | "client" | "search" => Some(Page::ClientSearch),
            "knowledge" | "knowledge base" | "kb" | "ask" => Some(Page::KnowledgeBase),
            "reports" | "report" => Some(Page::Reports),
            _ => None,
        }
    }
}

/// Collapsible sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sidebar {
    open: bool,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self { open: true }
    }
}

impl Sidebar {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Brand text: full title when open, the short form when collapsed.
    pub fn brand<'a>(&self, ui: &'a UiConfig) -> &'a str {
        if self.open {
            &ui.title
        } else {
            ui.short_title()
        }
    }

    /// Label for the collapse control.
    pub fn toggle_label(&self) -> &'static str {
        if self.open {
            "← Collapse"
        } else {
            "→"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_round_trip() {
        for page in Page::ALL {
            assert_eq!(Page::parse(page.route()), Some(page));
            assert_eq!(Page::parse(page.label()), Some(page));
        }
    }

    #[test]
    fn aliases() {
        assert_eq!(Page::parse("kb"), Some(Page::KnowledgeBase));
        assert_eq!(Page::parse(" Clients "), Some(Page::ClientSearch));
        assert_eq!(Page::parse("/"), Some(Page::Dashboard));
        assert_eq!(Page::parse("settings"), None);
    }

    #[test]
    fn collapsed_sidebar_shows_short_brand() {
        let ui = UiConfig::default();
        let mut sidebar = Sidebar::default();
        assert_eq!(sidebar.brand(&ui), "ZZZ Accounting");
        sidebar.toggle();
        assert!(!sidebar.is_open());
        assert_eq!(sidebar.brand(&ui), "ZZZ");
        assert_eq!(sidebar.toggle_label(), "→");
    }
}
