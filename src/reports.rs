//! Reports catalog.
//!
//! A fixed list of the reports the financial server can produce, grouped by
//! category, plus the preview selection for the reports page. Generation
//! itself happens elsewhere; this page only announces requests.

use anyhow::Result;

use crate::config::Config;
use crate::render::{self, Palette};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Financial,
    Integration,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Financial, Category::Integration];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Financial => "Financial",
            Category::Integration => "Integration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
}

pub const CATALOG: [Report; 5] = [
    Report {
        id: "revenue_summary",
        name: "Revenue Summary",
        description: "Total revenue, collections, and outstanding balances",
        category: Category::Financial,
    },
    Report {
        id: "outstanding_ar",
        name: "Outstanding A/R",
        description: "All unpaid invoices with aging details",
        category: Category::Financial,
    },
    Report {
        id: "client_aging",
        name: "Client Aging Report",
        description: "Aged receivables by client with buckets",
        category: Category::Financial,
    },
    Report {
        id: "data_quality",
        name: "Data Quality Report",
        description: "Issues found during ETL and their resolutions",
        category: Category::Integration,
    },
    Report {
        id: "merge_status",
        name: "Merge Status Report",
        description: "Status of data integration from all sources",
        category: Category::Integration,
    },
];

pub fn find(id: &str) -> Option<&'static Report> {
    let id = id.trim();
    CATALOG
        .iter()
        .find(|r| r.id.eq_ignore_ascii_case(id) || r.name.eq_ignore_ascii_case(id))
}

/// Number of catalog entries per category, in [`Category::ALL`] order.
pub fn category_counts() -> Vec<(Category, usize)> {
    Category::ALL
        .iter()
        .map(|c| (*c, CATALOG.iter().filter(|r| r.category == *c).count()))
        .collect()
}

pub fn generate_notice(report: &Report) -> String {
    format!("Generating {}...", report.name)
}

/// Reports page state: which report, if any, is open in the preview.
#[derive(Debug, Default)]
pub struct ReportsPage {
    selected: Option<&'static Report>,
}

impl ReportsPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&'static Report> {
        self.selected
    }

    /// Open the preview for `id`.
    pub fn select(&mut self, id: &str) -> Result<&'static Report> {
        let report = find(id).ok_or_else(|| anyhow::anyhow!("unknown report: {}", id))?;
        self.selected = Some(report);
        Ok(report)
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    /// Request the open report's PDF and close the preview.
    pub fn download(&mut self) -> Option<String> {
        let report = self.selected.take()?;
        Some(format!("Downloading {}...", report.name))
    }
}

/// `mdash reports [--show ID]`.
pub fn run_reports(config: &Config, show: Option<&str>) -> Result<()> {
    let palette = Palette::from_config(&config.ui);
    let mut page = ReportsPage::new();
    if let Some(id) = show {
        page.select(id)?;
    }
    print!("{}", render::reports(&page, &palette));
    Ok(())
}
