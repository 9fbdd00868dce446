//! System dashboard: backend health and index statistics.
//!
//! The dashboard holds two independent request containers, one for
//! `GET /health` and one for `GET /api/v1/documents`. Both are fetched when
//! the view mounts; health is then refreshed by a [`Poller`] every
//! `dashboard.health_poll_ms` for as long as the view stays mounted.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::{ApiError, Backend};
use crate::config::Config;
use crate::models::{DocumentStats, HealthReport};
use crate::nav::Page;
use crate::poll::Poller;
use crate::render::{self, Palette};
use crate::request::{Request, RequestTicket, Settled};

/// Color family of a status card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Green,
    Yellow,
    Blue,
    Purple,
    Indigo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCard {
    pub title: &'static str,
    pub value: String,
    pub tone: Tone,
}

/// One row of the service health list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCheck {
    pub service: String,
    pub status: String,
    pub ok: bool,
}

/// Shortcut shown under "Quick Actions". `target` is `None` for links with
/// nowhere to go yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub label: &'static str,
    pub target: Option<Page>,
}

pub const QUICK_ACTIONS: [QuickAction; 4] = [
    QuickAction {
        label: "Search Clients",
        target: Some(Page::ClientSearch),
    },
    QuickAction {
        label: "Ask Knowledge Base",
        target: Some(Page::KnowledgeBase),
    },
    QuickAction {
        label: "View Reports",
        target: Some(Page::Reports),
    },
    QuickAction {
        label: "System Logs",
        target: None,
    },
];

#[derive(Debug, Default)]
pub struct Dashboard {
    health: Request<HealthReport>,
    documents: Request<DocumentStats>,
    checked_at: Option<DateTime<Utc>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a health fetch unless one is already in flight.
    pub fn refresh_health(&mut self) -> Option<RequestTicket> {
        self.health.trigger()
    }

    pub fn refresh_documents(&mut self) -> Option<RequestTicket> {
        self.documents.trigger()
    }

    pub fn apply_health(
        &mut self,
        ticket: RequestTicket,
        result: Result<HealthReport, ApiError>,
    ) -> Settled {
        let settled = self.health.settle(ticket, result);
        if settled == Settled::Applied {
            self.checked_at = Some(Utc::now());
        }
        settled
    }

    pub fn apply_documents(
        &mut self,
        ticket: RequestTicket,
        result: Result<DocumentStats, ApiError>,
    ) -> Settled {
        self.documents.settle(ticket, result)
    }

    /// Fetch both queries inline. Used by one-shot commands.
    pub async fn load(&mut self, backend: &dyn Backend) {
        if let Some(ticket) = self.refresh_health() {
            let result = backend.health().await;
            self.apply_health(ticket, result);
        }
        if let Some(ticket) = self.refresh_documents() {
            let result = backend.document_stats().await;
            self.apply_documents(ticket, result);
        }
    }

    pub fn health(&self) -> Option<&HealthReport> {
        self.health.value()
    }

    pub fn health_error(&self) -> Option<&str> {
        self.health.error()
    }

    pub fn documents_error(&self) -> Option<&str> {
        self.documents.error()
    }

    pub fn is_refreshing(&self) -> bool {
        self.health.is_pending()
    }

    pub fn checked_at(&self) -> Option<DateTime<Utc>> {
        self.checked_at
    }

    pub fn cards(&self) -> Vec<StatusCard> {
        let health = self.health.value();
        let status = health
            .map(|h| h.status.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("checking...");
        let healthy = health.map(|h| h.is_healthy()).unwrap_or(false);
        let connected = |service: &str| {
            if health.map(|h| h.service_connected(service)).unwrap_or(false) {
                "Connected".to_string()
            } else {
                "Checking...".to_string()
            }
        };

        vec![
            StatusCard {
                title: "System Status",
                value: status.to_string(),
                tone: if healthy { Tone::Green } else { Tone::Yellow },
            },
            StatusCard {
                title: "Documents Indexed",
                value: self
                    .documents
                    .value()
                    .map(|d| d.document_count)
                    .unwrap_or(0)
                    .to_string(),
                tone: Tone::Blue,
            },
            StatusCard {
                title: "ChromaDB",
                value: connected("chromadb"),
                tone: Tone::Purple,
            },
            StatusCard {
                title: "Ollama LLM",
                value: connected("ollama"),
                tone: Tone::Indigo,
            },
        ]
    }

    /// Per-service rows. A service is ok when it reports `connected` or
    /// carries no `error`.
    pub fn service_checks(&self) -> Vec<ServiceCheck> {
        let Some(health) = self.health.value() else {
            return Vec::new();
        };
        health
            .checks
            .iter()
            .map(|(service, status)| ServiceCheck {
                service: service.clone(),
                status: status.clone(),
                ok: status.contains("connected") || !status.contains("error"),
            })
            .collect()
    }
}

/// Messages from background fetches back to a watching dashboard.
enum Update {
    Tick,
    Health(RequestTicket, Result<HealthReport, ApiError>),
}

/// `mdash dashboard [--watch]`.
pub async fn run_dashboard(config: &Config, backend: Arc<dyn Backend>, watch: bool) -> Result<()> {
    let palette = Palette::from_config(&config.ui);
    let mut dash = Dashboard::new();
    dash.load(backend.as_ref()).await;
    print!("{}", render::dashboard(&dash, &palette));

    if !watch {
        if let Some(err) = dash.health_error() {
            anyhow::bail!("health check failed: {}", err);
        }
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let tick_tx = tx.clone();
    let _poller = Poller::every(
        Duration::from_millis(config.dashboard.health_poll_ms),
        move || {
            let _ = tick_tx.send(Update::Tick);
        },
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(update) = rx.recv() => match update {
                Update::Tick => {
                    if let Some(ticket) = dash.refresh_health() {
                        let backend = backend.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let result = backend.health().await;
                            let _ = tx.send(Update::Health(ticket, result));
                        });
                    }
                }
                Update::Health(ticket, result) => {
                    if dash.apply_health(ticket, result) == Settled::Applied {
                        println!();
                        print!("{}", render::dashboard(&dash, &palette));
                    }
                }
            },
        }
    }
    Ok(())
}

/// `mdash health`: the raw health report.
pub async fn run_health(config: &Config, backend: &dyn Backend, json: bool) -> Result<()> {
    let report = backend.health().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let palette = Palette::from_config(&config.ui);
    let mut dash = Dashboard::new();
    if let Some(ticket) = dash.refresh_health() {
        dash.apply_health(ticket, Ok(report));
    }
    print!("{}", render::service_checks(&dash, &palette));
    Ok(())
}

/// `mdash models`.
pub async fn run_models(backend: &dyn Backend, json: bool) -> Result<()> {
    let list = backend.models().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }
    if list.models.is_empty() {
        println!("No models reported.");
        return Ok(());
    }
    for model in &list.models {
        println!("{}", model);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn report(status: &str, checks: &[(&str, &str)]) -> HealthReport {
        HealthReport {
            status: status.to_string(),
            timestamp: None,
            checks: checks
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn down() -> ApiError {
        ApiError::Status {
            path: "/health".to_string(),
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }

    #[test]
    fn cards_before_any_response() {
        let dash = Dashboard::new();
        let cards = dash.cards();
        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].value, "checking...");
        assert_eq!(cards[0].tone, Tone::Yellow);
        assert_eq!(cards[1].value, "0");
        assert_eq!(cards[2].value, "Checking...");
        assert_eq!(cards[3].value, "Checking...");
        assert!(dash.service_checks().is_empty());
    }

    #[test]
    fn healthy_report_lights_up_cards() {
        let mut dash = Dashboard::new();
        let t = dash.refresh_health().unwrap();
        dash.apply_health(
            t,
            Ok(report(
                "healthy",
                &[("chromadb", "connected"), ("ollama", "connected, models: 3")],
            )),
        );
        let t = dash.refresh_documents().unwrap();
        dash.apply_documents(
            t,
            Ok(DocumentStats {
                collection: Some("merger_documents".to_string()),
                document_count: 128,
            }),
        );

        let cards = dash.cards();
        assert_eq!(cards[0].value, "healthy");
        assert_eq!(cards[0].tone, Tone::Green);
        assert_eq!(cards[1].value, "128");
        assert_eq!(cards[2].value, "Connected");
        assert_eq!(cards[3].value, "Connected");
        assert!(dash.checked_at().is_some());
    }

    #[test]
    fn service_check_ok_rule() {
        let mut dash = Dashboard::new();
        let t = dash.refresh_health().unwrap();
        dash.apply_health(
            t,
            Ok(report(
                "degraded",
                &[
                    ("chromadb", "connected"),
                    ("database", "error: connection refused"),
                    ("redis", "starting"),
                ],
            )),
        );

        let checks = dash.service_checks();
        let ok: Vec<(&str, bool)> = checks.iter().map(|c| (c.service.as_str(), c.ok)).collect();
        assert_eq!(
            ok,
            vec![("chromadb", true), ("database", false), ("redis", true)]
        );
        assert_eq!(dash.cards()[0].tone, Tone::Yellow);
    }

    #[test]
    fn failed_refresh_keeps_last_report() {
        let mut dash = Dashboard::new();
        let t = dash.refresh_health().unwrap();
        dash.apply_health(t, Ok(report("healthy", &[])));

        let t = dash.refresh_health().unwrap();
        assert!(dash.is_refreshing());
        assert!(dash.refresh_health().is_none());
        dash.apply_health(t, Err(down()));

        assert_eq!(dash.cards()[0].value, "healthy");
        assert!(dash.health_error().unwrap().contains("503"));
    }

    #[test]
    fn quick_actions_point_at_pages() {
        let targets: Vec<Option<Page>> = QUICK_ACTIONS.iter().map(|a| a.target).collect();
        assert_eq!(
            targets,
            vec![
                Some(Page::ClientSearch),
                Some(Page::KnowledgeBase),
                Some(Page::Reports),
                None
            ]
        );
    }
}
