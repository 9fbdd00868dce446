//! Interactive shell (`mdash shell`).
//!
//! One task owns all page state. It selects over stdin lines and a channel
//! of [`Completion`]s; network calls run as spawned tasks that only ever
//! report back through that channel, so state is mutated in exactly one
//! place.
//!
//! Exactly one page is mounted at a time. Navigating drops the mounted page,
//! including the dashboard's [`Poller`], and mounts a fresh one under a new
//! mount id. Every completion carries the id of the mount that issued it;
//! completions for an earlier mount are discarded.
//!
//! ```text
//! stdin ──▶ handle_line ──▶ spawn(fetch) ──▶ mpsc ──▶ on_completion ──▶ render
//!                                      Poller tick ──┘
//! ```

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::{ApiError, Backend};
use crate::chat::{fetch_reply, AskMode, KnowledgeBase, PendingAsk, Reply, SUGGESTED_QUESTIONS};
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::models::{ClientSearchResponse, DocumentStats, HealthReport};
use crate::nav::{Page, Sidebar};
use crate::poll::Poller;
use crate::render::{self, Palette};
use crate::reports::{self, ReportsPage};
use crate::request::{RequestTicket, Settled};
use crate::search::{ClientSearch, PendingSearch};

/// Identifies one mounting of a page.
pub type MountId = u64;

/// Result of a background task, addressed to the mount that started it.
#[derive(Debug)]
pub enum Completion {
    Health {
        mount: MountId,
        ticket: RequestTicket,
        result: Result<HealthReport, ApiError>,
    },
    Documents {
        mount: MountId,
        ticket: RequestTicket,
        result: Result<DocumentStats, ApiError>,
    },
    Clients {
        mount: MountId,
        pending: PendingSearch,
        result: Result<ClientSearchResponse, ApiError>,
    },
    Reply {
        mount: MountId,
        pending: PendingAsk,
        result: Result<Reply, ApiError>,
    },
    PollTick {
        mount: MountId,
    },
}

impl Completion {
    pub fn mount(&self) -> MountId {
        match self {
            Completion::Health { mount, .. }
            | Completion::Documents { mount, .. }
            | Completion::Clients { mount, .. }
            | Completion::Reply { mount, .. }
            | Completion::PollTick { mount } => *mount,
        }
    }
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

enum Mounted {
    Dashboard {
        state: Dashboard,
        _poller: Poller,
    },
    ClientSearch(ClientSearch),
    KnowledgeBase(KnowledgeBase),
    Reports(ReportsPage),
}

const HELP: &str = "\
Commands:
  :go <page>          open dashboard, clients, knowledge, or reports
  :sidebar            collapse or expand the sidebar
  :refresh            re-fetch the dashboard
  :mode rag|direct    knowledge base answer mode
  :suggest <n>        ask suggested question n
  :open <report>      preview a report
  :close              close the report preview
  :download           download the open report
  :generate <report>  request a report
  :help               this text
  :quit               leave the shell
Anything else is submitted to the current page.
";

pub struct Shell<W: Write> {
    config: Config,
    backend: Arc<dyn Backend>,
    out: W,
    palette: Palette,
    sidebar: Sidebar,
    page: Page,
    mounted: Mounted,
    mount_id: MountId,
    tx: UnboundedSender<Completion>,
    session: Uuid,
}

impl<W: Write> Shell<W> {
    /// Create a shell with the dashboard mounted. Must be called inside a
    /// tokio runtime.
    pub fn new(
        config: Config,
        backend: Arc<dyn Backend>,
        out: W,
    ) -> (Self, UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let palette = Palette::from_config(&config.ui);
        let mut shell = Self {
            config,
            backend,
            out,
            palette,
            sidebar: Sidebar::default(),
            page: Page::Dashboard,
            mounted: Mounted::Reports(ReportsPage::new()),
            mount_id: 0,
            tx,
            session: Uuid::new_v4(),
        };
        shell.mount(Page::Dashboard);
        (shell, rx)
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn mount_id(&self) -> MountId {
        self.mount_id
    }

    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        match &self.mounted {
            Mounted::Dashboard { state, .. } => Some(state),
            _ => None,
        }
    }

    pub fn knowledge_base(&self) -> Option<&KnowledgeBase> {
        match &self.mounted {
            Mounted::KnowledgeBase(kb) => Some(kb),
            _ => None,
        }
    }

    pub fn client_search(&self) -> Option<&ClientSearch> {
        match &self.mounted {
            Mounted::ClientSearch(s) => Some(s),
            _ => None,
        }
    }

    pub fn reports(&self) -> Option<&ReportsPage> {
        match &self.mounted {
            Mounted::Reports(r) => Some(r),
            _ => None,
        }
    }

    /// Drop the current page and mount `page` fresh.
    fn mount(&mut self, page: Page) {
        self.mount_id += 1;
        self.page = page;
        debug!(session = %self.session, mount = self.mount_id, route = page.route(), "mount");

        self.mounted = match page {
            Page::Dashboard => {
                let mount = self.mount_id;
                let tx = self.tx.clone();
                let poller = Poller::every(
                    Duration::from_millis(self.config.dashboard.health_poll_ms),
                    move || {
                        let _ = tx.send(Completion::PollTick { mount });
                    },
                );
                Mounted::Dashboard {
                    state: Dashboard::new(),
                    _poller: poller,
                }
            }
            Page::ClientSearch => Mounted::ClientSearch(ClientSearch::new()),
            Page::KnowledgeBase => Mounted::KnowledgeBase(KnowledgeBase::new()),
            Page::Reports => Mounted::Reports(ReportsPage::new()),
        };

        if page == Page::Dashboard {
            self.refresh_dashboard();
        }
    }

    fn refresh_dashboard(&mut self) {
        let Mounted::Dashboard { state, .. } = &mut self.mounted else {
            return;
        };
        let mount = self.mount_id;
        if let Some(ticket) = state.refresh_health() {
            spawn_health(&self.backend, &self.tx, mount, ticket);
        }
        if let Some(ticket) = state.refresh_documents() {
            let backend = self.backend.clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = backend.document_stats().await;
                let _ = tx.send(Completion::Documents {
                    mount,
                    ticket,
                    result,
                });
            });
        }
    }

    /// Render the chrome and the mounted page.
    pub fn render(&mut self) -> Result<()> {
        let header = render::header(&self.config.ui, &self.sidebar, self.page, &self.palette);
        let body = match &self.mounted {
            Mounted::Dashboard { state, .. } => render::dashboard(state, &self.palette),
            Mounted::ClientSearch(s) => render::client_search(s, &self.config.ui, &self.palette),
            Mounted::KnowledgeBase(kb) => {
                let mut body = format!("Answer mode: {}\n\n", kb.mode().label());
                body.push_str(&render::transcript(kb, &self.palette, render::DEFAULT_WIDTH));
                body
            }
            Mounted::Reports(r) => render::reports(r, &self.palette),
        };
        write!(self.out, "\n{}{}", header, body)?;
        self.out.flush()?;
        Ok(())
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    /// Handle one line of input.
    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            self.submit(line)?;
            return Ok(Flow::Continue);
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "q" | "quit" | "exit" => return Ok(Flow::Quit),
            "help" | "h" => self.say(HELP)?,
            "go" => match Page::parse(arg) {
                Some(page) => {
                    self.mount(page);
                    self.render()?;
                }
                None => self.say(&format!("unknown page: {}", arg))?,
            },
            "sidebar" => {
                self.sidebar.toggle();
                self.render()?;
            }
            "refresh" => {
                self.refresh_dashboard();
                self.render()?;
            }
            "mode" => {
                let Mounted::KnowledgeBase(kb) = &mut self.mounted else {
                    return self.say(":mode applies to the knowledge base").map(|_| Flow::Continue);
                };
                match AskMode::parse(arg) {
                    Some(mode) => {
                        kb.set_mode(mode);
                        self.render()?;
                    }
                    None => self.say("usage: :mode rag|direct")?,
                }
            }
            "suggest" => {
                let index = arg.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
                let Mounted::KnowledgeBase(kb) = &mut self.mounted else {
                    return self.say(":suggest applies to the knowledge base").map(|_| Flow::Continue);
                };
                match index {
                    Some(i) if kb.use_suggestion(i) => self.submit_question()?,
                    _ => self.say(&format!("usage: :suggest 1-{}", SUGGESTED_QUESTIONS.len()))?,
                }
            }
            "open" | "close" | "download" | "generate" => self.reports_command(name, arg)?,
            other => self.say(&format!("unknown command: :{} (try :help)", other))?,
        }
        Ok(Flow::Continue)
    }

    fn reports_command(&mut self, name: &str, arg: &str) -> Result<()> {
        let Mounted::Reports(page) = &mut self.mounted else {
            return self.say(&format!(":{} applies to the reports page", name));
        };
        match name {
            "open" => match page.select(arg) {
                Ok(_) => self.render(),
                Err(e) => self.say(&e.to_string()),
            },
            "close" => {
                page.close();
                self.render()
            }
            "download" => match page.download() {
                Some(notice) => {
                    self.say(&notice)?;
                    self.render()
                }
                None => self.say("no report is open"),
            },
            _ => match reports::find(arg) {
                Some(report) => self.say(&reports::generate_notice(report)),
                None => self.say(&format!("unknown report: {}", arg)),
            },
        }
    }

    /// Plain text goes to the mounted page's input.
    fn submit(&mut self, text: &str) -> Result<()> {
        match &mut self.mounted {
            Mounted::KnowledgeBase(kb) => {
                kb.set_input(text);
                self.submit_question()
            }
            Mounted::ClientSearch(search) => {
                search.set_input(text);
                let Some(pending) = search.submit() else {
                    return Ok(());
                };
                let backend = self.backend.clone();
                let tx = self.tx.clone();
                let mount = self.mount_id;
                tokio::spawn(async move {
                    let result = backend.search_clients(&pending.query).await;
                    let _ = tx.send(Completion::Clients {
                        mount,
                        pending,
                        result,
                    });
                });
                self.render()
            }
            Mounted::Dashboard { .. } | Mounted::Reports(_) => {
                if text.is_empty() {
                    Ok(())
                } else {
                    self.say("nothing to submit here (try :help)")
                }
            }
        }
    }

    fn submit_question(&mut self) -> Result<()> {
        let Mounted::KnowledgeBase(kb) = &mut self.mounted else {
            return Ok(());
        };
        let Some(pending) = kb.submit() else {
            return Ok(());
        };
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let mount = self.mount_id;
        tokio::spawn(async move {
            let result = fetch_reply(backend.as_ref(), &pending).await;
            let _ = tx.send(Completion::Reply {
                mount,
                pending,
                result,
            });
        });
        self.render()
    }

    /// Apply a background result. Returns `false` when it was discarded,
    /// either because its page is no longer mounted or because a newer
    /// request superseded it.
    pub fn on_completion(&mut self, completion: Completion) -> Result<bool> {
        if completion.mount() != self.mount_id {
            debug!(
                session = %self.session,
                mount = completion.mount(),
                current = self.mount_id,
                "discarding completion for unmounted page"
            );
            return Ok(false);
        }

        let mount = self.mount_id;
        let settled = match (completion, &mut self.mounted) {
            (Completion::PollTick { .. }, Mounted::Dashboard { state, .. }) => {
                if let Some(ticket) = state.refresh_health() {
                    spawn_health(&self.backend, &self.tx, mount, ticket);
                }
                return Ok(true);
            }
            (Completion::Health { ticket, result, .. }, Mounted::Dashboard { state, .. }) => {
                state.apply_health(ticket, result)
            }
            (Completion::Documents { ticket, result, .. }, Mounted::Dashboard { state, .. }) => {
                state.apply_documents(ticket, result)
            }
            (Completion::Clients { pending, result, .. }, Mounted::ClientSearch(search)) => {
                search.resolve(&pending, result)
            }
            (Completion::Reply { pending, result, .. }, Mounted::KnowledgeBase(kb)) => {
                kb.resolve(&pending, result)
            }
            _ => Settled::Stale,
        };

        if settled == Settled::Applied {
            self.render()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn spawn_health(
    backend: &Arc<dyn Backend>,
    tx: &UnboundedSender<Completion>,
    mount: MountId,
    ticket: RequestTicket,
) {
    let backend = backend.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = backend.health().await;
        let _ = tx.send(Completion::Health {
            mount,
            ticket,
            result,
        });
    });
}

/// `mdash shell`: run the interactive loop on stdin/stdout until `:quit`,
/// end of input, or Ctrl-C.
pub async fn run_shell(config: Config, backend: Arc<dyn Backend>) -> Result<()> {
    let (mut shell, mut rx) = Shell::new(config, backend, std::io::stdout());
    info!(session = %shell.session, "shell started");
    shell.render()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if shell.handle_line(&line)? == Flow::Quit {
                    break;
                }
            }
            Some(completion) = rx.recv() => {
                shell.on_completion(completion)?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    info!(session = %shell.session, "shell closed");
    Ok(())
}
