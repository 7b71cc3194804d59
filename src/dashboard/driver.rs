use std::io::Write;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::view::{render_lines, Dashboard, DashboardFrame, DashboardState};

/// Where frames are drawn.
pub trait Surface {
    fn draw(&mut self, frame: &DashboardFrame, lines: &[String]);

    /// Called once when the dashboard stops.
    fn close(&mut self) {}
}

/// Writes frames as plain text, one block per redraw.
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: std::io::stdout() }
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn draw(&mut self, _frame: &DashboardFrame, lines: &[String]) {
        let mut block = String::new();
        for line in lines {
            block.push_str(line);
            block.push('\n');
        }
        block.push_str("--\n");
        if let Err(e) = self.out.write_all(block.as_bytes()).and_then(|_| self.out.flush()) {
            debug!("dashboard write failed: {}", e);
        }
    }

    fn close(&mut self) {
        let _ = writeln!(self.out, "dashboard closed");
        let _ = self.out.flush();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardCommand {
    Toggle,
    Clear,
    Close,
}

impl DashboardCommand {
    /// Single-key commands: `e`/`t` toggle, `c` clear, `q`/`x` close.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "e" | "t" | "toggle" | "expand" => Some(DashboardCommand::Toggle),
            "c" | "clear" | "reset" => Some(DashboardCommand::Clear),
            "q" | "x" | "close" | "quit" => Some(DashboardCommand::Close),
            _ => None,
        }
    }
}

/// Remote control for a running driver.
#[derive(Debug, Clone)]
pub struct DashboardControl {
    commands: mpsc::Sender<DashboardCommand>,
    cancel: CancellationToken,
}

impl DashboardControl {
    /// Returns false if the driver has already stopped.
    pub async fn send(&self, command: DashboardCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Stops polling without touching the monitor.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Closed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverReport {
    /// Timer-driven polls.
    pub polls: u64,
    /// All redraws, including those right after a command.
    pub draws: u64,
    pub stop: StopReason,
}

/// Polls a [`Dashboard`] on a fixed cadence until closed or cancelled.
///
/// Not `Send`: run it on the thread that owns the monitors (`LocalSet` or a current-thread runtime).
pub struct DashboardDriver<S: Surface> {
    dashboard: Dashboard,
    surface: S,
    commands: mpsc::Receiver<DashboardCommand>,
    cancel: CancellationToken,
    polls: u64,
    draws: u64,
}

impl<S: Surface> DashboardDriver<S> {
    pub fn new(dashboard: Dashboard, surface: S) -> (Self, DashboardControl) {
        Self::with_cancellation(dashboard, surface, CancellationToken::new())
    }

    /// Driver stopped by `cancel` (or any parent of it).
    pub fn with_cancellation(dashboard: Dashboard, surface: S, cancel: CancellationToken) -> (Self, DashboardControl) {
        let (tx, rx) = mpsc::channel(16);
        let control = DashboardControl {
            commands: tx,
            cancel: cancel.clone(),
        };
        let driver = Self {
            dashboard,
            surface,
            commands: rx,
            cancel,
            polls: 0,
            draws: 0,
        };
        (driver, control)
    }

    pub async fn run(mut self) -> DriverReport {
        let period = self.dashboard.config().poll_interval();
        info!(subject = %self.dashboard.subject(), period_ms = period.as_millis() as u64, "dashboard started");

        let mut cadence = interval(period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        let stop = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break StopReason::Cancelled,

                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => {
                        if self.apply(command) == DashboardState::Hidden {
                            break StopReason::Closed;
                        }
                        self.redraw();
                    }
                    None => commands_open = false,
                },

                _ = cadence.tick() => {
                    self.polls += 1;
                    self.redraw();
                }
            }
        };

        self.surface.close();
        info!(subject = %self.dashboard.subject(), polls = self.polls, ?stop, "dashboard stopped");

        DriverReport {
            polls: self.polls,
            draws: self.draws,
            stop,
        }
    }

    fn apply(&mut self, command: DashboardCommand) -> DashboardState {
        debug!(subject = %self.dashboard.subject(), ?command, "dashboard command");
        match command {
            DashboardCommand::Toggle => {
                self.dashboard.toggle();
            }
            DashboardCommand::Clear => {
                self.dashboard.clear();
            }
            DashboardCommand::Close => self.dashboard.close(),
        }
        self.dashboard.state()
    }

    fn redraw(&mut self) {
        if let Some(frame) = self.dashboard.poll() {
            let lines = render_lines(&frame);
            self.surface.draw(&frame, &lines);
            self.draws += 1;
        }
    }
}
