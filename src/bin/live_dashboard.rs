use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::LocalSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use render_telemetry::dashboard::{Dashboard, DashboardCommand, DashboardDriver, TerminalSurface};
use render_telemetry::kernel::config::TelemetrySettings;
use render_telemetry::{use_performance_monitor, MonitorRegistry};

const SUBJECT: &str = "Avatar";

// Simulated render costs, cycled. Some exceed the default threshold on purpose.
const RENDER_PATTERN_MS: [u64; 8] = [8, 12, 6, 30, 9, 11, 45, 7];

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Settings (optional JSON path as first argument)
    let settings = match std::env::args().nth(1) {
        Some(path) => TelemetrySettings::from_json_file(&path).with_context(|| format!("loading settings from {}", path))?,
        None => TelemetrySettings::default(),
    };
    tracing::info!(?settings, "starting live dashboard");

    let registry = MonitorRegistry::new();
    let shutdown = CancellationToken::new();
    let local = LocalSet::new();

    local
        .run_until(async move {
            // 3. Subject: renders forever on the same thread as the dashboard
            let subject_registry = registry.clone();
            let monitor_config = settings.monitor.clone();
            let subject_stop = shutdown.clone();
            let subject = tokio::task::spawn_local(async move {
                let monitor = use_performance_monitor(&subject_registry, SUBJECT, monitor_config);
                let mut frame: u64 = 0;
                loop {
                    let cost = RENDER_PATTERN_MS[(frame % RENDER_PATTERN_MS.len() as u64) as usize];
                    tokio::select! {
                        _ = subject_stop.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_millis(cost)) => {}
                    }
                    monitor.record_render();

                    if frame.is_multiple_of(10) {
                        // Synchronous work inside the render cycle
                        monitor.measure_effect(|| std::thread::sleep(Duration::from_millis(cost / 2)));
                    }
                    if frame.is_multiple_of(25) {
                        monitor.record_memory((frame % 64 * 1024) as f64);
                    }
                    frame += 1;
                }
                monitor
            });

            // 4. Dashboard driver
            let dashboard = Dashboard::new(registry.clone(), SUBJECT, settings.dashboard.clone());
            let (driver, control) = DashboardDriver::with_cancellation(dashboard, TerminalSurface::stdout(), shutdown.child_token());
            let mut dashboard_task = tokio::task::spawn_local(driver.run());

            // 5. Console commands
            let console_control = control.clone();
            tokio::task::spawn_local(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                println!("Commands: 'e' expand/collapse, 'c' clear, 'q' close the dashboard.");
                while let Ok(Some(line)) = lines.next_line().await {
                    match DashboardCommand::parse(&line) {
                        Some(command) => {
                            if !console_control.send(command).await {
                                break;
                            }
                        }
                        None => tracing::info!("unknown command '{}'", line.trim()),
                    }
                }
            });

            // 6. Run until the dashboard closes or Ctrl-C
            let report = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupt received");
                    control.cancel();
                    (&mut dashboard_task).await
                }
                result = &mut dashboard_task => result,
            }
            .context("dashboard task failed")?;
            tracing::info!(?report, "dashboard finished");

            shutdown.cancel();
            let monitor = subject.await.context("subject task failed")?;
            let summary = monitor.get_performance_summary();
            tracing::info!(
                total_events = summary.total_events,
                warnings = summary.warning_count,
                avg_ms = summary.avg_duration_ms,
                "final summary"
            );
            tracing::debug!("{}", monitor.export_json()?);
            Ok::<(), anyhow::Error>(())
        })
        .await
}
