use crate::config::{AllConfig, TargetConfig};
use crate::dispatch::{build_strategy, plan};
use crate::schedule::{is_due, should_run_now, window_day, TimeWindow};
use crate::storage::{list_artifacts, render_table};
use crate::strategy::{execute, BackupReport};
use crate::utils::run_timestamp;
use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime};
use std::time::Duration;
use tracing::{error, info};

/// Window gate for a manual run. `--force` bypasses it.
pub fn inside_window(now: NaiveTime, window: Option<&TimeWindow>, force: bool) -> bool {
    force || window.map_or(true, |w| should_run_now(now, w))
}

pub async fn backup_database(
    config: &AllConfig,
    target: &TargetConfig,
    force: bool,
) -> Result<Option<BackupReport>> {
    let window = config.app.time_window()?;
    let now = Local::now();
    if !inside_window(now.time(), window.as_ref(), force) {
        info!(
            "Outside backup window {}, skipping (use --force to override)",
            config.app.window.as_deref().unwrap_or_default()
        );
        return Ok(None);
    }

    let plan = plan(config, target)?;
    info!("Starting {}", plan);
    let mut strategy = build_strategy(&plan, config, &run_timestamp(&now))?;
    let report = execute(strategy.as_mut()).await?;

    for artifact in report.artifacts() {
        info!("Backup written: {}", artifact.display());
    }
    info!(
        "{} backup completed successfully: {} objects",
        report.engine,
        report.objects.len()
    );
    Ok(Some(report))
}

pub async fn run_daemon(config: &AllConfig) -> Result<()> {
    let window = config.app.time_window()?;
    // 先校验配置，避免每次触发时才报错
    plan(config, &config.target)?;

    let period = Duration::from_secs(config.app.check_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    let mut last_run: Option<NaiveDate> = None;
    info!("Daemon started, checking every {:?}", period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Daemon stopped");
                return Ok(());
            }
        }

        let now = Local::now().naive_local();
        if !is_due(now, window.as_ref(), last_run) {
            continue;
        }
        // 失败也记为当天已执行，等下一个窗口再试
        last_run = Some(window_day(now, window.as_ref()));

        if let Err(e) = backup_database(config, &config.target, true).await {
            error!("Scheduled backup failed: {:#}", e);
        }
    }
}

pub fn print_plan(config: &AllConfig, target: &TargetConfig) -> Result<()> {
    let plan = plan(config, target)?;
    println!("{}", plan);
    if let Some(window) = &config.app.window {
        println!("time window: {}", window);
    }
    Ok(())
}

pub async fn list_backups(config: &AllConfig) -> Result<()> {
    let root = config.app.get_backup_dir();
    let items = list_artifacts(&root).await?;
    if items.is_empty() {
        println!("No backups under {}", root.display());
        return Ok(());
    }
    println!("{}", render_table(&items));
    Ok(())
}
