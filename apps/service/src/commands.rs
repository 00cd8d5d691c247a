use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use pulsewatch::{
    IntervalTicker, LibsqlStore, Monitor, ProbeExecutor, ReqwestTransport, StatusService, SweepScheduler,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::MonitorCommands;
use crate::config::Config;

async fn open_store(config: &Config) -> anyhow::Result<Arc<LibsqlStore>> {
    let store = LibsqlStore::open(&config.database.path, config.database.pool_size)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;
    Ok(Arc::new(store))
}

fn build_scheduler(config: &Config, store: Arc<LibsqlStore>) -> anyhow::Result<Arc<SweepScheduler>> {
    let timeout = Duration::from_millis(config.scheduler.timeout_ms);
    let transport = ReqwestTransport::new(timeout).context("Failed to build HTTP client")?;
    let executor = Arc::new(ProbeExecutor::new(Arc::new(transport), store.clone(), timeout));

    Ok(Arc::new(SweepScheduler::new(store, executor, config.scheduler.concurrency)))
}

/// Sweep on the configured cadence until Ctrl-C
pub async fn run(config: &Config) -> anyhow::Result<()> {
    if config.scheduler.interval_seconds == 0 {
        bail!("scheduler.interval_seconds must be greater than zero");
    }

    let store = open_store(config).await?;
    let scheduler = build_scheduler(config, store)?;
    let ticker = IntervalTicker::new(
        Duration::from_secs(config.scheduler.interval_seconds),
        config.scheduler.run_on_startup,
    );

    info!(
        "Starting scheduler: every {}s, {} concurrent check(s), {}ms timeout",
        config.scheduler.interval_seconds, config.scheduler.concurrency, config.scheduler.timeout_ms
    );

    tokio::select! {
        () = Arc::clone(&scheduler).run(ticker) => warn!("Scheduler stopped unexpectedly"),
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl-C")?;
            info!("Shutdown requested");
        }
    }

    info!("Sweep statistics: {:?}", scheduler.stats());
    Ok(())
}

/// One sweep over every monitor, then print the counters
pub async fn sweep(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let scheduler = build_scheduler(config, store)?;

    scheduler.run_sweep().await;

    println!("{}", serde_json::to_string_pretty(&scheduler.stats())?);
    Ok(())
}

pub async fn monitor(config: &Config, cmd: MonitorCommands) -> anyhow::Result<()> {
    let store = open_store(config).await?;

    match cmd {
        MonitorCommands::Add { owner, name, url } => {
            let monitor = Monitor::new(owner, &name, &url)?;
            store.create_monitor(&monitor).await?;
            println!("{}", monitor.id);
        }
        MonitorCommands::List { owner } => {
            let monitors = match owner {
                Some(owner) => store.list_monitors_for_owner(owner).await?,
                None => store.list_monitors().await?,
            };
            for monitor in monitors {
                println!("{}  {}  {}  {}", monitor.id, monitor.owner_id, monitor.name, monitor.url);
            }
        }
        MonitorCommands::Update { monitor_id, name, url } => {
            let Some(current) = store.get_monitor(monitor_id).await? else {
                bail!("Monitor {monitor_id} not found");
            };
            let name = name.unwrap_or(current.name);
            let url = url.unwrap_or(current.url);
            let updated = store.update_monitor(monitor_id, &name, &url).await?;
            println!("{}  {}  {}", updated.id, updated.name, updated.url);
        }
        MonitorCommands::Remove { monitor_id } => {
            if !store.delete_monitor(monitor_id).await? {
                bail!("Monitor {monitor_id} not found");
            }
            info!("Removed monitor {}", monitor_id);
        }
    }

    Ok(())
}

pub async fn status(config: &Config, monitor_id: Uuid) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let Some(monitor) = store.get_monitor(monitor_id).await? else {
        bail!("Monitor {monitor_id} not found");
    };

    let summary = StatusService::new(store).summary(&monitor).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsewatch::HeartbeatStore;

    fn config_in(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.database.path = dir.path().join("service.db").to_string_lossy().into_owned();
        config.database.pool_size = 2;
        config
    }

    #[tokio::test]
    async fn test_monitor_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let owner = Uuid::new_v4();

        monitor(&config, MonitorCommands::Add { owner, name: "api".into(), url: "https://api.example.com".into() })
            .await
            .unwrap();

        let store = open_store(&config).await.unwrap();
        let monitors = store.list_monitors_for_owner(owner).await.unwrap();
        assert_eq!(monitors.len(), 1);
        let id = monitors[0].id;

        monitor(&config, MonitorCommands::Update { monitor_id: id, name: Some("api v2".into()), url: None })
            .await
            .unwrap();
        let updated = store.get_monitor(id).await.unwrap().unwrap();
        assert_eq!(updated.name, "api v2");
        assert_eq!(updated.url, "https://api.example.com");

        monitor(&config, MonitorCommands::Remove { monitor_id: id }).await.unwrap();
        assert!(store.get_monitor(id).await.unwrap().is_none());
        assert!(monitor(&config, MonitorCommands::Remove { monitor_id: id }).await.is_err());
    }

    #[tokio::test]
    async fn test_add_rejects_bad_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let result = monitor(
            &config,
            MonitorCommands::Add { owner: Uuid::new_v4(), name: "ftp".into(), url: "ftp://example.com".into() },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sweep_records_unreachable_monitor_as_down() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.scheduler.timeout_ms = 1000;

        let store = open_store(&config).await.unwrap();
        // Port 1 is never listening locally
        let target = Monitor::new(Uuid::new_v4(), "closed", "http://127.0.0.1:1/").unwrap();
        store.create_monitor(&target).await.unwrap();

        sweep(&config).await.unwrap();

        let latest = store.latest(target.id).await.unwrap().unwrap();
        assert!(!latest.is_up());
        assert!(latest.response_time.is_none());
    }

    #[tokio::test]
    async fn test_run_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.scheduler.interval_seconds = 0;

        assert!(run(&config).await.is_err());
    }
}
