use futures::future::BoxFuture;
use futures::FutureExt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

use syslogger::collectors::MetricSource;
use syslogger::config::{AppConfig, Overrides, Settings};
use syslogger::error::{SamplerError, Tool};
use syslogger::models::{MetricKind, Reading, Sample};
use syslogger::renderer::Renderer;
use syslogger::scheduler::{temperature_notice, Phase, Scheduler};
use syslogger::store::{LogStore, DELIMITER};

struct ScriptedSource {
    kind: MetricKind,
    reading: Reading,
    delay: Duration,
    tools: Vec<Tool>,
}

impl ScriptedSource {
    fn boxed(kind: MetricKind, reading: Reading) -> Box<dyn MetricSource> {
        Box::new(Self {
            kind,
            reading,
            delay: Duration::ZERO,
            tools: Vec::new(),
        })
    }
}

impl MetricSource for ScriptedSource {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    fn tools(&self) -> Vec<Tool> {
        self.tools.clone()
    }

    fn read(&self) -> BoxFuture<'_, Reading> {
        async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reading.clone()
        }
        .boxed()
    }
}

fn primary(text: &str) -> Reading {
    Reading::Primary(text.to_string())
}

/// A laptop with BAT0 whose sensors report power in milliwatts.
fn laptop() -> Vec<Box<dyn MetricSource>> {
    vec![
        ScriptedSource::boxed(MetricKind::Battery, primary("87")),
        ScriptedSource::boxed(MetricKind::Power, primary("15.2 mW")),
        ScriptedSource::boxed(MetricKind::CpuLoad, primary("96.99")),
        ScriptedSource::boxed(MetricKind::CpuClock, primary("2.40 GHz")),
        ScriptedSource::boxed(MetricKind::Temperature, primary("+29.0°C")),
        ScriptedSource::boxed(MetricKind::Processes, primary("firefox,Xorg,pipewire")),
    ]
}

fn settings(dir: &TempDir, interval: &str) -> Settings {
    let supplies = dir.path().join("power_supply");
    fs::create_dir_all(supplies.join("BAT0")).unwrap();
    fs::write(supplies.join("BAT0/capacity"), "87\n").unwrap();

    let overrides = Overrides {
        file: Some(dir.path().join("t.csv")),
        interval: Some(interval.to_string()),
        battery: Some("BAT0".to_string()),
        plot: false,
    };
    let mut settings = AppConfig::default().resolve(&overrides).unwrap();
    settings.power_supply_root = supplies;
    settings
}

fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_two_cycles_produce_header_and_two_rows() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "2s");
    let path = settings.file.clone();

    let mut sources = laptop();
    sources[2] = Box::new(ScriptedSource {
        kind: MetricKind::CpuLoad,
        reading: primary("96.99"),
        delay: Duration::from_secs(1),
        tools: Vec::new(),
    });

    let mut scheduler = Scheduler::new(settings, sources, None);
    scheduler.initialize().await.unwrap();

    let (first, cost) = scheduler.sample().await;
    assert!(cost >= Duration::from_secs(1));
    scheduler.publish(&first);
    scheduler.sleep_then_render(cost).await;

    let (second, _) = scheduler.sample().await;
    scheduler.publish(&second);

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], LogStore::header_line());

    let columns = lines[0].split(DELIMITER).count();
    for row in &lines[1..] {
        assert_eq!(row.split(DELIMITER).count(), columns);
    }

    let rows = LogStore::new(&path).rows().unwrap();
    assert!(rows[0].timestamp < rows[1].timestamp);
    assert!(rows[1].timestamp - rows[0].timestamp >= chrono::Duration::seconds(1));
}

#[tokio::test]
async fn test_row_values_are_normalized() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");
    let path = settings.file.clone();

    let mut scheduler = Scheduler::new(settings, laptop(), None);
    scheduler.initialize().await.unwrap();
    let (sample, _) = scheduler.sample().await;
    scheduler.publish(&sample);

    let rows = data_lines(&path);
    let fields: Vec<&str> = rows[0].split(DELIMITER).collect();
    assert_eq!(
        &fields[1..],
        &["87", "0.0152", "3.01", "2400 MHz", "29.0", "firefox,Xorg,pipewire"]
    );
}

#[tokio::test]
async fn test_missing_temperature_is_marked_not_zero() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");
    let path = settings.file.clone();

    let mut sources = laptop();
    sources[4] = ScriptedSource::boxed(MetricKind::Temperature, Reading::Unavailable);
    sources[1] = ScriptedSource::boxed(MetricKind::Power, Reading::Unavailable);

    let mut scheduler = Scheduler::new(settings, sources, None);
    scheduler.initialize().await.unwrap();
    let (sample, _) = scheduler.sample().await;
    assert_eq!(sample.temperature_celsius, None);
    scheduler.publish(&sample);

    let rows = data_lines(&path);
    let fields: Vec<&str> = rows[0].split(DELIMITER).collect();
    assert_eq!(fields[2], "NA");
    assert_eq!(fields[5], "NA");
}

#[tokio::test]
async fn test_generic_temperature_sensor_is_used_after_warning() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");
    let path = settings.file.clone();

    let fallback = Reading::Fallback("+45.0 C".to_string());
    let notice = temperature_notice(&settings.battery, &fallback).unwrap();
    assert!(notice.contains("generic sensor instead"));

    let mut sources = laptop();
    sources[4] = ScriptedSource::boxed(MetricKind::Temperature, fallback);

    let mut scheduler = Scheduler::new(settings, sources, None);
    scheduler.initialize().await.unwrap();
    let (sample, _) = scheduler.sample().await;
    scheduler.publish(&sample);

    let fields: Vec<String> = data_lines(&path)[0].split(DELIMITER).map(str::to_string).collect();
    assert_eq!(fields[5], "45.0");
}

#[tokio::test]
async fn test_no_temperature_sensor_at_all_still_starts() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");
    let path = settings.file.clone();

    let notice = temperature_notice(&settings.battery, &Reading::Unavailable).unwrap();
    assert!(!notice.contains("generic sensor instead"));

    let mut sources = laptop();
    sources[4] = ScriptedSource::boxed(MetricKind::Temperature, Reading::Unavailable);

    let mut scheduler = Scheduler::new(settings, sources, None);
    scheduler.initialize().await.unwrap();
    assert_eq!(LogStore::new(&path).rows().unwrap().len(), 0);
    let (sample, _) = scheduler.sample().await;
    scheduler.publish(&sample);

    let fields: Vec<String> = data_lines(&path)[0].split(DELIMITER).map(str::to_string).collect();
    assert_eq!(fields[5], "NA");
}

#[tokio::test]
async fn test_cycle_walks_through_every_phase() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");

    let mut scheduler = Scheduler::new(settings, laptop(), None);
    assert_eq!(scheduler.phase(), Phase::Initializing);
    scheduler.initialize().await.unwrap();
    assert_eq!(scheduler.phase(), Phase::Initializing);

    let (sample, _) = scheduler.sample().await;
    assert_eq!(scheduler.phase(), Phase::Sampling);
    scheduler.publish(&sample);
    assert_eq!(scheduler.phase(), Phase::Publishing);
    scheduler.sleep_then_render(Duration::from_secs(5)).await;
    assert_eq!(scheduler.phase(), Phase::Sleeping);
}

#[tokio::test]
async fn test_unknown_battery_leaves_no_log() {
    let dir = tempdir().unwrap();
    let mut settings = settings(&dir, "1s");
    settings.battery = "BAT7".to_string();
    let path = settings.file.clone();

    let mut scheduler = Scheduler::new(settings, laptop(), None);
    match scheduler.initialize().await {
        Err(SamplerError::UnknownBattery { name, available }) => {
            assert_eq!(name, "BAT7");
            assert_eq!(available, vec!["BAT0"]);
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(!path.exists());
}

#[tokio::test]
async fn test_missing_tool_is_fatal_before_writing() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");
    let path = settings.file.clone();

    let mut sources = laptop();
    sources[1] = Box::new(ScriptedSource {
        kind: MetricKind::Power,
        reading: Reading::Unavailable,
        delay: Duration::ZERO,
        tools: vec![Tool {
            program: "definitely-not-a-real-sampler-tool",
            package: "ghost-utils",
        }],
    });

    let mut scheduler = Scheduler::new(settings, sources, None);
    let err = scheduler.initialize().await.unwrap_err();
    assert!(matches!(err, SamplerError::MissingDependencies(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_console_header_is_shown_once() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");

    let mut scheduler = Scheduler::new(settings, laptop(), None);
    scheduler.initialize().await.unwrap();

    let (sample, _) = scheduler.sample().await;
    let first = scheduler.publish(&sample);
    assert_eq!(first.len(), 2);
    assert!(first[0].starts_with("timestamp"));
    assert!(!first[1].contains(DELIMITER));

    let (sample, _) = scheduler.sample().await;
    let second = scheduler.publish(&sample);
    assert_eq!(second.len(), 1);
    assert!(second[0].contains("2400 MHz"));
}

#[tokio::test]
async fn test_restart_appends_to_existing_log() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");
    let path = settings.file.clone();

    let mut scheduler = Scheduler::new(settings.clone(), laptop(), None);
    scheduler.initialize().await.unwrap();
    let (sample, _) = scheduler.sample().await;
    scheduler.publish(&sample);
    let before = fs::read_to_string(&path).unwrap();

    let mut restarted = Scheduler::new(settings, laptop(), None);
    restarted.initialize().await.unwrap();
    let (sample, _) = restarted.sample().await;
    restarted.publish(&sample);

    let after = fs::read_to_string(&path).unwrap();
    assert!(after.starts_with(&before));
    assert_eq!(after.lines().count(), 3);
}

struct CountingRenderer {
    calls: Arc<AtomicUsize>,
}

impl Renderer for CountingRenderer {
    fn render(&self, _log: &Path) -> anyhow::Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("no plotting runtime")
    }
}

#[tokio::test]
async fn test_render_failure_does_not_stop_the_cycle() {
    let dir = tempdir().unwrap();
    let mut settings = settings(&dir, "1s");
    settings.plot = true;
    let path = settings.file.clone();
    let calls = Arc::new(AtomicUsize::new(0));

    let renderer = CountingRenderer {
        calls: Arc::clone(&calls),
    };
    let mut scheduler = Scheduler::new(settings, laptop(), Some(Box::new(renderer)));
    scheduler.initialize().await.unwrap();

    for _ in 0..2 {
        let (sample, _) = scheduler.sample().await;
        scheduler.publish(&sample);
        // cost beyond the interval: no sleep at all
        scheduler.sleep_then_render(Duration::from_secs(5)).await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(data_lines(&path).len(), 2);
}

#[tokio::test]
async fn test_interrupted_cycle_writes_nothing() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir, "1s");
    let path = settings.file.clone();

    let mut sources = laptop();
    sources[5] = Box::new(ScriptedSource {
        kind: MetricKind::Processes,
        reading: primary("firefox"),
        delay: Duration::from_secs(30),
        tools: Vec::new(),
    });

    let mut scheduler = Scheduler::new(settings, sources, None);
    scheduler.initialize().await.unwrap();

    let interrupted = tokio::time::timeout(Duration::from_millis(100), scheduler.cycle()).await;
    assert!(interrupted.is_err());
    assert!(data_lines(&path).is_empty());
}

#[test]
fn test_sample_round_trips_through_the_log_format() {
    let dir = tempdir().unwrap();
    let store = LogStore::new(dir.path().join("t.csv"));
    store.ensure_header().unwrap();

    let mut sample = Sample::new(
        chrono::DateTime::parse_from_rfc3339("2026-10-18T10:00:00+02:00").unwrap(),
    );
    sample.power_watts = Some(0.0152);
    sample.cpu_clock = Some("2400 MHz".into());
    store.append(&sample).unwrap();

    let rows = store.rows().unwrap();
    assert_eq!(rows, vec![sample]);
}
