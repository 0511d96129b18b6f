use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use nudge::core::{parse_duration_minutes, Config};
use nudge::database::Database;
use nudge::features::reminders::{
    load_entities, InAppAlert, Interaction, NotificationAction, NotificationPayload,
    PermissionState, PlatformNotifier, ReminderEvent, ReminderScheduler, SchedulerOptions,
    SettingsStore, SystemClock, TrackableEntity,
};

/// Terminal surface: notifications are printed banners, the tone is the bell
struct TerminalNotifier;

#[async_trait]
impl PlatformNotifier for TerminalNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    fn query_permission(&self) -> PermissionState {
        PermissionState::Unknown
    }

    async fn request_permission(&self) -> Result<PermissionState> {
        Ok(PermissionState::Granted)
    }

    fn show(&self, payload: &NotificationPayload) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "\n┌─ {} ", payload.title)?;
        writeln!(out, "│  {}", payload.body)?;
        writeln!(out, "└─ [{}]  open / snooze / dismiss", payload.tag)?;
        out.flush()?;
        Ok(())
    }

    fn close(&self, tag: &str) -> Result<()> {
        debug!("Closed notification {tag}");
        Ok(())
    }

    fn vibrate(&self, _pattern: &[u32]) -> Result<()> {
        Err(anyhow!("terminals cannot vibrate"))
    }

    fn play_tone(&self, _frequency_hz: u32, _duration: Duration) -> Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }

    fn is_foreground(&self) -> bool {
        true
    }

    fn show_in_app_alert(&self, alert: &InAppAlert) -> Result<()> {
        info!("In-app alert for {}: {}", alert.entity_id, alert.body);
        Ok(())
    }
}

fn print_upcoming(scheduler: &ReminderScheduler, entities: &[TrackableEntity]) {
    let upcoming = scheduler.get_upcoming(entities);
    if upcoming.is_empty() {
        println!("📋 No upcoming reminders.");
        return;
    }

    println!("📋 Upcoming reminders:");
    for item in upcoming {
        println!(
            "  {} {:<24} {} ({})",
            item.time_of_day,
            item.entity_title,
            item.next_fire_at.format("%a %Y-%m-%d %H:%M"),
            item.time_until_label
        );
    }
}

fn print_help() {
    println!("Commands:");
    println!("  upcoming                     list the next firing of each reminder");
    println!("  snooze <habit-id> [10m]      push the habit's reminder back");
    println!("  open <habit-id>              act on a notification as if clicked");
    println!("  test                         send a test notification now");
    println!("  reload                       re-read the habits file and reschedule");
    println!("  settings                     show notification settings");
    println!("  set <field> <value>          change enabled/sound/vibration/lead");
    println!("  quit");
}

/// Handle one stdin line; returns false when the host should exit
fn handle_command(
    line: &str,
    scheduler: &ReminderScheduler,
    entities: &mut Vec<TrackableEntity>,
    config: &Config,
) -> Result<bool> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return Ok(true);
    };

    match command {
        "quit" | "exit" => return Ok(false),
        "help" => print_help(),
        "upcoming" => print_upcoming(scheduler, entities),
        "snooze" => {
            let entity_id = args.first().ok_or_else(|| anyhow!("Usage: snooze <habit-id> [duration]"))?;
            let minutes = match args.get(1) {
                Some(raw) => parse_duration_minutes(raw)
                    .ok_or_else(|| anyhow!("Invalid duration {raw:?}; try 10m or 1h30m"))?,
                None => config.default_snooze_minutes,
            };
            let until = scheduler.snooze(entity_id, minutes)?;
            println!("😴 Snoozed until {}", until.format("%H:%M"));
        }
        "open" | "dismiss" => {
            let entity_id = args.first().ok_or_else(|| anyhow!("Usage: {command} <habit-id>"))?;
            let tag = scheduler
                .scheduled()
                .into_iter()
                .find(|entry| entry.entity_id() == *entity_id)
                .map(|entry| entry.key().to_string())
                .unwrap_or_default();
            let action = if command == "open" {
                NotificationAction::Open
            } else {
                NotificationAction::Dismiss
            };
            scheduler.handle_interaction(&Interaction {
                tag,
                entity_id: entity_id.to_string(),
                action,
            })?;
        }
        "test" => {
            let report = scheduler.send_test_notification();
            println!(
                "🧪 notification={} in-app={} sound={} vibration={}{}",
                report.notification_shown,
                report.in_app_alert,
                report.tone_played,
                report.vibrated,
                if report.suppressed { " (notifications are disabled)" } else { "" }
            );
        }
        "reload" => {
            *entities = load_entities(&config.habits_path)?;
            let summary = scheduler.schedule_all(entities);
            println!("🔄 Rescheduled {} reminders", summary.armed);
        }
        "settings" => println!("⚙️  {:?}", scheduler.settings().get()),
        "set" => {
            let (Some(field), Some(value)) = (args.first(), args.get(1)) else {
                return Err(anyhow!("Usage: set <field> <value>"));
            };
            let mut settings = scheduler.settings().get();
            settings.apply_field(field, value)?;
            let lead_changed = settings.lead_minutes != scheduler.settings().get().lead_minutes;
            if let Err(e) = scheduler.settings().set(settings) {
                warn!("Setting applied for this session only: {e}");
            }
            if lead_changed {
                scheduler.schedule_all(entities);
            }
            println!("⚙️  {:?}", scheduler.settings().get());
        }
        other => println!("Unknown command {other:?}; type 'help'"),
    }

    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting nudge reminder host...");

    let database = Database::new(&config.database_path)?;
    let settings = Arc::new(SettingsStore::load(Arc::new(database)));

    let scheduler = Arc::new(ReminderScheduler::new(
        Arc::new(TerminalNotifier),
        settings,
        Arc::new(SystemClock),
        SchedulerOptions::from(&config),
    ));

    if !scheduler.request_permission().await {
        warn!("Notification permission not granted; falling back to in-app alerts");
    }

    let mut entities = match load_entities(&config.habits_path) {
        Ok(entities) => {
            info!("📄 Loaded {} habits from {}", entities.len(), config.habits_path);
            entities
        }
        Err(e) => {
            if std::path::Path::new(&config.habits_path).exists() {
                error!("❌ Failed to load habits: {e:#}");
            } else {
                info!("📄 No habits file at {} - nothing to schedule", config.habits_path);
            }
            Vec::new()
        }
    };

    let mode = std::env::args().nth(1).unwrap_or_else(|| "run".to_string());
    match mode.as_str() {
        "upcoming" => {
            print_upcoming(&scheduler, &entities);
            return Ok(());
        }
        "test" => {
            let report = scheduler.send_test_notification();
            println!("🧪 {report:?}");
            return Ok(());
        }
        "run" => {}
        other => return Err(anyhow!("Unknown mode {other:?}; expected run, upcoming or test")),
    }

    scheduler.schedule_all(&entities);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let wake_loop = tokio::spawn(scheduler.clone().run(shutdown_rx));

    // Navigation requests would go to the UI; here they are just reported
    let mut events = scheduler.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let ReminderEvent::OpenCompletion { entity_id, url } = event {
                println!("➡️  Opening {url} to complete {entity_id}");
            }
        }
    });

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_command(line.trim(), &scheduler, &mut entities, &config) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("❌ {e}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    scheduler.cancel_all();
    let _ = shutdown_tx.send(true);
    if let Err(e) = wake_loop.await {
        error!("Wake loop ended abnormally: {e}");
    }

    info!("Goodbye");
    Ok(())
}
