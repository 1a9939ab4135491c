use std::io::Write;

use chrono::TimeDelta;

use crate::adapters::replay::ReplayTransport;
use crate::adapters::transport::{CarwingsTransport, HttpTransport};
use crate::app::config::AppConfig;
use crate::app::error::AppError;
use crate::domain::battery_status::BatteryStatus;
use crate::domain::update_cycle::Sleeper;
use crate::services::{CarwingsService, ThreadSleeper};

pub fn run(config: AppConfig) -> Result<(), AppError> {
    let stdout = std::io::stdout();

    match config.replay_file.as_deref() {
        Some(path) => {
            tracing::info!(replay_file = path, "using scripted replay transport");
            let transport = ReplayTransport::from_file(path).map_err(AppError::TransportInit)?;
            run_with(
                &CarwingsService::new(transport),
                &config,
                &ThreadSleeper,
                &mut stdout.lock(),
            )
        }
        None => {
            let transport =
                HttpTransport::new(&config.base_url, config.http_timeout(), config.debug_http)
                    .map_err(AppError::TransportInit)?;
            run_with(
                &CarwingsService::new(transport),
                &config,
                &ThreadSleeper,
                &mut stdout.lock(),
            )
        }
    }
}

/// Logs in, optionally refreshes the vehicle data, then writes the recorded battery status.
pub fn run_with<T, S, W>(
    service: &CarwingsService<T>,
    config: &AppConfig,
    sleeper: &S,
    out: &mut W,
) -> Result<(), AppError>
where
    T: CarwingsTransport,
    S: Sleeper,
    W: Write,
{
    let session = service.connect(&config.username, &config.password, config.region)?;

    if config.refresh {
        let attempts = service.refresh_and_wait(&session, &config.poll_policy(), sleeper)?;
        tracing::debug!(attempts, "refresh finished before reading status");
    } else {
        tracing::info!("skipping vehicle refresh, status may be stale");
    }

    let status = service.battery_status(&session)?;
    tracing::info!(
        vin = %session.vin(),
        state_of_charge_pct = status.state_of_charge_pct,
        plugin_state = %status.plugin_state,
        charging_status = %status.charging_status,
        "battery status retrieved"
    );

    out.write_all(render_summary(&status).as_bytes())
        .map_err(|error| AppError::Output(error.to_string()))
}

fn render_summary(status: &BatteryStatus) -> String {
    let remaining_wh = status
        .remaining_wh
        .map(|wh| format!(" ({wh} Wh)"))
        .unwrap_or_default();

    format!(
        "Battery status as of {timestamp}\n\
         \x20 State of charge: {soc}%\n\
         \x20 Remaining: {remaining} / {capacity}{remaining_wh}\n\
         \x20 Range (A/C on): {on_km} km / {on_mi} mi\n\
         \x20 Range (A/C off): {off_km} km / {off_mi} mi\n\
         \x20 Plug: {plug}\n\
         \x20 Charging: {charging}\n\
         \x20 Time to full: L1 {l1}, L2 {l2}, L2 6kW {l2_6kw}\n",
        timestamp = status.timestamp.format("%Y-%m-%d %H:%M %:z"),
        soc = status.state_of_charge_pct,
        remaining = status.remaining,
        capacity = status.capacity,
        on_km = status.cruising_range_ac_on_m / 1000,
        on_mi = status.cruising_range_ac_on_miles(),
        off_km = status.cruising_range_ac_off_m / 1000,
        off_mi = status.cruising_range_ac_off_miles(),
        plug = status.plugin_state,
        charging = status.charging_status,
        l1 = format_duration(status.time_to_full.level1),
        l2 = format_duration(status.time_to_full.level2),
        l2_6kw = format_duration(status.time_to_full.level2_at_6kw),
    )
}

fn format_duration(duration: TimeDelta) -> String {
    format!("{}h{:02}m", duration.num_hours(), duration.num_minutes() % 60)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeDelta;

    use super::{format_duration, run_with};
    use crate::adapters::replay::ReplayTransport;
    use crate::adapters::transport::BASE_URL;
    use crate::app::config::AppConfig;
    use crate::app::error::AppError;
    use crate::domain::region::Region;
    use crate::error::CarwingsError;
    use crate::services::CarwingsService;
    use crate::test_support::{RecordingSleeper, fixture};

    fn config(refresh: bool, poll_max_attempts: u32) -> AppConfig {
        AppConfig {
            username: "driver@example.com".to_string(),
            password: "hunter2".to_string(),
            region: Region::Usa,
            base_url: BASE_URL.to_string(),
            http_timeout_ms: 30_000,
            poll_interval_ms: 10_000,
            poll_max_attempts,
            refresh,
            debug_http: false,
            replay_file: None,
        }
    }

    fn replay_service() -> CarwingsService<ReplayTransport> {
        let transport = ReplayTransport::from_file(&fixture("full_session.json"))
            .expect("replay script should load");
        CarwingsService::new(transport)
    }

    #[test]
    fn prints_summary_after_refresh_cycle() {
        let sleeper = RecordingSleeper::default();
        let mut out = Vec::new();

        run_with(&replay_service(), &config(true, 30), &sleeper, &mut out)
            .expect("replayed session should succeed");

        let summary = String::from_utf8(out).expect("summary should be utf-8");
        assert_eq!(
            summary,
            "Battery status as of 2023-01-05 07:07 -07:00\n\
             \x20 State of charge: 75%\n\
             \x20 Remaining: 180 / 240 (18000 Wh)\n\
             \x20 Range (A/C on): 107 km / 66 mi\n\
             \x20 Range (A/C off): 115 km / 71 mi\n\
             \x20 Plug: connected\n\
             \x20 Charging: charging\n\
             \x20 Time to full: L1 2h30m, L2 1h35m, L2 6kW 1h00m\n"
        );
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(10); 3]);
    }

    #[test]
    fn skips_refresh_when_disabled() {
        let sleeper = RecordingSleeper::default();
        let mut out = Vec::new();

        run_with(&replay_service(), &config(false, 30), &sleeper, &mut out)
            .expect("replayed session should succeed");

        assert!(sleeper.sleeps().is_empty());
        assert!(String::from_utf8_lossy(&out).contains("State of charge: 75%"));
    }

    #[test]
    fn surfaces_poll_exhaustion() {
        let sleeper = RecordingSleeper::default();
        let mut out = Vec::new();

        let result = run_with(&replay_service(), &config(true, 2), &sleeper, &mut out);

        assert!(matches!(
            result,
            Err(AppError::Client(CarwingsError::UpdateTimedOut { attempts: 2 }))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn formats_durations_as_hours_and_minutes() {
        assert_eq!(format_duration(TimeDelta::minutes(0)), "0h00m");
        assert_eq!(format_duration(TimeDelta::minutes(95)), "1h35m");
        assert_eq!(format_duration(TimeDelta::minutes(600)), "10h00m");
    }
}
