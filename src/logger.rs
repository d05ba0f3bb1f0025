use std::sync::Mutex;
use std::time::Instant;

use anyhow::Result;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::prelude::__tracing_subscriber_SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `settings.log.level` (defaults to `info`). Events go to
/// stdout and, when `settings.log.file` is set, also to that file without ANSI
/// colours. Timestamps are the time elapsed since setup.
///
/// Fails if a global subscriber is already installed.
pub fn setup_log(settings: &Settings) -> Result<()> {
    let env_filter = EnvFilter::try_new(settings.log.level.as_str())?;

    let timestamper = ElapsedTimestamp {
        start: Instant::now(),
    };

    let file_layer = match &settings.log.file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(timestamper.clone()),
            )
        }
        None => None,
    };

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false)
        .with_timer(timestamper);

    Registry::default()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(())
}

#[derive(Clone)]
struct ElapsedTimestamp {
    start: Instant,
}

impl FormatTime for ElapsedTimestamp {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> Result<(), std::fmt::Error> {
        let elapsed = self.start.elapsed();
        let hours = elapsed.as_secs() / 3600;
        let minutes = (elapsed.as_secs() % 3600) / 60;
        let seconds = elapsed.as_secs() % 60;
        let millis = elapsed.subsec_millis();

        write!(w, "{:02}h {:02}m {:02}.{:03}s", hours, minutes, seconds, millis)
    }
}
