//! Diagnostic log lines.
//!
//! Every event becomes one line of the form `[renderer <ISO-8601 UTC>] text`
//! on stdout, mirrored to the file named by `SHELFVID_LOG_FILE` when set.

use std::fmt::{self, Write as _};
use std::fs::OpenOptions;
use std::io::{self, Write};

use anyhow::Context as _;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_ENV: &str = "SHELFVID_LOG_FILE";
const LINE_PREFIX: &str = "renderer";

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ` for `time`.
pub fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn format_line(time: DateTime<Utc>, message: &str) -> String {
    format!("[{} {}] {}", LINE_PREFIX, iso_timestamp(time), message)
}

/// Writes one formatted line per event to `W`.
pub struct LineLayer<W> {
    sink: Mutex<W>,
}

impl<W: Write> LineLayer<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

impl<S, W> Layer<S> for LineLayer<W>
where
    S: Subscriber,
    W: Write + Send + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let line = format_line(Utc::now(), &(visitor.message + &visitor.fields));

        let mut sink = self.sink.lock();
        let _ = writeln!(sink, "{}", line);
        let _ = sink.flush();
    }
}

/// Install the global subscriber. `RUST_LOG` refines the default
/// `shelfvid=info` filter.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("shelfvid=info".parse()?);

    let mirror = match std::env::var_os(LOG_FILE_ENV).filter(|v| !v.is_empty()) {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;
            Some(LineLayer::new(file))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(LineLayer::new(io::stdout()))
        .with(mirror)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}
