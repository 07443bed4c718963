use crate::utils::truncate_str;
use crate::{PreviewError, PreviewRecord};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

#[derive(Debug)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub log_level: String,
    pub console_output: bool,
    pub file_output: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".into(),
            log_level: "info".into(),
            console_output: true,
            file_output: false,
        }
    }
}

const CARD_WIDTH: usize = 80;
const CONTENT_WIDTH: usize = CARD_WIDTH - 13;

fn card_line(label: &str, value: &str) -> String {
    format!("║ {label:<9}{:<width$} ║", truncate_str(value, CONTENT_WIDTH), width = CONTENT_WIDTH)
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Render a record as a boxed card, one field per line.
pub fn format_preview_card(record: &PreviewRecord) -> String {
    let horizontal_line = "═".repeat(CARD_WIDTH - 2);
    let images = record.images.as_deref().unwrap_or_default();
    let videos = record.videos.as_deref().unwrap_or_default();

    let lines = [
        card_line("URL:", &record.url),
        card_line("Host:", or_na(record.host.as_deref().unwrap_or_default())),
        card_line("Title:", or_na(&record.title)),
        card_line("Desc:", or_na(&record.description)),
        card_line("Type:", &format!("{} ({})", record.media_type, or_na(&record.content_type))),
        card_line("Keywords:", or_na(&record.keywords.join(", "))),
        card_line("Image:", or_na(images.first().map(String::as_str).unwrap_or_default())),
        card_line("Video:", or_na(videos.first().map(|v| v.url.as_str()).unwrap_or_default())),
    ];

    format!("\n╔{horizontal_line}╗\n{}\n╚{horizontal_line}╝", lines.join("\n"))
}

pub fn log_preview_card(record: &PreviewRecord) {
    let card = format_preview_card(record);
    if record.load_failed {
        warn!("{}", card);
    } else {
        info!("{}", card);
    }
}

pub fn setup_logging(config: LogConfig) -> Result<(), PreviewError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut layers = Vec::new();

    if config.console_output {
        let console_layer = subscriber_fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true);
        layers.push(console_layer.boxed());
    }

    if config.file_output {
        std::fs::create_dir_all(&config.log_dir).map_err(|e| {
            PreviewError::ConfigError(format!("log directory {}: {e}", config.log_dir.display()))
        })?;

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "link-preview.log");

        let file_layer = subscriber_fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_writer(file_appender);

        layers.push(file_layer.boxed());
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| PreviewError::ConfigError(format!("global subscriber: {e}")))?;

    debug!("Logging system initialized with config: {:?}", config);
    Ok(())
}
