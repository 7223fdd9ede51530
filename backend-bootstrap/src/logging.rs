use std::fs;

use anyhow::Result;
use tracing::instrument::WithSubscriber;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use backend_infrastructure::AppConfig;

pub const LOG_FILE_NAME: &str = "eventory.log";

/// Loads the config with console logging already active, so warnings raised
/// while loading are not lost before `init_logging` runs.
pub async fn load_config() -> Result<AppConfig> {
    AppConfig::load()
        .with_subscriber(startup_subscriber(std::io::stdout))
        .await
}

fn startup_subscriber<W>(writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(default_filter())
        .with(fmt::layer().with_writer(writer))
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Console output always; a daily-rolling JSON file as well when `log_dir` is
/// set. The returned guard must live until shutdown so the file gets flushed.
pub fn init_logging(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = default_filter();

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stdout))
            .init();
        return None;
    };

    if let Err(err) = fs::create_dir_all(dir) {
        eprintln!("cannot create log_dir {}: {}", dir, err);
    }
    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().json().with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();
    Some(guard)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("lock")).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn missing_config_warning_reaches_startup_console() {
        let logs = CapturedLogs::default();
        AppConfig::load_from("/nonexistent/eventory/config.toml")
            .with_subscriber(startup_subscriber(logs.clone()))
            .await
            .expect("defaults");

        assert!(logs.contents().contains("not found, using defaults"));
    }
}
