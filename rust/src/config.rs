use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::notify::AlertChannel;

const CONFIG_FILE: &str = "threadline_config.json";
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_WORKER_THREADS: usize = 2;
const DEFAULT_ALERT_CHANNEL_ID: &str = "sms_channel";
const DEFAULT_ALERT_CHANNEL_NAME: &str = "Messages";

/// Optional overrides read from `<data_dir>/threadline_config.json`.
/// Unset fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub query_timeout_ms: Option<u64>,
    pub worker_threads: Option<usize>,
    pub alert_channel_id: Option<String>,
    pub alert_channel_name: Option<String>,
    /// `EnvFilter` directives, e.g. `"threadline_core=trace,info"`.
    pub log_filter: Option<String>,
}

/// Missing or unparsable files yield the defaults.
pub fn load_client_config(data_dir: &str) -> ClientConfig {
    let (config, problem) = read_client_config(data_dir);
    if let Some(problem) = problem {
        problem.log();
    }
    config
}

/// An unparsable config file, kept so it can be logged once logging is up.
#[derive(Debug)]
pub(crate) struct ConfigProblem {
    path: PathBuf,
    err: serde_json::Error,
}

impl ConfigProblem {
    pub(crate) fn log(&self) {
        tracing::warn!(err = %self.err, path = %self.path.display(), "ignoring unparsable config");
    }
}

pub(crate) fn read_client_config(data_dir: &str) -> (ClientConfig, Option<ConfigProblem>) {
    let path = Path::new(data_dir).join(CONFIG_FILE);
    let Ok(bytes) = std::fs::read(&path) else {
        return (ClientConfig::default(), None);
    };
    match serde_json::from_slice::<ClientConfig>(&bytes) {
        Ok(config) => (config, None),
        Err(err) => (ClientConfig::default(), Some(ConfigProblem { path, err })),
    }
}

/// The config file a fresh install would get, with every default spelled out.
pub fn default_config_json() -> String {
    serde_json::json!({
        "query_timeout_ms": DEFAULT_QUERY_TIMEOUT_MS,
        "worker_threads": DEFAULT_WORKER_THREADS,
        "alert_channel_id": DEFAULT_ALERT_CHANNEL_ID,
        "alert_channel_name": DEFAULT_ALERT_CHANNEL_NAME,
    })
    .to_string()
}

impl ClientConfig {
    /// `THREADLINE_QUERY_TIMEOUT_MS` beats the file.
    pub fn query_timeout(&self) -> Duration {
        let from_env = std::env::var("THREADLINE_QUERY_TIMEOUT_MS").ok();
        self.query_timeout_with_override(from_env.as_deref())
    }

    fn query_timeout_with_override(&self, env: Option<&str>) -> Duration {
        let ms = env
            .and_then(|v| v.trim().parse::<u64>().ok())
            .or(self.query_timeout_ms)
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_MS);
        Duration::from_millis(ms)
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
            .unwrap_or(DEFAULT_WORKER_THREADS)
            .max(1)
    }

    pub fn alert_channel(&self) -> AlertChannel {
        AlertChannel {
            id: self
                .alert_channel_id
                .clone()
                .unwrap_or_else(|| DEFAULT_ALERT_CHANNEL_ID.to_string()),
            name: self
                .alert_channel_name
                .clone()
                .unwrap_or_else(|| DEFAULT_ALERT_CHANNEL_NAME.to_string()),
        }
    }
}
