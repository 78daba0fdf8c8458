use std::time::Duration;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the API server the triggers are sent to.
    pub backend_url: String,
    pub poll_interval: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `BACKEND_URL`               | `http://localhost:3001` |
    /// | `WORKER_POLL_INTERVAL_SECS` | `60`                    |
    pub fn from_env() -> Self {
        let backend_url = std::env::var("BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:3001".into())
            .trim_end_matches('/')
            .to_string();

        let poll_interval_secs: u64 = std::env::var("WORKER_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("WORKER_POLL_INTERVAL_SECS must be a valid u64");

        Self {
            backend_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
        }
    }
}
