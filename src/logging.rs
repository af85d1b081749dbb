use crate::config::AppConfig;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

pub fn init_subscriber(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Route log-crate records (sea-orm, sqlx) through tracing.
    let _ = tracing_log::LogTracer::init();

    if config.log_format == "pretty" {
        let subscriber = Registry::default().with(filter).with(fmt::layer().pretty());
        let _ = tracing::subscriber::set_global_default(subscriber);
    } else {
        let subscriber = Registry::default().with(filter).with(fmt::layer().json());
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}
