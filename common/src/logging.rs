use std::{fmt::Display, fs::OpenOptions, sync::Mutex};

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::error::Error;

/// Installs the global subscriber. With `file` set, records are appended there
/// instead of stderr.
pub fn init(file: Option<&str>) -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match file {
        Some(path) => {
            let log = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| Error::Config(format!("log file {path}: {err}")))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(log))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|err| Error::Config(format!("logging: {err}")))
}

/// Records a fatal error in the log stream before it is returned to `main`.
pub fn log_failure<T, E: Display>(result: Result<T, E>) -> Result<T, E> {
    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}
