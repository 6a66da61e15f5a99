//! Module provides initialization of global application logger

use std::error::Error;

use chrono::{Local, SecondsFormat};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;

/// Initializes the global logger which writes both to the console
/// and to the timestamped file in the `logs` directory.
///
/// # Errors
/// An error is returned if the log file cannot be created
/// or if logger has already been initialized.
///
pub fn init(level: LevelFilter) -> Result<Handle, Box<dyn Error + Send + Sync + 'static>> {
    let pattern = "{d(%H:%M:%S%.3f)} {l:<5} {t} >> {m}{n}";
    let encoder = Box::new(PatternEncoder::new(pattern));

    let stdout = ConsoleAppender::builder().encoder(encoder.clone()).build();
    let file_name = format!(
        "logs/{}_{}.log",
        crate::config::APP_NAME,
        Local::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(':', "-"),
    );
    let file = FileAppender::builder().encoder(encoder).build(file_name)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(Root::builder().appenders(["stdout", "file"]).build(level))?;
    Ok(log4rs::init_config(config)?)
}
