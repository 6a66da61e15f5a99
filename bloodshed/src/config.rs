//! Configuration utilities for the arena host.

use std::env;
use std::fmt;
use std::str::FromStr;

use bloodshed_ecs::FrameTime;
use log::LevelFilter;
use semver::Version;

pub const APP_NAME: &str = env!("CARGO_CRATE_NAME", "binary must be compiled by Cargo");

const ENGINE_VERSION_STR: &str = env!("CARGO_PKG_VERSION", "binary must be compiled by Cargo");
lazy_static::lazy_static! {
    pub static ref ENGINE_VERSION: Version =
        Version::parse(ENGINE_VERSION_STR).expect("Cargo package version is valid semver");
}

/// Overrides the count of simulated frames.
pub const FRAMES_VAR: &str = "BLOODSHED_FRAMES";
/// Overrides the fixed frame time in seconds.
pub const FRAME_TIME_VAR: &str = "BLOODSHED_FRAME_TIME";
/// Overrides the maximum log level.
pub const LOG_LEVEL_VAR: &str = "BLOODSHED_LOG";

/// General configuration of the arena host.
#[derive(Debug, Clone)]
pub struct Config {
    name: String,
    version: Version,
    frames: u32,
    frame_time: FrameTime,
    log_level: LevelFilter,
}

/// Environment variable which was set but could not be parsed.
#[derive(Debug, Clone)]
pub struct RejectedVar {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for RejectedVar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ignoring {}={:?}: value cannot be parsed", self.key, self.value)
    }
}

impl Config {
    pub fn new(name: String, version: Version, frames: u32, frame_time: FrameTime) -> Self {
        Self {
            name,
            version,
            frames,
            frame_time,
            log_level: LevelFilter::Info,
        }
    }

    /// Default configuration with values of environment variables applied.
    ///
    /// Invalid values are replaced by defaults and returned, so they can be
    /// reported once the logger is initialized.
    ///
    pub fn from_env() -> (Self, Vec<RejectedVar>) {
        let mut config = Self::default();
        let mut rejected = Vec::new();
        config.frames = env_or(FRAMES_VAR, config.frames, &mut rejected);
        config.frame_time = env_or(FRAME_TIME_VAR, config.frame_time, &mut rejected);
        config.log_level = env_or(LOG_LEVEL_VAR, config.log_level, &mut rejected);
        if !(config.frame_time.is_finite() && config.frame_time > 0.0) {
            rejected.push(RejectedVar {
                key: FRAME_TIME_VAR,
                value: config.frame_time.to_string(),
            });
            config.frame_time = Self::default().frame_time;
        }
        (config, rejected)
    }

    /// Name of the game.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semver version of the game.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Count of frames to simulate.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Fixed time step of one frame, in seconds.
    pub fn frame_time(&self) -> FrameTime {
        self.frame_time
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(APP_NAME.to_string(), ENGINE_VERSION.clone(), 600, 1.0 / 60.0)
    }
}

fn env_or<T>(key: &'static str, default: T, rejected: &mut Vec<RejectedVar>) -> T
where
    T: FromStr,
{
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return default,
    };
    let parsed = value.trim().parse();
    match parsed {
        Ok(parsed) => parsed,
        Err(_) => {
            rejected.push(RejectedVar { key, value });
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.name(), APP_NAME);
        assert_eq!(config.version(), &*ENGINE_VERSION);
        assert!(config.frames() > 0);
        assert!(config.frame_time() > 0.0);
    }

    #[test]
    fn test_env_or() {
        let mut rejected = Vec::new();
        assert_eq!(env_or("BLOODSHED_TEST_UNSET_VARIABLE", 7u32, &mut rejected), 7);
        assert!(rejected.is_empty());

        env::set_var("BLOODSHED_TEST_FRAMES", " 42 ");
        assert_eq!(env_or("BLOODSHED_TEST_FRAMES", 7u32, &mut rejected), 42);
        assert!(rejected.is_empty());

        env::set_var("BLOODSHED_TEST_BROKEN", "many");
        assert_eq!(env_or("BLOODSHED_TEST_BROKEN", 7u32, &mut rejected), 7);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].key, "BLOODSHED_TEST_BROKEN");
        assert_eq!(rejected[0].value, "many");
    }
}
