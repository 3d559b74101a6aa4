#![allow(dead_code)]

pub mod fake_backend;

use notifyhub::config::Config;

/// A configuration whose simulated transports are instant and never fail.
pub fn quiet_config() -> Config {
    let mut config = Config::default();
    config.email.latency_ms = 0;
    config.email.failure_rate = 0.0;
    config.sms.latency_ms = 0;
    config.sms.failure_rate = 0.0;
    config.push.latency_ms = 0;
    config.push.failure_rate = 0.0;
    config.chat.latency_ms = 0;
    config
}
