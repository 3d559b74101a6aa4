//! A `Logger` that forwards to `tracing`.

use crate::core::Logger;
use tracing::{debug, error, info, trace, warn, Level};

/// Emits log calls as `tracing` events tagged with a component name.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl TracingLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        let component = self.component.as_str();
        if level == Level::ERROR {
            error!(component, "{}", message);
        } else if level == Level::WARN {
            warn!(component, "{}", message);
        } else if level == Level::INFO {
            info!(component, "{}", message);
        } else if level == Level::DEBUG {
            debug!(component, "{}", message);
        } else {
            trace!(component, "{}", message);
        }
    }
}
