//! The application wiring, decoupled from the entry point.

use crate::{
    backends::{ChatBackend, EmailBackend, PushBackend, SmsBackend},
    capability::{self, CapabilitySet},
    cli::Command,
    config::Config,
    dispatcher::Dispatcher,
    formatting::{formatter_for, ReportFormatter},
    logging::TracingLogger,
    types::Statistics,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// A dispatcher with every enabled backend registered, plus the formatter
/// for the configured output format.
pub struct App {
    dispatcher: Dispatcher,
    formatter: Box<dyn ReportFormatter>,
}

impl App {
    /// Builds the backends enabled in `config` and registers them.
    ///
    /// When the email backend is enabled it also serves as the dispatcher's
    /// shared logger; otherwise a plain `tracing` logger is used.
    pub fn from_config(config: &Config) -> Self {
        let mut dispatcher = Dispatcher::from_config(&config.dispatch);

        let email = config
            .email
            .enabled
            .then(|| Arc::new(EmailBackend::new(&config.email)));
        match &email {
            Some(email) => dispatcher.set_logger(email.clone()),
            None => dispatcher.set_logger(Arc::new(TracingLogger::new("dispatcher"))),
        }

        if let Some(email) = email {
            dispatcher.register(email);
        }
        if config.sms.enabled {
            dispatcher.register(Arc::new(SmsBackend::new(&config.sms)));
        }
        if config.push.enabled {
            dispatcher.register(Arc::new(PushBackend::new(&config.push)));
        }
        if config.chat.enabled {
            dispatcher.register(Arc::new(ChatBackend::new(&config.chat)));
        }

        info!(
            backends = dispatcher.len(),
            concurrent = dispatcher.is_concurrent(),
            "Dispatcher ready"
        );
        Self::with_dispatcher(dispatcher, formatter_for(config.output.format))
    }

    /// Wraps an already populated dispatcher.
    pub fn with_dispatcher(dispatcher: Dispatcher, formatter: Box<dyn ReportFormatter>) -> Self {
        Self {
            dispatcher,
            formatter,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Runs a command and returns its rendered output.
    #[instrument(skip_all)]
    pub async fn run(&self, command: &Command) -> String {
        match command {
            Command::Send {
                to,
                message,
                validate,
            } => {
                let report = if *validate {
                    self.dispatcher.send_with_validation(to, message).await
                } else {
                    self.dispatcher.send_to_all(to, message).await
                };
                let mut output = self.formatter.format_report(&report);
                let stats = self.statistics();
                if !stats.is_empty() {
                    output.push_str("\n\n");
                    output.push_str(&self.formatter.format_statistics(&stats));
                }
                output
            }
            Command::Capabilities => self.formatter.format_capabilities(&self.capabilities()),
        }
    }

    /// Statistics of every backend with the tracking capability.
    pub fn statistics(&self) -> Vec<(String, Statistics)> {
        self.dispatcher
            .backends()
            .filter_map(|(key, backend)| {
                capability::tracker(backend.as_ref()).map(|t| (key.to_string(), t.statistics()))
            })
            .collect()
    }

    pub fn capabilities(&self) -> Vec<(String, CapabilitySet)> {
        self.dispatcher
            .backends()
            .map(|(key, backend)| (key.to_string(), CapabilitySet::detect(backend.as_ref())))
            .collect()
    }
}
