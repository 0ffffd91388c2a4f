//! A `tracing` layer that turns events into console records.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{Event, Subscriber};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

use super::context::LoggingContext;
use crate::parsers::Level;

/// Feeds every `tracing` event into a [`LoggingContext`].
///
/// The event target (usually the module path) becomes the source path, so
/// the console filter tree mirrors the module tree.
pub struct ConsoleLayer {
    context: Arc<LoggingContext>,
}

impl ConsoleLayer {
    pub fn new(context: Arc<LoggingContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<LoggingContext> {
        &self.context
    }
}

/// Map a `tracing` level onto the console levels
pub fn level_from_tracing(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::ERROR => Level::Critical,
        tracing::Level::WARN => Level::Warning,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

impl<S> Layer<S> for ConsoleLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = level_from_tracing(metadata.level());
        if level == Level::Debug && !self.context.debug_enabled() {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.context.log(level, metadata.target(), visitor.into_message());
    }
}

/// Collects the `message` field and appends the rest as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: impl std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }

    fn into_message(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LogConsole;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_events_reach_console() {
        let console = LogConsole::default();
        let context = Arc::new(LoggingContext::new());
        context.set_console_output(false);
        context.set_file_output(false);
        context.attach_console(console.sender());

        let layer = ConsoleLayer::new(Arc::clone(&context));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "net::tcp", peer = "10.0.0.1", "connected");
            tracing::error!(target: "db", "disk full");
            tracing::debug!(target: "db", code = 7, "details");
        });

        let texts: Vec<String> = console.drain_live().iter().map(|f| f.text()).collect();
        assert_eq!(texts.len(), 3);
        assert!(texts[0].ends_with("net::tcp >> connected peer=10.0.0.1"));
        assert!(texts[2].ends_with("db >> details code=7"));

        let history = console.history_snapshot();
        assert_eq!(history[1].level, Level::Critical);
        assert_eq!(history[0].source_path, ["net", "tcp"]);
        assert!(console.filter_snapshot().find(&["net", "tcp"]).is_some());
    }

    #[test]
    fn test_debug_events_respect_switch() {
        let console = LogConsole::default();
        let context = Arc::new(LoggingContext::new());
        context.set_console_output(false);
        context.set_file_output(false);
        context.set_debug(false);
        context.attach_console(console.sender());

        let subscriber = tracing_subscriber::registry().with(ConsoleLayer::new(context));
        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!(target: "x", "hidden");
            tracing::debug!(target: "x", "hidden");
            tracing::warn!(target: "x", "shown");
        });
        assert_eq!(console.drain_live().len(), 1);
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_from_tracing(&tracing::Level::TRACE), Level::Debug);
        assert_eq!(level_from_tracing(&tracing::Level::WARN), Level::Warning);
        assert_eq!(level_from_tracing(&tracing::Level::ERROR), Level::Critical);
    }
}
