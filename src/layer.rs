use std::io::Write;
use std::sync::Mutex;

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::expand::LineRenderer;
use crate::header::Header;
use crate::init::LayerConfig;
use crate::record::{Attr, Record};
use crate::render::ValueFormatter;

/// `tracing_subscriber` layer that renders each event as one line with the
/// message's backtick placeholders expanded inline.
///
/// Rendering happens synchronously on the calling thread; only the final
/// `write_all` of the finished line takes the writer mutex, so concurrent
/// events never interleave within a line. A record that fails to render or
/// write is reported to stderr and dropped; the layer never panics on
/// malformed templates.
pub struct InlineFmtLayer {
    renderer: LineRenderer,
    header: Option<Header>,
    config: LayerConfig,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl InlineFmtLayer {
    /// Create a layer with [`LayerConfig::default`] writing to `writer`.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self::with_config(writer, LayerConfig::default())
    }

    pub fn with_config(writer: Box<dyn Write + Send>, config: LayerConfig) -> Self {
        InlineFmtLayer {
            renderer: LineRenderer::new(ValueFormatter {
                time_style: config.time_style,
            }),
            header: config.header.map(Header::new),
            config,
            writer: Mutex::new(writer),
        }
    }
}

impl<S> Layer<S> for InlineFmtLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        *metadata.level() <= self.config.max_level
    }

    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > self.config.max_level {
            return;
        }

        let mut record = Record::default();
        let mut visitor = FieldVisitor {
            record: &mut record,
        };
        event.record(&mut visitor);

        let mut line = String::new();
        if let Some(header) = &self.header {
            header.append(&mut line, &Utc::now().fixed_offset(), *meta.level());
        }
        if self.config.include_source {
            if let Some(file) = meta.file() {
                line.push('@');
                line.push_str(file);
                if let Some(line_no) = meta.line() {
                    line.push(':');
                    line.push_str(&line_no.to_string());
                }
                line.push(' ');
            }
        }
        if record.attrs.is_empty() {
            // nothing to expand or append, take the message verbatim
            line.push_str(&record.message);
        } else if let Err(e) = self.renderer.render_into(&mut line, &record) {
            eprintln!("cannot render log record: {}", e);
            return;
        }
        line.push('\n');

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writer.write_all(line.as_bytes()) {
            eprintln!("cannot write log line: {}", e);
        }
    }
}

/// Collects an event's fields into a [`Record`], keeping call-site order.
///
/// The `message` field becomes the record's template; every other field is
/// appended as a typed attribute.
struct FieldVisitor<'a> {
    record: &'a mut Record,
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.record.message = value.to_string();
        } else {
            self.record.attrs.push(Attr::new(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record.attrs.push(Attr::new(field.name(), value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match i64::try_from(value) {
            Ok(v) => self.record.attrs.push(Attr::new(field.name(), v)),
            Err(_) => self
                .record
                .attrs
                .push(Attr::new(field.name(), value.to_string())),
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record.attrs.push(Attr::new(field.name(), value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record.attrs.push(Attr::new(field.name(), value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record
            .attrs
            .push(Attr::new(field.name(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.record.message = format!("{:?}", value);
        } else {
            self.record
                .attrs
                .push(Attr::new(field.name(), format!("{:?}", value)));
        }
    }
}
