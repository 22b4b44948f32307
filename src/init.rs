use std::io::Write;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::layer::InlineFmtLayer;
use crate::render::TimeStyle;
use crate::stamp::StampFlags;

/// Configuration of the line-formatting layer.
///
/// **Fields**
/// - `max_level`: most verbose level the layer still renders; anything more
///   verbose is skipped.
/// - `header`: stamp flags for the line header, or `None` for no header.
/// - `time_style`: how `Time`-valued attributes render inline.
/// - `include_source`: prefix lines with `@file:line` when the call site is
///   known.
#[derive(Debug, Clone, Copy)]
pub struct LayerConfig {
    pub max_level: Level,
    pub header: Option<StampFlags>,
    pub time_style: TimeStyle,
    pub include_source: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        LayerConfig {
            max_level: Level::INFO,
            header: Some(StampFlags::default()),
            time_style: TimeStyle::Rfc3339,
            include_source: false,
        }
    }
}

/// Initialize the global `tracing` subscriber with an [`InlineFmtLayer`]
/// writing to `writer` under the given [`LayerConfig`].
///
/// **Effects**
///
/// This installs a [`Registry`] combined with the layer as the global
/// default subscriber, so all `tracing` events in the process are rendered
/// through it.
pub fn init_tracing_with_config(writer: Box<dyn Write + Send>, config: LayerConfig) {
    let layer = InlineFmtLayer::with_config(writer, config);
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`LayerConfig::default`].
pub fn init_tracing(writer: Box<dyn Write + Send>) {
    init_tracing_with_config(writer, LayerConfig::default());
}
