use tracing::{info, warn, Level};

use tracing_inline_fmt::init::{init_tracing_with_config, LayerConfig};
use tracing_inline_fmt::render::TimeStyle;
use tracing_inline_fmt::stamp::StampFlags;

fn main() {
    let flags = StampFlags::DATE | StampFlags::YEAR | StampFlags::UTC | StampFlags::MICROS;
    let config = LayerConfig {
        max_level: Level::DEBUG,
        header: Some(flags),
        time_style: TimeStyle::Stamp(flags),
        include_source: true,
    };
    init_tracing_with_config(Box::new(std::io::stdout()), config);

    info!(job = "reindex", shard = 3, "started `job` on shard `shard`");
    warn!(job = "reindex", "`job` is running slow");
}
