use tracing::{error, info};

use tracing_inline_fmt::init::init_tracing;

fn main() {
    init_tracing(Box::new(std::io::stdout()));

    info!(
        count = 7,
        item = "Hat",
        user = "John Doe",
        "added `count` x `item` to shopping cart by `user`"
    );
    error!(code = 502, upstream = "billing", "upstream `upstream` answered `code`");
    info!("plain message without attributes");
}
