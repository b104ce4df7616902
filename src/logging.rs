use tracing::Level;
use tracing_subscriber::fmt;

pub fn setup_logging(level: Level, json: bool) {
    let builder = fmt().with_timer(fmt::time()).with_max_level(level);
    if json {
        builder
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .init()
    } else {
        builder.compact().init()
    }
}
