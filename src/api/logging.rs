use slog::Drain;

/// Terminal logger with file locations, drained on a background thread.
pub fn create_stdout_logger(member_id: &str) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("Node" => member_id.to_string()))
}
