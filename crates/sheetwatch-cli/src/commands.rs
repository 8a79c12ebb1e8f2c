pub mod diff;
pub mod groups;
pub mod run;
pub mod validate;

/// Single-threaded runtime for commands that touch the network.
pub(crate) fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
