use treefs_engine::server::FsServer;
use treefs_engine::transport::NdjsonTransport;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut server = FsServer::new(NdjsonTransport::new());

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "treefs-engine ready");

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("stdin closed, shutting down");
}
