//! fio exporter entry point.

#[tokio::main]
async fn main() {
    if let Err(e) = fio_exporter_cli::run().await {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
