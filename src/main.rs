/// Entry point for the Creo Housekeeper.
///
/// Logging is configured through `RUST_LOG`; see [`creo_housekeeper::run`] for the
/// remaining environment variables.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug HOUSEKEEPING_INTERVAL_MS=500 cargo run -- /docker /system.slice
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    creo_housekeeper::run().await
}
