#[tokio::main]
async fn main() -> std::io::Result<()> {
    royale_sync::frameworks::server::run_with_config().await
}
