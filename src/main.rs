#[tokio::main]
async fn main() -> anyhow::Result<()> {
    webprobe_cli::cli::run().await
}
