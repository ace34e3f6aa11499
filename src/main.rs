use anyhow::Result;
use cleancal::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
