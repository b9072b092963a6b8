mod app;
mod bridge;
mod commands;
mod config;
mod logging;
mod recording;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    app::run().await
}
