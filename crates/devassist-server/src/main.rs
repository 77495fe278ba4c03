//! Devassist Server Binary
//!
//! Standalone entry point - loads configuration from the working directory
//! and delegates to lib.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = devassist_core::load_config(&cwd)?;

    devassist_server::run_server(config).await
}
