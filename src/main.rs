use clap::Parser;
use tracing::info;

use readonly_plugin::config::{Opts, PluginConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();

    // Initialize logging
    readonly_plugin::util::init_logging(opts.log_json);

    let config = PluginConfig::from_opts(&opts)?;

    info!("Starting read-only plugin server on {}", config.bind_addr());

    // Run the server
    readonly_plugin::server::run_server(config).await
}
