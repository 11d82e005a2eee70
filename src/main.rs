use seedgen::{logger, server, Config, SeedreamClient};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logger::init()?;
            log::error!("❌ Invalid configuration: {}", e);
            return Err(e.into());
        }
    };
    logger::init_with_config(logger::LoggerConfig::from_config(&config))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), config.port());
    logger::log_config_info(&config);

    let client = match SeedreamClient::new(config.seedream.clone()) {
        Ok(client) => {
            log::info!("✅ Seedream client initialized (model {})", client.model());
            client
        }
        Err(e) => {
            log::error!("❌ Failed to initialize Seedream client: {}", e);
            return Err(e.into());
        }
    };

    server::run(client, config.port()).await?;
    Ok(())
}
