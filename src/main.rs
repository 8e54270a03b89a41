use ema_cross_bot::server::{self, AppState};
use ema_cross_bot::{Logger, LoggerConfig, Meta, ServerConfig};
use std::process::ExitCode;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let logger = match LoggerConfig::from_env().and_then(|config| Logger::from_config(&config)) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logger: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = run(&logger).await;
    if let Err(e) = logger.flush() {
        eprintln!("[LOGGER WARNING] Final flush failed: {}", e);
    }
    code
}

async fn run(logger: &Logger) -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            logger.error_with(
                "Invalid server configuration",
                "server",
                Meta::new().with("errorMsg", e.to_string()),
            );
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            logger.error_with(
                "Failed to start server",
                "server",
                Meta::new()
                    .with("address", config.bind_address())
                    .with_error("error", &e),
            );
            return ExitCode::FAILURE;
        }
    };

    logger.info(format!("Server started on port {}", config.port));
    logger.info(format!("Health check: http://localhost:{}/health", config.port));
    logger.info(format!("Base URL: http://localhost:{}/api", config.port));

    match server::serve(listener, AppState::new(logger.clone())).await {
        Ok(()) => {
            logger.info("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            logger.error_with("Server error", "server", Meta::new().with_error("error", &e));
            ExitCode::FAILURE
        }
    }
}
