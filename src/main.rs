use env_logger::Env;
use log::{info, warn};

use vaxsurvey::{Config, app, qr};

/// Main entry point for the survey web application
///
/// Loads configuration from the environment, writes the survey QR code as a
/// one-time side effect, and runs the server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    std::fs::create_dir_all(&config.static_dir)?;
    let qr_path = config.static_dir.join("survey-qr.png");
    match qr::write_survey_qr(&config.survey_url, &qr_path) {
        Ok(()) => info!("Survey QR code written to {}", qr_path.display()),
        Err(e) => warn!("Could not write survey QR code: {}", e),
    }

    app::run(config).await
}
