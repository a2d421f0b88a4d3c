use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;

use crate::schema::SurveyVariant;

/// Remote mirror settings; present only when mirroring is configured.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// API token for the hosting platform
    pub token: String,

    /// Target repository as `owner/name`
    pub repo: String,

    /// Branch the record files are committed to
    pub branch: String,
}

/// Immutable application configuration
///
/// Loaded once from the environment at process start and passed into
/// handlers through shared state; nothing reads ambient globals afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the server binds to
    pub port: u16,

    /// Public URL of the survey form, encoded into the startup QR code
    pub survey_url: String,

    /// Directory holding the per-day record files
    pub data_dir: PathBuf,

    /// Directory of static assets (stylesheet, QR image)
    pub static_dir: PathBuf,

    /// Which questionnaire this deployment serves
    pub variant: SurveyVariant,

    /// Fixed credentials for the CSV download endpoint
    pub download_user: String,
    pub download_password: String,

    /// Fixed time zone for timestamps and date keys, never host-local time
    pub tz_offset: FixedOffset,

    /// Remote mirror target; `None` disables mirroring
    pub mirror: Option<MirrorConfig>,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Environment variables
    /// * `PORT` - Listen port (default 3000)
    /// * `SURVEY_URL` - Public survey URL for the QR code
    /// * `DATA_DIR` - Record file directory (default `data`)
    /// * `STATIC_DIR` - Static assets directory (default `static`)
    /// * `SURVEY_VARIANT` - `combined` or `hpv` (default `combined`)
    /// * `DOWNLOAD_USER`, `DOWNLOAD_PASSWORD` - Required download credentials
    /// * `SURVEY_TZ_OFFSET` - Fixed offset as `+HH:MM` (default `+00:00`)
    /// * `MIRROR_TOKEN`, `MIRROR_REPO`, `MIRROR_BRANCH` - Optional mirror
    ///   target; mirroring is enabled only when token and repo are both set
    ///
    /// # Returns
    /// * `Result<Config, String>` - The configuration or a startup error
    pub fn from_env() -> Result<Config, String> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT is not a valid port number: {}", raw))?,
            Err(_) => 3000,
        };

        let survey_url = env::var("SURVEY_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}/survey", port));
        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".into()));
        let static_dir = PathBuf::from(env::var("STATIC_DIR").unwrap_or_else(|_| "static".into()));

        let variant_name = env::var("SURVEY_VARIANT").unwrap_or_else(|_| "combined".into());
        let variant = SurveyVariant::parse(&variant_name)
            .ok_or_else(|| format!("Unknown SURVEY_VARIANT: {}", variant_name))?;

        let download_user =
            env::var("DOWNLOAD_USER").map_err(|_| "DOWNLOAD_USER is not set".to_string())?;
        let download_password = env::var("DOWNLOAD_PASSWORD")
            .map_err(|_| "DOWNLOAD_PASSWORD is not set".to_string())?;

        let offset_raw = env::var("SURVEY_TZ_OFFSET").unwrap_or_else(|_| "+00:00".into());
        let tz_offset = parse_tz_offset(&offset_raw)
            .ok_or_else(|| format!("SURVEY_TZ_OFFSET is not a valid offset: {}", offset_raw))?;

        let mirror = match (env::var("MIRROR_TOKEN"), env::var("MIRROR_REPO")) {
            (Ok(token), Ok(repo)) => Some(MirrorConfig {
                token,
                repo,
                branch: env::var("MIRROR_BRANCH").unwrap_or_else(|_| "main".into()),
            }),
            _ => None,
        };

        Ok(Config {
            port,
            survey_url,
            data_dir,
            static_dir,
            variant,
            download_user,
            download_password,
            tz_offset,
            mirror,
        })
    }
}

/// Parse a `+HH:MM` / `-HH:MM` offset into a fixed time zone
fn parse_tz_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
