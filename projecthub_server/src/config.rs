use std::env;

use chrono::Duration;
use log::*;
use ph_common::{Secret, INR_CURRENCY_CODE};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_PH_HOST: &str = "127.0.0.1";
const DEFAULT_PH_PORT: u16 = 8480;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_GATEWAY_URL: &str = "https://api.razorpay.com";
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Directory where uploaded files are stored and served from (under `/uploads`).
    pub upload_dir: String,
    /// The email address that is promoted to admin at startup, if the account exists.
    pub admin_email: Option<String>,
    /// Payment gateway credentials and endpoint.
    pub gateway: GatewayConfig,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: Secret::new(String::default()), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
    /// ISO currency code stamped on every gateway order.
    pub currency: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            key_id: String::default(),
            key_secret: Secret::new(String::default()),
            currency: INR_CURRENCY_CODE.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PH_HOST.to_string(),
            port: DEFAULT_PH_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            upload_dir: DEFAULT_UPLOAD_DIR.to_string(),
            admin_email: None,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("PH_HOST").ok().unwrap_or_else(|| DEFAULT_PH_HOST.into());
        let port = env::var("PH_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PH_PORT. {e} Using the default, {DEFAULT_PH_PORT}, instead."
                    );
                    DEFAULT_PH_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PH_PORT);
        let database_url = env::var("PH_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PH_DATABASE_URL is not set. Please set it to the URL for the hub database.");
            String::default()
        });
        let auth = AuthConfig::from_env_or_default();
        let upload_dir = env::var("PH_UPLOAD_DIR").ok().unwrap_or_else(|| {
            info!("🪛️ PH_UPLOAD_DIR is not set. Using the default, '{DEFAULT_UPLOAD_DIR}'.");
            DEFAULT_UPLOAD_DIR.to_string()
        });
        let admin_email = env::var("PH_ADMIN_EMAIL").ok();
        if admin_email.is_none() {
            info!("🪛️ PH_ADMIN_EMAIL is not set. No account will be promoted to admin at startup.");
        }
        let gateway = GatewayConfig::from_env_or_default();
        Self { host, port, database_url, auth, upload_dir, admin_email, gateway }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let jwt_secret = env::var("PH_JWT_SECRET").ok().unwrap_or_else(|| {
            warn!(
                "🚨️ PH_JWT_SECRET is not set. A random signing secret will be used. All issued tokens will be \
                 invalidated when the server restarts. Set PH_JWT_SECRET to a long random string in production."
            );
            thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect()
        });
        let token_lifetime = env::var("PH_TOKEN_LIFETIME_HOURS")
            .map_err(|_| {
                info!(
                    "🪛️ PH_TOKEN_LIFETIME_HOURS is not set. Using the default value of {} hrs.",
                    DEFAULT_TOKEN_LIFETIME.num_hours()
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::hours)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for PH_TOKEN_LIFETIME_HOURS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);
        Self { jwt_secret: Secret::new(jwt_secret), token_lifetime }
    }
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("PH_GATEWAY_URL").ok().unwrap_or_else(|| {
            info!("🪛️ PH_GATEWAY_URL is not set. Using the default, '{DEFAULT_GATEWAY_URL}'.");
            DEFAULT_GATEWAY_URL.to_string()
        });
        let key_id = env::var("PH_GATEWAY_KEY_ID").ok().unwrap_or_else(|| {
            error!("🪛️ PH_GATEWAY_KEY_ID is not set. Please set it to the key id for your payment gateway account.");
            String::default()
        });
        let key_secret = env::var("PH_GATEWAY_KEY_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ PH_GATEWAY_KEY_SECRET is not set. Please set it to the key secret for your payment gateway \
                 account. Payment confirmations cannot be verified without it."
            );
            String::default()
        });
        let currency = env::var("PH_CURRENCY").ok().unwrap_or_else(|| {
            info!("🪛️ PH_CURRENCY is not set. Using the default, '{INR_CURRENCY_CODE}'.");
            INR_CURRENCY_CODE.to_string()
        });
        Self { base_url, key_id, key_secret: Secret::new(key_secret), currency }
    }
}
