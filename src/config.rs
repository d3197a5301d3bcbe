use serde::Deserialize;

const PLACEHOLDER_PASSWORD: &str = "admin123";
const PLACEHOLDER_SECRET: &str = "supersecretjwtkey";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub admin_username: String,
    pub admin_password: String,
    pub jwt_secret: String,
    /// Lifetime of an admin session token.
    /// Set via APPGATE_TOKEN_TTL_HOURS. Default: 8.
    pub token_ttl_hours: i64,
    /// Extra origin allowed by CORS besides localhost.
    pub dashboard_origin: String,
}

impl Config {
    /// Config for tests and embedded use: in-memory store, fixed credentials.
    pub fn for_testing(admin_username: &str, admin_password: &str, jwt_secret: &str) -> Self {
        Self {
            port: 0,
            database_url: "sqlite::memory:".into(),
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
            jwt_secret: jwt_secret.into(),
            token_ttl_hours: 8,
            dashboard_origin: "http://localhost:3000".into(),
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let admin_password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| PLACEHOLDER_PASSWORD.into());
    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| PLACEHOLDER_SECRET.into());

    if admin_password == PLACEHOLDER_PASSWORD || jwt_secret == PLACEHOLDER_SECRET {
        let env_mode = std::env::var("APPGATE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "ADMIN_PASSWORD or JWT_SECRET is still the insecure placeholder. \
                 Set real values before running in production."
            );
        }
        eprintln!("⚠️  ADMIN_PASSWORD / JWT_SECRET not set — using insecure placeholders.");
    }

    Ok(Config {
        port: std::env::var("APPGATE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8002),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/appgate.db".into()),
        admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
        admin_password,
        jwt_secret,
        token_ttl_hours: std::env::var("APPGATE_TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|h: &i64| *h > 0)
            .unwrap_or(8),
        dashboard_origin: std::env::var("DASHBOARD_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".into()),
    })
}
