#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

#[derive(clap::Parser)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    // redis url for the catalog store
    #[clap(long, env)]
    pub redis_url: String,

    // secret used to sign download tokens, have it be anything secure
    // like 'openssl rand -base64 32'
    #[clap(long, env)]
    pub download_token_secret: String,

    // how long an issued download token stays redeemable
    #[clap(long, env, default_value = "30")]
    pub download_token_ttl_minutes: i64,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // example.com,something.com
    #[clap(long, env)]
    pub cors_origin: String,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,
}

impl Default for AppConfig {
    // defaults aren't really needed here but it's here as a bad fallback
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            redis_url: "redis://localhost:6379".to_string(),
            download_token_secret: "default-download-secret".to_string(),
            download_token_ttl_minutes: 30,
            cors_origin: "*".to_string(),
            sentry_dsn: None,
        }
    }
}
