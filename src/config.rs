use anyhow::Context;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct HashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
    pub request_timeout_secs: u64,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;
        let secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let defaults = HashConfig::default();
        Ok(Self {
            database_url,
            database_max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), 10),
            jwt: JwtConfig {
                secret,
                // 8766h = one year
                ttl_hours: parse_or(get("JWT_TTL_HOURS"), 8766),
            },
            hash: HashConfig {
                memory_kib: parse_or(get("ARGON2_MEMORY_KIB"), defaults.memory_kib),
                iterations: parse_or(get("ARGON2_ITERATIONS"), defaults.iterations),
                parallelism: parse_or(get("ARGON2_PARALLELISM"), defaults.parallelism),
            },
            request_timeout_secs: parse_or(get("REQUEST_TIMEOUT_SECS"), 30),
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(get("APP_PORT"), 8080),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}
