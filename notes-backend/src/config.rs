use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

use strum::{Display, EnumString};

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// HMAC secret used to sign session tokens. When unset a random secret is
    /// generated at startup and every token dies with the process.
    pub const JWT_SECRET: &str = "JWT_SECRET";
    pub const TOKEN_TTL_DAYS: &str = "TOKEN_TTL_DAYS";
    /// Set to "true" or "1" to mark the `token` cookie as Secure.
    pub const COOKIE_SECURE: &str = "COOKIE_SECURE";
    pub const RATE_LIMIT_MAX: &str = "RATE_LIMIT_MAX";
    pub const RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
    /// "any_authenticated" (default) or "owner_only"
    pub const SHARE_POLICY: &str = "SHARE_POLICY";
    /// "unscoped" (default) or "owner_or_shared"
    pub const READ_SCOPE: &str = "READ_SCOPE";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const TOKEN_TTL_DAYS: i64 = 7;
    /// Accepted range for `TOKEN_TTL_DAYS`
    pub const TOKEN_TTL_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=3650;
    pub const RATE_LIMIT_MAX: u32 = 100;
    pub const RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
}

/// Who may add users to a note's shared list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SharePolicy {
    /// Any logged-in caller may share any note.
    #[default]
    AnyAuthenticated,
    /// Only the note's author may share it.
    OwnerOnly,
}

/// Which notes a caller may see through listing and fetch-by-id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReadScope {
    /// Every authenticated caller sees every note.
    #[default]
    Unscoped,
    /// Callers see notes they authored or that were shared with them.
    OwnerOrShared,
}

/// Access rules consulted by the authorization guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessPolicy {
    pub share: SharePolicy,
    pub read: ReadScope,
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: Option<String>,
    pub token_ttl_days: i64,
    pub cookie_secure: bool,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub access: AccessPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_var(env_vars::PORT, defaults::PORT),
            database_url: env::var(env_vars::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.to_string()),
            jwt_secret: env::var(env_vars::JWT_SECRET)
                .ok()
                .filter(|s| !s.trim().is_empty()),
            token_ttl_days: parse_var_in(
                env_vars::TOKEN_TTL_DAYS,
                defaults::TOKEN_TTL_DAYS,
                defaults::TOKEN_TTL_DAYS_RANGE,
            ),
            cookie_secure: env::var(env_vars::COOKIE_SECURE)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            rate_limit_max: parse_var(env_vars::RATE_LIMIT_MAX, defaults::RATE_LIMIT_MAX),
            rate_limit_window_secs: parse_var(
                env_vars::RATE_LIMIT_WINDOW_SECS,
                defaults::RATE_LIMIT_WINDOW_SECS,
            ),
            access: AccessPolicy {
                share: parse_var(env_vars::SHARE_POLICY, SharePolicy::default()),
                read: parse_var(env_vars::READ_SCOPE, ReadScope::default()),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            database_url: defaults::DATABASE_URL.to_string(),
            jwt_secret: None,
            token_ttl_days: defaults::TOKEN_TTL_DAYS,
            cookie_secure: false,
            rate_limit_max: defaults::RATE_LIMIT_MAX,
            rate_limit_window_secs: defaults::RATE_LIMIT_WINDOW_SECS,
            access: AccessPolicy::default(),
        }
    }
}

/// Read `name` from the environment, falling back to `default` when it is
/// unset or does not parse.
fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_or_default(name, &raw, default),
        Err(_) => default,
    }
}

/// Like `parse_var`, but values outside `range` also fall back to `default`.
fn parse_var_in<T>(name: &str, default: T, range: RangeInclusive<T>) -> T
where
    T: FromStr + PartialOrd + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => in_range_or_default(name, parse_or_default(name, &raw, default), default, range),
        Err(_) => default,
    }
}

fn in_range_or_default<T>(name: &str, value: T, default: T, range: RangeInclusive<T>) -> T
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        value
    } else {
        log::warn!(
            "Ignoring out-of-range {}={} (expected {}..={}), using default {}",
            name,
            value,
            range.start(),
            range.end(),
            default
        );
        default
    }
}

fn parse_or_default<T>(name: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            log::warn!("Ignoring invalid {}={:?}, using default {}", name, raw, default);
            default
        }
    }
}
