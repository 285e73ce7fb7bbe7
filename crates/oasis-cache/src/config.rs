use oasis_core::OasisError;

/// Refresh-token lifetime used for session entries when nothing else is configured (7 days).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest TTL accepted from configuration (10 years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration for [`CachingQueryExecutor`](crate::CachingQueryExecutor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCacheConfig {
    /// TTL in seconds for session-mode entries. Matches the refresh-token expiry.
    pub session_ttl: u64,
    /// Optional TTL in seconds applied to a hash bucket each time a field is written.
    /// `None` keeps bucket entries until they are invalidated.
    pub bucket_ttl: Option<u64>,
}

impl Default for QueryCacheConfig {
    fn default() -> Self {
        Self {
            session_ttl: DEFAULT_SESSION_TTL_SECS,
            bucket_ttl: None,
        }
    }
}

impl QueryCacheConfig {
    pub fn with_session_ttl(mut self, seconds: u64) -> Self {
        self.session_ttl = seconds;
        self
    }

    pub fn with_bucket_ttl(mut self, seconds: u64) -> Self {
        self.bucket_ttl = Some(seconds);
        self
    }

    /// Read `REFRESH_TOKEN_EXPIRES_IN` and `QUERY_CACHE_BUCKET_TTL` from the environment.
    ///
    /// Both accept plain seconds or a number suffixed with `s`, `m`, `h` or `d`.
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, OasisError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OasisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup("REFRESH_TOKEN_EXPIRES_IN") {
            config.session_ttl = parse_seconds(&raw).map_err(|e| {
                OasisError::Config(format!("REFRESH_TOKEN_EXPIRES_IN: {e}"))
            })?;
        }
        if let Some(raw) = lookup("QUERY_CACHE_BUCKET_TTL") {
            config.bucket_ttl = Some(
                parse_seconds(&raw)
                    .map_err(|e| OasisError::Config(format!("QUERY_CACHE_BUCKET_TTL: {e}")))?,
            );
        }
        Ok(config)
    }
}

/// Parse a duration such as `"3600"`, `"90s"`, `"15m"`, `"12h"` or `"7d"` into seconds.
///
/// The result is between 1 and [`MAX_TTL_SECS`].
pub fn parse_seconds(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], c.to_ascii_lowercase()),
        Some(_) => (raw, 's'),
        None => return Err("empty duration".to_string()),
    };
    let amount: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{raw}'"))?;
    let factor = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        other => return Err(format!("unknown duration unit '{other}' in '{raw}'")),
    };
    amount
        .checked_mul(factor)
        .filter(|secs| (1..=MAX_TTL_SECS).contains(secs))
        .ok_or_else(|| format!("duration '{raw}' out of range (1..={MAX_TTL_SECS}s)"))
}
