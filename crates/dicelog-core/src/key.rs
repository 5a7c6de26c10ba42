use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// Length of the random key component
pub const KEY_LEN: usize = 4;

/// Inclusive bounds of the random password component
pub const PASSWORD_MIN: u32 = 100_000;
pub const PASSWORD_MAX: u32 = 999_999;

/// Composite storage identifier, rendered as `{key}#{password}`.
///
/// The rendered composite is the sole addressing mechanism into the
/// backend; there is no secondary index, and a wrong password simply
/// addresses a key that does not exist. Collisions are possible but
/// accepted given the keyspace size against expected volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    pub key: String,
    pub password: u32,
}

impl StorageKey {
    /// Generate a fresh key+password pair from thread-local randomness.
    ///
    /// The key draws from the 62-symbol case-sensitive alphanumeric
    /// alphabet; the password is a 6-digit integer. No collision check.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let key: String = (&mut rng)
            .sample_iter(Alphanumeric)
            .take(KEY_LEN)
            .map(char::from)
            .collect();
        let password = rng.gen_range(PASSWORD_MIN..=PASSWORD_MAX);
        Self { key, password }
    }

    /// The composite backend address.
    pub fn composite(&self) -> String {
        self.to_string()
    }

    /// Build the composite address from caller-supplied parts.
    ///
    /// Retrieval treats both parts as opaque strings; a malformed
    /// password just yields an address with nothing stored under it.
    pub fn composite_of(key: &str, password: &str) -> String {
        format!("{}#{}", key, password)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.key, self.password)
    }
}
