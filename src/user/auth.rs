//! Password hashing and session tokens.

use anyhow::{bail, Result};
use rand::Rng;
use rand_distr::Alphanumeric;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

pub const AUTH_TOKEN_LENGTH: usize = 64;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct AuthTokenValue(pub String);

impl AuthTokenValue {
    pub fn generate() -> AuthTokenValue {
        let rng = rand::rng();
        let random_string: String = rng
            .sample_iter(&Alphanumeric)
            .take(AUTH_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        AuthTokenValue(random_string)
    }
}

/// A persisted session token.
#[derive(Clone, Debug)]
pub struct AuthToken {
    pub account_id: usize,
    pub created: SystemTime,
    pub last_used: Option<SystemTime>,
    pub value: AuthTokenValue,
}

impl AuthToken {
    pub fn new(account_id: usize) -> AuthToken {
        AuthToken {
            account_id,
            created: SystemTime::now(),
            last_used: None,
            value: AuthTokenValue::generate(),
        }
    }

    pub fn last_activity(&self) -> SystemTime {
        self.last_used.unwrap_or(self.created).max(self.created)
    }

    /// True when the token has not been used for longer than `max_idle`.
    pub fn is_idle(&self, max_idle: Duration, now: SystemTime) -> bool {
        match now.duration_since(self.last_activity()) {
            Ok(idle) => idle > max_idle,
            Err(_) => false,
        }
    }
}

mod musica_argon2 {
    use anyhow::{anyhow, Result};
    use argon2::{
        password_hash::{
            rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        },
        Argon2,
    };

    #[cfg(not(feature = "test-fast-hasher"))]
    fn argon2() -> Result<Argon2<'static>> {
        Ok(Argon2::default())
    }

    // Minimum cost parameters, only for test builds.
    #[cfg(feature = "test-fast-hasher")]
    fn argon2() -> Result<Argon2<'static>> {
        use argon2::{Algorithm, Params, Version};
        let params = Params::new(8, 1, 1, None).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    pub fn generate_b64_salt() -> String {
        SaltString::generate(&mut OsRng).to_string()
    }

    pub fn hash<T: AsRef<str>>(plain: &[u8], b64_salt: T) -> Result<String> {
        let salt = SaltString::from_b64(b64_salt.as_ref()).map_err(|err| anyhow!("{}", err))?;
        let hash_string = argon2()?
            .hash_password(plain, &salt)
            .map_err(|err| anyhow!("{}", err))?
            .to_string();
        Ok(hash_string)
    }

    /// Cost parameters are read back from the PHC string.
    pub fn verify<T: AsRef<str>>(plain_pw: &[u8], target_hash: T) -> Result<bool> {
        let password_hash =
            PasswordHash::new(target_hash.as_ref()).map_err(|err| anyhow!("{}", err))?;
        Ok(Argon2::default()
            .verify_password(plain_pw, &password_hash)
            .is_ok())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialsHasher {
    Argon2,
}

impl FromStr for CredentialsHasher {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2" => Ok(CredentialsHasher::Argon2),
            _ => bail!("Unknown hasher {}", s),
        }
    }
}

impl fmt::Display for CredentialsHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialsHasher::Argon2 => write!(f, "argon2"),
        }
    }
}

impl CredentialsHasher {
    pub fn generate_b64_salt(&self) -> String {
        match self {
            CredentialsHasher::Argon2 => musica_argon2::generate_b64_salt(),
        }
    }

    pub fn hash<T: AsRef<str>>(&self, plain: &[u8], b64_salt: T) -> Result<String> {
        match self {
            CredentialsHasher::Argon2 => musica_argon2::hash(plain, b64_salt),
        }
    }

    pub fn verify<T: AsRef<str>>(&self, plain_pw: &str, target_hash: T) -> Result<bool> {
        match self {
            CredentialsHasher::Argon2 => musica_argon2::verify(plain_pw.as_bytes(), target_hash),
        }
    }
}

/// A salted password hash, never the plaintext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashedPassword {
    pub salt: String,
    pub hash: String,
    pub hasher: CredentialsHasher,
}

impl HashedPassword {
    pub fn new(plain: &str) -> Result<HashedPassword> {
        let hasher = CredentialsHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(plain.as_bytes(), &salt)?;
        Ok(HashedPassword { salt, hash, hasher })
    }

    pub fn verify(&self, plain: &str) -> Result<bool> {
        self.hasher.verify(plain, &self.hash)
    }
}

#[derive(Clone, Debug)]
pub struct PasswordCredentials {
    pub account_id: usize,
    pub password: HashedPassword,
    pub created: SystemTime,
    pub last_tried: Option<SystemTime>,
    pub last_used: Option<SystemTime>,
}
