use rand::RngCore;
use sha2::Sha256;
use sqlx::FromRow;

/// Number of pbkdf2 rounds for password hashing
const PASSWORD_ROUNDS: u32 = 10_000;

/// hash_password derives a key from the password using
/// pbkdf2_hmac with sha256 and the hex encoded salt, and
/// returns the hexdigest of the 32 byte key.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PASSWORD_ROUNDS,
        &mut key,
    );
    hex::encode(key)
}

/// Create a new random salt, hex encoded.
pub fn generate_salt() -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    hex::encode(salt)
}

#[derive(Debug, Default, Clone, FromRow)]
pub struct User {
    /// Login name, usually a phone number
    pub id: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: i64,
}

impl User {
    /// Create a user with a freshly salted password hash.
    pub fn new(id: &str, password: &str, created_at: i64) -> Self {
        let salt = generate_salt();
        Self {
            id: id.to_string(),
            password_hash: hash_password(password, &salt),
            salt,
            created_at,
        }
    }

    pub fn check_password(&self, password: &str) -> bool {
        hash_password(password, &self.salt) == self.password_hash
    }
}

#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let a = hash_password("secret", "00ff");
        let b = hash_password("secret", "00ff");
        let c = hash_password("secret", "ff00");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_check_password() {
        let user = User::new("13800000000", "hunter2", 0);
        assert!(user.check_password("hunter2"));
        assert!(!user.check_password("hunter3"));
        assert_ne!(user.password_hash, "hunter2");
    }
}
