use tracing::error;

/// Cost factor for new hashes. Verification accepts whatever cost the stored
/// hash was created with.
const BCRYPT_COST: u32 = 10;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let hash = bcrypt::hash(plain, BCRYPT_COST).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let ok = bcrypt::verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        let msg = err.to_string();
        assert!(!msg.is_empty());
    }

    #[test]
    fn hashes_carry_the_configured_cost() {
        let hash = hash_password("some-password").expect("hashing should succeed");
        // bcrypt hashes embed the cost as "$2b$10$..."
        assert!(hash.contains("$10$"), "unexpected hash format: {hash}");
    }
}
