use rand::Rng;

/// Generate an identifier of the form `{prefix}-{16 hex chars}`.
pub fn generate(prefix: &str) -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 8] = rng.random();
    format!("{prefix}-{}", hex::encode(bytes))
}
