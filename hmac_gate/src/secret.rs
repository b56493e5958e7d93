use std::fmt;

/// The shared signing secret of a gate.
///
/// `Debug` and `Display` always print `[REDACTED]`, the raw bytes are only
/// reachable through [`Secret::expose_secret`].
#[derive(Clone)]
pub struct Secret {
    inner: Box<[u8]>,
}

impl Secret {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Secret {
            inner: value.into().into_boxed_slice(),
        }
    }

    pub fn expose_secret(&self) -> &[u8] {
        &self.inner
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret::new(value)
    }
}

impl From<&[u8]> for Secret {
    fn from(value: &[u8]) -> Self {
        Secret::new(value)
    }
}

impl From<Vec<u8>> for Secret {
    fn from(value: Vec<u8>) -> Self {
        Secret::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Secret;

    #[test]
    fn never_prints_the_value() {
        let secret = Secret::from("supersecret");

        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert_eq!(secret.expose_secret(), b"supersecret");
    }
}
