/// Header GitHub uses for its SHA-1 webhook signatures.
pub const GITHUB_SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// Header GitHub uses for its SHA-256 webhook signatures.
pub const GITHUB_SIGNATURE_HEADER_256: &str = "X-Hub-Signature-256";

/// Body of the default response when the signature header is missing or empty.
pub const MSG_MISSING_SIGNATURE: &str = "Missing required header for HMAC verification";

/// Body of the default response when the signature doesn't match the body.
pub const MSG_FAILED_HMAC: &str = "HMAC verification failed";
