use std::fmt::{Debug, Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::HeaderName;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};

use crate::handler::{
    default_missing_signature_handler, default_verify_failed_handler, text_response,
    RejectionHandler,
};
use crate::secret::Secret;
use crate::verify::Validator;

/// Why a request didn't reach the protected handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The body couldn't be read to the end.
    BodyRead,
    /// The signature header was absent or empty.
    MissingSignature,
    /// The signature header didn't match the body.
    VerificationFailed,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::BodyRead => write!(f, "body_read"),
            Rejection::MissingSignature => write!(f, "missing_signature"),
            Rejection::VerificationFailed => write!(f, "verification_failed"),
        }
    }
}

/// Everything about a gate besides the protected handler and the secret.
///
/// [`GateOptions::default`] matches GitHub's SHA-1 signatures
/// (`X-Hub-Signature`, `sha1=`), [`GateOptions::sha256`] the SHA-256 ones
/// (`X-Hub-Signature-256`, `sha256=`). Both rejection handlers answer with a
/// `403` and a fixed message. Header and validator are independent of each
/// other, nothing stops a custom header from carrying a SHA-256 signature.
#[derive(Clone)]
pub struct GateOptions {
    /// Header the claimed signature is read from.
    pub header: HeaderName,
    /// Digest the signature is computed with.
    pub validator: Validator,
    /// Called when `header` is absent or empty.
    pub on_missing_signature: RejectionHandler,
    /// Called when the signature in `header` doesn't match the body.
    pub on_verification_failed: RejectionHandler,
}

impl GateOptions {
    /// Defaults for `validator`, with the header GitHub uses for it.
    pub fn for_validator(validator: Validator) -> Self {
        GateOptions {
            header: default_header_name(validator),
            validator,
            on_missing_signature: Arc::new(default_missing_signature_handler),
            on_verification_failed: Arc::new(default_verify_failed_handler),
        }
    }

    pub fn sha256() -> Self {
        Self::for_validator(Validator::Sha256)
    }

    pub fn with_header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    /// Swaps the validator, the header stays as it is.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_missing_signature_handler(mut self, handler: RejectionHandler) -> Self {
        self.on_missing_signature = handler;
        self
    }

    pub fn with_verify_failed_handler(mut self, handler: RejectionHandler) -> Self {
        self.on_verification_failed = handler;
        self
    }
}

impl Default for GateOptions {
    fn default() -> Self {
        Self::for_validator(Validator::Sha1)
    }
}

impl Debug for GateOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateOptions")
            .field("header", &self.header)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

fn default_header_name(validator: Validator) -> HeaderName {
    match validator {
        Validator::Sha1 => HeaderName::from_static("x-hub-signature"),
        Validator::Sha256 => HeaderName::from_static("x-hub-signature-256"),
    }
}

/// HMAC signature checking in front of another [`Service`].
///
/// Every request body is read into memory and signed with the secret. Only
/// if the signature matches the one in the configured header the request is
/// passed on, with its body replaced by the buffered bytes.
///
/// see: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries
pub struct HmacGate<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    downstream: S,
    secret: Secret,
    options: GateOptions,
}

impl<S> HmacGate<S> {
    pub fn new(downstream: S, secret: impl Into<Secret>, options: GateOptions) -> Self {
        HmacGate {
            inner: Arc::new(Inner {
                downstream,
                secret: secret.into(),
                options,
            }),
        }
    }

    /// Gate with the SHA-1 defaults.
    pub fn sha1(downstream: S, secret: impl Into<Secret>) -> Self {
        Self::new(downstream, secret, GateOptions::default())
    }

    /// Gate with the SHA-256 defaults.
    pub fn sha256(downstream: S, secret: impl Into<Secret>) -> Self {
        Self::new(downstream, secret, GateOptions::sha256())
    }

    pub fn options(&self) -> &GateOptions {
        &self.inner.options
    }
}

impl<S> Clone for HmacGate<S> {
    fn clone(&self) -> Self {
        HmacGate {
            inner: self.inner.clone(),
        }
    }
}

impl<S> Debug for HmacGate<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacGate")
            .field("secret", &self.inner.secret)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl<S> Inner<S> {
    async fn authenticate<B>(&self, request: Request<B>) -> Result<Response<Full<Bytes>>, S::Error>
    where
        B: Body,
        B::Error: Display,
        S: Service<Request<Full<Bytes>>, Response = Response<Full<Bytes>>>,
    {
        let (parts, body) = request.into_parts();

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                tracing::error!(
                    rejection = %Rejection::BodyRead,
                    method = %parts.method,
                    uri = %parts.uri,
                    "Could not read the request body: {}",
                    err
                );

                return Ok(text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                ));
            }
        };

        let request = Request::from_parts(parts, Full::new(body.clone()));

        let claimed = request
            .headers()
            .get(&self.options.header)
            .filter(|value| !value.is_empty());

        let Some(claimed) = claimed else {
            tracing::warn!(
                rejection = %Rejection::MissingSignature,
                header = %self.options.header,
                method = %request.method(),
                uri = %request.uri(),
                "Rejected request"
            );

            return Ok((self.options.on_missing_signature)(request));
        };

        let verified = self.options.validator.verify(
            &body,
            claimed.as_bytes(),
            self.secret.expose_secret(),
        );

        if !verified {
            tracing::warn!(
                rejection = %Rejection::VerificationFailed,
                header = %self.options.header,
                validator = %self.options.validator,
                body_len = body.len(),
                method = %request.method(),
                uri = %request.uri(),
                "Rejected request"
            );

            return Ok((self.options.on_verification_failed)(request));
        }

        tracing::debug!(
            validator = %self.options.validator,
            body_len = body.len(),
            "Signature verified"
        );

        self.downstream.call(request).await
    }
}

impl<S, B> Service<Request<B>> for HmacGate<S>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display,
    S: Service<Request<Full<Bytes>>, Response = Response<Full<Bytes>>> + Send + Sync + 'static,
    S::Future: Send,
{
    type Response = Response<Full<Bytes>>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move { inner.authenticate(request).await })
    }
}
