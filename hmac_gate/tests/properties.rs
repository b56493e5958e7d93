//! Property tests for signing, verification and the body hand-over.

use std::convert::Infallible;

use hmac_gate::constants::MSG_MISSING_SIGNATURE;
use hmac_gate::{HmacGate, Validator};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::{service_fn, Service};
use hyper::{Request, Response, StatusCode};
use proptest::prelude::*;

fn arb_validator() -> impl Strategy<Value = Validator> {
    prop_oneof![Just(Validator::Sha1), Just(Validator::Sha256)]
}

fn flip_bit(bytes: &mut [u8], bit: usize) {
    let bit = bit % (bytes.len() * 8);
    bytes[bit / 8] ^= 1 << (bit % 8);
}

/// Sends `body` through a gate whose handler echoes the body it received.
fn echo_through_gate(
    validator: Validator,
    secret: &[u8],
    body: Vec<u8>,
    signature: Option<String>,
) -> (StatusCode, Bytes) {
    let echo = service_fn(|request: Request<Full<Bytes>>| async move {
        let body = request.into_body().collect().await?.to_bytes();

        Ok::<_, Infallible>(Response::new(Full::new(body)))
    });
    let gate = HmacGate::new(
        echo,
        secret.to_vec(),
        hmac_gate::GateOptions::for_validator(validator),
    );

    let mut builder = Request::builder().method("POST");
    if let Some(signature) = signature {
        builder = builder.header(validator.default_header(), signature);
    }
    let request = builder.body(Full::new(Bytes::from(body))).unwrap();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    runtime.block_on(async {
        let response = gate.call(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status, body)
    })
}

proptest! {
    #[test]
    fn signature_of_body_verifies(
        validator in arb_validator(),
        body in prop::collection::vec(any::<u8>(), 0..512),
        secret in prop::collection::vec(any::<u8>(), 0..96),
    ) {
        let signature = validator.sign(&body, &secret).unwrap();

        let prefix = format!("{}=", validator.prefix());

        prop_assert!(signature.starts_with(&prefix));
        prop_assert!(validator.verify(&body, signature.as_bytes(), &secret));
    }

    #[test]
    fn flipped_body_bit_fails(
        validator in arb_validator(),
        body in prop::collection::vec(any::<u8>(), 1..512),
        secret in prop::collection::vec(any::<u8>(), 0..96),
        bit in any::<usize>(),
    ) {
        let signature = validator.sign(&body, &secret).unwrap();

        let mut tampered = body.clone();
        flip_bit(&mut tampered, bit);

        prop_assert!(!validator.verify(&tampered, signature.as_bytes(), &secret));
    }

    #[test]
    fn flipped_digest_bit_fails(
        validator in arb_validator(),
        body in prop::collection::vec(any::<u8>(), 0..512),
        secret in prop::collection::vec(any::<u8>(), 0..96),
        bit in any::<usize>(),
    ) {
        let signature = validator.sign(&body, &secret).unwrap();
        let (prefix, digest) = signature.split_once('=').unwrap();

        let mut digest = hex::decode(digest).unwrap();
        flip_bit(&mut digest, bit);
        let tampered = format!("{}={}", prefix, hex::encode(digest));

        prop_assert!(!validator.verify(&body, tampered.as_bytes(), &secret));
    }

    #[test]
    fn other_validators_signature_fails(
        body in prop::collection::vec(any::<u8>(), 0..512),
        secret in prop::collection::vec(any::<u8>(), 0..96),
    ) {
        let sha1 = Validator::Sha1.sign(&body, &secret).unwrap();
        let sha256 = Validator::Sha256.sign(&body, &secret).unwrap();

        prop_assert!(!Validator::Sha256.verify(&body, sha1.as_bytes(), &secret));
        prop_assert!(!Validator::Sha1.verify(&body, sha256.as_bytes(), &secret));
    }

    #[test]
    fn forwarded_body_is_byte_identical(
        validator in arb_validator(),
        body in prop::collection::vec(any::<u8>(), 0..4096),
        secret in prop::collection::vec(any::<u8>(), 0..96),
    ) {
        let signature = validator.sign(&body, &secret).unwrap();

        let (status, echoed) = echo_through_gate(validator, &secret, body.clone(), Some(signature));

        prop_assert_eq!(status, StatusCode::OK);
        prop_assert_eq!(echoed.as_ref(), body.as_slice());
    }

    #[test]
    fn missing_header_never_forwards(
        validator in arb_validator(),
        body in prop::collection::vec(any::<u8>(), 0..512),
        secret in prop::collection::vec(any::<u8>(), 0..96),
    ) {
        let (status, response) = echo_through_gate(validator, &secret, body, None);

        prop_assert_eq!(status, StatusCode::FORBIDDEN);
        prop_assert_eq!(response.as_ref(), MSG_MISSING_SIGNATURE.as_bytes());
    }
}
