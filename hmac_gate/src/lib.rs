//! HMAC signature validation in front of a hyper service, for the likes of
//! GitHub webhooks.
//!
//! ```no_run
//! use std::convert::Infallible;
//!
//! use hmac_gate::HmacGate;
//! use http_body_util::Full;
//! use hyper::body::Bytes;
//! use hyper::service::service_fn;
//! use hyper::{Request, Response};
//!
//! let handler = service_fn(|_request: Request<Full<Bytes>>| async {
//!     Ok::<_, Infallible>(Response::new(Full::new(Bytes::from("success"))))
//! });
//!
//! let gate = HmacGate::sha256(handler, "supersecret");
//! ```

pub mod constants;
pub mod gate;
pub mod handler;
pub mod secret;
pub mod verify;

pub use gate::{GateOptions, HmacGate, Rejection};
pub use handler::{rejection_handler, RejectionHandler};
pub use secret::Secret;
pub use verify::Validator;
