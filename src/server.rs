use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use config_parser::internal::ConfigFileInternal;
use hmac_gate::HmacGate;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::{service_fn, Service};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

/// The handler behind the gate, only reached by correctly signed requests.
#[derive(Debug, Clone, Copy)]
struct AcceptWebhook;

impl Service<Request<Full<Bytes>>> for AcceptWebhook {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: Request<Full<Bytes>>) -> Self::Future {
        Box::pin(accept_webhook(request))
    }
}

async fn accept_webhook(request: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let event = request
        .headers()
        .get("x-github-event")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let body = request.into_body().collect().await?.to_bytes();

    tracing::info!(event = %event, body_len = body.len(), "Accepted webhook");

    Ok(Response::new(Full::new(Bytes::from_static(b"success"))))
}

fn not_found(request: &Request<Incoming>) -> Result<Response<Full<Bytes>>> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Full::new(Bytes::from(format!(
            "Couldn't find handler for the route {:?} '{:?}'\n",
            request.method(),
            request.uri()
        ))))?)
}

async fn handle_request(
    config: Arc<ConfigFileInternal>,
    gate: HmacGate<AcceptWebhook>,
    request: Request<Incoming>,
) -> Result<Response<Full<Bytes>>> {
    if request.uri().path() == config.route.path {
        Ok(gate.call(request).await?)
    } else {
        not_found(&request)
    }
}

pub async fn start(config: Arc<ConfigFileInternal>) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.config.expose));

    let gate = HmacGate::new(
        AcceptWebhook,
        config.route.secret.clone(),
        config.route.options.clone(),
    );

    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        path = %config.route.path,
        header = %gate.options().header,
        validator = %gate.options().validator,
        "Listening for webhooks"
    );

    loop {
        let (stream, remote) = listener.accept().await?;

        tracing::debug!(remote = %remote, "Got a new connection");

        let io = TokioIo::new(stream);
        let config = config.clone();
        let gate = gate.clone();

        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(
                    io,
                    service_fn(|request| handle_request(config.clone(), gate.clone(), request)),
                )
                .await
            {
                tracing::error!("Error serving connection: {:?}", err);
            }
        });
    }
}
