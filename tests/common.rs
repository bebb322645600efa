#![allow(dead_code)]

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioIo;
use opsman_forms::{Client, ClientBuilder};
use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const ASSETS_DIR: &str = "tests/test_html";

/// A request as the fake dashboard saw it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub cookie: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

struct State {
    page: Bytes,
    page_status: StatusCode,
    submit_status: StatusCode,
    seen: Mutex<Vec<Recorded>>,
}

/// A local stand-in for the dashboard.
///
/// `GET /` serves one of the pages under `tests/test_html`, and `POST /installation` accepts
/// anything. Every request is recorded.
pub struct FakeDashboard {
    addr: SocketAddr,
    state: Arc<State>,
}

impl FakeDashboard {
    /// Serve `page` with `200 OK` and accept submissions with `200 OK`.
    pub async fn serving(page: &str) -> Self {
        Self::start(page, StatusCode::OK, StatusCode::OK).await
    }

    /// Configures and starts the server.
    pub async fn start(page: &str, page_status: StatusCode, submit_status: StatusCode) -> Self {
        let page = std::fs::read(PathBuf::from(ASSETS_DIR).join(page))
            .expect("test page should exist");
        let state = Arc::new(State {
            page: Bytes::from(page),
            page_status,
            submit_status,
            seen: Mutex::new(Vec::new()),
        });

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("to be able to bind a local port");
        let addr = listener.local_addr().expect("to get the bound address");

        let s = state.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let s = s.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| handle(req, s.clone()));
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        FakeDashboard { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A plain-HTTP client pointed at this server.
    pub fn client(&self) -> Client<HttpConnector> {
        ClientBuilder::new(HttpConnector::new())
            .build(&self.url())
            .expect("local url is valid")
    }

    pub fn seen(&self) -> Vec<Recorded> {
        self.state.seen.lock().unwrap().clone()
    }
}

async fn handle(
    req: Request<Incoming>,
    state: Arc<State>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|b| b.to_bytes())
        .unwrap_or_default();

    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.seen.lock().unwrap().push(Recorded {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        content_type: header(CONTENT_TYPE),
        cookie: header(COOKIE),
        authorization: header(AUTHORIZATION),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let (status, body) = if parts.method == Method::GET && parts.uri.path() == "/" {
        (state.page_status, state.page.clone())
    } else if parts.method == Method::POST && parts.uri.path() == "/installation" {
        (state.submit_status, Bytes::from_static(b"{}"))
    } else {
        (StatusCode::NOT_FOUND, Bytes::from_static(b"not found"))
    };

    let mut rsp = Response::new(Full::new(body));
    *rsp.status_mut() = status;
    Ok(rsp)
}
