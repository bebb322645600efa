//! HTTP transport used to talk to the dashboard.

use crate::error::{self, BoxError};
use base64::Engine as _;
use futures_util::future::BoxFuture;
use http::header::{HeaderValue, AUTHORIZATION, COOKIE, USER_AGENT};
use http::{Request, Response, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_util::client::legacy::{self, connect::Connect};
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::Duration;

/// The body of a response handed back by an [`HttpClient`].
pub type Body = UnsyncBoxBody<Bytes, BoxError>;

/// Something that can carry a single HTTP exchange with the dashboard.
///
/// Requests are handed over with a path-only target (such as `/installation`); it is up to the
/// implementation to resolve that against wherever the dashboard lives, and to attach whatever
/// session state (cookies, authorization, TLS settings) it needs. [`Client`] is the
/// implementation used in production, but anything that can answer a request will do.
pub trait HttpClient: Send + Sync {
    /// Issue `req` and resolve to the response head and a streaming body.
    fn request(&self, req: Request<String>) -> BoxFuture<'_, Result<Response<Body>, BoxError>>;
}

impl<T> HttpClient for Arc<T>
where
    T: HttpClient + ?Sized,
{
    fn request(&self, req: Request<String>) -> BoxFuture<'_, Result<Response<Body>, BoxError>> {
        (**self).request(req)
    }
}

impl<'a, T> HttpClient for &'a T
where
    T: HttpClient + ?Sized,
{
    fn request(&self, req: Request<String>) -> BoxFuture<'_, Result<Response<Body>, BoxError>> {
        (**self).request(req)
    }
}

/// A [`hyper`]-backed [`HttpClient`] bound to a single dashboard.
///
/// Use [`ClientBuilder`] to create one. Cloning a `Client` is cheap, and all clones share the
/// same connection pool.
#[derive(Clone, Debug)]
pub struct Client<C> {
    http: legacy::Client<C, String>,
    base: url::Url,
    ua: Option<HeaderValue>,
    cookies: Option<HeaderValue>,
    auth: Option<HeaderValue>,
    timeout: Option<Duration>,
}

impl<C> Client<C> {
    /// The dashboard URL that request paths are resolved against.
    pub fn base_url(&self) -> &url::Url {
        &self.base
    }

    /// Resolve `req`'s target below the base URL and fill in the default headers.
    ///
    /// Headers already present on `req` are left untouched.
    fn prepare(&self, mut req: Request<String>) -> Result<Request<String>, BoxError> {
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        // the base path always ends in `/`, so this keeps any prefix it has
        let url = self.base.join(target.trim_start_matches('/'))?;
        *req.uri_mut() = url.as_str().parse::<Uri>()?;

        let headers = req.headers_mut();
        for (name, value) in [
            (USER_AGENT, &self.ua),
            (COOKIE, &self.cookies),
            (AUTHORIZATION, &self.auth),
        ] {
            if let Some(value) = value {
                if !headers.contains_key(&name) {
                    headers.insert(name, value.clone());
                }
            }
        }

        Ok(req)
    }
}

impl<C> Client<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    async fn send(&self, req: Request<String>) -> Result<Response<Body>, BoxError> {
        let req = self.prepare(req)?;
        tracing::debug!(method = %req.method(), uri = %req.uri(), "issuing request");

        let exchange = self.exchange(req);
        let rsp = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, exchange).await {
                Ok(rsp) => rsp?,
                Err(_) => {
                    tracing::debug!(?timeout, "request timed out");
                    return Err(error::TimedOut.into());
                }
            },
            None => exchange.await?,
        };

        tracing::trace!(status = %rsp.status(), "received response");
        Ok(rsp.map(|body| {
            Full::new(body)
                .map_err(|never| -> BoxError { match never {} })
                .boxed_unsync()
        }))
    }

    /// Issue `req` and read the whole response, so that a timeout also covers a stalled body.
    async fn exchange(&self, req: Request<String>) -> Result<Response<Bytes>, BoxError> {
        let (parts, body) = self.http.request(req).await?.into_parts();
        let body = body.collect().await?.to_bytes();
        Ok(Response::from_parts(parts, body))
    }
}

impl<C> HttpClient for Client<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    fn request(&self, req: Request<String>) -> BoxFuture<'_, Result<Response<Body>, BoxError>> {
        Box::pin(self.send(req))
    }
}

/// A builder for dashboard [`Client`]s.
///
/// ```no_run
/// # #[cfg(feature = "native-tls")]
/// # fn main() -> Result<(), opsman_forms::error::NewClientError> {
/// use std::time::Duration;
/// use opsman_forms::ClientBuilder;
///
/// let client = ClientBuilder::native()
///     .user_agent("opsman-forms")
///     .cookie("_session_id", "0123abcd")
///     .timeout(Duration::from_secs(30))
///     .build("https://opsman.example.com")?;
/// # let _ = client;
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "native-tls"))]
/// # fn main() {}
/// ```
#[derive(Clone, Debug)]
pub struct ClientBuilder<C> {
    connector: C,
    ua: Option<String>,
    cookies: Vec<String>,
    bearer: Option<String>,
    timeout: Option<Duration>,
}

#[cfg(feature = "native-tls")]
#[cfg_attr(docsrs, doc(cfg(feature = "native-tls")))]
impl ClientBuilder<hyper_tls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>> {
    /// Build a client that uses a platform-native TLS library.
    pub fn native() -> Self {
        Self::new(hyper_tls::HttpsConnector::new())
    }
}

#[cfg(feature = "rustls-tls")]
#[cfg_attr(docsrs, doc(cfg(feature = "rustls-tls")))]
impl ClientBuilder<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>> {
    /// Build a client that uses `rustls` with the platform's root certificates.
    pub fn rustls() -> Result<Self, std::io::Error> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .build();
        Ok(Self::new(connector))
    }
}

impl<C> ClientBuilder<C>
where
    C: Connect + Clone + Send + Sync + 'static,
{
    /// Build a client that establishes connections through `connector`.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            ua: None,
            cookies: Vec::new(),
            bearer: None,
            timeout: None,
        }
    }

    /// Send the given `User-Agent` with every request.
    pub fn user_agent<S: Into<String>>(&mut self, ua: S) -> &mut Self {
        self.ua = Some(ua.into());
        self
    }

    /// Send the cookie `name=value` with every request.
    ///
    /// This is how an already established dashboard session is carried over.
    pub fn cookie<N, V>(&mut self, name: N, value: V) -> &mut Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.cookies.push(
            cookie::Cookie::new(name.into(), value.into())
                .encoded()
                .to_string(),
        );
        self
    }

    /// Authorize every request with the given bearer token.
    ///
    /// This takes precedence over credentials embedded in the base URL.
    pub fn bearer_token<S: Into<String>>(&mut self, token: S) -> &mut Self {
        self.bearer = Some(token.into());
        self
    }

    /// Give up on a request if the complete response (head and body) has not arrived within
    /// `timeout`.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build a client for the dashboard at `base`.
    ///
    /// Request paths are resolved below the path of `base`, so a dashboard served under
    /// `https://host/opsman` receives its lookups at `https://host/opsman/`. Any username and
    /// password in `base` are stripped from it and sent as basic credentials instead.
    ///
    /// Fails with [`NewClientError::InvalidHeader`](error::NewClientError::InvalidHeader) if the
    /// user agent, a cookie or the credentials cannot be sent as an HTTP header.
    pub fn build(&self, base: &str) -> Result<Client<C>, error::NewClientError> {
        let mut base = base.parse::<url::Url>()?;
        if base.cannot_be_a_base() {
            return Err(error::NewClientError::CannotBeABase(base.into()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut auth = None;
        if !base.username().is_empty() || base.password().is_some() {
            let credentials = format!("{}:{}", base.username(), base.password().unwrap_or(""));
            auth = Some(format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD.encode(credentials)
            ));
            // neither can fail on a base url
            let _ = base.set_username("");
            let _ = base.set_password(None);
        }
        if let Some(ref token) = self.bearer {
            auth = Some(format!("Bearer {}", token));
        }

        let cookies = if self.cookies.is_empty() {
            None
        } else {
            Some(self.cookies.join("; "))
        };

        let ua = self.ua.as_deref().map(HeaderValue::from_str).transpose()?;
        let cookies = cookies.as_deref().map(HeaderValue::from_str).transpose()?;
        let auth = auth.as_deref().map(HeaderValue::from_str).transpose()?;

        let http = legacy::Client::builder(TokioExecutor::new()).build(self.connector.clone());
        Ok(Client {
            http,
            base,
            ua,
            cookies,
            auth,
            timeout: self.timeout,
        })
    }
}
