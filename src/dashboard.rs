//! The installation forms of the dashboard.

use crate::client::{Body, HttpClient};
use crate::error::{CmdError, StatusError};
use crate::forms::{self, Form};
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response};
use http_body_util::BodyExt;
use hyper::body::Bytes;

/// The page every form lookup scrapes.
const ROOT: &str = "/";

/// Where the revert form points, and where install submissions go.
const INSTALLATION: &str = "/installation";

/// Where the install form points.
const INSTALL: &str = "/install";

/// Locates and submits the installation forms of a dashboard.
///
/// Every operation performs exactly one HTTP exchange through the wrapped [`HttpClient`]. Nothing
/// is retried and nothing is cached; a `Dashboard` holds no state beyond its client, so it can
/// be shared freely if the client can.
///
/// ```no_run
/// # #[cfg(feature = "native-tls")]
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// use opsman_forms::{ClientBuilder, Dashboard};
///
/// let client = ClientBuilder::native()
///     .cookie("_session_id", "0123abcd")
///     .build("https://opsman.example.com")?;
/// let dashboard = Dashboard::new(client);
///
/// let form = dashboard.lookup_install_entry_form().await?;
/// dashboard
///     .submit_install_form(&form.encode_with([("ignore_warnings", "true")]))
///     .await?;
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "native-tls"))]
/// # fn main() {}
/// ```
#[derive(Clone, Debug)]
pub struct Dashboard<C> {
    client: C,
}

impl<C> Dashboard<C>
where
    C: HttpClient,
{
    /// Wrap a client that is already configured for the dashboard.
    pub fn new(client: C) -> Self {
        Dashboard { client }
    }

    /// Get back the client this `Dashboard` issues requests through.
    pub fn into_client(self) -> C {
        self.client
    }

    /// Look up the form that reverts pending changes to the installation.
    ///
    /// There is nothing to revert on a dashboard without pending changes, so a missing form is
    /// not an error: `Ok(None)` is returned instead.
    pub async fn lookup_installation_revert_form(&self) -> Result<Option<Form>, CmdError> {
        self.find_form_by_action(INSTALLATION).await
    }

    /// Look up the form that starts an installation.
    ///
    /// Unlike [`lookup_installation_revert_form`](Self::lookup_installation_revert_form), the
    /// install form must be present: its absence is reported as [`CmdError::NoInstallForm`].
    pub async fn lookup_install_entry_form(&self) -> Result<Form, CmdError> {
        self.find_form_by_action(INSTALL)
            .await?
            .ok_or(CmdError::NoInstallForm)
    }

    /// Submit an already URL-encoded `payload` to the installation endpoint.
    ///
    /// Success means the dashboard accepted the submission, not that the installation finished;
    /// that happens out of band.
    pub async fn submit_install_form(&self, payload: &str) -> Result<(), CmdError> {
        let req = Request::post(INSTALLATION)
            .header(CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
            .body(payload.to_string())?;

        let rsp = self.client.request(req).await.map_err(CmdError::Submit)?;
        read_success(&Method::POST, INSTALLATION, rsp).await?;
        Ok(())
    }

    /// Fetch the dashboard root and find the form that submits to `action`.
    ///
    /// Note that `action` is only matched against the forms on the root page; it is never
    /// fetched itself.
    async fn find_form_by_action(&self, action: &str) -> Result<Option<Form>, CmdError> {
        let req = Request::get(ROOT).body(String::new())?;

        let rsp = self.client.request(req).await.map_err(CmdError::Request)?;
        let body = read_success(&Method::GET, ROOT, rsp).await?;
        let html = String::from_utf8_lossy(&body);

        forms::find_by_action(&html, action)
    }
}

/// Read `rsp` to completion and check that it has a success status.
///
/// The body is drained before the status is looked at so that the connection is released on
/// every path; a non-success body ends up in the returned [`StatusError`].
async fn read_success(
    method: &Method,
    path: &str,
    rsp: Response<Body>,
) -> Result<Bytes, CmdError> {
    let (parts, body) = rsp.into_parts();
    let body = body.collect().await.map_err(CmdError::Lost)?.to_bytes();
    StatusError::check(method, path, parts.status, &body)?;
    Ok(body)
}
