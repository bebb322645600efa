use http::header::InvalidHeaderValue;
use http::{Method, StatusCode};
use std::error::Error;
use std::fmt;
use url::ParseError;

/// A type-erased error produced by an [`HttpClient`](crate::HttpClient) implementation.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// An error occurred while configuring a new [`Client`](crate::Client).
#[derive(Debug)]
pub enum NewClientError {
    /// The given dashboard base URL is invalid.
    BadUrl(ParseError),
    /// The given base URL cannot be used as a base for relative request paths.
    CannotBeABase(String),
    /// A configured user agent, cookie or credential cannot be sent as an HTTP header.
    InvalidHeader(InvalidHeaderValue),
}

impl Error for NewClientError {
    fn description(&self) -> &str {
        match *self {
            NewClientError::BadUrl(..) => "dashboard url is invalid",
            NewClientError::CannotBeABase(..) => "dashboard url cannot be a base",
            NewClientError::InvalidHeader(..) => "header value cannot be sent",
        }
    }

    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            NewClientError::BadUrl(ref e) => Some(e),
            NewClientError::CannotBeABase(..) => None,
            NewClientError::InvalidHeader(ref e) => Some(e),
        }
    }
}

impl fmt::Display for NewClientError {
    #[allow(deprecated)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.description())?;
        match *self {
            NewClientError::BadUrl(ref e) => write!(f, "{}", e),
            NewClientError::CannotBeABase(ref url) => write!(f, "{}", url),
            NewClientError::InvalidHeader(ref e) => write!(f, "{}", e),
        }
    }
}

impl From<ParseError> for NewClientError {
    fn from(e: ParseError) -> Self {
        NewClientError::BadUrl(e)
    }
}

impl From<InvalidHeaderValue> for NewClientError {
    fn from(e: InvalidHeaderValue) -> Self {
        NewClientError::InvalidHeader(e)
    }
}

/// An error occurred while looking up or submitting a dashboard form.
#[derive(Debug)]
pub enum CmdError {
    /// The outgoing request could not be constructed.
    InvalidRequest(http::Error),

    /// The request for the dashboard page could not be completed.
    ///
    /// This covers connection, DNS, TLS and timeout failures of the underlying transport.
    Request(BoxError),

    /// The form submission could not be delivered.
    Submit(BoxError),

    /// The connection was lost while the response body was being read.
    Lost(BoxError),

    /// The dashboard answered with a non-success status code.
    Status(StatusError),

    /// A matching form was found, but it has no `_method` input.
    MissingMethod,

    /// A matching form was found, but it has no `authenticity_token` input.
    MissingAuthenticityToken,

    /// The dashboard page does not carry the install form.
    NoInstallForm,
}

impl CmdError {
    /// Returns true if this error indicates that a required form is absent from the page.
    ///
    /// Equivalent to
    /// ```no_run
    /// # use opsman_forms::error::CmdError;
    /// # let e = CmdError::MissingMethod;
    /// let is_missing = matches!(e, CmdError::NoInstallForm);
    /// ```
    pub fn is_missing_form(&self) -> bool {
        matches!(self, CmdError::NoInstallForm)
    }

    /// Returns true if a form was found but lacks one of its hidden fields.
    pub fn is_malformed_form(&self) -> bool {
        matches!(
            self,
            CmdError::MissingMethod | CmdError::MissingAuthenticityToken
        )
    }

    /// The status code the dashboard answered with, if this is a status error.
    pub fn status(&self) -> Option<StatusCode> {
        match *self {
            CmdError::Status(ref e) => Some(e.status),
            _ => None,
        }
    }
}

impl Error for CmdError {
    fn description(&self) -> &str {
        match *self {
            CmdError::InvalidRequest(..) => "could not build request",
            CmdError::Request(..) => "failed during request",
            CmdError::Submit(..) => "failed to POST form",
            CmdError::Lost(..) => "connection lost while reading response",
            CmdError::Status(..) => "request failed",
            CmdError::MissingMethod => "could not find the form method",
            CmdError::MissingAuthenticityToken => "could not find the form authenticity token",
            CmdError::NoInstallForm => "could not find the install form",
        }
    }

    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            CmdError::InvalidRequest(ref e) => Some(e),
            CmdError::Request(ref e) | CmdError::Submit(ref e) | CmdError::Lost(ref e) => {
                Some(&**e)
            }
            CmdError::Status(ref e) => Some(e),
            CmdError::MissingMethod
            | CmdError::MissingAuthenticityToken
            | CmdError::NoInstallForm => None,
        }
    }
}

impl fmt::Display for CmdError {
    #[allow(deprecated)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CmdError::InvalidRequest(ref e) => write!(f, "{}: {}", self.description(), e),
            CmdError::Request(ref e) | CmdError::Submit(ref e) | CmdError::Lost(ref e) => {
                write!(f, "{}: {}", self.description(), e)
            }
            // already prefixed
            CmdError::Status(ref e) => write!(f, "{}", e),
            CmdError::MissingMethod
            | CmdError::MissingAuthenticityToken
            | CmdError::NoInstallForm => write!(f, "{}", self.description()),
        }
    }
}

impl From<http::Error> for CmdError {
    fn from(e: http::Error) -> Self {
        CmdError::InvalidRequest(e)
    }
}

impl From<StatusError> for CmdError {
    fn from(e: StatusError) -> Self {
        CmdError::Status(e)
    }
}

/// The dashboard answered a request with a status outside of the `2xx` range.
#[derive(Debug, Clone)]
pub struct StatusError {
    /// Method of the failed request.
    pub method: Method,
    /// Path the failed request was issued against.
    pub path: String,
    /// Status code of the response.
    pub status: StatusCode,
    /// Response body, decoded lossily.
    pub body: String,
}

impl StatusError {
    /// Returns `Ok` if `status` is a success, and the matching `StatusError` otherwise.
    pub fn check(method: &Method, path: &str, status: StatusCode, body: &[u8]) -> Result<(), Self> {
        if status.is_success() {
            return Ok(());
        }

        Err(StatusError {
            method: method.clone(),
            path: path.to_string(),
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request failed: unexpected response from {} {}: {}",
            self.method, self.path, self.status
        )?;
        let body = self.body.trim();
        if !body.is_empty() {
            write!(f, "\n{}", body)?;
        }
        Ok(())
    }
}

impl Error for StatusError {}

/// The transport gave up waiting for a response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimedOut;

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request timed out")
    }
}

impl Error for TimedOut {}
