//! Drive the installation forms of an operations-manager web dashboard.
//!
//! The dashboard guards its state-changing endpoints with HTML forms: every submission must echo
//! the form's anti-forgery `authenticity_token`, and a hidden `_method` field says which verb the
//! (always `POST`ed) submission stands for. This crate does the two halves of that dance:
//!
//!  - it fetches the dashboard's root page and finds the form that submits to a given path,
//!    returning its hidden fields as a [`Form`];
//!  - it submits a URL-encoded payload to the installation endpoint.
//!
//! The HTTP exchange itself is delegated to an [`HttpClient`], so the same [`Dashboard`] can run
//! against the real dashboard through [`Client`] or against anything else that answers requests.
//!
//! # Examples
//!
//! Reverting pending changes, if there are any:
//!
//! ```no_run
//! # #[cfg(feature = "native-tls")]
//! # #[tokio::main]
//! # async fn main() -> Result<(), opsman_forms::error::CmdError> {
//! use opsman_forms::{ClientBuilder, Dashboard};
//!
//! let client = ClientBuilder::native()
//!     .bearer_token("eyJhbGciOi...")
//!     .build("https://opsman.example.com")
//!     .expect("dashboard url is valid");
//! let dashboard = Dashboard::new(client);
//!
//! match dashboard.lookup_installation_revert_form().await? {
//!     Some(form) => {
//!         let no_fields: [(&str, &str); 0] = [];
//!         dashboard.submit_install_form(&form.encode_with(no_fields)).await?;
//!     }
//!     None => println!("nothing to revert"),
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "native-tls"))]
//! # fn main() {}
//! ```
#![deny(missing_docs)]
#![warn(missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Error types.
pub mod error;

pub mod client;
pub use crate::client::{Client, ClientBuilder, HttpClient};

mod dashboard;
pub use crate::dashboard::Dashboard;

pub mod forms;
pub use crate::forms::Form;

pub use http::Method;
