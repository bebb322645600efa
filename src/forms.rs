//! Discovery of dashboard forms in a rendered page.

use crate::error::CmdError;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

/// Name of the hidden input carrying the anti-forgery token.
pub const AUTHENTICITY_TOKEN: &str = "authenticity_token";

/// Name of the hidden input carrying the method override.
pub const METHOD_OVERRIDE: &str = "_method";

/// An HTML form found on the dashboard, reduced to what is needed to submit it.
///
/// A `Form` is only ever handed out fully populated; a form that is absent from the page is
/// reported as `None` by the lookups, and a form that lacks one of its hidden fields is reported
/// as an error.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Form {
    /// The `action` the form submits to.
    pub action: String,

    /// Value of the form's `authenticity_token` input.
    pub authenticity_token: String,

    /// Value of the form's `_method` input.
    ///
    /// Forms are always submitted with `POST`; this field tells the dashboard which verb the
    /// submission stands for (for example `put` for an update).
    pub method: String,
}

impl Form {
    /// URL-encode this form's hidden fields followed by the given `fields`.
    ///
    /// The result is suitable as the payload of
    /// [`Dashboard::submit_install_form`](crate::Dashboard::submit_install_form).
    ///
    /// ```
    /// # use opsman_forms::Form;
    /// let form = Form {
    ///     action: "/installation".to_string(),
    ///     authenticity_token: "s3cr3t=".to_string(),
    ///     method: "delete".to_string(),
    /// };
    /// assert_eq!(
    ///     form.encode_with([("commit", "Revert")]),
    ///     "_method=delete&authenticity_token=s3cr3t%3D&commit=Revert"
    /// );
    /// ```
    pub fn encode_with<I, K, V>(&self, fields: I) -> String
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut payload = url::form_urlencoded::Serializer::new(String::new());
        payload
            .append_pair(METHOD_OVERRIDE, &self.method)
            .append_pair(AUTHENTICITY_TOKEN, &self.authenticity_token)
            .extend_pairs(fields);
        payload.finish()
    }
}

/// Find the first form in `html` whose `action` is exactly `action`.
///
/// Returns `Ok(None)` if no form matches. If a form matches but is missing its `_method` input,
/// [`CmdError::MissingMethod`] is returned; this takes precedence over a missing
/// `authenticity_token` ([`CmdError::MissingAuthenticityToken`]).
pub fn find_by_action(html: &str, action: &str) -> Result<Option<Form>, CmdError> {
    let document = Html::parse_document(html);

    let form = match elements(document.root_element())
        .filter(|e| e.value().name() == "form")
        .find(|e| e.value().attr("action") == Some(action))
    {
        Some(form) => form,
        None => return Ok(None),
    };

    let token = input_value(form, AUTHENTICITY_TOKEN);
    let method = input_value(form, METHOD_OVERRIDE);

    let method = method.ok_or(CmdError::MissingMethod)?;
    let token = token.ok_or(CmdError::MissingAuthenticityToken)?;

    Ok(Some(Form {
        action: action.to_string(),
        authenticity_token: token.to_string(),
        method: method.to_string(),
    }))
}

/// All elements below (and including) `root`, in document order.
fn elements(root: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    root.descendants().filter_map(ElementRef::wrap)
}

/// The `value` of the first `<input name=...>` inside `form`.
///
/// An input that is present but has no `value` attribute counts as missing.
fn input_value<'a>(form: ElementRef<'a>, name: &str) -> Option<&'a str> {
    elements(form)
        .find(|e| e.value().name() == "input" && e.value().attr("name") == Some(name))?
        .value()
        .attr("value")
}
