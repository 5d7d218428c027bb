use std::fmt;

use crate::cookie::CookieMutation;

/// Terminal output of the access filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Hand the request to the downstream handler
    Continue,
    /// Short-circuit with a redirect
    RedirectTo {
        /// Redirect path
        target: String,
        /// Query parameters appended to `target`, in order
        query: Vec<(String, String)>,
    },
    /// Short-circuit with a structured 401
    RejectUnauthorized,
}

impl Decision {
    /// Redirect without query parameters.
    pub fn redirect(target: impl Into<String>) -> Self {
        Decision::RedirectTo {
            target: target.into(),
            query: Vec::new(),
        }
    }

    /// Redirect carrying a single query parameter.
    pub fn redirect_with(
        target: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Decision::RedirectTo {
            target: target.into(),
            query: vec![(key.into(), value.into())],
        }
    }

    /// Returns true for [`Decision::Continue`].
    pub fn is_continue(&self) -> bool {
        matches!(self, Decision::Continue)
    }

    /// Builds the `Location` value for a redirect, percent-encoding the query.
    ///
    /// Returns `None` for non-redirect decisions.
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_gate::Decision;
    ///
    /// let d = Decision::redirect_with("/login", "next", "/admin/products");
    /// assert_eq!(d.location().as_deref(), Some("/login?next=%2Fadmin%2Fproducts"));
    /// ```
    pub fn location(&self) -> Option<String> {
        let Decision::RedirectTo { target, query } = self else {
            return None;
        };

        if query.is_empty() {
            return Some(target.clone());
        }

        let encoded = query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        Some(format!("{}?{}", target, encoded))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Continue => write!(f, "continue"),
            Decision::RedirectTo { target, .. } => write!(f, "redirect({})", target),
            Decision::RejectUnauthorized => write!(f, "reject_unauthorized"),
        }
    }
}

/// The policy result for one request: the decision plus every cookie write
/// the session resolver asked for.
///
/// Response construction is a separate step; see
/// [`web::short_circuit`](crate::web::short_circuit) and
/// [`web::append_set_cookies`](crate::web::append_set_cookies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// What to do with the request
    pub decision: Decision,
    /// Cookie writes to attach to the final response, whatever it is
    pub mutations: Vec<CookieMutation>,
}

impl Evaluation {
    /// Evaluation with no cookie writes.
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            mutations: Vec::new(),
        }
    }

    /// Evaluation carrying cookie writes.
    pub fn with_mutations(decision: Decision, mutations: Vec<CookieMutation>) -> Self {
        Self {
            decision,
            mutations,
        }
    }
}
