use std::fmt;

use cookie::Cookie;

use crate::cookie::CookieMutation;

/// Administrative role carried by a [`Principal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Regular store administrator
    Admin,
    /// Administrator allowed to manage other administrators
    SuperAdmin,
}

impl Role {
    /// Reads a role from provider metadata.
    ///
    /// Anything other than the two known role names, including a missing
    /// value, yields [`Role::Admin`].
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some("SUPER_ADMIN") => Role::SuperAdmin,
            _ => Role::Admin,
        }
    }

    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved identity of the requester for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Opaque identifier assigned by the identity provider
    pub id: String,
    /// Email address
    pub email: String,
    /// Administrative role
    pub role: Role,
}

/// Incoming cookies, kept in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one or more `Cookie` header values (`a=1; b=2`).
    ///
    /// Names and values are percent-decoded and surrounding double quotes
    /// are trimmed from values. Unparseable fragments are skipped.
    pub fn parse<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let pairs = headers
            .into_iter()
            .flat_map(|header| Cookie::split_parse_encoded(header))
            .filter_map(Result::ok)
            .map(|c| (c.name().to_string(), c.value_trimmed().to_string()))
            .collect();

        Self { pairs }
    }

    /// Adds a cookie to the jar.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Returns the first value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over all name/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of cookies in the jar.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if the jar holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Applies outgoing cookie writes to this jar, so downstream code sees
    /// the same session the client will hold after the response.
    pub fn apply(&mut self, mutations: &[CookieMutation]) {
        for mutation in mutations {
            self.pairs.retain(|(n, _)| n != mutation.name());
            if !mutation.is_removal() {
                self.pairs
                    .push((mutation.name().to_string(), mutation.value().to_string()));
            }
        }
    }

    /// Serializes the jar as a single `Cookie` header value.
    pub fn to_header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(n, v)| Cookie::new(n.as_str(), v.as_str()).encoded().to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Immutable per-request input to the access filter.
///
/// The method is upper-cased on construction so every later comparison is
/// case-insensitive.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    request_id: String,
    path: String,
    method: String,
    cookies: CookieJar,
}

impl RequestDescriptor {
    /// Creates a descriptor with an empty cookie jar.
    pub fn new(
        request_id: impl Into<String>,
        path: impl Into<String>,
        method: impl AsRef<str>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            path: path.into(),
            method: method.as_ref().to_ascii_uppercase(),
            cookies: CookieJar::new(),
        }
    }

    /// Attaches the incoming cookies.
    pub fn with_cookies(mut self, cookies: CookieJar) -> Self {
        self.cookies = cookies;
        self
    }

    /// Request correlation id used in logs and audit events.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Upper-cased HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Incoming cookies.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::CookieOptions;

    #[test]
    fn role_defaults_to_admin() {
        assert_eq!(Role::from_metadata(None), Role::Admin);
        assert_eq!(Role::from_metadata(Some("ADMIN")), Role::Admin);
        assert_eq!(Role::from_metadata(Some("owner")), Role::Admin);
        assert_eq!(Role::from_metadata(Some("SUPER_ADMIN")), Role::SuperAdmin);
    }

    #[test]
    fn role_display_uses_wire_name() {
        assert_eq!(Role::SuperAdmin.to_string(), "SUPER_ADMIN");
    }

    #[test]
    fn cookie_jar_parses_header() {
        let jar = CookieJar::parse(["sb-access-token=abc; theme=dark", "lang=id"]);

        assert_eq!(jar.len(), 3);
        assert_eq!(jar.get("sb-access-token"), Some("abc"));
        assert_eq!(jar.get("lang"), Some("id"));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn cookie_jar_skips_malformed_fragments() {
        let jar = CookieJar::parse(["garbage; =nameless; ok=1"]);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get("ok"), Some("1"));
    }

    #[test]
    fn cookie_jar_trims_quotes_and_decodes() {
        let jar = CookieJar::parse([r#"t="abc"; note=a%20b"#]);
        assert_eq!(jar.get("t"), Some("abc"));
        assert_eq!(jar.get("note"), Some("a b"));
    }

    #[test]
    fn cookie_jar_header_round_trips_encoding() {
        let mut jar = CookieJar::new();
        jar.insert("note", "a b;c");
        jar.insert("lang", "id");
        let header = jar.to_header_value();

        assert_eq!(header, "note=a%20b%3Bc; lang=id");
        assert_eq!(CookieJar::parse([header.as_str()]), jar);
    }

    #[test]
    fn cookie_jar_keeps_values_with_equals() {
        let jar = CookieJar::parse(["token=a=b="]);
        assert_eq!(jar.get("token"), Some("a=b="));
    }

    #[test]
    fn apply_replaces_and_removes() {
        let mut jar = CookieJar::parse(["sb-access-token=old; sb-refresh-token=r1; theme=dark"]);
        jar.apply(&[
            CookieMutation::set("sb-access-token", "new", CookieOptions::default()),
            CookieMutation::remove("sb-refresh-token", CookieOptions::default()),
        ]);

        assert_eq!(jar.get("sb-access-token"), Some("new"));
        assert_eq!(jar.get("sb-refresh-token"), None);
        assert_eq!(jar.to_header_value(), "theme=dark; sb-access-token=new");
    }

    #[test]
    fn descriptor_uppercases_method() {
        let req = RequestDescriptor::new("req-1", "/api/products", "post");
        assert_eq!(req.method(), "POST");
        assert_eq!(req.path(), "/api/products");
        assert!(req.cookies().is_empty());
    }
}
