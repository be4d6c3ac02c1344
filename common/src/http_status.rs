//! HTTP status codes as returned by the Vault API.

/// HTTP status code kept as a number, never parsed back out of messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpStatusCode(pub u16);

impl HttpStatusCode {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// 204: Vault answers writes and deletes without a body.
    pub fn is_no_content(&self) -> bool {
        self.0 == 204
    }

    /// 404: path has no secret (or the mount does not exist).
    pub fn is_not_found(&self) -> bool {
        self.0 == 404
    }

    /// 403: token missing, expired, or lacking policy.
    pub fn is_permission_denied(&self) -> bool {
        self.0 == 403
    }

    /// 503: the server is sealed or still starting.
    pub fn is_unavailable(&self) -> bool {
        self.0 == 503
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl From<u16> for HttpStatusCode {
    fn from(code: u16) -> Self {
        HttpStatusCode(code)
    }
}

impl std::fmt::Display for HttpStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
