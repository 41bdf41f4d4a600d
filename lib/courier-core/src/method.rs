//! HTTP method of an outgoing request.

use std::str::FromStr;

use derive_more::Display;

use crate::Error;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET
    #[display("GET")]
    Get,
    /// POST
    #[display("POST")]
    Post,
    /// PUT
    #[display("PUT")]
    Put,
    /// PATCH
    #[display("PATCH")]
    Patch,
    /// DELETE
    #[display("DELETE")]
    Delete,
    /// HEAD
    #[display("HEAD")]
    Head,
    /// OPTIONS
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// Wire representation of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => return Err(Error::invalid_request(format!("unsupported HTTP method: {s}"))),
        };
        Ok(method)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = Error;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}
