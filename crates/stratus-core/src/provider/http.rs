//! Minimal HTTP/1.0 request builder and response splitter.
//!
//! Requests are sent as HTTP/1.0 with `Connection: close`, so the server
//! answers with an unchunked body that ends when the socket closes.

use alloc::format;
use alloc::string::String;

use super::ProviderError;

/// A response split into status code and body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    pub status: u16,
    pub body: &'a [u8],
}

impl<'a> Response<'a> {
    /// Body of a 200 response; any other status is an error.
    pub fn ok_body(self) -> Result<&'a [u8], ProviderError> {
        if self.status == 200 {
            Ok(self.body)
        } else {
            Err(ProviderError::HttpStatus(self.status))
        }
    }
}

pub fn get_request(host: &str, path: &str) -> String {
    format!(
        "GET {} HTTP/1.0\r\nHost: {}\r\nAccept: application/json\r\nUser-Agent: stratus\r\nConnection: close\r\n\r\n",
        path, host
    )
}

/// Split a raw response into its status code and body.
pub fn parse_response(raw: &[u8]) -> Result<Response<'_>, ProviderError> {
    let header_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or(ProviderError::MalformedResponse)?;
    let head = core::str::from_utf8(&raw[..header_end]).map_err(|_| ProviderError::MalformedResponse)?;

    let status_line = head.lines().next().ok_or(ProviderError::MalformedResponse)?;
    let mut parts = status_line.split_ascii_whitespace();
    let version = parts.next().ok_or(ProviderError::MalformedResponse)?;
    if !version.starts_with("HTTP/1.") {
        return Err(ProviderError::MalformedResponse);
    }
    let status = parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(ProviderError::MalformedResponse)?;

    Ok(Response {
        status,
        body: &raw[header_end + 4..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let req = get_request("api.example.com", "/data?x=1");
        assert!(req.starts_with("GET /data?x=1 HTTP/1.0\r\nHost: api.example.com\r\n"));
        assert!(req.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_split_ok_response() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"a\":1}";
        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, b"{\"a\":1}");
        assert_eq!(resp.ok_body().unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_non_200_is_status_error() {
        let raw = b"HTTP/1.1 401 Unauthorized\r\n\r\n{\"cod\":401}";
        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.ok_body(), Err(ProviderError::HttpStatus(401)));
    }

    #[test]
    fn test_empty_body() {
        let resp = parse_response(b"HTTP/1.0 204 No Content\r\n\r\n").unwrap();
        assert_eq!(resp.status, 204);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn test_malformed_responses() {
        assert_eq!(parse_response(b""), Err(ProviderError::MalformedResponse));
        assert_eq!(
            parse_response(b"HTTP/1.1 200 OK\r\nno blank line"),
            Err(ProviderError::MalformedResponse)
        );
        assert_eq!(
            parse_response(b"SSH-2.0 hello\r\n\r\n"),
            Err(ProviderError::MalformedResponse)
        );
        assert_eq!(
            parse_response(b"HTTP/1.1 abc OK\r\n\r\n"),
            Err(ProviderError::MalformedResponse)
        );
    }
}
