//! Map curl errors onto transport failures.

use super::TransportError;

pub fn classify_curl_error(e: &curl::Error) -> TransportError {
    if e.is_operation_timedout() {
        return TransportError::TimedOut(e.to_string());
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return TransportError::InvalidUri(e.to_string());
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_ssl_connect_error()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return TransportError::NotOpen(e.to_string());
    }
    TransportError::Unknown(e.to_string())
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        classify_curl_error(&e)
    }
}
