//! Client identification for rate limiting

use actix_web::HttpRequest;
use cs_core::domain::entities::ClientKey;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

/// The key a request is counted under.
///
/// Proxy headers are only honoured when the deployment sits behind a proxy
/// that sets them; otherwise any client could pick its own bucket.
pub fn client_key(req: &HttpRequest, trust_proxy_headers: bool) -> ClientKey {
    if trust_proxy_headers {
        let forwarded = req
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .or_else(|| req.headers().get(REAL_IP).and_then(|v| v.to_str().ok()));
        if let Some(raw) = forwarded {
            let key = ClientKey::parse(Some(raw));
            if !key.is_unidentified() {
                return key;
            }
        }
    }

    match req.peer_addr() {
        Some(addr) => ClientKey::from_ip(addr.ip()),
        None => ClientKey::unidentified(),
    }
}
