//! 客户端 IP 提取
//!
//! 只有连接来自 `auth.trusted_proxies` 中的地址（单 IP 或 CIDR）时
//! 才采信 X-Forwarded-For / X-Real-IP，否则使用对端地址。

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;

use crate::config::get_config;

fn parse_peer(addr: &str) -> Option<IpAddr> {
    addr.parse::<SocketAddr>()
        .map(|s| s.ip())
        .ok()
        .or_else(|| addr.parse::<IpAddr>().ok())
}

/// `ip` 是否落在 `cidr`（如 `10.0.0.0/8`）内
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let (Ok(network), Ok(prefix)) = (network.parse::<IpAddr>(), prefix.parse::<u32>()) else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
            u32::from(*ip) & mask == u32::from(net) & mask
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
            u128::from(*ip) & mask == u128::from(net) & mask
        }
        _ => false,
    }
}

pub fn is_trusted_proxy(peer: &str, trusted_proxies: &[String]) -> bool {
    let Some(ip) = parse_peer(peer) else {
        return false;
    };
    trusted_proxies.iter().any(|proxy| {
        if proxy.contains('/') {
            ip_in_cidr(&ip, proxy)
        } else {
            proxy.parse::<IpAddr>().is_ok_and(|p| p == ip)
        }
    })
}

/// X-Forwarded-For 的第一项，其次 X-Real-IP
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

/// 按对端地址与可信代理列表决定客户端 IP
pub fn resolve_client_ip(
    peer: Option<&str>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> Option<String> {
    let peer = peer?;
    if !trusted_proxies.is_empty() && is_trusted_proxy(peer, trusted_proxies) {
        if let Some(real) = forwarded_ip(headers) {
            return Some(real);
        }
    }
    Some(
        parse_peer(peer)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| peer.to_string()),
    )
}

pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let config = get_config();
    let conn = req.connection_info();
    resolve_client_ip(conn.peer_addr(), req.headers(), &config.auth.trusted_proxies)
}
