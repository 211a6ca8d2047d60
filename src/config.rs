//! Configuration utilities (bind address, env vars)

use std::{
    env,
    net::{Ipv4Addr, SocketAddr},
};

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var or defaults to 3000, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(3000);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}
