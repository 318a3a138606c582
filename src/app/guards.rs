use actix_web::guard::{Guard, GuardContext};
use log::debug;
use std::net::IpAddr;

// A guard only makes the route not match, the request then
// falls through to the next route registered for the same
// path. Used to let the scheduled scraper trigger in without
// credentials when it comes from the server itself.
// Only looks at the socket peer, forwarded headers are easy
// to forge.
#[derive(Clone)]
pub struct IPRestrictedGuard {
  allowed: Vec<IpAddr>
}

impl IPRestrictedGuard {
  pub fn new(allowed: Vec<IpAddr>) -> Self {
    Self { allowed }
  }

  pub fn loopback() -> Self {
    Self::new(vec![
      IpAddr::from([127, 0, 0, 1]),
      IpAddr::from([0, 0, 0, 0, 0, 0, 0, 1])
    ])
  }

  fn is_allowed(&self, ip: IpAddr) -> bool {
    // IPv4 mapped into IPv6 shows up on dual stack sockets.
    let ip = match ip {
      IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
      v4 => v4
    };
    self.allowed.contains(&ip)
  }
}

impl Guard for IPRestrictedGuard {
  fn check(&self, ctx: &GuardContext<'_>) -> bool {
    match ctx.head().peer_addr {
      Some(sock_addr) if self.is_allowed(sock_addr.ip()) => true,
      Some(sock_addr) => {
        debug!("{} is not allowed on the restricted route {}",
          sock_addr.ip(), ctx.head().uri);
        false
      },
      None => false
    }
  }
}
