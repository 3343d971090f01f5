//! Address helpers: CIDR parsing, printable tokens and gateway arithmetic.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;

/// Parse `addr/len` into the host address and its containing network.
pub fn parse_cidr(value: &str) -> Result<(IpAddr, IpNet), ipnet::AddrParseError> {
    let net: IpNet = value.trim().parse()?;
    Ok((net.addr(), net.trunc()))
}

/// Naming-safe identifier for a network.
///
/// IPv4 networks become their dotted network address with `-` separators.
/// IPv6 networks become their hextets, trailing zero hextets dropped, joined
/// with `-`. A prefix length other than `default_len` is appended as `_<len>`.
pub fn printable_network(net: &IpNet, default_len: u8) -> String {
    let mut token = match net.network() {
        IpAddr::V4(addr) => addr.to_string().replace('.', "-"),
        IpAddr::V6(addr) => {
            let segments = addr.segments();
            let used = segments.iter().rposition(|s| *s != 0).map_or(1, |i| i + 1);
            segments[..used]
                .iter()
                .map(|s| format!("{:x}", s))
                .collect::<Vec<_>>()
                .join("-")
        }
    };

    if net.prefix_len() != default_len {
        token.push('_');
        token.push_str(&net.prefix_len().to_string());
    }

    token
}

/// Naming-safe form of a single address.
pub fn printable_address(addr: &IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => v4.to_string().replace('.', "-"),
        IpAddr::V6(v6) => v6.to_string().replace(':', "-"),
    }
}

/// First host address of a network: the network address plus one.
pub fn first_host(net: &IpNet) -> IpAddr {
    match net.network() {
        IpAddr::V4(addr) => IpAddr::V4(Ipv4Addr::from(u32::from(addr).saturating_add(1))),
        IpAddr::V6(addr) => IpAddr::V6(Ipv6Addr::from(u128::from(addr).saturating_add(1))),
    }
}
