use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Validate an IPv4 address (e.g., "192.168.1.1").
pub fn is_ipv4_address(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>().is_ok()
}

/// Validate an IPv6 address (e.g., "2001:db8::1").
pub fn is_ipv6_address(ip: &str) -> bool {
    ip.parse::<Ipv6Addr>().is_ok()
}

/// True for any IPv4 or IPv6 address literal
pub fn is_ip_address(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// Validate a MAC address.
/// Accepts 12 hex digits, either contiguous or as six pairs split by one
/// consistent separator (':' or '-'). Case-insensitive.
pub fn is_mac_address(mac: &str) -> bool {
    let bytes = mac.as_bytes();
    let hex = |c: u8| c.is_ascii_hexdigit();

    match bytes.len() {
        12 => bytes.iter().all(|&c| hex(c)),
        17 => {
            let sep = bytes[2];
            if sep != b':' && sep != b'-' {
                return false;
            }
            bytes
                .chunks(3)
                .all(|pair| hex(pair[0]) && hex(pair[1]) && (pair.len() == 2 || pair[2] == sep))
        }
        _ => false,
    }
}

/// Validate a TCP port number (1-65535)
pub fn is_valid_port(port: i64) -> bool {
    (1..=65535).contains(&port)
}

/// Truncate output to a maximum number of lines
pub fn truncate_lines(s: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    if lines.len() <= max_lines {
        s.to_string()
    } else {
        let truncated: Vec<&str> = lines[..max_lines].to_vec();
        format!("{}\n... ({} more lines)", truncated.join("\n"), lines.len() - max_lines)
    }
}
