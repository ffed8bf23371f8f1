pub mod api;
pub mod auth;
pub mod diff;
pub mod register;

/// `host:port` unless `--listen` overrides it.
pub(crate) fn listen_addr(listen: Option<&str>, host: &str, port: u16) -> String {
    match listen {
        Some(addr) => addr.to_string(),
        None => format!("{}:{}", host, port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_overrides_config() {
        assert_eq!(listen_addr(None, "0.0.0.0", 9101), "0.0.0.0:9101");
        assert_eq!(listen_addr(Some("127.0.0.1:1"), "0.0.0.0", 9101), "127.0.0.1:1");
    }
}
