use env_logger::Builder;

/// Default filter for the binaries: info everywhere, debug for our own crates.
pub fn default_filters(crate_name: &str) -> String {
    format!("info,instasocial=debug,{}=debug", crate_name.replace('-', "_"))
}

/// Initialize the global logger from an `env_logger` filter string such as `info,instasocial=trace`.
/// Calling it twice is harmless; the second call is ignored.
pub fn init_logger(filters: &str) {
    let _ = Builder::new().parse_filters(filters).format_timestamp_millis().try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_normalize_crate_names() {
        assert_eq!(default_filters("instasocial-client"), "info,instasocial=debug,instasocial_client=debug");
    }
}
