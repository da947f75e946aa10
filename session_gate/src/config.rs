//! Central configuration for the session_gate crate

use std::sync::LazyLock;

/// Path prefix under which the protected API lives
///
/// Every request path starting with this prefix is subject to session checks,
/// except for the public authentication endpoints.
/// Default: "/api"
pub static GATE_API_PREFIX: LazyLock<String> =
    LazyLock::new(|| std::env::var("GATE_API_PREFIX").unwrap_or_else(|_| "/api".to_string()));

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_gate_api_prefix_default() {
        let original_value = env::var("GATE_API_PREFIX").ok();

        unsafe {
            env::remove_var("GATE_API_PREFIX");
        }

        // The LazyLock may already be initialized, so check the logic it uses
        let prefix = env::var("GATE_API_PREFIX").unwrap_or_else(|_| "/api".to_string());
        assert_eq!(prefix, "/api");

        if let Some(value) = original_value {
            unsafe {
                env::set_var("GATE_API_PREFIX", value);
            }
        }
    }

    #[test]
    #[serial]
    fn test_gate_api_prefix_custom() {
        let original_value = env::var("GATE_API_PREFIX").ok();

        unsafe {
            env::set_var("GATE_API_PREFIX", "/v1");
        }

        let prefix = env::var("GATE_API_PREFIX").unwrap_or_else(|_| "/api".to_string());
        assert_eq!(prefix, "/v1");

        unsafe {
            if let Some(value) = original_value {
                env::set_var("GATE_API_PREFIX", value);
            } else {
                env::remove_var("GATE_API_PREFIX");
            }
        }
    }
}
