//! Contract tests for the module registry with every provider compiled in

use tlsdns::{ChallengeProvider, Error, SolverRegistry, default_registry, register_all};

#[test]
fn test_all_modules_registered() {
    let registry = default_registry().unwrap();
    assert_eq!(
        registry.list_modules(),
        vec![
            "tls.dns.cloudflare".to_string(),
            "tls.dns.dnsimple".to_string(),
            "tls.dns.rfc2136".to_string(),
        ]
    );
}

#[test]
fn test_register_twice_fails() {
    let registry = SolverRegistry::new();
    register_all(&registry).unwrap();
    assert!(matches!(register_all(&registry), Err(Error::Config(_))));
}

#[test]
fn test_unknown_module() {
    let registry = default_registry().unwrap();
    let err = registry.create_solver("tls.dns.route53", b"{}").err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_create_each_provider() {
    let registry = default_registry().unwrap();

    let cases: [(&str, serde_json::Value, &str); 3] = [
        (
            "tls.dns.cloudflare",
            serde_json::json!({ "api_token": "dns-token", "ttl": 300 }),
            "cloudflare",
        ),
        (
            "tls.dns.dnsimple",
            serde_json::json!({ "access_token": "account-token" }),
            "dnsimple",
        ),
        (
            "tls.dns.rfc2136",
            serde_json::json!({ "nameserver": "127.0.0.1", "propagation_timeout": "5m" }),
            "rfc2136",
        ),
    ];

    for (id, config, name) in cases {
        let bytes = serde_json::to_vec(&config).unwrap();
        let provider = registry.create_solver(id, &bytes).unwrap();
        assert_eq!(provider.provider_name(), name);
    }
}

#[test]
fn test_library_errors_pass_through() {
    let registry = default_registry().unwrap();

    let err = registry
        .create_solver("tls.dns.cloudflare", br#"{"api_token":"t","ttl":30}"#)
        .err()
        .unwrap();
    assert_eq!(
        err.to_string(),
        "cloudflare: invalid TTL, TTL (30) must be greater than 120"
    );
}

#[test]
fn test_malformed_json() {
    let registry = default_registry().unwrap();
    let err = registry
        .create_solver("tls.dns.dnsimple", br#"{"access_token": 42}"#)
        .err()
        .unwrap();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn test_invalid_duration_rejected() {
    let registry = default_registry().unwrap();
    let result = registry.create_solver(
        "tls.dns.rfc2136",
        br#"{"nameserver":"ns1","polling_interval":"-5s"}"#,
    );
    assert!(matches!(result, Err(Error::Json(_))));
}

#[test]
fn test_boxed_provider_reports_timeouts() {
    let registry = default_registry().unwrap();
    let provider = registry
        .create_solver(
            "tls.dns.rfc2136",
            br#"{"nameserver":"127.0.0.1","propagation_timeout":"2m","polling_interval":"5s","dns_client":{"sequence_interval":"15s"}}"#,
        )
        .unwrap();

    assert_eq!(
        provider.timeout(),
        (
            std::time::Duration::from_secs(120),
            std::time::Duration::from_secs(5)
        )
    );
    assert_eq!(
        provider.sequential(),
        Some(std::time::Duration::from_secs(15))
    );
}
