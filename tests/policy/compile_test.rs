//! Label compilation tests.

use std::collections::HashMap;
use std::path::PathBuf;

use launch_policy::{compile, labels, InvalidLabel, LaunchPolicy, PolicyLevel};

fn labels_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn compiled(pairs: &[(&str, &str)]) -> LaunchPolicy {
    match compile(&labels_of(pairs)) {
        Ok(policy) => policy,
        Err(err) => panic!("labels should compile: {err}"),
    }
}

#[test]
fn missing_labels_take_defaults() {
    let policy = compiled(&[]);
    assert!(policy.allowed_env_override.is_empty());
    assert!(!policy.allowed_cmd_override);
    assert_eq!(policy.allowed_log_redirect, PolicyLevel::DebugOnly);
    assert_eq!(policy.allowed_memory_monitoring, PolicyLevel::DebugOnly);
    assert!(policy.allowed_mount_destinations.is_empty());
}

#[test]
fn unrecognized_labels_are_ignored() {
    let policy = compiled(&[
        ("org.opencontainers.image.title", "workload"),
        ("tee.launch_policy.unknown", "garbage"),
    ]);
    assert_eq!(policy, LaunchPolicy::default());
}

#[test]
fn env_override_drops_empty_names() {
    let policy = compiled(&[(labels::ENV_OVERRIDE, ",FOO,,BAR,")]);
    let names: Vec<&str> = policy
        .allowed_env_override
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(names, vec!["BAR", "FOO"]);
    assert!(policy.allows_env("FOO"));
    assert!(!policy.allows_env(""));
}

#[test]
fn empty_env_override_allows_nothing() {
    let policy = compiled(&[(labels::ENV_OVERRIDE, "")]);
    assert!(policy.allowed_env_override.is_empty());
}

#[test]
fn cmd_override_accepts_boolean_variants() {
    for value in ["true", "TRUE", "True", "t", "T", "1"] {
        assert!(compiled(&[(labels::CMD_OVERRIDE, value)]).allowed_cmd_override);
    }
    for value in ["false", "FALSE", "False", "f", "F", "0"] {
        assert!(!compiled(&[(labels::CMD_OVERRIDE, value)]).allowed_cmd_override);
    }
}

#[test]
fn malformed_cmd_override_is_invalid_label() {
    for value in ["yes", "", " true", "enabled"] {
        let result = compile(&labels_of(&[(labels::CMD_OVERRIDE, value)]));
        match result {
            Err(InvalidLabel::NotBoolean { label, value: got }) => {
                assert_eq!(label, labels::CMD_OVERRIDE);
                assert_eq!(got, value);
            }
            other => panic!("expected NotBoolean for {value:?}, got {other:?}"),
        }
    }
}

#[test]
fn invalid_label_message_addresses_image_author() {
    let err = match compile(&labels_of(&[(labels::CMD_OVERRIDE, "nope")])) {
        Err(err) => err,
        Ok(policy) => panic!("expected failure, got {policy:?}"),
    };
    let message = err.to_string();
    assert!(message.contains(labels::CMD_OVERRIDE));
    assert!(message.contains("contact the image author"));
}

#[test]
fn levels_parse_case_insensitively_with_whitespace() {
    let policy = compiled(&[
        (labels::LOG_REDIRECT, "  ALWAYS "),
        (labels::MEMORY_MONITORING, "Never"),
    ]);
    assert_eq!(policy.allowed_log_redirect, PolicyLevel::Always);
    assert_eq!(policy.allowed_memory_monitoring, PolicyLevel::Never);

    let policy = compiled(&[(labels::LOG_REDIRECT, "debugonly")]);
    assert_eq!(policy.allowed_log_redirect, PolicyLevel::DebugOnly);
}

#[test]
fn unknown_level_is_invalid_label() {
    let result = compile(&labels_of(&[(labels::MEMORY_MONITORING, "debug-only")]));
    match result {
        Err(err @ InvalidLabel::NotPolicyLevel { .. }) => {
            assert_eq!(err.label(), labels::MEMORY_MONITORING);
            assert_eq!(err.value(), "debug-only");
        }
        other => panic!("expected NotPolicyLevel, got {other:?}"),
    }
}

#[test]
fn first_failure_in_label_order_is_reported() {
    let result = compile(&labels_of(&[
        (labels::MEMORY_MONITORING, "bogus"),
        (labels::CMD_OVERRIDE, "bogus"),
        (labels::LOG_REDIRECT, "bogus"),
    ]));
    match result {
        Err(err) => assert_eq!(err.label(), labels::CMD_OVERRIDE),
        Ok(policy) => panic!("expected failure, got {policy:?}"),
    }
}

#[test]
fn mount_destinations_are_split_and_cleaned() {
    let policy = compiled(&[(
        labels::MOUNT_DESTINATIONS,
        "/mnt/data/::/var//log/./app:/run/../tmp/",
    )]);
    assert_eq!(
        policy.allowed_mount_destinations,
        vec![
            PathBuf::from("/mnt/data"),
            PathBuf::from("/var/log/app"),
            PathBuf::from("/tmp"),
        ]
    );
}

#[test]
fn relative_mount_destination_is_kept_cleaned() {
    let policy = compiled(&[(labels::MOUNT_DESTINATIONS, "./data/../cache")]);
    assert_eq!(
        policy.allowed_mount_destinations,
        vec![PathBuf::from("cache")]
    );
}

#[test]
fn compile_matches_from_labels() {
    let image_labels = labels_of(&[
        (labels::ENV_OVERRIDE, "A"),
        (labels::CMD_OVERRIDE, "true"),
    ]);
    assert_eq!(
        compile(&image_labels),
        LaunchPolicy::from_labels(&image_labels)
    );
}

#[test]
fn policy_display_lists_every_field() {
    let policy = compiled(&[
        (labels::ENV_OVERRIDE, "FOO"),
        (labels::LOG_REDIRECT, "always"),
        (labels::MOUNT_DESTINATIONS, "/mnt"),
    ]);
    assert_eq!(
        policy.to_string(),
        "env override: [FOO], cmd override: false, log redirect: always, memory monitoring: debugonly, mount destinations: [/mnt]"
    );
}

#[test]
fn label_keys_are_stable() {
    assert_eq!(
        labels::ALL,
        [
            "tee.launch_policy.allow_env_override",
            "tee.launch_policy.allow_cmd_override",
            "tee.launch_policy.log_redirect",
            "tee.launch_policy.monitoring_memory_allow",
            "tee.launch_policy.allow_mount_destinations",
        ]
    );
}
