//! Tests for single connection attempts against stand-in daemons
#![cfg(unix)]

use ovpnctl_core::error::VpnError;
use ovpnctl_core::vpn::{ConnectionResult, Connector, DaemonCommand, ProcessSupervisor};
use std::time::{Duration, Instant};

fn sh(script: &str) -> DaemonCommand {
    DaemonCommand::new("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

fn connector(supervisor: &ProcessSupervisor, timeout: Duration) -> Connector {
    Connector::new(supervisor.clone(), timeout, false)
}

#[tokio::test]
async fn test_success_after_error_line() {
    let supervisor = ProcessSupervisor::new();
    let connector = connector(&supervisor, Duration::from_secs(5));

    let result = connector
        .establish(&sh(
            "echo 'WARNING: route error'; echo 'Initialization Sequence Completed'; exec sleep 30",
        ))
        .await
        .unwrap();

    assert_eq!(
        result,
        ConnectionResult::Established {
            line: "Initialization Sequence Completed".to_string()
        }
    );
    // The daemon stays up as the live connection
    assert!(supervisor.is_running());

    supervisor.terminate();
}

#[tokio::test]
async fn test_success_on_stderr() {
    let supervisor = ProcessSupervisor::new();
    let connector = connector(&supervisor, Duration::from_secs(5));

    let result = connector
        .establish(&sh(
            "echo 'Mon Jan 1 2024 Initialization Sequence Completed' >&2; exec sleep 30",
        ))
        .await
        .unwrap();

    assert!(result.is_established());
    supervisor.terminate();
}

#[tokio::test]
async fn test_timeout_kills_daemon() {
    let supervisor = ProcessSupervisor::new();
    let connector = connector(&supervisor, Duration::from_millis(300));
    let started = Instant::now();

    let result = connector
        .establish(&sh("echo 'TLS Error: handshake failed'; exec sleep 30"))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(!supervisor.is_running());
    match result {
        ConnectionResult::Failed { errors } => {
            assert_eq!(errors.len(), 2);
            assert_eq!(errors[0], "TLS Error: handshake failed");
            assert!(errors[1].starts_with("Timeout error"));
        }
        other => panic!("Expected Failed result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_fires_while_daemon_floods_output() {
    let supervisor = ProcessSupervisor::new();
    let connector = connector(&supervisor, Duration::from_millis(300));

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        connector.establish(&sh("exec yes 'TCP: connect to 10.0.0.1:1194 retrying'")),
    )
    .await
    .expect("timeout never fired under continuous output")
    .unwrap();

    assert!(!supervisor.is_running());
    match result {
        ConnectionResult::Failed { errors } => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].starts_with("Timeout error"));
        }
        other => panic!("Expected Failed result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_clean_exit_before_success_fails() {
    let supervisor = ProcessSupervisor::new();
    let connector = connector(&supervisor, Duration::from_secs(5));

    let result = connector
        .establish(&sh("echo 'OpenVPN 2.6.8'; exit 0"))
        .await
        .unwrap();

    assert_eq!(
        result,
        ConnectionResult::Failed {
            errors: vec!["sh daemon exited with code 0".to_string()]
        }
    );
}

#[tokio::test]
async fn test_nonzero_exit_collects_errors_in_order() {
    let supervisor = ProcessSupervisor::new();
    let connector = connector(&supervisor, Duration::from_secs(5));

    let result = connector
        .establish(&sh("echo 'Options error: --dev fails' >&2; exit 1"))
        .await
        .unwrap();

    assert_eq!(
        result,
        ConnectionResult::Failed {
            errors: vec![
                "Options error: --dev fails".to_string(),
                "sh daemon exited with code 1".to_string(),
            ]
        }
    );
    assert!(!supervisor.is_running());
}

#[tokio::test]
async fn test_already_running_escapes() {
    let supervisor = ProcessSupervisor::new();
    let _live = supervisor.start(&sh("exec sleep 30"), false).unwrap();
    let connector = connector(&supervisor, Duration::from_secs(5));

    let result = connector.establish(&sh("echo never")).await;

    assert!(matches!(result, Err(VpnError::AlreadyRunning { .. })));
    supervisor.terminate();
}

#[tokio::test]
async fn test_spawn_failure_is_attempt_local() {
    let supervisor = ProcessSupervisor::new();
    let connector = connector(&supervisor, Duration::from_secs(5));

    let result = connector
        .establish(&DaemonCommand::new("/nonexistent/openvpn", vec![]))
        .await
        .unwrap();

    match result {
        ConnectionResult::Failed { errors } => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].starts_with("Failed to spawn openvpn"));
        }
        other => panic!("Expected Failed result, got {:?}", other),
    }
}
