use axon::client::{Config, Dispatch, EnvConfig, NorthboundClient, Result};
use axon::protocol::{read_frame, write_frame};
use axon::server::{EnvWorker, WorkerConfig};
use serde_json::{json, Map, Value};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config(port: u16, respond_action: bool) -> Config {
    Config {
        session_name: "test".to_owned(),
        session_key: "test".to_owned(),
        algorithm_client_port: port,
        env_config: EnvConfig {
            respond_action_after_measurement: respond_action,
            downlink: true,
            extra: Map::new(),
        },
        action_template: json!({"type": "action", "version": "1.3"}),
    }
}

fn worker_config(session_key: &str, rounds: u32, unavailable: bool) -> WorkerConfig {
    WorkerConfig {
        bind: "127.0.0.1".to_owned(),
        port: 0,
        session_name: "test".to_owned(),
        session_key: session_key.to_owned(),
        rounds,
        window_ms: 100,
        unavailable,
        log_level: "info".to_owned(),
        log_format: "text".to_owned(),
    }
}

/// Test helper: scripted environment peer that records every frame the
/// client sends and answers with one canned reply.
fn spawn_scripted_env(
    listener: TcpListener,
    reply: Value,
    expect_action: bool,
    tx: mpsc::Sender<Value>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");

        let greeting = read_frame(&mut stream).expect("no greeting frame");
        tx.send(serde_json::from_slice(&greeting).unwrap()).unwrap();

        let start = read_frame(&mut stream).expect("no start request frame");
        tx.send(serde_json::from_slice(&start).unwrap()).unwrap();

        if expect_action {
            let action = read_frame(&mut stream).expect("no action frame");
            tx.send(serde_json::from_slice(&action).unwrap()).unwrap();
        }

        write_frame(&mut stream, &serde_json::to_vec_pretty(&reply).unwrap())
            .expect("reply write failed");
    })
}

#[test]
fn test_scenario_end_to_end() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let (tx, rx) = mpsc::channel();

    let reply = json!({
        "type": "env-measurement",
        "metric_list": [{"name": "end_ts", "value": "1000"}],
    });
    let handle = spawn_scripted_env(listener, reply, true, tx);

    let config = test_config(port, true);
    let mut client = NorthboundClient::new(0, config.clone());
    client.connect()?;
    client.send(&json!({"x": 1}))?;

    match client.recv()? {
        Dispatch::Measurement(report) => {
            assert!(report.ok_flag);
            assert_eq!(report.data.len(), 1);
            assert_eq!(report.data.get(0, "name"), Some(&json!("end_ts")));
        }
        other => panic!("expected measurement, got {:?}", other),
    }
    assert_eq!(client.end_ts(), Some(1000));

    let greeting = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(greeting["identity"], json!("test-0"));
    assert_eq!(greeting["username"], json!("test"));
    assert_eq!(greeting["password"], json!("test"));

    let start = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(start, serde_json::to_value(&config.env_config).unwrap());

    let action = rx.recv_timeout(RECV_TIMEOUT).unwrap();
    assert_eq!(action["action_list"], json!({"x": 1}));
    assert_eq!(action["type"], json!("action"));
    assert_eq!(action["version"], json!("1.3"));

    client.close()?;
    handle.join().unwrap();
    Ok(())
}

#[test]
fn test_send_is_silent_when_responses_disabled() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");
        read_frame(&mut stream).expect("no greeting frame");
        read_frame(&mut stream).expect("no start request frame");
        // The next read must hit end-of-stream: the no-op send leaves
        // nothing on the wire before the client closes.
        tx.send(read_frame(&mut stream).is_err()).unwrap();
    });

    let mut client = NorthboundClient::new(0, test_config(port, false));
    client.connect()?;
    client.send(&json!({"x": 1}))?;
    client.close()?;

    assert!(rx.recv_timeout(RECV_TIMEOUT).unwrap());
    handle.join().unwrap();
    Ok(())
}

#[test]
fn test_full_session_against_worker() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    let worker = EnvWorker::new(worker_config("test", 3, false));
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept failed");
        worker.serve(stream).expect("serve failed");
    });

    let mut client = NorthboundClient::new(1, test_config(port, true));
    client.connect()?;

    let mut expected_end_ts = 0;
    for _ in 0..3 {
        match client.recv()? {
            Dispatch::Measurement(report) => {
                expected_end_ts += 100;
                assert!(report.ok_flag);
                assert_eq!(report.data.len(), 5);
                assert_eq!(client.end_ts(), Some(expected_end_ts));
                client.send(&json!([]))?;
            }
            other => panic!("expected measurement, got {:?}", other),
        }
    }

    client.close()?;
    handle.join().unwrap();
    Ok(())
}

#[test]
fn test_no_available_worker_is_retryable() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    let worker = EnvWorker::new(worker_config("test", 1, true));
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept failed");
        worker.serve(stream).expect("serve failed");
    });

    let mut client = NorthboundClient::new(0, test_config(port, true));
    client.connect()?;

    match client.recv()? {
        Dispatch::Retryable(reason) => assert!(reason.contains("worker")),
        other => panic!("expected retryable, got {:?}", other),
    }

    handle.join().unwrap();
    Ok(())
}

#[test]
fn test_credential_mismatch_surfaces_as_transport_error() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    // Worker expects a different key; it drops the session without replying.
    let worker = EnvWorker::new(worker_config("other-key", 1, false));
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept failed");
        worker.serve(stream).expect("serve failed");
    });

    let mut client = NorthboundClient::new(0, test_config(port, true));

    // The server never answers a bad credential pair; all the client gets
    // to see is the dead connection, on the start-request write or on the
    // next receive.
    let outcome = client.connect().and_then(|()| client.recv().map(|_| ()));
    assert!(outcome.is_err());

    handle.join().unwrap();
    Ok(())
}

#[test]
fn test_connect_refused_is_an_error() {
    // Bind then drop to get a port with nothing listening on it.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut client = NorthboundClient::new(0, test_config(port, true));
    assert!(client.connect().is_err());
    assert!(!client.is_connected());
}
