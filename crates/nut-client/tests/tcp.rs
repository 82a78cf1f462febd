//! End-to-end tests against a canned server on a loopback socket.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use nut_client::{AuthPhase, Client, ClientError, ErrorCode};

/// Serve one connection: for every expected request line, check it and
/// write the scripted reply lines. Returns the lines actually received.
fn canned_server(script: Vec<(&'static str, Vec<&'static str>)>) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let mut received = Vec::new();

        for (expected, replies) in script {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                break;
            }
            let line = line.trim_end_matches('\n').to_string();
            assert_eq!(line, expected);
            received.push(line);
            for reply in replies {
                writer.write_all(reply.as_bytes()).unwrap();
                writer.write_all(b"\n").unwrap();
            }
        }
        received
    });

    (port, handle)
}

#[test]
fn test_session_over_tcp() {
    let (port, server) = canned_server(vec![
        ("USERNAME monitor", vec!["OK"]),
        ("PASSWORD s3cret", vec!["OK"]),
        (
            "LIST UPS",
            vec!["BEGIN LIST UPS", "UPS ups1 \"desc1\"", "UPS ups2 \"desc2\"", "END LIST UPS"],
        ),
        ("GET VAR ups1 battery.charge", vec!["VAR ups1 battery.charge \"100\""]),
        ("INSTCMD ups1 beeper.toggle", vec!["OK"]),
        ("LOGOUT", vec![]),
    ]);

    let client = Client::connect_to("127.0.0.1", port, Some("monitor"), Some("s3cret"))
        .expect("connect and authenticate");
    assert!(client.is_connected());

    assert_eq!(
        client.list("UPS", &[]).unwrap(),
        Some(vec!["ups1 \"desc1\"".to_string(), "ups2 \"desc2\"".to_string()])
    );
    assert_eq!(
        client.get("VAR", &["ups1", "battery.charge"]).unwrap().as_deref(),
        Some("\"100\"")
    );
    assert_eq!(
        client.query("INSTCMD", &["ups1", "beeper.toggle"]).unwrap(),
        "OK"
    );

    client.logout();
    assert!(!client.is_connected());

    let received = server.join().expect("server thread");
    assert_eq!(received.last().map(String::as_str), Some("LOGOUT"));
}

#[test]
fn test_access_denied_over_tcp() {
    let (port, server) = canned_server(vec![("USERNAME intruder", vec!["ERR ACCESS-DENIED"])]);

    let err = Client::connect_to("127.0.0.1", port, Some("intruder"), None).unwrap_err();
    match err {
        ClientError::Authentication { phase, source } => {
            assert_eq!(phase, AuthPhase::Username);
            assert_eq!(source.code, ErrorCode::AccessDenied);
            assert!(source.detail.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    server.join().expect("server thread");
}

#[test]
fn test_server_hangup_mid_reply() {
    let (port, server) = canned_server(vec![("VER", vec![])]);

    let client = Client::connect_to("127.0.0.1", port, None, None).unwrap();
    let err = client.server_version().unwrap_err();
    server.join().expect("server thread");

    assert!(matches!(err, ClientError::ConnectionClosed));
    assert!(!client.is_connected());
}

#[test]
fn test_reconnect_invalidates_devices() {
    let (port, server) = canned_server(vec![("GET UPSDESC ups1", vec!["UPSDESC ups1 \"x\""])]);
    let mut client = Client::connect_to("127.0.0.1", port, None, None).unwrap();
    let device = client.device("ups1").unwrap();
    server.join().expect("server thread");

    let (port, server) = canned_server(vec![]);
    client.set_port(port);
    client.connect().expect("reconnect");

    assert!(client.is_connected());
    assert!(!device.is_valid());
    assert!(matches!(device.description(), Err(ClientError::SessionExpired)));

    client.disconnect();
    server.join().expect("server thread");
}

#[test]
fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = Client::connect_to("127.0.0.1", port, None, None).unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
}
