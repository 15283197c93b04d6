// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn url_building_strips_trailing_slash() {
    let client = PrimaryClient::new("http://primary:3001/", &SslVerify::Enabled).unwrap();
    assert_eq!(client.url("/api/sync/revision"), "http://primary:3001/api/sync/revision");
}

#[test]
fn notify_url_scheme_mapping() {
    let http = PrimaryClient::new("http://primary:3001", &SslVerify::Enabled).unwrap();
    assert_eq!(http.notify_url(), "ws://primary:3001/api/ws/workers");

    let https = PrimaryClient::new("https://primary", &SslVerify::Enabled).unwrap();
    assert_eq!(https.notify_url(), "wss://primary/api/ws/workers");
}

#[test]
fn transient_classification() {
    assert!(ClientError::Api { status: 503, message: String::new() }.is_transient());
    assert!(!ClientError::Api { status: 403, message: String::new() }.is_transient());
    assert!(!ClientError::Tls("bad pem".into()).is_transient());
    let io = ClientError::Io(std::io::Error::other("x"));
    assert!(io.is_transient());
}
