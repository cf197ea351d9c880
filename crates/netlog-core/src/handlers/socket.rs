use netlog_model::{Chunk, Socket, SocketKind};
use serde_json::Value;

use crate::dispatch::{DispatchedEvent, Phase};
use crate::store::EntityStore;

/// `SOCKET` and `UDP_SOCKET` — the latter is "analogous to Socket but uses
/// UDP event names" (spec §4.E), so both share this handler, discriminated
/// by `kind`.
pub(crate) fn handle(store: &mut EntityStore, ev: &DispatchedEvent, kind: SocketKind) {
    let socket = store.socket(ev.source_id, kind);
    apply_address(socket, &ev.params);

    match ev.event_name.as_str() {
        "TCP_CONNECT_ATTEMPT" if kind == SocketKind::Tcp => match ev.phase {
            Phase::Begin => socket.connect_start = Some(ev.time),
            Phase::End => socket.connect_end = Some(ev.time),
            Phase::None => {}
        },
        "UDP_CONNECT" if kind == SocketKind::Udp => {
            socket.connect_start.get_or_insert(ev.time);
            socket.connect_end = Some(ev.time);
        }
        "SSL_CONNECT" => match ev.phase {
            Phase::Begin => socket.ssl_start = Some(ev.time),
            Phase::End => {
                socket.ssl_end = Some(ev.time);
                apply_tls_params(socket, &ev.params);
            }
            Phase::None => {}
        },
        "SOCKET_BYTES_SENT" => accumulate(socket, &ev.params, ev.time, false),
        "SOCKET_BYTES_RECEIVED" => accumulate(socket, &ev.params, ev.time, true),
        "SSL_CERTIFICATES_RECEIVED" => {
            if let Some(certs) = ev.params.get("certificates").and_then(Value::as_array) {
                socket
                    .certificates
                    .extend(certs.iter().filter_map(|v| v.as_str().map(str::to_owned)));
            }
        }
        _ => {}
    }
}

fn apply_address(socket: &mut Socket, params: &Value) {
    if let Some(addr) = params.get("address").and_then(Value::as_str) {
        socket.address = Some(addr.to_string());
    }
    if let Some(addr) = params
        .get("source_address")
        .or_else(|| params.get("local_address"))
        .and_then(Value::as_str)
    {
        socket.source_address = Some(addr.to_string());
    }
}

fn apply_tls_params(socket: &mut Socket, params: &Value) {
    if let Some(v) = params.get("version").and_then(Value::as_str) {
        socket.tls_version = Some(v.to_string());
    }
    if let Some(v) = params.get("is_resumed").and_then(Value::as_bool) {
        socket.tls_resumed = Some(v);
    }
    if let Some(v) = params.get("next_proto").and_then(Value::as_str) {
        socket.tls_next_proto = Some(v.to_string());
    }
    if let Some(v) = params.get("cipher_suite") {
        socket.tls_cipher_suite = Some(match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    }
}

fn accumulate(socket: &mut Socket, params: &Value, time: i64, incoming: bool) {
    let bytes = params.get("byte_count").and_then(Value::as_i64).unwrap_or(0);
    let chunk = Chunk { ts: time, bytes };
    if incoming {
        socket.bytes_in += bytes;
        socket.chunks_in.push(chunk);
    } else {
        socket.bytes_out += bytes;
        socket.chunks_out.push(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ev(name: &str, phase: Phase, time: i64, params: Value) -> DispatchedEvent {
        DispatchedEvent {
            event_name: name.into(),
            source_kind: None,
            phase,
            source_id: 1,
            time,
            params,
        }
    }

    #[test]
    fn tcp_connect_and_ssl_and_bytes() {
        let mut store = EntityStore::new();
        handle(
            &mut store,
            &ev("TCP_CONNECT_ATTEMPT", Phase::Begin, 10, json!({"address": "1.2.3.4:443"})),
            SocketKind::Tcp,
        );
        handle(
            &mut store,
            &ev("TCP_CONNECT_ATTEMPT", Phase::End, 20, json!({})),
            SocketKind::Tcp,
        );
        handle(
            &mut store,
            &ev(
                "SSL_CONNECT",
                Phase::End,
                40,
                json!({"version": "TLS 1.3", "is_resumed": false, "next_proto": "h2", "cipher_suite": 4865}),
            ),
            SocketKind::Tcp,
        );
        handle(
            &mut store,
            &ev("SOCKET_BYTES_RECEIVED", Phase::None, 50, json!({"byte_count": 128})),
            SocketKind::Tcp,
        );
        let socket = &store.sockets[&1];
        assert_eq!(socket.address.as_deref(), Some("1.2.3.4:443"));
        assert_eq!(socket.connect_start, Some(10));
        assert_eq!(socket.connect_end, Some(20));
        assert_eq!(socket.ssl_end, Some(40));
        assert_eq!(socket.tls_version.as_deref(), Some("TLS 1.3"));
        assert_eq!(socket.tls_resumed, Some(false));
        assert_eq!(socket.bytes_in, 128);
        assert_eq!(socket.chunks_in.len(), 1);
    }

    #[test]
    fn udp_socket_uses_udp_event_names() {
        let mut store = EntityStore::new();
        handle(
            &mut store,
            &ev("UDP_CONNECT", Phase::None, 5, json!({"address": "5.6.7.8:443"})),
            SocketKind::Udp,
        );
        handle(
            &mut store,
            &ev("UDP_LOCAL_ADDRESS", Phase::None, 5, json!({"local_address": "10.0.0.1:5000"})),
            SocketKind::Udp,
        );
        let socket = &store.sockets[&1];
        assert_eq!(socket.address.as_deref(), Some("5.6.7.8:443"));
        assert_eq!(socket.source_address.as_deref(), Some("10.0.0.1:5000"));
        assert_eq!(socket.connect_start, Some(5));
    }
}
