use netlog_model::SocketKind;
use serde_json::Value;

use crate::dispatch::{DispatchedEvent, Phase};
use crate::store::EntityStore;
use crate::util::ref_id;

/// `CONNECT_JOB`, `SSL_CONNECT_JOB`, `TRANSPORT_CONNECT_JOB`.
pub(crate) fn handle(store: &mut EntityStore, ev: &DispatchedEvent) {
    let job = store.connect_job(ev.source_id, ev.time);
    if let Some(group) = group_name(&ev.params) {
        job.group = Some(group);
    }

    match ev.event_name.as_str() {
        "TRANSPORT_CONNECT_JOB_CONNECT" => match ev.phase {
            Phase::Begin => job.connect_start = Some(ev.time),
            Phase::End => job.connect_end = Some(ev.time),
            Phase::None => {}
        },
        "CONNECT_JOB_SET_SOCKET" => {
            if let Some(socket_id) = ref_id(&ev.params, &["source_dependency", "socket"]) {
                let job = store.connect_job(ev.source_id, ev.time);
                job.socket = Some(socket_id);
                let group = job.group.clone();
                // Connect jobs front TLS and plaintext TCP sockets, never UDP.
                store.socket(socket_id, SocketKind::Tcp).group = group;
            }
        }
        _ => {}
    }
}

fn group_name(params: &Value) -> Option<String> {
    params
        .get("group_name")
        .and_then(Value::as_str)
        .or_else(|| params.get("group_id").and_then(Value::as_str))
        .map(str::to_owned)
}
