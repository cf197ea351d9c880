use crate::dispatch::DispatchedEvent;
use crate::store::EntityStore;
use crate::util::ref_id;

/// `HTTP_STREAM_JOB`.
pub(crate) fn handle(store: &mut EntityStore, ev: &DispatchedEvent) {
    match ev.event_name.as_str() {
        "HTTP_STREAM_REQUEST_STARTED_JOB" => {
            store.stream_job(ev.source_id, ev.time).created = ev.time;
        }
        "TCP_CLIENT_SOCKET_POOL_REQUESTED_SOCKET" => {
            store.stream_job(ev.source_id, ev.time).socket_start = Some(ev.time);
        }
        "SOCKET_POOL_BOUND_TO_SOCKET" => {
            if let Some(socket_id) = ref_id(&ev.params, &["source_dependency", "socket"]) {
                let job = store.stream_job(ev.source_id, ev.time);
                job.socket_end = Some(ev.time);
                job.socket = Some(socket_id);
                let group = job.group.clone();
                if let Some(request_id) = store.stream_jobs[&ev.source_id].url_request {
                    let request = store.url_request(request_id, ev.time);
                    request.socket = Some(socket_id);
                    request.group = group;
                }
            }
        }
        "HTTP_STREAM_JOB_BOUND_TO_REQUEST" => {
            if let Some(request_id) = ref_id(&ev.params, &["source_dependency"]) {
                let job = store.stream_job(ev.source_id, ev.time);
                job.url_request = Some(request_id);
                let (group, socket, h2_session) = (job.group.clone(), job.socket, job.h2_session);
                let request = store.url_request(request_id, ev.time);
                request.group = group;
                request.socket = socket;
                request.h2_session = h2_session;
            }
        }
        "HTTP2_SESSION_POOL_IMPORTED_SESSION_FROM_SOCKET"
        | "HTTP2_SESSION_POOL_FOUND_EXISTING_SESSION"
        | "HTTP2_SESSION_POOL_FOUND_EXISTING_SESSION_FROM_IP_POOL" => {
            if let Some(session_id) = ref_id(&ev.params, &["source_dependency", "session"]) {
                let job = store.stream_job(ev.source_id, ev.time);
                job.h2_session = Some(session_id);
                let socket = store.h2_sessions.get(&session_id).and_then(|s| s.socket);
                if socket.is_some() {
                    store.stream_job(ev.source_id, ev.time).socket = socket;
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Phase;
    use serde_json::json;

    fn ev(name: &str, id: i64, time: i64, params: serde_json::Value) -> DispatchedEvent {
        DispatchedEvent {
            event_name: name.into(),
            source_kind: None,
            phase: Phase::None,
            source_id: id,
            time,
            params,
        }
    }

    #[test]
    fn bound_to_request_propagates_group_socket_and_session() {
        let mut store = EntityStore::new();
        store.stream_job(1, 0).group = Some("example.com:443".into());
        store.stream_job(1, 0).socket = Some(7);
        store.stream_job(1, 0).h2_session = Some(8);
        handle(
            &mut store,
            &ev(
                "HTTP_STREAM_JOB_BOUND_TO_REQUEST",
                1,
                5,
                json!({"source_dependency": {"id": "42"}}),
            ),
        );
        let request = &store.url_requests[&42];
        assert_eq!(request.group.as_deref(), Some("example.com:443"));
        assert_eq!(request.socket, Some(7));
        assert_eq!(request.h2_session, Some(8));
    }

    #[test]
    fn bound_to_socket_updates_already_bound_request() {
        let mut store = EntityStore::new();
        store.stream_job(1, 0).url_request = Some(42);
        store.stream_job(1, 0).group = Some("example.com:443".into());
        store.url_request(42, 0);
        handle(
            &mut store,
            &ev(
                "SOCKET_POOL_BOUND_TO_SOCKET",
                1,
                5,
                json!({"source_dependency": {"id": "9"}}),
            ),
        );
        assert_eq!(store.stream_jobs[&1].socket, Some(9));
        assert_eq!(store.url_requests[&42].socket, Some(9));
    }

    #[test]
    fn existing_h2_session_lends_its_socket_to_the_job() {
        let mut store = EntityStore::new();
        store.h2_session(8).socket = Some(77);
        handle(
            &mut store,
            &ev(
                "HTTP2_SESSION_POOL_FOUND_EXISTING_SESSION",
                1,
                5,
                json!({"source_dependency": {"id": "8"}}),
            ),
        );
        assert_eq!(store.stream_jobs[&1].h2_session, Some(8));
        assert_eq!(store.stream_jobs[&1].socket, Some(77));
    }
}
