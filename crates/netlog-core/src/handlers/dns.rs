use netlog_model::DnsJob;
use serde_json::Value;

use crate::dispatch::{DispatchedEvent, Phase};
use crate::store::EntityStore;
use crate::util::source_dependency_id;

/// `HOST_RESOLVER_IMPL_JOB` and any event whose name begins `HOST_RESOLVER`.
pub(crate) fn handle(store: &mut EntityStore, ev: &DispatchedEvent) {
    let job = store.dns_job(ev.source_id);
    apply_params(job, &ev.params);

    match ev.event_name.as_str() {
        "HOST_RESOLVER_IMPL_REQUEST" => match ev.phase {
            Phase::Begin => extend_start(job, ev.time),
            Phase::End => extend_end(job, ev.time),
            Phase::None => {}
        },
        "HOST_RESOLVER_IMPL_ATTEMPT_STARTED" => {
            if job.start.is_none() {
                job.start = Some(ev.time);
            }
            job.times.push((ev.time, ev.time));
        }
        "HOST_RESOLVER_IMPL_ATTEMPT_FINISHED" => {
            if job.end.is_none() {
                job.end = Some(ev.time);
            }
            if let Some(last) = job.times.last_mut() {
                last.1 = ev.time;
            }
        }
        "HOST_RESOLVER_IMPL_CACHE_HIT" => extend_end(job, ev.time),
        _ => {}
    }

    if let Some(connect_job_id) = source_dependency_id(&ev.params) {
        store.connect_job(connect_job_id, ev.time).dns = Some(ev.source_id);
    }
}

/// Earliest BEGIN wins (spec §4.E).
fn extend_start(job: &mut DnsJob, time: i64) {
    job.start = Some(job.start.map_or(time, |existing| existing.min(time)));
}

/// Latest END wins.
fn extend_end(job: &mut DnsJob, time: i64) {
    job.end = Some(job.end.map_or(time, |existing| existing.max(time)));
}

fn apply_params(job: &mut DnsJob, params: &Value) {
    if let Some(host) = params.get("host").and_then(Value::as_str) {
        job.host = Some(host.to_string());
    }
    if let Some(list) = params.get("address_list").and_then(Value::as_array) {
        job.address_list = list
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerKind, route};
    use serde_json::json;

    fn begin(time: i64, source_id: i64) -> DispatchedEvent {
        DispatchedEvent {
            event_name: "HOST_RESOLVER_IMPL_REQUEST".into(),
            source_kind: None,
            phase: Phase::Begin,
            source_id,
            time,
            params: json!({"host": "example.com"}),
        }
    }

    fn end(time: i64, source_id: i64) -> DispatchedEvent {
        DispatchedEvent {
            event_name: "HOST_RESOLVER_IMPL_REQUEST".into(),
            source_kind: None,
            phase: Phase::End,
            source_id,
            time,
            params: json!({"address_list": ["1.2.3.4"]}),
        }
    }

    #[test]
    fn earliest_begin_and_latest_end_win() {
        let mut store = EntityStore::new();
        handle(&mut store, &begin(100, 1));
        handle(&mut store, &begin(50, 1));
        handle(&mut store, &end(200, 1));
        handle(&mut store, &end(150, 1));
        let job = &store.dns_jobs[&1];
        assert_eq!(job.start, Some(50));
        assert_eq!(job.end, Some(200));
        assert_eq!(job.host.as_deref(), Some("example.com"));
        assert_eq!(job.address_list, vec!["1.2.3.4".to_string()]);
    }

    #[test]
    fn host_resolver_prefix_routes_here_even_with_other_source_kind() {
        assert_eq!(
            route("HOST_RESOLVER_IMPL_ATTEMPT_STARTED", Some("URL_REQUEST")),
            Some(HandlerKind::Dns)
        );
    }

    #[test]
    fn links_onto_connect_job_via_source_dependency() {
        let mut store = EntityStore::new();
        let ev = DispatchedEvent {
            event_name: "HOST_RESOLVER_IMPL_JOB".into(),
            source_kind: None,
            phase: Phase::None,
            source_id: 9,
            time: 10,
            params: json!({"source_dependency": {"id": "3", "type": 1}}),
        };
        handle(&mut store, &ev);
        assert_eq!(store.connect_jobs[&3].dns, Some(9));
    }
}
