//! One handler module per source-kind (spec §4.E). Each exposes a single
//! `handle` function that mutates the [`crate::store::EntityStore`] in
//! response to one dispatched event; cross-entity links are resolved via
//! `source_dependency` ids, never by fabricating the referenced entity
//! beyond its natural lazily-created shape.

pub(crate) mod connect_job;
pub(crate) mod disk_cache;
pub(crate) mod dns;
pub(crate) mod h2;
pub(crate) mod quic;
pub(crate) mod socket;
pub(crate) mod stream_job;
pub(crate) mod url_request;
