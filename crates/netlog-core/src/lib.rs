//! The entity graph and post-processing pipeline (spec §4, components B-F):
//! decode and route a stream of raw NetLog event objects, accumulate them
//! into a cross-indexed [`EntityStore`], and join that graph into flat
//! [`netlog_model::RequestRecord`]s.

mod constants;
mod dispatch;
mod error;
mod handlers;
mod post;
mod store;
mod util;

pub use constants::ConstantTables;
pub use dispatch::{dispatch, route, DispatchedEvent, HandlerKind, Phase};
pub use error::CoreError;
pub use store::EntityStore;
