//! Domain types.

mod list;
mod sync;

pub use list::{ListQuery, ListRecord};
pub use sync::{PullResult, PushOptions, PushResult};
