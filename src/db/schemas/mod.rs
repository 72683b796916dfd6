//! Database schemas
//!
//! MongoDB document structures for accounts, notices, events, and view
//! records.

mod event;
mod metadata;
mod notice;
mod user;
mod view;

pub use event::{EventDoc, EVENT_COLLECTION, EVENT_VIEW_COLLECTION};
pub use metadata::Metadata;
pub use notice::{NoticeDoc, NOTICE_COLLECTION, NOTICE_VIEW_COLLECTION};
pub use user::{AccountState, UserDoc, USER_COLLECTION};
pub use view::ViewDoc;
