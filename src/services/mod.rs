//! Service layer
//!
//! Each service owns its typed collections and exposes the operations the
//! route layer calls. Services log in terms of their own operations; the
//! route layer owns HTTP translation.

pub mod auth;
pub mod event;
pub mod notice;
pub mod view_tracker;

pub use auth::{AuthService, ExistenceCheck, IssuedToken, PasswordCheck, TokenIdentity};
pub use event::{EventInput, EventItem, EventService};
pub use notice::{NoticeInput, NoticeItem, NoticeService};
pub use view_tracker::{ViewCount, ViewTracker};

/// Current time in ms since epoch, the unit every row timestamp uses
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
