pub mod membership;
pub mod notification;
pub mod organization;
pub mod presence;
pub mod user;

pub use membership::{MemberRole, Membership};
pub use notification::{Notification, NotificationKind, NotificationStatus};
pub use organization::{OrgKind, Organization, Plan};
pub use presence::{CustomSlot, PresenceStatus, StatusTag};
pub use user::User;
