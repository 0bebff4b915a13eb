pub mod git;
pub mod ratelimit;
pub mod session;

pub use git::{GitState, GitStatusSnapshot};
pub use ratelimit::{ExtraUsage, RateLimitSnapshot, RateLimits, UsageWindow};
pub use session::SessionSnapshot;
