//! Domain values - what goes into a check and what comes out.

mod decision;
mod policy;

pub use decision::Decision;
pub use policy::RateLimitPolicy;
