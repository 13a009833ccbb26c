//! Domain services for mealtrack: the template-clone orchestrator, the
//! week/day schedule helper, the completion service, the two-week data
//! migration, and bearer-token auth.

pub mod clone;
pub mod completion;
pub mod schedule;
pub mod store;
pub mod token;
pub mod twoweek;
