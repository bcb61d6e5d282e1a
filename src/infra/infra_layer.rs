// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "tracker/github_client.rs"]
pub mod tracker;

#[path = "blocklist/http_source.rs"]
pub mod blocklist;
