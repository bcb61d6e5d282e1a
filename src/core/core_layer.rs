// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "urls/url_classifier.rs"]
pub mod urls;

#[path = "media/image_detector.rs"]
pub mod media;

#[path = "blocklist/blocklist_service.rs"]
pub mod blocklist;

#[path = "references/mod.rs"]
pub mod references;

#[path = "policy/mod.rs"]
pub mod policy;
