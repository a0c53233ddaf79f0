//! Publish pipeline for exported sites.
//!
//! Binds the delivery subsystem into one operation: zip the configured
//! source directory, upload it to Netlify, poll until the deploy is live,
//! then open the published page in the browser.

mod pipeline;
mod settings;
mod wait;

pub use pipeline::{OpenUrl, Publisher, PublishError};
pub use settings::{PublishSettings, SettingsError};
pub use wait::wait_until;
