//! Bulk domain onboarding for Cloudflare.
//!
//! Reads a list of domains, creates a zone for each registrable domain,
//! points a proxied A record at a target IP and toggles the zone's HTTPS
//! settings. See the `cfzones` binary for the command-line entry points.

pub mod batch;
pub mod config;
pub mod dns;
pub mod domains;
pub mod secrets;
