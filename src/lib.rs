//! Follow-up agent — networking outreach automation.
//!
//! Reads contact records from a hosted table, decides who is due for
//! follow-up under a status→interval policy, drafts one personalized email
//! per due contact through a generative-text API, and delivers the drafts
//! over SMTP.

pub mod config;
pub mod contact;
pub mod deliver;
pub mod drafter;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod llm;
pub mod pipeline;
pub mod policy;
pub mod secrets;
pub mod server;
pub mod table;
