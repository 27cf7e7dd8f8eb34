//! Slack Integration - HTTP interaction interface
//!
//! This crate provides the Slack interface for pressy:
//! - **Signature** (`signature`) - v0 request signing verification
//! - **Events** (`events`) - interaction payload parsing and action dispatch
//! - **Ingress** (`ingress`) - dispatch-and-reply pipeline
//! - **Web API** (`api`) - `chat.postMessage` client
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Interactivity and point the request URL at `/slack/actions`
//! 3. Add a button whose `action_id` matches the configured one
//! 4. Set env vars: `SLACK_BOT_TOKEN`, `SLACK_SIGNING_SECRET`
//!
//! # Architecture
//!
//! ```text
//! Slack Interaction POST → signature check → ActionDispatcher → Handler
//!                                                  ↓
//!                                     chat.postMessage ← Reply
//! ```
//!
//! # Key Types
//!
//! - `ActionDispatcher` - Routes block actions to handlers by action id
//! - `StaticReplyHandler` - Answers a configured button with a fixed reply
//! - `ActionIngress` - Runs dispatch and posts the resulting reply
//! - `SlackClient` - Thin Web API client carrying the bot token

pub mod api;
pub mod events;
pub mod ingress;
pub mod signature;
