use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use pressy_core::config::ButtonConfig;
use serde::Deserialize;
use thiserror::Error;

/// A single button click extracted from a `block_actions` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub channel_id: String,
    pub message_ts: Option<String>,
    pub user_id: String,
    pub action_id: String,
    pub value: Option<String>,
    pub response_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

/// The text reply a handler wants delivered back into a conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundReply {
    pub channel: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Replied(OutboundReply),
    Ignored,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("action handler failure: {0}")]
    Handler(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("interaction form body could not be decoded: {0}")]
    Form(String),
    #[error("interaction payload is not valid JSON: {0}")]
    Json(String),
    #[error("interaction payload is missing its `payload` field")]
    MissingPayload,
    #[error("block_actions payload is missing `{0}`")]
    MissingField(&'static str),
}

/// The interaction shapes the ingress endpoint distinguishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundInteraction {
    BlockActions { trigger_id: Option<String>, events: Vec<BlockActionEvent> },
    SslCheck,
    Unsupported { payload_type: String },
}

#[derive(Debug, Deserialize)]
struct InteractionForm {
    payload: Option<String>,
    ssl_check: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InteractionPayload {
    #[serde(rename = "type")]
    payload_type: String,
    #[serde(default)]
    actions: Vec<RawAction>,
    channel: Option<ChannelRef>,
    user: Option<UserRef>,
    message: Option<MessageRef>,
    #[serde(default)]
    trigger_id: Option<String>,
    #[serde(default)]
    response_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    ts: String,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    action_id: String,
    #[serde(default)]
    value: Option<String>,
}

/// Decodes an interaction request body (`application/x-www-form-urlencoded`
/// with a JSON `payload` field) into the shapes the ingress cares about.
pub fn parse_interaction_body(body: &str) -> Result<InboundInteraction, PayloadError> {
    let form: InteractionForm =
        serde_urlencoded::from_str(body).map_err(|error| PayloadError::Form(error.to_string()))?;

    if form.ssl_check.is_some() {
        return Ok(InboundInteraction::SslCheck);
    }

    let raw_payload = form.payload.ok_or(PayloadError::MissingPayload)?;
    let payload: InteractionPayload = serde_json::from_str(&raw_payload)
        .map_err(|error| PayloadError::Json(error.to_string()))?;

    if payload.payload_type != "block_actions" {
        return Ok(InboundInteraction::Unsupported { payload_type: payload.payload_type });
    }

    let channel_id = payload.channel.ok_or(PayloadError::MissingField("channel"))?.id;
    let user_id = payload.user.ok_or(PayloadError::MissingField("user"))?.id;
    let message_ts = payload.message.map(|message| message.ts);
    let response_url = payload.response_url;

    let events = payload
        .actions
        .into_iter()
        .map(|action| BlockActionEvent {
            channel_id: channel_id.clone(),
            message_ts: message_ts.clone(),
            user_id: user_id.clone(),
            action_id: action.action_id,
            value: action.value,
            response_url: response_url.clone(),
        })
        .collect();

    Ok(InboundInteraction::BlockActions { trigger_id: payload.trigger_id, events })
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn action_id(&self) -> &str;
    async fn handle(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

/// Routes block actions to handlers by action id. The map is populated once
/// at startup; unknown action ids resolve to `Ignored` without touching any
/// handler.
#[derive(Default)]
pub struct ActionDispatcher {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: ActionHandler + 'static,
    {
        let action_id = handler.action_id().to_owned();
        self.handlers.insert(action_id, Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(event.action_id.as_str()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(event, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Answers a single configured button with a fixed text reply. Stateless: a
/// redelivered event produces a second identical reply.
pub struct StaticReplyHandler {
    action_id: String,
    reply_text: String,
}

impl StaticReplyHandler {
    pub fn new(action_id: impl Into<String>, reply_text: impl Into<String>) -> Self {
        Self { action_id: action_id.into(), reply_text: reply_text.into() }
    }

    pub fn from_config(button: &ButtonConfig) -> Self {
        Self::new(button.action_id.clone(), button.reply_text.clone())
    }
}

#[async_trait]
impl ActionHandler for StaticReplyHandler {
    fn action_id(&self) -> &str {
        &self.action_id
    }

    async fn handle(
        &self,
        event: &BlockActionEvent,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        Ok(HandlerResult::Replied(OutboundReply {
            channel: event.channel_id.clone(),
            text: self.reply_text.clone(),
        }))
    }
}

/// Builds the startup dispatcher: one handler, keyed by the configured
/// button's action id.
pub fn dispatcher_for_button(button: &ButtonConfig) -> ActionDispatcher {
    let mut dispatcher = ActionDispatcher::new();
    dispatcher.register(StaticReplyHandler::from_config(button));
    dispatcher
}

#[cfg(test)]
mod tests {
    use pressy_core::config::ButtonConfig;

    use super::{
        dispatcher_for_button, parse_interaction_body, ActionDispatcher, BlockActionEvent,
        EventContext, HandlerResult, InboundInteraction, PayloadError, StaticReplyHandler,
    };

    fn button() -> ButtonConfig {
        ButtonConfig {
            action_id: "of_course_button".to_owned(),
            reply_text: "Oh! That's my type of guy :star-struck:".to_owned(),
        }
    }

    fn click(action_id: &str) -> BlockActionEvent {
        BlockActionEvent {
            channel_id: "C123".to_owned(),
            message_ts: Some("1730000000.1000".to_owned()),
            user_id: "U1".to_owned(),
            action_id: action_id.to_owned(),
            value: None,
            response_url: None,
        }
    }

    fn form_body(payload: &serde_json::Value) -> String {
        serde_urlencoded::to_string([("payload", payload.to_string())])
            .expect("form body should encode")
    }

    #[tokio::test]
    async fn dispatcher_replies_to_the_registered_action() {
        let dispatcher = dispatcher_for_button(&button());

        let result = dispatcher
            .dispatch(&click("of_course_button"), &EventContext::default())
            .await
            .expect("dispatch");

        let HandlerResult::Replied(reply) = result else {
            panic!("registered action should produce a reply");
        };
        assert_eq!(reply.channel, "C123");
        assert_eq!(reply.text, "Oh! That's my type of guy :star-struck:");
    }

    #[tokio::test]
    async fn dispatcher_ignores_unregistered_actions() {
        let dispatcher = dispatcher_for_button(&button());

        let result = dispatcher
            .dispatch(&click("some_other_button"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[tokio::test]
    async fn empty_dispatcher_ignores_everything() {
        let dispatcher = ActionDispatcher::new();

        let result = dispatcher
            .dispatch(&click("of_course_button"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
        assert_eq!(dispatcher.handler_count(), 0);
    }

    #[test]
    fn startup_dispatcher_registers_exactly_one_handler() {
        let dispatcher = dispatcher_for_button(&button());
        assert_eq!(dispatcher.handler_count(), 1);
    }

    #[tokio::test]
    async fn reply_text_follows_the_configured_variant() {
        let variant = ButtonConfig {
            action_id: "of_course_button".to_owned(),
            reply_text: "Yeah! That's my guy :star-struck:".to_owned(),
        };
        let dispatcher = dispatcher_for_button(&variant);

        let result = dispatcher
            .dispatch(&click("of_course_button"), &EventContext::default())
            .await
            .expect("dispatch");

        let HandlerResult::Replied(reply) = result else {
            panic!("registered action should produce a reply");
        };
        assert_eq!(reply.text, "Yeah! That's my guy :star-struck:");
    }

    #[tokio::test]
    async fn handler_reports_its_action_id() {
        use super::ActionHandler;

        let handler = StaticReplyHandler::from_config(&button());
        assert_eq!(handler.action_id(), "of_course_button");
    }

    #[test]
    fn parses_a_block_actions_payload() {
        let payload = serde_json::json!({
            "type": "block_actions",
            "trigger_id": "13345224609.738474920.8088930838d88f008e0",
            "channel": { "id": "C123", "name": "general" },
            "user": { "id": "U1", "username": "someone" },
            "message": { "ts": "1730000000.1000" },
            "response_url": "https://hooks.slack.com/actions/T1/2/3",
            "actions": [{
                "action_id": "of_course_button",
                "type": "button",
                "value": "yes"
            }]
        });

        let parsed = parse_interaction_body(&form_body(&payload)).expect("parse");

        let InboundInteraction::BlockActions { trigger_id, events } = parsed else {
            panic!("expected block actions");
        };
        assert_eq!(trigger_id.as_deref(), Some("13345224609.738474920.8088930838d88f008e0"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel_id, "C123");
        assert_eq!(events[0].user_id, "U1");
        assert_eq!(events[0].action_id, "of_course_button");
        assert_eq!(events[0].value.as_deref(), Some("yes"));
        assert_eq!(events[0].message_ts.as_deref(), Some("1730000000.1000"));
    }

    #[test]
    fn parses_an_action_without_value_or_message() {
        let payload = serde_json::json!({
            "type": "block_actions",
            "channel": { "id": "C9" },
            "user": { "id": "U9" },
            "actions": [{ "action_id": "of_course_button", "type": "button" }]
        });

        let parsed = parse_interaction_body(&form_body(&payload)).expect("parse");

        let InboundInteraction::BlockActions { events, .. } = parsed else {
            panic!("expected block actions");
        };
        assert_eq!(events[0].value, None);
        assert_eq!(events[0].message_ts, None);
        assert_eq!(events[0].response_url, None);
    }

    #[test]
    fn ssl_check_probe_is_recognized() {
        let parsed =
            parse_interaction_body("ssl_check=1&token=legacy-token").expect("parse ssl_check");
        assert_eq!(parsed, InboundInteraction::SslCheck);
    }

    #[test]
    fn non_block_actions_payloads_are_unsupported_not_errors() {
        let payload = serde_json::json!({
            "type": "view_submission",
            "view": { "id": "V1" }
        });

        let parsed = parse_interaction_body(&form_body(&payload)).expect("parse");

        assert_eq!(
            parsed,
            InboundInteraction::Unsupported { payload_type: "view_submission".to_owned() }
        );
    }

    #[test]
    fn missing_payload_field_is_an_error() {
        let error = parse_interaction_body("token=legacy-token").expect_err("should fail");
        assert_eq!(error, PayloadError::MissingPayload);
    }

    #[test]
    fn block_actions_without_channel_is_an_error() {
        let payload = serde_json::json!({
            "type": "block_actions",
            "user": { "id": "U1" },
            "actions": []
        });

        let error = parse_interaction_body(&form_body(&payload)).expect_err("should fail");
        assert_eq!(error, PayloadError::MissingField("channel"));
    }

    #[test]
    fn undecodable_payload_json_is_an_error() {
        let error =
            parse_interaction_body("payload=not-json").expect_err("should fail");
        assert!(matches!(error, PayloadError::Json(_)));
    }
}
