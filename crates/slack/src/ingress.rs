use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    api::ApiError,
    events::{
        ActionDispatcher, BlockActionEvent, DispatchError, EventContext, HandlerResult,
        OutboundReply,
    },
};

#[derive(Debug, Error)]
pub enum IngressError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Reply(#[from] ApiError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngressOutcome {
    Replied,
    Ignored,
}

#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(&self, reply: &OutboundReply) -> Result<(), ApiError>;
}

/// Runs one inbound block action through dispatch and, when a handler
/// responds, posts the reply. The acknowledgment is owned by the HTTP layer;
/// by the time an event reaches this pipeline it has already been acked.
pub struct ActionIngress {
    dispatcher: ActionDispatcher,
    sender: Arc<dyn ReplySender>,
}

impl ActionIngress {
    pub fn new(dispatcher: ActionDispatcher, sender: Arc<dyn ReplySender>) -> Self {
        Self { dispatcher, sender }
    }

    pub fn handler_count(&self) -> usize {
        self.dispatcher.handler_count()
    }

    pub async fn process(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<IngressOutcome, IngressError> {
        info!(
            event_name = "ingress.slack.action_received",
            action_id = %event.action_id,
            channel_id = %event.channel_id,
            correlation_id = %ctx.correlation_id,
            "received block action"
        );

        match self.dispatcher.dispatch(event, ctx).await? {
            HandlerResult::Replied(reply) => {
                self.sender.send_reply(&reply).await?;
                info!(
                    event_name = "ingress.slack.reply_posted",
                    action_id = %event.action_id,
                    channel_id = %reply.channel,
                    correlation_id = %ctx.correlation_id,
                    "posted reply"
                );
                Ok(IngressOutcome::Replied)
            }
            HandlerResult::Ignored => {
                debug!(
                    event_name = "ingress.slack.action_ignored",
                    action_id = %event.action_id,
                    correlation_id = %ctx.correlation_id,
                    "no handler registered for action"
                );
                Ok(IngressOutcome::Ignored)
            }
        }
    }
}
