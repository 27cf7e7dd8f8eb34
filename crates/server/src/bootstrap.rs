use std::sync::Arc;

use pressy_core::config::AppConfig;
use pressy_slack::{api::SlackClient, events::dispatcher_for_button, ingress::ActionIngress};
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub ingress: Arc<ActionIngress>,
}

/// Wires the validated config into the runtime pieces: one dispatcher, one
/// Web API client, one ingress pipeline.
pub fn bootstrap_with_config(config: AppConfig) -> Application {
    let dispatcher = dispatcher_for_button(&config.button);
    let client = SlackClient::new(config.slack.bot_token.clone());
    let ingress = Arc::new(ActionIngress::new(dispatcher, Arc::new(client)));

    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        handlers = ingress.handler_count(),
        action_id = %config.button.action_id,
        correlation_id = "bootstrap",
        "action dispatcher initialized"
    );

    Application { config, ingress }
}
