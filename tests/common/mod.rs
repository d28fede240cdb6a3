//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use learner_gateway::auth::StaticTokens;
use learner_gateway::command::Command;
use learner_gateway::config::GatewayConfig;
use learner_gateway::dispatch::{Mailbox, SubsystemResult};
use learner_gateway::{HttpServer, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Token accepted by every test gateway, and the user it resolves to.
pub const TOKEN: &str = "token-1";
pub const USER: &str = "user-1";

/// A running gateway; dropping it does not stop the server, call `stop`.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    #[allow(dead_code)]
    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway on an ephemeral port, backed by a programmable subsystem.
pub async fn start_gateway<F, Fut>(mut config: GatewayConfig, handler: F) -> TestGateway
where
    F: Fn(Command) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SubsystemResult> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let subsystem = Arc::new(Mailbox::spawn(16, handler));
    let authenticator = Arc::new(StaticTokens::new(HashMap::from([(
        TOKEN.to_string(),
        USER.to_string(),
    )])));

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, subsystem, authenticator);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestGateway { addr, shutdown }
}

/// Start a gateway whose subsystem echoes each command back.
#[allow(dead_code)]
pub async fn start_echo_gateway() -> TestGateway {
    start_echo_gateway_with(GatewayConfig::default()).await
}

/// Echo gateway with a custom configuration.
#[allow(dead_code)]
pub async fn start_echo_gateway_with(config: GatewayConfig) -> TestGateway {
    start_gateway(config, |command| async move { Ok(echo(command)) }).await
}

/// What the echo subsystem replies with.
pub fn echo(command: Command) -> Value {
    json!({
        "operation": command.operation.as_str(),
        "requestedBy": command.requester_id,
        "requestId": command.request_id,
        "request": Value::Object(command.payload.into_json()),
    })
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
