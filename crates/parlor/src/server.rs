//! `Coordinator` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → registry. Each
//! accepted connection gets its own handler task; the reaper runs on
//! its own schedule beside them.

use std::sync::Arc;

use parlor_protocol::JsonCodec;
use parlor_room::{ReaperConfig, Registry, RoomConfig, spawn_reaper};
use parlor_transport::{Transport, WsListener};

use crate::ParlorError;
use crate::handler::handle_connection;

/// Shared state passed to every connection handler task.
pub(crate) struct GatewayState {
    pub(crate) registry: Arc<Registry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a coordinator.
pub struct CoordinatorBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    reaper_config: ReaperConfig,
}

impl CoordinatorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            room_config: RoomConfig::default(),
            reaper_config: ReaperConfig::default(),
        }
    }

    /// Sets the address to bind the WebSocket listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the per-room timing configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Overrides the reaper cadence and TTL.
    pub fn reaper_config(mut self, config: ReaperConfig) -> Self {
        self.reaper_config = config;
        self
    }

    /// Binds the listener and assembles the coordinator.
    pub async fn build(self) -> Result<Coordinator, ParlorError> {
        let listener = WsListener::bind(&self.bind_addr).await?;
        let registry = Arc::new(Registry::new(self.room_config));

        Ok(Coordinator {
            listener,
            state: Arc::new(GatewayState {
                registry,
                codec: JsonCodec,
            }),
            reaper_config: self.reaper_config,
        })
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Parlor coordinator.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct Coordinator {
    listener: WsListener,
    state: Arc<GatewayState>,
    reaper_config: ReaperConfig,
}

impl Coordinator {
    /// Creates a new builder.
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    /// The local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// The room registry, for embedding setups that want to inspect or
    /// sweep rooms directly.
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.state.registry)
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// A faulting connection handler only takes down its own task —
    /// other rooms and connections are unaffected.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!("Parlor coordinator running");

        let _reaper = spawn_reaper(
            Arc::clone(&self.state.registry),
            self.reaper_config.clone(),
        );

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(handle_connection(conn, state));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
