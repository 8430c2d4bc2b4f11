use iothub_client::{
    AgentConfig, DeviceAgent, HttpReply, HubTransport, ReportOutcome, TickOutcome, TransportError,
};
use iothub_core::{ActorBinding, FileRecordStore};
use iothub_web::{command_channel, create_router, ActorInfo, AppState, CommandQueue};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Compile-time node shape: two sensors, one actor.
const SENSOR_COUNT: usize = 2;
const ACTOR_COUNT: usize = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,iothub_client=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("IoT hub node starting...");

    let settings = NodeSettings::from_env()?;
    tracing::info!(
        "   Hub:         http://{}:{}",
        settings.hub_host,
        settings.hub_port
    );
    tracing::info!("   Region file: {}", settings.store_path);
    tracing::info!("   Command API: http://{}", settings.listen_addr);

    let store = FileRecordStore::new(&settings.store_path);
    let transport = ReqwestTransport::new(&settings.hub_host, settings.hub_port);

    let mut config = AgentConfig::new(["temp".to_string(), "humidity".to_string()]);
    config.report_interval = Duration::from_millis(settings.report_interval_ms);
    let report_interval = config.report_interval;

    let mut agent: DeviceAgent<SENSOR_COUNT, ACTOR_COUNT, _, _> =
        DeviceAgent::new(config, store, transport)?;
    agent.add_actor(
        "workshop-lamp",
        ActorBinding::Bool {
            state: false,
            on_update: Box::new(|on| tracing::info!(on, "workshop lamp switched")),
        },
    )?;

    // Command API shares nothing with the agent but the bounded queue.
    let (command_tx, command_queue) = command_channel(16);
    let catalog: Vec<ActorInfo> = agent
        .actor_catalog()
        .into_iter()
        .map(|(name, kind)| ActorInfo { name, kind })
        .collect();
    let state = AppState {
        node_name: "iothub-node".to_string(),
        actors: Arc::new(catalog),
        commands: command_tx,
    };

    let listen_addr = settings.listen_addr;
    let web_handle = tokio::spawn(async move {
        if let Err(e) = serve_commands(listen_addr, create_router(state)).await {
            tracing::error!("command API server error: {}", e);
        }
    });

    // The agent is synchronous and blocking by design; give it a thread.
    let agent_handle =
        tokio::task::spawn_blocking(move || run_agent(agent, command_queue, report_interval));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        result = agent_handle => {
            if let Err(e) = result? {
                tracing::error!("agent loop error: {}", e);
            }
        }
        _ = web_handle => {
            tracing::warn!("command API server stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Bind and serve the inbound command API.
async fn serve_commands(addr: SocketAddr, app: axum::Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("command API listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// The device life cycle: register, then report and serve commands until
/// registration is lost, then re-register — the restart path a
/// microcontroller would take by rebooting.
fn run_agent(
    mut agent: DeviceAgent<SENSOR_COUNT, ACTOR_COUNT, FileRecordStore, ReqwestTransport>,
    mut commands: CommandQueue,
    report_interval: Duration,
) -> anyhow::Result<()> {
    let started = Instant::now();
    loop {
        agent.register()?;

        let mut last_report: Option<Instant> = None;
        'registered: loop {
            let due = last_report.map_or(true, |t| t.elapsed() >= report_interval);
            if due {
                for (index, &value) in demo_readings(started.elapsed()).iter().enumerate() {
                    match agent.report(index, value) {
                        Ok(ReportOutcome::Accepted(status)) => {
                            tracing::debug!(index, value, status, "reading accepted");
                        }
                        Ok(ReportOutcome::RegistrationLost) => {
                            tracing::warn!("hub lost our registration, re-running first boot");
                            break 'registered;
                        }
                        // Transient transport trouble: retried next interval.
                        Err(e) => tracing::error!("report failed: {}", e),
                    }
                }
                last_report = Some(Instant::now());
            }

            match agent.tick(&mut commands) {
                Ok(TickOutcome::Idle) => std::thread::sleep(Duration::from_millis(20)),
                Ok(_) => {}
                Err(e) => tracing::warn!("command dispatch failed: {}", e),
            }
        }
    }
}

/// Simulated sensor readings: a slowly drifting bench environment.
fn demo_readings(uptime: Duration) -> [f64; SENSOR_COUNT] {
    let t = uptime.as_secs_f64();
    let temp = 21.5 + (t / 60.0).sin() * 0.8;
    let humidity = 48.0 + (t / 90.0).cos() * 2.5;
    [temp, humidity]
}

/// Node configuration read from the environment.
#[derive(Debug, Clone)]
struct NodeSettings {
    hub_host: String,
    hub_port: u16,
    store_path: String,
    listen_addr: SocketAddr,
    report_interval_ms: u64,
}

impl NodeSettings {
    fn from_env() -> anyhow::Result<Self> {
        use anyhow::Context;

        let hub_host = std::env::var("IOTHUB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let hub_port = std::env::var("IOTHUB_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("IOTHUB_PORT must be a port number")?;
        let store_path =
            std::env::var("IOTHUB_STORE").unwrap_or_else(|_| "iothub-region.bin".to_string());
        let listen_addr = std::env::var("IOTHUB_LISTEN")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("IOTHUB_LISTEN must be a socket address")?;
        let report_interval_ms = std::env::var("IOTHUB_REPORT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse()
            .context("IOTHUB_REPORT_MS must be milliseconds")?;

        Ok(Self {
            hub_host,
            hub_port,
            store_path,
            listen_addr,
            report_interval_ms,
        })
    }
}

/// `HubTransport` over a blocking reqwest client.
///
/// The client is built lazily on first use so it is always constructed on
/// the agent's blocking thread, never inside the async runtime.
struct ReqwestTransport {
    base: String,
    client: Option<reqwest::blocking::Client>,
}

impl ReqwestTransport {
    fn new(host: &str, port: u16) -> Self {
        Self {
            base: format!("http://{}:{}", host, port),
            client: None,
        }
    }

    fn client(&mut self) -> &reqwest::blocking::Client {
        self.client
            .get_or_insert_with(reqwest::blocking::Client::new)
    }
}

impl HubTransport for ReqwestTransport {
    fn post_json(&mut self, path: &str, body: &str) -> Result<HttpReply, TransportError> {
        let url = format!("{}{}", self.base, path);
        let response = self
            .client()
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| TransportError(e.to_string()))?;
        Ok(HttpReply { status, body })
    }

    fn get(&mut self, path: &str) -> Result<HttpReply, TransportError> {
        let url = format!("{}{}", self.base, path);
        let response = self
            .client()
            .get(url)
            .send()
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| TransportError(e.to_string()))?;
        Ok(HttpReply { status, body })
    }
}
