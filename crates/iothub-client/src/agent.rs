//! Device agent: registration state machine and tick loop.
//!
//! The agent owns the record store, the hub client, the identifier
//! registry and the declared nodes, and drives the device's life cycle:
//!
//! ```text
//! UNREGISTERED --(first boot detected)------------------> REGISTERING
//! REGISTERING  --(all nodes registered, ids saved,
//!                 flag set)----------------------------> REGISTERED
//! REGISTERED   --(ids loaded from store on boot)--------> REGISTERED
//! REGISTERED   --(report receives 404)------------------> UNREGISTERED
//! ```
//!
//! REGISTERING is never persisted: power loss mid-registration leaves the
//! boot flag unset and the next boot re-enters registration from scratch.
//! Repeating the handshake may create duplicate hub-side entries; the hub
//! is the only party positioned to deduplicate.

use crate::hub::{validate_name, HubClient, HubError};
use crate::transport::HubTransport;
use iothub_core::{
    Actor, ActorBinding, BootTracker, IdentifierRegistry, KindMismatch, RegistryError,
    RecordStore, StateKind, StoreError,
};
use iothub_protocol::CommandValue;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default pause between reporting ticks.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(30_000);

/// Agent configuration: per-slot sensor names and the reporting cadence.
#[derive(Debug, Clone)]
pub struct AgentConfig<const S: usize> {
    /// Display name for each sensor slot, in slot order.
    pub sensor_names: [String; S],
    /// Sleep between reporting ticks when no actors are configured.
    pub report_interval: Duration,
}

impl<const S: usize> AgentConfig<S> {
    pub fn new(sensor_names: [String; S]) -> Self {
        Self {
            sensor_names,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

/// Errors from agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A sensor slot was configured with an empty name.
    #[error("sensor name must not be empty")]
    EmptyName,

    /// More actors were declared than the compile-time actor count.
    #[error("actor table is full ({capacity} slots)")]
    TooManyActors { capacity: usize },

    /// An inbound command addressed an undeclared actor.
    #[error("no actor named {0:?} is declared")]
    UnknownActor(String),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Kind(#[from] KindMismatch),
}

/// Result of one sensor report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The hub took the reading (any non-404 status).
    Accepted(u16),
    /// The hub answered 404: it no longer recognizes this identifier.
    /// The boot flag has been forced and the caller must restart.
    RegistrationLost,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// An inbound actor command was dispatched.
    Dispatched,
    /// Actors are configured but no command was pending.
    Idle,
    /// Sensor-only node: slept one report interval.
    Slept,
}

/// An inbound command for a named actor.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundCommand {
    pub actor: String,
    pub value: CommandValue,
}

/// Source of inbound actor commands, polled once per tick.
///
/// The web layer (or a test fixture) sits behind this seam; the agent
/// never blocks on it.
pub trait CommandSource {
    fn poll(&mut self) -> Option<InboundCommand>;
}

impl CommandSource for std::collections::VecDeque<InboundCommand> {
    fn poll(&mut self) -> Option<InboundCommand> {
        self.pop_front()
    }
}

/// The device agent.
///
/// Const-generic over the compile-time sensor count `S` and actor count
/// `A`; storage and transport are injected, never ambient.
pub struct DeviceAgent<const S: usize, const A: usize, R: RecordStore, T: HubTransport> {
    store: R,
    hub: HubClient<T>,
    registry: IdentifierRegistry<S, A>,
    sensor_names: [String; S],
    actors: Vec<Actor>,
    report_interval: Duration,
}

impl<const S: usize, const A: usize, R: RecordStore, T: HubTransport> DeviceAgent<S, A, R, T> {
    /// Create the agent and map the durable region.
    ///
    /// `begin` is idempotent, so this is safe to run unconditionally on
    /// every boot.
    pub fn new(config: AgentConfig<S>, mut store: R, transport: T) -> Result<Self, AgentError> {
        store.begin(IdentifierRegistry::<S, A>::region_size())?;
        Ok(Self {
            store,
            hub: HubClient::new(transport),
            registry: IdentifierRegistry::new(),
            sensor_names: config.sensor_names,
            actors: Vec::new(),
            report_interval: config.report_interval,
        })
    }

    /// Declare an actor before registration.
    ///
    /// Validates the name and the static actor capacity; the hub is not
    /// contacted until `register`.
    pub fn add_actor(
        &mut self,
        name: impl Into<String>,
        binding: ActorBinding,
    ) -> Result<(), AgentError> {
        let name = name.into();
        validate_name(&name)?;
        if self.actors.len() >= A {
            return Err(AgentError::TooManyActors { capacity: A });
        }
        self.actors.push(Actor { name, binding });
        Ok(())
    }

    /// Run the registration state machine for this boot.
    ///
    /// First boot: clear the region, register every sensor then every
    /// declared actor by name in slot order, save the table, then set the
    /// boot flag — in that order, so a crash at any point before the flag
    /// write forces a clean re-registration. Resumed boot: load the table
    /// from the store and skip the network entirely.
    pub fn register(&mut self) -> Result<(), AgentError> {
        if BootTracker::is_first_boot(&self.store)? {
            info!("first boot, requesting fresh identifiers from hub");
            if self.sensor_names.first().map(|n| n.is_empty()) == Some(true) {
                return Err(AgentError::EmptyName);
            }

            IdentifierRegistry::<S, A>::clear(&mut self.store)?;

            for index in 0..S {
                let id = self.hub.register_sensor(&self.sensor_names[index])?;
                self.registry.set_sensor_id(index, id.as_str())?;
            }
            for index in 0..self.actors.len() {
                let id = self.hub.register_actor(&self.actors[index].name)?;
                self.registry.set_actor_id(index, id.as_str())?;
            }

            // Table first, flag last: a crash between the two leaves the
            // flag unset, which re-registers on the next boot.
            self.registry.save(&mut self.store)?;
            BootTracker::mark_boot_complete(&mut self.store)?;
            info!("registration complete, identifiers persisted");
        } else {
            info!("resumed boot, loading identifiers from storage");
            self.registry.load(&self.store)?;
        }
        Ok(())
    }

    /// Submit one sensor reading.
    ///
    /// On HTTP 404 the hub has forgotten this identifier: the boot flag
    /// is forced back to the registration sentinel (the in-memory table
    /// is left untouched) and the caller is told to restart.
    pub fn report(&mut self, sensor_index: usize, value: f64) -> Result<ReportOutcome, AgentError> {
        let id = *self.registry.sensor_id(sensor_index)?;
        let status = self.hub.report_value(&id, value)?;
        if status == 404 {
            warn!(
                sensor_index,
                "hub no longer recognizes identifier, forcing re-registration"
            );
            BootTracker::force_first_boot(&mut self.store)?;
            return Ok(ReportOutcome::RegistrationLost);
        }
        debug!(sensor_index, status, "reading accepted");
        Ok(ReportOutcome::Accepted(status))
    }

    /// One pass of the cooperative scheduler.
    ///
    /// With actors configured, polls for at most one pending inbound
    /// command and dispatches it; otherwise a sensor-only node sleeps one
    /// report interval. One class of work per call, never both.
    pub fn tick<C: CommandSource>(&mut self, commands: &mut C) -> Result<TickOutcome, AgentError> {
        if A > 0 {
            match commands.poll() {
                Some(command) => {
                    self.dispatch(command)?;
                    Ok(TickOutcome::Dispatched)
                }
                None => Ok(TickOutcome::Idle),
            }
        } else if S > 0 {
            std::thread::sleep(self.report_interval);
            Ok(TickOutcome::Slept)
        } else {
            Ok(TickOutcome::Idle)
        }
    }

    /// Route an inbound command to the named actor's binding.
    pub fn dispatch(&mut self, command: InboundCommand) -> Result<(), AgentError> {
        let actor = self
            .actors
            .iter_mut()
            .find(|a| a.name == command.actor)
            .ok_or_else(|| AgentError::UnknownActor(command.actor.clone()))?;
        debug!(actor = %actor.name, "dispatching inbound command");
        actor.binding.apply(command.value.into())?;
        Ok(())
    }

    /// Declared actors as (name, kind) pairs, for the command catalog.
    pub fn actor_catalog(&self) -> Vec<(String, StateKind)> {
        self.actors
            .iter()
            .map(|a| (a.name.clone(), a.binding.kind()))
            .collect()
    }

    /// The in-memory identifier table.
    pub fn registry(&self) -> &IdentifierRegistry<S, A> {
        &self.registry
    }

    /// The underlying record store (tests inspect durable state here).
    pub fn store(&self) -> &R {
        &self.store
    }
}
