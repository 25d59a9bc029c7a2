//! Command execution with live output publishing

use std::sync::Arc;

use carpark_core::prelude::*;
use carpark_core::{CommandResult, InvocationId, InvocationPhase, LogMessage};
use carpark_runner::{ScriptProcess, ScriptResolver};

use crate::hub::BroadcastHub;
use crate::sensor::SensorPolicy;

/// Resolves command names, runs them and publishes their output.
///
/// Each stdout line is published to the hub before the next one is read, so
/// subscribers observe lines in the order the process produced them.
#[derive(Debug)]
pub struct CommandService {
    resolver: ScriptResolver,
    hub: BroadcastHub,
    sensors: Arc<dyn SensorPolicy>,
}

impl CommandService {
    pub fn new(
        resolver: ScriptResolver,
        hub: BroadcastHub,
        sensors: Arc<dyn SensorPolicy>,
    ) -> Self {
        Self {
            resolver,
            hub,
            sensors,
        }
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn resolver(&self) -> &ScriptResolver {
        &self.resolver
    }

    /// Run `command` to completion.
    ///
    /// On success the result's `value` is the last stdout line (empty if the
    /// process printed nothing).
    #[instrument(skip(self), level = "debug")]
    pub async fn execute(&self, command: &str) -> Result<CommandResult> {
        let mut invocation = Invocation::new(command);
        self.drive(&mut invocation).await
    }

    async fn drive(&self, invocation: &mut Invocation) -> Result<CommandResult> {
        info!(
            invocation_id = %invocation.id,
            command = %invocation.command,
            "Processing command"
        );

        let outcome = self.run(invocation).await;
        match &outcome {
            Ok(result) => {
                invocation.enter(InvocationPhase::Succeeded);
                info!(
                    invocation_id = %invocation.id,
                    sensor_id = %result.sensor_id,
                    value = %result.value,
                    "Command succeeded"
                );
            }
            Err(e) if e.is_recoverable() => {
                invocation.enter(InvocationPhase::Failed);
                warn!(
                    invocation_id = %invocation.id,
                    command = %invocation.command,
                    error = %e,
                    "Command failed"
                );
            }
            Err(e) => {
                invocation.enter(InvocationPhase::Failed);
                error!(
                    invocation_id = %invocation.id,
                    command = %invocation.command,
                    error = ?e,
                    "Command failed"
                );
            }
        }
        debug_assert!(invocation.phase.is_terminal());
        debug!(invocation_id = %invocation.id, trail = ?invocation.trail, "invocation finished");
        outcome
    }

    async fn run(&self, invocation: &mut Invocation) -> Result<CommandResult> {
        invocation.enter(InvocationPhase::Resolving);
        let spec = self.resolver.resolve(&invocation.command)?;

        invocation.enter(InvocationPhase::Running);
        let mut process = ScriptProcess::spawn(spec)?;

        let mut last_line = None;
        while let Some(line) = process.next_line().await? {
            let reached = self
                .hub
                .publish(LogMessage::new(invocation.id, line.clone()));
            trace!(invocation_id = %invocation.id, reached, "published line");
            last_line = Some(line);
        }

        process.finish().await?;

        Ok(CommandResult {
            invocation_id: invocation.id,
            sensor_id: self.sensors.select(&invocation.command),
            value: last_line.unwrap_or_default(),
        })
    }
}

/// Bookkeeping for one `execute` call
struct Invocation {
    id: InvocationId,
    command: String,
    phase: InvocationPhase,
    trail: Vec<InvocationPhase>,
}

impl Invocation {
    fn new(command: &str) -> Self {
        Self {
            id: InvocationId::new(),
            command: command.to_string(),
            phase: InvocationPhase::Idle,
            trail: vec![InvocationPhase::Idle],
        }
    }

    fn enter(&mut self, next: InvocationPhase) {
        debug!(
            invocation_id = %self.id,
            from = %self.phase,
            to = %next,
            "invocation phase"
        );
        self.phase = next;
        self.trail.push(next);
    }
}
