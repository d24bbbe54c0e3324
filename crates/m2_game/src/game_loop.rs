//! The simulation thread.
//!
//! One thread owns the [`World`]. Each iteration it applies queued input,
//! steps the world, publishes a snapshot and then suspends for the rest of
//! the frame budget. Input that arrives during the suspension is applied
//! immediately and the wait resumes until the same deadline.
//!
//! Waking up far past the deadline is treated as an interruption of the
//! loop: a [`LoopFault`] is published and the thread blocks until the UI
//! acknowledges it (or asks for shutdown), then resumes pacing.

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use m2_core::input::Key;
use m2_core::time::FramePacer;

use crate::world::{World, WorldSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    Key { key: Key, pressed: bool },
    AcknowledgeFault,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopFault {
    Stalled { late_by: Duration },
}

impl fmt::Display for LoopFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopFault::Stalled { late_by } => write!(
                f,
                "The game loop was interrupted: it resumed {} ms after its scheduled frame.",
                late_by.as_millis()
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SimEvent {
    Frame(Box<WorldSnapshot>),
    Fault(LoopFault),
}

/// Where the simulation publishes its events. `false` means nobody is
/// listening any more and the loop should end.
pub trait EventSink: Send + 'static {
    fn publish(&self, event: SimEvent) -> bool;
}

impl EventSink for Sender<SimEvent> {
    fn publish(&self, event: SimEvent) -> bool {
        self.send(event).is_ok()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    pub pacer: FramePacer,
    /// Overshoot past a deadline at or beyond which the loop reports a stall
    pub stall_threshold: Duration,
}

impl LoopConfig {
    pub fn new(frame_rate: u32, stall_threshold: Duration) -> Self {
        Self {
            pacer: FramePacer::from_frame_rate(frame_rate),
            stall_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// `Some` when waking at `woke_at` for `deadline` counts as a stall.
pub fn detect_stall(deadline: Instant, woke_at: Instant, threshold: Duration) -> Option<LoopFault> {
    let late_by = woke_at.saturating_duration_since(deadline);
    (late_by >= threshold).then_some(LoopFault::Stalled { late_by })
}

pub struct Simulation<S: EventSink> {
    world: World,
    commands: Receiver<SimCommand>,
    sink: S,
    config: LoopConfig,
}

/// Start the simulation thread. The returned sender feeds it input; joining
/// the handle yields the world after shutdown.
pub fn spawn_simulation<S: EventSink>(
    world: World,
    config: LoopConfig,
    sink: S,
) -> Result<(Sender<SimCommand>, JoinHandle<World>), String> {
    let (tx, rx) = mpsc::channel();
    let simulation = Simulation {
        world,
        commands: rx,
        sink,
        config,
    };
    let handle = thread::Builder::new()
        .name("m2-simulation".to_string())
        .spawn(move || simulation.run())
        .map_err(|e| format!("Failed to spawn simulation thread: {e}"))?;
    Ok((tx, handle))
}

impl<S: EventSink> Simulation<S> {
    pub fn run(mut self) -> World {
        log::info!(
            "Simulation started: frame budget {} ms, stall threshold {} ms",
            self.config.pacer.frame_time().as_millis(),
            self.config.stall_threshold.as_millis()
        );
        let mut last_step = Instant::now();
        loop {
            let frame_start = Instant::now();
            if self.drain_commands() == Flow::Stop {
                break;
            }

            self.world.step(frame_start - last_step);
            last_step = frame_start;

            if !self
                .sink
                .publish(SimEvent::Frame(Box::new(self.world.snapshot())))
            {
                log::info!("Event sink closed, stopping simulation");
                break;
            }

            let sleep = self.config.pacer.sleep_for(frame_start.elapsed());
            let deadline = Instant::now() + sleep;
            if self.suspend_until(deadline) == Flow::Stop {
                break;
            }

            if let Some(fault) =
                detect_stall(deadline, Instant::now(), self.config.stall_threshold)
            {
                log::error!("{fault}");
                if !self.sink.publish(SimEvent::Fault(fault)) {
                    break;
                }
                if self.wait_for_acknowledgement() == Flow::Stop {
                    break;
                }
                // Time spent stalled or waiting on the user is not game time.
                last_step = Instant::now();
            }
        }
        log::info!("Simulation stopped after {} ticks", self.world.ticks());
        self.world
    }

    fn apply(&mut self, command: SimCommand) -> Flow {
        match command {
            SimCommand::Key { key, pressed } => {
                self.world.handle_key(key, pressed);
                Flow::Continue
            }
            SimCommand::AcknowledgeFault => {
                log::debug!("Acknowledgement received with no fault pending");
                Flow::Continue
            }
            SimCommand::Shutdown => Flow::Stop,
        }
    }

    fn drain_commands(&mut self) -> Flow {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if self.apply(command) == Flow::Stop {
                        return Flow::Stop;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Stop,
            }
        }
    }

    fn suspend_until(&mut self, deadline: Instant) -> Flow {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Flow::Continue;
            }
            match self.commands.recv_timeout(deadline - now) {
                Ok(command) => {
                    if self.apply(command) == Flow::Stop {
                        return Flow::Stop;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Flow::Continue,
                Err(RecvTimeoutError::Disconnected) => return Flow::Stop,
            }
        }
    }

    /// Input keeps being applied while the fault is on screen.
    fn wait_for_acknowledgement(&mut self) -> Flow {
        loop {
            match self.commands.recv() {
                Ok(SimCommand::AcknowledgeFault) => {
                    log::info!("Fault acknowledged, resuming simulation");
                    return Flow::Continue;
                }
                Ok(command) => {
                    if self.apply(command) == Flow::Stop {
                        return Flow::Stop;
                    }
                }
                Err(_) => return Flow::Stop,
            }
        }
    }
}
