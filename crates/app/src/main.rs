//! Inkwell - headless shared pen session
//!
//! Joins several participants to one in-process bus and replays a scripted
//! session on the first participant's pen: draw, double-click undo, erase,
//! return to the pen and clear. Every replica must end in the same state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use glam::Vec3;
use inkwell_ipc::{Bus, ParticipantId, ToolId};
use inkwell_tool::{Mode, Participant};
use painting::{InkEvent, Pose};
use tracing_subscriber::EnvFilter;

mod config;

use config::Cli;

const PEN: ToolId = ToolId(1);
const ERASER: ToolId = ToolId(2);

/// Scripted session state: replicas plus the holder's local clock
struct Session {
    participants: Vec<Participant>,
    now: Duration,
    dt: f32,
}

impl Session {
    fn holder(&mut self) -> &mut Participant {
        &mut self.participants[0]
    }

    fn pump(&mut self) {
        for participant in &mut self.participants {
            participant.pump();
        }
    }

    /// Advance one frame with the pen tip at `tip` on every replica
    fn frame(&mut self, tip: Pose) -> usize {
        self.now += Duration::from_secs_f32(self.dt.max(0.0));
        let dt = self.dt;
        self.participants
            .iter_mut()
            .map(|participant| participant.tick(PEN, dt, tip).len())
            .sum()
    }

    fn press(&mut self) {
        let now = self.now;
        self.holder().use_down(PEN, now);
        self.pump();
    }

    fn release(&mut self) {
        self.holder().use_up(PEN);
        self.pump();
    }

    fn wait(&mut self, duration: Duration) {
        self.now += duration;
    }

    fn modes(&self) -> Vec<Mode> {
        self.participants
            .iter()
            .filter_map(|p| p.manager().pen(PEN).map(|pen| pen.mode()))
            .collect()
    }

    fn pool_sizes(&self) -> Vec<usize> {
        self.participants
            .iter()
            .filter_map(|p| p.manager().pen(PEN).map(|pen| pen.pool().len()))
            .collect()
    }
}

/// Tip position for sample `sample` of stroke `stroke`: short strokes drawn
/// away from the user, stacked 20cm apart
fn stroke_tip(stroke: u32, sample: u32) -> Pose {
    Pose::from_position(Vec3::new(
        0.0,
        1.0 + stroke as f32 * 0.2,
        0.5 + sample as f32 * 0.02,
    ))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    if cli.participants == 0 {
        anyhow::bail!("a session needs at least one participant");
    }

    let tool_config = cli.tool_config();
    tracing::info!(
        "Starting session with {} participants (double-click {})",
        cli.participants,
        if tool_config.use_double_click { "on" } else { "off" }
    );

    let bus = Bus::new();
    let mut participants = Vec::with_capacity(cli.participants as usize);
    for i in 0..cli.participants {
        let mut participant = Participant::join(ParticipantId(i), &bus, tool_config.clone())
            .with_context(|| format!("participant {i} could not join the bus"))?;
        let manager = participant.manager_mut();
        manager.add_pen(PEN).set_owner(i == 0);
        manager.add_eraser(ERASER).set_owner(i == 0);
        manager.init();
        participants.push(participant);
    }

    let destroyed = Arc::new(AtomicUsize::new(0));
    {
        let destroyed = Arc::clone(&destroyed);
        participants[0]
            .manager_mut()
            .pen_mut(PEN)
            .context("holder has no pen")?
            .pool_mut()
            .add_event_listener(move |event| {
                if let InkEvent::Destroyed { name, reason, .. } = event {
                    destroyed.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("{} destroyed ({:?})", name, reason);
                }
            });
    }

    let mut session = Session {
        participants,
        now: Duration::ZERO,
        dt: cli.dt,
    };

    session.holder().pickup(PEN);
    session.pump();

    // Draw
    for stroke in 0..cli.strokes {
        session.wait(Duration::from_secs(1));
        session.press();
        for sample in 0..cli.samples {
            session.frame(stroke_tip(stroke, sample));
        }
        session.release();
    }
    tracing::info!("Drew {} strokes: pools {:?}", cli.strokes, session.pool_sizes());

    // Double-click: the first press leaves a dot, the second removes it and
    // switches to the eraser
    session.wait(Duration::from_secs(1));
    session.press();
    session.release();
    session.wait(Duration::from_millis(50));
    session.press();
    tracing::info!("After double-click: modes {:?}", session.modes());

    // Sweep the eraser along the first stroke
    session.wait(Duration::from_secs(1));
    session.press();
    let mut erased = 0;
    for sample in 0..cli.samples {
        erased += session.frame(stroke_tip(0, sample));
    }
    session.release();
    tracing::info!("Eraser sweep destroyed {} strokes across replicas", erased);

    // Back to the pen
    if session.modes().iter().all(|mode| *mode == Mode::EraserIdle) {
        session.wait(Duration::from_secs(1));
        session.press();
        session.release();
        session.wait(Duration::from_millis(50));
        session.press();
    }

    // Last participant clears everyone's ink
    let remaining = session.pool_sizes();
    if let Some(last) = session.participants.last_mut() {
        last.request_clear(PEN);
    }
    session.pump();

    session.holder().drop_tool(PEN);
    session.pump();

    let modes = session.modes();
    let pools = session.pool_sizes();
    println!("participants : {}", session.participants.len());
    println!("remaining    : {:?} before clear", remaining);
    println!("modes        : {:?}", modes);
    println!("pools        : {:?}", pools);
    println!("destroyed    : {} on the holder's pool", destroyed.load(Ordering::Relaxed));

    if modes.windows(2).any(|pair| pair[0] != pair[1]) {
        anyhow::bail!("replicas diverged: {:?}", modes);
    }
    if remaining.windows(2).any(|pair| pair[0] != pair[1]) {
        tracing::warn!("Pools differed before clear: {:?}", remaining);
    }

    Ok(())
}
