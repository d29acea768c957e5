// Copyright 2026 the Reveal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated page that exercises the reveal controller and its diagnostics.
//!
//! A virtual clock drives the startup gate, confirmation timers and frame
//! waits, while a scripted scroll moves six blocks through an 800px viewport:
//! a quick blip, a cascade container, a disclosure widget closing and
//! reopening, a removal and a late insertion. Events go to both a
//! [`PrettyPrintSink`](reveal_debug::pretty::PrettyPrintSink) on stdout and a
//! [`RecorderSink`](reveal_debug::recorder::RecorderSink), which is exported
//! as a Chrome trace at the end.

use std::fs::File;
use std::io::BufWriter;

use kurbo::Rect;

use reveal_core::backend::Host;
use reveal_core::cascade::stagger_delay;
use reveal_core::config::RevealConfig;
use reveal_core::element::ElementId;
use reveal_core::gate::{GateSignal, StartupGate};
use reveal_core::machine::ConfirmTicket;
use reveal_core::metric::Viewport;
use reveal_core::registry::{BatchId, Candidate, Command, Commands, Environment, Registry};
use reveal_core::time::{Duration, HostTime};
use reveal_core::trace::{
    ConfirmEvent, GateEvent, ModeEvent, RegistryEvent, SampleEvent, TraceSink, Tracer,
};

use reveal_debug::pretty::PrettyPrintSink;
use reveal_debug::recorder::RecorderSink;

const VIEWPORT: Viewport = Viewport {
    width: 1280.0,
    height: 800.0,
};
/// One simulated frame (≈60 Hz).
const FRAME: Duration = Duration::from_millis(16);
const BLOCK_HEIGHT: f64 = 300.0;
const CASCADE_CHILDREN: usize = 3;

fn main() {
    let mut page = Page::new(RevealConfig::web());

    // -- startup -----------------------------------------------------------
    page.arm_gate();
    page.run(Duration::from_millis(1200));
    page.signal(GateSignal::LoaderFinished);
    page.run(Duration::from_millis(300));
    page.signal(GateSignal::WindowLoaded);

    // -- scrolling ---------------------------------------------------------
    page.scroll_to(600.0, Duration::from_millis(400));
    page.run(Duration::from_millis(300));

    // A blip: block 2 crosses the enter threshold for less than the
    // confirmation window.
    page.scroll_to(900.0, Duration::from_millis(32));
    page.scroll_to(600.0, Duration::from_millis(32));
    page.run(Duration::from_millis(300));

    page.scroll_to(1100.0, Duration::from_millis(300));
    page.run(Duration::from_millis(500));

    page.scroll_to(2200.0, Duration::from_millis(600));
    page.run(Duration::from_millis(500));

    // -- disclosure --------------------------------------------------------
    page.toggle_disclosure(false);
    page.run(Duration::from_millis(200));
    page.toggle_disclosure(true);
    page.run(Duration::from_millis(500));

    // -- mutations ---------------------------------------------------------
    page.remove_block(3);
    page.insert_block(Block {
        top: 2700.0,
        cascade: false,
        in_disclosure: false,
    });
    page.run(Duration::from_millis(400));

    page.scroll_to(0.0, Duration::from_millis(800));
    page.run(Duration::from_millis(500));

    // -- export Chrome trace -----------------------------------------------
    let path = "reveal_trace.json";
    let file = File::create(path).expect("failed to create reveal_trace.json");
    let mut writer = BufWriter::new(file);
    reveal_debug::chrome::export(page.recorder.events(), &mut writer)
        .expect("failed to write Chrome trace");

    println!(
        "Wrote {path} ({} events, {} blocks revealed)",
        page.recorder.events().len(),
        page.blocks
            .iter()
            .filter(|(id, _)| page.registry.is_active(*id))
            .count(),
    );
}

// ---------------------------------------------------------------------------
// Page model
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Block {
    top: f64,
    cascade: bool,
    in_disclosure: bool,
}

impl Block {
    fn rect(&self, scroll: f64) -> Rect {
        Rect::new(0.0, self.top - scroll, VIEWPORT.width, self.top - scroll + BLOCK_HEIGHT)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Timer {
    Confirm(ConfirmTicket),
    LoaderTimeout,
    Settle,
}

/// Applies registry commands against the virtual clock.
#[derive(Debug, Default)]
struct SimHost {
    now: HostTime,
    timers: Vec<(HostTime, Timer)>,
    frames: Vec<(u8, BatchId)>,
    /// Newly observed elements; a real watcher reports them once right away.
    fresh: Vec<ElementId>,
}

impl Host for SimHost {
    fn apply(&mut self, registry: &Registry, commands: &Commands) {
        for command in commands {
            match *command {
                Command::Observe(id) => self.fresh.push(id),
                Command::Unobserve(id) => self.fresh.retain(|f| *f != id),
                Command::ScheduleConfirm { ticket, after } => {
                    self.timers.push((self.now + after, Timer::Confirm(ticket)));
                }
                Command::CancelConfirm(ticket) => {
                    self.timers.retain(|(_, t)| *t != Timer::Confirm(ticket));
                }
                Command::AwaitFrames { batch, frames } => self.frames.push((frames.max(1), batch)),
                Command::Stagger(id) => {
                    let step = registry.config().stagger_step;
                    let delays: Vec<String> = (0..CASCADE_CHILDREN)
                        .map(|i| format!("{}ms", stagger_delay(i, step).as_millis()))
                        .collect();
                    println!("[page]   {id:?} children delayed {}", delays.join(", "));
                }
                Command::SetActive(id, on) => {
                    println!("[page]   {id:?} {}", if on { "reveal" } else { "conceal" });
                }
                Command::ClearStagger(_) | Command::Release(_) => {}
            }
        }
    }
}

/// Forwards every event to two sinks.
struct Tee<'a, A, B> {
    first: &'a mut A,
    second: &'a mut B,
}

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<'_, A, B> {
    fn on_sample(&mut self, e: &SampleEvent) {
        self.first.on_sample(e);
        self.second.on_sample(e);
    }

    fn on_confirm(&mut self, e: &ConfirmEvent) {
        self.first.on_confirm(e);
        self.second.on_confirm(e);
    }

    fn on_registry(&mut self, e: &RegistryEvent) {
        self.first.on_registry(e);
        self.second.on_registry(e);
    }

    fn on_mode(&mut self, e: &ModeEvent) {
        self.first.on_mode(e);
        self.second.on_mode(e);
    }

    fn on_gate(&mut self, e: &GateEvent) {
        self.first.on_gate(e);
        self.second.on_gate(e);
    }
}

struct Page {
    registry: Registry,
    gate: StartupGate,
    host: SimHost,
    pretty: PrettyPrintSink,
    recorder: RecorderSink,
    /// Blocks in the document; handles are assigned once the gate settles.
    blocks: Vec<(ElementId, Block)>,
    pending_blocks: Vec<Block>,
    scroll: f64,
    scrolled: bool,
    disclosure_open: bool,
}

impl Page {
    fn new(config: RevealConfig) -> Self {
        let pending_blocks = (0..6_u32)
            .map(|i| Block {
                top: 400.0 + f64::from(i) * 500.0,
                cascade: i == 2,
                in_disclosure: i >= 4,
            })
            .collect();
        Self {
            registry: Registry::new(config),
            gate: StartupGate::new(&config),
            host: SimHost::default(),
            pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
            recorder: RecorderSink::new(),
            blocks: Vec::new(),
            pending_blocks,
            scroll: 0.0,
            scrolled: false,
            disclosure_open: true,
        }
    }

    /// Runs one registry operation and applies what it queued.
    fn dispatch(&mut self, f: impl FnOnce(&mut Registry, &mut Tracer<'_>)) {
        let mut tee = Tee {
            first: &mut self.pretty,
            second: &mut self.recorder,
        };
        let mut tracer = Tracer::new(&mut tee).at(self.host.now);
        f(&mut self.registry, &mut tracer);
        let commands = self.registry.flush();
        self.host.apply(&self.registry, &commands);
    }

    fn bounds(&self, id: ElementId) -> Option<Rect> {
        self.blocks
            .iter()
            .find(|(b, _)| *b == id)
            .map(|(_, block)| block.rect(self.scroll))
    }

    // -- startup gate ------------------------------------------------------

    fn arm_gate(&mut self) {
        let at = self.host.now + self.gate.timeout();
        self.host.timers.push((at, Timer::LoaderTimeout));
    }

    fn signal(&mut self, signal: GateSignal) {
        let mut tee = Tee {
            first: &mut self.pretty,
            second: &mut self.recorder,
        };
        let mut tracer = Tracer::new(&mut tee).at(self.host.now);
        if let Some(settle) = self.gate.signal(signal, &mut tracer) {
            self.host.timers.retain(|(_, t)| *t != Timer::LoaderTimeout);
            self.host.timers.push((self.host.now + settle, Timer::Settle));
        }
    }

    fn initialize(&mut self) {
        let env = Environment {
            reduced_motion: false,
            intersection_supported: true,
        };
        let blocks = std::mem::take(&mut self.pending_blocks);
        let candidates: Vec<Candidate> = blocks
            .iter()
            .map(|b| Candidate { cascade: b.cascade })
            .collect();
        let mut ids = None;
        self.dispatch(|registry, tracer| ids = registry.initialize(env, &candidates, tracer));
        if let Some(ids) = ids {
            self.blocks.extend(ids.into_iter().zip(blocks));
        }
    }

    // -- page events -------------------------------------------------------

    /// Scrolls linearly to `target` over `over`, one frame at a time.
    fn scroll_to(&mut self, target: f64, over: Duration) {
        let frames = (over.ticks() / FRAME.ticks()).max(1);
        let start = self.scroll;
        for i in 1..=frames {
            let t = i as f64 / frames as f64;
            self.scroll = start + (target - start) * t;
            self.scrolled = true;
            self.frame();
        }
    }

    /// Lets time pass without scrolling.
    fn run(&mut self, over: Duration) {
        for _ in 0..(over.ticks() / FRAME.ticks()) {
            self.frame();
        }
    }

    fn toggle_disclosure(&mut self, open: bool) {
        println!("[page] disclosure {}", if open { "opened" } else { "closed" });
        self.disclosure_open = open;
        let members: Vec<ElementId> = self
            .blocks
            .iter()
            .filter(|(_, b)| b.in_disclosure)
            .map(|(id, _)| *id)
            .collect();
        if open {
            self.dispatch(|registry, tracer| {
                let _ = registry.disclosure_opened(&members, tracer);
            });
        } else {
            self.dispatch(|registry, tracer| registry.disclosure_closed(&members, tracer));
        }
    }

    fn remove_block(&mut self, index: usize) {
        if index >= self.blocks.len() {
            return;
        }
        let (id, _) = self.blocks.remove(index);
        println!("[page] removed {id:?}");
        self.dispatch(|registry, tracer| registry.removed(id, tracer));
    }

    fn insert_block(&mut self, block: Block) {
        let candidate = Candidate {
            cascade: block.cascade,
        };
        let mut id = None;
        self.dispatch(|registry, tracer| id = registry.register(candidate, tracer));
        match id {
            Some(id) => {
                println!("[page] inserted {id:?}");
                self.blocks.push((id, block));
            }
            None => self.pending_blocks.push(block),
        }
    }

    // -- virtual clock -----------------------------------------------------

    fn frame(&mut self) {
        self.host.now = self.host.now + FRAME;

        // Frame waits.
        let mut ready = Vec::new();
        for (left, batch) in &mut self.host.frames {
            *left = left.saturating_sub(1);
            if *left == 0 {
                ready.push(*batch);
            }
        }
        self.host.frames.retain(|(left, _)| *left > 0);
        for batch in ready {
            self.dispatch(|registry, tracer| registry.frames_elapsed(batch, tracer));
        }

        // Timers, earliest first.
        while let Some(pos) = self.next_due() {
            let (_, timer) = self.host.timers.remove(pos);
            match timer {
                Timer::Confirm(ticket) => {
                    let bounds = self.bounds(ticket.element);
                    self.dispatch(|registry, tracer| {
                        registry.confirm(ticket, bounds, VIEWPORT.height, tracer);
                    });
                }
                Timer::LoaderTimeout => self.signal(GateSignal::TimedOut),
                Timer::Settle => {
                    if self.gate.settled() {
                        self.initialize();
                    }
                }
            }
        }

        // Watcher deliveries.
        let fresh = std::mem::take(&mut self.host.fresh);
        let margin = self.registry.config().root_margin_bottom;
        let samples: Vec<_> = self
            .blocks
            .iter()
            .filter(|(id, b)| {
                (self.scrolled || fresh.contains(id)) && (!b.in_disclosure || self.disclosure_open)
            })
            .map(|(id, b)| (*id, VIEWPORT.sample(b.rect(self.scroll), margin)))
            .collect();
        self.scrolled = false;
        if !samples.is_empty() {
            self.dispatch(|registry, tracer| {
                for (id, sample) in &samples {
                    registry.sample(*id, sample, tracer);
                }
            });
        }
    }

    fn next_due(&self) -> Option<usize> {
        self.host
            .timers
            .iter()
            .enumerate()
            .filter(|(_, (at, _))| *at <= self.host.now)
            .min_by_key(|(_, (at, _))| *at)
            .map(|(pos, _)| pos)
    }
}
