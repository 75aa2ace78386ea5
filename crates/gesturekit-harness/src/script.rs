#![forbid(unsafe_code)]

//! Deterministic touch streams on a virtual clock.
//!
//! A [`TouchScript`] keeps the set of contacts currently down and emits one
//! [`PointerSample`] per call, stamping each with `origin + elapsed`. Nothing
//! reads the wall clock after construction, so the same script replays to
//! the same samples every time.
//!
//! ```rust,ignore
//! let script = TouchScript::new(Instant::now())
//!     .down(0, 100.0, 100.0)
//!     .wait_ms(40)
//!     .up();
//! lab.run(&script);
//! ```

use gesturekit_core::{Contact, Duration, Instant, Phase, Point, PointerId, PointerSample};

/// Default gap between consecutive samples.
pub const DEFAULT_STEP: Duration = Duration::from_millis(10);

/// One entry of a script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Sample(PointerSample),
    /// Let timers run up to this instant without a sample.
    Advance(Instant),
}

impl ScriptStep {
    #[must_use]
    pub fn at(&self) -> Instant {
        match self {
            Self::Sample(sample) => sample.timestamp,
            Self::Advance(at) => *at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TouchScript {
    origin: Instant,
    elapsed: Duration,
    step: Duration,
    contacts: Vec<Contact>,
    steps: Vec<ScriptStep>,
}

impl TouchScript {
    #[must_use]
    pub fn new(origin: Instant) -> Self {
        Self {
            origin,
            elapsed: Duration::ZERO,
            step: DEFAULT_STEP,
            contacts: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Gap inserted before every sample after the first.
    #[must_use]
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    #[must_use]
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Virtual time of the next sample without an explicit wait.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    #[must_use]
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Number of contacts currently down.
    #[must_use]
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Ids of the contacts currently down, in listing order.
    #[must_use]
    pub fn contact_ids(&self) -> Vec<u32> {
        self.contacts.iter().map(|c| c.id.0).collect()
    }

    #[must_use]
    pub fn position_of(&self, id: u32) -> Option<Point> {
        self.contacts
            .iter()
            .find(|c| c.id == PointerId(id))
            .map(|c| c.position)
    }

    /// Pass time without emitting anything.
    #[must_use]
    pub fn wait_ms(mut self, ms: u64) -> Self {
        self.elapsed += Duration::from_millis(ms);
        self
    }

    /// Pass time and let due timers fire.
    #[must_use]
    pub fn idle_ms(mut self, ms: u64) -> Self {
        self.elapsed += Duration::from_millis(ms);
        self.steps.push(ScriptStep::Advance(self.now()));
        self
    }

    /// First contact of a stream. Any contacts left over are discarded.
    #[must_use]
    pub fn down(mut self, id: u32, x: f32, y: f32) -> Self {
        self.contacts.clear();
        self.contacts.push(Contact::new(id, x, y));
        self.emit(Phase::Down)
    }

    #[must_use]
    pub fn pointer_down(mut self, id: u32, x: f32, y: f32) -> Self {
        self.contacts.push(Contact::new(id, x, y));
        let index = self.contacts.len() - 1;
        self.emit(Phase::PointerDown { index })
    }

    /// Move one contact to an absolute position.
    #[must_use]
    pub fn move_to(mut self, id: u32, x: f32, y: f32) -> Self {
        if let Some(contact) = self.contacts.iter_mut().find(|c| c.id == PointerId(id)) {
            contact.position = Point::new(x, y);
        }
        self.emit(Phase::Move)
    }

    /// Translate every contact by the same offset.
    #[must_use]
    pub fn move_by(mut self, dx: f32, dy: f32) -> Self {
        for contact in &mut self.contacts {
            contact.position = contact.position + Point::new(dx, dy);
        }
        self.emit(Phase::Move)
    }

    /// `steps` equal moves of every contact, adding up to `(dx, dy)`.
    #[must_use]
    pub fn drag_by(mut self, dx: f32, dy: f32, steps: u32) -> Self {
        let steps = steps.max(1);
        let (sx, sy) = (dx / steps as f32, dy / steps as f32);
        for _ in 0..steps {
            self = self.move_by(sx, sy);
        }
        self
    }

    /// Lift one contact while others stay down. Lifting the last contact
    /// ends the stream with `Up`.
    #[must_use]
    pub fn pointer_up(mut self, id: u32) -> Self {
        let Some(index) = self.contacts.iter().position(|c| c.id == PointerId(id)) else {
            return self;
        };
        if self.contacts.len() == 1 {
            return self.up();
        }
        self = self.emit(Phase::PointerUp { index });
        self.contacts.remove(index);
        self
    }

    /// Lift every contact at once.
    #[must_use]
    pub fn up(mut self) -> Self {
        self = self.emit(Phase::Up);
        self.contacts.clear();
        self
    }

    #[must_use]
    pub fn cancel(mut self) -> Self {
        self = self.emit(Phase::Cancel);
        self.contacts.clear();
        self
    }

    /// A complete single-finger tap.
    #[must_use]
    pub fn tap(self, id: u32, x: f32, y: f32) -> Self {
        self.down(id, x, y).up()
    }

    fn emit(mut self, phase: Phase) -> Self {
        if !self.steps.is_empty() {
            self.elapsed += self.step;
        }
        let sample = PointerSample::new(phase, self.contacts.clone(), self.now());
        self.steps.push(ScriptStep::Sample(sample));
        self
    }
}

impl IntoIterator for TouchScript {
    type Item = ScriptStep;
    type IntoIter = std::vec::IntoIter<ScriptStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}
