use crate::hal::gpio::{InputPin, OutputPin};
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    vec::Vec,
};

/// Pin that holds a level and records every change.
#[derive(Clone, Debug, Default)]
pub struct MockPin {
    pub state: bool,
    pub changes: Vec<bool>,
}

impl MockPin {
    pub fn high() -> Self { Self { state: true, changes: Vec::new() } }
    pub fn low() -> Self { Self::default() }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) {
        self.state = false;
        self.changes.push(self.state);
    }

    fn set_high(&mut self) {
        self.state = true;
        self.changes.push(self.state);
    }
}

impl InputPin for MockPin {
    fn is_high(&self) -> bool { self.state }
    fn is_low(&self) -> bool { !self.state }
}

/// Input pin that plays back a fixed sequence of levels, then holds
/// `idle` once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedPin {
    script: RefCell<VecDeque<bool>>,
    idle: bool,
    pub reads: Cell<usize>,
}

impl ScriptedPin {
    pub fn new<I: IntoIterator<Item = bool>>(levels: I, idle: bool) -> Self {
        Self { script: RefCell::new(levels.into_iter().collect()), idle, reads: Cell::new(0) }
    }

    fn next_level(&self) -> bool {
        self.reads.set(self.reads.get() + 1);
        self.script.borrow_mut().pop_front().unwrap_or(self.idle)
    }
}

impl InputPin for ScriptedPin {
    fn is_high(&self) -> bool { self.next_level() }
    fn is_low(&self) -> bool { !self.next_level() }
}

/// Output end of a jumper wire.
#[derive(Clone, Debug)]
pub struct WiredOutput {
    line: Rc<Cell<bool>>,
}

/// Input end of a jumper wire.
#[derive(Clone, Debug)]
pub struct WiredInput {
    line: Rc<Cell<bool>>,
}

/// Two pins joined by a wire: the input reads whatever the output drives.
pub fn wire() -> (WiredOutput, WiredInput) {
    let line = Rc::new(Cell::new(false));
    (WiredOutput { line: line.clone() }, WiredInput { line })
}

impl OutputPin for WiredOutput {
    fn set_low(&mut self) { self.line.set(false) }
    fn set_high(&mut self) { self.line.set(true) }
}

impl InputPin for WiredInput {
    fn is_high(&self) -> bool { self.line.get() }
    fn is_low(&self) -> bool { !self.line.get() }
}
