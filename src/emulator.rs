//! Emulates the machine a gcode program would drive, on a virtual clock.
//!
//! The [Emulator] is a [Handler] over its own instruction walk: it maps each
//! instruction to an [Operation], advances its clock through the operation
//! in sub-steps and publishes an [Event] for every intermediate state, so
//! listeners can watch the tool head move without any real time passing.

use std::collections::HashSet;
use std::time::Duration;

use slog::{debug, o, Discard, Logger};

use crate::ast::{Gcode, Instruction};
use crate::error::{Error, RuntimeError};
use crate::event::{Event, EventDispatcher, EventListener};
use crate::interpreter::{Control, Handler, Interpreter};
use crate::span::Span;

/// A snapshot of the emulated machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MachineState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub feed_rate: f64,
}

/// A single machine action with a duration and a state trajectory.
///
/// `next_state` is a pure function of the elapsed time since the operation
/// started, so the emulator is free to sample it at whatever resolution it
/// likes.
pub trait Operation {
    /// How long the operation takes on the emulator clock.
    fn duration(&self) -> Duration;

    /// The machine state after `elapsed` time inside the operation.
    fn next_state(&self, elapsed: Duration) -> MachineState;
}

/// An [Operation] that holds the machine still, optionally for some time.
#[derive(Debug, Clone, Copy)]
pub struct Hold {
    state: MachineState,
    duration: Duration,
}

impl Hold {
    /// A hold that takes no time at all.
    pub fn new(state: MachineState) -> Hold {
        Hold::with_duration(state, Duration::from_secs(0))
    }

    pub fn with_duration(state: MachineState, duration: Duration) -> Hold {
        Hold { state, duration }
    }
}

impl Operation for Hold {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn next_state(&self, _elapsed: Duration) -> MachineState {
        self.state
    }
}

/// Maps instructions to the [Operation]s that carry them out.
pub trait OperationFactory {
    /// The operation for `code`, given the machine state it will start
    /// from. `Ok(None)` means the instruction is recognised but requires no
    /// action.
    fn operation(
        &self,
        code: &Gcode,
        state: MachineState,
    ) -> Result<Option<Box<dyn Operation>>, RuntimeError>;
}

/// The built-in operation set.
///
/// `G4` (dwell) is supported, and a configurable set of instruction numbers
/// is ignored outright. Everything else raises
/// [RuntimeError::UnknownInstruction].
#[derive(Debug, Clone)]
pub struct StandardOps {
    ignored: HashSet<i64>,
}

impl StandardOps {
    /// An operation set that ignores nothing.
    pub fn new() -> StandardOps {
        StandardOps {
            ignored: HashSet::new(),
        }
    }

    /// Marks `number` as ignored. Ignored instructions execute as
    /// zero-duration holds.
    pub fn ignore(mut self, number: i64) -> StandardOps {
        self.ignored.insert(number);
        self
    }
}

impl Default for StandardOps {
    fn default() -> StandardOps {
        // G17 selects the XY plane, which is all this machine has.
        StandardOps::new().ignore(17)
    }
}

impl OperationFactory for StandardOps {
    fn operation(
        &self,
        code: &Gcode,
        state: MachineState,
    ) -> Result<Option<Box<dyn Operation>>, RuntimeError> {
        use crate::ast::ArgumentKind;

        if self.ignored.contains(&code.number) {
            return Ok(Some(Box::new(Hold::new(state))));
        }

        match code.number {
            4 => {
                let milliseconds = code.value_for(ArgumentKind::P).ok_or(
                    RuntimeError::MissingArgument {
                        number: code.number,
                        kind: ArgumentKind::P,
                        span: code.span,
                    },
                )?;

                let duration = Duration::from_secs_f64(milliseconds.max(0.0) / 1000.0);

                Ok(Some(Box::new(Hold::with_duration(state, duration))))
            }

            number => Err(RuntimeError::UnknownInstruction {
                number,
                span: code.span,
            }),
        }
    }
}

/// A time-stepped machine emulator.
pub struct Emulator<F = StandardOps> {
    state: MachineState,
    time: f64,
    initial_state: MachineState,
    min_time_step: f64,
    operations: F,
    dispatcher: EventDispatcher,
    logger: Logger,
}

impl Emulator<StandardOps> {
    pub fn new() -> Emulator<StandardOps> {
        Emulator::with_operations(StandardOps::default())
    }
}

impl Default for Emulator<StandardOps> {
    fn default() -> Emulator<StandardOps> {
        Emulator::new()
    }
}

impl<F: OperationFactory> Emulator<F> {
    pub fn with_operations(operations: F) -> Emulator<F> {
        Emulator {
            state: MachineState::default(),
            time: 0.0,
            initial_state: MachineState::default(),
            min_time_step: 0.0,
            operations,
            dispatcher: EventDispatcher::new(),
            logger: Logger::root(Discard, o!()),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Emulator<F> {
        self.logger = logger.new(o!("stage" => "emulation"));
        self
    }

    /// The state the machine is reset to at the start of every run.
    pub fn set_initial_state(&mut self, state: MachineState) {
        self.initial_state = state;
    }

    /// Lower bound on the clock advance of a single sub-step, in seconds.
    pub fn set_minimum_time_step(&mut self, seconds: f64) {
        self.min_time_step = seconds;
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.dispatcher.add_listener(listener);
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    /// The emulator clock, in seconds since the start of the run.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Overwrites the machine state, publishing a state-changed event.
    pub fn set_state(&mut self, state: MachineState) {
        self.state = state;
        self.state_changed();
    }

    /// Overwrites the clock, publishing a state-changed event.
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
        self.state_changed();
    }

    fn update(&mut self, time: f64, state: MachineState) {
        self.time = time;
        self.state = state;
        self.state_changed();
    }

    fn state_changed(&mut self) {
        self.dispatcher.dispatch(Event::StateChanged {
            state: self.state,
            time: self.time,
        });
    }

    /// Advances the clock through `operation`, publishing intermediate
    /// states along the way.
    ///
    /// The operation is divided into at most twenty sub-steps, each no
    /// shorter than the minimum time step. The final update always lands
    /// exactly on the operation's end time.
    fn execute(&mut self, operation: &dyn Operation) {
        let duration = operation.duration().as_secs_f64();
        let time_step = (duration / 20.0).max(self.min_time_step);

        let start = self.time;
        let end = start + duration;

        if time_step > 0.0 {
            let steps = (duration / time_step).floor() as u64;

            for step in 0..steps {
                let elapsed = step as f64 * time_step;
                let state = operation.next_state(Duration::from_secs_f64(elapsed));
                self.update(start + elapsed, state);
            }
        }

        if self.time != end {
            let state = operation.next_state(operation.duration());
            self.update(end, state);
        }
    }

    /// Runs an entire program from source text.
    pub fn run(&mut self, src: &str) -> Result<(), Error> {
        let logger = self.logger.clone();
        Interpreter::with_logger(&mut *self, logger).run(src)
    }

    /// Runs an already-parsed program.
    pub fn run_instructions(&mut self, instructions: &[Instruction]) -> Result<(), Error> {
        Interpreter::new(&mut *self).run_instructions(instructions)
    }
}

impl<F: OperationFactory> Handler for Emulator<F> {
    fn before_run(&mut self, instructions: &[Instruction]) {
        debug!(self.logger, "starting emulation";
               "instructions" => instructions.len());

        self.update(0.0, self.initial_state);
    }

    fn comment(&mut self, text: &str, span: Span) {
        self.dispatcher.dispatch(Event::CommentDetected {
            text: text.to_string(),
            span,
        });
    }

    fn gcode(&mut self, _control: &mut Control, code: &Gcode) -> Result<(), RuntimeError> {
        let operation = self.operations.operation(code, self.state)?;

        let duration = match operation {
            Some(operation) => {
                self.execute(operation.as_ref());
                Some(operation.duration().as_secs_f64())
            }
            None => None,
        };

        self.dispatcher.dispatch(Event::OperationExecuted {
            code: code.clone(),
            duration,
        });

        Ok(())
    }
}

impl<'e, F: OperationFactory> Handler for &'e mut Emulator<F> {
    fn before_parse(&mut self, tokens: &[crate::token::Token]) {
        (**self).before_parse(tokens)
    }

    fn before_run(&mut self, instructions: &[Instruction]) {
        (**self).before_run(instructions)
    }

    fn comment(&mut self, text: &str, span: Span) {
        (**self).comment(text, span)
    }

    fn gcode(&mut self, control: &mut Control, code: &Gcode) -> Result<(), RuntimeError> {
        (**self).gcode(control, code)
    }

    fn mcode(
        &mut self,
        control: &mut Control,
        code: &crate::ast::Mcode,
    ) -> Result<(), RuntimeError> {
        (**self).mcode(control, code)
    }

    fn tcode(
        &mut self,
        control: &mut Control,
        code: &crate::ast::Tcode,
    ) -> Result<(), RuntimeError> {
        (**self).tcode(control, code)
    }

    fn ocode(
        &mut self,
        control: &mut Control,
        code: &crate::ast::Ocode,
    ) -> Result<(), RuntimeError> {
        (**self).ocode(control, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collect_events(src: &str) -> Result<Vec<Event>, Error> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut emulator = Emulator::new();
        emulator.add_listener(move |event: &Event| sink.borrow_mut().push(event.clone()));
        emulator.run(src)?;
        drop(emulator);

        Ok(Rc::try_unwrap(events).unwrap().into_inner())
    }

    #[test]
    fn ignored_instructions_take_no_time() {
        let mut emulator = Emulator::new();
        emulator.run("G17").unwrap();

        assert_eq!(emulator.time(), 0.0);
        assert_eq!(emulator.state(), MachineState::default());
    }

    #[test]
    fn dwell_advances_the_clock() {
        let mut emulator = Emulator::new();
        emulator.run("G04 P5000").unwrap();

        assert_eq!(emulator.time(), 5.0);
        assert_eq!(emulator.state(), MachineState::default());
    }

    #[test]
    fn dwell_without_a_duration_is_an_error() {
        let mut emulator = Emulator::new();
        let err = emulator.run("G04").unwrap_err();

        assert_eq!(
            err,
            Error::Runtime(RuntimeError::MissingArgument {
                number: 4,
                kind: crate::ast::ArgumentKind::P,
                span: Span::new(0, 3),
            }),
        );
    }

    #[test]
    fn unmapped_instructions_are_an_error() {
        let mut emulator = Emulator::new();
        let err = emulator.run("G99").unwrap_err();

        assert_eq!(
            err,
            Error::Runtime(RuntimeError::UnknownInstruction {
                number: 99,
                span: Span::new(0, 3),
            }),
        );
    }

    #[test]
    fn extra_instructions_can_be_ignored() {
        let mut emulator = Emulator::with_operations(StandardOps::default().ignore(21));
        emulator.run("G17 G21").unwrap();

        assert_eq!(emulator.time(), 0.0);
    }

    #[test]
    fn state_changes_step_through_a_dwell() {
        let events = collect_events("G04 P1000").unwrap();

        let times: Vec<f64> = events
            .iter()
            .filter_map(|event| match event {
                Event::StateChanged { time, .. } => Some(*time),
                _ => None,
            })
            .collect();

        // Initial reset, twenty sub-steps of fifty milliseconds starting at
        // zero, then the exact terminal update.
        assert_eq!(times.len(), 22);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[1], 0.0);
        assert!(times[1..].windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(*times.last().unwrap(), 1.0);
    }

    #[test]
    fn short_operations_end_exactly_on_time() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut emulator = Emulator::new();
        emulator.set_minimum_time_step(0.005);
        emulator.add_listener(move |event: &Event| sink.borrow_mut().push(event.clone()));
        emulator.run("G04 P3").unwrap();
        drop(emulator);

        let times: Vec<f64> = Rc::try_unwrap(events)
            .unwrap()
            .into_inner()
            .iter()
            .filter_map(|event| match event {
                Event::StateChanged { time, .. } => Some(*time),
                _ => None,
            })
            .collect();

        // A three-millisecond dwell is shorter than the minimum time step,
        // so the only update after the reset is the terminal one.
        assert_eq!(times, vec![0.0, 0.003]);
    }

    #[test]
    fn operations_are_announced_after_execution() {
        let events = collect_events("G17 G04 P2000").unwrap();

        let announced: Vec<(i64, Option<f64>)> = events
            .iter()
            .filter_map(|event| match event {
                Event::OperationExecuted { code, duration } => Some((code.number, *duration)),
                _ => None,
            })
            .collect();

        assert_eq!(announced, vec![(17, Some(0.0)), (4, Some(2.0))]);
    }

    #[test]
    fn setters_republish_the_state() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);

        let mut emulator = Emulator::new();
        emulator.add_listener(move |event: &Event| sink.borrow_mut().push(event.clone()));

        emulator.set_time(4.2);

        let state = MachineState {
            x: 1.0,
            ..MachineState::default()
        };
        emulator.set_state(state);
        drop(emulator);

        let events = Rc::try_unwrap(events).unwrap().into_inner();

        assert_eq!(
            events,
            vec![
                Event::StateChanged {
                    state: MachineState::default(),
                    time: 4.2,
                },
                Event::StateChanged { state, time: 4.2 },
            ],
        );
    }

    #[test]
    fn comments_are_forwarded_as_events() {
        let events = collect_events("; warm up\nG17").unwrap();

        assert!(events.contains(&Event::CommentDetected {
            text: " warm up".to_string(),
            span: Span::new(1, 9),
        }));
    }
}
