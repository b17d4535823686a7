//! Event handling.
//!
//! This library exposes an event-based interface for observing the emulated
//! machine in real-time. [EventListeners](EventListener) can be registered
//! on the [Emulator](crate::emulator::Emulator) with the
//! [add_listener](crate::emulator::Emulator::add_listener) method.
//!
//! A blanket implementation of [EventListener] for all `Fn(&Event)` is provided.

use crate::ast::Gcode;
use crate::emulator::MachineState;
use crate::span::Span;

/// Represents an event that occurred while emulating a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The machine state was updated.
    StateChanged {
        /// The machine state after the update.
        state: MachineState,

        /// The emulator clock at the update, in seconds.
        time: f64,
    },

    /// An instruction finished executing.
    OperationExecuted {
        /// The instruction that was executed.
        code: Gcode,

        /// How long the operation took on the emulator clock, in seconds.
        /// `None` when the instruction required no operation at all.
        duration: Option<f64>,
    },

    /// A comment was encountered in the source text.
    CommentDetected {
        /// The comment text, without its delimiters.
        text: String,

        /// The location of the comment text.
        span: Span,
    },
}

/// Trait for consuming events.
pub trait EventListener {
    /// Called whenever a new event has been created.
    fn event(&mut self, event: &Event);
}

impl<F> EventListener for F
where
    F: Fn(&Event),
{
    fn event(&mut self, event: &Event) {
        self(event)
    }
}

pub(crate) struct EventDispatcher {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventDispatcher {
    pub fn new() -> EventDispatcher {
        EventDispatcher {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener) as Box<dyn EventListener>)
    }

    pub fn dispatch(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.event(&event);
        }
    }
}
