//! The closed set of event channels a behavior script may handle.
//!
//! Channels are the only way script code is entered after load: lifecycle
//! channels fire on load/play/stop, input channels mirror raw host input, and
//! `update` fires once per frame before each render. The set is fixed for the
//! lifetime of a loaded session; handler names outside it are rejected at
//! compile time with a warning.

use std::fmt;

/// One of the fixed event channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Init,
    Start,
    Stop,
    KeyDown,
    KeyUp,
    PointerDown,
    PointerUp,
    PointerMove,
    Wheel,
    Update,
}

impl Channel {
    /// All channels, in the canonical dispatch-table order.
    pub const ALL: [Channel; 10] = [
        Channel::Init,
        Channel::Start,
        Channel::Stop,
        Channel::KeyDown,
        Channel::KeyUp,
        Channel::PointerDown,
        Channel::PointerUp,
        Channel::PointerMove,
        Channel::Wheel,
        Channel::Update,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// The handler-function name scripts use for this channel.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Init => "init",
            Channel::Start => "start",
            Channel::Stop => "stop",
            Channel::KeyDown => "keydown",
            Channel::KeyUp => "keyup",
            Channel::PointerDown => "pointerdown",
            Channel::PointerUp => "pointerup",
            Channel::PointerMove => "pointermove",
            Channel::Wheel => "onWheel",
            Channel::Update => "update",
        }
    }

    /// Look up a channel by handler name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Channel> {
        Channel::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Index into per-channel tables.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
