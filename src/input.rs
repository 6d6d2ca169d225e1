//! Raw input events delivered by the host environment.
//!
//! The host owns the actual window/event source; while playback is running it
//! forwards these to [`Player::handle_input`](crate::player::Player). Each
//! event maps to exactly one dispatch channel.

use crate::channel::Channel;
use crate::event_bus::Event;

/// A raw input event from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { code: String },
    KeyUp { code: String },
    PointerDown { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    Wheel { delta_y: f32 },
}

impl InputEvent {
    /// The channel this event is dispatched on.
    pub fn channel(&self) -> Channel {
        match self {
            InputEvent::KeyDown { .. } => Channel::KeyDown,
            InputEvent::KeyUp { .. } => Channel::KeyUp,
            InputEvent::PointerDown { .. } => Channel::PointerDown,
            InputEvent::PointerUp { .. } => Channel::PointerUp,
            InputEvent::PointerMove { .. } => Channel::PointerMove,
            InputEvent::Wheel { .. } => Channel::Wheel,
        }
    }

    /// The payload handed to handlers, unchanged from the raw event.
    pub fn to_event(&self) -> Event {
        match self {
            InputEvent::KeyDown { code } | InputEvent::KeyUp { code } => {
                Event::Key { code: code.clone() }
            }
            InputEvent::PointerDown { x, y }
            | InputEvent::PointerUp { x, y }
            | InputEvent::PointerMove { x, y } => Event::Pointer { x: *x, y: *y },
            InputEvent::Wheel { delta_y } => Event::Wheel { delta_y: *delta_y },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mapping() {
        let event = InputEvent::Wheel { delta_y: 1.0 };
        assert_eq!(event.channel(), Channel::Wheel);
        assert_eq!(event.to_event(), Event::Wheel { delta_y: 1.0 });

        let event = InputEvent::KeyDown { code: "KeyW".into() };
        assert_eq!(event.channel(), Channel::KeyDown);
        assert_eq!(event.to_event(), Event::Key { code: "KeyW".into() });
    }
}
