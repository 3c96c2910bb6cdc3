//! Trusted pointer interaction description

use std::time::Duration;

use serde::{Deserialize, Serialize};
use webprobe_core_types::InteractiveElement;

/// Default pause between move, press and release.
pub const DEFAULT_POINTER_DWELL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    Move,
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub x: f64,
    pub y: f64,
}

/// Move, press and release at one viewport coordinate, with a dwell between
/// each event so hover-triggered UI can settle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSequence {
    pub x: f64,
    pub y: f64,
    pub dwell: Duration,
}

impl PointerSequence {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            dwell: DEFAULT_POINTER_DWELL,
        }
    }

    /// Sequence targeting the coordinates captured when the element was discovered.
    pub fn for_element(element: &InteractiveElement) -> Self {
        Self::at(element.x, element.y)
    }

    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = dwell;
        self
    }

    /// Events in dispatch order. Implementations sleep `dwell` between them.
    pub fn events(&self) -> [PointerEvent; 3] {
        [
            PointerEventKind::Move,
            PointerEventKind::Press,
            PointerEventKind::Release,
        ]
        .map(|kind| PointerEvent {
            kind,
            x: self.x,
            y: self.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_targets_discovery_coordinates() {
        let element = InteractiveElement::link(0, "Docs", "/docs").at(120.5, 48.0);
        let sequence = PointerSequence::for_element(&element);
        let events = sequence.events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.x == 120.5 && e.y == 48.0));
        assert_eq!(events[0].kind, PointerEventKind::Move);
        assert_eq!(events[2].kind, PointerEventKind::Release);
        assert_eq!(sequence.dwell, DEFAULT_POINTER_DWELL);
    }
}
