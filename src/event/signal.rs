//! Structural events ("signals") and their observer registry.
//!
//! Widgets raise [`Signal`]s through the [`SignalBus`]. Observers subscribe
//! per widget and per [`SignalKind`]; emission is synchronous and runs the
//! handlers in connection order. Handlers may claim an event by returning
//! `true`, which stops emission (used by `key-pressed` and `clicked`, where
//! a claimed event is not passed on to the widget's own behavior).

use std::collections::HashMap;

use crate::event::input::MouseEvent;
use crate::widget::node::WidgetId;
use crate::widgets::tree::RowKey;

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// An event raised by a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Destroy,
    Map,
    Draw,
    Hide,
    GainedFocus,
    LostFocus,
    Activate,
    SizeRequest,
    PositionSet { x: i32, y: i32 },
    SizeChanged { old_width: i32, old_height: i32 },
    KeyPressed(String),
    Clicked { event: MouseEvent, x: i32, y: i32 },
    Expose { x: i32, y: i32, width: i32, height: i32 },
    ContextMenu,
    /// Tree selection moved.
    SelectionChanged { old: Option<RowKey>, current: Option<RowKey> },
    /// Tree view scrolled by the adjustment actually taken.
    Scrolled(i32),
    /// A choice row was flipped.
    Toggled(RowKey),
    /// A row with children was expanded or collapsed.
    CollapseToggled { key: RowKey, collapsed: bool },
    /// The text of an entry was edited.
    TextChanged,
}

/// Discriminant of a [`Signal`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Destroy,
    Map,
    Draw,
    Hide,
    GainedFocus,
    LostFocus,
    Activate,
    SizeRequest,
    PositionSet,
    SizeChanged,
    KeyPressed,
    Clicked,
    Expose,
    ContextMenu,
    SelectionChanged,
    Scrolled,
    Toggled,
    CollapseToggled,
    TextChanged,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::Destroy => SignalKind::Destroy,
            Signal::Map => SignalKind::Map,
            Signal::Draw => SignalKind::Draw,
            Signal::Hide => SignalKind::Hide,
            Signal::GainedFocus => SignalKind::GainedFocus,
            Signal::LostFocus => SignalKind::LostFocus,
            Signal::Activate => SignalKind::Activate,
            Signal::SizeRequest => SignalKind::SizeRequest,
            Signal::PositionSet { .. } => SignalKind::PositionSet,
            Signal::SizeChanged { .. } => SignalKind::SizeChanged,
            Signal::KeyPressed(_) => SignalKind::KeyPressed,
            Signal::Clicked { .. } => SignalKind::Clicked,
            Signal::Expose { .. } => SignalKind::Expose,
            Signal::ContextMenu => SignalKind::ContextMenu,
            Signal::SelectionChanged { .. } => SignalKind::SelectionChanged,
            Signal::Scrolled(_) => SignalKind::Scrolled,
            Signal::Toggled(_) => SignalKind::Toggled,
            Signal::CollapseToggled { .. } => SignalKind::CollapseToggled,
            Signal::TextChanged => SignalKind::TextChanged,
        }
    }
}

// ---------------------------------------------------------------------------
// SignalBus
// ---------------------------------------------------------------------------

/// Identifies one connected handler, for [`SignalBus::disconnect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Box<dyn FnMut(WidgetId, &Signal) -> bool>;

/// Observer lists keyed by (widget, signal kind).
#[derive(Default)]
pub struct SignalBus {
    handlers: HashMap<(WidgetId, SignalKind), Vec<(HandlerId, Handler)>>,
    next_id: u64,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `kind` on `widget`. The handler never claims the event.
    pub fn connect<F>(&mut self, widget: WidgetId, kind: SignalKind, mut handler: F) -> HandlerId
    where
        F: FnMut(WidgetId, &Signal) + 'static,
    {
        self.connect_handled(widget, kind, move |id, signal| {
            handler(id, signal);
            false
        })
    }

    /// Observe `kind` on `widget` with a handler that may claim the event by
    /// returning `true`.
    pub fn connect_handled<F>(&mut self, widget: WidgetId, kind: SignalKind, handler: F) -> HandlerId
    where
        F: FnMut(WidgetId, &Signal) -> bool + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry((widget, kind))
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Remove one handler. Returns whether it was connected.
    pub fn disconnect(&mut self, handler: HandlerId) -> bool {
        for list in self.handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(id, _)| *id == handler) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Drop every handler attached to `widget`.
    pub fn disconnect_all(&mut self, widget: WidgetId) {
        self.handlers.retain(|(w, _), _| *w != widget);
    }

    /// Run the handlers for `signal` on `widget` in connection order.
    ///
    /// Returns `true` as soon as a handler claims the event; remaining
    /// handlers are skipped.
    pub fn emit(&mut self, widget: WidgetId, signal: &Signal) -> bool {
        let Some(list) = self.handlers.get_mut(&(widget, signal.kind())) else {
            return false;
        };
        for (_, handler) in list.iter_mut() {
            if handler(widget, signal) {
                return true;
            }
        }
        false
    }

    /// Number of handlers attached to `widget`.
    pub fn handler_count(&self, widget: WidgetId) -> usize {
        self.handlers
            .iter()
            .filter(|((w, _), _)| *w == widget)
            .map(|(_, list)| list.len())
            .sum()
    }
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("subscriptions", &self.handlers.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use slotmap::SlotMap;

    use super::*;

    fn two_ids() -> (WidgetId, WidgetId) {
        let mut map: SlotMap<WidgetId, ()> = SlotMap::with_key();
        (map.insert(()), map.insert(()))
    }

    #[test]
    fn handlers_run_in_connection_order() {
        let (a, _) = two_ids();
        let mut bus = SignalBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = log.clone();
            bus.connect(a, SignalKind::Draw, move |_, _| log.borrow_mut().push(tag));
        }
        assert!(!bus.emit(a, &Signal::Draw));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn emission_is_scoped_to_widget_and_kind() {
        let (a, b) = two_ids();
        let mut bus = SignalBus::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        bus.connect(a, SignalKind::Map, move |_, _| *h.borrow_mut() += 1);
        bus.emit(b, &Signal::Map);
        bus.emit(a, &Signal::Draw);
        assert_eq!(*hits.borrow(), 0);
        bus.emit(a, &Signal::Map);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn claiming_handler_stops_emission() {
        let (a, _) = two_ids();
        let mut bus = SignalBus::new();
        let later = Rc::new(RefCell::new(false));
        bus.connect_handled(a, SignalKind::KeyPressed, |_, s| {
            matches!(s, Signal::KeyPressed(k) if k == "x")
        });
        let l = later.clone();
        bus.connect(a, SignalKind::KeyPressed, move |_, _| *l.borrow_mut() = true);

        assert!(bus.emit(a, &Signal::KeyPressed("x".into())));
        assert!(!*later.borrow());
        assert!(!bus.emit(a, &Signal::KeyPressed("y".into())));
        assert!(*later.borrow());
    }

    #[test]
    fn disconnect_removes_single_handler() {
        let (a, _) = two_ids();
        let mut bus = SignalBus::new();
        let h1 = bus.connect(a, SignalKind::Draw, |_, _| {});
        bus.connect(a, SignalKind::Map, |_, _| {});
        assert_eq!(bus.handler_count(a), 2);
        assert!(bus.disconnect(h1));
        assert!(!bus.disconnect(h1));
        assert_eq!(bus.handler_count(a), 1);
        bus.disconnect_all(a);
        assert_eq!(bus.handler_count(a), 0);
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Signal::Scrolled(3).kind(), SignalKind::Scrolled);
        assert_eq!(
            Signal::SizeChanged { old_width: 1, old_height: 2 }.kind(),
            SignalKind::SizeChanged
        );
    }
}
