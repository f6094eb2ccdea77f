//! The screen: widget arena, window manager state and input routing.
//!
//! [`Screen`] owns every widget, the per-class action tables, the signal
//! bus and the compositor. Top-level widgets become *windows*: each gets a
//! stacking panel, a slot in the taskbar and a place in two orderings,
//! `focus_list` (taskbar order) and `ordered` (most recently focused first).
//!
//! Widget operations live in [`widget::lifecycle`](crate::widget::lifecycle)
//! and Box operations in [`widgets::container`](crate::widgets::container);
//! the window manager proper is split across [`wm`], [`input`] and
//! [`window_list`].

mod input;
mod window_list;
mod wm;

use std::collections::{HashMap, HashSet};
use std::io;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::ToolkitConfig;
use crate::event::binding::{ActionParam, ClassRegistry};
use crate::event::input::function_key;
use crate::event::signal::{HandlerId, Signal, SignalBus, SignalKind};
use crate::render::canvas::{Canvas, Glyphs};
use crate::render::compositor::{Compositor, PanelId};
use crate::render::driver::Backend;
use crate::widget::arena::{WidgetArena, WidgetKind};
use crate::widget::node::{WidgetBase, WidgetId};
use crate::widget::traits::{Widget, WidgetCtx};
use crate::widget::WIDGET_CLASS;
use crate::widgets::{button, container, entry, label, textview, tree};

pub use window_list::ListKind;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// How raw input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Input goes to the menu or the front window.
    #[default]
    Normal,
    /// Arrow keys move the front window.
    Move,
    /// Arrow keys resize the front window.
    Resize,
    /// A popup menu receives all input.
    Menu,
    /// The window list or action list receives all input.
    WindowList,
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// A signal observer with access to the screen.
pub type ScreenCallback = Rc<dyn Fn(&mut Screen, WidgetId, &Signal)>;

/// An entry of the action list (Alt-a).
#[derive(Clone)]
pub struct ScreenAction {
    pub label: String,
    pub callback: Rc<dyn Fn(&mut Screen)>,
}

impl std::fmt::Debug for ScreenAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenAction").field("label", &self.label).finish()
    }
}

/// Pointer state for title-bar drags.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Drag {
    pub(crate) widget: Option<WidgetId>,
    pub(crate) offset: i32,
}

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

pub struct Screen {
    pub(crate) widgets: WidgetArena,
    pub(crate) bus: SignalBus,
    pub(crate) callbacks: HashMap<(WidgetId, SignalKind), Vec<ScreenCallback>>,
    pub(crate) classes: ClassRegistry<Screen>,
    pub(crate) config: ToolkitConfig,
    pub(crate) glyphs: Glyphs,
    pub(crate) compositor: Compositor,

    /// Registered windows and their panels (created on first flush).
    pub(crate) nodes: HashMap<WidgetId, Option<PanelId>>,
    /// Windows that should come to the front when their panel is created.
    pub(crate) give_focus: HashSet<WidgetId>,
    /// Taskbar order.
    pub(crate) focus_list: Vec<WidgetId>,
    /// Most recently focused first.
    pub(crate) ordered: Vec<WidgetId>,
    pub(crate) mode: Mode,
    pub(crate) list: Option<window_list::ListWindow>,
    pub(crate) menu: Option<WidgetId>,
    pub(crate) actions: Vec<ScreenAction>,

    /// Windows waiting for a flush.
    pub(crate) pending: Vec<WidgetId>,
    /// Set while input is being processed.
    pub(crate) event_stack: bool,
    /// Set while the window list closes, so it does not register itself.
    pub(crate) lock_focus_list: bool,
    pub(crate) running: bool,
    pub(crate) drag: Drag,
    /// Source widget -> TextView scrolled by its PageUp/PageDown/Up/Down.
    pub(crate) scroll_attachments: HashMap<WidgetId, WidgetId>,
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("widgets", &self.widgets.len())
            .field("windows", &self.focus_list)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Screen {
    /// Create a screen of `cols` x `rows` cells. The bottom row is the
    /// taskbar.
    pub fn new(cols: u16, rows: u16, config: ToolkitConfig) -> Self {
        let classes = ClassRegistry::with_overrides(config.bindings.clone(), config.remaps.clone());
        let mut screen = Self {
            widgets: WidgetArena::new(),
            bus: SignalBus::new(),
            callbacks: HashMap::new(),
            classes,
            glyphs: Glyphs::for_mode(config.ascii_only),
            config,
            compositor: Compositor::new(cols, rows),
            nodes: HashMap::new(),
            give_focus: HashSet::new(),
            focus_list: Vec::new(),
            ordered: Vec::new(),
            mode: Mode::Normal,
            list: None,
            menu: None,
            actions: Vec::new(),
            pending: Vec::new(),
            event_stack: false,
            lock_focus_list: false,
            running: true,
            drag: Drag::default(),
            scroll_attachments: HashMap::new(),
        };
        screen.register_classes();
        screen.draw_taskbar();
        screen
    }

    fn register_classes(&mut self) {
        self.classes.class_init(WIDGET_CLASS, None, |table| {
            table.register_action("context-menu", context_menu, function_key(11), vec![]);
        });
        container::register_class(&mut self.classes);
        entry::register_class(&mut self.classes);
        tree::register_class(&mut self.classes);
        textview::register_class(&mut self.classes);
        label::register_class(&mut self.classes);
        button::register_class(&mut self.classes);
        wm::register_class(&mut self.classes);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Terminal columns.
    pub fn cols(&self) -> i32 {
        self.compositor.width as i32
    }

    /// Usable rows (the taskbar row excluded).
    pub fn rows(&self) -> i32 {
        self.compositor.height as i32 - 1
    }

    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    pub fn glyphs(&self) -> Glyphs {
        self.glyphs
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stop the application loop at the next opportunity.
    pub fn quit(&mut self) {
        debug!("quit requested");
        self.running = false;
    }

    pub fn arena(&self) -> &WidgetArena {
        &self.widgets
    }

    pub fn classes(&self) -> &ClassRegistry<Screen> {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut ClassRegistry<Screen> {
        &mut self.classes
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Windows in taskbar order.
    pub fn windows(&self) -> &[WidgetId] {
        &self.focus_list
    }

    /// Windows, most recently focused first.
    pub fn stacking(&self) -> &[WidgetId] {
        &self.ordered
    }

    /// The front window.
    pub fn front(&self) -> Option<WidgetId> {
        self.ordered.first().copied()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.widgets.contains(id)
    }

    pub fn widget(&self, id: WidgetId) -> Option<&WidgetBase> {
        self.widgets.base(id)
    }

    /// Downcast a leaf widget for reading.
    pub fn leaf<T: Widget + 'static>(&self, id: WidgetId) -> Option<&T> {
        self.widgets.leaf(id)
    }

    /// The popup menu, if one is shown.
    pub fn menu(&self) -> Option<WidgetId> {
        self.menu
    }

    // ── Widget creation ──────────────────────────────────────────────

    /// Insert a detached leaf widget. Its class is registered under
    /// "Widget" the first time it is seen.
    pub fn add_widget<W: Widget + 'static>(&mut self, widget: W) -> WidgetId {
        let class = widget.class_name();
        if !self.classes.contains(class) {
            self.classes.class_init(class, Some(WIDGET_CLASS), |_| {});
        }
        let mut widget: Box<dyn Widget> = Box::new(widget);
        let mut base = WidgetBase::new(class);
        widget.init(&mut base);
        let id = self.widgets.insert(base, WidgetKind::Leaf(widget));
        trace!(?id, class, "widget created");
        id
    }

    // ── Signals ──────────────────────────────────────────────────────

    /// Observe `kind` on `widget`; see [`SignalBus::connect`].
    pub fn connect<F>(&mut self, widget: WidgetId, kind: SignalKind, handler: F) -> HandlerId
    where
        F: FnMut(WidgetId, &Signal) + 'static,
    {
        self.bus.connect(widget, kind, handler)
    }

    /// Observe `kind` on `widget` with a handler that may claim the event.
    pub fn connect_handled<F>(&mut self, widget: WidgetId, kind: SignalKind, handler: F) -> HandlerId
    where
        F: FnMut(WidgetId, &Signal) -> bool + 'static,
    {
        self.bus.connect_handled(widget, kind, handler)
    }

    pub fn disconnect(&mut self, handler: HandlerId) -> bool {
        self.bus.disconnect(handler)
    }

    /// Observe `kind` on `widget` with a callback that may operate on the
    /// screen. Runs after the bus handlers unless one of them claimed the
    /// event.
    pub fn on<F>(&mut self, widget: WidgetId, kind: SignalKind, callback: F)
    where
        F: Fn(&mut Screen, WidgetId, &Signal) + 'static,
    {
        self.callbacks.entry((widget, kind)).or_default().push(Rc::new(callback));
    }

    /// Deliver `signal` on `widget`. Returns whether a handler claimed it.
    pub fn emit(&mut self, widget: WidgetId, signal: Signal) -> bool {
        if self.bus.emit(widget, &signal) {
            return true;
        }
        let callbacks = self.callbacks.get(&(widget, signal.kind())).cloned().unwrap_or_default();
        for callback in callbacks {
            callback(self, widget, &signal);
        }
        false
    }

    fn forget_observers(&mut self, widget: WidgetId) {
        self.bus.disconnect_all(widget);
        self.callbacks.retain(|(w, _), _| *w != widget);
    }

    // ── Leaf access ──────────────────────────────────────────────────

    /// Run `f` on a leaf widget of type `T` with a [`WidgetCtx`].
    ///
    /// Signals raised during the call are delivered afterwards, and the
    /// widget is redrawn if the call asked for it.
    pub fn with_leaf<T, R>(&mut self, id: WidgetId, f: impl FnOnce(&mut T, &mut WidgetCtx) -> R) -> Option<R>
    where
        T: Widget + 'static,
    {
        self.with_leaf_dyn(id, |widget, ctx| widget.as_any_mut().downcast_mut::<T>().map(|w| f(w, ctx)))
            .flatten()
    }

    /// Mutate a leaf widget of type `T`, then redraw it if it is on screen.
    pub fn modify_leaf<T, R>(&mut self, id: WidgetId, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: Widget + 'static,
    {
        let result = self.with_leaf::<T, R>(id, |widget, ctx| {
            let result = f(widget);
            if ctx.base.canvas.is_some() {
                ctx.queue_draw();
            }
            result
        })?;
        Some(result)
    }

    pub(crate) fn with_leaf_dyn<R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut dyn Widget, &mut WidgetCtx) -> R,
    ) -> Option<R> {
        let focused = self.has_focus(id);
        let glyphs = self.glyphs;
        let node = self.widgets.get_mut(id)?;
        let WidgetKind::Leaf(widget) = &mut node.kind else {
            return None;
        };
        let mut ctx = WidgetCtx::new(id, &mut node.base, focused, glyphs);
        let result = f(widget.as_mut(), &mut ctx);
        let WidgetCtx { mut events, redraw, .. } = ctx;
        events.extend(widget.take_signals());
        for signal in events {
            self.emit(id, signal);
        }
        if redraw {
            self.draw(id);
        }
        Some(result)
    }

    /// Paint a leaf into its canvas. Redraw requests made while drawing are
    /// ignored.
    pub(crate) fn draw_leaf(&mut self, id: WidgetId) {
        let focused = self.has_focus(id);
        let glyphs = self.glyphs;
        let Some(node) = self.widgets.get_mut(id) else {
            return;
        };
        let WidgetKind::Leaf(widget) = &mut node.kind else {
            return;
        };
        let Some(mut canvas) = node.base.canvas.take() else {
            return;
        };
        let mut ctx = WidgetCtx::new(id, &mut node.base, focused, glyphs);
        widget.draw(&mut ctx, &mut canvas);
        let WidgetCtx { mut events, .. } = ctx;
        node.base.canvas = Some(canvas);
        events.extend(widget.take_signals());
        for signal in events {
            self.emit(id, signal);
        }
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Invoke a named action of `widget`'s class.
    pub fn perform_action_named(&mut self, widget: WidgetId, name: &str, params: &[ActionParam]) -> bool {
        let Some(class) = self.widgets.base(widget).map(|b| b.class.clone()) else {
            warn!(?widget, action = name, "action on a dead widget");
            return false;
        };
        let Some(callback) = self.classes.resolve_action(&class, name) else {
            warn!(class, action = name, "no such action");
            return false;
        };
        callback(self, Some(widget), params)
    }

    /// Invoke the action bound to `keys` in `widget`'s class.
    pub fn perform_action_key(&mut self, widget: WidgetId, keys: &str) -> bool {
        let Some(class) = self.widgets.base(widget).map(|b| b.class.clone()) else {
            return false;
        };
        match self.classes.resolve_key(&class, keys) {
            Some((callback, params)) => callback(self, Some(widget), &params),
            None => false,
        }
    }

    // ── Flushing ─────────────────────────────────────────────────────

    /// Flush every window that asked for an update since the last call.
    /// Returns whether anything was flushed.
    pub fn run_idle(&mut self) -> bool {
        let mut flushed = false;
        while !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            for window in pending {
                if self.widgets.contains(window) {
                    self.update(window);
                }
            }
            flushed = true;
        }
        flushed
    }

    /// Flush pending updates and hand the changed cells to `backend`.
    pub fn commit(&mut self, backend: &mut dyn Backend) -> io::Result<usize> {
        self.run_idle();
        self.compositor.commit(backend)
    }

    /// The composed screen as text, one string per row.
    pub fn screen_text(&mut self) -> Vec<String> {
        self.run_idle();
        self.compositor.compose();
        (0..self.compositor.height).map(|y| self.compositor.row_text(y)).collect()
    }

    pub(crate) fn canvas_of(&self, id: WidgetId) -> Option<&Canvas> {
        self.widgets.base(id).and_then(WidgetBase::canvas)
    }
}

fn context_menu(screen: &mut Screen, widget: Option<WidgetId>, _: &[ActionParam]) -> bool {
    widget.is_some_and(|w| screen.emit(w, Signal::ContextMenu))
}
