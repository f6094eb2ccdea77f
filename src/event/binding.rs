//! Per-class action and key-binding tables.
//!
//! Every widget class owns a [`ClassTable`]: named actions and trigger
//! sequences bound to those actions (with stored parameters). When a class
//! is first registered its table starts as a *copy* of its superclass's
//! table, so registrations on a subclass never leak into ancestors.
//! Configuration overrides (action → trigger) are applied right after the
//! class's own registrations; key remaps are loaded lazily, once per class.
//!
//! The registry is generic over the context `C` the action callbacks receive
//! (the [`Screen`](crate::screen::Screen) for widget and window-manager
//! classes).

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::widget::node::WidgetId;

// ---------------------------------------------------------------------------
// ActionParam
// ---------------------------------------------------------------------------

/// One typed parameter stored with a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionParam {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl ActionParam {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ActionParam::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ActionParam::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ActionParam::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for ActionParam {
    fn from(v: i64) -> Self {
        ActionParam::Int(v)
    }
}

impl From<bool> for ActionParam {
    fn from(v: bool) -> Self {
        ActionParam::Bool(v)
    }
}

impl From<&str> for ActionParam {
    fn from(v: &str) -> Self {
        ActionParam::Str(v.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Actions and bindings
// ---------------------------------------------------------------------------

/// An action callback: receives the context, the widget the action is
/// performed on (if any) and the binding's parameters. Returns whether the
/// input was consumed.
pub type ActionFn<C> = Rc<dyn Fn(&mut C, Option<WidgetId>, &[ActionParam]) -> bool>;

/// A trigger sequence bound to a named action.
pub struct Binding<C> {
    pub action: String,
    pub params: Vec<ActionParam>,
    callback: ActionFn<C>,
}

impl<C> Clone for Binding<C> {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            params: self.params.clone(),
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<C> fmt::Debug for Binding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("action", &self.action)
            .field("params", &self.params)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ClassTable
// ---------------------------------------------------------------------------

/// Actions, bindings and remaps of one class.
pub struct ClassTable<C> {
    name: String,
    actions: HashMap<String, ActionFn<C>>,
    bindings: HashMap<String, Binding<C>>,
    remaps: Option<HashMap<String, String>>,
}

impl<C> Clone for ClassTable<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            actions: self.actions.clone(),
            bindings: self.bindings.clone(),
            remaps: self.remaps.clone(),
        }
    }
}

impl<C> fmt::Debug for ClassTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.actions.keys().collect();
        actions.sort();
        f.debug_struct("ClassTable")
            .field("name", &self.name)
            .field("actions", &actions)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl<C> ClassTable<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
            bindings: HashMap::new(),
            remaps: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a named action, optionally binding it to `trigger` with `params`.
    pub fn register_action<F>(&mut self, name: &str, callback: F, trigger: Option<&str>, params: Vec<ActionParam>)
    where
        F: Fn(&mut C, Option<WidgetId>, &[ActionParam]) -> bool + 'static,
    {
        self.actions.insert(name.to_owned(), Rc::new(callback));
        if let Some(trigger) = trigger {
            self.register_binding(name, trigger, params);
        }
    }

    /// Bind `trigger` to the action called `name`, replacing any prior
    /// binding for that trigger.
    ///
    /// An empty `name` removes the binding for `trigger` (masking an
    /// inherited one). An unknown action name is reported and ignored.
    pub fn register_binding(&mut self, name: &str, trigger: &str, params: Vec<ActionParam>) -> bool {
        if trigger.is_empty() {
            return false;
        }
        if name.is_empty() {
            return self.bindings.remove(trigger).is_some();
        }
        let Some(callback) = self.actions.get(name) else {
            tracing::warn!(class = %self.name, action = name, "binding refers to an unregistered action");
            return false;
        };
        self.bindings.insert(
            trigger.to_owned(),
            Binding {
                action: name.to_owned(),
                params,
                callback: Rc::clone(callback),
            },
        );
        true
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn action(&self, name: &str) -> Option<&ActionFn<C>> {
        self.actions.get(name)
    }

    pub fn binding(&self, trigger: &str) -> Option<&Binding<C>> {
        self.bindings.get(trigger)
    }

    /// All triggers bound to `action`, sorted.
    pub fn triggers_for(&self, action: &str) -> Vec<&str> {
        let mut triggers: Vec<&str> = self
            .bindings
            .iter()
            .filter(|(_, b)| b.action == action)
            .map(|(t, _)| t.as_str())
            .collect();
        triggers.sort_unstable();
        triggers
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Resolve the callback and parameters bound to `keys`.
    fn resolve(&self, keys: &str) -> Option<(ActionFn<C>, Vec<ActionParam>)> {
        self.bindings
            .get(keys)
            .map(|b| (Rc::clone(&b.callback), b.params.clone()))
    }
}

// ---------------------------------------------------------------------------
// ClassRegistry
// ---------------------------------------------------------------------------

/// All class tables, their superclass links and the configured overrides.
pub struct ClassRegistry<C> {
    classes: HashMap<String, ClassTable<C>>,
    parents: HashMap<String, Option<String>>,
    binding_overrides: HashMap<String, Vec<(String, String)>>,
    remap_source: HashMap<String, HashMap<String, String>>,
}

impl<C> Default for ClassRegistry<C> {
    fn default() -> Self {
        Self {
            classes: HashMap::new(),
            parents: HashMap::new(),
            binding_overrides: HashMap::new(),
            remap_source: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for ClassRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.parents)
            .finish()
    }
}

impl<C> ClassRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that applies `bindings` (class → [(action, trigger)]) at
    /// class registration and serves `remaps` (class → {from → to}).
    pub fn with_overrides(
        bindings: HashMap<String, Vec<(String, String)>>,
        remaps: HashMap<String, HashMap<String, String>>,
    ) -> Self {
        Self {
            binding_overrides: bindings,
            remap_source: remaps,
            ..Self::default()
        }
    }

    /// Register class `name` under `parent`, the first time only.
    ///
    /// The new table is a copy of the parent's; `init` then adds the class's
    /// own actions and bindings, and finally the configured overrides for
    /// `name` are applied. Returns `false` if the class already existed.
    pub fn class_init<F>(&mut self, name: &str, parent: Option<&str>, init: F) -> bool
    where
        F: FnOnce(&mut ClassTable<C>),
    {
        if self.classes.contains_key(name) {
            return false;
        }
        let mut table = match parent.and_then(|p| self.classes.get(p)) {
            Some(parent_table) => {
                let mut copy = parent_table.clone();
                copy.name = name.to_owned();
                copy.remaps = None;
                copy
            }
            None => {
                if let Some(p) = parent {
                    tracing::warn!(class = name, parent = p, "superclass is not registered");
                }
                ClassTable::new(name)
            }
        };
        init(&mut table);
        if let Some(overrides) = self.binding_overrides.get(name) {
            for (action, trigger) in overrides {
                table.register_binding(action, trigger, Vec::new());
            }
        }
        self.parents.insert(name.to_owned(), parent.map(str::to_owned));
        self.classes.insert(name.to_owned(), table);
        true
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn table(&self, class: &str) -> Option<&ClassTable<C>> {
        self.classes.get(class)
    }

    pub fn table_mut(&mut self, class: &str) -> Option<&mut ClassTable<C>> {
        self.classes.get_mut(class)
    }

    pub fn parent_of(&self, class: &str) -> Option<&str> {
        self.parents.get(class).and_then(|p| p.as_deref())
    }

    /// Whether `class` is `ancestor` or derives from it.
    pub fn is_a(&self, class: &str, ancestor: &str) -> bool {
        let mut current = Some(class);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent_of(c);
        }
        false
    }

    /// Add an action to an already-registered class.
    pub fn register_action<F>(
        &mut self,
        class: &str,
        name: &str,
        callback: F,
        trigger: Option<&str>,
        params: Vec<ActionParam>,
    ) -> bool
    where
        F: Fn(&mut C, Option<WidgetId>, &[ActionParam]) -> bool + 'static,
    {
        match self.classes.get_mut(class) {
            Some(table) => {
                table.register_action(name, callback, trigger, params);
                true
            }
            None => {
                tracing::warn!(class, action = name, "action registered on an unknown class");
                false
            }
        }
    }

    /// Bind a trigger on an already-registered class (empty `name` unbinds).
    pub fn register_binding(&mut self, class: &str, name: &str, trigger: &str, params: Vec<ActionParam>) -> bool {
        self.classes
            .get_mut(class)
            .is_some_and(|table| table.register_binding(name, trigger, params))
    }

    /// The callback and stored parameters bound to `keys` in `class`.
    pub fn resolve_key(&self, class: &str, keys: &str) -> Option<(ActionFn<C>, Vec<ActionParam>)> {
        self.classes.get(class)?.resolve(keys)
    }

    /// The callback registered as `name` in `class`.
    pub fn resolve_action(&self, class: &str, name: &str) -> Option<ActionFn<C>> {
        self.classes.get(class)?.action(name).cloned()
    }

    /// Substitute `keys` through the class's remap table.
    ///
    /// The table is populated from the configured remaps on first use.
    pub fn remap_keys<'k>(&mut self, class: &str, keys: &'k str) -> Cow<'k, str> {
        let Some(table) = self.classes.get_mut(class) else {
            return Cow::Borrowed(keys);
        };
        let remaps = table
            .remaps
            .get_or_insert_with(|| self.remap_source.get(class).cloned().unwrap_or_default());
        match remaps.get(keys) {
            Some(to) => Cow::Owned(to.clone()),
            None => Cow::Borrowed(keys),
        }
    }

    /// Invoke the action bound to `keys`, for contexts that do not own the
    /// registry.
    pub fn perform_action_key(&self, ctx: &mut C, class: &str, target: Option<WidgetId>, keys: &str) -> bool {
        match self.resolve_key(class, keys) {
            Some((callback, params)) => callback(ctx, target, &params),
            None => false,
        }
    }

    /// Invoke the action called `name` directly with `params`.
    pub fn perform_action_named(
        &self,
        ctx: &mut C,
        class: &str,
        target: Option<WidgetId>,
        name: &str,
        params: &[ActionParam],
    ) -> bool {
        match self.resolve_action(class, name) {
            Some(callback) => callback(ctx, target, params),
            None => false,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<String>;

    fn logging(tag: &'static str) -> impl Fn(&mut Log, Option<WidgetId>, &[ActionParam]) -> bool {
        move |log, _, params| {
            let suffix: Vec<String> = params.iter().map(|p| format!("{p:?}")).collect();
            log.push(format!("{tag}{}", suffix.join(",")));
            true
        }
    }

    fn base_registry() -> ClassRegistry<Log> {
        let mut reg = ClassRegistry::new();
        reg.class_init("Widget", None, |t| {
            t.register_action("context-menu", logging("menu"), Some("\x1b[29~"), vec![]);
        });
        reg
    }

    #[test]
    fn subclass_inherits_a_copy() {
        let mut reg = base_registry();
        reg.class_init("Tree", Some("Widget"), |t| {
            t.register_action("move-up", logging("up"), Some("\x1b[A"), vec![]);
        });
        let mut log = Log::new();
        assert!(reg.perform_action_key(&mut log, "Tree", None, "\x1b[29~"));
        assert!(reg.perform_action_key(&mut log, "Tree", None, "\x1b[A"));
        assert_eq!(log, vec!["menu", "up"]);
    }

    #[test]
    fn subclass_registration_never_mutates_superclass() {
        let mut reg = base_registry();
        reg.class_init("Tree", Some("Widget"), |_| {});
        reg.register_action("Tree", "move-up", logging("up"), Some("k"), vec![]);
        reg.register_binding("Tree", "", "\x1b[29~", vec![]);

        let widget = reg.table("Widget").unwrap();
        assert!(!widget.has_action("move-up"));
        assert!(widget.binding("k").is_none());
        assert!(widget.binding("\x1b[29~").is_some());
        assert!(reg.table("Tree").unwrap().binding("\x1b[29~").is_none());
    }

    #[test]
    fn empty_name_removes_binding() {
        let mut reg = base_registry();
        assert!(reg.register_binding("Widget", "", "\x1b[29~", vec![]));
        let mut log = Log::new();
        assert!(!reg.perform_action_key(&mut log, "Widget", None, "\x1b[29~"));
        assert!(log.is_empty());
    }

    #[test]
    fn unknown_action_binding_is_ignored() {
        let mut reg = base_registry();
        assert!(!reg.register_binding("Widget", "no-such-action", "z", vec![]));
        assert!(reg.table("Widget").unwrap().binding("z").is_none());
    }

    #[test]
    fn rebinding_replaces_prior_association() {
        let mut reg = base_registry();
        reg.register_action("Widget", "other", logging("other"), None, vec![]);
        reg.register_binding("Widget", "other", "\x1b[29~", vec![]);
        let mut log = Log::new();
        reg.perform_action_key(&mut log, "Widget", None, "\x1b[29~");
        assert_eq!(log, vec!["other"]);
    }

    #[test]
    fn stored_params_are_passed() {
        let mut reg = base_registry();
        reg.register_action("Widget", "switch", logging("switch"), Some("\x1b1"), vec![ActionParam::Int(0)]);
        reg.register_binding("Widget", "switch", "\x1b2", vec![ActionParam::Int(1)]);
        let mut log = Log::new();
        reg.perform_action_key(&mut log, "Widget", None, "\x1b2");
        reg.perform_action_named(&mut log, "Widget", None, "switch", &["x".into()]);
        assert_eq!(log, vec!["switchInt(1)", "switchStr(\"x\")"]);
    }

    #[test]
    fn overrides_apply_at_class_init() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "Tree".to_owned(),
            vec![("move-up".to_owned(), "k".to_owned()), ("bogus".to_owned(), "q".to_owned())],
        );
        let mut reg: ClassRegistry<Log> = ClassRegistry::with_overrides(overrides, HashMap::new());
        reg.class_init("Widget", None, |_| {});
        reg.class_init("Tree", Some("Widget"), |t| {
            t.register_action("move-up", logging("up"), Some("\x1b[A"), vec![]);
        });
        let tree = reg.table("Tree").unwrap();
        assert_eq!(tree.triggers_for("move-up"), vec!["\x1b[A", "k"]);
        assert!(tree.binding("q").is_none());
    }

    #[test]
    fn remap_is_loaded_lazily_per_class() {
        let mut remaps = HashMap::new();
        remaps.insert(
            "Tree".to_owned(),
            HashMap::from([("j".to_owned(), "\x1b[B".to_owned())]),
        );
        let mut reg: ClassRegistry<Log> = ClassRegistry::with_overrides(HashMap::new(), remaps);
        reg.class_init("Widget", None, |_| {});
        reg.class_init("Tree", Some("Widget"), |_| {});
        assert_eq!(reg.remap_keys("Tree", "j"), "\x1b[B");
        assert_eq!(reg.remap_keys("Tree", "x"), "x");
        assert_eq!(reg.remap_keys("Widget", "j"), "j");
    }

    #[test]
    fn class_init_runs_once() {
        let mut reg = base_registry();
        assert!(!reg.class_init("Widget", None, |t| {
            t.register_action("late", logging("late"), None, vec![]);
        }));
        assert!(!reg.table("Widget").unwrap().has_action("late"));
    }

    #[test]
    fn is_a_follows_parents() {
        let mut reg = base_registry();
        reg.class_init("Box", Some("Widget"), |_| {});
        reg.class_init("Window", Some("Box"), |_| {});
        assert!(reg.is_a("Window", "Widget"));
        assert!(reg.is_a("Box", "Box"));
        assert!(!reg.is_a("Widget", "Box"));
        assert_eq!(reg.parent_of("Window"), Some("Box"));
    }
}
