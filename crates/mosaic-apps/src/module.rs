//! Module definitions: the code object a resolver yields for an
//! application or sub-module.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use mosaic_events::EventHandler;
use serde_json::Value;

use crate::application::Application;

/// Callback run once an application is ready.
pub type OnLoad = Arc<dyn Fn(&Application) + Send + Sync>;

/// The handler bound to a subscribed topic.
#[derive(Clone)]
pub enum HandlerRef {
    /// A method of the application, looked up by name at registration.
    Method(String),
    /// A handler given directly.
    Inline(EventHandler),
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Self::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

/// Per-language support an application declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageSupport {
    /// The language ships its own stylesheet.
    pub custom_css: bool,
}

/// An application's (or sub-module's) code object.
#[derive(Clone, Default)]
pub struct ModuleDefinition {
    /// Deep-mergeable state.
    pub state: Value,
    /// Named handlers.
    pub methods: BTreeMap<String, EventHandler>,
    /// Topic subscriptions.
    pub subscribe: BTreeMap<String, HandlerRef>,
    /// External script identifiers.
    pub external_scripts: Vec<String>,
    /// Sub-module identifiers, merged in order.
    pub sub_modules: Vec<String>,
    /// Whether `app-build-config.json` exists.
    pub has_config_file: bool,
    /// Supported languages.
    pub i18n: BTreeMap<String, LanguageSupport>,
    /// Stylesheet names.
    pub css: Vec<String>,
    /// Keyboard shortcuts: key to topic.
    pub shortcuts: BTreeMap<String, String>,
    /// Run once the application is ready.
    pub on_load: Option<OnLoad>,
}

impl ModuleDefinition {
    /// An empty definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial state.
    #[must_use]
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Add a named method.
    #[must_use]
    pub fn with_method(mut self, name: impl Into<String>, handler: EventHandler) -> Self {
        self.methods.insert(name.into(), handler);
        self
    }

    /// Subscribe `topic` to `handler`.
    #[must_use]
    pub fn subscribing(mut self, topic: impl Into<String>, handler: HandlerRef) -> Self {
        self.subscribe.insert(topic.into(), handler);
        self
    }

    /// Add an external script.
    #[must_use]
    pub fn with_external_script(mut self, script: impl Into<String>) -> Self {
        self.external_scripts.push(script.into());
        self
    }

    /// Add a sub-module.
    #[must_use]
    pub fn with_sub_module(mut self, id: impl Into<String>) -> Self {
        self.sub_modules.push(id.into());
        self
    }

    /// Declare a build configuration file.
    #[must_use]
    pub fn with_config_file(mut self) -> Self {
        self.has_config_file = true;
        self
    }

    /// Declare support for `language`.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>, custom_css: bool) -> Self {
        self.i18n
            .insert(language.into(), LanguageSupport { custom_css });
        self
    }

    /// Add a stylesheet.
    #[must_use]
    pub fn with_css(mut self, name: impl Into<String>) -> Self {
        self.css.push(name.into());
        self
    }

    /// Bind `alt+<key>` to publishing `topic`.
    #[must_use]
    pub fn with_shortcut(mut self, key: impl Into<String>, topic: impl Into<String>) -> Self {
        self.shortcuts.insert(key.into(), topic.into());
        self
    }

    /// Run `callback` once the application is ready.
    #[must_use]
    pub fn on_load(mut self, callback: OnLoad) -> Self {
        self.on_load = Some(callback);
        self
    }

    /// Merge a sub-module into this definition.
    ///
    /// State deep-merges unless the sub-module's is null. Methods and keyed
    /// tables merge by key with the sub-module winning; lists append
    /// without duplicates. `subscribe` and `sub_modules` are left untouched.
    pub fn absorb(&mut self, sub: &ModuleDefinition) {
        if !sub.state.is_null() {
            mosaic_core::deep_merge(&mut self.state, &sub.state);
        }
        self.methods
            .extend(sub.methods.iter().map(|(k, v)| (k.clone(), Arc::clone(v))));
        self.i18n.extend(sub.i18n.iter().map(|(k, v)| (k.clone(), *v)));
        self.shortcuts
            .extend(sub.shortcuts.iter().map(|(k, v)| (k.clone(), v.clone())));
        append_unique(&mut self.external_scripts, &sub.external_scripts);
        append_unique(&mut self.css, &sub.css);
        self.has_config_file |= sub.has_config_file;
        if let Some(on_load) = &sub.on_load {
            self.on_load = Some(Arc::clone(on_load));
        }
    }
}

fn append_unique(into: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("state", &self.state)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("subscribe", &self.subscribe)
            .field("external_scripts", &self.external_scripts)
            .field("sub_modules", &self.sub_modules)
            .field("has_config_file", &self.has_config_file)
            .field("i18n", &self.i18n)
            .field("css", &self.css)
            .field("shortcuts", &self.shortcuts)
            .field("has_on_load", &self.on_load.is_some())
            .finish()
    }
}
