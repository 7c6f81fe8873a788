//! The top-level search coordinator.
//!
//! Owns the configuration store, the live search features (one per tab),
//! and the theme manager, and translates the host UI's events (tab
//! changes, the search button, the toolbar combos) into operations on
//! them. Host signals can re-enter while a theme is being applied; the
//! guards in [`crate::guards`] keep those paths single-flight.

use std::time::{Duration, Instant};

use geosearch_config::{ConfigError, ConfigStore, SearchSpec};
use geosearch_host::Host;
use geosearch_theme::{ThemeManager, ThemeSelector};
use geosearch_view::PanMode;
use tracing::{debug, info, warn};

use crate::{
    feature::{SearchFeature, SearchInputs, Suggestion},
    guards::{ReentryGuard, WarnLimiter},
};

/// UI combobox index to pan-mode code. The historical bbox-fit mode 3 is
/// intentionally unassigned, so the codes jump from 1 to 4.
const PAN_MODE_TABLE: [i32; 5] = [0, 1, 4, 5, 6];

/// Delay between a configuration change and the dialog rebuild, giving the
/// host time to commit project-variable writes.
const REBUILD_DELAY: Duration = Duration::from_millis(500);

/// Spacing of repeated not-ready warnings.
const WARN_INTERVAL: Duration = Duration::from_secs(1);

/// Placeholder entry of the theme combobox; selecting it applies nothing.
const THEME_PLACEHOLDER: &str = "テーマ選択";

/// Parses a scale-combo text such as `1:5,000` or `5000` into a scale
/// denominator. Unparsable text (including the automatic entry) is `None`.
pub fn parse_scale_text(text: &str) -> Option<f64> {
    let after_ratio = text.rsplit(':').next().unwrap_or(text);
    let digits = after_ratio.replace(',', "");
    let digits = digits.trim();
    digits.parse::<i64>().ok().map(|scale| scale as f64)
}

/// Top-level coordinator wiring configuration, search features, themes and
/// the result views together.
#[derive(Debug)]
pub struct SearchController {
    /// Configuration loading and persistence.
    store: ConfigStore,
    /// The merged spec behind the current dialog.
    spec: Option<SearchSpec>,
    /// One live feature per tab, in spec order.
    features: Vec<SearchFeature>,
    /// Index of the active feature.
    current: Option<usize>,
    /// Theme application and snapshots.
    themes: ThemeManager,
    /// Toolbar theme chooser state.
    selector: ThemeSelector,
    /// Additive-theme toggle state.
    theme_additive: bool,
    /// Pan-mode combo state.
    pan_mode: PanMode,
    /// Scale combo state.
    fixed_scale: Option<f64>,
    /// Show-layer checkbox state.
    show_layer_name: bool,
    /// Single-flight guard for theme application.
    apply_guard: ReentryGuard,
    /// Suppresses theme-chooser rebuilds while an apply is in progress.
    suppress_update: ReentryGuard,
    /// Set once the host UI finished initializing.
    gui_ready: bool,
    /// Limits not-ready warnings to one per second.
    warn_limiter: WarnLimiter,
    /// When a scheduled rebuild becomes due.
    rebuild_at: Option<Instant>,
}

impl SearchController {
    /// Creates a controller over a configuration store.
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            spec: None,
            features: Vec::new(),
            current: None,
            themes: ThemeManager::new(),
            selector: ThemeSelector::new(),
            theme_additive: false,
            pan_mode: PanMode::default(),
            fixed_scale: None,
            show_layer_name: false,
            apply_guard: ReentryGuard::new(),
            suppress_update: ReentryGuard::new(),
            gui_ready: false,
            warn_limiter: WarnLimiter::new(WARN_INTERVAL),
            rebuild_at: None,
        }
    }

    /// The configuration store.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// The merged spec of the current dialog.
    pub fn spec(&self) -> Option<&SearchSpec> {
        self.spec.as_ref()
    }

    /// The live features.
    pub fn features(&self) -> &[SearchFeature] {
        &self.features
    }

    /// The active feature.
    pub fn current_feature(&self) -> Option<&SearchFeature> {
        self.current.and_then(|index| self.features.get(index))
    }

    /// Mutable access to the active feature (result model paging etc.).
    pub fn current_feature_mut(&mut self) -> Option<&mut SearchFeature> {
        self.current.and_then(|index| self.features.get_mut(index))
    }

    /// The theme manager.
    pub fn themes_mut(&mut self) -> &mut ThemeManager {
        &mut self.themes
    }

    /// (Re)builds the dialog state: loads the merged configuration,
    /// creates one feature per tab carrying the current toolbar settings,
    /// and activates the first tab.
    pub fn build(&mut self, host: &dyn Host) -> Result<Vec<Suggestion>, ConfigError> {
        if let Some(previous) = self.current_feature_index_mut() {
            previous.unload();
        }
        let spec = self.store.load(host)?;
        self.features = spec
            .tabs
            .iter()
            .map(|tab| {
                let mut feature = SearchFeature::new(tab.clone(), spec.page_limit);
                feature.set_theme_additive(self.theme_additive);
                feature.set_pan_mode(self.pan_mode);
                feature.set_fixed_scale(self.fixed_scale);
                feature.set_show_layer_name(self.show_layer_name);
                feature
            })
            .collect();
        info!(tabs = self.features.len(), "search dialog built");
        self.spec = Some(spec);
        self.current = None;
        Ok(self.set_current_tab(host, 0))
    }

    /// The active feature, for unloading.
    fn current_feature_index_mut(&mut self) -> Option<&mut SearchFeature> {
        self.current.and_then(|index| self.features.get_mut(index))
    }

    /// Activates a tab: unloads the previous one, loads the new one, and
    /// returns its input suggestions.
    pub fn set_current_tab(&mut self, host: &dyn Host, index: usize) -> Vec<Suggestion> {
        if let Some(previous) = self.current_feature_index_mut() {
            previous.unload();
        }
        let Some(feature) = self.features.get_mut(index) else {
            self.current = None;
            return Vec::new();
        };
        self.current = Some(index);
        feature.load(host)
    }

    /// Activates the first tab of a group (the group-level tab bar).
    pub fn set_current_group(&mut self, host: &dyn Host, group: &str) -> Vec<Suggestion> {
        let Some(index) = self.spec.as_ref().and_then(|spec| {
            spec.group_order()
                .into_iter()
                .find(|(name, _)| name == group)
                .and_then(|(_, indices)| indices.first().copied())
        }) else {
            return Vec::new();
        };
        self.set_current_tab(host, index)
    }

    /// Runs the active tab's search with the given inputs. Returns the hit
    /// count, zero when no tab is active.
    pub fn search(&mut self, host: &dyn Host, inputs: &SearchInputs) -> usize {
        let Some(index) = self.current else {
            warn!("search pressed with no active tab");
            return 0;
        };
        let themes = &mut self.themes;
        self.features[index].search(host, themes, inputs)
    }

    /// Runs the active tab's search through the host task manager.
    pub fn search_deferred(&mut self, host: &dyn Host, inputs: &SearchInputs) {
        let Some(index) = self.current else {
            warn!("search pressed with no active tab");
            return;
        };
        let themes = &mut self.themes;
        self.features[index].search_deferred(host, themes, inputs);
    }

    /// Toolbar additive-theme toggle: the new state reaches every feature.
    pub fn on_additive_toggled(&mut self, checked: bool) {
        self.theme_additive = checked;
        for feature in &mut self.features {
            feature.set_theme_additive(checked);
        }
    }

    /// Pan-mode combo change, by UI index.
    pub fn on_pan_mode_index(&mut self, ui_index: usize) {
        let code = PAN_MODE_TABLE.get(ui_index).copied().unwrap_or(0);
        self.pan_mode = PanMode::from_code(code);
        for feature in &mut self.features {
            feature.set_pan_mode(self.pan_mode);
        }
    }

    /// Scale combo change; unparsable text clears the fixed scale.
    pub fn on_scale_text(&mut self, text: &str) {
        self.fixed_scale = parse_scale_text(text);
        for feature in &mut self.features {
            feature.set_fixed_scale(self.fixed_scale);
        }
    }

    /// Show-layer checkbox change.
    pub fn on_show_layer_toggled(&mut self, checked: bool) {
        self.show_layer_name = checked;
        for feature in &mut self.features {
            feature.set_show_layer_name(checked);
        }
    }

    /// The current additive-theme state.
    pub fn theme_additive(&self) -> bool {
        self.theme_additive
    }

    /// Marks the host UI as fully initialized; missing-widget warnings are
    /// suppressed until then.
    pub fn set_gui_ready(&mut self) {
        self.gui_ready = true;
    }

    /// Applies the theme picked in the toolbar chooser. Single-flight:
    /// re-entrant calls return immediately, and chooser rebuild requests
    /// arriving during the apply are dropped.
    pub fn apply_selected_theme(&mut self, host: &dyn Host, name: &str) -> bool {
        if name.is_empty() || name == THEME_PLACEHOLDER {
            debug!("placeholder selected; no theme applied");
            return false;
        }
        let Some(_pass) = self.apply_guard.try_enter() else {
            debug!("theme apply already in progress");
            return false;
        };
        let _suppress = self.suppress_update.try_enter();
        self.themes.apply(host, name, self.theme_additive)
    }

    /// Saves the pre-search restore theme; called when the dialog opens.
    pub fn on_dialog_opened(&mut self, host: &dyn Host) {
        self.themes.save_pre_search(host);
    }

    /// Rebuilds the toolbar theme chooser from the host theme collection.
    /// Suppressed while an apply is in progress and before the GUI is
    /// ready (with rate-limited warnings). Returns whether it updated.
    pub fn update_theme_selector(&mut self, host: &dyn Host) -> bool {
        if self.suppress_update.is_active() {
            debug!("theme chooser update suppressed during apply");
            return false;
        }
        if !self.gui_ready {
            if self.warn_limiter.allow(Instant::now()) {
                warn!("theme chooser not ready yet");
            }
            return false;
        }
        self.selector.update(&host.theme_names());
        true
    }

    /// The toolbar theme chooser state.
    pub fn selector(&self) -> &ThemeSelector {
        &self.selector
    }

    /// Sets the chooser's group filter.
    pub fn set_theme_group(&mut self, group: Option<&str>) {
        self.selector.set_group(group);
    }

    /// Schedules a dialog rebuild shortly after a configuration change,
    /// so the host has time to commit project-variable writes first.
    pub fn schedule_rebuild(&mut self, now: Instant) {
        self.rebuild_at = Some(now + REBUILD_DELAY);
    }

    /// Event-loop hook: performs a scheduled rebuild once it is due.
    /// Returns the new suggestions when a rebuild ran.
    pub fn poll_rebuild(
        &mut self,
        host: &dyn Host,
        now: Instant,
    ) -> Result<Option<Vec<Suggestion>>, ConfigError> {
        match self.rebuild_at {
            Some(due) if now >= due => {
                self.rebuild_at = None;
                self.build(host).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Project-saved hook: the configuration may have changed, so schedule
    /// a rebuild and refresh the theme chooser.
    pub fn on_project_saved(&mut self, host: &dyn Host, now: Instant) {
        self.schedule_rebuild(now);
        self.update_theme_selector(host);
    }
}
