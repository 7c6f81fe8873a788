//! Theme application: overwrite, additive union, and the pre-search theme.

use geosearch_host::Host;
use tracing::{debug, info, warn};

use crate::snapshot::SnapshotStore;

/// Name of the theme capturing the visible state just before a search.
pub const PRE_SEARCH_THEME: &str = "検索前";

/// Name of the temporary theme holding the pre-apply state during an
/// additive application.
const TEMP_THEME: &str = "__geosearch_pre_apply__";

/// Applies themes and keeps the snapshots needed to merge them with the
/// current view.
#[derive(Debug, Default)]
pub struct ThemeManager {
    /// In-memory snapshot store for additive merges and user-theme files.
    snapshots: SnapshotStore,
}

impl ThemeManager {
    /// Creates a manager with an empty snapshot store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot store (user-theme save/load goes through it).
    pub fn snapshots_mut(&mut self) -> &mut SnapshotStore {
        &mut self.snapshots
    }

    /// Applies a theme, either overwriting the current visibility or
    /// merging with it. Returns false when the theme could not be applied.
    pub fn apply(&mut self, host: &dyn Host, name: &str, additive: bool) -> bool {
        if name.is_empty() {
            return false;
        }
        if additive {
            self.apply_additive(host, name)
        } else {
            let applied = host.apply_theme(name);
            if applied {
                info!(theme = name, "theme applied");
            } else {
                warn!(theme = name, "theme apply failed");
            }
            applied
        }
    }

    /// Additive application: the union of the currently visible layers and
    /// the theme's visible layers ends up visible.
    ///
    /// 1. Save the current state as a temporary theme.
    /// 2. Apply the requested theme.
    /// 3. Snapshot what the theme made visible (with legends and styles).
    /// 4. Restore the temporary theme and remove it.
    /// 5. Re-apply the snapshot on top, enabling without disabling.
    ///
    /// The temporary theme is removed on every path out of here.
    fn apply_additive(&mut self, host: &dyn Host, name: &str) -> bool {
        if !host.insert_theme_from_current_state(TEMP_THEME) {
            // Without a pre-state theme the merge cannot be undone, so
            // degrade to a plain apply.
            warn!(theme = name, "could not save pre-apply state; applying plain");
            return host.apply_theme(name);
        }

        let applied = host.apply_theme(name);
        let selection = applied.then(|| self.snapshots.capture(host));

        let restored = host.apply_theme(TEMP_THEME);
        if !host.remove_theme(TEMP_THEME) {
            warn!("temporary pre-apply theme could not be removed");
        }
        let Some(token) = selection else {
            warn!(theme = name, "theme apply failed");
            return false;
        };
        if !restored {
            warn!("pre-apply state could not be restored before merging");
        }

        debug!(theme = name, %token, "merging theme layers into current view");
        self.snapshots.restore(host, &token);
        info!(theme = name, "theme applied additively");
        true
    }

    /// Saves the current visible state as the pre-search theme, replacing
    /// any previous one.
    pub fn save_pre_search(&self, host: &dyn Host) -> bool {
        if host.has_theme(PRE_SEARCH_THEME) {
            host.remove_theme(PRE_SEARCH_THEME);
        }
        let saved = host.insert_theme_from_current_state(PRE_SEARCH_THEME);
        if saved {
            info!(theme = PRE_SEARCH_THEME, "pre-search state saved");
        } else {
            warn!("could not save the pre-search theme");
        }
        saved
    }

    /// Applies the theme configured on a search tab: the configured theme
    /// when it exists, else the pre-search theme, else nothing. A
    /// configured theme that does not exist is logged.
    pub fn apply_search_theme(
        &mut self,
        host: &dyn Host,
        select_theme: Option<&str>,
        additive: bool,
    ) {
        let target = match select_theme {
            Some(name) if host.has_theme(name) => Some(name),
            Some(name) => {
                warn!(theme = name, "configured theme does not exist");
                host.has_theme(PRE_SEARCH_THEME).then_some(PRE_SEARCH_THEME)
            }
            None => host.has_theme(PRE_SEARCH_THEME).then_some(PRE_SEARCH_THEME),
        };
        if let Some(name) = target {
            self.apply(host, name, additive);
        }
    }
}
