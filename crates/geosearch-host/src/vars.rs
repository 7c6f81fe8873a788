//! Robust project-variable writes.

use tracing::{debug, warn};

use crate::api::VariableApi;

/// Group name used for the legacy entry write.
const ENTRY_GROUP: &str = "GEO-search-plugin";

/// Writes a project-scoped variable, trying every setter the host exposes.
///
/// Hosts differ in which of the variable APIs actually persists: the
/// class-level setter, the scope setter, the legacy grouped entry, or the
/// custom property. Each is attempted in that order and the write counts as
/// successful when at least one of them took.
pub fn set_project_variable(host: &dyn VariableApi, key: &str, value: &str) -> bool {
    let mut ok = false;

    if host.set_variable_class(key, value) {
        ok = true;
    }
    if host.set_variable_scope(key, value) {
        ok = true;
    }
    if host.write_entry(ENTRY_GROUP, key, value) {
        ok = true;
    }
    if host.set_custom_property(key, value) {
        ok = true;
    }

    if ok {
        debug!(key, "project variable written");
    } else {
        warn!(key, "no variable setter succeeded");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryHost, VarSetter};

    #[test]
    fn test_set_project_variable_roundtrip() {
        let host = MemoryHost::new();
        assert!(set_project_variable(&host, "GEO-search-plugin", "[]"));
        assert_eq!(host.read_variable("GEO-search-plugin").as_deref(), Some("[]"));
    }

    #[test]
    fn test_succeeds_when_only_one_setter_works() {
        let host = MemoryHost::new();
        host.disable_setters(&[
            VarSetter::Class,
            VarSetter::Scope,
            VarSetter::Entry,
        ]);
        assert!(set_project_variable(&host, "k", "v"));
        assert_eq!(host.read_variable("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_fails_when_all_setters_fail() {
        let host = MemoryHost::new();
        host.disable_setters(&[
            VarSetter::Class,
            VarSetter::Scope,
            VarSetter::Entry,
            VarSetter::CustomProperty,
        ]);
        assert!(!set_project_variable(&host, "k", "v"));
        assert_eq!(host.read_variable("k"), None);
    }
}
