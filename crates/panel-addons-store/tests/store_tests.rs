use panel_addons::InstalledAddon;
use panel_addons_store::AddonRegistry;

fn addon(slug: &str, enabled: bool) -> InstalledAddon {
    InstalledAddon {
        slug: slug.to_owned(),
        name: format!("Addon {slug}"),
        author: Some("someone".into()),
        note: None,
        enabled,
    }
}

#[test]
fn upsert_then_get_round_trips() {
    let registry = AddonRegistry::open_in_memory().unwrap();
    let record = addon("backup-manager", true);

    registry.upsert(&record).unwrap();

    let fetched = registry.get("backup-manager").unwrap().unwrap();
    assert_eq!(fetched, record);
}

#[test]
fn get_missing_returns_none() {
    let registry = AddonRegistry::open_in_memory().unwrap();
    assert!(registry.get("ghost").unwrap().is_none());
}

#[test]
fn upsert_replaces_existing_record() {
    let registry = AddonRegistry::open_in_memory().unwrap();

    registry.upsert(&addon("backup-manager", true)).unwrap();

    let mut updated = addon("backup-manager", true);
    updated.name = "Backup Manager v2".into();
    registry.upsert(&updated).unwrap();

    let list = registry.list().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Backup Manager v2");
}

#[test]
fn list_ordered_by_slug() {
    let registry = AddonRegistry::open_in_memory().unwrap();

    registry.upsert(&addon("zeta", true)).unwrap();
    registry.upsert(&addon("alpha", false)).unwrap();

    let slugs: Vec<String> = registry
        .list()
        .unwrap()
        .into_iter()
        .map(|a| a.slug)
        .collect();
    assert_eq!(slugs, vec!["alpha", "zeta"]);
}

#[test]
fn set_enabled_flips_flag() {
    let registry = AddonRegistry::open_in_memory().unwrap();
    registry.upsert(&addon("backup-manager", true)).unwrap();

    assert!(registry.set_enabled("backup-manager", false).unwrap());
    assert!(!registry.get("backup-manager").unwrap().unwrap().enabled);
}

#[test]
fn set_enabled_on_missing_returns_false() {
    let registry = AddonRegistry::open_in_memory().unwrap();
    assert!(!registry.set_enabled("ghost", true).unwrap());
}

#[test]
fn remove_tolerates_absent_record() {
    let registry = AddonRegistry::open_in_memory().unwrap();

    registry.upsert(&addon("backup-manager", true)).unwrap();
    assert!(registry.remove("backup-manager").unwrap());

    // Second removal is not an error, just a no-op.
    assert!(!registry.remove("backup-manager").unwrap());
    assert!(!registry.remove("never-existed").unwrap());
}

#[test]
fn persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("addons.db");

    {
        let registry = AddonRegistry::open(&db).unwrap();
        registry.upsert(&addon("backup-manager", false)).unwrap();
    }

    let reopened = AddonRegistry::open(&db).unwrap();
    let fetched = reopened.get("backup-manager").unwrap().unwrap();
    assert!(!fetched.enabled);
}
