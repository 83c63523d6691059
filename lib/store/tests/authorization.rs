use tempfile::TempDir;
use warden_core::{EntityRef, PermissionId, PermissionRef, RoleId, RoleRef, UserId};
use warden_store::{
    AuthStore, EntityKind, NewPermission, NewRole, NewUser, Outcome, PermissionSeed,
    SeedItemResult, StoreConfig, Table,
};

async fn open_store() -> (AuthStore, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StoreConfig::default().with_db_path(dir.path().join("rbac.db"));
    let store = AuthStore::open(&config).await.expect("open store");
    (store, dir)
}

fn role(name: &str) -> RoleRef {
    RoleRef::from(name)
}

fn permission(name: &str) -> PermissionRef {
    PermissionRef::from(name)
}

async fn user(store: &AuthStore, email: &str) -> UserId {
    store
        .create_user(&NewUser::with_email(email))
        .await
        .expect("create user")
}

#[tokio::test]
async fn direct_grant_is_enough_without_roles() {
    let (store, _dir) = open_store().await;
    let alice = user(&store, "alice@example.com").await;
    store
        .upsert_permission(&NewPermission::new("Export", "export"))
        .await
        .expect("upsert");

    let outcome = store
        .give_permission_to(alice, &permission("export"))
        .await
        .expect("grant");
    assert!(outcome.is_applied());

    assert!(store.roles_for_user(alice).await.expect("roles").is_empty());
    assert!(
        store
            .has_permission_to(alice, &permission("export"))
            .await
            .expect("check")
    );
}

#[tokio::test]
async fn role_permission_is_inherited() {
    let (store, _dir) = open_store().await;
    let bob = user(&store, "bob@example.com").await;
    let editor = store
        .upsert_role(&NewRole::new("Editor", "editor"))
        .await
        .expect("role");
    let update = store
        .upsert_permission(&NewPermission::new("Update", "update"))
        .await
        .expect("permission");

    let attached = store
        .attach_permission_to_role(&EntityRef::ById(editor), &EntityRef::ById(update))
        .await
        .expect("attach");
    assert!(attached.is_applied());
    let assigned = store
        .assign_role(bob, &EntityRef::ById(editor))
        .await
        .expect("assign");
    assert!(assigned.is_applied());

    assert_eq!(
        store.count_rows(Table::UserPermissions).await.expect("count"),
        0
    );
    assert!(
        store
            .has_permission_to(bob, &EntityRef::ById(update))
            .await
            .expect("by id")
    );
    assert!(
        store
            .has_permission_to(bob, &permission("Update"))
            .await
            .expect("by name")
    );
}

#[tokio::test]
async fn upsert_role_is_idempotent_by_slug() {
    let (store, _dir) = open_store().await;
    let first = store
        .upsert_role(&NewRole::new("Admin", "admin"))
        .await
        .expect("first");
    let second = store
        .upsert_role(&NewRole::new("Administrator", "admin").with_description("renamed"))
        .await
        .expect("second");

    assert_eq!(first, second);
    assert_eq!(store.count_rows(Table::Roles).await.expect("count"), 1);

    let stored = store
        .find_role(&EntityRef::ById(first))
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(stored.name, "Admin");
    assert_eq!(stored.description, None);
}

#[tokio::test]
async fn upsert_permission_is_idempotent_by_slug() {
    let (store, _dir) = open_store().await;
    let first = store
        .upsert_permission(&NewPermission::new("Delete", "delete"))
        .await
        .expect("first");
    let second = store
        .upsert_permission(&NewPermission::new("Delete", "delete"))
        .await
        .expect("second");

    assert_eq!(first, second);
    assert_eq!(store.count_rows(Table::Permissions).await.expect("count"), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_upserts_produce_one_row() {
    let (store, _dir) = open_store().await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.upsert_role(&NewRole::new("Admin", "admin")).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("join").expect("upsert"));
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(store.count_rows(Table::Roles).await.expect("count"), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_create_user_with_same_email_produces_one_row() {
    let (store, _dir) = open_store().await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create_user(&NewUser::with_email("same@example.com"))
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("join").expect("create user"));
    }

    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(store.count_rows(Table::Users).await.expect("count"), 1);
}

#[tokio::test]
async fn give_permission_twice_creates_one_link() {
    let (store, _dir) = open_store().await;
    let dora = user(&store, "dora@example.com").await;
    store
        .upsert_permission(&NewPermission::new("Export", "export"))
        .await
        .expect("permission");

    for _ in 0..2 {
        let outcome = store
            .give_permission_to(dora, &permission("export"))
            .await
            .expect("give");
        assert_eq!(outcome, Outcome::Applied);
    }

    assert_eq!(
        store.count_rows(Table::UserPermissions).await.expect("count"),
        1
    );
    assert!(
        store
            .has_permission_to(dora, &permission("export"))
            .await
            .expect("check")
    );
}

#[tokio::test]
async fn assign_role_twice_creates_one_link() {
    let (store, _dir) = open_store().await;
    let carol = user(&store, "carol@example.com").await;
    store
        .upsert_role(&NewRole::new("Admin", "admin"))
        .await
        .expect("role");

    for _ in 0..2 {
        let outcome = store
            .assign_role(carol, &role("admin"))
            .await
            .expect("assign");
        assert_eq!(outcome, Outcome::Applied);
    }

    assert_eq!(store.count_rows(Table::UserRoles).await.expect("count"), 1);
}

#[tokio::test]
async fn create_user_reuses_existing_email() {
    let (store, _dir) = open_store().await;
    let first = user(&store, "dave@example.com").await;
    let second = store
        .create_user(&NewUser {
            email: Some("dave@example.com".to_string()),
            external_id: Some("ext-dave".to_string()),
        })
        .await
        .expect("second create");

    assert_eq!(first, second);
    assert_eq!(store.count_rows(Table::Users).await.expect("count"), 1);

    let found = store
        .find_user_by_email("dave@example.com")
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(found.id, first);
    assert_eq!(found.external_id, None);
}

#[tokio::test]
async fn create_user_matches_external_id() {
    let (store, _dir) = open_store().await;
    let first = store
        .create_user(&NewUser::with_external_id("oidc|123"))
        .await
        .expect("first");
    let second = store
        .create_user(&NewUser {
            email: Some("new@example.com".to_string()),
            external_id: Some("oidc|123".to_string()),
        })
        .await
        .expect("second");

    assert_eq!(first, second);
    assert_eq!(store.count_rows(Table::Users).await.expect("count"), 1);
}

#[tokio::test]
async fn create_user_without_identifiers_always_inserts() {
    let (store, _dir) = open_store().await;
    let first = store.create_user(&NewUser::default()).await.expect("first");
    let second = store
        .create_user(&NewUser {
            email: Some(String::new()),
            external_id: None,
        })
        .await
        .expect("second");

    assert_ne!(first, second);
    assert_eq!(store.count_rows(Table::Users).await.expect("count"), 2);
}

#[tokio::test]
async fn find_user_by_unknown_email_is_none() {
    let (store, _dir) = open_store().await;
    assert!(
        store
            .find_user_by_email("nobody@example.com")
            .await
            .expect("find")
            .is_none()
    );
}

#[tokio::test]
async fn revoking_never_granted_permission_is_a_no_op() {
    let (store, _dir) = open_store().await;
    let erin = user(&store, "erin@example.com").await;
    store
        .upsert_permission(&NewPermission::new("View", "view"))
        .await
        .expect("permission");

    let outcome = store
        .revoke_permission_to(erin, &permission("view"))
        .await
        .expect("revoke");

    assert!(outcome.is_applied());
    assert_eq!(
        store.count_rows(Table::UserPermissions).await.expect("count"),
        0
    );
}

#[tokio::test]
async fn revoke_leaves_role_inherited_permission() {
    let (store, _dir) = open_store().await;
    let frank = user(&store, "frank@example.com").await;
    store
        .upsert_role(&NewRole::new("Editor", "editor"))
        .await
        .expect("role");
    store
        .upsert_permission(&NewPermission::new("Create", "create"))
        .await
        .expect("permission");
    let _ = store
        .attach_permission_to_role(&role("editor"), &permission("create"))
        .await
        .expect("attach");
    let _ = store
        .assign_role(frank, &role("editor"))
        .await
        .expect("assign");
    let _ = store
        .give_permission_to(frank, &permission("create"))
        .await
        .expect("grant");

    let _ = store
        .revoke_permission_to(frank, &permission("create"))
        .await
        .expect("revoke");

    assert!(
        store
            .has_permission_to(frank, &permission("create"))
            .await
            .expect("check")
    );
}

#[tokio::test]
async fn remove_role_drops_link_and_inherited_permission() {
    let (store, _dir) = open_store().await;
    let gina = user(&store, "gina@example.com").await;
    store
        .upsert_role(&NewRole::new("Admin", "admin"))
        .await
        .expect("role");
    store
        .upsert_permission(&NewPermission::new("Delete", "delete"))
        .await
        .expect("permission");
    let _ = store
        .attach_permission_to_role(&role("admin"), &permission("delete"))
        .await
        .expect("attach");
    let _ = store.assign_role(gina, &role("admin")).await.expect("assign");

    let removed = store.remove_role(gina, &role("Admin")).await.expect("remove");
    assert!(removed.is_applied());
    assert!(!store.has_role(gina, &role("admin")).await.expect("has role"));
    assert!(
        !store
            .has_permission_to(gina, &permission("delete"))
            .await
            .expect("check")
    );

    let again = store
        .remove_role(gina, &role("admin"))
        .await
        .expect("remove again");
    assert!(again.is_applied());
}

#[tokio::test]
async fn seeded_permission_names_become_slugs() {
    let (store, _dir) = open_store().await;
    let items = [PermissionSeed::from("View"), PermissionSeed::from("Create")];

    let results = store.seed_permissions(&items).await.expect("seed");
    assert!(results.iter().all(|r| !r.is_skipped()));

    let slugs: Vec<String> = store
        .list_permissions()
        .await
        .expect("list")
        .into_iter()
        .map(|p| p.slug)
        .collect();
    assert_eq!(slugs, vec!["create".to_string(), "view".to_string()]);
}

#[tokio::test]
async fn seed_permissions_reports_skipped_items() {
    let (store, _dir) = open_store().await;
    let items = [
        PermissionSeed::from("View Any"),
        PermissionSeed::Detailed {
            name: None,
            slug: None,
            description: Some("nothing to derive".to_string()),
        },
        PermissionSeed::from("View Any"),
    ];

    let results = store.seed_permissions(&items).await.expect("seed");

    assert_eq!(results.len(), 3);
    assert_eq!(results[1], SeedItemResult::Skipped);
    assert_eq!(results[0], results[2]);
    assert_eq!(store.count_rows(Table::Permissions).await.expect("count"), 1);

    let stored = store
        .find_permission(&permission("view-any"))
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(stored.name, "View Any");
}

#[tokio::test]
async fn admin_scenario_resolves_through_role() {
    let (store, _dir) = open_store().await;
    store
        .upsert_role(&NewRole::new("Admin", "admin"))
        .await
        .expect("admin");
    store
        .upsert_role(&NewRole::new("Editor", "editor"))
        .await
        .expect("editor");
    let results = store
        .seed_permissions(&[PermissionSeed::from("Delete"), PermissionSeed::from("Publish")])
        .await
        .expect("seed");
    assert_eq!(results.len(), 2);

    let attached = store
        .attach_permission_to_role(&role("admin"), &permission("delete"))
        .await
        .expect("attach");
    assert!(attached.is_applied());

    let _ = user(&store, "a@x.com").await;
    let id = store
        .find_user_by_email("a@x.com")
        .await
        .expect("find")
        .expect("exists")
        .id;
    let _ = store.assign_role(id, &role("admin")).await.expect("assign");

    assert!(
        store
            .has_permission_to(id, &permission("delete"))
            .await
            .expect("delete")
    );
    assert!(
        !store
            .has_permission_to(id, &permission("publish"))
            .await
            .expect("publish")
    );
}

#[tokio::test]
async fn role_resolves_by_name_or_slug() {
    let (store, _dir) = open_store().await;
    let hank = user(&store, "hank@example.com").await;
    store
        .upsert_role(&NewRole::new("Admin", "admin"))
        .await
        .expect("role");

    let outcome = store.assign_role(hank, &role("Admin")).await.expect("assign");
    assert!(outcome.is_applied());

    assert!(store.has_role(hank, &role("admin")).await.expect("slug"));
    assert!(store.has_role(hank, &role("Admin")).await.expect("name"));
    assert!(!store.has_role(hank, &role("ADMIN")).await.expect("case"));
}

#[tokio::test]
async fn unresolved_role_reference_is_not_found() {
    let (store, _dir) = open_store().await;
    store
        .upsert_permission(&NewPermission::new("Delete", "delete"))
        .await
        .expect("permission");

    let outcome = store
        .attach_permission_to_role(&role("ghost-role"), &permission("delete"))
        .await
        .expect("attach");

    let unresolved = outcome.unresolved().expect("not found");
    assert_eq!(unresolved.kind, EntityKind::Role);
    assert_eq!(unresolved.reference, "ghost-role");
    assert_eq!(
        store.count_rows(Table::RolePermissions).await.expect("count"),
        0
    );
}

#[tokio::test]
async fn unresolved_permission_reference_is_not_found() {
    let (store, _dir) = open_store().await;
    let ivy = user(&store, "ivy@example.com").await;

    let outcome = store
        .give_permission_to(ivy, &permission("missing"))
        .await
        .expect("grant");
    assert_eq!(
        outcome.unresolved().map(|u| u.kind),
        Some(EntityKind::Permission)
    );
    assert!(
        !store
            .has_permission_to(ivy, &permission("missing"))
            .await
            .expect("check")
    );
}

#[tokio::test]
async fn slug_match_wins_over_name_match() {
    let (store, _dir) = open_store().await;
    let jack = user(&store, "jack@example.com").await;
    let named = store
        .upsert_role(&NewRole::new("ops", "operations"))
        .await
        .expect("named");
    let slugged = store
        .upsert_role(&NewRole::new("Ops Team", "ops"))
        .await
        .expect("slugged");
    assert_ne!(named, slugged);

    let _ = store.assign_role(jack, &role("ops")).await.expect("assign");

    let held: Vec<RoleId> = store
        .roles_for_user(jack)
        .await
        .expect("roles")
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(held, vec![slugged]);
}

#[tokio::test]
async fn remove_role_by_name_removes_only_the_slug_match() {
    let (store, _dir) = open_store().await;
    let lena = user(&store, "lena@example.com").await;
    let named = store
        .upsert_role(&NewRole::new("ops", "operations"))
        .await
        .expect("named");
    let slugged = store
        .upsert_role(&NewRole::new("Ops Team", "ops"))
        .await
        .expect("slugged");
    for id in [named, slugged] {
        let _ = store
            .assign_role(lena, &EntityRef::ById(id))
            .await
            .expect("assign");
    }

    let outcome = store.remove_role(lena, &role("ops")).await.expect("remove");
    assert_eq!(outcome, Outcome::Applied);

    let held: Vec<RoleId> = store
        .roles_for_user(lena)
        .await
        .expect("roles")
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(held, vec![named]);
    assert!(store.has_role(lena, &role("ops")).await.expect("has role"));

    let _ = store.remove_role(lena, &role("ops")).await.expect("remove");
    let _ = store
        .remove_role(lena, &EntityRef::ById(named))
        .await
        .expect("remove by id");
    assert!(!store.has_role(lena, &role("ops")).await.expect("has role"));
}

#[tokio::test]
async fn missing_numeric_reference_is_a_store_error() {
    let (store, _dir) = open_store().await;
    let kim = user(&store, "kim@example.com").await;

    let result = store.assign_role(kim, &EntityRef::ById(RoleId::new(999))).await;
    assert!(result.is_err());
    assert_eq!(store.count_rows(Table::UserRoles).await.expect("count"), 0);
}

#[tokio::test]
async fn effective_permissions_merge_direct_and_inherited() {
    let (store, _dir) = open_store().await;
    let lee = user(&store, "lee@example.com").await;
    store
        .upsert_role(&NewRole::new("Editor", "editor"))
        .await
        .expect("role");
    let results = store
        .seed_permissions(&[
            PermissionSeed::from("View"),
            PermissionSeed::from("Update"),
            PermissionSeed::from("Export"),
        ])
        .await
        .expect("seed");
    assert_eq!(results.len(), 3);

    for name in ["view", "update"] {
        let _ = store
            .attach_permission_to_role(&role("editor"), &permission(name))
            .await
            .expect("attach");
    }
    let _ = store.assign_role(lee, &role("editor")).await.expect("assign");
    let _ = store
        .give_permission_to(lee, &permission("view"))
        .await
        .expect("grant");
    let _ = store
        .give_permission_to(lee, &permission("export"))
        .await
        .expect("grant");

    let slugs: Vec<String> = store
        .permissions_for_user(lee)
        .await
        .expect("effective")
        .into_iter()
        .map(|p| p.slug)
        .collect();
    assert_eq!(slugs, vec!["export", "update", "view"]);
}

#[tokio::test]
async fn detach_permission_from_role_stops_inheritance() {
    let (store, _dir) = open_store().await;
    let max = user(&store, "max@example.com").await;
    let admin = store
        .upsert_role(&NewRole::new("Admin", "admin"))
        .await
        .expect("role");
    let publish: PermissionId = store
        .upsert_permission(&NewPermission::new("Publish", "publish"))
        .await
        .expect("permission");
    let _ = store
        .attach_permission_to_role(&EntityRef::ById(admin), &EntityRef::ById(publish))
        .await
        .expect("attach");
    let _ = store
        .assign_role(max, &EntityRef::ById(admin))
        .await
        .expect("assign");
    assert!(
        store
            .has_permission_to(max, &EntityRef::ById(publish))
            .await
            .expect("before")
    );

    let detached = store
        .detach_permission_from_role(&role("admin"), &permission("publish"))
        .await
        .expect("detach");
    assert!(detached.is_applied());
    assert!(
        !store
            .has_permission_to(max, &EntityRef::ById(publish))
            .await
            .expect("after")
    );
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StoreConfig::default().with_db_path(dir.path().join("rbac.db"));

    let store = AuthStore::open(&config).await.expect("open");
    let id = user(&store, "nina@example.com").await;
    store.close().await;

    let reopened = AuthStore::open(&config).await.expect("reopen");
    let found = reopened
        .find_user(id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(found.email.as_deref(), Some("nina@example.com"));
    reopened.health_check().await.expect("healthy");
}
