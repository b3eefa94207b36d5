use profile_keeper::{
    ErrorKind, FieldValue, Identity, MemoryStore, NewUser, PoolConfig, Profile, ProfileService,
    RequestContext, SessionPool, UserService,
};
use std::sync::Arc;

struct Harness {
    pool: SessionPool,
    users: UserService,
    profiles: ProfileService,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            pool: SessionPool::new(PoolConfig::new().max_sessions(4), store).unwrap(),
            users: UserService::new(),
            profiles: ProfileService::new(),
        }
    }

    async fn ctx(&self) -> RequestContext {
        RequestContext::new(self.pool.lease().await.unwrap())
    }

    async fn ctx_as(&self, id: &str, email: &str) -> RequestContext {
        self.ctx().await.with_identity(Identity::new(id, email, true))
    }

    async fn register(&self, email: &str) -> String {
        let ctx = self.ctx().await;
        self.users
            .create(
                &ctx,
                NewUser {
                    email: email.to_string(),
                    password: "password".to_string(),
                },
            )
            .await
            .unwrap()
    }

    async fn register_confirmed(&self, email: &str) -> String {
        let id = self.register(email).await;
        self.users.confirm(&self.ctx().await, &id).await.unwrap();
        id
    }
}

#[tokio::test]
async fn test_profile_appears_only_after_confirmation() {
    let h = Harness::new();
    let id = h.register("john@mail.com").await;

    let err = h.profiles.get(&h.ctx().await, &id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(h.profiles.all(&h.ctx().await).await.unwrap().is_empty());

    h.users.confirm(&h.ctx().await, &id).await.unwrap();

    let profile = h.profiles.get(&h.ctx().await, &id).await.unwrap();
    assert_eq!(profile, Profile::empty(id.clone()));
    assert_eq!(h.profiles.all(&h.ctx().await).await.unwrap(), vec![profile]);
}

#[tokio::test]
async fn test_owner_update_is_recorded() {
    let h = Harness::new();
    let id = h.register_confirmed("john@mail.com").await;
    let ctx = h.ctx_as(&id, "john@mail.com").await;

    let mut profile = h.profiles.get(&ctx, &id).await.unwrap();
    profile.first_name = "John".to_string();
    h.profiles.update(&ctx, profile).await.unwrap();

    let history = h.profiles.history(&ctx, &id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].len(), 1);
    let change = history[0].field("firstName").unwrap();
    assert_eq!(change.previous, FieldValue::from(""));
    assert_eq!(change.current, FieldValue::from("John"));
}

#[tokio::test]
async fn test_history_keeps_insertion_order() {
    let h = Harness::new();
    let id = h.register_confirmed("john@mail.com").await;
    let ctx = h.ctx_as(&id, "john@mail.com").await;

    for age in [20, 21, 22] {
        let mut profile = h.profiles.get(&ctx, &id).await.unwrap();
        profile.age = age;
        h.profiles.update(&ctx, profile).await.unwrap();
    }

    let history = h.profiles.history(&ctx, &id).await.unwrap();
    let ages: Vec<FieldValue> = history
        .iter()
        .map(|change| change.field("age").unwrap().current.clone())
        .collect();
    assert_eq!(
        ages,
        vec![
            FieldValue::Integer(20),
            FieldValue::Integer(21),
            FieldValue::Integer(22),
        ]
    );
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn test_foreign_update_is_refused() {
    let h = Harness::new();
    let owner = h.register_confirmed("owner@mail.com").await;
    let other = h.register_confirmed("other@mail.com").await;

    let mut target = Profile::empty(owner.clone());
    target.last_name = "Mallory".to_string();
    let err = h
        .profiles
        .update(&h.ctx_as(&other, "other@mail.com").await, target)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let anonymous = h.ctx().await;
    assert!(anonymous.identity().is_anonymous());
    let profile = h.profiles.get(&anonymous, &owner).await.unwrap();
    assert_eq!(profile.last_name, "");

    let owner_ctx = h.ctx_as(&owner, "owner@mail.com").await;
    assert!(h.profiles.history(&owner_ctx, &owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_double_confirmation_fails() {
    let h = Harness::new();
    let id = h.register_confirmed("john@mail.com").await;

    let err = h.users.confirm(&h.ctx().await, &id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let h = Harness::new();
    h.register("john@mail.com").await;

    let err = h
        .users
        .create(
            &h.ctx().await,
            NewUser {
                email: "john@mail.com".to_string(),
                password: "another".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_update_of_unknown_profile_is_not_found() {
    let h = Harness::new();
    let ctx = h.ctx_as("ghost", "ghost@mail.com").await;

    let err = h
        .profiles
        .update(&ctx, Profile::empty("ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_closed_store_is_unavailable() {
    let h = Harness::new();
    h.pool.store().close();

    let err = h.pool.lease().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}
