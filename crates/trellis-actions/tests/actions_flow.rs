//! Create and edit flows against real stores.

mod common;

use common::{seed_of, text, TestEnv, OPERATOR};
use trellis_actions::{
    run_action, ActionError, AddAccount, AddCluster, AddServer, AddUser, EditAccount,
    EditOperator, Phase,
};
use trellis_claims::ClaimBody;
use trellis_keys::{Answer, KeyError, KeyKind, KeyPair};
use trellis_storage::{KeyRef, KeyStore, StoreError};

#[tokio::test]
async fn test_add_account_signed_by_operator() {
    let env = TestEnv::new().with_operator().await;
    let mut action = AddAccount::default();
    action.entity.name = "billing".to_string();
    action.entity.key_spec = Some("generate".to_string());

    let report = run_action(&env.ctx(), &mut action).await.unwrap();

    let store = env.claim_store();
    let operator = store.read_operator_claim().unwrap();
    let account = store.read_account_claim("billing").unwrap();
    assert_eq!(account.iss, operator.sub);
    assert_eq!(account.subject_key().unwrap().kind(), KeyKind::Account);
    assert_eq!(account.name, "billing");
    assert!(!report.has_errors());

    let seed_path = report.generated_key_path.clone().unwrap();
    assert!(seed_path.is_file());
    let keys = KeyStore::new(env.keys.path(), OPERATOR);
    let pair = keys
        .lookup(KeyRef::Public(&account.subject_key().unwrap()))
        .unwrap()
        .unwrap();
    assert_eq!(pair.public_key().encode(), account.sub);
}

#[tokio::test]
async fn test_edit_account_expiry_bumps_iat() {
    let env = TestEnv::new().with_operator().await;
    env.add_account("billing").await;
    let before = env.claim_store().read_account_claim("billing").unwrap();

    let mut action = EditAccount::default();
    action.entity.name = "billing".to_string();
    action.edit.time.expiry = Some("30d".to_string());
    let report = run_action(&env.ctx(), &mut action).await.unwrap();

    let after = env.claim_store().read_account_claim("billing").unwrap();
    assert!(after.iat > before.iat);
    assert_eq!(after.sub, before.sub);
    assert_eq!(after.iss, before.iss);
    assert!(after.exp.unwrap() > after.iat + 29 * 86_400);
    assert!(report.generated_key_path.is_none());
}

#[tokio::test]
async fn test_edit_account_without_options_is_usage_error() {
    let env = TestEnv::new().with_operator().await;
    env.add_account("billing").await;

    let mut action = EditAccount::default();
    action.entity.name = "billing".to_string();
    let err = run_action(&env.ctx(), &mut action).await.unwrap_err();
    assert!(err.show_usage());
    assert!(matches!(err.source, ActionError::Usage(_)));
}

#[tokio::test]
async fn test_edit_account_limits_round_trip() {
    let env = TestEnv::new().with_operator().await;
    env.add_account("billing").await;

    let mut action = EditAccount::default();
    action.entity.name = "billing".to_string();
    action.edit.max_connections = Some(100);
    action.edit.max_payload = Some(1_000_000);
    action.edit.description = Some("billing services".to_string());
    run_action(&env.ctx(), &mut action).await.unwrap();

    let claim = env.claim_store().read_account_claim("billing").unwrap();
    let ClaimBody::Account(account) = claim.body else {
        panic!("expected an account claim");
    };
    assert_eq!(account.limits.conn, 100);
    assert_eq!(account.limits.payload, 1_000_000);
    assert_eq!(account.limits.subs, -1);
    assert_eq!(account.description.as_deref(), Some("billing services"));
}

#[tokio::test]
async fn test_duplicate_account_fails_validation() {
    let env = TestEnv::new().with_operator().await;
    env.add_account("billing").await;
    let path = env.store.path().join("acme/Accounts/billing/billing.jwt");
    let original = std::fs::read(&path).unwrap();

    let mut action = AddAccount::default();
    action.entity.name = "billing".to_string();
    action.entity.key_spec = Some("generate".to_string());
    let err = run_action(&env.ctx(), &mut action).await.unwrap_err();

    assert_eq!(err.phase, Phase::Validate);
    assert!(err.show_usage());
    assert!(matches!(
        err.source,
        ActionError::Store(StoreError::AlreadyExists { kind: KeyKind::Account, .. })
    ));
    assert_eq!(std::fs::read(&path).unwrap(), original);
}

#[tokio::test]
async fn test_failed_claim_write_leaves_no_seed() {
    let env = TestEnv::new().with_operator().await;
    let account = KeyPair::generate(KeyKind::Account);
    let accounts_dir = env.store.path().join("acme/Accounts");
    std::fs::create_dir_all(&accounts_dir).unwrap();
    std::fs::write(accounts_dir.join("billing"), "in the way").unwrap();

    let mut action = AddAccount::default();
    action.entity.name = "billing".to_string();
    action.entity.key_spec = Some(seed_of(&account));
    let err = run_action(&env.ctx(), &mut action).await.unwrap_err();

    assert_eq!(err.phase, Phase::Run);
    let keys = KeyStore::new(env.keys.path(), OPERATOR);
    assert!(!keys.seed_path(&account.public_key()).exists());
    assert!(keys
        .lookup(KeyRef::Name {
            kind: KeyKind::Account,
            parent: None,
            name: "billing",
        })
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_wrong_key_kind_never_reaches_run() {
    let env = TestEnv::new().with_operator().await;
    let user = KeyPair::generate(KeyKind::User);

    let mut action = AddAccount::default();
    action.entity.name = "billing".to_string();
    action.entity.key_spec = Some(seed_of(&user));
    let err = run_action(&env.ctx(), &mut action).await.unwrap_err();

    assert_eq!(err.phase, Phase::Validate);
    assert!(matches!(
        err.source,
        ActionError::Key(KeyError::KeyMismatch { .. })
    ));
    assert!(!env.claim_store().has(KeyKind::Account, None, "billing"));
}

#[tokio::test]
async fn test_missing_key_without_prompting() {
    let env = TestEnv::new().with_operator().await;

    let mut action = AddAccount::default();
    action.entity.name = "billing".to_string();
    let err = run_action(&env.ctx(), &mut action).await.unwrap_err();

    assert_eq!(err.phase, Phase::Validate);
    assert!(matches!(
        err.source,
        ActionError::Key(KeyError::MissingKey { kind: KeyKind::Account })
    ));
}

#[tokio::test]
async fn test_existing_seed_is_used_as_given() {
    let env = TestEnv::new().with_operator().await;
    let account = KeyPair::generate(KeyKind::Account);

    let mut action = AddAccount::default();
    action.entity.name = "billing".to_string();
    action.entity.key_spec = Some(seed_of(&account));
    let report = run_action(&env.ctx(), &mut action).await.unwrap();

    let claim = env.claim_store().read_account_claim("billing").unwrap();
    assert_eq!(claim.sub, account.public_key().encode());
    assert!(report.generated_key_path.is_none());
}

#[tokio::test]
async fn test_interactive_add_account() {
    let env = TestEnv::new().with_operator().await;
    let (ctx, prompter) = env.interactive(vec![
        text("billing"),
        Answer::Confirm(true),
        text(""),
        text("1y"),
    ]);

    let mut action = AddAccount::default();
    run_action(&ctx, &mut action).await.unwrap();

    assert_eq!(prompter.remaining(), 0);
    let claim = env.claim_store().read_account_claim("billing").unwrap();
    assert!(claim.exp.is_some());
    assert!(claim.nbf.is_none());
}

#[tokio::test]
async fn test_add_user_under_only_account() {
    let env = TestEnv::new().with_operator().await;
    env.add_account("billing").await;

    let mut action = AddUser::default();
    action.entity.name = "alice".to_string();
    action.entity.key_spec = Some("generate".to_string());
    action.edit.permissions.allow_publish = vec!["billing.>".to_string()];
    run_action(&env.ctx(), &mut action).await.unwrap();

    let store = env.claim_store();
    let account = store.read_account_claim("billing").unwrap();
    let user = store.read_user_claim("billing", "alice").unwrap();
    assert_eq!(user.iss, account.sub);
    let ClaimBody::User(body) = user.body else {
        panic!("expected a user claim");
    };
    assert_eq!(body.permissions.publish, vec!["billing.>".to_string()]);
}

#[tokio::test]
async fn test_add_user_needs_account_choice() {
    let env = TestEnv::new().with_operator().await;
    env.add_account("billing").await;
    env.add_account("ops").await;

    let mut action = AddUser::default();
    action.entity.name = "alice".to_string();
    action.entity.key_spec = Some("generate".to_string());
    let err = run_action(&env.ctx(), &mut action).await.unwrap_err();
    assert!(err.show_usage());

    let mut action = AddUser::default();
    action.entity.name = "alice".to_string();
    action.entity.key_spec = Some("generate".to_string());
    action.account = Some("ops".to_string());
    run_action(&env.ctx(), &mut action).await.unwrap();
    assert!(env.claim_store().has(KeyKind::User, Some("ops"), "alice"));
}

#[tokio::test]
async fn test_add_cluster_and_server() {
    let env = TestEnv::new().with_operator().await;

    let mut cluster = AddCluster::default();
    cluster.entity.name = "east".to_string();
    cluster.entity.key_spec = Some("generate".to_string());
    cluster.edit.cluster_urls = vec!["nats://east:4222".to_string()];
    run_action(&env.ctx(), &mut cluster).await.unwrap();

    let mut server = AddServer::default();
    server.entity.name = "n1".to_string();
    server.entity.key_spec = Some("generate".to_string());
    run_action(&env.ctx(), &mut server).await.unwrap();

    let store = env.claim_store();
    let operator = store.read_operator_claim().unwrap();
    let cluster = store.read_cluster_claim("east").unwrap();
    let ClaimBody::Cluster(body) = &cluster.body else {
        panic!("expected a cluster claim");
    };
    assert_eq!(body.trust, vec![operator.sub.clone()]);
    let server = store.read_server_claim("east", "n1").unwrap();
    assert_eq!(server.iss, cluster.sub);
}

#[tokio::test]
async fn test_cluster_trust_is_defaulted_before_validation() {
    let env = TestEnv::new().with_operator().await;
    let operator = env.claim_store().read_operator_claim().unwrap();

    let mut cluster = AddCluster::default();
    cluster.entity.key_spec = Some("generate".to_string());
    let err = run_action(&env.ctx(), &mut cluster).await.unwrap_err();
    assert_eq!(err.phase, Phase::Validate);
    assert_eq!(cluster.edit.trust, vec![operator.subject_key().unwrap()]);

    let other = KeyPair::generate(KeyKind::Operator).public_key();
    let mut cluster = AddCluster::default();
    cluster.entity.name = "west".to_string();
    cluster.entity.key_spec = Some("generate".to_string());
    cluster.edit.trust = vec![other];
    run_action(&env.ctx(), &mut cluster).await.unwrap();
    let claim = env.claim_store().read_cluster_claim("west").unwrap();
    let ClaimBody::Cluster(body) = &claim.body else {
        panic!("expected a cluster claim");
    };
    assert_eq!(body.trust, vec![other.encode()]);
}

#[tokio::test]
async fn test_edit_operator_account_server_url() {
    let env = TestEnv::new().with_operator().await;
    let before = env.claim_store().read_operator_claim().unwrap();

    let mut action = EditOperator::default();
    action.edit.account_server_url = Some("http://localhost:9090/jwt/v1".to_string());
    run_action(&env.ctx(), &mut action).await.unwrap();

    let after = env.claim_store().read_operator_claim().unwrap();
    assert!(after.iat > before.iat);
    assert_eq!(after.iss, after.sub);
    let ClaimBody::Operator(body) = after.body else {
        panic!("expected an operator claim");
    };
    assert_eq!(
        body.account_server_url.as_deref(),
        Some("http://localhost:9090/jwt/v1")
    );
}
