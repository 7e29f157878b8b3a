//! Pull runs against a scripted account server.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tempfile::TempDir;
use trellis_actions::{run_action, ExecContext, Status};
use trellis_claims::{armor, AccountClaim, Claim, ClaimBody, OperatorClaim, UserClaim};
use trellis_keys::{KeyKind, KeyPair, ScriptedPrompter};
use trellis_storage::ClaimStore;
use trellis_sync::{FetchResponse, Fetcher, Pull, SyncError};

const SERVER: &str = "http://accounts.test/jwt/v1";

#[derive(Default)]
struct MockFetcher {
    responses: HashMap<String, FetchResponse>,
    panic_on: Option<String>,
    err_on: HashSet<String>,
}

impl MockFetcher {
    fn respond(&mut self, url: String, status: u16, body: impl Into<String>) {
        self.responses.insert(
            url,
            FetchResponse {
                status,
                body: body.into(),
            },
        );
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, SyncError> {
        if self.panic_on.as_deref() == Some(url) {
            panic!("scripted failure for {}", url);
        }
        if self.err_on.contains(url) {
            return Err(SyncError::Transport {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.responses.get(url).cloned().unwrap_or(FetchResponse {
            status: 404,
            body: String::new(),
        }))
    }
}

struct Fixture {
    store: TempDir,
    keys: TempDir,
    operator: KeyPair,
    accounts: Vec<(Claim, KeyPair)>,
}

impl Fixture {
    fn new(server_url: Option<&str>, accounts: &[&str]) -> Self {
        let store = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let operator = KeyPair::generate(KeyKind::Operator);
        let mut claim = Claim::new(
            "acme",
            &operator.public_key(),
            ClaimBody::Operator(OperatorClaim {
                account_server_url: server_url.map(str::to_string),
                ..Default::default()
            }),
        );
        let claim_store =
            ClaimStore::create(store.path(), "acme", &claim.encode(&operator).unwrap()).unwrap();

        let accounts = accounts
            .iter()
            .map(|name| {
                let pair = KeyPair::generate(KeyKind::Account);
                let mut claim = Claim::new(
                    *name,
                    &pair.public_key(),
                    ClaimBody::Account(AccountClaim::default()),
                );
                claim_store
                    .write_raw(&claim.encode(&operator).unwrap())
                    .unwrap();
                (claim, pair)
            })
            .collect();

        Self {
            store,
            keys,
            operator,
            accounts,
        }
    }

    fn ctx(&self) -> ExecContext {
        ExecContext::new(
            self.store.path(),
            self.keys.path(),
            Arc::new(ScriptedPrompter::default()),
        )
        .with_operator("acme")
    }

    fn claim_store(&self) -> ClaimStore {
        ClaimStore::open(self.store.path(), "acme").unwrap()
    }

    fn account(&self, name: &str) -> &Claim {
        &self
            .accounts
            .iter()
            .find(|(claim, _)| claim.name == name)
            .unwrap()
            .0
    }

    fn account_url(&self, name: &str) -> String {
        format!("{}/accounts/{}", SERVER, self.account(name).sub)
    }

    /// Remote copy of `name` issued at `iat`
    fn remote_account(&self, name: &str, iat: i64, description: &str) -> String {
        let mut claim = self.account(name).clone();
        claim.body = ClaimBody::Account(AccountClaim {
            description: Some(description.to_string()),
            ..Default::default()
        });
        claim.iat = iat;
        claim.encode(&self.operator).unwrap()
    }

    fn account_path(&self, name: &str) -> std::path::PathBuf {
        self.store
            .path()
            .join(format!("acme/Accounts/{}/{}.jwt", name, name))
    }

    fn remote_operator(&self) -> String {
        let mut claim = self.claim_store().read_operator_claim().unwrap();
        claim.touch(Some(claim.iat));
        claim.encode(&self.operator).unwrap()
    }
}

fn pull_all(fetcher: MockFetcher) -> Pull {
    let mut pull = Pull::new(Arc::new(fetcher));
    pull.all = true;
    pull
}

fn description(claim: &Claim) -> Option<String> {
    match &claim.body {
        ClaimBody::Account(account) => account.description.clone(),
        _ => None,
    }
}

#[tokio::test]
async fn test_pull_all_updates_and_reports_missing() {
    let fixture = Fixture::new(Some(SERVER), &["billing", "ops"]);
    let local_iat = fixture.account("billing").iat;
    let ops_before = std::fs::read(fixture.account_path("ops")).unwrap();
    let mut fetcher = MockFetcher::default();
    fetcher.respond(format!("{}/operator", SERVER), 200, fixture.remote_operator());
    fetcher.respond(
        fixture.account_url("billing"),
        200,
        fixture.remote_account("billing", local_iat + 5, "updated"),
    );

    let mut pull = pull_all(fetcher);
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    let entries = report.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].status, Status::Ok);
    assert_eq!(entries[0].message, "pulled operator \"acme\" from the remote server");
    assert_eq!(entries[1].message, "pulled account \"billing\" from the remote server");
    assert_eq!(entries[2].status, Status::Error);
    assert!(entries[2].message.contains("404"));
    assert_eq!(report.error_count(), 1);

    let billing = fixture.claim_store().read_account_claim("billing").unwrap();
    assert_eq!(billing.iat, local_iat + 5);
    assert_eq!(description(&billing).as_deref(), Some("updated"));
    assert_eq!(std::fs::read(fixture.account_path("ops")).unwrap(), ops_before);
}

#[tokio::test]
async fn test_newer_local_claim_is_a_conflict_unless_overwriting() {
    let fixture = Fixture::new(Some(SERVER), &["billing"]);
    let local_iat = fixture.account("billing").iat;
    let path = fixture.account_path("billing");
    let original = std::fs::read(&path).unwrap();
    let stale = fixture.remote_account("billing", local_iat - 10, "stale");

    let mut fetcher = MockFetcher::default();
    fetcher.respond(fixture.account_url("billing"), 200, stale.clone());
    let mut pull = Pull::new(Arc::new(fetcher));
    pull.account = Some("billing".to_string());
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    assert_eq!(report.error_count(), 1);
    assert!(report.entries()[0].message.contains("newer"));
    assert_eq!(std::fs::read(&path).unwrap(), original);

    let mut fetcher = MockFetcher::default();
    fetcher.respond(fixture.account_url("billing"), 200, stale.clone());
    let mut pull = Pull::new(Arc::new(fetcher));
    pull.account = Some("billing".to_string());
    pull.overwrite = true;
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    assert!(!report.has_errors());
    assert_eq!(report.entries()[0].status, Status::Warn);
    assert!(report.entries()[0]
        .message
        .contains("replaced a newer local copy"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), stale);
}

#[tokio::test]
async fn test_reply_for_another_account_is_rejected() {
    let fixture = Fixture::new(Some(SERVER), &["billing", "ops"]);
    let ops_iat = fixture.account("ops").iat;
    fixture
        .claim_store()
        .write_raw(&fixture.remote_account("ops", ops_iat + 1000, "local edit"))
        .unwrap();
    let ops_before = std::fs::read(fixture.account_path("ops")).unwrap();
    let billing_before = std::fs::read(fixture.account_path("billing")).unwrap();

    let mut fetcher = MockFetcher::default();
    fetcher.respond(
        fixture.account_url("billing"),
        200,
        fixture.remote_account("ops", ops_iat, "stale"),
    );
    let mut pull = Pull::new(Arc::new(fetcher));
    pull.account = Some("billing".to_string());
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    assert_eq!(report.error_count(), 1);
    let message = &report.entries()[0].message;
    assert!(message.starts_with("account \"billing\""));
    assert!(message.contains(&format!("instead of {}", fixture.account("billing").sub)));
    assert_eq!(std::fs::read(fixture.account_path("ops")).unwrap(), ops_before);
    assert_eq!(std::fs::read(fixture.account_path("billing")).unwrap(), billing_before);
}

#[tokio::test]
async fn test_renamed_remote_account_is_rejected() {
    let fixture = Fixture::new(Some(SERVER), &["billing"]);
    let mut renamed = fixture.account("billing").clone();
    renamed.name = "billing-renamed".to_string();
    renamed.iat += 1;
    let token = renamed.encode(&fixture.operator).unwrap();

    let mut fetcher = MockFetcher::default();
    fetcher.respond(fixture.account_url("billing"), 200, token);
    let mut pull = Pull::new(Arc::new(fetcher));
    pull.account = Some("billing".to_string());
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    assert_eq!(report.error_count(), 1);
    assert!(report.entries()[0].message.contains("\"billing-renamed\""));
    assert_eq!(
        fixture.claim_store().list(KeyKind::Account, None).unwrap(),
        vec!["billing".to_string()]
    );
}

#[tokio::test]
async fn test_failures_are_counted_per_job() {
    let names = ["a1", "a2", "a3", "a4", "a5"];
    let fixture = Fixture::new(Some(SERVER), &names);
    let mut fetcher = MockFetcher::default();
    fetcher.respond(format!("{}/operator", SERVER), 200, fixture.remote_operator());
    for name in names {
        let iat = fixture.account(name).iat + 1;
        let status = if name == "a2" || name == "a4" { 500 } else { 200 };
        fetcher.respond(
            fixture.account_url(name),
            status,
            fixture.remote_account(name, iat, name),
        );
    }

    let mut pull = pull_all(fetcher);
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    assert_eq!(report.entries().len(), 6);
    assert_eq!(report.error_count(), 2);
    assert_eq!(report.entries()[2].status, Status::Error);
    assert_eq!(report.entries()[4].status, Status::Error);
}

#[tokio::test]
async fn test_network_errors_are_reported_per_job() {
    let names = ["a1", "a2", "a3", "a4", "a5"];
    let fixture = Fixture::new(Some(SERVER), &names);
    let mut fetcher = MockFetcher::default();
    fetcher.respond(format!("{}/operator", SERVER), 200, fixture.remote_operator());
    for name in names {
        let iat = fixture.account(name).iat + 1;
        fetcher.respond(
            fixture.account_url(name),
            200,
            fixture.remote_account(name, iat, name),
        );
    }
    fetcher.err_on.insert(fixture.account_url("a3"));
    let a3_before = std::fs::read(fixture.account_path("a3")).unwrap();

    let mut pull = pull_all(fetcher);
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    assert_eq!(report.entries().len(), 6);
    assert_eq!(report.error_count(), 1);
    let failed = &report.entries()[3];
    assert_eq!(failed.status, Status::Error);
    assert!(failed.message.starts_with("account \"a3\""));
    assert!(failed.message.contains("connection refused"));
    for (index, name) in [(1, "a1"), (2, "a2"), (4, "a4"), (5, "a5")] {
        assert_eq!(
            report.entries()[index].message,
            format!("pulled account {:?} from the remote server", name)
        );
    }
    assert_eq!(std::fs::read(fixture.account_path("a3")).unwrap(), a3_before);
}

#[tokio::test]
async fn test_user_token_is_rejected() {
    let fixture = Fixture::new(Some(SERVER), &["billing"]);
    let (_, account_pair) = &fixture.accounts[0];
    let user = KeyPair::generate(KeyKind::User);
    let token = Claim::new("alice", &user.public_key(), ClaimBody::User(UserClaim::default()))
        .encode(account_pair)
        .unwrap();

    let mut fetcher = MockFetcher::default();
    fetcher.respond(fixture.account_url("billing"), 200, token);
    let mut pull = Pull::new(Arc::new(fetcher));
    pull.account = Some("billing".to_string());
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    assert_eq!(report.error_count(), 1);
    assert!(report.entries()[0]
        .message
        .contains("only operator and account tokens"));
}

#[tokio::test]
async fn test_armored_and_empty_bodies() {
    let fixture = Fixture::new(Some(SERVER), &["billing", "ops"]);
    let iat = fixture.account("billing").iat + 1;
    let mut fetcher = MockFetcher::default();
    fetcher.respond(format!("{}/operator", SERVER), 200, "");
    fetcher.respond(
        fixture.account_url("billing"),
        200,
        armor(KeyKind::Account, &fixture.remote_account("billing", iat, "armored")),
    );
    fetcher.respond(fixture.account_url("ops"), 200, "not a token");

    let mut pull = pull_all(fetcher);
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    let statuses: Vec<Status> = report.entries().iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![Status::Error, Status::Ok, Status::Error]);
    assert!(report.entries()[0].message.contains("no data"));
    assert!(report.entries()[2].message.contains("invalid token"));
}

#[tokio::test]
async fn test_panicked_fetch_becomes_error_entry() {
    let fixture = Fixture::new(Some(SERVER), &["billing"]);
    let mut fetcher = MockFetcher::default();
    fetcher.respond(format!("{}/operator", SERVER), 200, fixture.remote_operator());
    fetcher.panic_on = Some(fixture.account_url("billing"));

    let mut pull = pull_all(fetcher);
    let report = run_action(&fixture.ctx(), &mut pull).await.unwrap();

    assert_eq!(report.entries().len(), 2);
    assert_eq!(report.entries()[0].status, Status::Ok);
    assert!(report.entries()[1].message.contains("did not complete"));
}

#[tokio::test]
async fn test_pull_requires_scope_and_server_url() {
    let fixture = Fixture::new(Some(SERVER), &["billing"]);
    let mut pull = Pull::new(Arc::new(MockFetcher::default()));
    let err = run_action(&fixture.ctx(), &mut pull).await.unwrap_err();
    assert!(err.show_usage());

    let fixture = Fixture::new(None, &["billing"]);
    let mut pull = pull_all(MockFetcher::default());
    let err = run_action(&fixture.ctx(), &mut pull).await.unwrap_err();
    assert!(err.show_usage());
    assert!(err.to_string().contains("account server url"));
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let fixture = Fixture::new(Some(SERVER), &["billing"]);
    let mut pull = Pull::new(Arc::new(MockFetcher::default()));
    pull.account = Some("payroll".to_string());
    let err = run_action(&fixture.ctx(), &mut pull).await.unwrap_err();
    assert!(err.show_usage());
    assert!(err.to_string().contains("payroll"));
}
