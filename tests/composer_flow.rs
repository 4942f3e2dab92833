//! End-to-end wizard flows through the library API
//!
//! Drafts go to a JSON file store in a temp dir and submissions to the
//! scripted mock API, so a "reload" is a fresh `Composer` over the same files.

use std::sync::Arc;

use reqwest::Url;
use serde_json::json;
use tempfile::TempDir;

use composer::api::mock::RecordedCall;
use composer::api::{ApiError, MockEntityApi, SubmissionDispatcher};
use composer::drafts::{DraftStore, JsonFileDraftStore};
use composer::wizard::location::StepLocation;
use composer::wizard::value::from_json;
use composer::wizard::{Composer, Outcome, Phase, SubmitMode, WizardKind};

struct Fixture {
    _dir: TempDir,
    store: Arc<JsonFileDraftStore>,
    api: Arc<MockEntityApi>,
}

impl Fixture {
    fn new(kind: WizardKind) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonFileDraftStore::new(dir.path(), kind.slug()));
        Self {
            _dir: dir,
            store,
            api: Arc::new(MockEntityApi::new()),
        }
    }

    fn dispatcher(&self, kind: WizardKind) -> SubmissionDispatcher {
        SubmissionDispatcher::new(kind, self.api.clone())
    }

    fn start(&self, kind: WizardKind, mode: SubmitMode) -> Composer {
        Composer::start(kind.registry(), mode, self.store.clone(), self.dispatcher(kind))
    }

    fn resume(&self, kind: WizardKind, index: usize, hint: Option<&str>) -> Composer {
        Composer::resume(
            kind.registry(),
            index,
            hint,
            SubmitMode::Create,
            self.store.clone(),
            self.dispatcher(kind),
        )
        .unwrap()
    }
}

fn value(json: serde_json::Value) -> composer::wizard::DraftValue {
    from_json(json).unwrap()
}

#[tokio::test]
async fn test_project_resumes_after_reload_and_completes() {
    let fx = Fixture::new(WizardKind::Project);

    {
        let mut composer = fx.start(WizardKind::Project, SubmitMode::Create);
        let outcome = composer
            .submit_step(
                "basics",
                value(json!({"title": "Park cleanup", "organization": {"id": 4}})),
            )
            .await;
        assert_eq!(
            outcome,
            Outcome::Advanced {
                from: "basics".into(),
                to: "description".into()
            }
        );
        composer
            .submit_step("description", value(json!({"description": "Pick up litter"})))
            .await;
        assert_eq!(composer.location(), StepLocation::new("location", Some(0)));
    }

    // The page reloads with ?step=location&draft=0
    let url = Url::parse("https://app.example.org/projects/new?step=location&draft=0").unwrap();
    let location = StepLocation::from_url(&url).unwrap();
    let mut composer = fx.resume(
        WizardKind::Project,
        location.draft_index.unwrap(),
        Some(&location.step_id),
    );
    assert_eq!(composer.state().current_step, "location");
    assert_eq!(composer.state().value["title"], "Park cleanup");

    composer
        .submit_step("location", value(json!({"address": "1 Main St"})))
        .await;
    let outcome = composer
        .submit_step("roles", value(json!({"roles": [{"title": "Crew lead"}]})))
        .await;

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(composer.state().phase, Phase::Submitted);
    assert!(fx.store.list().unwrap().is_empty());

    let entity = composer.state().entity.clone().unwrap();
    assert_eq!(entity["id"], "projects-1");
    assert_eq!(entity["organization_id"], 4);
}

#[tokio::test]
async fn test_resume_hint_ignored_when_earlier_steps_missing() {
    let fx = Fixture::new(WizardKind::Project);
    let mut composer = fx.start(WizardKind::Project, SubmitMode::Create);
    composer
        .submit_step("basics", value(json!({"title": "Only a title"})))
        .await;
    // organization is required, so the step is rejected and nothing is saved
    assert!(fx.store.list().unwrap().is_empty());

    composer
        .submit_step(
            "basics",
            value(json!({"title": "Only a title", "organization": {"id": 1}})),
        )
        .await;
    let drafts = fx.store.list().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].step_id.as_deref(), Some("description"));

    let resumed = fx.resume(WizardKind::Project, 0, Some("roles"));
    assert_eq!(resumed.state().current_step, "description");
}

#[tokio::test]
async fn test_two_sessions_keep_separate_drafts() {
    let fx = Fixture::new(WizardKind::Organization);
    let mut first = fx.start(WizardKind::Organization, SubmitMode::Create);
    let mut second = fx.start(WizardKind::Organization, SubmitMode::Create);

    first
        .submit_step("basics", value(json!({"name": "Harbor", "description": "Shelter"})))
        .await;
    second
        .submit_step("basics", value(json!({"name": "Lantern", "description": "Tutoring"})))
        .await;
    first
        .submit_step("contact", value(json!({"email": "hi@harbor.org"})))
        .await;

    assert_eq!(first.draft_index(), Some(0));
    assert_eq!(second.draft_index(), Some(1));

    let drafts = fx.store.list().unwrap();
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].value["email"], "hi@harbor.org");
    assert_eq!(drafts[1].value["name"], "Lantern");
    assert!(drafts[0].updated_at >= drafts[0].created_at);
}

#[tokio::test]
async fn test_failed_submission_is_kept_and_retried() {
    let fx = Fixture::new(WizardKind::Organization);
    fx.api
        .push_response(Err(ApiError::network("api", "connection reset")));

    let mut composer = fx.start(WizardKind::Organization, SubmitMode::Create);
    composer
        .submit_step("basics", value(json!({"name": "Harbor", "description": "Shelter"})))
        .await;
    composer
        .submit_step("contact", value(json!({"email": "hi@harbor.org"})))
        .await;
    let outcome = composer
        .submit_step("causes", value(json!({"causes": ["animals"]})))
        .await;

    assert!(matches!(outcome, Outcome::Failed(_)));
    assert!(composer.state().failure.is_some());
    let drafts = fx.store.list().unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].value["causes"], json!(["animals"]));

    let outcome = composer.retry().await;
    assert_eq!(outcome, Outcome::Completed);
    assert!(composer.state().failure.is_none());
    assert!(fx.store.list().unwrap().is_empty());
    assert_eq!(fx.api.calls().len(), 2);
}

#[tokio::test]
async fn test_duplicate_project_creates_fresh_record() {
    let fx = Fixture::new(WizardKind::Project);
    let existing = value(json!({
        "title": "Park cleanup",
        "slug": "park-cleanup",
        "organization": {"id": 4},
        "description": "Pick up litter",
        "is_virtual": true,
        "roles": [{"id": 31, "title": "Crew lead"}]
    }));

    let mut composer = Composer::with_value(
        WizardKind::Project.registry(),
        SubmitMode::Duplicate,
        existing,
        fx.store.clone(),
        fx.dispatcher(WizardKind::Project),
    );
    let label = composer.label(composer.current_step());
    assert_eq!(label, "Basics (copy)");

    let outcome = composer
        .submit_step("roles", value(json!({})))
        .await;
    assert_eq!(outcome, Outcome::Completed);

    let calls = fx.api.calls();
    let RecordedCall::Create { collection, body } = &calls[0] else {
        panic!("duplicate must create a new record");
    };
    assert_eq!(collection, "projects");
    assert!(body.get("slug").is_none());
    assert_eq!(body["roles"], json!([{"title": "Crew lead"}]));
}

#[tokio::test]
async fn test_sessions_survive_another_sessions_discard() {
    let fx = Fixture::new(WizardKind::Organization);
    let mut sessions = Vec::new();
    for name in ["One", "Two", "Three"] {
        let mut composer = fx.start(WizardKind::Organization, SubmitMode::Create);
        composer
            .submit_step("basics", value(json!({"name": name, "description": "d"})))
            .await;
        sessions.push(composer);
    }
    let mut third = sessions.pop().unwrap();
    let mut second = sessions.pop().unwrap();
    let mut first = sessions.pop().unwrap();

    first.discard().unwrap();
    second
        .submit_step("contact", value(json!({"email": "two@example.org"})))
        .await;
    third
        .submit_step("contact", value(json!({"email": "three@example.org"})))
        .await;

    assert_eq!(second.draft_index(), Some(1));
    assert_eq!(third.draft_index(), Some(2));

    let entries = fx.store.entries().unwrap();
    let names: Vec<_> = entries
        .iter()
        .map(|(index, d)| (*index, d.value["name"].clone(), d.value["email"].clone()))
        .collect();
    assert_eq!(
        names,
        vec![
            (1, json!("Two"), json!("two@example.org")),
            (2, json!("Three"), json!("three@example.org")),
        ]
    );

    // the freed slot is not handed to a new session
    let mut fourth = fx.start(WizardKind::Organization, SubmitMode::Create);
    fourth
        .submit_step("basics", value(json!({"name": "Four", "description": "d"})))
        .await;
    assert_eq!(fourth.draft_index(), Some(3));
}
