//! Patient loader: one view session over a repository.
//!
//! A [`PatientView`] holds the record for the identifier currently being viewed and moves through
//!
//! ```text
//! Pending ──▶ Loaded
//!    │
//!    ├──────▶ NotFound      (terminal until the next navigation)
//!    └──────▶ Unavailable   (transient failure, reported; navigate again to retry)
//! ```
//!
//! Every navigation captures a fresh [`RequestToken`]. A fetch that resolves after a newer
//! navigation has started is discarded: it changes no state, sets no title and reports no error.

use crate::error::ViewError;
use crate::presenter::{derive_fields, patient_title, PatientFields};
use crate::record::PatientRecord;
use crate::repositories::{PatientRepository, RepositoryResult};
use chrono::{DateTime, Utc};
use patient_view_types::PatientId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Receives the page title once per successful load.
pub trait TitleSetter: Send + Sync {
    fn set_title(&self, title: &str);
}

impl<F> TitleSetter for F
where
    F: Fn(&str) + Send + Sync,
{
    fn set_title(&self, title: &str) {
        self(title)
    }
}

/// Receives fetch failures other than "not found".
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &ViewError);
}

impl<F> ErrorReporter for F
where
    F: Fn(&ViewError) + Send + Sync,
{
    fn report(&self, error: &ViewError) {
        self(error)
    }
}

/// Reports errors through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, error: &ViewError) {
        tracing::error!("patient view error: {}", error);
    }
}

/// Generation number of a navigation. Only the latest one may commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// State of a patient view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewState {
    Pending,
    Loaded(Arc<PatientRecord>),
    NotFound,
    Unavailable,
}

impl ViewState {
    pub fn record(&self) -> Option<&Arc<PatientRecord>> {
        match self {
            ViewState::Loaded(record) => Some(record),
            _ => None,
        }
    }
}

/// What a call to [`PatientView::load`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    NotFound,
    Unavailable,
    /// A newer navigation started while this fetch was in flight; the result was dropped.
    Stale,
}

#[derive(Debug)]
struct Session {
    token: RequestToken,
    patient_id: Option<PatientId>,
    state: ViewState,
}

/// A read-only view of one patient at a time.
pub struct PatientView {
    repository: Arc<dyn PatientRepository>,
    title: Arc<dyn TitleSetter>,
    errors: Arc<dyn ErrorReporter>,
    session: Mutex<Session>,
}

impl PatientView {
    /// Creates a view in the `Pending` state that reports errors via [`TracingErrorReporter`].
    pub fn new(repository: Arc<dyn PatientRepository>, title: Arc<dyn TitleSetter>) -> Self {
        Self {
            repository,
            title,
            errors: Arc::new(TracingErrorReporter),
            session: Mutex::new(Session {
                token: RequestToken(0),
                patient_id: None,
                state: ViewState::Pending,
            }),
        }
    }

    pub fn with_error_reporter(mut self, errors: Arc<dyn ErrorReporter>) -> Self {
        self.errors = errors;
        self
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ViewState {
        self.session().state.clone()
    }

    /// Identifier of the most recent navigation, if any.
    pub fn patient_id(&self) -> Option<PatientId> {
        self.session().patient_id.clone()
    }

    /// Starts viewing `id`: resets to `Pending` and invalidates any in-flight fetch.
    pub fn navigate(&self, id: PatientId) -> RequestToken {
        let mut session = self.session();
        session.token = RequestToken(session.token.0 + 1);
        session.patient_id = Some(id);
        session.state = ViewState::Pending;
        session.token
    }

    /// Navigates to `id` and fetches its record.
    ///
    /// Issues exactly one repository fetch. On success the title setter is called once with
    /// [`patient_title`]. A missing record moves the view to `NotFound`; any other repository
    /// failure is passed to the error reporter and leaves the view `Unavailable`.
    pub async fn load(&self, id: PatientId) -> LoadOutcome {
        let token = self.navigate(id.clone());
        tracing::debug!("fetching patient {}", id);
        let result = self.repository.find(&id).await;
        self.commit(token, &id, result)
    }

    fn commit(
        &self,
        token: RequestToken,
        id: &PatientId,
        result: RepositoryResult<PatientRecord>,
    ) -> LoadOutcome {
        let mut session = self.session();
        if session.token != token {
            tracing::debug!(
                "discarding stale fetch for patient {} ({:?} superseded by {:?})",
                id,
                token,
                session.token
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(record) => {
                let title = patient_title(&record);
                session.state = ViewState::Loaded(Arc::new(record));
                drop(session);
                self.title.set_title(&title);
                LoadOutcome::Loaded
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("{}", ViewError::NotFound(id.to_string()));
                session.state = ViewState::NotFound;
                LoadOutcome::NotFound
            }
            Err(source) => {
                session.state = ViewState::Unavailable;
                drop(session);
                self.errors.report(&ViewError::TransientFetch {
                    id: id.to_string(),
                    source,
                });
                LoadOutcome::Unavailable
            }
        }
    }

    /// Fields for the loaded record as of now. `None` unless the view is `Loaded`.
    pub fn fields(&self) -> Option<PatientFields> {
        self.fields_at(Utc::now())
    }

    /// Fields for the loaded record as of `now`. `None` unless the view is `Loaded`.
    pub fn fields_at(&self, now: DateTime<Utc>) -> Option<PatientFields> {
        let record = self.state().record().cloned()?;
        Some(derive_fields(&record, now))
    }

    /// Title for the loaded record. `None` unless the view is `Loaded`.
    pub fn title(&self) -> Option<String> {
        self.state().record().map(|record| patient_title(record))
    }
}

impl std::fmt::Debug for PatientView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientView")
            .field("session", &*self.session())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::FieldValue;
    use crate::repositories::memory::InMemoryPatientRepository;
    use crate::repositories::RepositoryError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn id(s: &str) -> PatientId {
        PatientId::parse(s).expect("valid id")
    }

    fn patient(id: &str, friendly_id: &str) -> PatientRecord {
        PatientRecord {
            id: id.into(),
            friendly_id: friendly_id.into(),
            prefix: Some("prefix".into()),
            given_name: Some("givenName".into()),
            family_name: Some("familyName".into()),
            suffix: Some("suffix".into()),
            sex: Some("male".into()),
            patient_type: Some("charity".into()),
            occupation: Some("occupation".into()),
            preferred_language: Some("preferredLanguage".into()),
            phone_number: Some("phoneNumber".into()),
            email: Some("email@email.com".into()),
            address: Some("address".into()),
            date_of_birth: Some(Utc::now().to_rfc3339()),
            is_approximate_date_of_birth: false,
        }
    }

    #[derive(Default)]
    struct RecordingTitle(Mutex<Vec<String>>);

    impl TitleSetter for RecordingTitle {
        fn set_title(&self, title: &str) {
            self.0.lock().unwrap().push(title.to_string());
        }
    }

    impl RecordingTitle {
        fn calls(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct RecordingErrors(Mutex<Vec<String>>);

    impl ErrorReporter for RecordingErrors {
        fn report(&self, error: &ViewError) {
            self.0.lock().unwrap().push(error.to_string());
        }
    }

    /// Counts fetches and fails with a storage error for one configured id.
    struct CountingRepository {
        inner: InMemoryPatientRepository,
        fetches: AtomicUsize,
        broken_id: Option<String>,
    }

    #[async_trait]
    impl PatientRepository for CountingRepository {
        async fn find(&self, id: &PatientId) -> RepositoryResult<PatientRecord> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.broken_id.as_deref() == Some(id.as_str()) {
                return Err(RepositoryError::Unavailable("disk on fire".into()));
            }
            self.inner.find(id).await
        }
    }

    /// Holds fetches for `gated_id` until `gate` is notified.
    struct GatedRepository {
        inner: InMemoryPatientRepository,
        gated_id: String,
        gate: Notify,
    }

    #[async_trait]
    impl PatientRepository for GatedRepository {
        async fn find(&self, id: &PatientId) -> RepositoryResult<PatientRecord> {
            if id.as_str() == self.gated_id {
                self.gate.notified().await;
            }
            self.inner.find(id).await
        }
    }

    fn counting(records: Vec<PatientRecord>, broken_id: Option<&str>) -> Arc<CountingRepository> {
        Arc::new(CountingRepository {
            inner: InMemoryPatientRepository::with_records(records),
            fetches: AtomicUsize::new(0),
            broken_id: broken_id.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn new_view_is_pending_without_fields() {
        let view = PatientView::new(
            Arc::new(InMemoryPatientRepository::new()),
            Arc::new(RecordingTitle::default()),
        );

        assert_eq!(view.state(), ViewState::Pending);
        assert_eq!(view.fields(), None);
        assert_eq!(view.title(), None);
        assert_eq!(view.patient_id(), None);
    }

    #[tokio::test]
    async fn successful_load_sets_title_once() {
        let repo = counting(vec![patient("123", "P00001")], None);
        let titles = Arc::new(RecordingTitle::default());
        let view = PatientView::new(repo.clone(), titles.clone());

        let outcome = view.load(id("123")).await;

        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(titles.calls(), vec!["givenName familyName suffix (P00001)"]);
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(view.patient_id(), Some(id("123")));

        let fields = view.fields().expect("loaded view has fields");
        assert_eq!(fields.get("age").unwrap().value, FieldValue::Text("0".into()));

        // Rendering again does not refetch or retitle.
        let _ = view.fields();
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(titles.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_record_is_terminal_not_found() {
        let repo = counting(vec![], None);
        let titles = Arc::new(RecordingTitle::default());
        let errors = Arc::new(RecordingErrors::default());
        let view = PatientView::new(repo, titles.clone()).with_error_reporter(errors.clone());

        let outcome = view.load(id("123")).await;

        assert_eq!(outcome, LoadOutcome::NotFound);
        assert_eq!(view.state(), ViewState::NotFound);
        assert_eq!(view.fields(), None);
        assert!(titles.calls().is_empty());
        assert!(errors.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_reported_and_leaves_view_empty() {
        let repo = counting(vec![patient("123", "P00001")], Some("123"));
        let titles = Arc::new(RecordingTitle::default());
        let errors = Arc::new(RecordingErrors::default());
        let view = PatientView::new(repo, titles.clone()).with_error_reporter(errors.clone());

        let outcome = view.load(id("123")).await;

        assert_eq!(outcome, LoadOutcome::Unavailable);
        assert_eq!(view.state(), ViewState::Unavailable);
        assert_eq!(view.fields(), None);
        assert!(titles.calls().is_empty());
        let reported = errors.0.lock().unwrap().clone();
        assert_eq!(reported.len(), 1);
        assert!(reported[0].contains("disk on fire"));
    }

    #[tokio::test]
    async fn navigating_again_refetches() {
        let repo = counting(vec![patient("123", "P00001")], None);
        let titles = Arc::new(RecordingTitle::default());
        let view = PatientView::new(repo.clone(), titles.clone());

        view.load(id("123")).await;
        view.load(id("123")).await;

        assert_eq!(repo.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(titles.calls().len(), 2);
    }

    #[tokio::test]
    async fn stale_result_is_discarded() {
        let repo = Arc::new(GatedRepository {
            inner: InMemoryPatientRepository::with_records([
                patient("slow", "P00001"),
                patient("fast", "P00002"),
            ]),
            gated_id: "slow".into(),
            gate: Notify::new(),
        });
        let titles = Arc::new(RecordingTitle::default());
        let view = PatientView::new(repo.clone(), titles.clone());

        let (slow, fast) = tokio::join!(view.load(id("slow")), async {
            // Let the slow fetch start and park on the gate first.
            while view.patient_id() != Some(id("slow")) {
                tokio::task::yield_now().await;
            }
            let outcome = view.load(id("fast")).await;
            repo.gate.notify_one();
            outcome
        });

        assert_eq!(slow, LoadOutcome::Stale);
        assert_eq!(fast, LoadOutcome::Loaded);
        assert_eq!(view.patient_id(), Some(id("fast")));
        assert_eq!(
            view.state().record().map(|r| r.friendly_id.clone()),
            Some("P00002".to_string())
        );
        assert_eq!(titles.calls(), vec!["givenName familyName suffix (P00002)"]);
    }

    #[tokio::test]
    async fn navigate_invalidates_in_flight_fetch() {
        let repo = counting(vec![patient("123", "P00001")], None);
        let titles = Arc::new(RecordingTitle::default());
        let view = PatientView::new(repo, titles.clone());

        let token = view.navigate(id("123"));
        let newer = view.navigate(id("456"));
        assert!(newer > token);

        let outcome = view.commit(token, &id("123"), Ok(patient("123", "P00001")));
        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(view.state(), ViewState::Pending);
        assert!(titles.calls().is_empty());
    }

    #[tokio::test]
    async fn closures_work_as_collaborators() {
        let seen = Arc::new(Mutex::new(None::<String>));
        let sink = seen.clone();
        let view = PatientView::new(
            Arc::new(InMemoryPatientRepository::with_records([patient(
                "123", "P00001",
            )])),
            Arc::new(move |title: &str| *sink.lock().unwrap() = Some(title.to_string())),
        );

        view.load(id("123")).await;

        assert_eq!(
            seen.lock().unwrap().as_deref(),
            Some("givenName familyName suffix (P00001)")
        );
        assert_eq!(view.title().as_deref(), Some("givenName familyName suffix (P00001)"));
    }
}
