//! The interactive session: one state machine over login, the dashboard, the
//! new-analysis form, history, and report details.

use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::analysis::AnalysisClient;
use crate::auth::{AcceptAnyIdentifier, Authenticator, Identity};
use crate::backend::{GenerativeModel, InlineImage};
use crate::capture::ImageSource;
use crate::error::{LensError, Result, ValidationError};
use crate::model::SymptomReport;
use crate::store::ReportStore;

/// Number of reports shown on the dashboard.
pub const DASHBOARD_RECENT: usize = 4;

/// What the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    LoggedOut,
    Dashboard,
    /// New-analysis form
    Composing,
    /// Composing with a call in flight
    Analyzing,
    History,
    /// A report, by id
    Details(String),
}

/// A user-visible message produced by the last action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Input was rejected; nothing changed
    Validation(ValidationError),
    /// The analysis call failed; the form is back for a manual retry
    AnalysisFailed { reason: &'static str },
    /// The analysis succeeded but the collection could not be persisted
    SavedLocallyOnly,
    /// The capture collaborator failed
    CaptureFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Validation(e) => write!(f, "{}", e),
            Notice::AnalysisFailed { reason: "timeout" } => {
                f.write_str("Symptom correlation timed out. Please try again.")
            }
            Notice::AnalysisFailed { reason: "cancelled" } => {
                f.write_str("Symptom correlation was cancelled.")
            }
            Notice::AnalysisFailed { .. } => {
                f.write_str("Symptom correlation failed. Please try again.")
            }
            Notice::SavedLocallyOnly => f.write_str(
                "Analysis complete, but it could not be saved. It will be lost when you exit.",
            ),
            Notice::CaptureFailed(e) => write!(f, "Could not capture image: {}", e),
        }
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub report_id: String,
    /// Whether the collection including this report reached durable storage
    pub durable: bool,
}

/// Holds the view in `Analyzing` for the duration of a call and puts the form
/// back when dropped, including when the `submit` future itself is dropped.
struct AnalyzingGuard<'a> {
    view: &'a mut View,
}

impl<'a> AnalyzingGuard<'a> {
    fn enter(view: &'a mut View) -> Self {
        *view = View::Analyzing;
        Self { view }
    }
}

impl Drop for AnalyzingGuard<'_> {
    fn drop(&mut self) {
        if *self.view == View::Analyzing {
            *self.view = View::Composing;
        }
    }
}

/// Drives the session state machine.
///
/// The report collection is owned here, per session, and kept newest-first.
/// Submissions take `&mut self`, so at most one analysis is in flight.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use ayushlens::{AnalysisClient, FileReportStore, GeminiClient, SessionController, View};
///
/// let analysis = AnalysisClient::new(GeminiClient::from_env()?);
/// let store = FileReportStore::new("reports.json");
/// let mut session = SessionController::open(analysis, store).await;
///
/// session.login("alice", "").await?;
/// session.start_new_analysis()?;
/// session.set_symptoms("persistent cough, mild fever")?;
/// let submission = session.submit().await?;
/// assert_eq!(session.view(), &View::Details(submission.report_id));
/// # Ok(())
/// # }
/// ```
pub struct SessionController<M, S, A = AcceptAnyIdentifier> {
    analysis: AnalysisClient<M>,
    store: S,
    auth: A,
    view: View,
    identity: Option<Identity>,
    reports: Vec<SymptomReport>,
    selected: Option<String>,
    symptoms: String,
    image: Option<String>,
    cancel: CancellationToken,
    notice: Option<Notice>,
}

impl<M, S> SessionController<M, S, AcceptAnyIdentifier>
where
    M: GenerativeModel,
    S: ReportStore,
{
    /// Open a session with the default authenticator, loading the stored collection.
    pub async fn open(analysis: AnalysisClient<M>, store: S) -> Self {
        Self::with_authenticator(analysis, store, AcceptAnyIdentifier).await
    }
}

impl<M, S, A> SessionController<M, S, A>
where
    M: GenerativeModel,
    S: ReportStore,
    A: Authenticator,
{
    /// Open a session, loading the stored collection once.
    pub async fn with_authenticator(analysis: AnalysisClient<M>, store: S, auth: A) -> Self {
        let reports = store.load().await;
        info!(reports = reports.len(), "Session opened");
        Self {
            analysis,
            store,
            auth,
            view: View::LoggedOut,
            identity: None,
            reports,
            selected: None,
            symptoms: String::new(),
            image: None,
            cancel: CancellationToken::new(),
            notice: None,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.username.as_str())
    }

    /// All reports, newest first.
    pub fn reports(&self) -> &[SymptomReport] {
        &self.reports
    }

    /// The newest `n` reports.
    pub fn recent_reports(&self, n: usize) -> &[SymptomReport] {
        &self.reports[..n.min(self.reports.len())]
    }

    pub fn selected_report(&self) -> Option<&SymptomReport> {
        let id = self.selected.as_deref()?;
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn symptoms(&self) -> &str {
        &self.symptoms
    }

    pub fn attached_image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.view == View::Analyzing
    }

    /// The message produced by the most recent action, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Token that aborts the in-flight analysis when cancelled. A cancel issued
    /// while idle is discarded by the next [`submit`](Self::submit).
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn reject(&mut self, e: ValidationError) -> LensError {
        debug!(error = %e, "Rejected action");
        self.notice = Some(Notice::Validation(e.clone()));
        e.into()
    }

    fn require_login(&mut self) -> Result<()> {
        if self.identity.is_none() {
            return Err(self.reject(ValidationError::NotLoggedIn));
        }
        Ok(())
    }

    fn require_composing(&mut self) -> Result<()> {
        match self.view {
            View::Composing => Ok(()),
            View::Analyzing => Err(self.reject(ValidationError::AnalysisInFlight)),
            _ => Err(self.reject(ValidationError::NotComposing)),
        }
    }

    #[instrument(name = "session_login", skip(self, identifier, secret))]
    pub async fn login(&mut self, identifier: &str, secret: &str) -> Result<()> {
        self.notice = None;
        if self.identity.is_some() {
            return Err(self.reject(ValidationError::AlreadyLoggedIn));
        }
        match self.auth.authenticate(identifier, secret).await {
            Ok(identity) => {
                info!(username = %identity.username, "Logged in");
                self.identity = Some(identity);
                self.view = View::Dashboard;
                Ok(())
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Open an empty new-analysis form.
    pub fn start_new_analysis(&mut self) -> Result<()> {
        self.notice = None;
        self.require_login()?;
        if self.view == View::Analyzing {
            return Err(self.reject(ValidationError::AnalysisInFlight));
        }
        self.symptoms.clear();
        self.image = None;
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        self.view = View::Composing;
        Ok(())
    }

    pub fn set_symptoms(&mut self, symptoms: impl Into<String>) -> Result<()> {
        self.require_composing()?;
        self.symptoms = symptoms.into();
        Ok(())
    }

    /// Attach an image given as a data URI or bare base64 JPEG payload.
    pub fn attach_image(&mut self, image: &str) -> Result<()> {
        self.require_composing()?;
        match InlineImage::from_data_uri(image) {
            Some(inline) => {
                debug!(bytes = inline.data.len(), "Image attached");
                self.image = Some(inline.to_data_uri());
            }
            None => {
                warn!("Ignoring empty image");
                self.image = None;
            }
        }
        Ok(())
    }

    /// Ask the capture collaborator for an image. Returns whether one was attached.
    pub async fn capture_image(&mut self, source: &dyn ImageSource) -> Result<bool> {
        self.require_composing()?;
        match source.capture().await {
            Ok(Some(uri)) => {
                self.attach_image(&uri)?;
                Ok(self.image.is_some())
            }
            Ok(None) => Ok(false),
            Err(e) => {
                error!(error = %e, "Image capture failed");
                self.notice = Some(Notice::CaptureFailed(e.to_string()));
                Err(e.into())
            }
        }
    }

    pub fn clear_image(&mut self) -> Result<()> {
        self.require_composing()?;
        self.image = None;
        Ok(())
    }

    /// Submit the form: analyze, record a report, and show it.
    ///
    /// Blank symptoms are rejected without calling the model. On analysis failure
    /// the form is restored and nothing is recorded. A failed save keeps the
    /// report in memory and yields `durable: false` with [`Notice::SavedLocallyOnly`].
    #[instrument(name = "session_submit", skip(self))]
    pub async fn submit(&mut self) -> Result<Submission> {
        self.notice = None;
        self.require_composing()?;
        if self.symptoms.trim().is_empty() {
            return Err(self.reject(ValidationError::EmptySymptoms));
        }

        // a cancel fired while nothing was in flight does not apply to this call
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        let analyzing = AnalyzingGuard::enter(&mut self.view);
        let outcome = self
            .analysis
            .analyze_with_cancel(&self.symptoms, self.image.as_deref(), &self.cancel)
            .await;
        drop(analyzing);
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        let analysis = match outcome {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(reason = e.reason(), error = %e, "Analysis failed");
                self.view = View::Composing;
                self.notice = Some(Notice::AnalysisFailed { reason: e.reason() });
                return Err(e.into());
            }
        };

        let report = SymptomReport {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: self.next_timestamp(),
            symptoms: self.symptoms.clone(),
            image_url: self.image.clone(),
            analysis: Some(analysis),
        };
        let report_id = report.id.clone();

        let mut updated = Vec::with_capacity(self.reports.len() + 1);
        updated.push(report);
        updated.extend(self.reports.iter().cloned());

        let durable = match self.store.save(&updated).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Report processed but not saved");
                self.notice = Some(Notice::SavedLocallyOnly);
                false
            }
        };

        self.reports = updated;
        self.selected = Some(report_id.clone());
        self.view = View::Details(report_id.clone());
        info!(report_id = %report_id, durable, "Report recorded");

        Ok(Submission { report_id, durable })
    }

    /// Epoch-ms now, bumped past the newest report so the collection stays newest-first.
    fn next_timestamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        match self.reports.first() {
            Some(newest) if newest.timestamp >= now => newest.timestamp.saturating_add(1),
            _ => now,
        }
    }

    pub fn back_to_dashboard(&mut self) -> Result<()> {
        self.notice = None;
        self.require_login()?;
        self.view = View::Dashboard;
        Ok(())
    }

    pub fn open_history(&mut self) -> Result<()> {
        self.notice = None;
        self.require_login()?;
        self.view = View::History;
        Ok(())
    }

    /// Show a stored report.
    pub fn open_report(&mut self, id: &str) -> Result<()> {
        self.notice = None;
        self.require_login()?;
        if !self.reports.iter().any(|r| r.id == id) {
            return Err(self.reject(ValidationError::UnknownReport(id.to_string())));
        }
        self.selected = Some(id.to_string());
        self.view = View::Details(id.to_string());
        Ok(())
    }
}
