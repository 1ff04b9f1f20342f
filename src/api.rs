use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::form::SubmitError;
use crate::quiz::QuizResultRequest;
use crate::upload::AttachedFile;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateCourseRequest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub teacher_id: Uuid,
    pub thumbnail: String,
    pub category: String,
    pub duration: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateAssessmentRequest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub course_id: Uuid,
    pub questions: String,
    pub time_limit: u32,
    pub pass_score: u32,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ApiError {
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

impl From<ApiError> for SubmitError {
    fn from(error: ApiError) -> Self {
        SubmitError::with_source(error.to_string(), error)
    }
}

pub type BoxedApiFuture<'a, T> = BoxFuture<'a, Result<T, ApiError>>;

/// Course, assessment and result endpoints of the learning backend.
pub trait CoursesApi: Send + Sync + 'static {
    fn create_course(&self, request: CreateCourseRequest) -> BoxedApiFuture<'_, ()>;

    /// Stores an assessment document and returns the URL it is served from.
    fn upload_assessment_file(&self, file: AttachedFile) -> BoxedApiFuture<'_, String>;

    fn create_assessment(&self, request: CreateAssessmentRequest) -> BoxedApiFuture<'_, ()>;

    fn submit_result(&self, request: QuizResultRequest) -> BoxedApiFuture<'_, ()>;
}

#[derive(Clone, Debug, Default)]
struct Recorded {
    courses: Vec<CreateCourseRequest>,
    uploads: Vec<String>,
    assessments: Vec<CreateAssessmentRequest>,
    results: Vec<QuizResultRequest>,
    failure: Option<ApiError>,
}

/// Keeps every request in memory. Useful for previews and tests; a failure
/// can be armed to make every call return it.
#[derive(Clone, Default)]
pub struct RecordingCoursesApi {
    state: Arc<RwLock<Recorded>>,
}

impl RecordingCoursesApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: ApiError) {
        self.write().failure = Some(error);
    }

    pub fn recover(&self) {
        self.write().failure = None;
    }

    pub fn courses(&self) -> Vec<CreateCourseRequest> {
        self.read().courses.clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.read().uploads.clone()
    }

    pub fn assessments(&self) -> Vec<CreateAssessmentRequest> {
        self.read().assessments.clone()
    }

    pub fn results(&self) -> Vec<QuizResultRequest> {
        self.read().results.clone()
    }

    fn record<T>(&self, apply: impl FnOnce(&mut Recorded) -> T) -> Result<T, ApiError> {
        let mut state = self.write();
        if let Some(error) = state.failure.clone() {
            return Err(error);
        }
        Ok(apply(&mut state))
    }

    fn read(&self) -> RwLockReadGuard<'_, Recorded> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Recorded> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CoursesApi for RecordingCoursesApi {
    fn create_course(&self, request: CreateCourseRequest) -> BoxedApiFuture<'_, ()> {
        let result = self.record(|state| state.courses.push(request));
        async move { result }.boxed()
    }

    fn upload_assessment_file(&self, file: AttachedFile) -> BoxedApiFuture<'_, String> {
        let result = self.record(|state| {
            let url = format!("memory://assessments/{}/{}", state.uploads.len(), file.name);
            state.uploads.push(url.clone());
            url
        });
        async move { result }.boxed()
    }

    fn create_assessment(&self, request: CreateAssessmentRequest) -> BoxedApiFuture<'_, ()> {
        let result = self.record(|state| state.assessments.push(request));
        async move { result }.boxed()
    }

    fn submit_result(&self, request: QuizResultRequest) -> BoxedApiFuture<'_, ()> {
        let result = self.record(|state| state.results.push(request));
        async move { result }.boxed()
    }
}
