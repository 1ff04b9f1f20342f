pub use crate::api::{
    CoursesApi, CreateAssessmentRequest, CreateCourseRequest, RecordingCoursesApi,
};
pub use crate::auth::{
    AuthBackend, AuthContext, AuthError, AuthOptions, SimulatedAuthBackend, User, UserRole,
};
pub use crate::form::{
    BlurValidation, ChangeEvent, ErrorsSetter, FieldErrors, FieldKey, FieldLens, FieldStatus,
    FieldValue, FormController, FormError, FormModel, FormOptions, FormResult, FormSnapshot,
    FormValues, InputKind, ReentrantSubmit, SubmitError, SubmitOutcome,
};
pub use crate::pages::{
    AssessmentForm, AssessmentPage, CourseForm, CoursePage, LoginForm, SignupForm, login_form,
    signup_form,
};
pub use crate::quiz::{Quiz, QuizAttempt, QuizTimer};
pub use crate::session::{InMemorySessionStore, SessionStore};
pub use crate::upload::{AttachedFile, AttachmentSlot, UploadError};
