use std::sync::Arc;
use std::time::Duration;

use futures::executor::block_on;
use uuid::Uuid;

use crate::prelude::*;

#[test]
fn prelude_covers_a_full_login_flow() {
    let auth = AuthContext::new(
        SimulatedAuthBackend::new(AuthOptions {
            latency: Duration::ZERO,
        }),
        InMemorySessionStore::new(),
    );
    let form = login_form(auth.clone(), UserRole::Student, |_: &User| {}).expect("login form");

    form.handle_change(ChangeEvent::input("email", "lin@school.edu", InputKind::Email))
        .expect("email");
    form.handle_blur("email").expect("blur");
    form.handle_change(ChangeEvent::input("password", "pw", InputKind::Password))
        .expect("password");

    assert_eq!(
        block_on(form.handle_submit()).expect("submit"),
        SubmitOutcome::Submitted
    );
    assert_eq!(
        auth.current_user().map(|user| user.role),
        Some(UserRole::Student)
    );
}

#[test]
fn empty_login_submit_reports_both_required_fields() {
    let auth = AuthContext::new(SimulatedAuthBackend::default(), InMemorySessionStore::new());
    let form = login_form(auth, UserRole::Student, |_: &User| {}).expect("login form");

    assert_eq!(
        block_on(form.handle_submit()).expect("submit"),
        SubmitOutcome::Invalid
    );
    let snapshot = form.snapshot().expect("snapshot");
    assert_eq!(
        snapshot.errors,
        FieldErrors::from([
            (FieldKey::new("email"), "Email is required"),
            (FieldKey::new("password"), "Password is required"),
        ])
    );
    assert!(!snapshot.submitting);
}

#[test]
fn instructor_pages_share_one_backend() {
    let api = Arc::new(RecordingCoursesApi::new());
    let course_page = CoursePage::new(api.clone(), Uuid::new_v4()).expect("course page");
    let assessment_page =
        AssessmentPage::new(api.clone(), Uuid::new_v4()).expect("assessment page");

    assert_ne!(
        course_page.form().form_id().expect("id"),
        assessment_page.form().form_id().expect("id")
    );
    assert_eq!(
        block_on(course_page.submit()).expect("submit"),
        SubmitOutcome::Invalid
    );
    assert!(api.courses().is_empty());
}
