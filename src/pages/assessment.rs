use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::api::{CoursesApi, CreateAssessmentRequest};
use crate::form::{
    FieldErrors, FieldKey, FormController, FormModel, FormResult, SubmitError, SubmitOutcome,
};
use crate::upload::{AttachedFile, AttachmentSlot};
use crate::validation::{check, validate_required};

use super::attach_to;

pub const ASSESSMENT_TYPES: [&str; 5] = ["quiz", "midterm", "final", "assignment", "project"];
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

const TITLE: FieldKey = FieldKey::new("title");
const KIND: FieldKey = FieldKey::new("type");
const DUE_DATE: FieldKey = FieldKey::new("dueDate");
const FILE: FieldKey = FieldKey::new("file");

#[derive(Clone, Debug, Default, Eq, PartialEq, FormModel)]
pub struct AssessmentForm {
    pub title: String,
    #[form(rename = "type")]
    pub kind: String,
    #[form(rename = "dueDate")]
    pub due_date: String,
    pub file: String,
}

/// Fixed metadata attached to every assessment created from the dialog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssessmentDefaults {
    pub description: String,
    pub questions: String,
    pub time_limit: u32,
    pub pass_score: u32,
}

impl Default for AssessmentDefaults {
    fn default() -> Self {
        Self {
            description: "Assessment description".to_string(),
            questions: "Default questions text".to_string(),
            time_limit: 60,
            pass_score: 40,
        }
    }
}

pub fn validate_assessment_form(values: &AssessmentForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    check(
        &mut errors,
        TITLE,
        [validate_required(&values.title, "Assessment title")],
    );
    check(
        &mut errors,
        KIND,
        [
            validate_required(&values.kind, "Assessment type"),
            (!ASSESSMENT_TYPES.contains(&values.kind.as_str()))
                .then(|| "Please choose a listed assessment type".to_string()),
        ],
    );
    check(
        &mut errors,
        DUE_DATE,
        [
            validate_required(&values.due_date, "Due date"),
            NaiveDate::parse_from_str(values.due_date.trim(), DUE_DATE_FORMAT)
                .is_err()
                .then(|| "Due date must be a valid date (YYYY-MM-DD)".to_string()),
        ],
    );
    if values.file.trim().is_empty() {
        errors.push(FILE, "Please upload an assessment file");
    }
    errors
}

/// The instructor's "create assessment" dialog.
#[derive(Clone)]
pub struct AssessmentPage {
    form: FormController<AssessmentForm>,
    attachment: AttachmentSlot,
}

impl AssessmentPage {
    pub fn new<A>(api: Arc<A>, course_id: Uuid) -> FormResult<Self>
    where
        A: CoursesApi,
    {
        Self::with_defaults(api, course_id, AssessmentDefaults::default())
    }

    pub fn with_defaults<A>(
        api: Arc<A>,
        course_id: Uuid,
        defaults: AssessmentDefaults,
    ) -> FormResult<Self>
    where
        A: CoursesApi,
    {
        let attachment = AttachmentSlot::new();
        let slot = attachment.clone();
        let form = FormController::builder(AssessmentForm::default())
            .validator(validate_assessment_form)
            .on_submit(move |values: AssessmentForm, _errors| {
                let api = api.clone();
                let file = slot.file();
                let defaults = defaults.clone();
                async move {
                    let file =
                        file.ok_or_else(|| SubmitError::new("Please upload an assessment file"))?;
                    let file_url = api.upload_assessment_file(file).await?;
                    let request = CreateAssessmentRequest {
                        id: Uuid::new_v4(),
                        title: values.title,
                        description: defaults.description,
                        course_id,
                        questions: defaults.questions,
                        time_limit: defaults.time_limit,
                        pass_score: defaults.pass_score,
                        file_url,
                    };
                    let id = request.id;
                    api.create_assessment(request).await?;
                    info!(assessment = %id, course = %course_id, "assessment created");
                    Ok::<(), SubmitError>(())
                }
            })
            .build()?;
        Ok(Self { form, attachment })
    }

    pub fn form(&self) -> &FormController<AssessmentForm> {
        &self.form
    }

    pub fn attachment(&self) -> &AttachmentSlot {
        &self.attachment
    }

    pub fn attach(&self, file: AttachedFile) -> FormResult<bool> {
        attach_to(
            &self.form,
            &self.attachment,
            AssessmentForm::fields().file(),
            file,
        )
    }

    /// Drop-zone counterpart of `attach`; only the first file is used.
    pub fn drop_files(&self, files: Vec<AttachedFile>) -> FormResult<bool> {
        self.attachment.drag_leave();
        match files.into_iter().next() {
            Some(file) => self.attach(file),
            None => Ok(false),
        }
    }

    pub fn remove_file(&self) -> FormResult<()> {
        self.attachment.remove();
        self.form.set(AssessmentForm::fields().file(), String::new())
    }

    pub async fn submit(&self) -> FormResult<SubmitOutcome> {
        self.form.handle_submit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, RecordingCoursesApi};
    use crate::form::{ChangeEvent, FormError, InputKind};
    use futures::executor::block_on;

    fn filled(page: &AssessmentPage) {
        let form = page.form();
        form.handle_change(ChangeEvent::text("title", "Week 3 quiz"))
            .expect("title");
        form.handle_change(ChangeEvent::input("type", "quiz", InputKind::Select))
            .expect("type");
        form.handle_change(ChangeEvent::input("dueDate", "2026-11-02", InputKind::Date))
            .expect("due date");
    }

    fn worksheet() -> AttachedFile {
        AttachedFile::new("worksheet.pdf", "application/pdf", vec![7; 64])
    }

    #[test]
    fn empty_form_reports_renamed_keys() {
        let errors = validate_assessment_form(&AssessmentForm::default());
        assert_eq!(errors.get("title"), Some("Assessment title is required"));
        assert_eq!(errors.get("type"), Some("Assessment type is required"));
        assert_eq!(errors.get("dueDate"), Some("Due date is required"));
        assert_eq!(errors.get("file"), Some("Please upload an assessment file"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn due_date_must_be_calendar_date() {
        let values = AssessmentForm {
            title: "Final".to_string(),
            kind: "final".to_string(),
            due_date: "2026-02-30".to_string(),
            file: "final.pdf".to_string(),
        };
        let errors = validate_assessment_form(&values);
        assert_eq!(
            errors.get("dueDate"),
            Some("Due date must be a valid date (YYYY-MM-DD)")
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn submit_uploads_file_then_creates_assessment() {
        let api = Arc::new(RecordingCoursesApi::new());
        let course = Uuid::new_v4();
        let page = AssessmentPage::new(api.clone(), course).expect("build page");
        filled(&page);
        assert!(page.drop_files(vec![worksheet()]).expect("drop"));

        let outcome = block_on(page.submit()).expect("submit");
        assert_eq!(outcome, SubmitOutcome::Submitted);

        assert_eq!(api.uploads(), vec!["memory://assessments/0/worksheet.pdf"]);
        let assessments = api.assessments();
        assert_eq!(assessments.len(), 1);
        let created = &assessments[0];
        assert_eq!(created.title, "Week 3 quiz");
        assert_eq!(created.course_id, course);
        assert_eq!(created.file_url, "memory://assessments/0/worksheet.pdf");
        assert_eq!(created.time_limit, 60);
        assert_eq!(created.pass_score, 40);
        assert_eq!(created.description, "Assessment description");
    }

    #[test]
    fn oversized_file_is_rejected_and_submit_blocked() {
        let api = Arc::new(RecordingCoursesApi::new());
        let page = AssessmentPage::new(api.clone(), Uuid::nil()).expect("build page");
        filled(&page);
        let huge = AttachedFile::new(
            "huge.pdf",
            "application/pdf",
            vec![0; crate::upload::MAX_ATTACHMENT_BYTES as usize + 1],
        );
        assert!(!page.attach(huge).expect("attach"));
        assert_eq!(
            page.form().error("file").expect("file error").as_deref(),
            Some("File size cannot exceed 10MB")
        );

        let outcome = block_on(page.submit()).expect("submit");
        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(
            page.form().error("file").expect("file error").as_deref(),
            Some("Please upload an assessment file")
        );
        assert!(api.uploads().is_empty());
    }

    #[test]
    fn failed_upload_skips_assessment_creation() {
        let api = Arc::new(RecordingCoursesApi::new());
        api.fail_with(ApiError::Unreachable("connection refused".to_string()));
        let page = AssessmentPage::new(api.clone(), Uuid::nil()).expect("build page");
        filled(&page);
        page.attach(worksheet()).expect("attach");

        let error = block_on(page.submit()).expect_err("upload fails");
        match error {
            FormError::Submit(error) => {
                assert_eq!(error.message(), "backend unreachable: connection refused");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(api.assessments().is_empty());
        assert!(!page.form().is_submitting().expect("submitting flag"));
    }
}
