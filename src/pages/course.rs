use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::api::{CoursesApi, CreateCourseRequest};
use crate::form::{
    FieldErrors, FieldKey, FormController, FormModel, FormResult, SubmitError, SubmitOutcome,
};
use crate::upload::{AttachedFile, AttachmentSlot};
use crate::validation::{check, text_length, validate_required};

use super::attach_to;

pub const COURSE_CATEGORIES: [&str; 5] =
    ["programming", "design", "business", "marketing", "science"];
pub const COURSE_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];
pub const MIN_DESCRIPTION_LEN: usize = 20;
pub const DEFAULT_THUMBNAIL: &str = "default-thumbnail.png";

const TITLE: FieldKey = FieldKey::new("title");
const DESCRIPTION: FieldKey = FieldKey::new("description");
const CATEGORY: FieldKey = FieldKey::new("category");
const DURATION: FieldKey = FieldKey::new("duration");
const LEVEL: FieldKey = FieldKey::new("level");
const FILE: FieldKey = FieldKey::new("file");

/// `file` holds the name of the accepted course material, empty when none.
#[derive(Clone, Debug, Eq, PartialEq, FormModel)]
pub struct CourseForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub duration: String,
    pub level: String,
    pub file: String,
}

impl Default for CourseForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: String::new(),
            duration: String::new(),
            level: COURSE_LEVELS[0].to_string(),
            file: String::new(),
        }
    }
}

fn parse_duration(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|hours| *hours > 0)
}

pub fn validate_course_form(values: &CourseForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    check(
        &mut errors,
        TITLE,
        [validate_required(&values.title, "Course title")],
    );
    check(
        &mut errors,
        DESCRIPTION,
        [
            validate_required(&values.description, "Course description"),
            (text_length(&values.description) < MIN_DESCRIPTION_LEN).then(|| {
                format!("Description must be at least {MIN_DESCRIPTION_LEN} characters")
            }),
        ],
    );
    check(
        &mut errors,
        CATEGORY,
        [
            validate_required(&values.category, "Category"),
            (!COURSE_CATEGORIES.contains(&values.category.as_str()))
                .then(|| "Please choose a listed category".to_string()),
        ],
    );
    check(
        &mut errors,
        DURATION,
        [
            validate_required(&values.duration, "Duration"),
            parse_duration(&values.duration)
                .is_none()
                .then(|| "Duration must be a whole number of hours".to_string()),
        ],
    );
    check(
        &mut errors,
        LEVEL,
        [(!COURSE_LEVELS.contains(&values.level.as_str()))
            .then(|| "Please choose a course level".to_string())],
    );
    check(
        &mut errors,
        FILE,
        [validate_required(&values.file, "Course material file")],
    );
    errors
}

/// The instructor's "add course" dialog: the form plus its material upload.
#[derive(Clone)]
pub struct CoursePage {
    form: FormController<CourseForm>,
    attachment: AttachmentSlot,
}

impl CoursePage {
    pub fn new<A>(api: Arc<A>, teacher_id: Uuid) -> FormResult<Self>
    where
        A: CoursesApi,
    {
        let attachment = AttachmentSlot::new();
        let slot = attachment.clone();
        let form = FormController::builder(CourseForm::default())
            .validator(validate_course_form)
            .on_submit(move |values: CourseForm, _errors| {
                let api = api.clone();
                let thumbnail = slot
                    .file_name()
                    .unwrap_or_else(|| DEFAULT_THUMBNAIL.to_string());
                async move {
                    let duration = parse_duration(&values.duration)
                        .ok_or_else(|| SubmitError::new("Duration must be a whole number"))?;
                    let request = CreateCourseRequest {
                        id: Uuid::new_v4(),
                        title: values.title,
                        description: values.description,
                        teacher_id,
                        thumbnail,
                        category: values.category,
                        duration,
                    };
                    let id = request.id;
                    api.create_course(request).await?;
                    info!(course = %id, "course created");
                    Ok::<(), SubmitError>(())
                }
            })
            .build()?;
        Ok(Self { form, attachment })
    }

    pub fn form(&self) -> &FormController<CourseForm> {
        &self.form
    }

    pub fn attachment(&self) -> &AttachmentSlot {
        &self.attachment
    }

    /// Offers a course material file. Returns `false` when the file is
    /// rejected; the reason is then shown as the `file` field error.
    pub fn attach(&self, file: AttachedFile) -> FormResult<bool> {
        attach_to(&self.form, &self.attachment, CourseForm::fields().file(), file)
    }

    pub fn remove_file(&self) -> FormResult<()> {
        self.attachment.remove();
        self.form.set(CourseForm::fields().file(), String::new())
    }

    pub async fn submit(&self) -> FormResult<SubmitOutcome> {
        self.form.handle_submit().await
    }
}
