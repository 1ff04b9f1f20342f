//! Form assemblies for the application's pages. Each one wires a model, its
//! validator and a submit callback into a [`FormController`].

mod assessment;
mod course;
mod login;
mod signup;

pub use assessment::{
    ASSESSMENT_TYPES, AssessmentDefaults, AssessmentForm, AssessmentPage, DUE_DATE_FORMAT,
    validate_assessment_form,
};
pub use course::{
    COURSE_CATEGORIES, COURSE_LEVELS, CourseForm, CoursePage, DEFAULT_THUMBNAIL,
    MIN_DESCRIPTION_LEN, validate_course_form,
};
pub use login::{LoginForm, login_form};
pub use signup::{SignupForm, signup_form};

use crate::form::{FieldLens, FormController, FormModel, FormResult};
use crate::upload::{AttachedFile, AttachmentSlot};

/// Offers `file` to `slot`. An accepted file's name is written to the form
/// through `lens`; a rejected one becomes that field's error.
fn attach_to<T, L>(
    form: &FormController<T>,
    slot: &AttachmentSlot,
    lens: L,
    file: AttachedFile,
) -> FormResult<bool>
where
    T: FormModel,
    L: FieldLens<T, Value = String>,
{
    let name = file.name.clone();
    match slot.attach(file) {
        Ok(()) => {
            form.set(lens, name)?;
            Ok(true)
        }
        Err(error) => {
            form.errors_setter()
                .set_field(lens.key().as_str(), error.to_string())?;
            Ok(false)
        }
    }
}
