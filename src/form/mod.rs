mod controller;
mod errors;
mod model;


pub use controller::{
    BlurValidation, ChangeEvent, ErrorsSetter, FieldStatus, FormBuilder, FormController,
    FormError, FormId, FormOptions, FormResult, FormSnapshot, ReentrantSubmit, SubmitError,
    SubmitOutcome,
};
pub use eduform_form_derive::FormModel;
pub use errors::FieldErrors;
pub use model::{
    ApplyError, FieldKey, FieldKind, FieldLens, FieldType, FieldValue, FormModel, FormValues,
    InputKind,
};
