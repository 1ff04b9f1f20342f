use eduform::form::{FieldLens, FieldValue, FormModel};

#[derive(Clone, eduform::form::FormModel)]
struct EnrollForm {
    email: String,
    #[form(rename = "acceptTerms")]
    accept_terms: bool,
}

fn main() {
    let fields = EnrollForm::fields();
    let lens = fields.email();
    let mut model = EnrollForm {
        email: "a@school.edu".to_string(),
        accept_terms: false,
    };
    lens.set(&mut model, "b@school.edu".to_string());
    assert_eq!(lens.key().as_str(), "email");
    assert_eq!(lens.get(&model), "b@school.edu");

    assert_eq!(fields.accept_terms().key().as_str(), "acceptTerms");
    model
        .apply("acceptTerms", FieldValue::Flag(true))
        .expect("renamed flag field applies");
    assert!(model.accept_terms);
    assert!(model.apply("accept_terms", FieldValue::Flag(false)).is_err());
    assert_eq!(model.field_keys().len(), 2);
}
