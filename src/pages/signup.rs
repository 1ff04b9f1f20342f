use std::sync::Arc;

use crate::auth::{AuthBackend, AuthContext, User, UserRole};
use crate::form::{FormController, FormModel, FormResult, SubmitError};
use crate::session::SessionStore;
use crate::validation::{EMAIL, validate_signup_form};

#[derive(Clone, Debug, Default, Eq, PartialEq, FormModel)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[form(rename = "confirmPassword")]
    pub confirm_password: String,
}

pub fn signup_form<B, S, F>(
    auth: AuthContext<B, S>,
    role: UserRole,
    on_authenticated: F,
) -> FormResult<FormController<SignupForm>>
where
    B: AuthBackend,
    S: SessionStore,
    F: Fn(&User) + Send + Sync + 'static,
{
    let on_authenticated = Arc::new(on_authenticated);
    FormController::builder(SignupForm::default())
        .validator(validate_signup_form::<SignupForm>)
        .on_submit(move |values: SignupForm, errors| {
            let auth = auth.clone();
            let on_authenticated = on_authenticated.clone();
            async move {
                match auth.signup(&values.name, &values.email, &values.password, role).await {
                    Ok(user) => {
                        on_authenticated(&user);
                        Ok(())
                    }
                    Err(error) => {
                        if let Err(write) = errors.set_field(EMAIL.as_str(), error.to_string()) {
                            return Err(SubmitError::with_source(write.to_string(), write));
                        }
                        Err(SubmitError::from(error))
                    }
                }
            }
        })
        .build()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::executor::block_on;

    use super::*;
    use crate::auth::{AuthOptions, SimulatedAuthBackend};
    use crate::form::{ChangeEvent, SubmitOutcome};
    use crate::session::InMemorySessionStore;

    fn auth() -> AuthContext<SimulatedAuthBackend, InMemorySessionStore> {
        AuthContext::new(
            SimulatedAuthBackend::new(AuthOptions {
                latency: Duration::ZERO,
            }),
            InMemorySessionStore::new(),
        )
    }

    #[test]
    fn confirm_password_uses_renamed_key() {
        let form = signup_form(auth(), UserRole::Student, |_: &User| {}).expect("build form");
        form.handle_change(ChangeEvent::text("confirmPassword", "abc"))
            .expect("renamed key resolves");
        assert!(form.handle_change(ChangeEvent::text("confirm_password", "abc")).is_err());
        assert_eq!(form.values().expect("values").confirm_password, "abc");
    }

    #[test]
    fn mismatched_passwords_block_submit() {
        let auth = auth();
        let form =
            signup_form(auth.clone(), UserRole::Student, |_: &User| {}).expect("build form");
        for (name, value) in [
            ("name", "Ada"),
            ("email", "ada@school.edu"),
            ("password", "analytic1"),
            ("confirmPassword", "analytic2"),
        ] {
            form.handle_change(ChangeEvent::text(name, value))
                .expect("change");
        }

        let outcome = block_on(form.handle_submit()).expect("submit");
        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(
            form.error("confirmPassword").expect("error").as_deref(),
            Some("Passwords do not match")
        );
        assert_eq!(auth.current_user(), None);

        form.handle_change(ChangeEvent::text("confirmPassword", "analytic1"))
            .expect("fix confirmation");
        let outcome = block_on(form.handle_submit()).expect("submit");
        assert_eq!(outcome, SubmitOutcome::Submitted);
        assert_eq!(
            auth.current_user().map(|user| user.name),
            Some("Ada".to_string())
        );
    }
}
