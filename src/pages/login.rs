use std::sync::Arc;

use crate::auth::{AuthBackend, AuthContext, User, UserRole};
use crate::form::{FormController, FormModel, FormResult, SubmitError};
use crate::session::SessionStore;
use crate::validation::{EMAIL, validate_login_form};

#[derive(Clone, Debug, Default, Eq, PartialEq, FormModel)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login form for `role`. `on_authenticated` runs after the session token has
/// been stored, typically to navigate to `role.dashboard_path()`.
pub fn login_form<B, S, F>(
    auth: AuthContext<B, S>,
    role: UserRole,
    on_authenticated: F,
) -> FormResult<FormController<LoginForm>>
where
    B: AuthBackend,
    S: SessionStore,
    F: Fn(&User) + Send + Sync + 'static,
{
    let on_authenticated = Arc::new(on_authenticated);
    FormController::builder(LoginForm::default())
        .validator(validate_login_form::<LoginForm>)
        .on_submit(move |values: LoginForm, errors| {
            let auth = auth.clone();
            let on_authenticated = on_authenticated.clone();
            async move {
                match auth.login(&values.email, &values.password, role).await {
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
