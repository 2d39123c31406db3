use crate::models::{LoginForm, SignupForm};
use crate::AppState;
use client_core::AppError;

pub async fn login(state: &AppState, email: String, password: String) -> Result<String, AppError> {
    match state.login(LoginForm::new(email, password)).await {
        Ok(session) => Ok(format!(
            "Signed in as {}. Upload documents with `upload <paths..>`.",
            session.email
        )),
        // The notification already carried the backend's message
        Err(e) if !e.is_validation() => Ok("Back on the landing screen.".to_string()),
        Err(e) => Err(e),
    }
}

pub async fn signup(
    state: &AppState,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
) -> Result<String, AppError> {
    let form = SignupForm::new(first_name, last_name, email, password);
    match state.signup(form).await {
        Ok(session) => Ok(format!(
            "Account created for {}. Sign in with `login {}`.",
            session.email, session.email
        )),
        Err(e) if !e.is_validation() => Ok("Back on the landing screen.".to_string()),
        Err(e) => Err(e),
    }
}

pub async fn logout(state: &AppState) -> Result<String, AppError> {
    state.logout().await?;
    Ok("Signed out.".to_string())
}
