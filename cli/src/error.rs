use anyhow::Error;
use helpdesk_common::error::ClientError;

pub struct CapturedError {
    pub inner: Error,
    pub hint: Option<String>,
}

impl From<Error> for CapturedError {
    fn from(inner: Error) -> Self {
        let hint = hint_for(&inner);
        Self { inner, hint }
    }
}

fn hint_for(error: &Error) -> Option<String> {
    let client_error = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ClientError>())?;

    match client_error {
        ClientError::ApiError(401 | 403, ..) => Some(
            "The backend refused the token. Run `helpdesk login` or set HELPDESK_TOKEN.".to_owned(),
        ),
        ClientError::InvalidUrl(_) => {
            Some("Check HELPDESK_API_URL and the other HELPDESK_*_URL variables.".to_owned())
        }
        ClientError::RequestError(_) => {
            Some("Is the backend reachable? Check your connection and HELPDESK_API_URL.".to_owned())
        }
        _ => None,
    }
}
