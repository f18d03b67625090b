use crate::redact::redact_secrets;
use crate::session::{ApiRequest, SessionError, SessionStatus};
use crate::state::AppState;
use crate::types::{
    ApiRequestPayload, ApiResponsePayload, IpcError, IpcErrorCode, IpcResult, LoginPayload,
};
use reqwest::Method;
use tauri::State;

type CommandResult<T> = Result<T, IpcError>;

fn ipc_error(err: &SessionError) -> IpcError {
    let code = match err {
        SessionError::Network(_) => IpcErrorCode::Network,
        SessionError::RefreshRejected | SessionError::LoggedOut => IpcErrorCode::SessionExpired,
        SessionError::Unauthorized => IpcErrorCode::Unauthorized,
        SessionError::InvalidCredentials => IpcErrorCode::InvalidCredentials,
        SessionError::Http { .. } => IpcErrorCode::Http,
        SessionError::Decode(_) => IpcErrorCode::InvalidResponse,
    };
    let details = match err {
        SessionError::Http { status, body } => Some(serde_json::json!({
            "status": status,
            "body": body,
        })),
        _ => None,
    };
    IpcError {
        code,
        message: redact_secrets(&err.to_string()).to_string(),
        details,
    }
}

fn parse_method(method: &str) -> Option<Method> {
    let upper = method.trim().to_ascii_uppercase();
    match upper.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" => Method::from_bytes(upper.as_bytes()).ok(),
        _ => None,
    }
}

#[tauri::command]
pub async fn auth_login(
    state: State<'_, AppState>,
    payload: LoginPayload,
) -> CommandResult<IpcResult<SessionStatus>> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Ok(IpcResult::err(
            IpcErrorCode::InvalidRequest,
            "Email and password are required.",
        ));
    }
    Ok(match state.session.login(email, &payload.password).await {
        Ok(status) => IpcResult::ok(status),
        Err(e) => IpcResult::from_error(ipc_error(&e)),
    })
}

#[tauri::command]
pub async fn auth_logout(
    state: State<'_, AppState>,
) -> CommandResult<IpcResult<()>> {
    state.session.logout().await;
    Ok(IpcResult::ok(()))
}

#[tauri::command]
pub async fn auth_status(
    state: State<'_, AppState>,
) -> CommandResult<IpcResult<SessionStatus>> {
    Ok(IpcResult::ok(state.session.status().await))
}

#[tauri::command]
pub async fn api_request(
    state: State<'_, AppState>,
    payload: ApiRequestPayload,
) -> CommandResult<IpcResult<ApiResponsePayload>> {
    let Some(method) = parse_method(&payload.method) else {
        return Ok(IpcResult::err(
            IpcErrorCode::InvalidRequest,
            format!("Unsupported method: {}", payload.method),
        ));
    };
    let mut request = ApiRequest::new(method, payload.path);
    request.body = payload.body;

    Ok(match state.session.send(request).await {
        Ok(response) => IpcResult::ok(ApiResponsePayload {
            status: response.status.as_u16(),
            body: response.body,
        }),
        Err(e) => IpcResult::from_error(ipc_error(&e)),
    })
}
