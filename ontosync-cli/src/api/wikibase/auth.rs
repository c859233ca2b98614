//! MediaWiki bot login
//!
//! Login token, `action=login`, then a CSRF token for writes. All three
//! requests share the client's cookie jar.

use serde_json::Value;

use super::client::MediaWikiClient;
use crate::api::adapter::AdapterError;

/// Token MediaWiki hands out to anonymous sessions
const ANONYMOUS_TOKEN: &str = "+\\";

pub async fn login(client: &MediaWikiClient, username: &str, password: &str) -> Result<(), AdapterError> {
    let response = client
        .get(vec![
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
            ("type", "login".to_string()),
        ])
        .await?;
    let login_token = parse_token(&response, "logintoken")?;

    let response = client
        .post(vec![
            ("action", "login".to_string()),
            ("lgname", username.to_string()),
            ("lgpassword", password.to_string()),
            ("lgtoken", login_token),
        ])
        .await?;
    parse_login_result(&response)?;

    let response = client
        .get(vec![
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
        ])
        .await?;
    let csrf_token = parse_token(&response, "csrftoken")?;
    if csrf_token == ANONYMOUS_TOKEN {
        return Err(AdapterError::Auth(
            "login succeeded but the session is still anonymous".to_string(),
        ));
    }
    client.set_csrf_token(csrf_token).await;

    log::info!("Logged in to {} as {}", client.api_url(), username);
    Ok(())
}

pub fn parse_token(response: &Value, name: &str) -> Result<String, AdapterError> {
    response
        .pointer(&format!("/query/tokens/{}", name))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AdapterError::Auth(format!("no {} in response", name)))
}

pub fn parse_login_result(response: &Value) -> Result<(), AdapterError> {
    let login = response
        .get("login")
        .ok_or_else(|| AdapterError::Auth("malformed login response".to_string()))?;

    match login.get("result").and_then(Value::as_str) {
        Some("Success") => Ok(()),
        Some(result) => {
            let reason = login
                .get("reason")
                .and_then(|reason| reason.as_str().or_else(|| reason.get("text").and_then(Value::as_str)))
                .unwrap_or("no reason given");
            Err(AdapterError::Auth(format!("{}: {}", result, reason)))
        }
        None => Err(AdapterError::Auth("login response has no result".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_token() {
        let response = json!({"batchcomplete": true, "query": {"tokens": {"logintoken": "abc+\\"}}});
        assert_eq!(parse_token(&response, "logintoken").unwrap(), "abc+\\");
        assert!(matches!(parse_token(&response, "csrftoken"), Err(AdapterError::Auth(_))));
    }

    #[test]
    fn test_login_success() {
        let response = json!({"login": {"result": "Success", "lguserid": 1, "lgusername": "Admin"}});
        assert!(parse_login_result(&response).is_ok());
    }

    #[test]
    fn test_login_failure_reason() {
        let response = json!({
            "login": {
                "result": "Failed",
                "reason": "Incorrect username or password entered. Please try again."
            }
        });

        let err = parse_login_result(&response).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Incorrect username or password"));
    }
}
