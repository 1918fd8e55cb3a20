//! Response helpers shared by the HTTP clients.

/// Split a response into success or `(status, body)`.
pub async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, (u16, String)> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err((status.as_u16(), body));
    }
    Ok(response)
}
