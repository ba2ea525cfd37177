use crate::util::api_request;

pub async fn run(api_url: &str) -> i32 {
    api_request(api_url, reqwest::Method::GET, "/health", None, None, false).await
}

/// Builder catalog from GET /chat/v3/functions.
pub async fn functions(api_url: &str, raw: bool) -> i32 {
    api_request(
        api_url,
        reqwest::Method::GET,
        "/chat/v3/functions",
        None,
        None,
        raw,
    )
    .await
}
