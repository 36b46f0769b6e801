// axum handler for /
pub async fn root() -> &'static str {
    "volunteer management website is running"
}
