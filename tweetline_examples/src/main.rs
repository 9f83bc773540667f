use http::HeaderValue;
use http::header::AUTHORIZATION;
use tweetline_core::prelude::*;
use tweetline_examples::collect_followers;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tweetline=debug".into()))
        .init();

    dotenvy::dotenv().ok();
    let token = dotenvy::var("TWITTER_BEARER_TOKEN").expect("TWITTER_BEARER_TOKEN missing");
    let user_id = dotenvy::var("TWITTER_USER_ID").unwrap_or_else(|_| "2244994945".to_string());

    let config = ClientConfig::new()
        .with_debug_level(DebugLevel::V)
        .with_debug_sink(TracingDebugSink)
        .with_default_header(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    let client = ApiClient::new(config);

    let followers = collect_followers(&client, &user_id, 250).await?;
    println!("users/{user_id}/followers => {} accounts", followers.len());
    for u in followers.iter().take(5) {
        println!("  @{} ({})", u.username, u.name);
    }
    Ok(())
}
