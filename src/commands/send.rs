use crate::cli::AppConfig;
use crate::service::ProfileService;
use crate::storage::ProfileStore;
use std::sync::Arc;

/// Send one chat message through a profile. Returns whether the API answered.
pub async fn cmd_send(
    config: &AppConfig,
    store: Arc<ProfileStore>,
    name: &str,
    key_name: Option<&str>,
    model: &str,
    message: &str,
) -> anyhow::Result<bool> {
    let service = ProfileService::from_config(config, store);
    let result = service.send_message(name, key_name, model, message).await?;

    match (result.success, result.response, result.error) {
        (true, Some(response), _) => println!("{}", response),
        (_, _, Some(error)) => eprintln!("❌ {}", error),
        _ => eprintln!("❌ No response"),
    }
    Ok(result.success)
}
