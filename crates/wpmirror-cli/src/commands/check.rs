use crate::commands::common::{build_store, load_config};
use crate::error::CliError;

pub async fn run_check() -> Result<(), CliError> {
    let config = load_config()?;
    let store = build_store(&config);

    store.bucket_is_reachable().await?;
    println!(
        "Bucket '{}' is reachable at {}",
        store.config().bucket,
        store.config().endpoint_url()
    );
    Ok(())
}
