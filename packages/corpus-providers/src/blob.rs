use color_eyre::Result;

fn bucket(cfg: &corpus_config::BlobStoreConfig, is_temp: bool) -> &str {
	if is_temp { &cfg.temp_bucket } else { &cfg.permanent_bucket }
}

fn object_url(cfg: &corpus_config::BlobStoreConfig, storage_path: &str, is_temp: bool) -> String {
	format!("{}/object/{}/{}", cfg.api_base, bucket(cfg, is_temp), storage_path)
}

pub async fn download(
	cfg: &corpus_config::BlobStoreConfig,
	storage_path: &str,
	is_temp: bool,
) -> Result<Vec<u8>> {
	let client = crate::client(cfg.timeout_ms, &cfg.api_key, &cfg.default_headers)?;
	let res = client.get(object_url(cfg, storage_path, is_temp)).send().await?;
	let bytes = res.error_for_status()?.bytes().await?;

	Ok(bytes.to_vec())
}

pub async fn remove(
	cfg: &corpus_config::BlobStoreConfig,
	storage_path: &str,
	is_temp: bool,
) -> Result<()> {
	let client = crate::client(cfg.timeout_ms, &cfg.api_key, &cfg.default_headers)?;

	client.delete(object_url(cfg, storage_path, is_temp)).send().await?.error_for_status()?;

	Ok(())
}
