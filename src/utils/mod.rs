use anyhow::{anyhow, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};

pub fn remove_trailing_slash(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// Save a serializable object to a JSON file.
pub fn save_to_file<T: Serialize>(data: &T, path: &str) -> Result<()> {
    let file = File::create(path).map_err(|e| anyhow!("Failed to create file {}: {}", path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, data)
        .map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;
    Ok(())
}

/// Load a deserializable object from a JSON file.
pub fn load_from_file<T: DeserializeOwned>(path: &str) -> Result<T> {
    let file = File::open(path).map_err(|e| anyhow!("Failed to open file {}: {}", path, e))?;
    let reader = BufReader::new(file);
    let data = serde_json::from_reader(reader)
        .map_err(|e| anyhow!("Failed to parse file {}: {}", path, e))?;
    Ok(data)
}

/// Current wall-clock time in POSIX milliseconds, the unit order expiry uses.
pub fn now_millis() -> i128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i128)
        .unwrap_or(0)
}

pub async fn retry<T, E, F, Fut>(mut retries: u32, base_delay_ms: u64, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if retries == 0 => return Err(e),
            Err(e) => {
                // Exponential backoff: base_delay * 2^attempt, capped at 30s
                let delay = (base_delay_ms * (1u64 << attempt.min(5))).min(30_000);
                tracing::warn!(attempt = attempt + 1, error = ?e, delay_ms = delay, "request failed, retrying");
                tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                retries -= 1;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(remove_trailing_slash("http://kupo:1442/"), "http://kupo:1442");
        assert_eq!(remove_trailing_slash("http://kupo:1442"), "http://kupo:1442");
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u32, String> = retry(3, 1, move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(format!("attempt {}", n))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), &str> = retry(2, 1, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .await;
        assert_eq!(result.unwrap_err(), "down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
