use std::time::Duration;

/// Build a reqwest client with sane defaults. Wikipedia can be slow on
/// large pages, so the overall timeout is looser than the connect timeout.
pub fn make_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(3))
        .timeout(Duration::from_secs(10))
        .build()
        .expect("reqwest client")
}

/// Exponential backoff utility for async ops, retrying only errors the
/// predicate accepts; anything else surfaces immediately. `attempts` is the
/// number of retries after the first try.
pub async fn retry_async_if<T, E, Fut, F, P>(
    mut attempts: u32,
    mut op: F,
    retryable: P,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut try_num: u32 = 0;
    let mut delay_ms: u64 = 50;
    loop {
        match op(try_num).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempts == 0 || !retryable(&e) {
                    return Err(e);
                }
                attempts -= 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms * 2).min(1_000);
                try_num += 1;
            }
        }
    }
}

/// Retry every error. See [`retry_async_if`] for the bounded-backoff shape.
pub async fn retry_async<T, E, Fut, F>(attempts: u32, op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    retry_async_if(attempts, op, |_| true).await
}
