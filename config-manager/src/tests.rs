use std::time::Duration;

use crate::cache::{ConfigCache, MemoryCache};
use crate::settings::ManagerSettings;

#[test]
fn test_settings_defaults() {
    let settings = ManagerSettings::default();
    assert!(settings.cache_enabled);
    assert_eq!(settings.cache_key, "config.cache");
    assert_eq!(settings.cache_ttl, Duration::from_secs(3600));
    assert_eq!(settings.lock_timeout, Duration::from_secs(10));
    assert!(settings.load_environment);
    assert_eq!(settings.lock_key(), "config.cache_lock");
}

#[test]
fn test_settings_parse_helpers() {
    use crate::settings::{parse_bool, parse_secs};

    assert_eq!(parse_bool("true"), Some(true));
    assert_eq!(parse_bool("ON"), Some(true));
    assert_eq!(parse_bool("0"), Some(false));
    assert_eq!(parse_bool("no"), Some(false));
    // Unparseable input is ignored so the default survives.
    assert_eq!(parse_bool("maybe"), None);

    assert_eq!(parse_secs("60"), Some(Duration::from_secs(60)));
    assert_eq!(parse_secs("not-a-number"), None);
    assert_eq!(parse_secs("-5"), None);
}

#[tokio::test]
async fn test_cache_put_get_forget() {
    let cache = MemoryCache::new();
    let ttl = Duration::from_secs(60);

    assert_eq!(cache.get("k").await.unwrap(), None);
    cache.put("k", b"blob".to_vec(), ttl).await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), Some(b"blob".to_vec()));

    cache.forget("k").await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn test_cache_entries_expire() {
    let cache = MemoryCache::new();
    cache
        .put("short", b"x".to_vec(), Duration::from_millis(20))
        .await
        .unwrap();
    assert!(cache.get("short").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(cache.get("short").await.unwrap(), None);
}

#[tokio::test]
async fn test_lock_is_exclusive_until_dropped() {
    let cache = MemoryCache::new();
    let hold = Duration::from_secs(10);

    let lock = cache.try_lock("refresh", hold).await.unwrap();
    assert!(lock.is_some());

    // Contended: second acquirer is turned away, not blocked.
    assert!(cache.try_lock("refresh", hold).await.unwrap().is_none());

    drop(lock);
    assert!(cache.try_lock("refresh", hold).await.unwrap().is_some());
}

#[tokio::test]
async fn test_lock_expires_on_its_own() {
    let cache = MemoryCache::new();

    let abandoned = cache
        .try_lock("refresh", Duration::from_millis(20))
        .await
        .unwrap();
    assert!(abandoned.is_some());

    tokio::time::sleep(Duration::from_millis(40)).await;

    // The first holder crashed (never dropped); the lock lapses anyway.
    let taken_over = cache
        .try_lock("refresh", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(taken_over.is_some());

    // The stale guard's release must not free the new holder's lock.
    drop(abandoned);
    assert!(cache
        .try_lock("refresh", Duration::from_secs(10))
        .await
        .unwrap()
        .is_none());
}
