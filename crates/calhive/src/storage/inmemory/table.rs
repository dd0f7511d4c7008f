//! In-memory table implementation.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use calhive_core::storage::{Item, RepositoryError, Result, Table, WriteCondition};

type Key = (String, String);

/// Injected failures for exercising partial-write windows.
#[derive(Debug, Default)]
struct Faults {
    /// Writes whose sort key starts with any of these prefixes fail.
    write_prefixes: Vec<String>,
    /// Writes fail once this many have succeeded.
    writes_before_failure: Option<usize>,
    writes: usize,
}

/// In-memory table for local runs and tests.
///
/// Rows live in a `BTreeMap` keyed by `(pk, sk)` behind an `Arc<RwLock<_>>`.
/// Data is not persisted and is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTable {
    items: Arc<RwLock<BTreeMap<Key, Item>>>,
    faults: Arc<RwLock<Faults>>,
    latency: Option<Duration>,
}

impl InMemoryTable {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn check_write_fault(&self, sk: &str) -> Result<()> {
        let mut faults = self.faults.write().await;

        if faults.write_prefixes.iter().any(|p| sk.starts_with(p.as_str())) {
            return Err(RepositoryError::ConnectionFailed(format!(
                "injected write failure for {sk}"
            )));
        }

        if let Some(limit) = faults.writes_before_failure {
            if faults.writes >= limit {
                return Err(RepositoryError::ConnectionFailed(format!(
                    "injected write failure after {limit} writes"
                )));
            }
        }

        faults.writes += 1;
        Ok(())
    }
}

/// Test controls.
#[cfg(test)]
impl InMemoryTable {
    /// Delays every operation by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every write (put or delete) whose sort key starts with `prefix`
    /// fail with `ConnectionFailed`.
    pub async fn fail_writes_with_prefix(&self, prefix: impl Into<String>) {
        self.faults.write().await.write_prefixes.push(prefix.into());
    }

    /// Lets `count` more writes succeed, then fails every following write.
    pub async fn fail_writes_after(&self, count: usize) {
        let mut faults = self.faults.write().await;
        faults.writes = 0;
        faults.writes_before_failure = Some(count);
    }

    /// Removes every injected failure.
    pub async fn clear_faults(&self) {
        *self.faults.write().await = Faults::default();
    }

    /// Number of rows currently stored.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns true if a row exists at `(pk, sk)`.
    pub async fn contains(&self, pk: &str, sk: &str) -> bool {
        self.items
            .read()
            .await
            .contains_key(&(pk.to_string(), sk.to_string()))
    }
}

fn check_condition(
    existing: Option<&Item>,
    condition: WriteCondition,
    pk: &str,
    sk: &str,
) -> Result<()> {
    match (condition, existing) {
        (WriteCondition::MustExist, None) => Err(RepositoryError::item_not_found(pk, sk)),
        (WriteCondition::MustNotExist, Some(_)) => Err(RepositoryError::item_exists(pk, sk)),
        _ => Ok(()),
    }
}

#[async_trait]
impl Table for InMemoryTable {
    async fn put_item(&self, item: Item, condition: WriteCondition) -> Result<()> {
        self.simulate_latency().await;
        self.check_write_fault(&item.sk).await?;

        let mut items = self.items.write().await;
        let key = (item.pk.clone(), item.sk.clone());
        check_condition(items.get(&key), condition, &item.pk, &item.sk)?;
        items.insert(key, item);
        Ok(())
    }

    async fn get_item(&self, pk: &str, sk: &str) -> Result<Option<Item>> {
        self.simulate_latency().await;
        let items = self.items.read().await;
        Ok(items.get(&(pk.to_string(), sk.to_string())).cloned())
    }

    async fn query_by_prefix(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>> {
        self.simulate_latency().await;
        let items = self.items.read().await;
        Ok(items
            .range((pk.to_string(), sk_prefix.to_string())..)
            .take_while(|((item_pk, item_sk), _)| item_pk == pk && item_sk.starts_with(sk_prefix))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn delete_item(&self, pk: &str, sk: &str, condition: WriteCondition) -> Result<()> {
        self.simulate_latency().await;
        self.check_write_fault(sk).await?;

        let mut items = self.items.write().await;
        let key = (pk.to_string(), sk.to_string());
        check_condition(items.get(&key), condition, pk, sk)?;
        items.remove(&key);
        Ok(())
    }

    async fn scan_by_sort_key(&self, sk: &str) -> Result<Vec<Item>> {
        self.simulate_latency().await;
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| item.sk == sk)
            .cloned()
            .collect())
    }

    async fn query_user_index(&self, user_key: &str, sk_prefix: &str) -> Result<Vec<Item>> {
        self.simulate_latency().await;
        let items = self.items.read().await;
        Ok(items
            .values()
            .filter(|item| item.user_key.as_deref() == Some(user_key))
            .filter(|item| item.sk.starts_with(sk_prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pk: &str, sk: &str) -> Item {
        Item::new(pk, sk).with_s("name", format!("{pk}/{sk}"))
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let table = InMemoryTable::new();
        table
            .put_item(row("cal-1", "CALENDAR"), WriteCondition::None)
            .await
            .unwrap();

        let item = table.get_item("cal-1", "CALENDAR").await.unwrap();
        assert_eq!(item, Some(row("cal-1", "CALENDAR")));
        assert_eq!(table.get_item("cal-1", "EVENT#x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_conditions() {
        let table = InMemoryTable::new();

        let missing = table
            .put_item(row("cal-1", "EVENT#e1"), WriteCondition::MustExist)
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));

        table
            .put_item(row("cal-1", "EVENT#e1"), WriteCondition::MustNotExist)
            .await
            .unwrap();
        let duplicate = table
            .put_item(row("cal-1", "EVENT#e1"), WriteCondition::MustNotExist)
            .await;
        assert!(matches!(duplicate, Err(RepositoryError::AlreadyExists { .. })));

        let delete_missing = table
            .delete_item("cal-1", "EVENT#e2", WriteCondition::MustExist)
            .await;
        assert!(matches!(delete_missing, Err(RepositoryError::NotFound { .. })));

        table
            .delete_item("cal-1", "EVENT#e2", WriteCondition::None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_by_prefix_stays_in_partition() {
        let table = InMemoryTable::new();
        for (pk, sk) in [
            ("cal-1", "CALENDAR"),
            ("cal-1", "EVENT#a"),
            ("cal-1", "EVENT#b"),
            ("cal-1", "MEMBER#u1"),
            ("cal-2", "EVENT#c"),
        ] {
            table.put_item(row(pk, sk), WriteCondition::None).await.unwrap();
        }

        let events = table.query_by_prefix("cal-1", "EVENT#").await.unwrap();
        let sort_keys: Vec<_> = events.iter().map(|i| i.sk.as_str()).collect();
        assert_eq!(sort_keys, vec!["EVENT#a", "EVENT#b"]);

        let everything = table.query_by_prefix("cal-1", "").await.unwrap();
        assert_eq!(everything.len(), 4);

        assert!(table.query_by_prefix("cal-3", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_and_user_index() {
        let table = InMemoryTable::new();
        table
            .put_item(row("cal-1", "CALENDAR"), WriteCondition::None)
            .await
            .unwrap();
        table
            .put_item(row("cal-2", "CALENDAR"), WriteCondition::None)
            .await
            .unwrap();
        table
            .put_item(
                row("cal-1", "MEMBER#u1").with_user_key("USER#u1"),
                WriteCondition::None,
            )
            .await
            .unwrap();
        table
            .put_item(
                row("cal-1", "CAL#cal-1#e1").with_user_key("USER#u1"),
                WriteCondition::None,
            )
            .await
            .unwrap();

        assert_eq!(table.scan_by_sort_key("CALENDAR").await.unwrap().len(), 2);

        let memberships = table.query_user_index("USER#u1", "MEMBER#").await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].pk, "cal-1");

        assert!(table
            .query_user_index("USER#u2", "")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_injected_prefix_failure() {
        let table = InMemoryTable::new();
        table.fail_writes_with_prefix("CAL#").await;

        table
            .put_item(row("cal-1", "EVENT#e1"), WriteCondition::None)
            .await
            .unwrap();
        let failed = table
            .put_item(row("cal-1", "CAL#cal-1#e1"), WriteCondition::None)
            .await;
        assert!(matches!(failed, Err(RepositoryError::ConnectionFailed(_))));
        assert!(!table.contains("cal-1", "CAL#cal-1#e1").await);

        table.clear_faults().await;
        table
            .put_item(row("cal-1", "CAL#cal-1#e1"), WriteCondition::None)
            .await
            .unwrap();
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn test_injected_failure_after_writes() {
        let table = InMemoryTable::new();
        table.fail_writes_after(1).await;

        table
            .put_item(row("cal-1", "CALENDAR"), WriteCondition::None)
            .await
            .unwrap();
        let failed = table
            .put_item(row("cal-1", "MEMBER#u1"), WriteCondition::None)
            .await;
        assert!(matches!(failed, Err(RepositoryError::ConnectionFailed(_))));

        // Reads are unaffected.
        assert!(table.get_item("cal-1", "CALENDAR").await.unwrap().is_some());
    }
}
