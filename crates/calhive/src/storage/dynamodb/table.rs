//! DynamoDB table implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use aws_sdk_dynamodb::Client;

use calhive_core::storage::{Item, Result, Table, WriteCondition};

use super::conversions::{dynamo_to_item, item_to_dynamo, key, GSI1, GSI1_PK, GSI1_SK, PK, SK};
use super::error::{
    map_delete_item_error, map_get_item_error, map_put_item_error, map_query_error,
    map_scan_error,
};

type Page = Option<HashMap<String, DynamoValue>>;

/// Condition expression for a write precondition.
fn condition_expression(condition: WriteCondition) -> Option<&'static str> {
    match condition {
        WriteCondition::None => None,
        WriteCondition::MustExist => Some("attribute_exists(PK)"),
        WriteCondition::MustNotExist => Some("attribute_not_exists(PK)"),
    }
}

/// DynamoDB-backed [`Table`].
pub struct DynamoDbTable {
    client: Client,
    table_name: String,
}

impl DynamoDbTable {
    /// Creates a new table adapter with the given client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a table adapter using the AWS SDK default credential chain.
    pub async fn from_env(table_name: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), table_name)
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Runs a key-condition query, following pagination to the end.
    ///
    /// An empty prefix selects the whole partition; key conditions may not
    /// carry empty strings.
    async fn query_all(
        &self,
        index_name: Option<&str>,
        (pk_attr, sk_attr): (&str, &str),
        pk: &str,
        sk_prefix: &str,
    ) -> Result<Vec<Item>> {
        let mut values = HashMap::from([(":pk".to_string(), DynamoValue::S(pk.to_string()))]);
        let key_condition = if sk_prefix.is_empty() {
            format!("{pk_attr} = :pk")
        } else {
            values.insert(":prefix".to_string(), DynamoValue::S(sk_prefix.to_string()));
            format!("{pk_attr} = :pk AND begins_with({sk_attr}, :prefix)")
        };

        let mut items = Vec::new();
        let mut start_key: Page = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .set_index_name(index_name.map(str::to_string))
                .key_condition_expression(&key_condition)
                .set_expression_attribute_values(Some(values.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(map_query_error)?;

            for item in output.items.unwrap_or_default() {
                items.push(dynamo_to_item(item)?);
            }

            match output.last_evaluated_key {
                Some(next) if !next.is_empty() => start_key = Some(next),
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl Table for DynamoDbTable {
    async fn put_item(&self, item: Item, condition: WriteCondition) -> Result<()> {
        let (pk, sk) = (item.pk.clone(), item.sk.clone());

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_dynamo(item)))
            .set_condition_expression(condition_expression(condition).map(str::to_string))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, condition, &pk, &sk))?;

        Ok(())
    }

    async fn get_item(&self, pk: &str, sk: &str) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key(pk, sk)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        output.item.map(dynamo_to_item).transpose()
    }

    async fn query_by_prefix(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>> {
        self.query_all(None, (PK, SK), pk, sk_prefix).await
    }

    async fn delete_item(&self, pk: &str, sk: &str, condition: WriteCondition) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key(pk, sk)))
            .set_condition_expression(condition_expression(condition).map(str::to_string))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, condition, pk, sk))?;

        Ok(())
    }

    async fn scan_by_sort_key(&self, sk: &str) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key: Page = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("SK = :sk")
                .expression_attribute_values(":sk", DynamoValue::S(sk.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(map_scan_error)?;

            for item in output.items.unwrap_or_default() {
                items.push(dynamo_to_item(item)?);
            }

            match output.last_evaluated_key {
                Some(next) if !next.is_empty() => start_key = Some(next),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn query_user_index(&self, user_key: &str, sk_prefix: &str) -> Result<Vec<Item>> {
        self.query_all(Some(GSI1), (GSI1_PK, GSI1_SK), user_key, sk_prefix)
            .await
    }
}
