//! Conversions between table rows and DynamoDB attribute maps.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use calhive_core::storage::{AttributeValue, Item, RepositoryError, Result};

pub const PK: &str = "PK";
pub const SK: &str = "SK";
pub const GSI1_PK: &str = "GSI1PK";
pub const GSI1_SK: &str = "GSI1SK";
pub const GSI1: &str = "GSI1";

/// Convert a row into a DynamoDB item.
///
/// Rows carrying a user key are projected into `GSI1` under the same sort key.
pub fn item_to_dynamo(item: Item) -> HashMap<String, DynamoValue> {
    let mut map: HashMap<String, DynamoValue> = item
        .attributes
        .into_iter()
        .map(|(name, value)| (name, value_to_dynamo(value)))
        .collect();

    if let Some(user_key) = item.user_key {
        map.insert(GSI1_PK.to_string(), DynamoValue::S(user_key));
        map.insert(GSI1_SK.to_string(), DynamoValue::S(item.sk.clone()));
    }
    map.insert(PK.to_string(), DynamoValue::S(item.pk));
    map.insert(SK.to_string(), DynamoValue::S(item.sk));

    map
}

/// Convert a DynamoDB item into a row.
pub fn dynamo_to_item(mut map: HashMap<String, DynamoValue>) -> Result<Item> {
    let pk = take_key(&mut map, PK)?;
    let sk = take_key(&mut map, SK)?;
    let user_key = map
        .remove(GSI1_PK)
        .and_then(|v| v.as_s().ok().map(|s| s.to_string()));
    map.remove(GSI1_SK);

    let mut item = Item::new(pk, sk);
    item.user_key = user_key;
    for (name, value) in map {
        let value = value_from_dynamo(&name, value)?;
        item.attributes.insert(name, value);
    }
    Ok(item)
}

/// Key map for GetItem/DeleteItem.
pub fn key(pk: &str, sk: &str) -> HashMap<String, DynamoValue> {
    HashMap::from([
        (PK.to_string(), DynamoValue::S(pk.to_string())),
        (SK.to_string(), DynamoValue::S(sk.to_string())),
    ])
}

fn value_to_dynamo(value: AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s),
        AttributeValue::N(n) => DynamoValue::N(n),
        AttributeValue::Bool(b) => DynamoValue::Bool(b),
        AttributeValue::Null => DynamoValue::Null(true),
    }
}

fn value_from_dynamo(name: &str, value: DynamoValue) -> Result<AttributeValue> {
    match value {
        DynamoValue::S(s) => Ok(AttributeValue::S(s)),
        DynamoValue::N(n) => Ok(AttributeValue::N(n)),
        DynamoValue::Bool(b) => Ok(AttributeValue::Bool(b)),
        DynamoValue::Null(_) => Ok(AttributeValue::Null),
        other => Err(RepositoryError::InvalidData(format!(
            "Unsupported attribute type for {}: {:?}",
            name, other
        ))),
    }
}

fn take_key(map: &mut HashMap<String, DynamoValue>, name: &str) -> Result<String> {
    match map.remove(name) {
        Some(DynamoValue::S(s)) => Ok(s),
        _ => Err(RepositoryError::InvalidData(format!(
            "Missing or invalid key attribute: {}",
            name
        ))),
    }
}
