//! Table provisioning for local development and contract tests.

use std::time::Duration;

use aws_sdk_dynamodb::client::Waiters;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    Projection, ProjectionType, ScalarAttributeType,
};
use tracing::info;

use super::{sdk_error, DynamoItemStore};
use crate::storage::schema::{SecondaryIndex, ATTR_PK, ATTR_SK};
use crate::storage::{Result, StoreError};

/// Upper bound on waiting for a new table to become ACTIVE.
const TABLE_READY_TIMEOUT: Duration = Duration::from_secs(120);

fn string_attribute(name: &str) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|e| StoreError::backend(format!("invalid attribute definition: {e}")))
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| StoreError::backend(format!("invalid key schema: {e}")))
}

/// Create the single table with its four secondary indexes.
///
/// `index_name` maps each index to its configured name. An existing table
/// is left untouched. Returns once the table is ACTIVE and accepts writes.
pub async fn create_table(
    store: &DynamoItemStore,
    index_name: impl Fn(SecondaryIndex) -> String,
) -> Result<()> {
    let mut attributes = vec![string_attribute(ATTR_PK)?, string_attribute(ATTR_SK)?];
    let mut indexes = Vec::with_capacity(SecondaryIndex::ALL.len());

    for index in SecondaryIndex::ALL {
        attributes.push(string_attribute(index.partition_attr())?);
        attributes.push(string_attribute(index.sort_attr())?);

        let gsi = GlobalSecondaryIndex::builder()
            .index_name(index_name(index))
            .key_schema(key_element(index.partition_attr(), KeyType::Hash)?)
            .key_schema(key_element(index.sort_attr(), KeyType::Range)?)
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::All)
                    .build(),
            )
            .build()
            .map_err(|e| StoreError::backend(format!("invalid index definition: {e}")))?;
        indexes.push(gsi);
    }

    let result = store
        .client
        .create_table()
        .table_name(&store.table_name)
        .set_attribute_definitions(Some(attributes))
        .key_schema(key_element(ATTR_PK, KeyType::Hash)?)
        .key_schema(key_element(ATTR_SK, KeyType::Range)?)
        .set_global_secondary_indexes(Some(indexes))
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    match result {
        Ok(_) => info!(table = %store.table_name, "Created DynamoDB table"),
        Err(e)
            if matches!(
                e.as_service_error(),
                Some(CreateTableError::ResourceInUseException(_))
            ) =>
        {
            info!(table = %store.table_name, "DynamoDB table already exists")
        }
        Err(e) => return Err(sdk_error("CreateTable", e)),
    }

    store
        .client
        .wait_until_table_exists()
        .table_name(&store.table_name)
        .wait(TABLE_READY_TIMEOUT)
        .await
        .map_err(|e| {
            StoreError::backend(format!(
                "table {} did not become active: {e}",
                store.table_name
            ))
        })?;

    info!(table = %store.table_name, "DynamoDB table is active");
    Ok(())
}
