//! DynamoDB ItemStore implementation.
//!
//! One table holds every entity (see [`crate::storage::schema`]).
//! Conditional failures, transaction cancellation reasons and
//! `ValidationException`s are mapped onto [`StoreError`] variants; every
//! other SDK failure becomes `StoreError::Backend` with the full error
//! context.

mod convert;
mod table;

pub use table::create_table;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{
    AttributeValue as SdkValue, ConditionCheck, Put, ReturnValue, TransactWriteItem,
};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use self::convert::{item_from_sdk, item_to_sdk, reason_from_sdk, to_sdk, Expression};
use super::item::{self, Item};
use super::{
    ItemStore, PrimaryKey, PutRequest, QueryOutput, QueryRequest, Result, StoreError, TransactOp,
    UpdateRequest,
};
use crate::config::DynamoConfig;

/// DynamoDB implementation of ItemStore.
#[derive(Clone)]
pub struct DynamoItemStore {
    client: Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoItemStore")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl DynamoItemStore {
    /// Create a new DynamoDB item store from the ambient AWS configuration.
    ///
    /// `region`, `endpoint` and `timeout_ms` from the config override the
    /// SDK defaults when set.
    pub async fn connect(config: &DynamoConfig) -> Result<Self> {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);

        if let Some(region) = &config.region {
            builder = builder.region(aws_sdk_dynamodb::config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(timeout_ms) = config.timeout_ms {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        let client = Client::from_conf(builder.build());
        info!(table = %config.table_name, "Connected to DynamoDB");

        Ok(Self {
            client,
            table_name: config.table_name.clone(),
        })
    }

    /// Create from a pre-built client (for testing).
    pub fn from_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn sdk_key(key: &PrimaryKey) -> HashMap<String, SdkValue> {
        item_to_sdk(&item::key_item(key))
    }

    fn build_op(&self, op: &TransactOp) -> Result<TransactWriteItem> {
        let mut expr = Expression::new();
        match op {
            TransactOp::Put { item, condition } => {
                let condition = condition.as_ref().map(|c| expr.condition(c));
                let put = Put::builder()
                    .table_name(&self.table_name)
                    .set_item(Some(item_to_sdk(item)))
                    .set_condition_expression(condition)
                    .set_expression_attribute_names(expr.names())
                    .set_expression_attribute_values(expr.values())
                    .build()
                    .map_err(|e| StoreError::backend(format!("invalid Put: {e}")))?;
                Ok(TransactWriteItem::builder().put(put).build())
            }
            TransactOp::ConditionCheck { key, condition } => {
                let condition = expr.condition(condition);
                let check = ConditionCheck::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(Self::sdk_key(key)))
                    .condition_expression(condition)
                    .set_expression_attribute_names(expr.names())
                    .set_expression_attribute_values(expr.values())
                    .build()
                    .map_err(|e| StoreError::backend(format!("invalid ConditionCheck: {e}")))?;
                Ok(TransactWriteItem::builder().condition_check(check).build())
            }
        }
    }
}

/// Map an SDK failure that carries no condition semantics.
fn sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let Some(service_err) = err.as_service_error() {
        if service_err.code() == Some("ValidationException") {
            return StoreError::Validation(
                service_err.message().unwrap_or("validation failed").to_string(),
            );
        }
    }
    StoreError::Backend(format!(
        "DynamoDB {operation} failed: {}",
        DisplayErrorContext(&err)
    ))
}

#[async_trait]
impl ItemStore for DynamoItemStore {
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Item>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::sdk_key(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| sdk_error("GetItem", e))?;

        response.item().map(item_from_sdk).transpose()
    }

    async fn put_item(&self, request: PutRequest) -> Result<()> {
        let mut expr = Expression::new();
        let condition = request.condition.as_ref().map(|c| expr.condition(c));

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_sdk(&request.item)))
            .set_condition_expression(condition)
            .set_expression_attribute_names(expr.names())
            .set_expression_attribute_values(expr.values())
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(table = %self.table_name, "Stored item in DynamoDB");
                Ok(())
            }
            Err(e)
                if matches!(
                    e.as_service_error(),
                    Some(PutItemError::ConditionalCheckFailedException(_))
                ) =>
            {
                Err(StoreError::ConditionalCheckFailed)
            }
            Err(e) => Err(sdk_error("PutItem", e)),
        }
    }

    async fn update_item(&self, request: UpdateRequest) -> Result<Item> {
        let mut expr = Expression::new();

        let mut set_clauses = Vec::new();
        for (name, value) in &request.set {
            let n = expr.name(name);
            let v = expr.value(to_sdk(value));
            set_clauses.push(format!("{n} = {v}"));
        }
        for (name, value) in &request.set_if_absent {
            let n = expr.name(name);
            let v = expr.value(to_sdk(value));
            set_clauses.push(format!("{n} = if_not_exists({n}, {v})"));
        }
        let add_clauses: Vec<String> = request
            .add
            .iter()
            .map(|(name, delta)| {
                let n = expr.name(name);
                let v = expr.value(SdkValue::N(delta.to_string()));
                format!("{n} {v}")
            })
            .collect();
        let remove_clauses: Vec<String> = request.remove.iter().map(|name| expr.name(name)).collect();

        let mut update_expr = Vec::new();
        if !set_clauses.is_empty() {
            update_expr.push(format!("SET {}", set_clauses.join(", ")));
        }
        if !add_clauses.is_empty() {
            update_expr.push(format!("ADD {}", add_clauses.join(", ")));
        }
        if !remove_clauses.is_empty() {
            update_expr.push(format!("REMOVE {}", remove_clauses.join(", ")));
        }
        if update_expr.is_empty() {
            return Err(StoreError::Validation(
                "update must change at least one attribute".to_string(),
            ));
        }

        let condition = request.condition.as_ref().map(|c| expr.condition(c));

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::sdk_key(&request.key)))
            .update_expression(update_expr.join(" "))
            .set_condition_expression(condition)
            .set_expression_attribute_names(expr.names())
            .set_expression_attribute_values(expr.values())
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        match result {
            Ok(output) => match output.attributes() {
                Some(attributes) => item_from_sdk(attributes),
                None => Err(StoreError::backend(
                    "DynamoDB UpdateItem returned no attributes",
                )),
            },
            Err(e)
                if matches!(
                    e.as_service_error(),
                    Some(UpdateItemError::ConditionalCheckFailedException(_))
                ) =>
            {
                Err(StoreError::ConditionalCheckFailed)
            }
            Err(e) => Err(sdk_error("UpdateItem", e)),
        }
    }

    async fn delete_item(&self, key: &PrimaryKey) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::sdk_key(key)))
            .send()
            .await
            .map_err(|e| sdk_error("DeleteItem", e))?;
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> Result<QueryOutput> {
        let (index_name, partition_attr, sort_attr) = match &request.index {
            Some(index) => (
                Some(index.name.clone()),
                index.partition_attr,
                index.sort_attr,
            ),
            None => (None, super::schema::ATTR_PK, super::schema::ATTR_SK),
        };

        let mut expr = Expression::new();
        let key_condition = expr.key_condition(
            partition_attr,
            &request.partition,
            sort_attr,
            request.sort.as_ref(),
        );

        let limit = request
            .limit
            .map(|l| i32::try_from(l).unwrap_or(i32::MAX));

        let response = self
            .client
            .query()
            .table_name(&self.table_name)
            .set_index_name(index_name)
            .key_condition_expression(key_condition)
            .set_expression_attribute_names(expr.names())
            .set_expression_attribute_values(expr.values())
            .scan_index_forward(request.scan_forward)
            .set_limit(limit)
            .set_exclusive_start_key(request.exclusive_start_key.as_ref().map(item_to_sdk))
            .send()
            .await
            .map_err(|e| sdk_error("Query", e))?;

        let items = response
            .items()
            .iter()
            .map(item_from_sdk)
            .collect::<Result<Vec<_>>>()?;

        let last_evaluated_key = match response.last_evaluated_key() {
            Some(key) if !key.is_empty() => Some(item_from_sdk(key)?),
            _ => None,
        };

        Ok(QueryOutput {
            items,
            last_evaluated_key,
        })
    }

    async fn transact_write(&self, ops: Vec<TransactOp>) -> Result<()> {
        let items = ops
            .iter()
            .map(|op| self.build_op(op))
            .collect::<Result<Vec<_>>>()?;

        let result = self
            .client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(table = %self.table_name, ops = ops.len(), "Committed transaction");
                Ok(())
            }
            Err(e) => match e.as_service_error() {
                Some(TransactWriteItemsError::TransactionCanceledException(canceled)) => {
                    let reasons = canceled
                        .cancellation_reasons()
                        .iter()
                        .map(reason_from_sdk)
                        .collect();
                    Err(StoreError::TransactionCanceled { reasons })
                }
                _ => Err(sdk_error("TransactWriteItems", e)),
            },
        }
    }
}
