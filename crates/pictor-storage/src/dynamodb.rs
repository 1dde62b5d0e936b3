use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use pictor_core::StyleRecord;

use crate::traits::{KvStore, StoreError, StoreResult};

/// Style store over a DynamoDB table with `id` (partition key) and `style`
/// string attributes.
#[derive(Clone)]
pub struct DynamoKvStore {
    client: Client,
    table: String,
}

impl DynamoKvStore {
    pub async fn new(table: String) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        DynamoKvStore {
            client: Client::new(&config),
            table,
        }
    }

    pub fn with_client(client: Client, table: String) -> Self {
        DynamoKvStore { client, table }
    }
}

#[async_trait]
impl KvStore for DynamoKvStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StyleRecord>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(key.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let record = output.item().and_then(|item| {
            let id = item.get("id")?.as_s().ok()?.clone();
            let style = item.get("style")?.as_s().ok()?.clone();
            Some(StyleRecord { id, style })
        });
        tracing::debug!(key = %key, hit = record.is_some(), "style table lookup");
        Ok(record)
    }
}
