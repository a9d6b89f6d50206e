use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::debug;

use super::{RoutineStore, StoreError};
use crate::config::Config;
use crate::models::routine::RoutineEntry;

type Item = HashMap<String, AttributeValue>;

const USER_ID: &str = "userId";
const TIMESTAMP: &str = "timestamp";
const ROUTINE_ID: &str = "routineId";
const DATE: &str = "date";
const DURATION: &str = "duration";
const MOOD: &str = "mood";
const PRODUCTIVITY: &str = "productivity";
const ACTIVITIES: &str = "activities";
const SOLVER_SCORE: &str = "solver_score";

/// Constructs a DynamoDB client from the default AWS credential chain,
/// with optional region and endpoint overrides (DynamoDB Local).
pub async fn build_client(config: &Config) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.aws_region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.dynamodb_endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;
    Client::new(&sdk_config)
}

pub struct DynamoRoutineStore {
    client: Client,
    table_name: String,
}

impl DynamoRoutineStore {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl RoutineStore for DynamoRoutineStore {
    async fn put(&self, entry: &RoutineEntry) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(entry)))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    async fn query_by_user(
        &self,
        user_id: &str,
        descending: bool,
    ) -> Result<Vec<RoutineEntry>, StoreError> {
        let mut entries = Vec::new();
        let mut start_key: Option<Item> = None;
        let mut pages = 0usize;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#uid = :uid")
                .expression_attribute_names("#uid", USER_ID)
                .expression_attribute_values(":uid", AttributeValue::S(user_id.to_string()))
                .scan_index_forward(!descending)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::Unavailable(DisplayErrorContext(&e).to_string()))?;
            pages += 1;

            for item in output.items() {
                entries.push(from_item(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(user_id, pages, count = entries.len(), "Queried routine partition");
        Ok(entries)
    }
}

fn number(value: f64) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

fn to_item(entry: &RoutineEntry) -> Item {
    let mut item = Item::new();
    item.insert(USER_ID.to_string(), AttributeValue::S(entry.user_id.clone()));
    item.insert(TIMESTAMP.to_string(), AttributeValue::N(entry.timestamp.to_string()));
    item.insert(ROUTINE_ID.to_string(), AttributeValue::S(entry.routine_id.clone()));
    item.insert(DATE.to_string(), AttributeValue::S(entry.date.clone()));
    item.insert(DURATION.to_string(), number(entry.duration));
    item.insert(MOOD.to_string(), number(entry.mood));
    item.insert(PRODUCTIVITY.to_string(), number(entry.productivity));
    item.insert(
        ACTIVITIES.to_string(),
        AttributeValue::L(
            entry
                .activities
                .iter()
                .map(|a| AttributeValue::S(a.clone()))
                .collect(),
        ),
    );
    item.insert(SOLVER_SCORE.to_string(), number(entry.solver_score));
    item
}

fn from_item(item: &Item) -> Result<RoutineEntry, StoreError> {
    Ok(RoutineEntry {
        user_id: string_attr(item, USER_ID)?,
        timestamp: number_attr(item, TIMESTAMP)?,
        routine_id: string_attr(item, ROUTINE_ID)?,
        date: string_attr(item, DATE)?,
        duration: number_attr(item, DURATION)?,
        mood: number_attr(item, MOOD)?,
        productivity: number_attr(item, PRODUCTIVITY)?,
        activities: activities_attr(item)?,
        solver_score: number_attr(item, SOLVER_SCORE)?,
    })
}

fn attr<'a>(item: &'a Item, name: &str) -> Result<&'a AttributeValue, StoreError> {
    item.get(name)
        .ok_or_else(|| StoreError::Malformed(format!("missing attribute '{name}'")))
}

fn string_attr(item: &Item, name: &str) -> Result<String, StoreError> {
    attr(item, name)?
        .as_s()
        .cloned()
        .map_err(|_| StoreError::Malformed(format!("attribute '{name}' is not a string")))
}

fn number_attr<T: std::str::FromStr>(item: &Item, name: &str) -> Result<T, StoreError> {
    let raw = attr(item, name)?
        .as_n()
        .map_err(|_| StoreError::Malformed(format!("attribute '{name}' is not a number")))?;
    raw.parse::<T>()
        .map_err(|_| StoreError::Malformed(format!("attribute '{name}' has invalid number '{raw}'")))
}

// Items written without activities read back as an empty list.
fn activities_attr(item: &Item) -> Result<Vec<String>, StoreError> {
    let Some(value) = item.get(ACTIVITIES) else {
        return Ok(Vec::new());
    };
    let list = value
        .as_l()
        .map_err(|_| StoreError::Malformed(format!("attribute '{ACTIVITIES}' is not a list")))?;
    list.iter()
        .map(|v| {
            v.as_s().cloned().map_err(|_| {
                StoreError::Malformed(format!("attribute '{ACTIVITIES}' holds a non-string"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::config::retry::RetryConfig;
    use aws_sdk_dynamodb::config::{BehaviorVersion, Credentials, Region};
    use httpmock::prelude::*;
    use serde_json::{json, Value};

    use super::*;

    const JSON_1_0: &str = "application/x-amz-json-1.0";

    fn store_for(server: &MockServer) -> DynamoRoutineStore {
        let config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "routines-test"))
            .endpoint_url(server.base_url())
            .retry_config(RetryConfig::disabled())
            .build();
        DynamoRoutineStore::new(Client::from_conf(config), "routines-test".to_string())
    }

    fn wire_item(timestamp: i64) -> Value {
        json!({
            "userId": {"S": "u1"},
            "timestamp": {"N": timestamp.to_string()},
            "routineId": {"S": format!("r-{timestamp}")},
            "date": {"S": "2024-05-01"},
            "duration": {"N": "15"},
            "mood": {"N": "5"},
            "productivity": {"N": "5"},
            "activities": {"L": [{"S": "walk"}]},
            "solver_score": {"N": "6.67"}
        })
    }

    fn has_start_key(body: Option<&[u8]>) -> bool {
        body.map(|b| String::from_utf8_lossy(b).contains("ExclusiveStartKey"))
            .unwrap_or(false)
    }

    fn sample() -> RoutineEntry {
        RoutineEntry {
            user_id: "u1".to_string(),
            timestamp: 1_714_521_600,
            routine_id: "2f1c7a1e-0000-4000-8000-000000000000".to_string(),
            date: "2024-05-01".to_string(),
            duration: 20.0,
            mood: 8.0,
            productivity: 6.5,
            activities: vec!["stretch".to_string(), "journal".to_string()],
            solver_score: 7.25,
        }
    }

    #[test]
    fn test_item_uses_store_key_names_and_types() {
        let item = to_item(&sample());
        assert_eq!(item[USER_ID], AttributeValue::S("u1".to_string()));
        assert_eq!(item[TIMESTAMP], AttributeValue::N("1714521600".to_string()));
        assert_eq!(item[PRODUCTIVITY], AttributeValue::N("6.5".to_string()));
        assert_eq!(from_item(&item).unwrap(), sample());
    }

    #[test]
    fn test_missing_activities_reads_as_empty() {
        let mut item = to_item(&sample());
        item.remove(ACTIVITIES);
        assert!(from_item(&item).unwrap().activities.is_empty());
    }

    #[test]
    fn test_wrong_attribute_type_is_malformed() {
        let mut item = to_item(&sample());
        item.insert(MOOD.to_string(), AttributeValue::S("happy".to_string()));
        let err = from_item(&item).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
        assert!(err.to_string().contains("mood"), "Error was {err}");
    }

    #[test]
    fn test_missing_key_attribute_is_malformed() {
        let mut item = to_item(&sample());
        item.remove(TIMESTAMP);
        assert!(matches!(from_item(&item), Err(StoreError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_query_follows_pages_newest_first() {
        let server = MockServer::start_async().await;
        let first_page = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/")
                    .json_body_partial(
                        r##"{"TableName":"routines-test","ScanIndexForward":false,
                            "KeyConditionExpression":"#uid = :uid",
                            "ExpressionAttributeNames":{"#uid":"userId"},
                            "ExpressionAttributeValues":{":uid":{"S":"u1"}}}"##,
                    )
                    .matches(|req| !has_start_key(req.body.as_deref()));
                then.status(200)
                    .header("content-type", JSON_1_0)
                    .json_body(json!({
                        "Count": 2,
                        "ScannedCount": 2,
                        "Items": [wire_item(300), wire_item(200)],
                        "LastEvaluatedKey": {"userId": {"S": "u1"}, "timestamp": {"N": "200"}}
                    }));
            })
            .await;
        let second_page = server
            .mock_async(|when, then| {
                when.method(POST).path("/").json_body_partial(
                    r#"{"ScanIndexForward":false,
                        "ExclusiveStartKey":{"userId":{"S":"u1"},"timestamp":{"N":"200"}}}"#,
                );
                then.status(200)
                    .header("content-type", JSON_1_0)
                    .json_body(json!({
                        "Count": 1,
                        "ScannedCount": 1,
                        "Items": [wire_item(100)]
                    }));
            })
            .await;

        let entries = store_for(&server).query_by_user("u1", true).await.unwrap();

        let timestamps: Vec<i64> = entries.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![300, 200, 100]);
        assert_eq!(entries[2].activities, vec!["walk"]);
        assert_eq!(entries[0].solver_score, 6.67);
        first_page.assert_async().await;
        second_page.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_sends_full_item() {
        let server = MockServer::start_async().await;
        let put = server
            .mock_async(|when, then| {
                when.method(POST).path("/").json_body_partial(
                    r#"{"TableName":"routines-test",
                        "Item":{"userId":{"S":"u1"},"timestamp":{"N":"1714521600"},
                                "productivity":{"N":"6.5"},"solver_score":{"N":"7.25"}}}"#,
                );
                then.status(200)
                    .header("content-type", JSON_1_0)
                    .body("{}");
            })
            .await;

        store_for(&server).put(&sample()).await.unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_service_error_becomes_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(400)
                    .header("content-type", JSON_1_0)
                    .json_body(json!({
                        "__type": "com.amazonaws.dynamodb.v20120810#ResourceNotFoundException",
                        "message": "Requested resource not found"
                    }));
            })
            .await;
        let store = store_for(&server);

        let err = store.put(&sample()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "Error was {err:?}");
        assert!(
            err.to_string().contains("Requested resource not found"),
            "Error was {err}"
        );

        let err = store.query_by_user("u1", true).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "Error was {err:?}");
    }

    #[tokio::test]
    async fn test_undecodable_item_is_malformed() {
        let server = MockServer::start_async().await;
        let mut item = wire_item(100);
        item["mood"] = json!({"S": "happy"});
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200)
                    .header("content-type", JSON_1_0)
                    .json_body(json!({"Count": 1, "ScannedCount": 1, "Items": [item]}));
            })
            .await;

        let err = store_for(&server).query_by_user("u1", true).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)), "Error was {err:?}");
    }
}
