//! Cursor-based iteration over every object of a Weaviate class.

use async_stream::try_stream;
use futures_core::Stream;
use reqwest::Method;

use super::client::WeaviateService;
use super::types::{ObjectListResponse, StoredObject, WeaviateError};

const DEFAULT_PAGE_LIMIT: usize = 100;

/// Stream all objects of `class`, following the `after` cursor until a short page.
pub fn stream_objects<'a>(
    service: &'a WeaviateService,
    class: &'a str,
) -> impl Stream<Item = Result<StoredObject, WeaviateError>> + 'a {
    stream_objects_paged(service, class, DEFAULT_PAGE_LIMIT)
}

pub(crate) fn stream_objects_paged<'a>(
    service: &'a WeaviateService,
    class: &'a str,
    limit: usize,
) -> impl Stream<Item = Result<StoredObject, WeaviateError>> + 'a {
    try_stream! {
        let mut after: Option<String> = None;

        loop {
            let mut request = service
                .request(Method::GET, "v1/objects")
                .query(&[("class", class)])
                .query(&[("limit", limit)]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let response = request.send().await?;

            let status = response.status();
            if status.is_success() {
                let ObjectListResponse { objects } = response.json().await?;
                let page_len = objects.len();
                let last_id = objects.last().map(|object| object.id.clone());
                for object in objects {
                    yield object;
                }

                match last_id {
                    Some(id) if page_len >= limit => after = Some(id),
                    _ => break,
                }
            } else {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(class, status = %status, "Failed to list objects");
                Err(WeaviateError::UnexpectedStatus { status, body })?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weaviate::WeaviateSettings;
    use futures_util::{pin_mut, stream::StreamExt};
    use httpmock::{Method::GET, MockServer};
    use serde_json::{Value, json};

    #[tokio::test]
    async fn follows_cursor_until_short_page() {
        let server = MockServer::start_async().await;
        let service =
            WeaviateService::new(WeaviateSettings::local(server.base_url())).expect("service");

        let first = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/objects")
                    .query_param("class", "Chunks")
                    .query_param("limit", "2")
                    .matches(|req| {
                        !req.query_params
                            .as_ref()
                            .is_some_and(|params| params.iter().any(|(key, _)| key == "after"))
                    });
                then.status(200).json_body(json!({
                    "objects": [
                        { "id": "id-1", "properties": { "file_name": "a.pdf" } },
                        { "id": "id-2", "properties": { "file_name": "b.pdf" } }
                    ]
                }));
            })
            .await;

        let second = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/objects")
                    .query_param("after", "id-2");
                then.status(200).json_body(json!({
                    "objects": [
                        { "id": "id-3", "properties": { "file_name": "a.pdf" } }
                    ]
                }));
            })
            .await;

        let stream = stream_objects_paged(&service, "Chunks", 2);
        pin_mut!(stream);
        let mut names = Vec::new();
        while let Some(object) = stream.next().await {
            let object = object.expect("object");
            names.push(object.properties.get("file_name").cloned());
        }

        first.assert();
        second.assert();
        assert_eq!(
            names,
            vec![
                Some(Value::String("a.pdf".into())),
                Some(Value::String("b.pdf".into())),
                Some(Value::String("a.pdf".into())),
            ]
        );
    }
}
