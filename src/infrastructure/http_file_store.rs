// HTTP file store backed by the upload/history REST endpoints
use crate::application::file_store::{FileStore, StoreError, UploadRequest};
use crate::application::session::BearerToken;
use crate::domain::dataset::Dataset;
use crate::domain::history::HistoryEntry;
use crate::infrastructure::config::ApiSettings;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

const UPLOAD_PATH: &str = "/api/files/upload";
const HISTORY_PATH: &str = "/api/files/history";

#[derive(Debug, Clone)]
pub struct HttpFileStore {
    client: reqwest::Client,
    api: ApiSettings,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: Dataset,
}

impl HttpFileStore {
    pub fn new(api: ApiSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api,
        }
    }

    /// Pass successful responses through, classify the rest.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::from_status(status.as_u16(), body))
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

fn decode(err: reqwest::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

#[async_trait]
impl FileStore for HttpFileStore {
    async fn upload(&self, token: &BearerToken, request: UploadRequest) -> Result<Dataset, StoreError> {
        let url = self.api.endpoint(UPLOAD_PATH);
        tracing::debug!(
            "Uploading {} ({} bytes) to {}",
            request.file.file_name,
            request.file.content.len(),
            url
        );

        let part = Part::bytes(request.file.content.to_vec()).file_name(request.file.file_name);
        let form = Form::new()
            .part("file", part)
            .text("xAxis", request.category_field.unwrap_or_default())
            .text("yAxis", request.value_field.unwrap_or_default())
            .text("chartType", request.variant.as_str());

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, token.header_value())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let response = Self::check(response).await?;

        let body = response.json::<UploadResponse>().await.map_err(decode)?;
        tracing::debug!("Upload parsed into {} rows", body.data.len());
        Ok(body.data)
    }

    async fn list_history(&self, token: &BearerToken) -> Result<Vec<HistoryEntry>, StoreError> {
        let url = self.api.endpoint(HISTORY_PATH);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, token.header_value())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport)?;
        let response = Self::check(response).await?;

        let entries = response.json::<Vec<HistoryEntry>>().await.map_err(decode)?;
        tracing::debug!("Fetched {} history entries", entries.len());
        Ok(entries)
    }

    async fn delete_history(&self, token: &BearerToken, id: &str) -> Result<(), StoreError> {
        let url = self
            .api
            .endpoint(&format!("{}/{}", HISTORY_PATH, urlencoding::encode(id)));
        let response = self
            .client
            .delete(&url)
            .header(AUTHORIZATION, token.header_value())
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        tracing::debug!("Deleted history entry {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::file_store::UploadFile;
    use crate::domain::chart::ChartVariant;
    use axum::Json;
    use axum::Router;
    use axum::extract::{Multipart, Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, post};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorded {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Recorded {
        fn push(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn bearer(headers: &HeaderMap) -> String {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn upload(
        State(recorded): State<Recorded>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> Json<Value> {
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let value = match field.file_name() {
                Some(file_name) => file_name.to_string(),
                None => field.text().await.unwrap(),
            };
            fields.push(format!("{name}={value}"));
        }
        recorded.push(format!("POST {} {}", bearer(&headers), fields.join("&")));
        Json(json!({ "data": [{ "region": "North", "sales": 120 }] }))
    }

    async fn history(State(recorded): State<Recorded>, headers: HeaderMap) -> Json<Value> {
        recorded.push(format!("GET {}", bearer(&headers)));
        Json(json!([{
            "_id": "abc",
            "originalFilename": "sales.xlsx",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "xAxis": "region",
            "yAxis": "sales",
            "chartType": "line"
        }]))
    }

    async fn remove(
        State(recorded): State<Recorded>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> StatusCode {
        recorded.push(format!("DELETE {} {}", id, bearer(&headers)));
        StatusCode::NO_CONTENT
    }

    async fn serve(app: Router) -> ApiSettings {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ApiSettings {
            base_url: format!("http://{addr}"),
        }
    }

    async fn fake_server() -> (HttpFileStore, Recorded) {
        let recorded = Recorded::default();
        let app = Router::new()
            .route("/api/files/upload", post(upload))
            .route("/api/files/history", get(history))
            .route("/api/files/history/:id", delete(remove))
            .with_state(recorded.clone());
        (HttpFileStore::new(serve(app).await), recorded)
    }

    async fn failing_server(status: StatusCode) -> HttpFileStore {
        let app = Router::new()
            .route("/api/files/history", get(move || async move { (status, "nope") }))
            .route("/api/files/history/:id", delete(move || async move { (status, "nope") }));
        HttpFileStore::new(serve(app).await)
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_with_bearer() {
        let (store, recorded) = fake_server().await;
        let request = UploadRequest {
            file: UploadFile::new("sales.xlsx", &b"PK\x03\x04"[..]),
            category_field: Some("region".into()),
            value_field: None,
            variant: ChartVariant::Pie,
        };

        let dataset = store.upload(&BearerToken::new("tok"), request).await.unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(
            recorded.calls(),
            vec!["POST Bearer tok file=sales.xlsx&xAxis=region&yAxis=&chartType=pie"]
        );
    }

    #[tokio::test]
    async fn test_list_history_decodes_entries() {
        let (store, recorded) = fake_server().await;

        let entries = store.list_history(&BearerToken::new("tok")).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "abc");
        assert_eq!(entries[0].original_filename, "sales.xlsx");
        assert!(entries[0].parsed_data.is_none());
        assert_eq!(recorded.calls(), vec!["GET Bearer tok"]);
    }

    #[tokio::test]
    async fn test_delete_encodes_id() {
        let (store, recorded) = fake_server().await;

        store
            .delete_history(&BearerToken::new("tok"), "a b")
            .await
            .unwrap();

        assert_eq!(recorded.calls(), vec!["DELETE a b Bearer tok"]);
    }

    #[tokio::test]
    async fn test_auth_statuses_are_unauthorized() {
        let store = failing_server(StatusCode::UNAUTHORIZED).await;
        let err = store.list_history(&BearerToken::new("tok")).await.unwrap_err();
        assert_eq!(err, StoreError::Unauthorized(401));

        let store = failing_server(StatusCode::FORBIDDEN).await;
        let err = store
            .delete_history(&BearerToken::new("tok"), "abc")
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_server_error_is_rejected_with_body() {
        let store = failing_server(StatusCode::INTERNAL_SERVER_ERROR).await;
        let err = store
            .delete_history(&BearerToken::new("tok"), "abc")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Rejected {
                status: 500,
                message: "nope".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let store = HttpFileStore::new(ApiSettings {
            base_url: format!("http://{addr}"),
        });

        let err = store.list_history(&BearerToken::new("tok")).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
