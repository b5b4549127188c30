use async_trait::async_trait;
use huddle_client::directory::{CreatedRoom, InvitedRoom, RoomDirectory, RoomInfo};
use huddle_client::DirectoryError;
use huddle_core::RoomId;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::engine::js_error;

#[derive(Deserialize)]
struct Exists {
    exists: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Room metadata over the relay's REST endpoints (`/api/rooms/...`).
pub struct HttpRoomDirectory {
    base_url: String,
}

impl HttpRoomDirectory {
    /// `base_url` is prefixed to every path; empty means same origin.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<Response, DirectoryError> {
        let window =
            web_sys::window().ok_or_else(|| DirectoryError::Request("no window object".into()))?;

        let init = RequestInit::new();
        init.set_method(method);
        if let Some(body) = body {
            init.set_body(&JsValue::from_str(body));
        }
        let url = format!("{}{}", self.base_url, path);
        let request = Request::new_with_str_and_init(&url, &init).map_err(request_error)?;
        request
            .headers()
            .set("Accept", "application/json")
            .map_err(request_error)?;
        if body.is_some() {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(request_error)?;
        }

        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(request_error)?;
        response.dyn_into::<Response>().map_err(request_error)
    }
}

async fn read_json<T: DeserializeOwned>(response: &Response) -> Result<T, DirectoryError> {
    let promise = response.json().map_err(request_error)?;
    let value = JsFuture::from(promise).await.map_err(request_error)?;
    serde_wasm_bindgen::from_value(value).map_err(|e| DirectoryError::Request(e.to_string()))
}

fn request_error(value: JsValue) -> DirectoryError {
    DirectoryError::Request(js_error(&value))
}

fn encode(segment: &str) -> String {
    String::from(js_sys::encode_uri_component(segment))
}

#[async_trait(?Send)]
impl RoomDirectory for HttpRoomDirectory {
    async fn room_info(&self, room_id: &RoomId) -> Result<RoomInfo, DirectoryError> {
        let path = format!("/api/rooms/{}", encode(room_id.as_str()));
        let response = self.request("GET", &path, None).await?;
        match response.status() {
            404 => Err(DirectoryError::NotFound(room_id.to_string())),
            _ if response.ok() => read_json(&response).await,
            status => Err(DirectoryError::Request(format!("HTTP {}", status))),
        }
    }

    async fn create_room(&self, name: &str) -> Result<CreatedRoom, DirectoryError> {
        let body = serde_json::json!({ "name": name }).to_string();
        let response = self.request("POST", "/api/rooms/create", Some(&body)).await?;
        if response.ok() {
            return read_json(&response).await;
        }
        let status = response.status();
        let message = read_json::<ErrorBody>(&response)
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Err(DirectoryError::Request(message))
    }

    async fn invite_code_exists(&self, code: &str) -> Result<bool, DirectoryError> {
        let path = format!("/api/rooms/invite/{}/exists", encode(code));
        let response = self.request("GET", &path, None).await?;
        if !response.ok() {
            return Err(DirectoryError::Request(format!("HTTP {}", response.status())));
        }
        Ok(read_json::<Exists>(&response).await?.exists)
    }

    async fn resolve_invite_code(&self, code: &str) -> Result<InvitedRoom, DirectoryError> {
        let path = format!("/api/rooms/invite/{}", encode(code));
        let response = self.request("GET", &path, None).await?;
        if !response.ok() {
            return Err(DirectoryError::NotFound(code.to_string()));
        }
        read_json(&response).await
    }
}
