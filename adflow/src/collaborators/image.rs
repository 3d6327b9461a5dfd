//! Image collaborators: background removal and lifestyle scene generation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::RemoteError;

/// Request to cut a product out of its background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackgroundRequest {
    /// Owning product.
    pub product_id: String,
    /// Image to clean up.
    pub image_url: String,
}

/// What the background removal service returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackgroundResponse {
    /// Background-removed image.
    #[serde(default, alias = "url")]
    pub clean_image_url: Option<String>,
}

/// Request to render the product into one lifestyle scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneRequest {
    /// Owning product.
    pub product_id: String,
    /// Image to place in the scene.
    pub image_url: String,
    /// Scene description.
    pub theme: String,
}

/// What the scene generation service returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SceneResponse {
    /// Rendered scene.
    #[serde(default, alias = "url")]
    pub scene_url: Option<String>,
}

/// Background removal.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Removes the background of one product image.
    async fn remove_background(&self, request: &BackgroundRequest) -> Result<BackgroundResponse, RemoteError>;
}

/// Lifestyle scene generation.
#[async_trait]
pub trait SceneGenerator: Send + Sync {
    /// Renders one scene.
    async fn generate_scene(&self, request: &SceneRequest) -> Result<SceneResponse, RemoteError>;
}

#[cfg(feature = "http")]
pub use client::{RemoteBackgroundRemover, RemoteSceneGenerator};

#[cfg(feature = "http")]
mod client {
    use super::{
        BackgroundRemover, BackgroundRequest, BackgroundResponse, SceneGenerator, SceneRequest,
        SceneResponse,
    };
    use crate::collaborators::http::{parse_json, read_body};
    use crate::errors::RemoteError;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Client for a JSON background removal endpoint.
    #[derive(Debug, Clone)]
    pub struct RemoteBackgroundRemover {
        endpoint: String,
        api_key: String,
        client: reqwest::Client,
    }

    impl RemoteBackgroundRemover {
        /// Creates a client.
        pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
            Ok(Self {
                endpoint: endpoint.into(),
                api_key: api_key.into(),
                client: crate::collaborators::http::client(timeout)?,
            })
        }
    }

    #[async_trait]
    impl BackgroundRemover for RemoteBackgroundRemover {
        async fn remove_background(&self, request: &BackgroundRequest) -> Result<BackgroundResponse, RemoteError> {
            let response = self
                .client
                .post(&self.endpoint)
                .header("x-api-key", &self.api_key)
                .json(request)
                .send()
                .await?;
            parse_json(&read_body(response).await?)
        }
    }

    /// Client for a JSON scene generation endpoint.
    #[derive(Debug, Clone)]
    pub struct RemoteSceneGenerator {
        endpoint: String,
        api_key: String,
        client: reqwest::Client,
    }

    impl RemoteSceneGenerator {
        /// Creates a client.
        pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
            Ok(Self {
                endpoint: endpoint.into(),
                api_key: api_key.into(),
                client: crate::collaborators::http::client(timeout)?,
            })
        }
    }

    #[async_trait]
    impl SceneGenerator for RemoteSceneGenerator {
        async fn generate_scene(&self, request: &SceneRequest) -> Result<SceneResponse, RemoteError> {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await?;
            parse_json(&read_body(response).await?)
        }
    }
}
