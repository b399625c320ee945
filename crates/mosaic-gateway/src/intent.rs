//! A caller's intended API call, before hooks run.

use std::fmt;

use serde_json::{Map, Value};

use crate::transport::ProgressCallback;

/// What a caller wants to call, and with which parameters.
///
/// `data` carries the call's parameters: path ids such as `accountId` at
/// the top level and the request body under `data`.
#[derive(Clone)]
pub struct RequestIntent {
    /// `<module>.<method>` resource id.
    pub resource: String,
    /// Call parameters.
    pub data: Map<String, Value>,
    /// Auth token override.
    pub auth_token: Option<String>,
    /// API root override.
    pub api_url: Option<String>,
    /// Application issuing the call.
    pub origin: Option<String>,
    /// Skip the global request-in-progress events.
    pub bypass_progress_indicator: bool,
    /// Caller-supplied upload progress callback.
    pub upload_progress: Option<ProgressCallback>,
}

impl RequestIntent {
    /// Intent to call `resource` with no parameters.
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            data: Map::new(),
            auth_token: None,
            api_url: None,
            origin: None,
            bypass_progress_indicator: false,
            upload_progress: None,
        }
    }

    /// Shallow-merge the fields of a JSON object into the parameters.
    /// Non-object values are ignored.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        if let Value::Object(fields) = data {
            self.data.extend(fields);
        }
        self
    }

    /// Set one parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Override the auth token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Override the API root.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Set the issuing application.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Do not publish request start/end events for this call.
    #[must_use]
    pub fn bypassing_progress_indicator(mut self) -> Self {
        self.bypass_progress_indicator = true;
        self
    }

    /// Supply an upload progress callback. Upload calls with a caller
    /// callback are not tracked by the global indicator.
    #[must_use]
    pub fn with_upload_progress(mut self, callback: ProgressCallback) -> Self {
        self.upload_progress = Some(callback);
        self
    }

    /// A string parameter.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// The request body (`data` parameter) as an object.
    #[must_use]
    pub fn body(&self) -> Option<&Map<String, Value>> {
        self.data.get("data").and_then(Value::as_object)
    }

    /// Mutable access to the request body object.
    pub fn body_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.data.get_mut("data").and_then(Value::as_object_mut)
    }
}

impl fmt::Debug for RequestIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestIntent")
            .field("resource", &self.resource)
            .field("data", &self.data)
            .field("has_auth_token", &self.auth_token.is_some())
            .field("api_url", &self.api_url)
            .field("origin", &self.origin)
            .field("bypass_progress_indicator", &self.bypass_progress_indicator)
            .field("has_upload_progress", &self.upload_progress.is_some())
            .finish()
    }
}
