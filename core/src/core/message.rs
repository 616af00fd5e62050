// gantry/src/core/message.rs

//! Transport-neutral request and response values.
//!
//! The transport layer owns sockets and serialization. The dispatcher only sees
//! these plain values: header names are stored lower-cased so lookups are
//! case-insensitive, and bodies are JSON values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
  pub method: String,
  pub path: String,
  pub headers: BTreeMap<String, String>,
  /// Path parameters already extracted by the router.
  pub params: BTreeMap<String, String>,
  pub query: BTreeMap<String, String>,
  pub body: Value,
}

impl Request {
  pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
    Self {
      method: method.into().to_ascii_uppercase(),
      path: path.into(),
      ..Default::default()
    }
  }

  pub fn get(path: impl Into<String>) -> Self {
    Self::new("GET", path)
  }

  pub fn post(path: impl Into<String>) -> Self {
    Self::new("POST", path)
  }

  pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
    self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
    self
  }

  pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.params.insert(name.into(), value.into());
    self
  }

  pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.query.insert(name.into(), value.into());
    self
  }

  pub fn with_body(mut self, body: Value) -> Self {
    self.body = body;
    self
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
  }

  pub fn param(&self, name: &str) -> Option<&str> {
    self.params.get(name).map(String::as_str)
  }

  pub fn query_value(&self, name: &str) -> Option<&str> {
    self.query.get(name).map(String::as_str)
  }

  /// Path plus query string, as logged by request loggers.
  pub fn url(&self) -> String {
    if self.query.is_empty() {
      return self.path.clone();
    }
    let query = self
      .query
      .iter()
      .map(|(k, v)| format!("{}={}", k, v))
      .collect::<Vec<_>>()
      .join("&");
    format!("{}?{}", self.path, query)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
  pub status: u16,
  pub headers: BTreeMap<String, String>,
  pub body: Value,
}

impl Response {
  pub fn new(status: u16, body: Value) -> Self {
    Self {
      status,
      headers: BTreeMap::new(),
      body,
    }
  }

  pub fn ok(body: Value) -> Self {
    Self::new(200, body)
  }

  pub fn no_content() -> Self {
    Self::new(204, Value::Null)
  }

  pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
    self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
    self
  }

  pub fn set_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
    self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

impl Default for Response {
  fn default() -> Self {
    Self::ok(Value::Null)
  }
}
