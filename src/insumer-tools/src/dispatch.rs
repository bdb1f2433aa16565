//! Turning validated arguments into an upstream request.

use insumer_client::{Access, ApiRequest, HttpMethod};
use serde_json::{Map, Value};
use thiserror::Error;

/// Where a tool's request goes.
///
/// `path` is a template below the base URL; `{name}` placeholders are filled
/// from the argument of the same name, which is then left out of the query
/// or body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub path: &'static str,
    pub access: Access,
}

impl Route {
    pub const fn get(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Get,
            path,
            access: Access::ApiKey,
        }
    }

    pub const fn post(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Post,
            path,
            access: Access::ApiKey,
        }
    }

    pub const fn put(path: &'static str) -> Self {
        Self {
            method: HttpMethod::Put,
            path,
            access: Access::ApiKey,
        }
    }

    /// Mark the route as callable without an API key.
    pub const fn public(mut self) -> Self {
        self.access = Access::Public;
        self
    }

    /// Placeholder names in the path template, in order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            names.push(&rest[start + 1..start + len]);
            rest = &rest[start + len + 1..];
        }
        names
    }
}

/// A catalog entry whose route and fields disagree.
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("path parameter `{0}` was not supplied")]
    MissingPathParam(String),

    #[error("path parameter `{0}` must be a string or number")]
    InvalidPathParam(String),

    #[error("unterminated placeholder in path template `{0}`")]
    InvalidTemplate(&'static str),
}

/// Build the request for a route from already-validated arguments.
///
/// GET sends the remaining arguments as query parameters, omitting absent
/// ones. POST and PUT send them as a JSON object body, `{}` when nothing is
/// left.
pub fn build_request(route: &Route, mut args: Map<String, Value>) -> Result<ApiRequest, DispatchError> {
    let path = fill_path(route.path, &mut args)?;
    let request = ApiRequest::new(route.method, path, route.access);

    if route.method.uses_query() {
        Ok(args
            .into_iter()
            .fold(request, |request, (name, value)| {
                request.with_query(name, query_value(value))
            }))
    } else {
        Ok(request.with_body(Value::Object(args)))
    }
}

fn fill_path(template: &'static str, args: &mut Map<String, Value>) -> Result<String, DispatchError> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let end = start
            + rest[start..]
                .find('}')
                .ok_or(DispatchError::InvalidTemplate(template))?;
        let name = &rest[start + 1..end];

        let segment = match args.shift_remove(name) {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => return Err(DispatchError::InvalidPathParam(name.to_string())),
            None => return Err(DispatchError::MissingPathParam(name.to_string())),
        };

        path.push_str(&rest[..start]);
        path.push_str(&urlencoding::encode(&segment));
        rest = &rest[end + 1..];
    }

    path.push_str(rest);
    Ok(path)
}

fn query_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
