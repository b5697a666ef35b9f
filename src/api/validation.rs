use actix_web::{error::InternalError, HttpResponse};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

fn bad_request(error: &str, fields: Map<String, Value>) -> actix_web::Error {
    let body = ErrorResponse {
        error: error.to_string(),
        fields: Value::Object(fields),
    };
    InternalError::from_response("", HttpResponse::BadRequest().json(body)).into()
}

/// JsonConfig shared by every validated JSON body in the service
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| {
        let mut fields = Map::new();

        match err {
            actix_web_validator::Error::Validate(validation_errors) => {
                for (field, errors) in validation_errors.field_errors() {
                    let messages: Vec<String> = errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("Validation error in field: {}", field))
                        })
                        .collect();
                    fields.insert(field.to_string(), json!({ "errors": messages }));
                }
                // struct-level checks (salary range, coordinates) land under __all__
                if fields.is_empty() {
                    fields.insert("message".to_string(), json!(validation_errors.to_string()));
                }
                bad_request("Validation failed", fields)
            }
            actix_web_validator::Error::Deserialize(de_err) => {
                let err_string = de_err.to_string();
                let message = if err_string.contains("EOF while parsing") {
                    "Request body is empty. Expected JSON payload".to_string()
                } else if err_string.contains("unknown variant") {
                    "Invalid enum value. Check allowed values for this field".to_string()
                } else {
                    format!("Invalid JSON: {}", err_string)
                };
                fields.insert("message".to_string(), json!(message));
                bad_request("Request validation failed", fields)
            }
            _ => {
                fields.insert("message".to_string(), json!("Validation error"));
                bad_request("Validation failed", fields)
            }
        }
    })
}
