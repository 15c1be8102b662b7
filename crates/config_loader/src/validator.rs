//! 配置校验模块
//!
//! 校验规则：
//! - 必填列绑定非空
//! - 大小上限 > 0，且表格上限 <= CSV 上限
//! - preview_rows > 0
//! - 存储文件名非空且不含路径分隔符
//! - 网关地址为 http(s)，超时 > 0
//! - 操作员用户名唯一，密码摘要为 64 位十六进制

use std::collections::HashSet;

use contracts::{AuthConfig, ContractError, RowcastBlueprint};

/// 校验 RowcastBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RowcastBlueprint) -> Result<(), ContractError> {
    validate_columns(blueprint)?;
    validate_limits(blueprint)?;
    validate_storage(blueprint)?;
    validate_gateway(blueprint)?;
    validate_operators(blueprint)?;
    Ok(())
}

/// 校验列绑定
fn validate_columns(blueprint: &RowcastBlueprint) -> Result<(), ContractError> {
    let columns = &blueprint.columns;
    let required = [
        ("columns.neighborhood", &columns.neighborhood),
        ("columns.status", &columns.status),
        ("columns.date", &columns.date),
        ("columns.phone", &columns.phone),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ContractError::config_validation(
                field,
                "column binding cannot be empty",
            ));
        }
    }

    let optional = [
        ("columns.name", &columns.name),
        ("columns.identifier", &columns.identifier),
    ];
    for (field, value) in optional {
        if value.as_ref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ContractError::config_validation(
                field,
                "column binding cannot be empty when set",
            ));
        }
    }
    Ok(())
}

/// 校验大小上限
fn validate_limits(blueprint: &RowcastBlueprint) -> Result<(), ContractError> {
    let limits = &blueprint.limits;

    if limits.delimited_max_bytes == 0 {
        return Err(ContractError::config_validation(
            "limits.delimited_max_bytes",
            "delimited_max_bytes must be > 0",
        ));
    }
    if limits.spreadsheet_max_bytes == 0 {
        return Err(ContractError::config_validation(
            "limits.spreadsheet_max_bytes",
            "spreadsheet_max_bytes must be > 0",
        ));
    }
    // 表格文件整体载入内存，上限不应超过流式读取的 CSV
    if limits.spreadsheet_max_bytes > limits.delimited_max_bytes {
        return Err(ContractError::config_validation(
            "limits.spreadsheet_max_bytes / limits.delimited_max_bytes",
            format!(
                "spreadsheet_max_bytes ({}) must be <= delimited_max_bytes ({})",
                limits.spreadsheet_max_bytes, limits.delimited_max_bytes
            ),
        ));
    }
    if limits.preview_rows == 0 {
        return Err(ContractError::config_validation(
            "limits.preview_rows",
            "preview_rows must be > 0",
        ));
    }
    Ok(())
}

/// 校验存储配置
fn validate_storage(blueprint: &RowcastBlueprint) -> Result<(), ContractError> {
    let storage = &blueprint.storage;
    let names = [
        ("storage.artifact_name", &storage.artifact_name),
        ("storage.message_name", &storage.message_name),
        ("storage.report_name", &storage.report_name),
    ];
    for (field, name) in names {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(field, "file name cannot be empty"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(ContractError::config_validation(
                field,
                format!("'{name}' must be a plain file name"),
            ));
        }
    }

    if !storage.artifact_name.to_lowercase().ends_with(".xlsx") {
        return Err(ContractError::config_validation(
            "storage.artifact_name",
            "artifact_name must end with .xlsx",
        ));
    }

    let mut seen = HashSet::new();
    for (field, name) in names {
        if !seen.insert(name.as_str()) {
            return Err(ContractError::config_validation(
                field,
                format!("duplicate storage file name '{name}'"),
            ));
        }
    }
    Ok(())
}

/// 校验网关配置
fn validate_gateway(blueprint: &RowcastBlueprint) -> Result<(), ContractError> {
    let Some(gateway) = &blueprint.gateway else {
        return Ok(());
    };

    validate_url("gateway.send_url", &gateway.send_url)?;

    if gateway.client_id.trim().is_empty() {
        return Err(ContractError::config_validation(
            "gateway.client_id",
            "client_id cannot be empty",
        ));
    }
    if gateway.request_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "gateway.request_timeout_ms",
            "request_timeout_ms must be > 0",
        ));
    }

    match &gateway.auth {
        AuthConfig::Static { token_env } => {
            validate_env_name("gateway.auth.token_env", token_env)?;
        }
        AuthConfig::ClientCredentials {
            token_url,
            client_id_env,
            client_secret_env,
        } => {
            validate_url("gateway.auth.token_url", token_url)?;
            validate_env_name("gateway.auth.client_id_env", client_id_env)?;
            validate_env_name("gateway.auth.client_secret_env", client_secret_env)?;
        }
    }
    Ok(())
}

/// 校验操作员
fn validate_operators(blueprint: &RowcastBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, operator) in blueprint.operators.iter().enumerate() {
        if operator.username.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("operators[{idx}].username"),
                "username cannot be empty",
            ));
        }
        if !seen.insert(operator.username.as_str()) {
            return Err(ContractError::config_validation(
                format!("operators[username={}]", operator.username),
                "duplicate username",
            ));
        }
        let digest = &operator.password_sha256;
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ContractError::config_validation(
                format!("operators[{}].password_sha256", operator.username),
                "password_sha256 must be a 64-character hex digest",
            ));
        }
    }
    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<(), ContractError> {
    let url = url.trim();
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ContractError::config_validation(
            field,
            format!("'{url}' must be an http(s) URL"),
        )),
    }
}

fn validate_env_name(field: &str, name: &str) -> Result<(), ContractError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ContractError::config_validation(
            field,
            format!("'{name}' is not a valid environment variable name"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ColumnBindings, ConfigVersion, FilterConfig, GatewayConfig, LimitsConfig, OperatorConfig,
        StorageConfig,
    };

    const ADMIN_DIGEST: &str = "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918";

    fn minimal_blueprint() -> RowcastBlueprint {
        RowcastBlueprint {
            version: ConfigVersion::V1,
            columns: ColumnBindings {
                neighborhood: "Bairro".into(),
                status: "Status".into(),
                date: "Data".into(),
                phone: "Telefone".into(),
                name: Some("Nome".into()),
                identifier: None,
            },
            limits: LimitsConfig::default(),
            filters: FilterConfig::default(),
            storage: StorageConfig::default(),
            gateway: Some(GatewayConfig {
                send_url: "http://localhost:5001/wp/send".into(),
                client_id: "cid".into(),
                request_timeout_ms: 1000,
                auth: AuthConfig::default(),
            }),
            operators: vec![OperatorConfig {
                username: "admin".into(),
                password_sha256: ADMIN_DIGEST.into(),
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_empty_column_binding() {
        let mut bp = minimal_blueprint();
        bp.columns.phone = "  ".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("columns.phone"), "got: {err}");

        let mut bp = minimal_blueprint();
        bp.columns.identifier = Some(String::new());
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn test_spreadsheet_limit_above_delimited() {
        let mut bp = minimal_blueprint();
        bp.limits.spreadsheet_max_bytes = bp.limits.delimited_max_bytes + 1;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("spreadsheet_max_bytes"), "got: {err}");
    }

    #[test]
    fn test_zero_preview_rows() {
        let mut bp = minimal_blueprint();
        bp.limits.preview_rows = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("preview_rows must be > 0"), "got: {err}");
    }

    #[test]
    fn test_artifact_name_rules() {
        let mut bp = minimal_blueprint();
        bp.storage.artifact_name = "../out.xlsx".into();
        assert!(validate(&bp).is_err());

        let mut bp = minimal_blueprint();
        bp.storage.artifact_name = "out.csv".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains(".xlsx"), "got: {err}");

        let mut bp = minimal_blueprint();
        bp.storage.message_name = bp.storage.report_name.clone();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate"), "got: {err}");
    }

    #[test]
    fn test_gateway_url_and_timeout() {
        let mut bp = minimal_blueprint();
        if let Some(gateway) = bp.gateway.as_mut() {
            gateway.send_url = "ftp://example.com".into();
        }
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("http(s)"), "got: {err}");

        let mut bp = minimal_blueprint();
        if let Some(gateway) = bp.gateway.as_mut() {
            gateway.request_timeout_ms = 0;
        }
        assert!(validate(&bp).is_err());

        let mut bp = minimal_blueprint();
        bp.gateway = None;
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_client_credentials_env_names() {
        let mut bp = minimal_blueprint();
        if let Some(gateway) = bp.gateway.as_mut() {
            gateway.auth = AuthConfig::ClientCredentials {
                token_url: "https://gw.example.com/get-token".into(),
                client_id_env: "CLIENT ID".into(),
                client_secret_env: "CLIENT_SECRET".into(),
            };
        }
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("client_id_env"), "got: {err}");
    }

    #[test]
    fn test_duplicate_operator() {
        let mut bp = minimal_blueprint();
        bp.operators.push(bp.operators[0].clone());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate username"), "got: {err}");
    }

    #[test]
    fn test_bad_password_digest() {
        let mut bp = minimal_blueprint();
        bp.operators[0].password_sha256 = "admin".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("64-character"), "got: {err}");
    }
}
