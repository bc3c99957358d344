//! 配置校验模块
//!
//! 校验规则：
//! - 缓冲区容量至少 1 字节
//! - 缓冲区不超过 64 MiB
//! - metrics 端口若存在则非 0
//! - 日志级别若存在则非空

use contracts::{ContractError, TeeSettings};

const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// 校验 TeeSettings 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(settings: &TeeSettings) -> Result<(), ContractError> {
    validate_buffer_size("file_buffer_size", settings.file_buffer_size)?;
    validate_buffer_size("console_buffer_size", settings.console_buffer_size)?;
    validate_metrics_port(settings)?;
    validate_log_level(settings)?;
    Ok(())
}

fn validate_buffer_size(field: &str, size: usize) -> Result<(), ContractError> {
    if size == 0 {
        return Err(ContractError::config_validation(
            field,
            "buffer size must be >= 1",
        ));
    }
    if size > MAX_BUFFER_SIZE {
        return Err(ContractError::config_validation(
            field,
            format!("buffer size must be <= {MAX_BUFFER_SIZE}, got {size}"),
        ));
    }
    Ok(())
}

fn validate_metrics_port(settings: &TeeSettings) -> Result<(), ContractError> {
    if settings.metrics_port == Some(0) {
        return Err(ContractError::config_validation(
            "metrics_port",
            "port 0 is not allowed; omit the field to disable metrics",
        ));
    }
    Ok(())
}

fn validate_log_level(settings: &TeeSettings) -> Result<(), ContractError> {
    if let Some(level) = &settings.log_level {
        if level.trim().is_empty() {
            return Err(ContractError::config_validation(
                "log_level",
                "log level cannot be empty",
            ));
        }
    }
    Ok(())
}
