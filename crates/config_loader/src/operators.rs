//! 操作员凭据校验
//!
//! 配置中只保存密码的 SHA-256 摘要，明文密码从不落盘。

use sha2::{Digest, Sha256};

use contracts::{CredentialVerifier, OperatorConfig, RowcastBlueprint};

/// 基于配置的 [`CredentialVerifier`] 实现
#[derive(Debug, Clone, Default)]
pub struct ConfiguredOperators {
    operators: Vec<OperatorConfig>,
}

impl ConfiguredOperators {
    pub fn new(operators: Vec<OperatorConfig>) -> Self {
        Self { operators }
    }

    pub fn from_blueprint(blueprint: &RowcastBlueprint) -> Self {
        Self::new(blueprint.operators.clone())
    }

    /// 计算密码摘要 (小写十六进制)
    pub fn digest(password: &str) -> String {
        hex::encode(Sha256::digest(password.as_bytes()))
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl CredentialVerifier for ConfiguredOperators {
    fn verify(&self, username: &str, password: &str) -> bool {
        let digest = Self::digest(password);
        let verified = self
            .operators
            .iter()
            .any(|op| op.username == username && op.password_sha256.eq_ignore_ascii_case(&digest));
        if !verified {
            tracing::warn!(username, "Operator verification failed");
        }
        verified
    }
}
