//! 디스패치 엔진 설정
//!
//! 호스트가 자기 설정 파일에 그대로 넣을 수 있도록 `serde`로 직렬화되며,
//! 빠진 필드는 기본값으로 채워집니다.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// 호출 지점 하나가 기억하는 타입 쌍 개수. 넘치면 megamorphic, 0이면 캐시 비활성화
    pub inline_cache_capacity: usize,

    /// C3 선형화 결과가 이 길이를 넘으면 타입 생성 실패
    pub max_mro_depth: usize,

    /// 디스패치마다 `trace!` 이벤트 출력
    pub trace_dispatch: bool,

    /// `seq * n` 한 번이 만들 수 있는 최대 바이트 수. 넘으면 MemoryError
    pub max_sequence_bytes: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            inline_cache_capacity: 4,
            max_mro_depth: 256,
            trace_dispatch: false,
            max_sequence_bytes: 1 << 31,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid dispatch config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl VmConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(src)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cfg = VmConfig::default();
        assert_eq!(cfg.inline_cache_capacity, 4);
        assert_eq!(cfg.max_mro_depth, 256);
        assert!(!cfg.trace_dispatch);
        assert_eq!(cfg.max_sequence_bytes, 1 << 31);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = VmConfig::from_toml_str("trace_dispatch = true\n").unwrap();
        assert!(cfg.trace_dispatch);
        assert_eq!(cfg.inline_cache_capacity, 4);
    }

    #[test]
    fn test_empty_toml() {
        let cfg = VmConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, VmConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = VmConfig::from_toml_str("inline_cache_capacity = \"four\"").unwrap_err();
        assert!(err.to_string().starts_with("invalid dispatch config"));
    }
}
