// ==========================================
// Kamayan 配置层 - 运行配置
// ==========================================
// 职责: 一次模拟运行的环境信息（运行名、输入文件、进程号）
// 覆写顺序: 默认值 < 环境变量 < CLI 参数
// ==========================================

pub mod run_config;

pub use run_config::{env_keys, RunConfig};
