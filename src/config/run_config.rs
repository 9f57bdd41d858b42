// ==========================================
// Kamayan 配置层 - 运行配置
// ==========================================
// 职责: 运行名、输入文件路径、进程号与进程数
// 来源: 环境变量（MPI 启动器注入），CLI 参数可覆写
// ==========================================

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// 运行名，同时作为 problem_id
    pub name: String,
    /// 输入文件写出位置
    pub input_file: PathBuf,
    /// 本进程号；只有 0 号进程写文件
    pub rank: usize,
    /// 进程总数，决定网格块切分
    pub nprocs: usize,
}

impl RunConfig {
    /// 单进程运行配置，输入文件默认为 `.{name}.in`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            input_file: default_input_file(&name),
            name,
            rank: 0,
            nprocs: 1,
        }
    }

    /// 从进程环境读取进程号与进程数
    pub fn from_env(name: impl Into<String>) -> Self {
        Self::from_lookup(name, |key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取进程号与进程数
    ///
    /// # 参数
    /// - lookup: 按变量名取值；按 env_keys 中的顺序取第一个可解析的值
    pub fn from_lookup(name: impl Into<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(k))
                .find_map(|v| v.trim().parse::<usize>().ok())
        };

        let mut config = Self::new(name);
        config.rank = first(env_keys::RANK).unwrap_or(0);
        config.nprocs = first(env_keys::NPROCS).unwrap_or(1).max(1);
        debug!(name = %config.name, rank = config.rank, nprocs = config.nprocs, "运行配置已加载");
        config
    }

    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_file = path.into();
        self
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn with_nprocs(mut self, nprocs: usize) -> Self {
        self.nprocs = nprocs.max(1);
        self
    }

    /// 本进程是否负责写输入文件
    pub fn is_writer(&self) -> bool {
        self.rank == 0
    }
}

fn default_input_file(name: &str) -> PathBuf {
    PathBuf::from(format!(".{}.in", name))
}

// ==========================================
// 环境变量名
// ==========================================
pub mod env_keys {
    // 进程号
    pub const RANK: &[&str] = &["KAMAYAN_RANK", "PMI_RANK", "OMPI_COMM_WORLD_RANK", "PMIX_RANK"];

    // 进程数
    pub const NPROCS: &[&str] = &["KAMAYAN_NPROCS", "PMI_SIZE", "OMPI_COMM_WORLD_SIZE"];
}
