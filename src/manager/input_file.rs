// ==========================================
// Kamayan 配置层 - 输入文件渲染
// ==========================================
// 格式: `<block>` 标题行 + `key = value` 行，块之间空一行
// 顺序: <parthenon/job>、后端参数块（注册顺序，键排序）、
//       回退块（首次写入顺序，键按写入顺序，前置 `# Set by:` 注释）
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::params::{ParamValue, ParameterRouter};

/// 作业信息块
pub const JOB_BLOCK: &str = "parthenon/job";

/// 渲染完整的输入文件文本
///
/// # 参数
/// - name: 运行名，写为 problem_id
/// - router: 已完成导出的参数路由器
pub fn render_input(name: &str, router: &ParameterRouter) -> String {
    let mut sections = Vec::new();
    sections.push(render_section(
        JOB_BLOCK,
        [("problem_id", &ParamValue::from(name))].into_iter(),
    ));

    for store in router.backend_blocks() {
        sections.push(render_section(store.block(), store.iter()));
    }

    for block in router.fallback_blocks() {
        let body = render_section(
            &block.block,
            block.params.iter().map(|(k, v)| (k.as_str(), v)),
        );
        sections.push(format!("# Set by: {}\n{}", block.provenance, body));
    }

    let mut text = sections.join("\n\n");
    text.push('\n');
    text
}

fn render_section<'a>(
    block: &str,
    params: impl Iterator<Item = (&'a str, &'a ParamValue)>,
) -> String {
    let mut lines = vec![format!("<{}>", block)];
    lines.extend(params.map(|(key, value)| format!("{} = {}", key, value)));
    lines.join("\n")
}

// ==========================================
// 合并后参数的 JSON 快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub name: String,
    pub blocks: Vec<SnapshotBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBlock {
    pub block: String,
    /// 回退块的来源；后端参数块为 None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    pub params: IndexMap<String, ParamValue>,
}

impl InputSnapshot {
    pub fn capture(name: &str, router: &ParameterRouter) -> Self {
        let backend = router.backend_blocks().into_iter().map(|store| SnapshotBlock {
            block: store.block().to_string(),
            provenance: None,
            params: store
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        let fallback = router.fallback_blocks().map(|block| SnapshotBlock {
            block: block.block.clone(),
            provenance: Some(block.provenance.clone()),
            params: block.params.clone(),
        });

        Self {
            name: name.to_string(),
            blocks: backend.chain(fallback).collect(),
        }
    }

    pub fn block(&self, name: &str) -> Option<&SnapshotBlock> {
        self.blocks.iter().find(|b| b.block == name)
    }
}
