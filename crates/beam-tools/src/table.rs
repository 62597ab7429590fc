//! 表格文件读取
//!
//! 每行一个采样点，列之间用逗号或空白分隔。空行和以 `#` 开头的行被忽略。

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// 读取表格文件
///
/// 不检查行长度是否一致，交给表格构造时校验。
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("读取表格文件失败: {}", path.display()))?;
    parse_table(&content).with_context(|| format!("解析表格文件失败: {}", path.display()))
}

/// 解析表格文本
pub fn parse_table(content: &str) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|field| !field.is_empty())
            .map(|field| {
                field
                    .parse::<f64>()
                    .with_context(|| format!("第 {} 行: 无效数值 {:?}", lineno + 1, field))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }
    if rows.is_empty() {
        anyhow::bail!("表格为空");
    }
    Ok(rows)
}
