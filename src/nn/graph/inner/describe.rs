/*
 * @Description  : GraphInner describe/summary 相关方法
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::descriptor::{GraphDescriptor, NodeDescriptor, NodeTypeDescriptor};
use crate::nn::nodes::NodeType;
use std::path::Path;

impl GraphInner {
    // ========== 图描述（describe）==========

    /// 导出图的描述符，节点按 ID 排序
    pub fn describe(&self) -> GraphDescriptor {
        let mut descriptor = GraphDescriptor::new(&self.name);

        for node_id in self.nodes() {
            let Some(node) = self.nodes.get(&node_id) else {
                continue;
            };
            let parents = self
                .backward_edges
                .get(&node_id)
                .map(|ids| ids.iter().map(|id| id.0).collect())
                .unwrap_or_default();

            descriptor.add_node(NodeDescriptor::new(
                node_id.0,
                node.name(),
                Self::node_type_to_descriptor(node.node_type()),
                node.value_expected_shape().to_vec(),
                parents,
            ));
        }

        descriptor
    }

    // ========== 模型摘要（summary）==========

    /// 打印模型摘要（类似 Keras 的 `model.summary()`）
    ///
    /// ```text
    /// ┌──────────┬───────────┬─────────────────┬────────┬────────┐
    /// │ 节点名称 │ 类型      │ 输出形状        │ 参数量 │ 父节点 │
    /// ├──────────┼───────────┼─────────────────┼────────┼────────┤
    /// │ images   │ Input     │ [64, 1, 28, 28] │      - │ -      │
    /// │ ...      │           │                 │        │        │
    /// ```
    pub fn summary(&self) {
        println!("{}", self.summary_string());
    }

    /// 将模型摘要保存到文件：`.md` → Markdown 表格，其他 → Unicode 文本表格
    pub fn save_summary<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        let path = path.as_ref();
        let summary = match path.extension().and_then(|e| e.to_str()) {
            Some("md") => self.summary_markdown(),
            _ => self.summary_string(),
        };
        std::fs::write(path, summary)
            .map_err(|e| GraphError::ComputationError(format!("保存摘要文件失败: {e}")))
    }

    /// 返回模型摘要的 Markdown 格式字符串
    pub fn summary_markdown(&self) -> String {
        let desc = self.describe();
        let mut output = format!("# 模型摘要: {}\n\n", desc.name);

        output.push_str("| 节点名称 | 类型 | 输出形状 | 参数量 | 父节点 |\n");
        output.push_str("|----------|------|----------|--------|--------|\n");
        for node in &desc.nodes {
            output.push_str(&format!(
                "| {} | {} | {:?} | {} | {} |\n",
                node.name,
                node.node_type.type_name(),
                node.output_shape,
                node.param_count
                    .map_or_else(|| "-".to_string(), format_number),
                format_parent_names(&desc, &node.parents)
            ));
        }

        let total_params = format_number(desc.total_params());
        output.push_str(&format!(
            "\n**总参数量**: {total_params}  \n**可训练参数**: {total_params}\n"
        ));
        output
    }

    /// 返回模型摘要字符串（Unicode 文本表格，用于控制台输出）
    pub fn summary_string(&self) -> String {
        let desc = self.describe();
        let rows: Vec<[String; 5]> = desc
            .nodes
            .iter()
            .map(|node| {
                [
                    node.name.clone(),
                    node.node_type.type_name().to_string(),
                    format!("{:?}", node.output_shape),
                    node.param_count
                        .map_or_else(|| "-".to_string(), format_number),
                    format_parent_names(&desc, &node.parents),
                ]
            })
            .collect();

        let header = ["节点名称", "类型", "输出形状", "参数量", "父节点"];
        let mut widths = header.map(display_width);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(cell));
            }
        }
        let border = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{left}{}{right}\n", segments.join(mid))
        };
        let line = |cells: [&str; 5]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (cell, &w))| {
                    // 参数量列右对齐
                    if col == 3 { pad_left(cell, w) } else { pad_right(cell, w) }
                })
                .collect();
            format!("│ {} │\n", padded.join(" │ "))
        };

        let mut output = border("┌", "┬", "┐");
        output.push_str(&line(header));
        output.push_str(&border("├", "┼", "┤"));
        for row in &rows {
            output.push_str(&line([
                row[0].as_str(),
                row[1].as_str(),
                row[2].as_str(),
                row[3].as_str(),
                row[4].as_str(),
            ]));
        }
        output.push_str(&border("├", "┴", "┤"));

        let inner_width = widths.iter().map(|w| w + 3).sum::<usize>() - 3;
        let total_params = format_number(desc.total_params());
        for text in [
            format!("总参数量: {total_params}"),
            format!("可训练参数: {total_params}"),
        ] {
            output.push_str(&format!("│ {} │\n", pad_right(&text, inner_width)));
        }
        output.push_str(&format!("└{}┘\n", "─".repeat(inner_width + 2)));
        output
    }

    fn node_type_to_descriptor(node_type: &NodeType) -> NodeTypeDescriptor {
        match node_type {
            NodeType::Input(_) => NodeTypeDescriptor::Input,
            NodeType::Parameter(_) => NodeTypeDescriptor::Parameter,
            NodeType::Add(_) => NodeTypeDescriptor::Add,
            NodeType::MatMul(_) => NodeTypeDescriptor::MatMul,
            NodeType::Flatten(_) => NodeTypeDescriptor::Flatten,
            NodeType::Conv2d(node) => NodeTypeDescriptor::Conv2d {
                stride: node.stride(),
                padding: node.padding(),
            },
            NodeType::ChannelBiasAdd(_) => NodeTypeDescriptor::ChannelBiasAdd,
            NodeType::MaxPool2d(node) => NodeTypeDescriptor::MaxPool2d {
                pool_size: node.pool_size(),
            },
            NodeType::AvgPool2d(node) => NodeTypeDescriptor::AvgPool2d {
                pool_size: node.pool_size(),
            },
            NodeType::FuzzyPool2d(node) => NodeTypeDescriptor::FuzzyPool2d {
                pool_size: node.pool_size(),
            },
            NodeType::MembershipPenalty(node) => NodeTypeDescriptor::MembershipPenalty {
                pool_size: node.pool_size(),
                reg_lambda: node.reg_lambda(),
            },
            NodeType::SoftmaxCrossEntropy(_) => NodeTypeDescriptor::SoftmaxCrossEntropy,
        }
    }
}

/// 格式化数字为千分位分隔形式
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn format_parent_names(desc: &GraphDescriptor, parent_ids: &[u64]) -> String {
    if parent_ids.is_empty() {
        return "-".to_string();
    }
    parent_ids
        .iter()
        .filter_map(|id| desc.nodes.iter().find(|n| n.id == *id))
        .map(|n| n.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// 字符串显示宽度（中文字符占 2 列）
fn display_width(s: &str) -> usize {
    s.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn pad_right(s: &str, width: usize) -> String {
    format!("{s}{}", " ".repeat(width.saturating_sub(display_width(s))))
}

fn pad_left(s: &str, width: usize) -> String {
    format!("{}{s}", " ".repeat(width.saturating_sub(display_width(s))))
}
