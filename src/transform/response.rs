//! # 响应解析模块
//!
//! ## 设计思路
//!
//! 生成接口的响应结构并不固定：输出地址可能在顶层，也可能挂在 `output` / `result` / `url`
//! 字段下，还可能是数组的第一个元素。这里把“嗅探”拆成两组有序策略：
//!
//! 1. **定位**：按 `output → result → url → 整个响应体` 的优先级，取第一个存在且非 null 的节点。
//! 2. **读取**：对定位到的节点依次尝试 `数组首元素字符串 → 字符串本身 → 对象的 url 字段`。
//!
//! 每个策略返回 `Option`，整体顺序与旧页面保持一致，保证兼容已有接口。

use serde_json::Value;

type Locator = fn(&Value) -> Option<&Value>;
type Reader = fn(&Value) -> Option<String>;

/// 定位策略（按优先级）。
const LOCATORS: [(&str, Locator); 4] = [
    ("output", locate_output),
    ("result", locate_result),
    ("url", locate_url),
    ("body", locate_body),
];

/// 读取策略（按优先级）。
const READERS: [(&str, Reader); 3] = [
    ("array[0]", read_first_element),
    ("string", non_empty_str),
    ("object.url", read_url_field),
];

fn locate_output(body: &Value) -> Option<&Value> {
    present(body.get("output"))
}

fn locate_result(body: &Value) -> Option<&Value> {
    present(body.get("result"))
}

fn locate_url(body: &Value) -> Option<&Value> {
    present(body.get("url"))
}

fn locate_body(body: &Value) -> Option<&Value> {
    present(Some(body))
}

fn read_first_element(node: &Value) -> Option<String> {
    node.as_array()?.first().and_then(non_empty_str)
}

fn read_url_field(node: &Value) -> Option<String> {
    node.as_object()?.get("url").and_then(non_empty_str)
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 从响应体中提取输出图片地址。
///
/// 只会对“第一个定位到的节点”执行读取策略：`output` 存在但无法读取时不会回退到 `url`。
pub fn extract_output_url(body: &Value) -> Option<String> {
    let (locator_name, node) = LOCATORS
        .iter()
        .find_map(|(name, locate)| locate(body).map(|node| (*name, node)))?;

    let found = READERS
        .iter()
        .find_map(|(name, read)| read(node).map(|url| (*name, url)));

    match found {
        Some((reader_name, url)) => {
            log::debug!("🔎 输出地址命中策略: {} → {}", locator_name, reader_name);
            Some(url)
        }
        None => {
            log::debug!("🔎 节点 '{}' 无法读取输出地址", locator_name);
            None
        }
    }
}
