//! 电话号码处理工具
//!
//! 号码统一以「纯数字 + 国家码前缀」存储（wa.me 要求的格式），
//! 展示格式只用于 API 响应中的 phoneFormatted 字段。

/// 归一化电话号码：去掉所有非数字字符
///
/// 返回 None 表示归一化后没有有效数字或长度不合理。
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 8 || digits.len() > 15 {
        return None;
    }
    Some(digits)
}

/// 格式化号码用于展示
///
/// 巴西号码（55 + DDD + 8/9 位）格式化为 +55 (11) 99999-0000，
/// 其它国家码退化为 +{digits}。
pub fn format_phone_display(digits: &str) -> String {
    if let Some(rest) = digits.strip_prefix("55") {
        if rest.len() == 10 || rest.len() == 11 {
            let (ddd, local) = rest.split_at(2);
            let split = local.len() - 4;
            return format!("+55 ({}) {}-{}", ddd, &local[..split], &local[split..]);
        }
    }
    format!("+{}", digits)
}
