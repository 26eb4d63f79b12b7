pub mod ip;
pub mod phone;

/// 校验公共 slug 是否合法
///
/// slug 是唯一的公共查找键，只允许 URL 安全字符，
/// 非法 slug 直接拒绝，不进入缓存和数据库查询。
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 128 {
        return false;
    }
    slug.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("sales"));
        assert!(is_valid_slug("sales-team-2"));
        assert!(is_valid_slug("SUPPORT_br"));
    }

    #[test]
    fn test_invalid_slugs() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("sales team"));
        assert!(!is_valid_slug("sales/../admin"));
        assert!(!is_valid_slug("vendas?x=1"));
        assert!(!is_valid_slug(&"a".repeat(129)));
    }
}
