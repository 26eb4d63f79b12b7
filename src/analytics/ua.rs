//! User-Agent 识别
//!
//! 有序子串匹配，首个命中生效。顺序是语义的一部分：
//! - Edge/Opera 的 UA 同时包含 "Chrome"，必须先于 Chrome 检查
//! - Chrome 的 UA 包含 "Safari"，Safari 检查放在 Chrome 之后
//! - iPad 的 UA 包含 "Mobile"，平板标记先于移动端标记检查
//!
//! 这是尽力而为的分析信号，不用于安全或计费判断。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 设备类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 从 User-Agent 解析出的信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub device_type: DeviceType,
    pub browser: Option<String>,
    pub os: Option<String>,
}

impl UserAgentInfo {
    /// 解析 User-Agent 字符串
    pub fn parse(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent.filter(|s| !s.is_empty()) else {
            return Self {
                device_type: DeviceType::Desktop,
                browser: None,
                os: None,
            };
        };
        let lower = ua.to_ascii_lowercase();

        Self {
            device_type: detect_device(&lower),
            browser: detect_browser(&lower).map(str::to_string),
            os: detect_os(&lower).map(str::to_string),
        }
    }
}

fn detect_device(ua: &str) -> DeviceType {
    // 平板标记优先：iPad 的 UA 里也有 "Mobile"
    if ua.contains("ipad") || ua.contains("tablet") {
        DeviceType::Tablet
    } else if ua.contains("mobile") || ua.contains("android") || ua.contains("iphone") {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    }
}

fn detect_browser(ua: &str) -> Option<&'static str> {
    // "edg/" 覆盖 Edge Chromium，"edge/" 覆盖 Legacy
    if ua.contains("edg/") || ua.contains("edge/") {
        Some("Edge")
    } else if ua.contains("opr/") || ua.contains("opera") {
        Some("Opera")
    } else if ua.contains("samsungbrowser") {
        Some("Samsung Internet")
    } else if ua.contains("firefox") {
        Some("Firefox")
    } else if ua.contains("chrome") || ua.contains("crios") {
        Some("Chrome")
    } else if ua.contains("safari") {
        Some("Safari")
    } else if ua.contains("msie") || ua.contains("trident") {
        Some("Internet Explorer")
    } else {
        None
    }
}

fn detect_os(ua: &str) -> Option<&'static str> {
    // Android 的 UA 同时包含 "Linux"，先检查 Android
    if ua.contains("windows") {
        Some("Windows")
    } else if ua.contains("android") {
        Some("Android")
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("like mac os x") {
        Some("iOS")
    } else if ua.contains("mac os") || ua.contains("macintosh") {
        Some("macOS")
    } else if ua.contains("linux") {
        Some("Linux")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
    const OPERA_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 OPR/105.0.0.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";

    #[test]
    fn test_edge_wins_over_chrome() {
        // Edge 的 UA 里也有 "Chrome"，顺序决定结果
        let info = UserAgentInfo::parse(Some(EDGE_WIN));
        assert_eq!(info.browser.as_deref(), Some("Edge"));
    }

    #[test]
    fn test_opera_wins_over_chrome() {
        let info = UserAgentInfo::parse(Some(OPERA_WIN));
        assert_eq!(info.browser.as_deref(), Some("Opera"));
    }

    #[test]
    fn test_chrome_wins_over_safari() {
        let info = UserAgentInfo::parse(Some(CHROME_WIN));
        assert_eq!(info.browser.as_deref(), Some("Chrome"));
        assert_eq!(info.os.as_deref(), Some("Windows"));
        assert_eq!(info.device_type, DeviceType::Desktop);
    }

    #[test]
    fn test_ipad_is_tablet_despite_mobile_token() {
        // iPad 的 UA 里有 "Mobile/15E148"，平板标记必须先命中
        let info = UserAgentInfo::parse(Some(SAFARI_IPAD));
        assert_eq!(info.device_type, DeviceType::Tablet);
        assert_eq!(info.os.as_deref(), Some("iOS"));
    }

    #[test]
    fn test_iphone_is_mobile() {
        let info = UserAgentInfo::parse(Some(SAFARI_IPHONE));
        assert_eq!(info.device_type, DeviceType::Mobile);
        assert_eq!(info.browser.as_deref(), Some("Safari"));
        assert_eq!(info.os.as_deref(), Some("iOS"));
    }

    #[test]
    fn test_android_is_mobile_and_android_os() {
        // Android 的 UA 同时包含 "Linux"
        let info = UserAgentInfo::parse(Some(CHROME_ANDROID));
        assert_eq!(info.device_type, DeviceType::Mobile);
        assert_eq!(info.browser.as_deref(), Some("Chrome"));
        assert_eq!(info.os.as_deref(), Some("Android"));
    }

    #[test]
    fn test_firefox_linux_desktop() {
        let info = UserAgentInfo::parse(Some(FIREFOX_LINUX));
        assert_eq!(info.device_type, DeviceType::Desktop);
        assert_eq!(info.browser.as_deref(), Some("Firefox"));
        assert_eq!(info.os.as_deref(), Some("Linux"));
    }

    #[test]
    fn test_safari_mac() {
        let info = UserAgentInfo::parse(Some(SAFARI_MAC));
        assert_eq!(info.browser.as_deref(), Some("Safari"));
        assert_eq!(info.os.as_deref(), Some("macOS"));
    }

    #[test]
    fn test_missing_ua_defaults_to_desktop() {
        let info = UserAgentInfo::parse(None);
        assert_eq!(info.device_type, DeviceType::Desktop);
        assert_eq!(info.browser, None);
        assert_eq!(info.os, None);
    }
}
