use std::fmt;

#[derive(Debug, Clone)]
pub enum LinkFlowError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    SlugConflict(String),
    NotFound(String),
    Serialization(String),
    ClickRecording(String),
}

impl LinkFlowError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkFlowError::DatabaseConfig(_) => "E001",
            LinkFlowError::DatabaseConnection(_) => "E002",
            LinkFlowError::DatabaseOperation(_) => "E003",
            LinkFlowError::Validation(_) => "E004",
            LinkFlowError::SlugConflict(_) => "E005",
            LinkFlowError::NotFound(_) => "E006",
            LinkFlowError::Serialization(_) => "E007",
            LinkFlowError::ClickRecording(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkFlowError::DatabaseConfig(_) => "Database Configuration Error",
            LinkFlowError::DatabaseConnection(_) => "Database Connection Error",
            LinkFlowError::DatabaseOperation(_) => "Database Operation Error",
            LinkFlowError::Validation(_) => "Validation Error",
            LinkFlowError::SlugConflict(_) => "Slug Conflict",
            LinkFlowError::NotFound(_) => "Resource Not Found",
            LinkFlowError::Serialization(_) => "Serialization Error",
            LinkFlowError::ClickRecording(_) => "Click Recording Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkFlowError::DatabaseConfig(msg) => msg,
            LinkFlowError::DatabaseConnection(msg) => msg,
            LinkFlowError::DatabaseOperation(msg) => msg,
            LinkFlowError::Validation(msg) => msg,
            LinkFlowError::SlugConflict(msg) => msg,
            LinkFlowError::NotFound(msg) => msg,
            LinkFlowError::Serialization(msg) => msg,
            LinkFlowError::ClickRecording(msg) => msg,
        }
    }
}

impl fmt::Display for LinkFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for LinkFlowError {}

// 便捷的构造函数
impl LinkFlowError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkFlowError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkFlowError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkFlowError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkFlowError::Validation(msg.into())
    }

    pub fn slug_conflict<T: Into<String>>(msg: T) -> Self {
        LinkFlowError::SlugConflict(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkFlowError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkFlowError::Serialization(msg.into())
    }

    pub fn click_recording<T: Into<String>>(msg: T) -> Self {
        LinkFlowError::ClickRecording(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LinkFlowError {
    fn from(err: sea_orm::DbErr) -> Self {
        LinkFlowError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for LinkFlowError {
    fn from(err: std::io::Error) -> Self {
        LinkFlowError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkFlowError {
    fn from(err: serde_json::Error) -> Self {
        LinkFlowError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkFlowError>;
