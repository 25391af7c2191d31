//! # 工具模块
//!
//! 这个模块包含各种工具函数和实用程序：
//!
//! - 数据URL创建和解析
//! - 从资源URL中提取文件名
//! - 本地路径的百分号编码
//!
//! # 模块组织
//!
//! - `url` - URL处理、数据URL等工具函数

pub mod url;

// Re-export commonly used items for convenience
pub use url::{
    create_data_url, encode_local_reference, is_data_url, parse_data_url, url_file_name, DataUrl,
};
