//! # 二进制属性列表解码器
//!
//! 将 Apple 的二进制属性列表（`bplist00`）字节流解码为通用的值树。
//! 本模块不包含任何 webarchive 相关的知识，只负责容器格式本身：
//!
//! - 文件头魔数校验
//! - 尾部（trailer）字段校验：偏移宽度、引用宽度、对象数量、根对象索引
//! - 偏移表解析
//! - 各类对象的解码：整数、浮点数、日期、数据、ASCII/UTF-16 字符串、数组、字典
//!
//! 解码只读，不提供写入功能。

pub mod decoder;
pub mod value;

pub use decoder::{decode, FormatError};
pub use value::{Dictionary, PlistDate, Value};
