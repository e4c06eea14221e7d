//! 测试支持 crate
//!
//! 提供 Mock 配置，供各 crate 的单元测试使用

#![no_std]

pub mod mock;
